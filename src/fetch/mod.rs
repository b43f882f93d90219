// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, error, instrument};

use crate::config::FetchConfig;

/// Build the HTTP client used for page downloads.
pub fn build_client(cfg: &FetchConfig) -> Result<Client> {
    Client::builder()
        .timeout(cfg.timeout)
        .user_agent(cfg.user_agent.as_str())
        .build()
        .context("building page fetch client")
}

async fn get_text_core(client: &Client, url: &str) -> Result<String> {
    debug!("Fetching text from {}", url);
    Ok(client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .text()
        .await
        .with_context(|| format!("Reading text from {}", url))?)
}

/// Download `url` and return its markup.
///
/// Network errors and non-2xx responses are logged and turned into `None`;
/// deciding whether that is fatal is left to the caller.
#[instrument(level = "info", skip(client))]
pub async fn get_page(client: &Client, url: &str) -> Option<String> {
    match get_text_core(client, url).await {
        Ok(html) => {
            debug!(bytes = html.len(), "page fetched");
            Some(html)
        }
        Err(e) => {
            error!(%url, error = ?e, "page fetch failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Serve one canned HTTP response on a local port and return the page URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut request: Vec<u8> = Vec::new();
            // read until the end of the request headers
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "{}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/wiki/Stadiums", addr)
    }

    // bypass any proxy configured in the environment
    fn local_client() -> Client {
        let cfg = FetchConfig::default();
        Client::builder()
            .timeout(cfg.timeout)
            .user_agent(cfg.user_agent)
            .no_proxy()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn success_returns_markup() {
        let body = "<table class=\"wikitable\"><tr><td>Stadium</td></tr></table>";
        let url = serve_once("HTTP/1.1 200 OK", body).await;
        let client = local_client();

        assert_eq!(get_page(&client, &url).await.as_deref(), Some(body));
    }

    #[tokio::test]
    async fn forbidden_status_reports_absent_page() {
        let url = serve_once("HTTP/1.1 403 Forbidden", "blocked").await;
        let client = local_client();

        assert!(get_page(&client, &url).await.is_none());
    }

    #[tokio::test]
    async fn unreachable_host_reports_absent_page() {
        let client = build_client(&FetchConfig {
            timeout: Duration::from_secs(2),
            ..FetchConfig::default()
        })
        .unwrap();

        // nothing listens on port 1
        let page = get_page(&client, "http://127.0.0.1:1/wiki/Stadiums").await;
        assert!(page.is_none());
    }

    #[tokio::test]
    async fn malformed_url_reports_absent_page() {
        let client = build_client(&FetchConfig::default()).unwrap();
        assert!(get_page(&client, "not a url").await.is_none());
    }
}
