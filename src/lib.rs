pub mod config;
pub mod extract;
pub mod fetch;
pub mod geocode;
pub mod load;
pub mod mailbox;
pub mod pipeline;
pub mod record;
pub mod transform;
