pub mod filename;
pub mod http_client;
