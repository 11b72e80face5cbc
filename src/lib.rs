pub mod api;
pub mod club;
pub mod config;
pub mod demo_source;
pub mod directory;
pub mod feed;
pub mod http_client;
pub mod logging;
pub mod selection;
pub mod state;
