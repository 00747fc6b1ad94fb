pub mod api_client;
pub mod config;
pub mod derived;
pub mod dialog;
pub mod fetchers;
pub mod mutations;
pub mod notification;
pub mod pages;
pub mod query_cache;
pub mod query_key;
pub mod resources;
