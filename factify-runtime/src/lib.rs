pub mod client_factory;
pub mod config_store;
pub mod fs;
pub mod history;
pub mod http;
pub mod identity;
pub mod paths;
pub mod secrets;
