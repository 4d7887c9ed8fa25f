pub mod codec;
pub mod crypto;
pub mod csrf;
pub mod error;
pub mod fake;
pub mod http_client;
pub mod oauth1;
pub mod oauth2;
pub mod profile;
pub mod provider;
pub mod registry;
pub mod service;
pub mod store;
pub mod types;
