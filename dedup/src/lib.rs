pub mod api;
pub mod config;
pub mod fingerprint;
pub mod ingest;
pub mod prometheus;
pub mod router;
pub mod server;
pub mod store;
pub mod validation;
