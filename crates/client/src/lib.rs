//! stockroom_client - HTTP transport, typed API and CLI for the stockroom inventory service.

pub mod api;
pub mod cli;
pub mod client;
pub mod error;
pub mod output;

pub use api::InventoryApi;
pub use client::HttpTransport;
pub use error::{ClientError, Result};
