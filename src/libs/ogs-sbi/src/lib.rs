//! NextGCore SBI (Service Based Interface) Library
//!
//! HTTP plumbing shared by the network functions of the workspace:
//!
//! - [`message`] - SBI request, response and ProblemDetails structures
//! - [`client`] - HTTP/1.1 and HTTP/2 client with connect and request timeouts
//! - [`server`] - HTTP server serving HTTP/1.1 and HTTP/2 on one listener
//! - [`types`] - service names, NF types, URI schemes
//! - [`error`] - error types
//!
//! # Example
//!
//! ```rust,no_run
//! use ogs_sbi::{SbiClient, SbiClientConfig, SbiRequest, HttpVersion};
//!
//! async fn example() {
//!     let config = SbiClientConfig::new("127.0.0.10", 7777)
//!         .with_http_version(HttpVersion::Http2);
//!     let client = SbiClient::new(config);
//!     let _response = client.send_request(SbiRequest::get("/nnrf-disc/v1/nf-instances")).await;
//! }
//! ```

pub mod error;
pub mod message;
pub mod types;

pub mod client;
pub mod server;

pub use client::{SbiClient, SbiClientConfig};
pub use error::{SbiError, SbiResult};
pub use message::{ProblemDetails, SbiHeader, SbiHttpMessage, SbiRequest, SbiResponse};
pub use server::{
    send_bad_request, send_error, send_method_not_allowed, send_not_found,
    send_not_implemented, SbiRequestHandler, SbiServer, SbiServerConfig,
};
pub use types::{HttpVersion, NfType, SbiServiceType, UriScheme};
