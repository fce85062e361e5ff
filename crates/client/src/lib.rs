//! HTTP clients for the two external systems the connector talks to: the
//! ORKL library (read side) and the intelligence platform (write side).

use reqwest::StatusCode;
use thiserror::Error;

pub mod orkl;
pub mod platform;

pub use orkl::{OrklClient, OrklClientConfig};
pub use platform::{PlatformClient, PlatformClientConfig};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("orkl-connector/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error("failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
