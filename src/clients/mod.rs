//! Typed clients for every upstream the console talks to, all built on the
//! injectable [`HttpTransport`].

pub mod console_client;
pub mod error;
pub mod http;
pub mod place_client;
pub mod postal_client;

pub use console_client::*;
pub use error::*;
pub use http::{HttpTransport, ReqwestTransport};
pub use place_client::*;
pub use postal_client::*;
