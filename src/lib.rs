//! Hearth - Embeddable HTTP/1.1 Server Core
//!
//! Accepts TCP connections, parses requests incrementally, dispatches each
//! frozen request to a user handler, and writes the response back.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod server;

pub use config::Config;
pub use error::{ParseError, ServerError};
pub use handler::{Handler, HandlerModel};
pub use http::headers::{HeaderMap, HeaderValue};
pub use http::request::{Method, Request, Version};
pub use http::response::{Response, ResponseBuilder};
pub use server::{Server, ServerHandle};
