//! `transport` crate: the `HttpTransport` trait and its implementations.
//!
//! The dispatcher never talks to an HTTP library directly; it hands a fully
//! resolved [`OutgoingRequest`] to an [`HttpTransport`] trait object.

pub mod error;
pub mod traits;
pub mod http;
pub mod mock;

pub use error::TransportError;
pub use traits::{HttpResponse, HttpTransport, OutgoingRequest};
pub use http::ReqwestTransport;
