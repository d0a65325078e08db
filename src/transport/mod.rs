//! Request signing and HTTP dispatch shared by every exchange adapter

pub mod http;
pub mod signing;

pub use http::HttpTransport;
