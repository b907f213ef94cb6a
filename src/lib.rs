//! minihttpd - a small concurrent HTTP/1.1 server
//!
//! Parses requests by hand and answers a fixed set of routes: `/`,
//! `/user-agent`, `/echo/<text>` and `/files/<name>`.

pub mod config;
pub mod files;
pub mod http;
pub mod routing;
pub mod server;
