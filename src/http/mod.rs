//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 server side: one request per connection,
//! no keep-alive, no request bodies.
//!
//! # Architecture
//!
//! - **`connection`**: drives one accepted socket through read, route, write, close
//! - **`parser`**: tokenizes the request line and picks out the headers we use
//! - **`request`**: parsed request representation
//! - **`response`**: response representation with builder pattern
//! - **`writer`**: serializes responses and writes them to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Collect the request head
//!        └──────┬──────┘
//!               │ head complete        malformed line → 400 ┐
//!               ▼                                           │
//!        ┌──────────────────┐                               │
//!        │   Processing     │ ← Route to a handler          │
//!        └──────┬───────────┘                               │
//!               │ response ready                            │
//!               ▼                                           │
//!        ┌──────────────────┐                               │
//!        │    Writing       │ ◄─────────────────────────────┘
//!        └──────┬───────────┘
//!               │ response sent
//!               ▼
//!             Closed   (also reached on disconnect or read timeout)
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
