//! Request routing.

pub mod router;

pub use router::{Handler, Pattern, Route, Router};
