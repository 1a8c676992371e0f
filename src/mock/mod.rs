//! A lightweight in-process HTTP server that stands in for the endpoints
//! the checks hit. It records every request it sees so tests can assert
//! on methods, headers and bodies.

mod server;

pub use server::*;
