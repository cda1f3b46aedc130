//! HTTP surface of the phonebook
//!
//! Routes map onto the person gateway; every failure is turned into a
//! response by a single error type and every unmatched request ends at the
//! unknown-endpoint fallback.

mod access_log;
mod error;
mod handlers;
mod server;
mod state;

pub use server::start_server;
