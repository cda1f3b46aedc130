//! Shared state for the HTTP handlers

use crate::store::PersonGateway;

/// Application state shared across all handlers.
///
/// The only process-wide resource is the store handle inside the gateway;
/// everything else is request-scoped.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gateway: PersonGateway,
}

impl AppState {
    pub fn new(gateway: PersonGateway) -> Self {
        Self { gateway }
    }
}
