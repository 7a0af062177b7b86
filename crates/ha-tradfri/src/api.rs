//! The seam to the gateway client

use crate::command::{Command, Response};
use crate::error::TradfriError;
use async_trait::async_trait;
use std::sync::Arc;

/// Runs commands against a Tradfri gateway
///
/// The CoAP/DTLS client behind this trait is not part of this crate.
/// Observe commands are one-shot: they resolve with the next pushed state
/// and have to be issued again to keep following the device.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    async fn execute(&self, command: Command) -> Result<Response, TradfriError>;
}

/// Shared handle to a gateway client
pub type SharedGatewayApi = Arc<dyn GatewayApi>;
