//! Broker-agnostic transport seams
//!
//! The gateway only fixes the logical contract: requests go out
//! fire-and-forget, responses arrive as raw bodies on some channel. AMQP,
//! HTTP webhooks and in-process channels all fit behind these two traits.

use async_trait::async_trait;

use crate::protocol::CorrelationId;

/// Errors from the outbound side of the fabrication channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("channel unavailable: {0}")]
    Unavailable(String),

    #[error("failed to publish: {0}")]
    Publish(String),
}

/// Outbound side: dispatches fabrication requests.
///
/// Fire-and-forget; correlation happens through the token, not through any
/// broker-level reply mechanism.
#[async_trait]
pub trait FabricationProducer: Send + Sync {
    async fn fabricate_account(&self, id: &CorrelationId) -> Result<(), TransportError>;
}

/// Inbound side: yields raw response bodies until the channel closes.
#[async_trait]
pub trait FabricationConsumer: Send {
    async fn recv(&mut self) -> Option<Vec<u8>>;
}

/// An in-process channel is a valid fabrication transport; the gateway's
/// webhook bridges into one, and tests drive the consume loop through it.
#[async_trait]
impl FabricationConsumer for tokio::sync::mpsc::Receiver<Vec<u8>> {
    async fn recv(&mut self) -> Option<Vec<u8>> {
        tokio::sync::mpsc::Receiver::recv(self).await
    }
}
