//! Inbound fabrication channel processing
//!
//! Bridges raw channel messages into the pool. Nothing raised here ever
//! aborts the loop: malformed messages and unrecognized events are warned
//! about and dropped, and pool-side failures are logged while the next
//! message is awaited. The loop ends when the channel closes.

use std::sync::Arc;

use tracing::{debug, warn};

use fabrication::{FabricationConsumer, InboundEvent, decode_envelope, map_account_response};

use crate::pool::AccountPool;

/// Drain the fabrication channel into the pool until it closes.
pub async fn run_consumer<C: FabricationConsumer>(pool: Arc<AccountPool>, mut consumer: C) {
    while let Some(body) = consumer.recv().await {
        let envelope = match decode_envelope(&body) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(%error, "discarding malformed fabrication message");
                continue;
            }
        };

        match envelope.event {
            InboundEvent::AccountResponse => {
                let outcome = map_account_response(envelope.id, &envelope.data);
                if let Err(error) = pool.on_fabrication_response(outcome).await {
                    warn!(%error, "failed to process fabrication response");
                }
            }
            InboundEvent::Unrecognized(event) => {
                warn!(event, "unexpected event encountered");
            }
        }
    }
    debug!("fabrication channel closed");
}
