//! Outbound fabrication dispatch
//!
//! HTTP realization of [`FabricationProducer`]: each fabrication request is
//! POSTed to the worker endpoint as the protocol JSON. Fire-and-forget from
//! the pool's perspective; the worker answers later through the response
//! webhook.

use async_trait::async_trait;
use tracing::debug;

use fabrication::{CorrelationId, FabricateRequest, FabricationProducer, TransportError};

pub struct HttpProducer {
    worker_url: String,
    http: reqwest::Client,
}

impl HttpProducer {
    pub fn new(worker_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            worker_url: worker_url.into(),
            http,
        }
    }
}

#[async_trait]
impl FabricationProducer for HttpProducer {
    async fn fabricate_account(&self, id: &CorrelationId) -> Result<(), TransportError> {
        let request = FabricateRequest::new(id);
        let response = self
            .http
            .post(&self.worker_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::Publish(format!(
                "worker returned {}",
                response.status()
            )));
        }

        debug!(correlation_id = %id, "fabrication request dispatched");
        Ok(())
    }
}
