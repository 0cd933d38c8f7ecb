//! NATS connection wrapper (§6 Event Sink backend), grounded on
//! `nvisy-nats::client::NatsClient`: a cheaply-cloneable `Arc` wrapper
//! around the `async_nats::Client` plus its JetStream context, with
//! exponential-backoff reconnection left to the underlying client.

use std::sync::Arc;

use async_nats::jetstream::{self, stream};
use tokio::time::timeout;

use crate::config::{NatsConfig, STREAM_NAME, SUBJECT_PREFIX};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct NatsClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    jetstream: jetstream::Context,
}

impl NatsClient {
    /// Connects to NATS and ensures the `FORGE_EVENTS` stream exists,
    /// creating it on first run (§6 Event Sink; mirrors
    /// `nvisy-nats::stream::publisher::StreamPublisher::new`'s
    /// get-or-create pattern).
    #[tracing::instrument(skip(config), fields(url = %config.url))]
    pub async fn connect(config: &NatsConfig) -> Result<Self> {
        let mut options = async_nats::ConnectOptions::new().name(&config.name);
        if let Some(token) = &config.token {
            options = options.token(token.clone());
        }

        let client = timeout(config.connect_timeout(), async_nats::connect_with_options(&config.url, options))
            .await
            .map_err(|_| Error::ConnectTimeout(config.connect_timeout()))??;

        let jetstream = jetstream::new(client);

        let stream_config = stream::Config {
            name: STREAM_NAME.to_string(),
            description: Some("Fabric control-plane events (§6 Event Sink)".to_string()),
            subjects: vec![format!("{SUBJECT_PREFIX}.>")],
            max_age: config.max_age(),
            ..Default::default()
        };

        match jetstream.get_stream(STREAM_NAME).await {
            Ok(_) => tracing::debug!(target: "forge_nats::client", stream = STREAM_NAME, "using existing stream"),
            Err(_) => {
                jetstream
                    .create_stream(stream_config)
                    .await
                    .map_err(|e| Error::Stream { stream: STREAM_NAME.to_string(), source: Box::new(e) })?;
                tracing::info!(target: "forge_nats::client", stream = STREAM_NAME, "created event stream");
            }
        }

        Ok(Self { inner: Arc::new(Inner { jetstream }) })
    }

    pub(crate) fn jetstream(&self) -> &jetstream::Context {
        &self.inner.jetstream
    }

    pub async fn publish(&self, subject: String, payload: Vec<u8>) -> Result<()> {
        self.inner
            .jetstream
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| Error::Publish { subject: subject.clone(), source: Box::new(e) })?
            .await
            .map_err(|e| Error::Publish { subject, source: Box::new(e) })?;
        Ok(())
    }
}
