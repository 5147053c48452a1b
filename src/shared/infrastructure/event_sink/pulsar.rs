// EventSink backed by the Pulsar REST producer endpoint.
//
// Messages are posted to `{broker}/topics/persistent/{tenant}/{namespace}/{topic}`
// with the message key set, so the broker routes one offer to one partition.

use crate::shared::infrastructure::event_sink::{EventSink, EventSinkError, OutgoingMessage};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PulsarProducerMessage<'a> {
    payload: String,
    key: &'a str,
    properties: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PulsarProducerBody<'a> {
    producer_name: &'a str,
    messages: Vec<PulsarProducerMessage<'a>>,
}

#[derive(Debug, Clone)]
pub struct PulsarEventSink {
    client: Client,
    producer_name: String,
    broker_url: String,
    tenant: String,
    namespace: String,
    timeout: Duration,
}

impl PulsarEventSink {
    pub fn new(
        producer_name: impl Into<String>,
        broker_url: impl Into<String>,
        tenant: impl Into<String>,
        namespace: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EventSinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| EventSinkError::Unavailable(err.to_string()))?;
        Ok(Self {
            client,
            producer_name: producer_name.into(),
            broker_url: broker_url.into().trim_end_matches('/').to_string(),
            tenant: tenant.into(),
            namespace: namespace.into(),
            timeout,
        })
    }

    fn topic_url(&self, topic: &str) -> String {
        format!(
            "{}/topics/persistent/{}/{}/{}",
            self.broker_url, self.tenant, self.namespace, topic
        )
    }

    fn classify(&self, err: reqwest::Error) -> EventSinkError {
        if err.is_timeout() {
            EventSinkError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
        } else {
            EventSinkError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl EventSink for PulsarEventSink {
    async fn publish(&self, topic: &str, message: &OutgoingMessage) -> Result<(), EventSinkError> {
        let payload = serde_json::to_string(&message.payload)
            .map_err(|err| EventSinkError::Rejected(err.to_string()))?;
        let body = PulsarProducerBody {
            producer_name: &self.producer_name,
            messages: vec![PulsarProducerMessage {
                payload,
                key: &message.key,
                properties: &message.properties,
            }],
        };

        let response = self
            .client
            .post(self.topic_url(topic))
            .json(&body)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(EventSinkError::Unavailable(format!("broker answered {status}")));
        }
        if !status.is_success() {
            return Err(EventSinkError::Rejected(format!("broker answered {status}")));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), EventSinkError> {
        let response = self
            .client
            .get(format!("{}/admin/v2/brokers/health", self.broker_url))
            .send()
            .await
            .map_err(|err| self.classify(err))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(EventSinkError::Unavailable(format!(
                "broker health answered {}",
                response.status()
            )))
        }
    }
}
