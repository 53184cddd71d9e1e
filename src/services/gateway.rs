//! Outbound broadcast gateway.
//!
//! The gateway is an opaque form-POST endpoint that answers with free
//! text. Only transport concerns live here: request encoding, the bounded
//! timeout, and classifying the answer as accepted or rejected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::gateway::GatewayConfig;
use crate::error::{AppError, Result};

/// Response fragments that mean the gateway accepted the broadcast
pub const SUCCESS_MARKERS: &[&str] = &["SENT OK", "SUCCESS"];

/// What gets sent for one campaign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastRequest {
    pub sender_id: String,
    pub recipients: Vec<String>,
    pub audio_url: String,
    pub audio_format: String,
}

/// The gateway answered; the raw body is kept either way
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Accepted(String),
    Rejected(String),
}

impl GatewayOutcome {
    pub fn raw(&self) -> &str {
        match self {
            GatewayOutcome::Accepted(raw) | GatewayOutcome::Rejected(raw) => raw,
        }
    }
}

/// The gateway could not be reached or did not answer in time
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("gateway did not answer within {0:?}")]
    Timeout(Duration),

    #[error("gateway transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait BroadcastGateway: Send + Sync {
    async fn broadcast(
        &self,
        request: &BroadcastRequest,
    ) -> std::result::Result<GatewayOutcome, GatewayError>;
}

pub type SharedGateway = Arc<dyn BroadcastGateway>;

/// Classify a gateway answer. Non-2xx is always a rejection.
pub fn interpret_response(status_ok: bool, body: String) -> GatewayOutcome {
    if status_ok && SUCCESS_MARKERS.iter().any(|m| body.contains(m)) {
        GatewayOutcome::Accepted(body)
    } else {
        GatewayOutcome::Rejected(body)
    }
}

/// Reqwest-backed gateway client
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create gateway client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn form_fields(&self, request: &BroadcastRequest) -> Vec<(&'static str, String)> {
        vec![
            ("op", self.config.operation.clone()),
            ("username", self.config.username.clone()),
            ("password", self.config.password.clone()),
            ("callerid", request.sender_id.clone()),
            ("numbers", request.recipients.join(",")),
            ("audio_url", request.audio_url.clone()),
            ("audio_format", request.audio_format.clone()),
        ]
    }
}

#[async_trait]
impl BroadcastGateway for HttpGateway {
    async fn broadcast(
        &self,
        request: &BroadcastRequest,
    ) -> std::result::Result<GatewayOutcome, GatewayError> {
        let timeout = self.config.timeout;
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                GatewayError::Timeout(timeout)
            } else {
                GatewayError::Transport(e.to_string())
            }
        };

        tracing::debug!(
            url = %self.config.url,
            recipients = request.recipients.len(),
            "Sending broadcast to gateway"
        );

        let response = self
            .client
            .post(&self.config.url)
            .form(&self.form_fields(request))
            .send()
            .await
            .map_err(map_err)?;

        let status = response.status();
        let body = response.text().await.map_err(map_err)?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Gateway returned non-success status");
        }

        Ok(interpret_response(status.is_success(), body))
    }
}
