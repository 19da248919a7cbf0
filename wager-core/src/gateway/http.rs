use crate::config::WagerConfig;
use crate::error::{CoreError, GatewayError, Result};
use crate::gateway::{
    AcceptWagerRequest, CreateWagerRequest, FinishWagerRequest, StatusRequest, WagerGateway,
};
use crate::types::{Ack, WagerIdentity, WagerStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const STATUS_PATH: &str = "/game-status";
const CREATE_PATH: &str = "/init-wager";
const ACCEPT_PATH: &str = "/accept-wager";
const FINISH_PATH: &str = "/finish-game";

/// Shape of a status reply, decoded once here.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatusResponse {
    Status { status_game: String },
    NotFound { error: Value },
}

fn error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    Some(match error {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    })
}

/// Decode a status reply. `{error}` on 2xx or 404 means the wager does not exist.
pub fn decode_status(http_status: u16, body: &Value) -> std::result::Result<WagerStatus, GatewayError> {
    let ok = (200..300).contains(&http_status);
    if !ok && http_status != 404 {
        let message = error_message(body).unwrap_or_else(|| body.to_string());
        return Err(GatewayError::rejected(Some(http_status), message));
    }

    match serde_json::from_value::<StatusResponse>(body.clone()) {
        Ok(StatusResponse::Status { status_game }) => WagerStatus::from_status_game(&status_game)
            .ok_or_else(|| GatewayError::decode(format!("Unknown status_game '{}'", status_game))),
        Ok(StatusResponse::NotFound { error }) => {
            tracing::debug!("No wager recorded: {}", error);
            Ok(WagerStatus::NotFound)
        }
        Err(_) if http_status == 404 => Ok(WagerStatus::NotFound),
        Err(_) => Err(GatewayError::decode(format!(
            "Status response has neither status_game nor error: {}",
            body
        ))),
    }
}

/// Decode an acknowledgement. A 2xx body carrying `error` is still a rejection.
pub fn decode_ack(http_status: u16, body: Value) -> std::result::Result<Ack, GatewayError> {
    if let Some(message) = error_message(&body) {
        return Err(GatewayError::rejected(Some(http_status), message));
    }

    if !(200..300).contains(&http_status) {
        return Err(GatewayError::rejected(Some(http_status), body.to_string()));
    }

    Ok(Ack(body))
}

/// JSON-over-HTTP client for the wager backend.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &WagerConfig) -> Result<Self> {
        Self::with_base_url(&config.backend_url)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        if base_url.is_empty() {
            return Err(CoreError::config("Backend URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CoreError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> std::result::Result<(u16, Value), GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(
            "POST {} {}",
            url,
            serde_json::to_string(body).unwrap_or_default()
        );

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::unreachable(format!("{}: {}", url, e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::unreachable(format!("{}: {}", url, e)))?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        tracing::debug!("{} -> HTTP {} {}", path, status, body);
        Ok((status, body))
    }
}

#[async_trait]
impl WagerGateway for HttpGateway {
    async fn query_status(
        &self,
        identity: &WagerIdentity,
    ) -> std::result::Result<WagerStatus, GatewayError> {
        let (status, body) = self.post(STATUS_PATH, &StatusRequest::from(identity)).await?;
        decode_status(status, &body)
    }

    async fn create_wager(
        &self,
        request: &CreateWagerRequest,
    ) -> std::result::Result<Ack, GatewayError> {
        let (status, body) = self.post(CREATE_PATH, request).await?;
        let ack = decode_ack(status, body);
        if let Err(err) = &ack {
            if err.is_conflict() {
                tracing::warn!(
                    "Wager {}/{} already exists at the backend",
                    request.game_website_host,
                    request.game_id
                );
            }
        }
        ack
    }

    async fn accept_wager(
        &self,
        request: &AcceptWagerRequest,
    ) -> std::result::Result<Ack, GatewayError> {
        let (status, body) = self.post(ACCEPT_PATH, request).await?;
        decode_ack(status, body)
    }

    async fn finish_wager(
        &self,
        request: &FinishWagerRequest,
    ) -> std::result::Result<Ack, GatewayError> {
        let (status, body) = self.post(FINISH_PATH, request).await?;
        decode_ack(status, body)
    }
}
