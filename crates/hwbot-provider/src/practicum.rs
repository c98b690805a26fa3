//! Homework status API client
//!
//! GET <endpoint>?from_date=<unix seconds> with an `Authorization: OAuth <token>` header.

use std::time::Duration;

use async_trait::async_trait;
use hwbot_schema::HomeworkError;
use reqwest::StatusCode;
use serde_json::Value;

use crate::HomeworkApi;

pub const PRACTICUM_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

#[derive(Debug, Clone)]
pub struct PracticumClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl PracticumClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            client: builder.build().unwrap_or_default(),
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the homeworks updated since `from_date` and return the parsed body as is.
    pub async fn get_api_answer(&self, from_date: i64) -> Result<Value, HomeworkError> {
        tracing::debug!("Requesting homework statuses from {} since {}", self.endpoint, from_date);

        let resp = self
            .client
            .get(&self.endpoint)
            .header("authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("failed to reach endpoint {}: {e}", self.endpoint);
                HomeworkError::Transport {
                    endpoint: self.endpoint.clone(),
                    reason: e.to_string(),
                }
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            tracing::error!("endpoint {} returned status {}", self.endpoint, status);
            return Err(HomeworkError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| {
            tracing::error!("failed to read response body from {}: {e}", self.endpoint);
            HomeworkError::Transport {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            }
        })?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("response from {} is not valid JSON: {e}", self.endpoint);
            HomeworkError::MalformedBody(e.to_string())
        })
    }
}

#[async_trait]
impl HomeworkApi for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<Value, HomeworkError> {
        self.get_api_answer(from_date).await
    }
}
