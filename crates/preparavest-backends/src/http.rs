//! HTTP client for the quiz API.
//!
//! One [`ApiClient`] serves as question provider, scoring authority and
//! ranking store.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use preparavest_core::error::ServiceError;
use preparavest_core::model::{Question, RankingEntry};
use preparavest_core::traits::{
    AnswerSubmission, QuestionProvider, RankingStore, ScoringAuthority, SubmissionReceipt,
};

use crate::wire::{self, WireScore, WireSubmission};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Client for the quiz REST API.
pub struct ApiClient {
    base_url: String,
    timeout_ms: u64,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn get_json(&self, path: &str) -> Result<Value, ServiceError> {
        let response = self
            .client
            .get(self.url(path))
            .header("content-type", "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        read_json(check_status(response).await?).await
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ServiceError> {
        let response = self
            .client
            .post(self.url(path))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        check_status(response).await
    }

    fn transport_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout(self.timeout_ms)
        } else {
            ServiceError::Network(e.to_string())
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status().as_u16();
    if status >= 400 {
        let message = response.text().await.unwrap_or_default();
        return Err(ServiceError::Status { status, message });
    }
    Ok(response)
}

async fn read_json(response: reqwest::Response) -> Result<Value, ServiceError> {
    response
        .json()
        .await
        .map_err(|e| ServiceError::Malformed(format!("failed to parse response: {e}")))
}

#[async_trait]
impl QuestionProvider for ApiClient {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_questions(&self) -> Result<Vec<Question>, ServiceError> {
        let body = self.get_json("perguntas").await?;
        let questions = wire::questions_from_json(body)?;
        tracing::debug!(count = questions.len(), "questions fetched");
        Ok(questions)
    }
}

#[async_trait]
impl ScoringAuthority for ApiClient {
    #[instrument(skip(self, submission), fields(user_id = submission.user_id, answers = submission.answers.len()))]
    async fn submit_answers(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmissionReceipt, ServiceError> {
        let response = self
            .post("respostas", &WireSubmission::from(submission))
            .await?;
        // An unreadable body is a receipt without a count, not a transport failure.
        let receipt = match response.json::<Value>().await {
            Ok(body) => wire::receipt_from_json(body),
            Err(e) => {
                tracing::warn!("unreadable scoring response: {e}");
                SubmissionReceipt::default()
            }
        };
        Ok(receipt)
    }

    #[instrument(skip(self))]
    async fn submit_score(&self, user_id: u64, correct_count: u32) -> Result<(), ServiceError> {
        let body = WireScore {
            id_user: user_id,
            acertos: correct_count,
        };
        self.post("acertos", &body).await?;
        Ok(())
    }
}

#[async_trait]
impl RankingStore for ApiClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_ranking(&self) -> Result<Vec<RankingEntry>, ServiceError> {
        let body = self.get_json("acertos").await?;
        wire::ranking_from_json(body)
    }
}
