use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::PostingId;
use super::eligibility::{CompanyProfile, EligibilityRequest, VisaMatchResult};
use super::gateway::{
    CompanyVerification, EligibilityEvaluator, ExistingPosting, GatewayError, PostingBackend,
    PostingReceipt, PostingStatus,
};
use super::submission::PostingPayload;

#[derive(Debug, Serialize)]
struct CreatePostingRequest<'a> {
    #[serde(flatten)]
    posting: &'a PostingPayload,
    status: PostingStatus,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// REST client for the recruitment backend. Implements every remote collaborator the wizard
/// needs against a single base URL.
#[derive(Debug, Clone)]
pub struct HttpPostingGateway {
    client: Client,
    base_url: String,
}

impl HttpPostingGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "backend responded");
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let message = body.message.or(body.error).unwrap_or(text);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }
}

#[async_trait]
impl PostingBackend for HttpPostingGateway {
    async fn create_posting(
        &self,
        payload: &PostingPayload,
    ) -> Result<PostingReceipt, GatewayError> {
        let body = CreatePostingRequest {
            posting: payload,
            status: PostingStatus::Inactive,
        };
        self.json(self.client.post(self.url("/job-postings")).json(&body))
            .await
    }

    async fn activate_posting(&self, id: &PostingId) -> Result<PostingReceipt, GatewayError> {
        let url = self.url(&format!("/job-postings/{id}/activate"));
        self.json(self.client.post(url)).await
    }

    async fn fetch_posting(&self, id: &PostingId) -> Result<ExistingPosting, GatewayError> {
        let url = self.url(&format!("/job-postings/{id}"));
        self.json(self.client.get(url)).await
    }
}

#[async_trait]
impl CompanyVerification for HttpPostingGateway {
    async fn company_profile(&self) -> Result<Option<CompanyProfile>, GatewayError> {
        match self
            .json(self.client.get(self.url("/company/visa-profile")))
            .await
        {
            Ok(profile) => Ok(Some(profile)),
            Err(GatewayError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl EligibilityEvaluator for HttpPostingGateway {
    async fn evaluate(
        &self,
        request: &EligibilityRequest,
    ) -> Result<VisaMatchResult, GatewayError> {
        self.json(self.client.post(self.url("/visa/evaluate")).json(request))
            .await
    }
}
