use crate::error::ApiError;
use crate::http::{build_client, decode, endpoint};
use crate::responses::{SummaryRequest, SummaryResponse};
use async_trait::async_trait;
use configuration::HttpProviderSettings;
use core_types::{CollaboratorError, Insight, Summarizer};

/// Client of the narrative service that turns insight records into prose.
#[derive(Debug, Clone)]
pub struct NarrativeClient {
    client: reqwest::Client,
    base_url: String,
}

impl NarrativeClient {
    pub fn new(settings: &HttpProviderSettings) -> Result<Self, ApiError> {
        if settings.base_url.trim().is_empty() {
            return Err(ApiError::Configuration("narrative base_url is empty".to_string()));
        }
        Ok(Self {
            client: build_client(settings)?,
            base_url: settings.base_url.clone(),
        })
    }

    pub async fn summarize_insights(&self, insights: &[Insight]) -> Result<String, ApiError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, "summaries"))
            .json(&SummaryRequest { insights })
            .send()
            .await?;
        let body: SummaryResponse = decode(response).await?;
        let summary = body.summary.trim();
        if summary.is_empty() {
            return Err(ApiError::InvalidData("narrative service returned an empty summary".to_string()));
        }
        Ok(summary.to_string())
    }
}

#[async_trait]
impl Summarizer for NarrativeClient {
    async fn summarize(&self, insight_records: &[Insight]) -> Result<String, CollaboratorError> {
        Ok(self.summarize_insights(insight_records).await?)
    }
}
