//! Gemini `generateContent` client.

use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::errors::TldrError;
use crate::summarize::Summarizer;

// Summarization is a single long-latency call; give it a generous timeout.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .unwrap_or_else(|_| Client::new())
});

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    /// The text of the first candidate, or an empty string when the model
    /// returned nothing usable (e.g. a safety block). Callers treat empty
    /// text as a failure.
    fn text(&self) -> String {
        let Some(content) = self.candidates.first().and_then(|c| c.content.as_ref()) else {
            return String::new();
        };
        content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

pub struct GeminiClient {
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, TldrError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let payload = serde_json::json!({
            "contents": [
                {
                    "parts": [
                        {"text": prompt}
                    ]
                }
            ]
        });

        info!(
            "Requesting summary from {} ({} prompt chars)",
            self.model,
            prompt.chars().count()
        );

        let response = HTTP_CLIENT
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TldrError::Unexpected(format!("Gemini request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(TldrError::Unexpected(format!(
                "Gemini API error: HTTP {status} - {body}"
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| TldrError::Unexpected(format!("Failed to parse Gemini response: {e}")))?;

        Ok(parsed.text())
    }
}

#[async_trait::async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, prompt: &str) -> Result<String, TldrError> {
        self.generate(prompt).await
    }
}
