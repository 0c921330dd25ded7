//! Ollama API client for local LLM generation
//!
//! Thin wrapper over the `/api/generate` endpoint, in both non-streaming and
//! line-delimited streaming form. Callers are expected to fall back to the
//! rule-based responder on any error.

use anyhow::Result;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "deepseek-r1:8b";

/// Sampling kept deliberately cold so the agent stays on-profile
const TEMPERATURE: f64 = 0.1;
const MAX_TOKENS: u32 = 200;

/// Ollama generation client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    think: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

/// One line of `/api/generate` output (the full body in non-streaming mode)
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaClient {
    /// Create a client with the default local endpoint and model
    pub fn new() -> Self {
        Self::with_config(DEFAULT_BASE_URL, DEFAULT_MODEL)
    }

    /// Create a client from `OLLAMA_BASE_URL` / `OLLAMA_MODEL`, falling back
    /// to the defaults when unset
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::with_config(&base_url, &model)
    }

    pub fn with_config(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(std::time::Duration::from_secs(5))
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request<'a>(&'a self, prompt: &'a str, stream: bool) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream,
            think: true,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: MAX_TOKENS,
            },
        }
    }

    /// Generate a complete response in one call
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(model = %self.model, "Calling Ollama (non-streaming)");

        let response = self
            .client
            .post(&url)
            .json(&self.request(prompt, false))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama API error {}: {}", status, body);
        }

        let chunk: GenerateChunk = response.json().await?;
        Ok(chunk.response)
    }

    /// Start a streaming generation. The initial request failure is returned
    /// directly so callers can fall back before anything was streamed; errors
    /// mid-stream arrive as an `Err` item and close the channel.
    pub async fn generate_stream(&self, prompt: &str) -> Result<mpsc::Receiver<Result<String>>> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(model = %self.model, "Calling Ollama (streaming)");

        let response = self
            .client
            .post(&url)
            .json(&self.request(prompt, true))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama API error {}: {}", status, body);
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        warn!(error = %e, "Ollama stream interrupted");
                        let _ = tx.send(Err(e.into())).await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);
                    if line.is_empty() {
                        continue;
                    }

                    // Malformed lines are skipped, not fatal
                    let Ok(parsed) = serde_json::from_str::<GenerateChunk>(&line) else {
                        continue;
                    };
                    if !parsed.response.is_empty()
                        && tx.send(Ok(parsed.response)).await.is_err()
                    {
                        return;
                    }
                    if parsed.done {
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OllamaClient::with_config("http://ollama:11434/", "llama3.2");
        assert_eq!(client.base_url, "http://ollama:11434");
        assert_eq!(client.model(), "llama3.2");
    }

    #[test]
    fn test_chunk_parsing_tolerates_missing_fields() {
        let chunk: GenerateChunk = serde_json::from_str(r#"{"response":"Hi"}"#).unwrap();
        assert_eq!(chunk.response, "Hi");
        assert!(!chunk.done);

        let done: GenerateChunk = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(done.response.is_empty());
        assert!(done.done);
    }
}
