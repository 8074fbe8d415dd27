// src/enrich/ai_adapter.rs
//! AI adapter: collaborator traits + OpenAI, disabled and mock clients.
//!
//! Every call answers `Result<_, FallbackReason>`; the enrichment steps turn
//! an `Err` into their local fallback. Nothing here retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AiSettings;
use crate::error::FallbackReason;

/// One chat-completion request.
#[derive(Debug, Clone, Copy)]
pub struct Completion<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
}

/// Translation / summarization collaborator.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, req: Completion<'_>) -> Result<String, FallbackReason>;
    /// Provider name for diagnostics/logs.
    fn provider_name(&self) -> &'static str;
}

/// Illustration collaborator. Returns an image URL.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, FallbackReason>;
}

/// The collaborators one request talks to.
#[derive(Clone)]
pub struct AiClients {
    pub llm: Arc<dyn LanguageModel>,
    pub images: Arc<dyn ImageGenerator>,
    /// `Err` when AI images must not be attempted, with the reason to report.
    pub image_gate: Result<(), FallbackReason>,
}

impl AiClients {
    /// All calls fall back locally.
    pub fn disabled() -> Self {
        Self {
            llm: Arc::new(DisabledClient),
            images: Arc::new(DisabledClient),
            image_gate: Err(FallbackReason::Disabled),
        }
    }

    /// Build according to settings:
    /// * `AI_TEST_MODE=mock` -> deterministic mock client.
    /// * no `OPENAI_API_KEY` -> disabled client.
    /// * otherwise the OpenAI client.
    ///
    /// AI images additionally need `ENABLE_AI_IMAGES=1`.
    pub fn from_settings(settings: &AiSettings) -> Self {
        let image_gate = if !settings.ai_images {
            Err(FallbackReason::Disabled)
        } else if !settings.images_enabled() {
            Err(FallbackReason::MissingCredential)
        } else {
            Ok(())
        };

        if settings.mock {
            let mock = Arc::new(MockClient::default());
            return Self {
                llm: mock.clone(),
                images: mock,
                image_gate,
            };
        }

        match OpenAiClient::from_settings(settings) {
            Some(client) => {
                let client = Arc::new(client);
                info!(
                    target: "feed",
                    model = %settings.model,
                    ai_images = settings.ai_images,
                    "openai client ready"
                );
                Self {
                    llm: client.clone(),
                    images: client,
                    image_gate,
                }
            }
            None => Self {
                image_gate,
                ..Self::disabled()
            },
        }
    }
}

// ------------------------------------------------------------
// OpenAI
// ------------------------------------------------------------

/// OpenAI chat completions + image generation. Requires an API key.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    image_model: String,
    image_size: String,
}

impl OpenAiClient {
    pub fn from_settings(settings: &AiSettings) -> Option<Self> {
        let api_key = settings.api_key.clone()?;
        let http = reqwest::Client::builder()
            .user_agent("curated-news-feed/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .ok()?;
        Some(Self {
            http,
            api_key,
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            image_model: settings.image_model.clone(),
            image_size: settings.image_size.clone(),
        })
    }

    async fn post_json<Req: Serialize + Sync, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp, FallbackReason> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| FallbackReason::Upstream(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FallbackReason::Upstream(format!("status {status}")));
        }
        resp.json::<Resp>()
            .await
            .map_err(|e| FallbackReason::Upstream(e.to_string()))
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, req: Completion<'_>) -> Result<String, FallbackReason> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let body = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: req.system,
                },
                Msg {
                    role: "user",
                    content: req.user,
                },
            ],
            temperature: req.temperature,
        };
        let resp: Resp = self.post_json("/v1/chat/completions", &body).await?;
        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            Err(FallbackReason::EmptyResponse)
        } else {
            Ok(content)
        }
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String, FallbackReason> {
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            prompt: &'a str,
            size: &'a str,
        }
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            data: Vec<Datum>,
        }
        #[derive(Deserialize)]
        struct Datum {
            url: Option<String>,
            b64_json: Option<String>,
        }

        let body = Req {
            model: &self.image_model,
            prompt,
            size: &self.image_size,
        };
        let resp: Resp = self.post_json("/v1/images/generations", &body).await?;
        let first = resp.data.into_iter().next();
        match first {
            Some(Datum { url: Some(u), .. }) if !u.is_empty() => Ok(u),
            Some(Datum {
                b64_json: Some(b), ..
            }) if !b.is_empty() => Ok(format!("data:image/png;base64,{b}")),
            _ => Err(FallbackReason::EmptyResponse),
        }
    }
}

// ------------------------------------------------------------
// Disabled + mock
// ------------------------------------------------------------

/// Always `MissingCredential`; used when no key is configured.
pub struct DisabledClient;

#[async_trait]
impl LanguageModel for DisabledClient {
    async fn complete(&self, _req: Completion<'_>) -> Result<String, FallbackReason> {
        Err(FallbackReason::MissingCredential)
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

#[async_trait]
impl ImageGenerator for DisabledClient {
    async fn generate(&self, _prompt: &str) -> Result<String, FallbackReason> {
        Err(FallbackReason::MissingCredential)
    }
}

/// Deterministic offline client (`AI_TEST_MODE=mock`).
/// Completions echo the last prompt line prefixed with `[mock]`; images
/// return a fixed URL.
#[derive(Debug, Clone)]
pub struct MockClient {
    pub image_url: String,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            image_url: "https://images.invalid/mock.png".to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for MockClient {
    async fn complete(&self, req: Completion<'_>) -> Result<String, FallbackReason> {
        let last = req
            .user
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or_default()
            .trim();
        Ok(format!("[mock] {last}"))
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[async_trait]
impl ImageGenerator for MockClient {
    async fn generate(&self, _prompt: &str) -> Result<String, FallbackReason> {
        Ok(self.image_url.clone())
    }
}

// ------------------------------------------------------------
// Sanitization
// ------------------------------------------------------------

/// First non-empty line, trimmed, without wrapping quotes.
pub fn sanitize_title(input: &str) -> String {
    let line = input
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    line.trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '«' | '»' | '`'))
        .trim()
        .to_string()
}
