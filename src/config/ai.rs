// src/config/ai.rs
use serde::Serialize;

use super::{non_empty, truthy};

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_OPENAI_IMAGE_MODEL: &str = "OPENAI_IMAGE_MODEL";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_ENABLE_AI_IMAGES: &str = "ENABLE_AI_IMAGES";
pub const ENV_AI_TEST_MODE: &str = "AI_TEST_MODE";

/// Credentials and switches for the translation/summary/image collaborator.
/// A missing key is a supported configuration: every call then falls back locally.
#[derive(Debug, Clone, Serialize)]
pub struct AiSettings {
    #[serde(skip)]
    pub api_key: Option<String>,
    pub model: String,
    pub image_model: String,
    pub image_size: String,
    pub base_url: String,
    /// `ENABLE_AI_IMAGES=1`
    pub ai_images: bool,
    /// `AI_TEST_MODE=mock`: deterministic offline client.
    pub mock: bool,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            image_model: "gpt-image-1".to_string(),
            image_size: "512x288".to_string(),
            base_url: "https://api.openai.com".to_string(),
            ai_images: false,
            mock: false,
        }
    }
}

impl AiSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        Self {
            api_key: non_empty(&lookup, ENV_OPENAI_API_KEY),
            model: non_empty(&lookup, ENV_OPENAI_MODEL).unwrap_or(d.model),
            image_model: non_empty(&lookup, ENV_OPENAI_IMAGE_MODEL).unwrap_or(d.image_model),
            image_size: d.image_size,
            base_url: non_empty(&lookup, ENV_OPENAI_BASE_URL)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(d.base_url),
            ai_images: non_empty(&lookup, ENV_ENABLE_AI_IMAGES).is_some_and(|v| truthy(&v)),
            mock: non_empty(&lookup, ENV_AI_TEST_MODE)
                .is_some_and(|v| v.eq_ignore_ascii_case("mock")),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// AI images need both the flag and a usable client.
    pub fn images_enabled(&self) -> bool {
        self.ai_images && (self.has_credential() || self.mock)
    }
}
