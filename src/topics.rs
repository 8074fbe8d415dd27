// src/topics.rs
//! Topic resolver: free-text topic -> canonical `TopicConfig`.
//!
//! The rule table is an ordered list checked against the normalized topic
//! (lowercase, no diacritics); the first rule whose trigger matches wins.
//! Unknown topics get a generic config built from the raw string itself.
//! The table is built in and can be replaced at startup by a TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tracing::{info, warn};

use crate::text::strip_diacritics;

pub const DEFAULT_TOPICS_CONFIG_PATH: &str = "config/topics.toml";
pub const ENV_TOPICS_CONFIG_PATH: &str = "TOPICS_CONFIG_PATH";
pub const DEFAULT_TOPIC: &str = "tecnología";

/// Resolved topic for one request. Immutable once built.
#[derive(Debug, Clone)]
pub struct TopicConfig {
    pub name: String,
    pub search_query: String,
    pub include_patterns: Vec<Regex>,
    pub exclude_patterns: Vec<Regex>,
}

impl TopicConfig {
    /// Topic match: at least one include pattern hits and no exclude pattern does.
    pub fn matches(&self, text: &str) -> bool {
        let included = self.include_patterns.iter().any(|re| re.is_match(text));
        let excluded = self.exclude_patterns.iter().any(|re| re.is_match(text));
        included && !excluded
    }

    fn generic(raw: &str) -> Self {
        let literal = RegexBuilder::new(&regex::escape(raw))
            .case_insensitive(true)
            .build()
            .ok();
        Self {
            name: raw.to_string(),
            search_query: raw.to_string(),
            include_patterns: literal.into_iter().collect(),
            exclude_patterns: Vec::new(),
        }
    }
}

// Regex has no PartialEq; compare by source pattern.
impl PartialEq for TopicConfig {
    fn eq(&self, other: &Self) -> bool {
        fn sources(v: &[Regex]) -> Vec<&str> {
            v.iter().map(Regex::as_str).collect()
        }
        self.name == other.name
            && self.search_query == other.search_query
            && sources(&self.include_patterns) == sources(&other.include_patterns)
            && sources(&self.exclude_patterns) == sources(&other.exclude_patterns)
    }
}

/// Lowercase, trim, strip diacritics.
pub fn normalize_topic(s: &str) -> String {
    strip_diacritics(s).to_lowercase().trim().to_string()
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct TopicsFile {
    #[serde(default = "default_topic")]
    pub default_topic: String,
    #[serde(default, rename = "topic")]
    pub topics: Vec<TopicRuleCfg>,
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicRuleCfg {
    pub key: String,
    pub name: String,
    /// Regex tested against the normalized topic string.
    pub trigger: String,
    pub query: String,
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug)]
struct CompiledRule {
    key: String,
    trigger: Regex,
    config: TopicConfig,
}

/// Ordered, read-only topic table.
#[derive(Debug)]
pub struct TopicTable {
    default_topic: String,
    rules: Vec<CompiledRule>,
}

fn compile_ci(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("compiling pattern {pattern:?}"))
}

impl TopicTable {
    pub fn from_file_cfg(cfg: TopicsFile) -> Result<Self> {
        let mut rules = Vec::with_capacity(cfg.topics.len());
        for t in cfg.topics {
            let trigger = Regex::new(&t.trigger)
                .with_context(|| format!("topic '{}': bad trigger", t.key))?;
            let include_patterns = t
                .include
                .iter()
                .map(|p| compile_ci(p))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("topic '{}': bad include pattern", t.key))?;
            let exclude_patterns = t
                .exclude
                .iter()
                .map(|p| compile_ci(p))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("topic '{}': bad exclude pattern", t.key))?;
            rules.push(CompiledRule {
                key: t.key,
                trigger,
                config: TopicConfig {
                    name: t.name,
                    search_query: t.query,
                    include_patterns,
                    exclude_patterns,
                },
            });
        }
        Ok(Self {
            default_topic: cfg.default_topic,
            rules,
        })
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: TopicsFile = toml::from_str(s).context("parsing topics toml")?;
        Self::from_file_cfg(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading topics from {}", path.display()))?;
        Self::from_toml_str(&s)
    }

    /// Built-in table: astrophotography, AI, technology (checked in that order).
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_TOPICS).expect("built-in topic table is valid")
    }

    /// $TOPICS_CONFIG_PATH, then `config/topics.toml`, then the built-in table.
    /// A broken file is logged and ignored.
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_TOPICS_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOPICS_CONFIG_PATH));
        if !path.exists() {
            return Self::builtin();
        }
        match Self::from_path(&path) {
            Ok(t) => {
                info!(
                    target: "feed",
                    path = %path.display(),
                    rules = t.rules.len(),
                    "topic table loaded"
                );
                t
            }
            Err(e) => {
                warn!(
                    target: "feed",
                    path = %path.display(),
                    error = ?e,
                    "topic table invalid, using built-in"
                );
                Self::builtin()
            }
        }
    }

    pub fn default_topic(&self) -> &str {
        &self.default_topic
    }

    pub fn keys(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.key.as_str()).collect()
    }

    /// Never fails. Empty input resolves the default topic.
    pub fn resolve(&self, raw: &str) -> TopicConfig {
        let raw = raw.trim();
        let raw = if raw.is_empty() { self.default_topic.trim() } else { raw };
        let normalized = normalize_topic(raw);

        self.rules
            .iter()
            .find(|r| r.trigger.is_match(&normalized))
            .map(|r| r.config.clone())
            .unwrap_or_else(|| TopicConfig::generic(raw))
    }
}

impl Default for TopicTable {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN_TOPICS: &str = r#"
default_topic = "tecnología"

[[topic]]
key = "astro"
name = "Astrofotografía"
trigger = "astro"
query = 'astrofotografia OR astrophotography OR "fotografia astronomica" OR telescopio OR "via lactea" OR "cielo profundo" OR nebulosa OR cometa'
include = ['astrofotograf|astrophotograph|fotografia astronom|via lactea|nebulosa|cometa|telescopi|cielo profundo']

[[topic]]
key = "ai"
name = "Inteligencia Artificial"
trigger = '(^|\s)ai(\s|$)|inteligencia artificial|aprendizaje|machine'
query = '"inteligencia artificial" OR IA OR "machine learning" OR "aprendizaje automatico" OR "deep learning" OR OpenAI OR ChatGPT OR LLM OR "modelo generativo" OR transformer'
include = ['inteligencia artificial|\bIA\b|machine learning|aprendizaje automatico|deep learning|openai|chatgpt|modelo generativo|\bLLM\b|transformer']

[[topic]]
key = "tecno"
name = "Tecnología"
trigger = "tecno"
query = '"tecnologia" OR tecnologia OR smartphone OR "telefono inteligente" OR Android OR iPhone OR Apple OR Google OR Microsoft OR software OR hardware OR gadget OR chip OR semiconductor OR ciberseguridad OR internet'
include = [
  'tecnolog',
  'smartphone',
  'm[óo]vil|telefono inteligente',
  'android',
  'iphone|ios|apple',
  'microsoft|windows',
  'google|pixel',
  'software|hardware|gadget|chip|semiconductor|ciberseguridad|internet|router|wifi',
]
exclude = ['f[úu]tbol|tenis|baloncesto|moda|celebridad|cocina|viajes']
"#;
