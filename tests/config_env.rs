// tests/config_env.rs
//
// Environment-driven configuration. These tests mutate process env vars,
// so they run serially.

use std::io::Write as _;

use serial_test::serial;
use tempfile::NamedTempFile;

use curated_news_feed::config::{AiSettings, FeedConfig};
use curated_news_feed::engine::FeedEngine;
use curated_news_feed::topics::{TopicTable, ENV_TOPICS_CONFIG_PATH};

const FEED_VARS: &[&str] = &[
    "NEWS_WINDOW_HOURS",
    "NEWS_MAX_ARTICLES",
    "NEWS_QUOTA_PRIMARY",
    "NEWS_QUOTA_SECONDARY",
    "NEWS_DUP_THRESHOLD",
    "NEWS_DEFAULT_TOPIC",
    "NEWSAPI_KEY",
    "OPENAI_API_KEY",
    "ENABLE_AI_IMAGES",
    "AI_TEST_MODE",
    ENV_TOPICS_CONFIG_PATH,
];

fn clear_env() {
    for k in FEED_VARS {
        std::env::remove_var(k);
    }
}

#[test]
#[serial]
fn feed_config_reads_env() {
    clear_env();
    std::env::set_var("NEWS_WINDOW_HOURS", "12");
    std::env::set_var("NEWS_MAX_ARTICLES", "8");
    std::env::set_var("NEWS_QUOTA_PRIMARY", "5");
    std::env::set_var("NEWS_QUOTA_SECONDARY", "3");
    std::env::set_var("NEWS_DUP_THRESHOLD", "0.5");
    std::env::set_var("NEWSAPI_KEY", "test-key");

    let c = FeedConfig::from_env();
    assert_eq!(c.window_hours, 12.0);
    assert_eq!(c.quota.capacity, 8);
    assert_eq!(c.quota.primary, 5);
    assert_eq!(c.quota.secondary, 3);
    assert_eq!(c.dup_threshold, 0.5);
    assert_eq!(c.newsapi_key.as_deref(), Some("test-key"));
    clear_env();
}

#[test]
#[serial]
fn ai_settings_read_env() {
    clear_env();
    std::env::set_var("AI_TEST_MODE", "mock");
    std::env::set_var("ENABLE_AI_IMAGES", "true");

    let s = AiSettings::from_env();
    assert!(s.mock);
    assert!(s.images_enabled());
    assert!(!s.has_credential());
    clear_env();
}

#[test]
#[serial]
fn topic_table_loads_from_env_path() {
    clear_env();
    let mut f = NamedTempFile::new().expect("temp file");
    writeln!(
        f,
        r#"
default_topic = "volcanes"

[[topic]]
key = "volc"
name = "Vulcanología"
trigger = "volcan"
query = "volcán OR erupción"
include = ['volc[aá]n|erupci[oó]n']
"#
    )
    .expect("write toml");
    std::env::set_var(ENV_TOPICS_CONFIG_PATH, f.path());

    let t = TopicTable::load_default();
    assert_eq!(t.keys(), vec!["volc"]);
    assert_eq!(t.resolve("Volcán").name, "Vulcanología");
    assert_eq!(t.resolve("").name, "Vulcanología");
    // rules from the built-in table are gone
    assert_eq!(t.resolve("astro").name, "astro");
    clear_env();
}

#[test]
#[serial]
fn broken_topic_file_falls_back_to_builtin() {
    clear_env();
    let mut f = NamedTempFile::new().expect("temp file");
    writeln!(
        f,
        "[[topic]]\nkey = \"x\"\nname = \"X\"\ntrigger = \"(\"\nquery = \"x\"\ninclude = []"
    )
    .expect("write toml");
    std::env::set_var(ENV_TOPICS_CONFIG_PATH, f.path());

    let t = TopicTable::load_default();
    let builtin = TopicTable::builtin();
    assert_eq!(t.keys(), builtin.keys());
    clear_env();
}

#[test]
#[serial]
fn engine_from_env_honours_default_topic_override() {
    clear_env();
    std::env::set_var("NEWS_DEFAULT_TOPIC", "astrofotografía");
    std::env::set_var(ENV_TOPICS_CONFIG_PATH, "/nonexistent/topics.toml");

    let e = FeedEngine::from_env();
    assert_eq!(e.resolve_topic("   ").name, "Astrofotografía");
    assert!(!e.diagnostics().has_newsapi);
    clear_env();
}
