// src/enrich/image.rs
//! Image selection: provider image, AI illustration, or an SVG placeholder.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use super::ai_adapter::AiClients;
use super::{with_timeout, Enrichment};
use crate::text::truncate_chars;

const PLACEHOLDER_TITLE_MAX: usize = 60;
const PLACEHOLDER_DEFAULT: &str = "Noticia";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub url: String,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
}

/// 1024x576 gradient card with the title, as a base64 `data:` URL.
pub fn placeholder_svg(title: &str) -> String {
    let title = title.trim();
    let title = if title.is_empty() { PLACEHOLDER_DEFAULT } else { title };
    let text = html_escape::encode_text(&truncate_chars(title, PLACEHOLDER_TITLE_MAX)).to_string();
    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='1024' height='576'>\n  \
<defs>\n    <linearGradient id='g' x1='0' x2='1' y1='0' y2='1'>\n      \
<stop stop-color='#eef2ff' offset='0'/>\n      <stop stop-color='#e2e8f0' offset='1'/>\n    \
</linearGradient>\n  </defs>\n  <rect fill='url(#g)' width='100%' height='100%'/>\n  \
<text x='50%' y='50%' dominant-baseline='middle' text-anchor='middle'\n        \
font-family='system-ui,Arial' font-size='36' fill='#334155'>{text}</text>\n</svg>"
    );
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

pub fn image_prompt(title: &str, topic_name: &str) -> String {
    format!(
        "Ilustración editorial clara y minimalista relacionada con {topic_name}. Tema/noticia: {title}. Sin texto, sin logos de marcas, formato panorámico."
    )
}

/// AI illustration when allowed, else placeholder.
pub async fn generate_or_placeholder(
    title: &str,
    topic_name: &str,
    ai: &AiClients,
    timeout: Duration,
) -> Enrichment<ImageRef> {
    let placeholder = || ImageRef {
        url: placeholder_svg(title),
        is_ai: false,
    };
    if let Err(reason) = &ai.image_gate {
        return Enrichment::Fallback {
            value: placeholder(),
            reason: reason.clone(),
        };
    }
    let prompt = image_prompt(title, topic_name);
    match with_timeout(timeout, ai.images.generate(&prompt)).await {
        Ok(url) => Enrichment::Succeeded(ImageRef { url, is_ai: true }),
        Err(reason) => Enrichment::Fallback {
            value: placeholder(),
            reason,
        },
    }
}

/// Article image: the provider's own URL first.
pub async fn pick_image(
    image_url: Option<&str>,
    title: &str,
    topic_name: &str,
    ai: &AiClients,
    timeout: Duration,
) -> Enrichment<ImageRef> {
    if let Some(url) = image_url.map(str::trim).filter(|u| !u.is_empty()) {
        return Enrichment::Succeeded(ImageRef {
            url: url.to_string(),
            is_ai: false,
        });
    }
    generate_or_placeholder(title, topic_name, ai, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiSettings;
    use crate::error::FallbackReason;

    fn decode(data_url: &str) -> String {
        let b64 = data_url
            .strip_prefix("data:image/svg+xml;base64,")
            .expect("svg data url");
        String::from_utf8(STANDARD.decode(b64).unwrap()).unwrap()
    }

    #[test]
    fn placeholder_escapes_and_caps_title() {
        let svg = decode(&placeholder_svg("<script>alert(1)</script> & more"));
        assert!(svg.contains("&lt;script&gt;"));
        assert!(!svg.contains("<script>"));

        let long = "x".repeat(200);
        let svg = decode(&placeholder_svg(&long));
        assert!(svg.contains(&"x".repeat(60)));
        assert!(!svg.contains(&"x".repeat(61)));
    }

    #[test]
    fn placeholder_is_deterministic_with_default_title() {
        assert_eq!(placeholder_svg(""), placeholder_svg("Noticia"));
        assert_eq!(placeholder_svg("A"), placeholder_svg("A"));
    }

    #[tokio::test]
    async fn provider_image_wins() {
        let ai = AiClients::disabled();
        let r = pick_image(Some("https://img/x.jpg"), "t", "T", &ai, Duration::from_secs(1)).await;
        assert_eq!(
            r,
            Enrichment::Succeeded(ImageRef { url: "https://img/x.jpg".into(), is_ai: false })
        );
    }

    #[tokio::test]
    async fn no_flag_gives_placeholder() {
        let ai = AiClients::disabled();
        let r = pick_image(Some("  "), "Titular", "T", &ai, Duration::from_secs(1)).await;
        assert_eq!(r.reason(), Some(&FallbackReason::Disabled));
        assert!(!r.value().is_ai);
        assert!(r.value().url.starts_with("data:image/svg+xml;base64,"));
    }

    #[tokio::test]
    async fn mock_generates_ai_image() {
        let ai = AiClients::from_settings(&AiSettings {
            mock: true,
            ai_images: true,
            ..AiSettings::default()
        });
        let r = pick_image(None, "Titular", "T", &ai, Duration::from_secs(1)).await;
        assert!(!r.is_fallback());
        assert!(r.value().is_ai);
    }
}
