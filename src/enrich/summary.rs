// src/enrich/summary.rs
//! Summary shaping: sentence segmentation, the local fallback summary and
//! the prompts sent to the summarization collaborator.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::CandidateArticle;

pub const MIN_LINES: usize = 5;
pub const MAX_LINES: usize = 10;

pub const SUMMARY_SYSTEM: &str = "Eres un asistente que traduce y resume noticias al español con precisión y neutralidad. Devuelve 5–10 LÍNEAS, cada línea una frase.";

static RE_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;]\s+").expect("clause regex"));
static RE_TRUNCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*…?\s*\[\+\d+ chars\]\s*$").expect("truncation regex"));
static RE_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*•·]|\d+[.)])\s+").expect("bullet regex"));

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Uppercase letters, digits and opening quotes/marks start a sentence.
fn opens_sentence(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit() || matches!(c, '¿' | '¡' | '"' | '«' | '“' | '\'')
}

/// Split on `.`/`!`/`?` followed by whitespace and then a capital letter,
/// digit or opening mark (or end of text). Newlines are treated as spaces.
pub fn split_sentences(text: &str) -> Vec<String> {
    let flat: Vec<char> = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut i = 0;
    while i < flat.len() {
        let c = flat[i];
        cur.push(c);
        if is_terminal(c) && flat.get(i + 1).is_some_and(|n| n.is_whitespace()) {
            let mut j = i + 1;
            while j < flat.len() && flat[j].is_whitespace() {
                j += 1;
            }
            if j == flat.len() || opens_sentence(flat[j]) {
                push_trimmed(&mut out, &cur);
                cur.clear();
                i = j;
                continue;
            }
        }
        i += 1;
    }
    push_trimmed(&mut out, &cur);
    out
}

fn push_trimmed(out: &mut Vec<String>, s: &str) {
    let t = s.trim();
    if !t.is_empty() {
        out.push(t.to_string());
    }
}

/// Sentences as lines, capped at `max`. When there are fewer than `min`
/// sentences, they are split further on commas/semicolons. The result can
/// still be shorter than `min` when the text is too short.
pub fn segment_lines(text: &str, min: usize, max: usize) -> Vec<String> {
    let mut lines = split_sentences(text);
    if lines.len() < min {
        let finer: Vec<String> = lines
            .iter()
            .flat_map(|s| {
                RE_CLAUSE
                    .split(s)
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        if finer.len() > lines.len() {
            lines = finer;
        }
    }
    lines.truncate(max);
    lines
}

/// Drop NewsAPI's "… [+1234 chars]" tail.
pub fn strip_truncation_marker(s: &str) -> String {
    RE_TRUNCATION.replace(s, "").trim().to_string()
}

/// Lines of a model answer: one per non-empty line, bullets/numbering
/// removed, any copy of `marker` dropped (it is appended by us).
pub fn model_lines(text: &str, marker: &str, min: usize, max: usize) -> Vec<String> {
    let marker_l = marker.to_lowercase();
    let lines: Vec<String> = text
        .lines()
        .map(|l| RE_BULLET.replace(l, "").trim().to_string())
        .filter(|l| !l.is_empty())
        .filter(|l| !l.to_lowercase().contains(&marker_l))
        .collect();
    if lines.len() == 1 {
        return segment_lines(&lines[0], min, max);
    }
    lines.into_iter().take(max).collect()
}

/// Generic lines used once the context lines are exhausted. `MIN_LINES`
/// distinct entries, so padding always reaches the minimum.
const FILLER_LINES: [&str; MIN_LINES] = [
    "Noticia en desarrollo.",
    "Consulta la fuente para el texto completo.",
    "Resumen generado automáticamente.",
    "No hay más datos en la descripción.",
    "Información sujeta a actualización.",
];

/// Article-specific lines used first when padding a short summary.
fn context_lines(article: &CandidateArticle) -> Vec<String> {
    let mut out = Vec::with_capacity(5);
    if !article.title.trim().is_empty() {
        out.push(article.title.trim().to_string());
    }
    out.push(format!("Fuente: {}.", article.source_name));
    out.push(match article.published_at {
        Some(ts) => format!("Publicado: {}.", ts.format("%Y-%m-%d %H:%M UTC")),
        None => "Fecha de publicación no disponible.".to_string(),
    });
    out.push(if article.url.is_empty() {
        "Enlace no disponible.".to_string()
    } else {
        format!("Enlace: {}", article.url)
    });
    out.push("Más detalles en el enlace original.".to_string());
    out
}

/// Fit `body` into `[MIN_LINES, MAX_LINES]` total lines, marker included.
pub fn finish_summary(
    mut body: Vec<String>,
    article: &CandidateArticle,
    marker: Option<&str>,
) -> String {
    let reserve = usize::from(marker.is_some());
    let (min, max) = (MIN_LINES - reserve, MAX_LINES - reserve);

    let mut seen = std::collections::HashSet::new();
    body.retain(|l| seen.insert(l.clone()));
    if body.is_empty() {
        body.push("Resumen no disponible.".to_string());
    }
    let fillers = FILLER_LINES.iter().map(|l| l.to_string());
    for extra in context_lines(article).into_iter().chain(fillers) {
        if body.len() >= min {
            break;
        }
        if !body.contains(&extra) {
            body.push(extra);
        }
    }
    body.truncate(max);
    if let Some(m) = marker {
        body.push(m.to_string());
    }
    body.join("\n")
}

/// Local summary from description and body text, no network.
pub fn local_summary(article: &CandidateArticle, marker: Option<&str>) -> String {
    let reserve = usize::from(marker.is_some());
    let body = article
        .raw_body
        .as_deref()
        .map(strip_truncation_marker)
        .unwrap_or_default();
    let text = [article.description.trim(), body.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let lines = segment_lines(&text, MIN_LINES - reserve, MAX_LINES - reserve);
    finish_summary(lines, article, marker)
}

/// User prompt for the summarization collaborator.
pub fn summary_prompt(article: &CandidateArticle, translate: bool, marker: &str) -> String {
    let desc = if article.description.trim().is_empty() {
        "(sin descripción)"
    } else {
        article.description.trim()
    };
    if translate {
        format!(
            "Traduce Y resume en ESPAÑOL en 5 a 10 líneas. Cada línea debe ser UNA frase breve separada por SALTO DE LÍNEA. No inventes datos. Al final añade exactamente: \"{marker}\".\nTítulo: {}\nDescripción: {desc}\nEnlace: {}",
            article.title, article.url
        )
    } else {
        format!(
            "Resume en ESPAÑOL en 5 a 10 líneas. Cada línea debe ser UNA frase breve separada por SALTO DE LÍNEA. No inventes datos.\nTítulo: {}\nDescripción: {desc}\nEnlace: {}",
            article.title, article.url
        )
    }
}
