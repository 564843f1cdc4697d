//! Content-suggestion collaborator.
//!
//! Drafts an article (title + body) from a short topic summary. The only
//! production backend is the Gemini `generateContent` endpoint; the handler
//! sees an `Arc<dyn ContentSuggester>` so tests can swap in a canned one.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::{config::AppConfig, models::ArticleSuggestion};

pub const MAX_TITLE_LEN: usize = 200;
const FALLBACK_SCAN_LINES: usize = 10;
const FALLBACK_TITLE_MAX: usize = 150;
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("content generation is not configured")]
    NotConfigured,

    #[error("request to the generation service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation service returned no text")]
    Empty,
}

/// ContentSuggester Trait
///
/// `locale` is one of `fr`, `en`, `es`; anything else is treated as `fr`.
#[async_trait]
pub trait ContentSuggester: Send + Sync {
    async fn suggest_article(
        &self,
        topic: &str,
        locale: &str,
    ) -> Result<ArticleSuggestion, SuggestionError>;
}

pub type SuggesterState = Arc<dyn ContentSuggester>;

/// Builds the suggester described by `config`: Gemini when an API key is set,
/// otherwise one that always reports `NotConfigured`.
pub fn from_config(config: &AppConfig) -> Result<SuggesterState, SuggestionError> {
    match &config.gemini_api_key {
        Some(key) if !key.trim().is_empty() => Ok(Arc::new(GeminiSuggester::new(
            key.clone(),
            config.gemini_model.clone(),
            Duration::from_secs(config.suggestion_timeout_secs),
        )?)),
        _ => {
            tracing::warn!("GEMINI_API_KEY not set; article suggestions are disabled");
            Ok(Arc::new(DisabledSuggester))
        }
    }
}

// --- Gemini ---

#[derive(Clone)]
pub struct GeminiSuggester {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

impl GeminiSuggester {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, SuggestionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Points the client at another host, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ContentSuggester for GeminiSuggester {
    async fn suggest_article(
        &self,
        topic: &str,
        locale: &str,
    ) -> Result<ArticleSuggestion, SuggestionError> {
        let preview: String = topic.chars().take(50).collect();
        tracing::info!(model = %self.model, locale, topic = %preview, "requesting article draft");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt(topic, locale) }] }]
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SuggestionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.json::<GenerateResponse>().await?.text();
        parse_suggestion(&raw, topic)
    }
}

// --- Test doubles / fallbacks ---

/// Used when no API key is configured.
pub struct DisabledSuggester;

#[async_trait]
impl ContentSuggester for DisabledSuggester {
    async fn suggest_article(&self, _: &str, _: &str) -> Result<ArticleSuggestion, SuggestionError> {
        Err(SuggestionError::NotConfigured)
    }
}

/// StaticSuggester
///
/// Feeds a canned raw answer through the same parsing as the real client, or
/// fails when `raw` is `None`.
#[derive(Clone, Default)]
pub struct StaticSuggester {
    pub raw: Option<String>,
}

impl StaticSuggester {
    pub fn answering(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
        }
    }

    pub fn failing() -> Self {
        Self { raw: None }
    }
}

#[async_trait]
impl ContentSuggester for StaticSuggester {
    async fn suggest_article(
        &self,
        topic: &str,
        _locale: &str,
    ) -> Result<ArticleSuggestion, SuggestionError> {
        match &self.raw {
            Some(raw) => parse_suggestion(raw, topic),
            None => Err(SuggestionError::Status {
                status: 503,
                body: "unavailable".into(),
            }),
        }
    }
}

// --- Prompting & parsing ---

/// `fr`, `en` or `es`; anything else falls back to `fr`.
pub fn normalize_locale(locale: Option<&str>) -> &'static str {
    match locale.map(|l| l.trim().to_lowercase()).as_deref() {
        Some("en") => "en",
        Some("es") => "es",
        _ => "fr",
    }
}

pub fn prompt(topic: &str, locale: &str) -> String {
    match locale {
        "en" => format!(
            "You are an experienced professional journalist. Based on the following summary, \
             write a complete and engaging blog article.\n\n\
             SUMMARY: {topic}\n\n\
             INSTRUCTIONS:\n\
             1. A catchy, informative title (at most 100 characters)\n\
             2. A well-structured article of 300 to 800 words\n\
             3. Introduction, development and conclusion, in short paragraphs\n\n\
             RETURN ONLY a JSON object of the form \
             {{\"title\": \"...\", \"body\": \"...\"}} with paragraphs separated by line breaks."
        ),
        "es" => format!(
            "Eres un periodista profesional con experiencia. A partir del siguiente resumen, \
             escribe un artículo de blog completo y atractivo.\n\n\
             RESUMEN: {topic}\n\n\
             INSTRUCCIONES:\n\
             1. Un título llamativo e informativo (máximo 100 caracteres)\n\
             2. Un artículo bien estructurado de 300 a 800 palabras\n\
             3. Introducción, desarrollo y conclusión, en párrafos cortos\n\n\
             DEVUELVE ÚNICAMENTE un objeto JSON de la forma \
             {{\"title\": \"...\", \"body\": \"...\"}} con párrafos separados por saltos de línea."
        ),
        _ => format!(
            "Tu es un journaliste professionnel expérimenté. À partir du résumé suivant, \
             rédige un article de blog complet et engageant.\n\n\
             RÉSUMÉ : {topic}\n\n\
             INSTRUCTIONS :\n\
             1. Un titre accrocheur et informatif (100 caractères maximum)\n\
             2. Un article structuré de 300 à 800 mots\n\
             3. Introduction, développement et conclusion, en paragraphes courts\n\n\
             RETOURNE UNIQUEMENT un objet JSON de la forme \
             {{\"title\": \"...\", \"body\": \"...\"}} avec des paragraphes séparés par des sauts de ligne."
        ),
    }
}

#[derive(Deserialize)]
struct RawSuggestion {
    #[serde(alias = "titre", default)]
    title: String,
    #[serde(alias = "contenu", default)]
    body: String,
}

/// Turns the model's raw answer into a suggestion.
///
/// A JSON object (optionally inside a code fence) with non-empty `title` and
/// `body` is used as is. Anything else goes through the line-based fallback,
/// which keeps the whole text as body. Only a blank answer is an error.
pub fn parse_suggestion(raw: &str, topic: &str) -> Result<ArticleSuggestion, SuggestionError> {
    if raw.trim().is_empty() {
        return Err(SuggestionError::Empty);
    }

    let parsed = serde_json::from_str::<RawSuggestion>(strip_fences(raw))
        .ok()
        .map(|s| (s.title.trim().to_string(), s.body.trim().to_string()))
        .filter(|(title, body)| !title.is_empty() && !body.is_empty());

    match parsed {
        Some((title, body)) => Ok(ArticleSuggestion {
            title: truncate_title(title),
            body,
        }),
        None => {
            tracing::warn!(raw = %raw, "unstructured generation output; using fallback extraction");
            Ok(fallback(raw, topic))
        }
    }
}

fn strip_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

fn truncate_title(title: String) -> String {
    if title.chars().count() <= MAX_TITLE_LEN {
        return title;
    }
    let mut cut: String = title.chars().take(MAX_TITLE_LEN - 3).collect();
    cut.push_str("...");
    cut
}

fn fallback(raw: &str, topic: &str) -> ArticleSuggestion {
    let title = raw
        .lines()
        .take(FALLBACK_SCAN_LINES)
        .map(str::trim)
        .find(|line| {
            !line.is_empty() && line.chars().count() < FALLBACK_TITLE_MAX && !line.starts_with('{')
        })
        .map(|line| line.trim_matches(|c| c == '"' || c == '\'').trim().to_string())
        .filter(|line| !line.is_empty())
        .unwrap_or_else(|| {
            let head: String = topic.chars().take(50).collect();
            format!("Article about {head}...")
        });

    ArticleSuggestion {
        title,
        body: raw.trim().to_string(),
    }
}
