//! Gemini client for narration scripts and footage search terms.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collaborators::{ScriptGenerator, SearchTermGenerator};
use crate::error::{PipelineError, StepResult};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models tried in order until one answers.
const DEFAULT_MODELS: [&str; 3] = ["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    client: Client,
    models: Vec<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            base_url: API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Send `prompt` to each model in turn, returning the first answer.
    ///
    /// `wrap` turns failure text into the caller's error variant.
    async fn generate(
        &self,
        prompt: &str,
        json: bool,
        wrap: fn(String) -> PipelineError,
    ) -> StepResult<String> {
        if self.api_key.is_empty() {
            return Err(wrap("GEMINI_API_KEY is not set".to_string()));
        }

        let mut last_error = None;

        for model in &self.models {
            match self.call_model(model, prompt, json).await {
                Ok(text) => {
                    info!("Gemini model {} answered", model);
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Gemini model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(wrap(
            last_error.unwrap_or_else(|| "No Gemini models configured".to_string()),
        ))
    }

    async fn call_model(&self, model: &str, prompt: &str, json: bool) -> Result<String, String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: json.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("returned {}: {}", status, body));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| format!("unreadable response: {}", e.without_url()))?;

        parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| "no content in response".to_string())
    }
}

#[async_trait]
impl ScriptGenerator for GeminiClient {
    async fn generate_script(&self, topic: &str) -> StepResult<String> {
        let text = self
            .generate(&script_prompt(topic), false, PipelineError::ScriptFailed)
            .await?;
        Ok(clean_script(&text))
    }
}

#[async_trait]
impl SearchTermGenerator for GeminiClient {
    async fn search_terms(
        &self,
        topic: &str,
        count: usize,
        script: &str,
    ) -> StepResult<Vec<String>> {
        let text = self
            .generate(
                &search_terms_prompt(topic, count, script),
                true,
                PipelineError::SearchTermsFailed,
            )
            .await?;
        parse_search_terms(&text)
    }
}

fn script_prompt(topic: &str) -> String {
    format!(
        r#"Generate a script for a short vertical video about: {topic}

The script is read aloud by a text-to-speech voice over stock footage.
- Write 4 to 6 short, punchy sentences of plain narration.
- Open with a hook and end with a memorable closing line.
- Do not include a title, scene directions, speaker names or markdown.
- Return only the narration text."#
    )
}

fn search_terms_prompt(topic: &str, count: usize, script: &str) -> String {
    format!(
        r#"Generate {count} search terms for stock videos about: {topic}

Each term is one to three words describing something visible on screen,
suitable for a stock-footage search engine. Base them on this script:

{script}

Return ONLY a JSON array of strings, for example ["ocean waves", "coral reef"]."#
    )
}

/// Strip markdown emphasis, headings and bracketed directions from a script.
pub fn clean_script(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut depth = 0usize;

    for c in text.chars() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' if depth > 0 => depth -= 1,
            '*' | '#' | '_' | '`' => {}
            _ if depth == 0 => cleaned.push(c),
            _ => {}
        }
    }

    cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a JSON string array, tolerating code fences and surrounding prose.
pub fn parse_search_terms(text: &str) -> StepResult<Vec<String>> {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text).trim();

    if let Ok(terms) = serde_json::from_str::<Vec<String>>(text) {
        return Ok(terms);
    }

    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<Vec<String>>(&text[start..=end]).map_err(|e| {
                PipelineError::search_terms_failed(format!("Invalid search term list: {}", e))
            })
        }
        _ => Err(PipelineError::search_terms_failed(
            "Response contained no search term list",
        )),
    }
}
