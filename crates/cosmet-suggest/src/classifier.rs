use cosmet_core::contracts::{clamp_confidence, SuggestionCandidate, TaxonCandidate};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// The classifier is pinned to the offered candidate set and told to return
/// an empty list rather than guess. Synonym hints cover the vocabulary gap
/// between product listings and the tree's Japanese labels.
const SYSTEM_PROMPT: &str = r#"あなたはコスメ商品のカテゴリ分類器です。
入力:
- item_text: 商品名やブランド名などの短いテキスト
- taxons: 候補Taxonのリスト（各要素に id, name, path を含む）。このリストは小カテゴリ（葉）のみ。
厳守:
- **必ず taxons の中から**最も適切な小カテゴリを上位3件まで選ぶこと。
- 適切な候補が無ければ空配列[]を返す（無理に推測しない）。
- 出力は JSON オブジェクト1つのみ:
{"candidates":[{"taxon_id":123,"path":"メイク用品 > マスカラ","confidence":0.9}]}
- 余計な文章は出力しないこと。

同義語の例:
- 化粧水 = ローション, トナー, toner, lotion
- マスカラ = mascara
- 口紅 = リップスティック, lipstick
- クレンジングオイル = cleansing oil
"#;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classifier call timed out after {0:?}")]
    Timeout(Duration),
    #[error("classifier transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub top_k: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-5-nano".to_string(),
            timeout: Duration::from_secs(25),
            top_k: 3,
        }
    }
}

impl ClassifierConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            ..Self::default()
        }
    }
}

/// Seam for the external classification service. Implementations return
/// `Timeout` only for the bounded-call case; every other failure degrades to
/// an empty list so the caller can fall through to the deterministic ranker.
pub trait TaxonClassifier {
    fn classify(
        &self,
        candidates: &[TaxonCandidate],
        text: &str,
        top_k: usize,
    ) -> Result<Vec<SuggestionCandidate>, ClassifyError>;
}

#[derive(Serialize)]
struct ClassifyPayload<'a> {
    item_text: &'a str,
    taxons: &'a [TaxonCandidate],
    top_k: usize,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    response_format: Value,
    messages: Vec<ChatMessage<'a>>,
}

pub struct HttpClassifier {
    client: reqwest::blocking::Client,
    config: ClassifierConfig,
}

impl HttpClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ClassifyError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }

    fn request_body(&self, candidates: &[TaxonCandidate], text: &str, top_k: usize) -> ChatRequest<'_> {
        let payload = ClassifyPayload {
            item_text: text,
            taxons: candidates,
            top_k,
        };
        ChatRequest {
            model: &self.config.model,
            response_format: serde_json::json!({"type": "json_object"}),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: serde_json::to_string(&payload).unwrap_or_default(),
                },
            ],
        }
    }

    /// The deadline can expire while sending or while reading the body; both
    /// must surface as the distinguished timeout, not a generic transport
    /// failure.
    fn transport_error(&self, err: reqwest::Error) -> ClassifyError {
        if err.is_timeout() {
            ClassifyError::Timeout(self.config.timeout)
        } else {
            ClassifyError::Transport(err.to_string())
        }
    }
}

impl TaxonClassifier for HttpClassifier {
    fn classify(
        &self,
        candidates: &[TaxonCandidate],
        text: &str,
        top_k: usize,
    ) -> Result<Vec<SuggestionCandidate>, ClassifyError> {
        let body = self.request_body(candidates, text, top_k);
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Transport(format!(
                "classifier returned status {status}"
            )));
        }

        let envelope: Value = response
            .json()
            .map_err(|err| self.transport_error(err))?;
        let content = envelope
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or("{}");

        let parsed = parse_reply(content, top_k);
        if parsed.dropped > 0 {
            tracing::warn!(dropped = parsed.dropped, "classifier reply contained malformed candidate entries");
        }
        Ok(parsed.candidates)
    }
}

#[derive(Debug, Default)]
pub struct ParsedReply {
    pub candidates: Vec<SuggestionCandidate>,
    /// Entries discarded during coercion (missing or non-numeric id).
    pub dropped: usize,
}

/// Adversarial parse of the raw classifier reply. Direct JSON parse first,
/// then a salvage pass over the first `{` .. last `}` substring, and on total
/// failure zero candidates rather than an error. Entries are truncated to
/// `top_k` in reply order; the service's own ranking is kept as-is.
pub fn parse_reply(raw: &str, top_k: usize) -> ParsedReply {
    let Some(value) = parse_or_salvage(raw) else {
        return ParsedReply::default();
    };

    let entries = match value.get("candidates").and_then(Value::as_array) {
        Some(entries) => entries,
        None => return ParsedReply::default(),
    };

    let mut parsed = ParsedReply::default();
    for entry in entries.iter().take(top_k) {
        match coerce_candidate(entry) {
            Some(candidate) => parsed.candidates.push(candidate),
            None => parsed.dropped += 1,
        }
    }
    parsed
}

fn parse_or_salvage(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Some(value);
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

fn coerce_candidate(entry: &Value) -> Option<SuggestionCandidate> {
    let taxon_id = coerce_id(entry.get("taxon_id")?)?;
    let path = entry
        .get("path")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let confidence = entry
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.5);
    Some(SuggestionCandidate {
        taxon_id,
        path: path.to_string(),
        confidence: clamp_confidence(confidence),
    })
}

fn coerce_id(value: &Value) -> Option<i64> {
    if let Some(id) = value.as_i64() {
        return Some(id);
    }
    value.as_str()?.trim().parse().ok()
}
