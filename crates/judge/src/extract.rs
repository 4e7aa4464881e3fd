//! Tolerant extraction of the judge payload from known response envelopes.
//!
//! Deployments wrap the model output differently: some endpoints return
//! the JSON payload directly, chat-completions APIs nest it under
//! `choices[].message.content`, others return a list of content blocks.
//! Each known shape gets its own [`ResponseExtractor`]; the chain tries
//! them in order and stops at the first match.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// One known response-envelope shape.
pub trait ResponseExtractor: Send + Sync {
    /// Shape name for logging.
    fn name(&self) -> &'static str;

    /// Pull the payload text out of the raw body, if the body matches
    /// this shape.
    fn extract(&self, body: &str) -> Option<String>;
}

/// Chat-completions envelope: `choices[0].message.content`.
pub struct ChatCompletion;

impl ResponseExtractor for ChatCompletion {
    fn name(&self) -> &'static str {
        "chat_completion"
    }

    fn extract(&self, body: &str) -> Option<String> {
        let value: Value = serde_json::from_str(body).ok()?;
        let content = value
            .get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()?;
        Some(content.to_string())
    }
}

/// Content-block envelope: `content[].text`, blocks concatenated.
pub struct ContentBlocks;

impl ResponseExtractor for ContentBlocks {
    fn name(&self) -> &'static str {
        "content_blocks"
    }

    fn extract(&self, body: &str) -> Option<String> {
        let value: Value = serde_json::from_str(body).ok()?;
        let blocks = value.get("content")?.as_array()?;
        let mut text = String::new();
        for block in blocks {
            if let Some(t) = block.get("text").and_then(Value::as_str) {
                text.push_str(t);
            }
        }
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// The body itself is the payload. Always matches; keep it last.
pub struct DirectText;

impl ResponseExtractor for DirectText {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn extract(&self, body: &str) -> Option<String> {
        // A bare JSON string is unwrapped; anything else passes through.
        if let Ok(Value::String(s)) = serde_json::from_str::<Value>(body) {
            return Some(s);
        }
        Some(body.to_string())
    }
}

/// Extract the payload text from a raw judge response, trying every
/// known envelope shape in order.
pub fn extract_payload(body: &str) -> Option<String> {
    let extractors: [&dyn ResponseExtractor; 3] = [&ChatCompletion, &ContentBlocks, &DirectText];

    for extractor in extractors {
        if let Some(payload) = extractor.extract(body) {
            tracing::debug!(shape = extractor.name(), "judge payload extracted");
            return Some(payload);
        }
    }
    None
}

/// Strip markdown code-fence markers around a payload.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

/// The JSON object slice of a payload, when one is present.
fn json_object_fragment(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start <= end).then(|| &text[start..=end])
}

/// Parse the structured payload out of a raw judge response: unwrap the
/// envelope, strip fences, isolate the JSON object, deserialize.
pub fn parse_payload<T: DeserializeOwned>(body: &str) -> Option<T> {
    let payload = extract_payload(body)?;
    let clean = strip_code_fences(&payload);
    let fragment = json_object_fragment(clean)?;
    serde_json::from_str(fragment).ok()
}
