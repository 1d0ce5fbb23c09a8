//! Decision parsing: what the model wants to do next.
//!
//! In structured mode the model answers with a markdown JSON blob, usually
//! fenced as `json`:
//!
//! ```text
//! { "action": "book_database_search", "action_input": "space travel" }
//! ```
//!
//! The special action `"Final Answer"` carries the reply to the user. Any
//! text before the blob is kept as the step's thought.

use serde::Deserialize;

/// The action name that ends a turn.
pub const FINAL_ANSWER_ACTION: &str = "Final Answer";

/// One parsed model decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Call a capability with a free-text query.
    Invoke { name: String, query: String },
    /// Reply to the user and end the turn.
    FinalAnswer { text: String },
    /// The output could not be understood.
    Malformed { raw: String, reason: String },
}

/// A decision plus any free-form reasoning the model wrote around it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDecision {
    pub thought: Option<String>,
    pub decision: Decision,
}

#[derive(Debug, Deserialize)]
struct ActionBlob {
    action: Option<String>,
    #[serde(default)]
    action_input: serde_json::Value,
}

/// Parse a structured-mode reply.
pub fn parse_structured(raw: &str) -> ParsedDecision {
    let malformed = |reason: &str| ParsedDecision {
        thought: None,
        decision: Decision::Malformed {
            raw: raw.to_string(),
            reason: reason.to_string(),
        },
    };

    if raw.trim().is_empty() {
        return malformed("empty response");
    }

    let Some((start, json)) = extract_json(raw) else {
        return malformed("no JSON object found");
    };

    let blob: ActionBlob = match serde_json::from_str(json) {
        Ok(blob) => blob,
        Err(e) => return malformed(&format!("invalid JSON: {e}")),
    };

    let Some(action) = blob.action.map(|a| a.trim().to_string()).filter(|a| !a.is_empty())
    else {
        return malformed("missing \"action\" field");
    };

    let thought = Some(strip_fence_opening(&raw[..start]).trim().to_string()).filter(|t| !t.is_empty());
    let input = input_text(blob.action_input);

    let decision = if action == FINAL_ANSWER_ACTION {
        Decision::FinalAnswer { text: input }
    } else {
        Decision::Invoke {
            name: action,
            query: input,
        }
    };

    ParsedDecision { thought, decision }
}

/// Parse a direct-mode reply: the whole text is the answer.
pub fn parse_direct(raw: &str) -> ParsedDecision {
    ParsedDecision {
        thought: None,
        decision: Decision::FinalAnswer {
            text: raw.trim().to_string(),
        },
    }
}

/// Locate the JSON object: inside a code fence if there is one, otherwise
/// a `{ ... }` span ending at the last `}` that parses as JSON. Returns the
/// byte offset where the blob (or its fence) begins.
fn extract_json(raw: &str) -> Option<(usize, &str)> {
    if let Some(fence) = raw.find("```") {
        let after = &raw[fence + 3..];
        // Skip the language tag line ("json", "JSON", or nothing)
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        let body = match body.find("```") {
            Some(end) => &body[..end],
            None => body,
        };
        if let (Some(open), Some(close)) = (body.find('{'), body.rfind('}'))
            && open < close
        {
            return Some((fence, &body[open..=close]));
        }
    }

    let close = raw.rfind('}')?;
    let mut opens = raw[..close].match_indices('{').map(|(i, _)| i);
    let first = opens.next()?;

    // Prose before the blob may hold braces of its own
    let parses = |open: usize| serde_json::from_str::<serde_json::Value>(&raw[open..=close]).is_ok();
    let open = std::iter::once(first)
        .chain(opens.rev())
        .find(|&open| parses(open))
        .unwrap_or(first);
    Some((open, &raw[open..=close]))
}

fn strip_fence_opening(text: &str) -> &str {
    text.trim_end().trim_end_matches("```json").trim_end_matches("```")
}

/// `action_input` is normally a string; tolerate `{"query": "..."}` and
/// other shapes by rendering them.
fn input_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Object(mut map) => match map.remove("query") {
            Some(serde_json::Value::String(q)) => q,
            Some(other) => {
                map.insert("query".into(), other);
                serde_json::Value::Object(map).to_string()
            }
            None => serde_json::Value::Object(map).to_string(),
        },
        other => other.to_string(),
    }
}
