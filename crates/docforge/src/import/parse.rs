//! Parsing model replies into section drafts.

use serde_json::Value;

use crate::section::{MAX_LEVEL, SectionDraft};

use super::retry::AttemptError;

/// An element of the reply that was not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    /// The position in the reply array.
    pub index: usize,
    /// Why it was skipped.
    pub reason: String,
}

/// Returns the text between the first opening fence and the last closing
/// fence, or the whole trimmed text when there is none.
pub fn strip_fence(content: &str) -> &str {
    let content = content.trim();
    let Some(start) = content.find("```") else {
        return content;
    };

    let rest = &content[start + 3..];
    // Skip the info string, e.g. `json`.
    let body = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Parses message content into the elements of a JSON array.
pub fn parse_content(content: &str) -> Result<Vec<Value>, AttemptError> {
    let json = strip_fence(content);
    match serde_json::from_str(json) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(AttemptError::Unparsable(format!(
            "expected a list, got {}",
            kind_of(&other)
        ))),
        Err(err) => Err(AttemptError::Unparsable(err.to_string())),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Validates elements, returning the drafts and the skipped elements.
pub fn to_drafts(items: Vec<Value>) -> (Vec<SectionDraft>, Vec<SkippedItem>) {
    let mut drafts = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match to_draft(item) {
            Ok(draft) => drafts.push(draft),
            Err(reason) => {
                log::warn!("import: skipped element #{index}: {reason}");
                skipped.push(SkippedItem { index, reason });
            }
        }
    }

    (drafts, skipped)
}

fn to_draft(item: Value) -> Result<SectionDraft, String> {
    let Value::Object(mut map) = item else {
        return Err(format!("expected an object, got {}", kind_of(&item)));
    };

    let level = match map.get("level") {
        Some(level) => coerce_level(level).ok_or_else(|| format!("invalid level {level}"))?,
        None => return Err("missing level".to_owned()),
    };

    let title = match map.remove("title") {
        Some(Value::String(title)) if !title.trim().is_empty() => title.trim().to_owned(),
        Some(Value::String(_)) => return Err("empty title".to_owned()),
        Some(other) => return Err(format!("title is {}", kind_of(&other))),
        None => return Err("missing title".to_owned()),
    };

    let content = match map.remove("content") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(content)) => content,
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(format!("content is {}", kind_of(&other))),
    };

    Ok(SectionDraft::new(level, title, content))
}

/// Accepts integers, integral floats and numeric strings in `1..=3`.
fn coerce_level(value: &Value) -> Option<u8> {
    let level = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0. {
                    return None;
                }
                f as i64
            }
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i,
                Err(_) => {
                    let f = s.parse::<f64>().ok()?;
                    if !f.is_finite() || f.fract() != 0. {
                        return None;
                    }
                    f as i64
                }
            }
        }
        _ => return None,
    };

    u8::try_from(level)
        .ok()
        .filter(|l| (1..=MAX_LEVEL).contains(l))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_fence("Sure!\n```\n[2]\n```\nBye"), "[2]");
        assert_eq!(strip_fence("  [3]  "), "[3]");
        assert_eq!(strip_fence("```json\n[4]"), "[4]");
    }

    #[test]
    fn fence_inside_content_is_kept() {
        let reply = "```json\n[{\"level\": 1, \"title\": \"Code\", \"content\": \"```rust\\nfn main() {}\\n```\"}]\n```";
        let items = parse_content(reply).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["content"], "```rust\nfn main() {}\n```");
    }

    #[test]
    fn non_array_is_unparsable() {
        assert!(matches!(
            parse_content(r#"{"level": 1}"#),
            Err(AttemptError::Unparsable(..))
        ));
        assert!(matches!(
            parse_content("no json here"),
            Err(AttemptError::Unparsable(..))
        ));
        assert_eq!(parse_content("```json\n[]\n```").unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn levels_are_coerced() {
        assert_eq!(coerce_level(&json!(2)), Some(2));
        assert_eq!(coerce_level(&json!(3.0)), Some(3));
        assert_eq!(coerce_level(&json!(" 1 ")), Some(1));
        assert_eq!(coerce_level(&json!("2.0")), Some(2));
        assert_eq!(coerce_level(&json!(1.5)), None);
        assert_eq!(coerce_level(&json!(4)), None);
        assert_eq!(coerce_level(&json!(0)), None);
        assert_eq!(coerce_level(&json!(-1)), None);
        assert_eq!(coerce_level(&json!("one")), None);
        assert_eq!(coerce_level(&json!(true)), None);
    }

    #[test]
    fn bad_elements_are_skipped() {
        let items = vec![
            json!({"level": 1, "title": "T", "content": "C"}),
            json!("just a string"),
            json!({"level": 5, "title": "deep"}),
            json!({"level": 2, "title": "  "}),
            json!({"level": 2}),
            json!({"level": "2", "title": " N ", "content": 42}),
            json!({"title": "no level"}),
        ];

        let (drafts, skipped) = to_drafts(items);
        assert_eq!(
            drafts,
            [SectionDraft::new(1, "T", "C"), SectionDraft::new(2, "N", "42")]
        );
        let indices: Vec<_> = skipped.iter().map(|s| s.index).collect();
        assert_eq!(indices, [1, 2, 3, 4, 6]);
    }
}
