use serde_json::Value;

use super::error::Result;
use super::markdown::{tokenize, Block, Inline};
use super::types::NormalizedRecord;

/// Turn a tokenized decision record into a [`NormalizedRecord`].
///
/// Expected layout:
///
/// ```text
/// ---
/// impact: high
/// ---
/// # This is a big decision
///
/// ## Problem Description
/// This was a really hard problem to work on
/// ```
///
/// The first depth-1 heading is the title and every depth-2 heading maps to
/// the first inline text of the paragraph directly after it. Only a malformed
/// front matter block is an error.
pub fn parse(blocks: &[Block]) -> Result<NormalizedRecord> {
    let mut record = NormalizedRecord::default();

    let rest = match blocks.split_first() {
        None => return Ok(record),
        Some((Block::Metadata(raw), rest)) => {
            record.metadata = Some(parse_metadata(raw)?);
            rest
        }
        Some(_) => blocks,
    };

    for (i, block) in rest.iter().enumerate() {
        let Block::Heading { depth, children } = block else {
            continue;
        };
        let Some(text) = first_text(children) else {
            continue;
        };
        match *depth {
            1 if record.title.is_none() => record.title = Some(text.to_string()),
            2 => {
                if let Some(Block::Paragraph { children }) = rest.get(i + 1) {
                    if let Some(body) = first_text(children) {
                        record.sections.insert(text.to_string(), body.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    Ok(record)
}

/// Tokenize and parse raw record text in one step.
pub fn parse_document(text: &str) -> Result<NormalizedRecord> {
    parse(&tokenize(text))
}

/// Blank front matter is `null`, not an error.
fn parse_metadata(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(raw)?;
    Ok(yaml_to_json(yaml))
}

/// Non-string mapping keys are rendered to strings so that a key like `2024`
/// survives instead of failing the conversion.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().map(Value::from).unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_json(v)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn first_text(children: &[Inline]) -> Option<&str> {
    children.first().map(Inline::text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adr::error::AdrError;
    use crate::adr::markdown::BlockKind;
    use serde_json::json;

    #[test]
    fn test_empty_blocks_give_empty_record() {
        let record = parse(&[]).unwrap();
        assert_eq!(record, NormalizedRecord::default());
        assert!(record.metadata.is_none());
    }

    #[test]
    fn test_metadata_matches_direct_yaml_parse() {
        let raw = "status: open\nimpact: high\ntags:\n  - api\n  - storage\nowner:\n  team: infra\n";
        let record = parse(&[Block::Metadata(raw.to_string())]).unwrap();
        assert_eq!(
            record.metadata,
            Some(json!({
                "status": "open",
                "impact": "high",
                "tags": ["api", "storage"],
                "owner": { "team": "infra" }
            }))
        );
    }

    #[test]
    fn test_blank_metadata_is_null() {
        for raw in ["", "   ", "\n\t\n"] {
            let record = parse(&[Block::Metadata(raw.to_string())]).unwrap();
            assert_eq!(record.metadata, Some(Value::Null), "raw = {raw:?}");
        }
    }

    #[test]
    fn test_malformed_metadata_is_an_error() {
        let err = parse(&[Block::Metadata("status: [open\n".to_string())]).unwrap_err();
        assert!(matches!(err, AdrError::MalformedMetadata(_)));
    }

    #[test]
    fn test_section_extraction() {
        let record = parse(&[Block::heading(2, "X"), Block::paragraph("hello")]).unwrap();
        assert_eq!(record.section("X"), Some("hello"));
    }

    #[test]
    fn test_heading_without_paragraph_has_no_section() {
        let record = parse(&[Block::heading(2, "X"), Block::heading(2, "Y")]).unwrap();
        assert!(record.sections.is_empty());
    }

    #[test]
    fn test_heading_followed_by_list_has_no_section() {
        let record = parse(&[
            Block::heading(2, "Options"),
            Block::Other(BlockKind::List),
            Block::heading(2, "Last"),
        ])
        .unwrap();
        assert!(record.sections.is_empty());
    }

    #[test]
    fn test_empty_paragraph_has_no_section() {
        let record = parse(&[
            Block::heading(2, "X"),
            Block::Paragraph { children: vec![] },
        ])
        .unwrap();
        assert!(record.section("X").is_none());
    }

    #[test]
    fn test_first_depth_one_heading_is_title() {
        let record = parse(&[
            Block::paragraph("intro"),
            Block::heading(1, "First"),
            Block::heading(1, "Second"),
        ])
        .unwrap();
        assert_eq!(record.title.as_deref(), Some("First"));
    }

    #[test]
    fn test_other_depths_are_ignored() {
        let record = parse(&[
            Block::heading(3, "Deep"),
            Block::paragraph("ignored"),
            Block::heading(2, "Kept"),
            Block::paragraph("yes"),
        ])
        .unwrap();
        assert!(record.title.is_none());
        assert_eq!(record.sections.len(), 1);
        assert_eq!(record.section("Kept"), Some("yes"));
    }

    #[test]
    fn test_section_before_title_is_indexed() {
        let record = parse(&[
            Block::heading(2, "Early"),
            Block::paragraph("before title"),
            Block::heading(1, "Title"),
        ])
        .unwrap();
        assert_eq!(record.section("Early"), Some("before title"));
        assert_eq!(record.title.as_deref(), Some("Title"));
    }

    #[test]
    fn test_metadata_only_counts_as_first_block() {
        let record = parse(&[Block::heading(1, "T"), Block::Metadata("a: b".to_string())]).unwrap();
        assert!(record.metadata.is_none());
    }

    #[test]
    fn test_parse_document_full() {
        let text = "---\nstatus: open\n---\n# T\n## Problem Description\nP.\n\n## Accepted Solution\nWe finally figured it out\n";
        let record = parse_document(text).unwrap();
        assert_eq!(record.title.as_deref(), Some("T"));
        assert_eq!(record.section("Problem Description"), Some("P."));
        assert_eq!(
            record.section("Accepted Solution"),
            Some("We finally figured it out")
        );
        assert_eq!(record.field("status"), Some(&json!("open")));
    }
}
