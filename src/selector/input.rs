//! Tool-specific input preparation.
//!
//! Each category gets the structured hint it knows how to use: a URL for
//! navigation, a selector or content hint for extraction, a numeric
//! expression for calculation. When no structured hint exists, the raw goal
//! text is the fallback - a tool should never receive nothing.

use std::sync::LazyLock;

use regex::Regex;

use crate::mission::StructuredFields;
use crate::readiness::extract;
use crate::tools::{ToolCategory, ToolInput};

static EXPRESSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d[\d\s]*(?:[-+*/][\d\s()]*\d)+").expect("valid expression regex")
});

/// Prepare input for a tool of the given category.
///
/// Structured fields come from the readiness result via the mission; the raw
/// goal text is only consulted for hints readiness does not model (numeric
/// expressions) and as the final fallback.
pub fn prepare(goal_text: &str, fields: &StructuredFields, category: ToolCategory) -> ToolInput {
    match category {
        ToolCategory::Navigation => fields
            .source_url
            .clone()
            .or_else(|| extract::find_url(goal_text))
            .map(ToolInput::url)
            .unwrap_or_else(|| ToolInput::raw(goal_text)),

        ToolCategory::Extraction => {
            let hint = fields
                .action_target
                .clone()
                .or_else(|| fields.action_object.clone());
            match hint {
                Some(hint) => ToolInput::selector(fields.source_url.clone(), hint),
                None => ToolInput::raw(goal_text),
            }
        }

        ToolCategory::Search => match &fields.action_object {
            Some(query) => ToolInput {
                kind: crate::tools::InputKind::RawText,
                payload: serde_json::json!({
                    "query": query,
                    "site": fields.source_url,
                }),
            },
            None => ToolInput::raw(goal_text),
        },

        ToolCategory::Calculation => EXPRESSION_RE
            .find(goal_text)
            .map(|m| ToolInput::expression(m.as_str().trim()))
            .unwrap_or_else(|| ToolInput::raw(goal_text)),

        ToolCategory::Other => ToolInput::raw(goal_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readiness::Intent;
    use crate::tools::InputKind;

    fn fields(object: Option<&str>, target: Option<&str>, url: Option<&str>) -> StructuredFields {
        StructuredFields {
            intent: Intent::Extract,
            action_object: object.map(String::from),
            action_target: target.map(String::from),
            source_url: url.map(String::from),
            constraints: vec![],
        }
    }

    #[test]
    fn navigation_gets_the_url() {
        let input = prepare(
            "open https://example.com",
            &fields(None, None, Some("https://example.com")),
            ToolCategory::Navigation,
        );
        assert_eq!(input.kind, InputKind::Url);
        assert_eq!(input.payload["url"], "https://example.com");
    }

    #[test]
    fn extraction_prefers_target_over_object() {
        let input = prepare(
            "extract the price in the sidebar of https://example.com",
            &fields(Some("price"), Some("sidebar"), Some("https://example.com")),
            ToolCategory::Extraction,
        );
        assert_eq!(input.kind, InputKind::Selector);
        assert_eq!(input.payload["selector"], "sidebar");
    }

    #[test]
    fn calculation_detects_expressions() {
        let input = prepare(
            "calculate 12 * (3 + 4)",
            &fields(None, None, None),
            ToolCategory::Calculation,
        );
        assert_eq!(input.kind, InputKind::Expression);
        assert_eq!(input.payload["expression"], "12 * (3 + 4)");
    }

    #[test]
    fn raw_text_is_the_fallback() {
        let input = prepare("do the thing", &fields(None, None, None), ToolCategory::Extraction);
        assert_eq!(input.kind, InputKind::RawText);
        assert_eq!(input.payload["text"], "do the thing");
    }
}
