//! Extraction rules: structured fields from raw goal text.
//!
//! Everything here is pure string analysis. The rules populate
//! `action_object` (what to extract or search), `action_target` (where within
//! a page), `source_url` (normalized to a full URL) and `constraints` from
//! the goal text and session context. Pronouns ("there", "that page") resolve
//! against the session's last URL.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::{Constraint, Intent};
use crate::goal::SessionContext;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("valid url regex"));

static BARE_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+(?:com|org|net|io|dev|co|ai|app|edu|gov)(?:/[^\s]*)?",
    )
    .expect("valid domain regex")
});

static PRONOUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:there|it|that page|this page|the page|the same page|that site|this site|the site)\b")
        .expect("valid pronoun regex")
});

static EXTRACT_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:extract|scrape|grab|pull|fetch|collect|get)\b").expect("valid regex")
});

static SEARCH_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:search|find|look\s+for|locate)\b").expect("valid regex")
});

static NAVIGATE_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:navigate|go\s+to|open|visit|browse\s+to)\b").expect("valid regex")
});

static AMBIGUOUS_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:check|process|handle|analyze|look\s+at|deal\s+with)\b")
        .expect("valid regex")
});

static QUESTION_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:what|who|when|where|why|how|is|are|can|could|should|do|does|did)\b")
        .expect("valid regex")
});

static META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:what\s+can\s+you\s+do|your\s+capabilities|who\s+are\s+you|how\s+do\s+you\s+work|what\s+tools|list\s+(?:your\s+)?tools)\b|^\s*help\s*[!.?]?\s*$",
    )
    .expect("valid regex")
});

static EXTRACT_OBJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:extract|scrape|grab|pull|fetch|collect|get)\s+(?:the\s+|all\s+(?:the\s+)?|every\s+)?(.+?)\s+(?:from|on|at|of)\b",
    )
    .expect("valid regex")
});

static EXTRACT_OBJECT_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:extract|scrape|grab|pull|fetch|collect|get)\s+(?:the\s+|all\s+(?:the\s+)?|every\s+)?(.+?)\s*$")
        .expect("valid regex")
});

static SEARCH_OBJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:search\s+for|find|look\s+for|locate|search)\s+(?:the\s+|all\s+)?(.+?)(?:\s+(?:on|in|at|from)\b.*)?$")
        .expect("valid regex")
});

static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:in|within|under|inside)\s+the\s+([a-z0-9 _-]+?)(?:\s+(?:of|on|from)\b|\s*[.,]|\s*$)",
    )
    .expect("valid regex")
});

static TARGET_FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfrom\s+the\s+([a-z0-9 _-]+?)\s+(?:of|at|on)\b").expect("valid regex")
});

static CSS_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)([#.][A-Za-z][\w-]*)").expect("valid regex"));

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:first|top|limit(?:ed)?\s+to)\s+(\d+)\b|\b(\d+)\s+(?:items|results|entries|rows)\b")
        .expect("valid regex")
});

static FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:as|into)\s+(csv|json|markdown|plain\s+text|a\s+table|a\s+list)\b")
        .expect("valid regex")
});

static FILTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bonly\s+(?:the\s+)?([a-z0-9 _-]+?)(?:\s*[.,]|\s*$)|\bwhere\s+(.+?)\s*$")
        .expect("valid regex")
});

static COUNT_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:first|top)\s+\d+\s+").expect("valid regex")
});

/// Is the goal about the system itself rather than the world?
pub fn detect_meta(text: &str) -> bool {
    META_RE.is_match(text)
}

/// Is the goal a question to answer rather than an action to take?
///
/// Only applies when no execution verb is present: "Can you extract the
/// title from example.com?" is an extraction request, not a question.
pub fn detect_question(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.ends_with('?') || QUESTION_START_RE.is_match(trimmed)
}

/// All distinct execution intents whose verbs appear in the text, in
/// precedence order (extract before search before navigate).
pub fn detect_intents(text: &str) -> Vec<Intent> {
    let mut intents = Vec::new();
    if EXTRACT_VERB_RE.is_match(text) {
        intents.push(Intent::Extract);
    }
    if SEARCH_VERB_RE.is_match(text) {
        intents.push(Intent::Search);
    }
    if NAVIGATE_VERB_RE.is_match(text) {
        intents.push(Intent::Navigate);
    }
    intents
}

/// A verb like "check" or "process" that names no concrete action.
pub fn detect_ambiguous_verb(text: &str) -> bool {
    AMBIGUOUS_VERB_RE.is_match(text)
}

/// Does the goal point at something through a pronoun?
pub fn has_pronoun_reference(text: &str) -> bool {
    PRONOUN_RE.is_match(text)
}

/// First URL mentioned in the text, normalized to a full URL.
///
/// Bare domains ("example.com/products") get an https scheme; anything that
/// still fails to parse as a URL is discarded.
pub fn find_url(text: &str) -> Option<String> {
    if let Some(m) = URL_RE.find(text) {
        let candidate = trim_url(m.as_str());
        if Url::parse(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }
    if let Some(m) = BARE_DOMAIN_RE.find(text) {
        let candidate = format!("https://{}", trim_url(m.as_str()));
        if Url::parse(&candidate).is_ok() {
            return Some(candidate);
        }
    }
    None
}

fn trim_url(raw: &str) -> &str {
    raw.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '\'', '"'])
}

/// Resolve the goal's source URL: explicit mention first, then pronoun
/// resolution against the session's last URL, then the session's last URL as
/// a plain fallback.
pub fn resolve_url(text: &str, ctx: &SessionContext) -> Option<String> {
    if let Some(url) = find_url(text) {
        return Some(url);
    }
    if has_pronoun_reference(text) {
        return ctx.last_url.clone();
    }
    ctx.last_url.clone()
}

/// What the goal wants extracted or searched for.
pub fn extract_object(text: &str, intent: Intent) -> Option<String> {
    let captured = match intent {
        Intent::Extract => EXTRACT_OBJECT_RE
            .captures(text)
            .or_else(|| EXTRACT_OBJECT_TAIL_RE.captures(text))
            .and_then(|c| c.get(1).map(|m| m.as_str().to_string())),
        Intent::Search => SEARCH_OBJECT_RE
            .captures(text)
            .and_then(|c| c.get(1).map(|m| m.as_str().to_string())),
        Intent::Navigate => None,
    };
    captured.map(clean_object).filter(|o| !o.is_empty())
}

fn clean_object(raw: String) -> String {
    let no_count = COUNT_PREFIX_RE.replace(&raw, "");
    no_count
        .trim()
        .trim_end_matches(['.', ',', '!', '?'])
        .to_string()
}

/// Where within the page to act, if the goal says ("in the header",
/// "from the results table of ...").
pub fn extract_target(text: &str) -> Option<String> {
    if let Some(c) = TARGET_RE.captures(text) {
        return c.get(1).map(|m| m.as_str().trim().to_string());
    }
    if let Some(c) = TARGET_FROM_RE.captures(text) {
        return c.get(1).map(|m| m.as_str().trim().to_string());
    }
    CSS_HINT_RE
        .captures(text)
        .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))
}

/// Count limits, output formats and filters stated in the goal.
pub fn extract_constraints(text: &str) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    if let Some(c) = COUNT_RE.captures(text) {
        let digits = c.get(1).or_else(|| c.get(2));
        if let Some(n) = digits.and_then(|m| m.as_str().parse::<u32>().ok()) {
            constraints.push(Constraint::CountLimit(n));
        }
    }

    if let Some(c) = FORMAT_RE.captures(text) {
        if let Some(m) = c.get(1) {
            constraints.push(Constraint::Format(m.as_str().to_lowercase()));
        }
    }

    if let Some(c) = FILTER_RE.captures(text) {
        if let Some(m) = c.get(1).or_else(|| c.get(2)) {
            constraints.push(Constraint::Filter(m.as_str().trim().to_string()));
        }
    }

    constraints
}
