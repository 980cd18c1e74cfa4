//! The closed set of execution-class intents.
//!
//! Each variant carries its own required-field schema, resolved by exhaustive
//! matching. There is deliberately no catch-all: adding an intent forces
//! every dispatch site to say what it does with it.

use serde::{Deserialize, Serialize};

use crate::tools::ToolCategory;

/// Execution-class intent of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Pull a named piece of data out of a page.
    Extract,
    /// Find pages or items matching a query.
    Search,
    /// Drive the browser to a location.
    Navigate,
}

/// A structured field an intent requires before a mission may be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    ActionObject,
    SourceUrl,
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ActionObject => "action_object",
            Self::SourceUrl => "source_url",
        };
        write!(f, "{}", s)
    }
}

impl Intent {
    /// The field schema this intent must satisfy to be READY.
    ///
    /// | Intent   | Required fields           |
    /// |----------|---------------------------|
    /// | extract  | action_object, source_url |
    /// | search   | action_object, source_url |
    /// | navigate | source_url                |
    pub fn required_fields(&self) -> &'static [RequiredField] {
        match self {
            Intent::Extract | Intent::Search => {
                &[RequiredField::ActionObject, RequiredField::SourceUrl]
            }
            Intent::Navigate => &[RequiredField::SourceUrl],
        }
    }

    /// Task-type key for learning signals and learned multipliers.
    pub fn task_type(&self) -> &'static str {
        match self {
            Intent::Extract => "extract",
            Intent::Search => "search",
            Intent::Navigate => "navigate",
        }
    }

    /// The tool category this intent primarily needs.
    pub fn primary_category(&self) -> ToolCategory {
        match self {
            Intent::Extract => ToolCategory::Extraction,
            Intent::Search => ToolCategory::Search,
            Intent::Navigate => ToolCategory::Navigation,
        }
    }

    /// Categories that get the fixed selection boost for this intent.
    ///
    /// Extraction-style goals favor extraction, navigation and search tools;
    /// all three intents rule out calculation tools.
    pub fn favored_categories(&self) -> &'static [ToolCategory] {
        match self {
            Intent::Extract => &[
                ToolCategory::Extraction,
                ToolCategory::Navigation,
                ToolCategory::Search,
            ],
            Intent::Search => &[ToolCategory::Search, ToolCategory::Extraction],
            Intent::Navigate => &[ToolCategory::Navigation],
        }
    }

    /// Categories that get the heavy selection penalty for this intent.
    pub fn penalized_categories(&self) -> &'static [ToolCategory] {
        match self {
            Intent::Extract | Intent::Search | Intent::Navigate => &[ToolCategory::Calculation],
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.task_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_matches_intent_table() {
        assert_eq!(
            Intent::Extract.required_fields(),
            &[RequiredField::ActionObject, RequiredField::SourceUrl]
        );
        assert_eq!(
            Intent::Search.required_fields(),
            &[RequiredField::ActionObject, RequiredField::SourceUrl]
        );
        assert_eq!(Intent::Navigate.required_fields(), &[RequiredField::SourceUrl]);
    }

    #[test]
    fn calculation_always_penalized() {
        for intent in [Intent::Extract, Intent::Search, Intent::Navigate] {
            assert!(intent
                .penalized_categories()
                .contains(&ToolCategory::Calculation));
        }
    }
}
