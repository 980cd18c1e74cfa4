//! Tool capability layer.
//!
//! Tools are the engine's only route to the outside world. The core never
//! issues network calls itself: it selects a tool, prepares its input, and
//! invokes it through the registry. Tool *implementations* (browser
//! automation, scrapers, API clients) live outside this crate; what lives
//! here is the capability trait, the registry, and the metadata the
//! confidence model and selector need (category, traits, health).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Broad capability class of a tool. Selection and availability checks
/// dispatch on this closed set rather than on tool-name substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Pulls structured data out of a page or document.
    Extraction,
    /// Drives a browser to a location.
    Navigation,
    /// Queries a search index.
    Search,
    /// Evaluates numeric expressions.
    Calculation,
    /// Anything else.
    Other,
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Extraction => "extraction",
            Self::Navigation => "navigation",
            Self::Search => "search",
            Self::Calculation => "calculation",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Behavioral traits of a tool, declared by its implementation.
///
/// These feed the reliability factor of the confidence model and the risk
/// notes on approval requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToolTraits {
    /// Same input always produces the same output.
    pub deterministic: bool,
    /// Safe to invoke twice with the same input.
    pub idempotent: bool,
    /// Mutates state outside the engine (sends, writes, clicks).
    pub side_effects: bool,
}

impl Default for ToolTraits {
    fn default() -> Self {
        Self {
            deterministic: false,
            idempotent: false,
            side_effects: true,
        }
    }
}

impl ToolTraits {
    /// Reliability score in [0,1]: deterministic, idempotent, side-effect-free
    /// tools are the safest to run unsupervised.
    pub fn reliability(&self) -> f64 {
        let mut score: f64 = 0.4;
        if self.deterministic {
            score += 0.3;
        }
        if self.idempotent {
            score += 0.2;
        }
        if !self.side_effects {
            score += 0.1;
        }
        score.min(1.0)
    }
}

/// What kind of structured input was detected for a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Url,
    Selector,
    Expression,
    RawText,
}

/// Prepared input for a tool invocation.
///
/// `payload` is a JSON object shaped for the tool; when no structured hint
/// was found in the goal, preparation falls back to the raw goal text under
/// `{"text": ...}` with kind `RawText`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub kind: InputKind,
    pub payload: Value,
}

impl ToolInput {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Url,
            payload: serde_json::json!({ "url": url.into() }),
        }
    }

    pub fn selector(url: Option<String>, hint: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Selector,
            payload: serde_json::json!({ "url": url, "selector": hint.into() }),
        }
    }

    pub fn expression(expr: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Expression,
            payload: serde_json::json!({ "expression": expr.into() }),
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            kind: InputKind::RawText,
            payload: serde_json::json!({ "text": text.into() }),
        }
    }
}

/// Result of a tool invocation: the output plus an explicit success flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    pub success: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: true,
        }
    }

    pub fn failed(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: false,
        }
    }
}

/// Trait for implementing tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// A description of what this tool does. The selector matches goal text
    /// against these words, so descriptions should name what the tool acts on.
    fn description(&self) -> &str;

    /// Capability class for selection and availability checks.
    fn category(&self) -> ToolCategory;

    /// Behavioral traits. Defaults to the most conservative assumption.
    fn traits(&self) -> ToolTraits {
        ToolTraits::default()
    }

    /// Execute the tool with prepared input.
    async fn execute(&self, input: &ToolInput) -> anyhow::Result<ToolOutput>;
}

/// Information about a tool for display purposes.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub category: ToolCategory,
    pub healthy: bool,
}

/// Registry of available tools.
///
/// Registration happens at construction time; health can be flipped at
/// runtime (a flaky browser backend, an API client with expired credentials).
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    health: RwLock<HashMap<String, bool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            health: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool. Replaces any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        tracing::debug!(tool = %name, category = %tool.category(), "Registering tool");
        if let Ok(mut health) = self.health.write() {
            health.insert(name.clone(), true);
        }
        self.tools.insert(name, tool);
    }

    /// Mark a tool healthy or unhealthy. Unknown names are ignored.
    pub fn set_health(&self, name: &str, healthy: bool) {
        if !self.tools.contains_key(name) {
            return;
        }
        if let Ok(mut health) = self.health.write() {
            health.insert(name.to_string(), healthy);
        }
    }

    fn is_healthy(&self, name: &str) -> bool {
        self.health
            .read()
            .map(|h| h.get(name).copied().unwrap_or(false))
            .unwrap_or(false)
    }

    /// Registered and currently healthy.
    pub fn is_available(&self, name: &str) -> bool {
        self.tools.contains_key(name) && self.is_healthy(name)
    }

    /// Any available tool in the given category?
    pub fn has_category(&self, category: ToolCategory) -> bool {
        self.tools
            .values()
            .any(|t| t.category() == category && self.is_healthy(t.name()))
    }

    /// Best reliability among available tools in a category; 0 when none.
    pub fn category_reliability(&self, category: ToolCategory) -> f64 {
        self.tools
            .values()
            .filter(|t| t.category() == category && self.is_healthy(t.name()))
            .map(|t| t.traits().reliability())
            .fold(0.0, f64::max)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Info for every registered tool, available or not.
    pub fn infos(&self) -> Vec<ToolInfo> {
        let mut infos: Vec<ToolInfo> = self
            .tools
            .values()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
                category: t.category(),
                healthy: self.is_healthy(t.name()),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Invoke a tool by name.
    ///
    /// The output carries its own success flag; `Err` means the tool could
    /// not be invoked at all (unknown name, implementation error).
    pub async fn execute(&self, name: &str, input: &ToolInput) -> anyhow::Result<ToolOutput> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("unknown tool: {name}"))?;
        tool.execute(input).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Stub tools shared by unit tests across the crate.

    use super::*;

    /// A canned tool that always succeeds.
    pub struct StaticTool {
        pub tool_name: &'static str,
        pub tool_description: &'static str,
        pub tool_category: ToolCategory,
        pub tool_traits: ToolTraits,
    }

    impl StaticTool {
        pub fn extractor() -> Self {
            Self {
                tool_name: "page_extractor",
                tool_description: "Extract the title, text, links or table data from a web page",
                tool_category: ToolCategory::Extraction,
                tool_traits: ToolTraits {
                    deterministic: true,
                    idempotent: true,
                    side_effects: false,
                },
            }
        }

        pub fn navigator() -> Self {
            Self {
                tool_name: "browser_navigate",
                tool_description: "Open a URL in the browser and wait for the page to load",
                tool_category: ToolCategory::Navigation,
                tool_traits: ToolTraits {
                    deterministic: true,
                    idempotent: true,
                    side_effects: false,
                },
            }
        }

        pub fn searcher() -> Self {
            Self {
                tool_name: "web_search",
                tool_description: "Search the web for pages matching a query",
                tool_category: ToolCategory::Search,
                tool_traits: ToolTraits {
                    deterministic: false,
                    idempotent: true,
                    side_effects: false,
                },
            }
        }

        pub fn calculator() -> Self {
            Self {
                tool_name: "calculator",
                tool_description: "Evaluate a numeric expression",
                tool_category: ToolCategory::Calculation,
                tool_traits: ToolTraits {
                    deterministic: true,
                    idempotent: true,
                    side_effects: false,
                },
            }
        }
    }

    #[async_trait]
    impl Tool for StaticTool {
        fn name(&self) -> &str {
            self.tool_name
        }

        fn description(&self) -> &str {
            self.tool_description
        }

        fn category(&self) -> ToolCategory {
            self.tool_category
        }

        fn traits(&self) -> ToolTraits {
            self.tool_traits
        }

        async fn execute(&self, _input: &ToolInput) -> anyhow::Result<ToolOutput> {
            Ok(ToolOutput::ok("stub output"))
        }
    }

    /// Build a registry with the four standard stub tools.
    pub fn standard_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StaticTool::extractor()));
        registry.register(Arc::new(StaticTool::navigator()));
        registry.register(Arc::new(StaticTool::searcher()));
        registry.register(Arc::new(StaticTool::calculator()));
        registry
    }
}
