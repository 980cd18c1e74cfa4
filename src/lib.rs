//! # Helmsman
//!
//! Mission-lifecycle orchestration engine: intent readiness gating,
//! confidence-graded approval routing, clarification dialogue, tool
//! selection with learned feedback, and the mission state machine that ties
//! them together.
//!
//! ## Pipeline
//!
//! ```text
//!   Goal
//!    │
//!    ▼
//!  ┌─────────────────┐   severe failure
//!  │ Pre-Validation  ├──────────────────► reject / clarify
//!  └────────┬────────┘
//!           ▼
//!  ┌─────────────────┐   non-READY
//!  │ Readiness Engine├──────────────────► clarification (no mission)
//!  └────────┬────────┘
//!           ▼ READY
//!  Mission(proposed) ── tool selected
//!           │
//!           ▼
//!  ┌─────────────────┐  ≥ high: auto     ┌───────────┐
//!  │ Approval Gate   ├──────────────────►│ Execution │──► completed/failed
//!  └────────┬────────┘                   └─────┬─────┘
//!           │ medium..high: suspend            │
//!           ▼                                  ▼
//!    awaiting approval ──(response)──►  learning signals
//! ```
//!
//! A mission exists if and only if the readiness engine said READY - that is
//! the sole-gate invariant this crate is built around. All mission changes
//! are append-only events; learned tool weights are a pure fold over an
//! append-only signal log.
//!
//! ## Modules
//! - `engine`: the pipeline façade and resumption inboxes
//! - `readiness`: intent classification and structured-field extraction
//! - `validation`: the six pre-checks
//! - `confidence`: the four-factor confidence model
//! - `clarification`: the closed question taxonomy
//! - `approval`: threshold gate, pending queue, oracle capability
//! - `selector`: tool scoring and input preparation
//! - `mission`: state machine, events, append-only store
//! - `executor`: retrying, timeout-bounded tool invocation
//! - `learning`: signal log and weight folds
//! - `tools`: tool capability trait and registry
//! - `sink`: append-only persistence capability

pub mod approval;
pub mod clarification;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod goal;
pub mod learning;
pub mod mission;
pub mod readiness;
pub mod selector;
pub mod sink;
pub mod tools;
pub mod validation;

pub use approval::{ApprovalOracle, ApprovalRequest, ApprovalResponse};
pub use clarification::{Clarification, ClarificationType};
pub use config::Config;
pub use engine::{Engine, Outcome};
pub use error::{Error, Result};
pub use goal::{Goal, SessionContext};
pub use learning::LearningSignal;
pub use mission::{Mission, MissionId, MissionStatus};
pub use readiness::{Intent, ReadinessDecision, ReadinessResult};
pub use sink::{JsonlSink, NullSink, PersistenceSink};
pub use tools::{Tool, ToolInput, ToolOutput, ToolRegistry};
