//! Issue triage pipeline.
//!
//! Every delivered event flows through:
//! 1. `classifier::classify_event()`: event/action → workflow intent
//! 2. `DecisionEngine::decide()`: fresh label and post snapshot → `Decision`
//! 3. `Executor::apply()`: the only step that mutates the tracker
//!
//! Steps run strictly in sequence; one invocation never caches anything for
//! the next.

pub mod classifier;
pub mod engine;
pub mod executor;
pub mod labels;
pub mod processor;
pub mod rules;
pub mod types;

pub use processor::TriageProcessor;
pub use types::{Decision, Event, EventName, Intent, PostInfo};
