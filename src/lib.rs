//! # stepmaker
//!
//! Declarative steps made of one pluggable action and any number of
//! pluggable modifiers wrapping it.
//!
//! ## Usage
//!
//! ```ignore
//! let mut registry = Registry::<MyKind>::new();
//! registry.action::<RunAction>("run").modifier::<RetryModifier>("retry");
//!
//! let parser = StepParser::new(&registry, &EngineConfig::default())?;
//! let steps = parser.parse_list(&mut ctx, &document, &StepAddress::new("steps.yaml"))?;
//! for step in &steps {
//!     step.call(&mut ctx)?;
//! }
//! ```
//!
//! ## Modules
//!
//! - `address` - Locations inside configuration documents for error reports
//! - `chain` - Hook chain evaluation with abort and failure threading
//! - `config` - Engine settings: ordering policy and verbosity
//! - `error` - Configuration errors with numeric codes
//! - `logging` - Tracing subscriber setup
//! - `parse` - Step parsing, modifier ordering and compatibility checks
//! - `registry` - Name resolution of actions and modifiers
//! - `step` - Step model: kinds, actions, modifiers and their hints
//! - `testing` - Recording doubles and a small built-in step kind

pub mod address;
pub mod chain;
pub mod config;
pub mod error;
pub mod logging;
pub mod parse;
pub mod registry;
pub mod step;

pub mod testing;

pub use address::{PathSegment, StepAddress};
pub use chain::{AbortSignal, ExceptionalResult, HookInterrupt, HookResult, Outcome};
pub use config::{EngineConfig, OrderingPolicy};
pub use error::{ErrorCode, StepError};
pub use parse::StepParser;
pub use registry::{Registry, Resolver};
pub use step::{
    Action, ActionClass, ItemHeader, Modifier, ModifierHints, ModifierRef, Restriction, Step,
    StepItem, StepKind,
};
