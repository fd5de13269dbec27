//! Common test utilities and helpers
//!
//! A host-style step kind with its own context, value and metadata types,
//! used to exercise the crate the way an embedding application would.

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use stepmaker::error::deserialize_config;
use stepmaker::step::{hints, NameSet};
use stepmaker::{
    AbortSignal, Action, HookResult, ItemHeader, Modifier, ModifierHints, ModifierRef, Outcome,
    Registry, Restriction, Step, StepAddress, StepError, StepItem, StepKind,
};

/// Mutable state shared by every hook and action of a run
#[derive(Debug, Default)]
pub struct RunContext {
    pub attempts: u32,
    pub events: Vec<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HostMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
}

static HOST_BASE_KEYS: Lazy<NameSet> =
    Lazy::new(|| hints::inherit_keys(["name"], Vec::<&NameSet>::new()));

static HOST_METADATA_KEYS: Lazy<NameSet> =
    Lazy::new(|| hints::inherit_keys(["description"], [&*HOST_BASE_KEYS]));

pub struct HostKind;

impl StepKind for HostKind {
    type Context = RunContext;
    type Value = u32;
    type Metadata = HostMetadata;

    const NAMESPACE_ACTIONS: &'static str = "host.actions";
    const NAMESPACE_MODIFIERS: &'static str = "host.modifiers";

    fn metadata_keys() -> &'static NameSet {
        &HOST_METADATA_KEYS
    }

    fn validate_metadata(metadata: Mapping, addr: &StepAddress) -> Result<HostMetadata, StepError> {
        deserialize_config("metadata", &Value::Mapping(metadata), addr)
    }
}

/// Fails until it has been called `succeed_on` times, then returns the count
pub struct FlakyAction {
    header: ItemHeader,
    succeed_on: u32,
}

impl StepItem for FlakyAction {
    type Config = u32;

    fn validate(name: &str, raw: &Value, addr: &StepAddress) -> Result<u32, StepError> {
        let succeed_on: Option<u32> = deserialize_config(name, raw, addr)?;
        Ok(succeed_on.unwrap_or(1))
    }

    fn from_parts(header: ItemHeader, succeed_on: u32) -> Self {
        Self { header, succeed_on }
    }
}

impl Action<HostKind> for FlakyAction {
    fn header(&self) -> &ItemHeader {
        &self.header
    }

    fn call(&self, _step: &Step<HostKind>, ctx: &mut RunContext) -> Result<u32> {
        ctx.attempts += 1;
        ctx.events.push(format!("attempt {}", ctx.attempts));
        if ctx.attempts < self.succeed_on {
            bail!("attempt {} failed", ctx.attempts);
        }
        Ok(ctx.attempts)
    }
}

static RETRY_HINTS: Lazy<ModifierHints> = Lazy::new(|| {
    ModifierHints::declare()
        .restriction(Restriction::LAZY)
        .after(["trace"])
        .build()
});

/// Re-runs the rest of the chain until it succeeds or attempts run out
pub struct RetryModifier {
    header: ItemHeader,
    attempts: u32,
}

impl StepItem for RetryModifier {
    type Config = u32;

    fn validate(name: &str, raw: &Value, addr: &StepAddress) -> Result<u32, StepError> {
        deserialize_config(name, raw, addr)
    }

    fn from_parts(header: ItemHeader, attempts: u32) -> Self {
        Self { header, attempts }
    }
}

impl Modifier<HostKind> for RetryModifier {
    fn header(&self) -> &ItemHeader {
        &self.header
    }

    fn hints(&self) -> &ModifierHints {
        &RETRY_HINTS
    }

    fn pre(
        &self,
        step: &Step<HostKind>,
        ctx: &mut RunContext,
        _applied: &[ModifierRef<HostKind>],
        _pending: &[ModifierRef<HostKind>],
        action: &dyn Action<HostKind>,
    ) -> HookResult<u32> {
        let (applied, pending) = step
            .split_modifiers(self.name())
            .ok_or_else(|| anyhow!("retry modifier is not part of its step"))?;

        let mut outcome = Outcome::Skipped;
        for attempt in 1..=self.attempts {
            outcome = step.evaluate(ctx, applied, pending, action);
            if !outcome.is_failed() {
                break;
            }
            ctx.events.push(format!("retry {} failed", attempt));
        }

        Err(AbortSignal::with_outcome(outcome).into())
    }
}

static TRACE_HINTS: Lazy<ModifierHints> = Lazy::new(|| ModifierHints::declare().build());

/// Records entering and leaving the chain in the context
pub struct TraceModifier {
    header: ItemHeader,
}

impl StepItem for TraceModifier {
    type Config = ();

    fn validate(_name: &str, _raw: &Value, _addr: &StepAddress) -> Result<(), StepError> {
        Ok(())
    }

    fn from_parts(header: ItemHeader, _config: ()) -> Self {
        Self { header }
    }
}

impl Modifier<HostKind> for TraceModifier {
    fn header(&self) -> &ItemHeader {
        &self.header
    }

    fn hints(&self) -> &ModifierHints {
        &TRACE_HINTS
    }

    fn pre(
        &self,
        _step: &Step<HostKind>,
        ctx: &mut RunContext,
        _applied: &[ModifierRef<HostKind>],
        _pending: &[ModifierRef<HostKind>],
        _action: &dyn Action<HostKind>,
    ) -> HookResult<u32> {
        ctx.events.push("enter".to_string());
        Ok(())
    }

    fn post(
        &self,
        _step: &Step<HostKind>,
        ctx: &mut RunContext,
        result: Outcome<u32>,
        _action: &dyn Action<HostKind>,
        _handled: &[ModifierRef<HostKind>],
        _remaining: &[ModifierRef<HostKind>],
    ) -> Result<Outcome<u32>> {
        let state = match &result {
            Outcome::Value(value) => format!("exit with {}", value),
            Outcome::Skipped => "exit skipped".to_string(),
            Outcome::Failed(failure) => format!("exit failed: {}", failure),
        };
        ctx.events.push(state);
        Ok(result)
    }
}

pub fn host_registry() -> Registry<HostKind> {
    let mut registry = Registry::new();
    registry
        .action::<FlakyAction>("flaky")
        .modifier::<RetryModifier>("retry")
        .modifier::<TraceModifier>("trace");
    registry
}

/// Parse a YAML snippet, panicking on malformed test input
pub fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).expect("test YAML must be valid")
}

pub fn step_address(index: usize) -> StepAddress {
    StepAddress::new("steps.yaml").key("steps").idx(index)
}
