//! Testing utilities
//!
//! Recording doubles for actions and modifiers plus a small step kind with a
//! few built-in items. Hosts can use them to check how their own modifiers
//! interact with others; the crate's tests use them throughout.

use crate::address::StepAddress;
use crate::chain::{AbortSignal, HookInterrupt, HookResult, Outcome};
use crate::config::EngineConfig;
use crate::error::{deserialize_config, ErrorCode, StepError};
use crate::parse::StepParser;
use crate::registry::Registry;
use crate::step::{
    hints, Action, ItemHeader, Modifier, ModifierHints, ModifierRef, NameSet, Restriction, Step,
    StepItem, StepKind,
};
use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use serde_yaml::{Mapping, Value};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<String>,
    seen: Vec<(String, String)>,
    pre_lists: Vec<(String, Vec<String>, Vec<String>)>,
    post_lists: Vec<(String, Vec<String>, Vec<String>)>,
}

/// Shared record of hook and action invocations
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    state: Arc<Mutex<LogState>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LogState> {
        // A panicking test must not hide the log from the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an invocation entry such as `pre:retry`
    pub fn record(&self, entry: impl Into<String>) {
        self.state().entries.push(entry.into());
    }

    /// All invocation entries, in call order
    pub fn entries(&self) -> Vec<String> {
        self.state().entries.clone()
    }

    pub fn clear(&self) {
        *self.state() = LogState::default();
    }

    fn record_seen(&self, name: &str, description: String) {
        self.state().seen.push((name.to_string(), description));
    }

    fn record_pre_lists(&self, name: &str, applied: Vec<String>, pending: Vec<String>) {
        self.state()
            .pre_lists
            .push((name.to_string(), applied, pending));
    }

    fn record_post_lists(&self, name: &str, handled: Vec<String>, remaining: Vec<String>) {
        self.state()
            .post_lists
            .push((name.to_string(), handled, remaining));
    }

    /// Outcomes the post-hooks of `name` received, e.g. `value:x` or `skipped`
    pub fn seen_by(&self, name: &str) -> Vec<String> {
        self.state()
            .seen
            .iter()
            .filter(|(modifier, _)| modifier == name)
            .map(|(_, seen)| seen.clone())
            .collect()
    }

    /// Names reported as applied to each pre-hook call of `name`
    pub fn applied_seen_by(&self, name: &str) -> Vec<Vec<String>> {
        self.state()
            .pre_lists
            .iter()
            .filter(|(modifier, _, _)| modifier == name)
            .map(|(_, applied, _)| applied.clone())
            .collect()
    }

    /// Names reported as pending to each pre-hook call of `name`
    pub fn pending_seen_by(&self, name: &str) -> Vec<Vec<String>> {
        self.state()
            .pre_lists
            .iter()
            .filter(|(modifier, _, _)| modifier == name)
            .map(|(_, _, pending)| pending.clone())
            .collect()
    }

    /// `(handled, remaining)` names given to each post-hook call of `name`
    pub fn post_lists_seen_by(&self, name: &str) -> Vec<(Vec<String>, Vec<String>)> {
        self.state()
            .post_lists
            .iter()
            .filter(|(modifier, _, _)| modifier == name)
            .map(|(_, handled, remaining)| (handled.clone(), remaining.clone()))
            .collect()
    }
}

fn names(modifiers: &[ModifierRef<TestKind>]) -> Vec<String> {
    modifiers.iter().map(|m| m.name().to_string()).collect()
}

fn describe_outcome(outcome: &Outcome<String>) -> String {
    match outcome {
        Outcome::Value(value) => format!("value:{}", value),
        Outcome::Skipped => "skipped".to_string(),
        Outcome::Failed(failure) => format!("failed:{}", failure),
    }
}

fn scripted_address(name: &str) -> StepAddress {
    StepAddress::new("scripted").key(name)
}

#[derive(Debug, Clone)]
enum ActionScript {
    Return(String),
    Fail(String),
}

/// Action that logs `call:<name>` and returns or fails as scripted
#[derive(Debug, Clone)]
pub struct ScriptedAction {
    header: ItemHeader,
    log: CallLog,
    script: ActionScript,
    eager: bool,
}

impl ScriptedAction {
    pub fn returning(name: &str, log: &CallLog, value: &str) -> Self {
        Self::scripted(name, log, ActionScript::Return(value.to_string()))
    }

    pub fn failing(name: &str, log: &CallLog, message: &str) -> Self {
        Self::scripted(name, log, ActionScript::Fail(message.to_string()))
    }

    fn scripted(name: &str, log: &CallLog, script: ActionScript) -> Self {
        Self {
            header: ItemHeader::new(name, scripted_address(name)),
            log: log.clone(),
            script,
            eager: false,
        }
    }

    pub fn at(mut self, address: StepAddress) -> Self {
        self.header.address = address;
        self
    }

    /// Mark the action as running at parse time
    pub fn as_eager(mut self) -> Self {
        self.eager = true;
        self
    }
}

impl Action<TestKind> for ScriptedAction {
    fn header(&self) -> &ItemHeader {
        &self.header
    }

    fn eager(&self) -> bool {
        self.eager
    }

    fn call(&self, _step: &Step<TestKind>, _ctx: &mut ()) -> Result<String> {
        self.log.record(format!("call:{}", self.header.name));
        match &self.script {
            ActionScript::Return(value) => Ok(value.clone()),
            ActionScript::Fail(message) => Err(anyhow!("{}", message)),
        }
    }
}

#[derive(Debug, Clone)]
enum PreScript {
    Continue,
    Abort(Option<String>),
    Fail(String),
}

#[derive(Debug, Clone)]
enum PostScript {
    Append,
    Passthrough,
    Fail(String),
    Recover(String),
}

/// Modifier that logs its hooks and behaves as scripted
///
/// By default the pre-hook continues and the post-hook appends `|<name>`
/// to a value, passing skipped and failed outcomes through unchanged.
#[derive(Debug, Clone)]
pub struct ScriptedModifier {
    header: ItemHeader,
    hints: ModifierHints,
    log: CallLog,
    pre: PreScript,
    post: PostScript,
}

impl ScriptedModifier {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            header: ItemHeader::new(name, scripted_address(name)),
            hints: ModifierHints::declare().build(),
            log: log.clone(),
            pre: PreScript::Continue,
            post: PostScript::Append,
        }
    }

    pub fn at(mut self, address: StepAddress) -> Self {
        self.header.address = address;
        self
    }

    pub fn with_hints(mut self, hints: ModifierHints) -> Self {
        self.hints = hints;
        self
    }

    /// Abort from the pre-hook, with a value or as skipped
    pub fn abort_with(mut self, value: Option<&str>) -> Self {
        self.pre = PreScript::Abort(value.map(str::to_string));
        self
    }

    pub fn fail_pre(mut self, message: &str) -> Self {
        self.pre = PreScript::Fail(message.to_string());
        self
    }

    pub fn fail_post(mut self, message: &str) -> Self {
        self.post = PostScript::Fail(message.to_string());
        self
    }

    /// Hand every outcome on untouched
    pub fn passthrough(mut self) -> Self {
        self.post = PostScript::Passthrough;
        self
    }

    /// Replace a failed outcome with `value`
    pub fn recover(mut self, value: &str) -> Self {
        self.post = PostScript::Recover(value.to_string());
        self
    }

    pub fn into_ref(self) -> ModifierRef<TestKind> {
        Arc::new(self)
    }
}

impl Modifier<TestKind> for ScriptedModifier {
    fn header(&self) -> &ItemHeader {
        &self.header
    }

    fn hints(&self) -> &ModifierHints {
        &self.hints
    }

    fn pre(
        &self,
        _step: &Step<TestKind>,
        _ctx: &mut (),
        applied: &[ModifierRef<TestKind>],
        pending: &[ModifierRef<TestKind>],
        _action: &dyn Action<TestKind>,
    ) -> HookResult<String> {
        let name = &self.header.name;
        self.log.record(format!("pre:{}", name));
        self.log.record_pre_lists(name, names(applied), names(pending));

        match &self.pre {
            PreScript::Continue => Ok(()),
            PreScript::Abort(Some(value)) => Err(AbortSignal::with_value(value.clone()).into()),
            PreScript::Abort(None) => Err(AbortSignal::skip().into()),
            PreScript::Fail(message) => Err(HookInterrupt::Failure(anyhow!("{}", message))),
        }
    }

    fn post(
        &self,
        _step: &Step<TestKind>,
        _ctx: &mut (),
        result: Outcome<String>,
        _action: &dyn Action<TestKind>,
        handled: &[ModifierRef<TestKind>],
        remaining: &[ModifierRef<TestKind>],
    ) -> Result<Outcome<String>> {
        let name = &self.header.name;
        self.log.record(format!("post:{}", name));
        self.log.record_seen(name, describe_outcome(&result));
        self.log
            .record_post_lists(name, names(handled), names(remaining));

        match &self.post {
            PostScript::Append => Ok(result.map(|value| format!("{}|{}", value, name))),
            PostScript::Passthrough => Ok(result),
            PostScript::Fail(message) => bail!("{}", message),
            PostScript::Recover(value) => match result {
                Outcome::Failed(_) => Ok(Outcome::Value(value.clone())),
                other => Ok(other),
            },
        }
    }
}

static TEST_METADATA_KEYS: Lazy<NameSet> =
    Lazy::new(|| hints::inherit_keys(["name", "description"], Vec::<&NameSet>::new()));

/// Step kind used by the built-in test items
///
/// Values are strings and metadata is kept as the raw mapping, with `name`
/// required to be a string when present. Eager values are YAML documents
/// holding a list of further step descriptions.
#[derive(Debug, Clone, Copy)]
pub struct TestKind;

impl StepKind for TestKind {
    type Context = ();
    type Value = String;
    type Metadata = Mapping;

    const NAMESPACE_ACTIONS: &'static str = "test.actions";
    const NAMESPACE_MODIFIERS: &'static str = "test.modifiers";

    fn metadata_keys() -> &'static NameSet {
        &TEST_METADATA_KEYS
    }

    fn validate_metadata(metadata: Mapping, addr: &StepAddress) -> Result<Mapping, StepError> {
        match metadata.get("name") {
            Some(name) if !name.is_string() => Err(StepError::at(
                &addr.key("name"),
                ErrorCode::CONFIG_INVALID_METADATA,
                "Step name must be a string",
            )),
            _ => Ok(metadata),
        }
    }

    fn into_steps(value: String, addr: &StepAddress) -> Result<Vec<Step<Self>>> {
        let raw: Value = serde_yaml::from_str(&value)
            .with_context(|| format!("Eager step at {} produced invalid YAML", addr))?;
        let items = raw
            .as_sequence()
            .ok_or_else(|| anyhow!("Eager step at {} did not produce a list of steps", addr))?;

        let parser = StepParser::new(&*BUILTIN_REGISTRY, &EngineConfig::default())?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| parser.parse(item, &addr.idx(i)).map_err(Into::into))
            .collect()
    }
}

/// Returns its configuration string, or an empty string without one
#[derive(Debug)]
pub struct EchoAction {
    header: ItemHeader,
    text: String,
}

impl StepItem for EchoAction {
    type Config = String;

    fn validate(name: &str, raw: &Value, addr: &StepAddress) -> Result<String, StepError> {
        let text: Option<String> = deserialize_config(name, raw, addr)?;
        Ok(text.unwrap_or_default())
    }

    fn from_parts(header: ItemHeader, text: String) -> Self {
        Self { header, text }
    }
}

impl Action<TestKind> for EchoAction {
    fn header(&self) -> &ItemHeader {
        &self.header
    }

    fn call(&self, _step: &Step<TestKind>, _ctx: &mut ()) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// Eager action expanding into the step descriptions it is configured with
#[derive(Debug)]
pub struct IncludeAction {
    header: ItemHeader,
    steps: Value,
}

impl StepItem for IncludeAction {
    type Config = Value;

    fn validate(_name: &str, raw: &Value, addr: &StepAddress) -> Result<Value, StepError> {
        if !raw.is_sequence() {
            return Err(StepError::at(
                addr,
                ErrorCode::CONFIG_INVALID_VALUE,
                "Included steps must be a list",
            ));
        }
        Ok(raw.clone())
    }

    fn from_parts(header: ItemHeader, steps: Value) -> Self {
        Self { header, steps }
    }
}

impl Action<TestKind> for IncludeAction {
    fn header(&self) -> &ItemHeader {
        &self.header
    }

    fn eager(&self) -> bool {
        true
    }

    fn call(&self, _step: &Step<TestKind>, _ctx: &mut ()) -> Result<String> {
        serde_yaml::to_string(&self.steps).context("Failed to serialize included steps")
    }
}

static UPPER_HINTS: Lazy<ModifierHints> = Lazy::new(|| {
    ModifierHints::declare()
        .restriction(Restriction::LAZY)
        .build()
});

/// Uppercases the value produced by the action
#[derive(Debug)]
pub struct UpperModifier {
    header: ItemHeader,
}

impl StepItem for UpperModifier {
    type Config = ();

    fn validate(name: &str, raw: &Value, addr: &StepAddress) -> Result<(), StepError> {
        if raw.is_null() || raw.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(StepError::at(
                addr,
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("\"{}\" takes no configuration", name),
            ))
        }
    }

    fn from_parts(header: ItemHeader, _config: ()) -> Self {
        Self { header }
    }
}

impl Modifier<TestKind> for UpperModifier {
    fn header(&self) -> &ItemHeader {
        &self.header
    }

    fn hints(&self) -> &ModifierHints {
        &UPPER_HINTS
    }

    fn post(
        &self,
        _step: &Step<TestKind>,
        _ctx: &mut (),
        result: Outcome<String>,
        _action: &dyn Action<TestKind>,
        _handled: &[ModifierRef<TestKind>],
        _remaining: &[ModifierRef<TestKind>],
    ) -> Result<Outcome<String>> {
        Ok(result.map(|value| value.to_uppercase()))
    }
}

static SKIP_HINTS: Lazy<ModifierHints> = Lazy::new(|| ModifierHints::declare().build());

/// Skips the step when configured with `true`
#[derive(Debug)]
pub struct SkipModifier {
    header: ItemHeader,
    skip: bool,
}

impl StepItem for SkipModifier {
    type Config = bool;

    fn validate(name: &str, raw: &Value, addr: &StepAddress) -> Result<bool, StepError> {
        deserialize_config(name, raw, addr)
    }

    fn from_parts(header: ItemHeader, skip: bool) -> Self {
        Self { header, skip }
    }
}

impl Modifier<TestKind> for SkipModifier {
    fn header(&self) -> &ItemHeader {
        &self.header
    }

    fn hints(&self) -> &ModifierHints {
        &SKIP_HINTS
    }

    fn pre(
        &self,
        _step: &Step<TestKind>,
        _ctx: &mut (),
        _applied: &[ModifierRef<TestKind>],
        _pending: &[ModifierRef<TestKind>],
        _action: &dyn Action<TestKind>,
    ) -> HookResult<String> {
        if self.skip {
            return Err(AbortSignal::skip().into());
        }
        Ok(())
    }
}

static BUILTIN_REGISTRY: Lazy<Registry<TestKind>> = Lazy::new(builtin_registry);

/// Registry with `echo` and `include` actions and `upper` and `skip` modifiers
pub fn builtin_registry() -> Registry<TestKind> {
    let mut registry = Registry::new();
    registry
        .action::<EchoAction>("echo")
        .action::<IncludeAction>("include")
        .modifier::<UpperModifier>("upper")
        .modifier::<SkipModifier>("skip");
    registry
}

/// Register a scripted modifier factory under `name`
///
/// Every modifier built by the factory shares `log` and `hints` and is
/// placed at the address the parser hands it.
pub fn register_scripted_modifier(
    registry: &mut Registry<TestKind>,
    name: &str,
    log: &CallLog,
    hints: ModifierHints,
) {
    let log = log.clone();
    registry.register_modifier_with(
        TestKind::NAMESPACE_MODIFIERS,
        name,
        move |name, _raw, addr| {
            let modifier = ScriptedModifier::new(name, &log)
                .at(addr)
                .with_hints(hints.clone());
            Ok(modifier.into_ref())
        },
    );
}

/// Register a scripted action returning `value` under `name`
pub fn register_scripted_action(
    registry: &mut Registry<TestKind>,
    name: &str,
    log: &CallLog,
    value: &str,
) {
    let log = log.clone();
    let value = value.to_string();
    registry.register_action_with(TestKind::NAMESPACE_ACTIONS, name, move |name, _raw, addr| {
        Ok(Box::new(ScriptedAction::returning(name, &log, &value).at(addr)) as Box<dyn Action<TestKind>>)
    });
}
