//! Step description parsing
//!
//! A step description is either a bare action name or a mapping whose keys
//! are metadata, exactly one action, and any number of modifiers:
//!
//! ```yaml
//! - build                  # action without configuration
//! - name: Run the tests    # metadata
//!   run: cargo test        # action
//!   retry: 3               # modifier
//! ```
//!
//! The parser resolves each key through a [`Resolver`], checks modifier
//! compatibility, orders the modifiers and builds the [`Step`].

pub mod compat;
pub mod ordering;

pub use ordering::{find_cycle, order_modifiers, order_with_policy, OrderingCycle};

use crate::address::StepAddress;
use crate::config::{EngineConfig, OrderingPolicy};
use crate::error::{common, ErrorCode, StepError};
use crate::registry::{Registry, Resolver};
use crate::step::{Action, ActionClass, ModifierHints, ModifierRef, Step, StepKind};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Human-readable name of a YAML value's type
fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Builds steps of kind `K` from raw descriptions
pub struct StepParser<'r, K: StepKind, R: Resolver<K> + ?Sized = Registry<K>> {
    resolver: &'r R,
    ordering: OrderingPolicy,
    _kind: PhantomData<fn() -> K>,
}

impl<'r, K: StepKind, R: Resolver<K> + ?Sized> StepParser<'r, K, R> {
    /// Create a parser resolving names through `resolver`
    ///
    /// Fails when the kind's action and modifier namespaces are the same.
    pub fn new(resolver: &'r R, config: &EngineConfig) -> Result<Self, StepError> {
        if K::NAMESPACE_ACTIONS == K::NAMESPACE_MODIFIERS {
            return Err(common::namespace_conflict(K::NAMESPACE_ACTIONS));
        }

        Ok(Self {
            resolver,
            ordering: config.ordering,
            _kind: PhantomData,
        })
    }

    pub fn ordering(&self) -> OrderingPolicy {
        self.ordering
    }

    /// Parse a single step description located at `addr`
    pub fn parse(&self, raw: &Value, addr: &StepAddress) -> Result<Step<K>, StepError> {
        match raw {
            Value::String(name) => {
                let factory = self
                    .resolver
                    .resolve_action(K::NAMESPACE_ACTIONS, name)
                    .map_err(|_| {
                        debug!("Unknown action \"{}\" at {}", name, addr);
                        common::unknown_item(addr, name)
                    })?;
                let action = factory(name, &Value::Null, addr.key(name))?;
                self.assemble(action, BTreeMap::new(), Mapping::new(), addr)
            }
            Value::Mapping(mapping) => self.parse_mapping(mapping, addr),
            other => Err(common::invalid_description(addr, describe_value(other))),
        }
    }

    fn parse_mapping(&self, mapping: &Mapping, addr: &StepAddress) -> Result<Step<K>, StepError> {
        let mut action: Option<Box<dyn Action<K>>> = None;
        let mut modifiers: BTreeMap<String, ModifierRef<K>> = BTreeMap::new();
        let mut metadata = Mapping::new();

        for (key, value) in mapping {
            let name = key
                .as_str()
                .ok_or_else(|| common::invalid_description(addr, "a mapping with a non-string key"))?;

            if K::metadata_keys().contains(name) {
                metadata.insert(key.clone(), value.clone());
                continue;
            }

            // A second action is reported before its configuration is validated
            if let Ok(factory) = self.resolver.resolve_action(K::NAMESPACE_ACTIONS, name) {
                if let Some(existing) = &action {
                    return Err(common::multiple_actions(addr, name, existing.name()));
                }
                action = Some(factory(name, value, addr.key(name))?);
                continue;
            }

            match self.resolver.resolve_modifier(K::NAMESPACE_MODIFIERS, name) {
                Ok(factory) => {
                    let modifier = factory(name, value, addr.key(name))?;
                    modifiers.insert(name.to_string(), modifier);
                }
                Err(_) => return Err(common::unknown_item(addr, name)),
            }
        }

        let action = action.ok_or_else(|| common::no_action(addr))?;
        self.assemble(action, modifiers, metadata, addr)
    }

    /// Validate compatibility, order the modifiers and build the step
    fn assemble(
        &self,
        action: Box<dyn Action<K>>,
        modifiers: BTreeMap<String, ModifierRef<K>>,
        metadata: Mapping,
        addr: &StepAddress,
    ) -> Result<Step<K>, StepError> {
        let hints: BTreeMap<&str, &ModifierHints> = modifiers
            .iter()
            .map(|(name, modifier)| (name.as_str(), modifier.hints()))
            .collect();

        compat::validate(addr, action.name(), ActionClass::of(action.eager()), &hints)?;

        let order = order_with_policy(&hints, self.ordering).map_err(|cycle| {
            common::ordering_cycle(addr, cycle.names.iter().map(String::as_str))
        })?;
        let ordered: Vec<ModifierRef<K>> = order
            .iter()
            .map(|name| Arc::clone(&modifiers[*name]))
            .collect();

        debug!(
            "Parsed step at {}: action \"{}\", modifiers {:?}",
            addr,
            action.name(),
            order
        );

        Step::new(action, addr.clone(), ordered, metadata)
    }

    /// Parse a list of step descriptions, expanding eager steps
    ///
    /// Eager steps are evaluated right away against `ctx` and replaced by
    /// the steps their value converts to. An eager step that was skipped
    /// contributes nothing; one that failed aborts parsing with its failure.
    pub fn parse_list(
        &self,
        ctx: &mut K::Context,
        raw: &Value,
        addr: &StepAddress,
    ) -> anyhow::Result<Vec<Step<K>>> {
        let items = raw.as_sequence().ok_or_else(|| {
            StepError::at(
                addr,
                ErrorCode::CONFIG_INVALID_DESCRIPTION,
                format!("Step list must be a sequence, found {}", describe_value(raw)),
            )
        })?;

        let mut steps = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let step = self.parse(item, &addr.idx(i))?;

            if !step.eager() {
                steps.push(step);
                continue;
            }

            debug!("Expanding eager step at {}", step.address());
            match step.call(ctx)? {
                Some(value) => {
                    let expanded = K::into_steps(value, step.address())?;
                    debug!(
                        "Eager step at {} expanded to {} step(s)",
                        step.address(),
                        expanded.len()
                    );
                    steps.extend(expanded);
                }
                None => debug!("Eager step at {} was skipped", step.address()),
            }
        }

        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{builtin_registry, TestKind};

    fn addr() -> StepAddress {
        StepAddress::new("steps.yaml").key("steps").idx(0)
    }

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_bare_name_is_action_without_config() {
        let registry = builtin_registry();
        let parser = StepParser::new(&registry, &EngineConfig::default()).unwrap();

        let step = parser.parse(&yaml("echo"), &addr()).unwrap();
        assert_eq!(step.action().name(), "echo");
        assert_eq!(step.action().address(), &addr().key("echo"));
        assert!(step.modifiers().is_empty());
    }

    #[test]
    fn test_invalid_descriptions() {
        let registry = builtin_registry();
        let parser = StepParser::new(&registry, &EngineConfig::default()).unwrap();

        let err = parser.parse(&yaml("42"), &addr()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_DESCRIPTION);
        assert!(err.message().contains("a number"));

        let err = parser.parse(&yaml("{1: echo}"), &addr()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_DESCRIPTION);
    }

    #[test]
    fn test_unknown_bare_name() {
        let registry = builtin_registry();
        let parser = StepParser::new(&registry, &EngineConfig::default()).unwrap();

        // Modifiers cannot stand alone as a bare name
        let err = parser.parse(&yaml("upper"), &addr()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_UNKNOWN_ITEM);
        assert_eq!(err.message(), "Unknown action or modifier \"upper\"");
    }

    #[test]
    fn test_list_must_be_a_sequence() {
        let registry = builtin_registry();
        let parser = StepParser::new(&registry, &EngineConfig::default()).unwrap();

        let err = parser
            .parse_list(&mut (), &yaml("echo: hi"), &StepAddress::new("steps.yaml"))
            .unwrap_err();
        let err = err.downcast_ref::<StepError>().unwrap();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_DESCRIPTION);
    }
}
