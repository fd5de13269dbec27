//! Step model
//!
//! A [`Step`] packages one [`Action`], the ordered [`Modifier`]s applied to
//! it, and validated metadata. The host application describes its flavour of
//! steps through a [`StepKind`]: where actions and modifiers are looked up,
//! which description keys are metadata, and what context and value types
//! flow through evaluation.

pub mod action;
pub mod hints;
pub mod item;
pub mod modifier;

pub use action::Action;
pub use hints::{ActionClass, ModifierHints, NameSet, Restriction};
pub use item::{construct, ItemHeader, StepItem};
pub use modifier::{Modifier, ModifierRef};

use crate::address::StepAddress;
use crate::chain::{self, Outcome};
use crate::error::{ErrorCode, StepError};
use once_cell::sync::Lazy;
use serde_yaml::Mapping;
use std::fmt;

static NO_METADATA_KEYS: Lazy<NameSet> = Lazy::new(NameSet::new);

/// Host-defined flavour of steps
pub trait StepKind: Sized + 'static {
    /// Application-specific execution context, never inspected by the core
    type Context;

    /// Value produced by actions and threaded through post-hooks
    type Value;

    /// Canonical metadata produced by [`StepKind::validate_metadata`]
    type Metadata;

    /// Namespace actions are resolved in, e.g. `"myapp.actions"`
    const NAMESPACE_ACTIONS: &'static str;

    /// Namespace modifiers are resolved in; must differ from the actions one
    const NAMESPACE_MODIFIERS: &'static str;

    /// Description keys treated as metadata rather than actions or modifiers
    ///
    /// Kinds building on another kind merge its keys with
    /// [`hints::inherit_keys`] and freeze the result in a static.
    fn metadata_keys() -> &'static NameSet {
        &NO_METADATA_KEYS
    }

    /// Validate and canonicalize the metadata collected from a description
    fn validate_metadata(metadata: Mapping, addr: &StepAddress) -> Result<Self::Metadata, StepError>;

    /// Convert the value of an eager step into the steps it expands to
    fn into_steps(_value: Self::Value, addr: &StepAddress) -> anyhow::Result<Vec<Step<Self>>> {
        Err(StepError::at(
            addr,
            ErrorCode::CONFIG_INVALID_VALUE,
            "Eager action did not produce a list of steps",
        )
        .into())
    }
}

/// A single parsed step
pub struct Step<K: StepKind> {
    action: Box<dyn Action<K>>,
    modifiers: Vec<ModifierRef<K>>,
    metadata: K::Metadata,
    address: StepAddress,
}

impl<K: StepKind> Step<K> {
    /// Build a step, validating its metadata through the kind
    ///
    /// `modifiers` must already be in application order.
    pub fn new(
        action: Box<dyn Action<K>>,
        address: StepAddress,
        modifiers: Vec<ModifierRef<K>>,
        metadata: Mapping,
    ) -> Result<Self, StepError> {
        let metadata = K::validate_metadata(metadata, &address)?;

        Ok(Self {
            action,
            modifiers,
            metadata,
            address,
        })
    }

    pub fn action(&self) -> &dyn Action<K> {
        self.action.as_ref()
    }

    pub fn modifiers(&self) -> &[ModifierRef<K>] {
        &self.modifiers
    }

    /// Position of the modifier named `name` in application order
    pub fn modifier_index(&self, name: &str) -> Option<usize> {
        self.modifiers.iter().position(|m| m.name() == name)
    }

    /// Split the modifiers around the one named `name`
    ///
    /// Returns the modifiers applied before it (itself included) and those
    /// applied after it. A looping modifier evaluates the second part again
    /// from its pre-hook.
    pub fn split_modifiers(
        &self,
        name: &str,
    ) -> Option<(&[ModifierRef<K>], &[ModifierRef<K>])> {
        self.modifier_index(name)
            .map(|index| self.modifiers.split_at(index + 1))
    }

    pub fn metadata(&self) -> &K::Metadata {
        &self.metadata
    }

    pub fn address(&self) -> &StepAddress {
        &self.address
    }

    /// A step is eager when its action is
    pub fn eager(&self) -> bool {
        self.action.eager()
    }

    /// Evaluate the step
    ///
    /// Failures of the action or of any hook are passed through the
    /// remaining post-hooks; if the final outcome is still a failure it is
    /// returned as the error, with its original type and message. `Ok(None)`
    /// means a modifier aborted the step without providing a value.
    pub fn call(&self, ctx: &mut K::Context) -> anyhow::Result<Option<K::Value>> {
        chain::evaluate(self, ctx, &[], &self.modifiers, self.action.as_ref()).into_result()
    }

    /// Evaluate part of the hook chain without surfacing failures
    ///
    /// Runs the hooks of `pending` around `action`, reporting `applied` to
    /// the hooks as already applied. Looping modifiers use this to re-run
    /// the rest of the chain from their own pre-hook.
    pub fn evaluate(
        &self,
        ctx: &mut K::Context,
        applied: &[ModifierRef<K>],
        pending: &[ModifierRef<K>],
        action: &dyn Action<K>,
    ) -> Outcome<K::Value> {
        chain::evaluate(self, ctx, applied, pending, action)
    }
}

impl<K: StepKind> fmt::Debug for Step<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers: Vec<&str> = self.modifiers.iter().map(|m| m.name()).collect();
        f.debug_struct("Step")
            .field("action", &self.action.name())
            .field("modifiers", &modifiers)
            .field("address", &self.address.to_string())
            .finish()
    }
}
