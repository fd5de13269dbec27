//! Resolution of action and modifier names
//!
//! The parser never loads plugins itself. It asks a [`Resolver`] for the
//! factory registered under a name in the step kind's actions or modifiers
//! namespace. [`Registry`] is the in-memory resolver most hosts use:
//!
//! ```ignore
//! let mut registry = Registry::<MyKind>::new();
//! registry
//!     .action::<RunAction>("run")
//!     .modifier::<RetryModifier>("retry");
//! ```

use crate::address::StepAddress;
use crate::error::StepError;
use crate::step::{construct, Action, Modifier, ModifierRef, StepItem, StepKind};
use serde_yaml::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Builds an action from its name, raw configuration and address
pub type ActionFactory<K> =
    Box<dyn Fn(&str, &Value, StepAddress) -> Result<Box<dyn Action<K>>, StepError> + Send + Sync>;

/// Builds a modifier from its name, raw configuration and address
pub type ModifierFactory<K> =
    Box<dyn Fn(&str, &Value, StepAddress) -> Result<ModifierRef<K>, StepError> + Send + Sync>;

/// Which kind of item a lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Action,
    Modifier,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Action => write!(f, "action"),
            ItemKind::Modifier => write!(f, "modifier"),
        }
    }
}

/// Lookup failure of a resolver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No {kind} named \"{name}\" in namespace \"{namespace}\"")]
pub struct NotFound {
    pub kind: ItemKind,
    pub namespace: String,
    pub name: String,
}

impl NotFound {
    pub fn new(kind: ItemKind, namespace: &str, name: &str) -> Self {
        Self {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Capability to look up action and modifier factories by name
pub trait Resolver<K: StepKind> {
    fn resolve_action(&self, namespace: &str, name: &str) -> Result<&ActionFactory<K>, NotFound>;

    fn resolve_modifier(&self, namespace: &str, name: &str)
        -> Result<&ModifierFactory<K>, NotFound>;
}

/// In-memory resolver keyed by namespace, then name
pub struct Registry<K: StepKind> {
    actions: HashMap<String, HashMap<String, ActionFactory<K>>>,
    modifiers: HashMap<String, HashMap<String, ModifierFactory<K>>>,
}

impl<K: StepKind> Default for Registry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StepKind> Registry<K> {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
            modifiers: HashMap::new(),
        }
    }

    /// Register an action factory in a namespace
    pub fn register_action_with<F>(&mut self, namespace: &str, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&str, &Value, StepAddress) -> Result<Box<dyn Action<K>>, StepError>
            + Send
            + Sync
            + 'static,
    {
        self.actions
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string(), Box::new(factory));
        self
    }

    /// Register a modifier factory in a namespace
    pub fn register_modifier_with<F>(
        &mut self,
        namespace: &str,
        name: &str,
        factory: F,
    ) -> &mut Self
    where
        F: Fn(&str, &Value, StepAddress) -> Result<ModifierRef<K>, StepError>
            + Send
            + Sync
            + 'static,
    {
        self.modifiers
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string(), Box::new(factory));
        self
    }

    /// Register an action type under `name` in a namespace
    pub fn register_action<A>(&mut self, namespace: &str, name: &str) -> &mut Self
    where
        A: StepItem + Action<K> + 'static,
    {
        self.register_action_with(namespace, name, |name, raw, addr| {
            let action: A = construct(name, raw, addr)?;
            Ok(Box::new(action) as Box<dyn Action<K>>)
        })
    }

    /// Register a modifier type under `name` in a namespace
    pub fn register_modifier<M>(&mut self, namespace: &str, name: &str) -> &mut Self
    where
        M: StepItem + Modifier<K> + 'static,
    {
        self.register_modifier_with(namespace, name, |name, raw, addr| {
            let modifier: M = construct(name, raw, addr)?;
            Ok(Arc::new(modifier) as ModifierRef<K>)
        })
    }

    /// Register an action type in the step kind's own actions namespace
    pub fn action<A>(&mut self, name: &str) -> &mut Self
    where
        A: StepItem + Action<K> + 'static,
    {
        self.register_action::<A>(K::NAMESPACE_ACTIONS, name)
    }

    /// Register a modifier type in the step kind's own modifiers namespace
    pub fn modifier<M>(&mut self, name: &str) -> &mut Self
    where
        M: StepItem + Modifier<K> + 'static,
    {
        self.register_modifier::<M>(K::NAMESPACE_MODIFIERS, name)
    }

    /// Names registered as actions in a namespace, sorted
    pub fn action_names(&self, namespace: &str) -> Vec<&str> {
        sorted_names(self.actions.get(namespace))
    }

    /// Names registered as modifiers in a namespace, sorted
    pub fn modifier_names(&self, namespace: &str) -> Vec<&str> {
        sorted_names(self.modifiers.get(namespace))
    }
}

fn sorted_names<V>(group: Option<&HashMap<String, V>>) -> Vec<&str> {
    let mut names: Vec<&str> = group
        .map(|group| group.keys().map(String::as_str).collect())
        .unwrap_or_default();
    names.sort_unstable();
    names
}

impl<K: StepKind> Resolver<K> for Registry<K> {
    fn resolve_action(&self, namespace: &str, name: &str) -> Result<&ActionFactory<K>, NotFound> {
        self.actions
            .get(namespace)
            .and_then(|group| group.get(name))
            .ok_or_else(|| NotFound::new(ItemKind::Action, namespace, name))
    }

    fn resolve_modifier(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<&ModifierFactory<K>, NotFound> {
        self.modifiers
            .get(namespace)
            .and_then(|group| group.get(name))
            .ok_or_else(|| NotFound::new(ItemKind::Modifier, namespace, name))
    }
}
