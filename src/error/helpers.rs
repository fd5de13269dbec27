use super::{ErrorCode, StepError};
use crate::address::{PathSegment, StepAddress};
use serde::de::DeserializeOwned;

/// Extension trait for convenient error conversion
pub trait ErrorExt<T> {
    /// Convert to StepError reported at an address
    fn at_address(self, addr: &StepAddress, message: impl Into<String>) -> Result<T, StepError>;

    /// Convert to StepError reported at a location below an address
    fn at_path<I>(
        self,
        addr: &StepAddress,
        path: I,
        message: impl Into<String>,
    ) -> Result<T, StepError>
    where
        I: IntoIterator,
        I::Item: Into<PathSegment>;
}

impl<T, E> ErrorExt<T> for Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn at_address(self, addr: &StepAddress, message: impl Into<String>) -> Result<T, StepError> {
        self.map_err(|e| {
            StepError::at(addr, ErrorCode::CONFIG_INVALID_VALUE, message).with_source(e)
        })
    }

    fn at_path<I>(
        self,
        addr: &StepAddress,
        path: I,
        message: impl Into<String>,
    ) -> Result<T, StepError>
    where
        I: IntoIterator,
        I::Item: Into<PathSegment>,
    {
        self.map_err(|e| {
            StepError::at(&addr.extend(path), ErrorCode::CONFIG_INVALID_VALUE, message)
                .with_source(e)
        })
    }
}

/// Validate a raw configuration value by deserializing it into `T`
///
/// Intended for `StepItem::validate` implementations whose canonical
/// configuration is a plain serde type. Failures are reported at `addr`.
pub fn deserialize_config<T: DeserializeOwned>(
    name: &str,
    raw: &serde_yaml::Value,
    addr: &StepAddress,
) -> Result<T, StepError> {
    serde_yaml::from_value(raw.clone()).map_err(|e| {
        StepError::at(
            addr,
            ErrorCode::CONFIG_INVALID_VALUE,
            format!("Invalid configuration for \"{}\": {}", name, e),
        )
        .with_source(e)
    })
}

/// Render a list of names as `"a", "b"`
fn quoted_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Helper functions for common error scenarios
pub mod common {
    use super::*;

    /// A step description that is neither a name nor a mapping
    pub fn invalid_description(addr: &StepAddress, found: &str) -> StepError {
        StepError::at(
            addr,
            ErrorCode::CONFIG_INVALID_DESCRIPTION,
            format!("Step must be an action name or a mapping, found {}", found),
        )
    }

    /// A mapping key that is neither metadata nor a known action or modifier
    pub fn unknown_item(addr: &StepAddress, key: &str) -> StepError {
        StepError::at(
            addr,
            ErrorCode::CONFIG_UNKNOWN_ITEM,
            format!("Unknown action or modifier \"{}\"", key),
        )
    }

    /// A second action found while one is already set
    pub fn multiple_actions(addr: &StepAddress, name: &str, existing: &str) -> StepError {
        StepError::at(
            addr,
            ErrorCode::CONFIG_MULTIPLE_ACTIONS,
            format!(
                "Multiple actions \"{}\" and \"{}\" specified in step",
                name, existing
            ),
        )
    }

    pub fn no_action(addr: &StepAddress) -> StepError {
        StepError::at(addr, ErrorCode::CONFIG_NO_ACTION, "No action specified")
    }

    /// A modifier whose restriction excludes the action's class
    pub fn incompatible_modifier(addr: &StepAddress, modifier: &str, action: &str) -> StepError {
        StepError::at(
            addr,
            ErrorCode::MODIFIER_INCOMPATIBLE,
            format!(
                "Modifier \"{}\" is incompatible with action \"{}\"",
                modifier, action
            ),
        )
    }

    /// Prohibited modifiers present; `names` must already be sorted
    pub fn prohibited_modifiers<'a>(
        addr: &StepAddress,
        modifier: &str,
        names: impl IntoIterator<Item = &'a str>,
    ) -> StepError {
        StepError::at(
            addr,
            ErrorCode::MODIFIER_PROHIBITED,
            format!(
                "Modifier \"{}\" cannot be used with modifier(s): {}",
                modifier,
                quoted_list(names)
            ),
        )
    }

    /// Required modifiers missing; `names` must already be sorted
    pub fn required_modifiers<'a>(
        addr: &StepAddress,
        modifier: &str,
        names: impl IntoIterator<Item = &'a str>,
    ) -> StepError {
        StepError::at(
            addr,
            ErrorCode::MODIFIER_REQUIRED,
            format!(
                "Modifier \"{}\" requires the use of modifier(s): {}",
                modifier,
                quoted_list(names)
            ),
        )
    }

    /// Ordering hints that contradict each other
    pub fn ordering_cycle<'a>(
        addr: &StepAddress,
        names: impl IntoIterator<Item = &'a str>,
    ) -> StepError {
        StepError::at(
            addr,
            ErrorCode::MODIFIER_ORDER_CYCLE,
            format!("Modifier ordering cycle among: {}", quoted_list(names)),
        )
    }

    pub fn namespace_conflict(namespace: &str) -> StepError {
        StepError::with_code(
            ErrorCode::REGISTRY_NAMESPACE_CONFLICT,
            format!(
                "Action and modifier namespaces must be distinct, both are \"{}\"",
                namespace
            ),
            None,
        )
    }
}
