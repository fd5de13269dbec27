//! Construction contract shared by actions and modifiers

use crate::address::StepAddress;
use crate::error::StepError;
use serde_yaml::Value;

/// Name and address an action or modifier was created under
///
/// The address already includes the item name as its last key segment, so
/// errors raised by the item point at its own configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemHeader {
    pub name: String,
    pub address: StepAddress,
}

impl ItemHeader {
    pub fn new(name: impl Into<String>, address: StepAddress) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

/// A configurable action or modifier type
///
/// Implementors validate and canonicalize their raw configuration in
/// [`StepItem::validate`]; the canonical form is then handed to
/// [`StepItem::from_parts`]. Items are immutable once built.
pub trait StepItem: Sized {
    /// Canonical configuration produced by validation
    type Config;

    /// Validate and canonicalize the raw configuration
    ///
    /// `raw` is `Value::Null` when the step named the item without a value.
    fn validate(name: &str, raw: &Value, addr: &StepAddress) -> Result<Self::Config, StepError>;

    /// Assemble the item from its header and validated configuration
    fn from_parts(header: ItemHeader, config: Self::Config) -> Self;
}

/// Validate `raw` and build the item
pub fn construct<T: StepItem>(name: &str, raw: &Value, addr: StepAddress) -> Result<T, StepError> {
    let config = T::validate(name, raw, &addr)?;
    Ok(T::from_parts(ItemHeader::new(name, addr), config))
}
