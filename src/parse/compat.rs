//! Compatibility checks between a step's action and its modifiers

use crate::address::StepAddress;
use crate::error::{common, StepError};
use crate::step::{ActionClass, ModifierHints};
use std::collections::BTreeMap;

/// Check every modifier's hints against the action and the other modifiers
///
/// Modifiers are visited in ascending name order and the first violation
/// is returned. Name lists in the error are sorted ascending.
pub fn validate(
    addr: &StepAddress,
    action: &str,
    class: ActionClass,
    modifiers: &BTreeMap<&str, &ModifierHints>,
) -> Result<(), StepError> {
    for (&name, hints) in modifiers {
        if !hints.restriction().allows(class) {
            return Err(common::incompatible_modifier(addr, name, action));
        }

        let prohibited: Vec<&str> = hints
            .prohibited()
            .iter()
            .map(String::as_str)
            .filter(|other| modifiers.contains_key(other))
            .collect();
        if !prohibited.is_empty() {
            return Err(common::prohibited_modifiers(addr, name, prohibited));
        }

        let missing: Vec<&str> = hints
            .required()
            .iter()
            .map(String::as_str)
            .filter(|other| !modifiers.contains_key(other))
            .collect();
        if !missing.is_empty() {
            return Err(common::required_modifiers(addr, name, missing));
        }
    }

    Ok(())
}
