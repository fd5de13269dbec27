use super::item::ItemHeader;
use super::{Step, StepKind};
use crate::address::StepAddress;

/// The operation a step performs
///
/// Each step has exactly one action. Most actions are lazy: they run after
/// all steps were parsed, possibly several times (looping modifiers) or not
/// at all (conditional modifiers). Eager actions run once, while the step
/// list is being parsed, and their value is expanded into further steps by
/// [`StepKind::into_steps`].
pub trait Action<K: StepKind>: Send + Sync {
    fn header(&self) -> &ItemHeader;

    fn name(&self) -> &str {
        &self.header().name
    }

    fn address(&self) -> &StepAddress {
        &self.header().address
    }

    /// Whether the action runs at parse time
    fn eager(&self) -> bool {
        false
    }

    /// Evaluate the action
    fn call(&self, step: &Step<K>, ctx: &mut K::Context) -> anyhow::Result<K::Value>;
}
