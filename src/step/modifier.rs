use super::hints::ModifierHints;
use super::item::ItemHeader;
use super::{Action, Step, StepKind};
use crate::address::StepAddress;
use crate::chain::{HookResult, Outcome};
use std::sync::Arc;

/// Shared handle to a modifier inside a step
pub type ModifierRef<K> = Arc<dyn Modifier<K>>;

/// A unit wrapping the invocation of a step's action
///
/// Modifiers are applied in the order computed from their hints. Their
/// [`Modifier::pre`] hooks run in application order before the action, and
/// their [`Modifier::post`] hooks run in reverse order afterwards, each
/// receiving the outcome produced so far. Both hooks default to doing
/// nothing, so a modifier only overrides what it needs.
pub trait Modifier<K: StepKind>: Send + Sync {
    fn header(&self) -> &ItemHeader;

    fn name(&self) -> &str {
        &self.header().name
    }

    fn address(&self) -> &StepAddress {
        &self.header().address
    }

    /// Frozen ordering and compatibility hints of the modifier's type
    fn hints(&self) -> &ModifierHints;

    /// Hook called before the action, in application order
    ///
    /// `applied` lists the modifiers whose pre-hooks already ran, in order;
    /// `pending` lists those still to run. Returning an [`AbortSignal`]
    /// stops processing with the signal's outcome; returning a failure stops
    /// processing with that failure as the outcome. In both cases only the
    /// modifiers in `applied` get their post-hooks called.
    ///
    /// [`AbortSignal`]: crate::chain::AbortSignal
    fn pre(
        &self,
        _step: &Step<K>,
        _ctx: &mut K::Context,
        _applied: &[ModifierRef<K>],
        _pending: &[ModifierRef<K>],
        _action: &dyn Action<K>,
    ) -> HookResult<K::Value> {
        Ok(())
    }

    /// Hook called after the action, in reverse application order
    ///
    /// `handled` lists the modifiers whose post-hooks already processed the
    /// outcome, the first being the most recent; `remaining` lists those
    /// still to run, the last being the next. The returned outcome is handed
    /// on. Returning an error replaces the outcome with that failure.
    fn post(
        &self,
        _step: &Step<K>,
        _ctx: &mut K::Context,
        result: Outcome<K::Value>,
        _action: &dyn Action<K>,
        _handled: &[ModifierRef<K>],
        _remaining: &[ModifierRef<K>],
    ) -> anyhow::Result<Outcome<K::Value>> {
        Ok(result)
    }
}
