//! Hook chain evaluation
//!
//! Evaluating a step runs its modifiers' pre-hooks in order, then the action,
//! then the post-hooks of every modifier whose pre-hook completed, in
//! reverse. A pre-hook can stop forward processing by aborting or failing;
//! failures of the action and of any hook are captured as
//! [`ExceptionalResult`]s and handed to the remaining post-hooks instead of
//! unwinding past them.

pub mod outcome;

pub use outcome::{AbortSignal, ExceptionalResult, HookInterrupt, HookResult, Outcome};

use crate::step::{Action, ModifierRef, Step, StepKind};
use tracing::{debug, trace};

/// How forward processing ended
enum Forward<T> {
    /// Every pre-hook completed; the action is next
    Completed,
    /// A pre-hook stopped processing at the given pending index
    Stopped { at: usize, result: Outcome<T> },
}

/// Run the pre-hooks of `pending` in order
fn run_forward<K: StepKind>(
    step: &Step<K>,
    ctx: &mut K::Context,
    applied: &[ModifierRef<K>],
    pending: &[ModifierRef<K>],
    action: &dyn Action<K>,
) -> Forward<K::Value> {
    for (i, modifier) in pending.iter().enumerate() {
        let before: Vec<ModifierRef<K>> = applied.iter().chain(&pending[..i]).cloned().collect();

        trace!(step = %step.address(), modifier = modifier.name(), "pre-hook");
        match modifier.pre(step, ctx, &before, &pending[i + 1..], action) {
            Ok(()) => {}
            Err(HookInterrupt::Abort(signal)) => {
                debug!(
                    "Modifier \"{}\" aborted step at {}",
                    modifier.name(),
                    step.address()
                );
                return Forward::Stopped {
                    at: i,
                    result: signal.into_outcome(),
                };
            }
            Err(HookInterrupt::Failure(err)) => {
                debug!(
                    "Pre-hook of modifier \"{}\" failed at {}: {:#}",
                    modifier.name(),
                    step.address(),
                    err
                );
                return Forward::Stopped {
                    at: i,
                    result: Outcome::Failed(ExceptionalResult::new(err)),
                };
            }
        }
    }

    Forward::Completed
}

/// Evaluate the hooks of `pending` around `action`
///
/// `applied` is only reported to hooks; those modifiers are not run again.
/// The returned outcome may be a failure, which is never raised here.
pub fn evaluate<K: StepKind>(
    step: &Step<K>,
    ctx: &mut K::Context,
    applied: &[ModifierRef<K>],
    pending: &[ModifierRef<K>],
    action: &dyn Action<K>,
) -> Outcome<K::Value> {
    let (completed, mut result) = match run_forward(step, ctx, applied, pending, action) {
        Forward::Completed => {
            trace!(step = %step.address(), action = action.name(), "action");
            let result = Outcome::from_result(action.call(step, ctx));
            if let Outcome::Failed(failure) = &result {
                debug!(
                    "Action \"{}\" failed at {}: {:#}",
                    action.name(),
                    step.address(),
                    failure.error()
                );
            }
            (pending.len(), result)
        }
        // The stopping modifier's pre-hook did not complete, so it is not unwound
        Forward::Stopped { at, result } => (at, result),
    };

    for j in (0..completed).rev() {
        let modifier = &pending[j];
        let remaining: Vec<ModifierRef<K>> = applied.iter().chain(&pending[..j]).cloned().collect();

        trace!(step = %step.address(), modifier = modifier.name(), "post-hook");
        result = match modifier.post(step, ctx, result, action, &pending[j + 1..], &remaining) {
            Ok(result) => result,
            Err(err) => {
                debug!(
                    "Post-hook of modifier \"{}\" failed at {}: {:#}",
                    modifier.name(),
                    step.address(),
                    err
                );
                Outcome::Failed(ExceptionalResult::new(err))
            }
        };
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::StepAddress;
    use crate::testing::{CallLog, ScriptedAction, ScriptedModifier, TestKind};

    fn build_step(action: ScriptedAction, modifiers: Vec<ScriptedModifier>) -> Step<TestKind> {
        let modifiers = modifiers
            .into_iter()
            .map(ScriptedModifier::into_ref)
            .collect();
        Step::new(
            Box::new(action),
            StepAddress::new("chain.yaml").idx(0),
            modifiers,
            Default::default(),
        )
        .unwrap()
    }

    fn three_modifiers(log: &CallLog) -> Vec<ScriptedModifier> {
        (0..3)
            .map(|i| ScriptedModifier::new(&format!("m{}", i), log))
            .collect()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_happy_path_order() {
        let log = CallLog::default();
        let action = ScriptedAction::returning("A", &log, "action");
        let step = build_step(action, three_modifiers(&log));

        let result = step.call(&mut ()).unwrap();

        assert_eq!(result.as_deref(), Some("action|m2|m1|m0"));
        assert_eq!(
            log.entries(),
            vec!["pre:m0", "pre:m1", "pre:m2", "call:A", "post:m2", "post:m1", "post:m0"]
        );
    }

    #[test]
    fn test_hooks_receive_modifier_partitions() {
        let log = CallLog::default();
        let action = ScriptedAction::returning("A", &log, "action");
        let step = build_step(action, three_modifiers(&log));

        step.call(&mut ()).unwrap();

        assert_eq!(log.applied_seen_by("m0"), vec![names(&[])]);
        assert_eq!(log.applied_seen_by("m1"), vec![names(&["m0"])]);
        assert_eq!(log.applied_seen_by("m2"), vec![names(&["m0", "m1"])]);

        assert_eq!(log.pending_seen_by("m0"), vec![names(&["m1", "m2"])]);
        assert_eq!(log.pending_seen_by("m1"), vec![names(&["m2"])]);
        assert_eq!(log.pending_seen_by("m2"), vec![names(&[])]);

        // post receives (handled, remaining): modifiers after it, then before it
        assert_eq!(
            log.post_lists_seen_by("m2"),
            vec![(names(&[]), names(&["m0", "m1"]))]
        );
        assert_eq!(
            log.post_lists_seen_by("m1"),
            vec![(names(&["m2"]), names(&["m0"]))]
        );
        assert_eq!(
            log.post_lists_seen_by("m0"),
            vec![(names(&["m1", "m2"]), names(&[]))]
        );
    }

    #[test]
    fn test_no_modifiers_calls_action_once() {
        let log = CallLog::default();
        let action = ScriptedAction::returning("A", &log, "only");
        let step = build_step(action, vec![]);

        assert_eq!(step.call(&mut ()).unwrap().as_deref(), Some("only"));
        assert_eq!(log.entries(), vec!["call:A"]);
    }

    #[test]
    fn test_abort_skips_aborting_modifier_post_hook() {
        let log = CallLog::default();
        let action = ScriptedAction::returning("A", &log, "action");
        let mut modifiers = three_modifiers(&log);
        modifiers[1] = ScriptedModifier::new("m1", &log).abort_with(Some("X"));
        let step = build_step(action, modifiers);

        let result = step.call(&mut ()).unwrap();

        assert_eq!(result.as_deref(), Some("X|m0"));
        assert_eq!(log.entries(), vec!["pre:m0", "pre:m1", "post:m0"]);
    }

    #[test]
    fn test_abort_without_value_is_skipped() {
        let log = CallLog::default();
        let action = ScriptedAction::returning("A", &log, "action");
        let modifiers = vec![
            ScriptedModifier::new("m0", &log).passthrough(),
            ScriptedModifier::new("m1", &log).abort_with(None),
        ];
        let step = build_step(action, modifiers);

        assert_eq!(step.call(&mut ()).unwrap(), None);
        assert_eq!(log.entries(), vec!["pre:m0", "pre:m1", "post:m0"]);
    }

    #[test]
    fn test_pre_hook_failure_threads_exceptional_result() {
        let log = CallLog::default();
        let action = ScriptedAction::returning("A", &log, "action");
        let modifiers = vec![
            ScriptedModifier::new("m0", &log).passthrough(),
            ScriptedModifier::new("m1", &log).fail_pre("pre exploded"),
            ScriptedModifier::new("m2", &log),
        ];
        let step = build_step(action, modifiers);

        let outcome = step.evaluate(&mut (), &[], step.modifiers(), step.action());

        assert_eq!(
            outcome.failure().map(|f| f.to_string()),
            Some("pre exploded".to_string())
        );
        assert_eq!(log.entries(), vec!["pre:m0", "pre:m1", "post:m0"]);
        assert_eq!(log.seen_by("m0"), vec!["failed:pre exploded"]);
    }

    #[test]
    fn test_action_failure_reaches_every_post_hook() {
        let log = CallLog::default();
        let action = ScriptedAction::failing("A", &log, "action exploded");
        let modifiers = (0..3)
            .map(|i| ScriptedModifier::new(&format!("m{}", i), &log).passthrough())
            .collect();
        let step = build_step(action, modifiers);

        let err = step.call(&mut ()).unwrap_err();

        assert_eq!(err.to_string(), "action exploded");
        assert_eq!(
            log.entries(),
            vec!["pre:m0", "pre:m1", "pre:m2", "call:A", "post:m2", "post:m1", "post:m0"]
        );
        assert_eq!(log.seen_by("m2"), vec!["failed:action exploded"]);
    }

    #[test]
    fn test_post_hook_failure_does_not_halt_unwind() {
        let log = CallLog::default();
        let action = ScriptedAction::returning("A", &log, "action");
        let modifiers = vec![
            ScriptedModifier::new("m0", &log),
            ScriptedModifier::new("m1", &log).fail_post("post exploded"),
            ScriptedModifier::new("m2", &log),
        ];
        let step = build_step(action, modifiers);

        let err = step.call(&mut ()).unwrap_err();

        assert_eq!(err.to_string(), "post exploded");
        assert_eq!(
            log.entries(),
            vec!["pre:m0", "pre:m1", "pre:m2", "call:A", "post:m2", "post:m1", "post:m0"]
        );
        assert_eq!(log.seen_by("m1"), vec!["value:action|m2"]);
        assert_eq!(log.seen_by("m0"), vec!["failed:post exploded"]);
    }

    #[test]
    fn test_post_hook_can_recover_from_action_failure() {
        let log = CallLog::default();
        let action = ScriptedAction::failing("A", &log, "flaky");
        let modifiers = vec![ScriptedModifier::new("rescue", &log).recover("rescued")];
        let step = build_step(action, modifiers);

        assert_eq!(step.call(&mut ()).unwrap().as_deref(), Some("rescued"));
    }

    #[test]
    fn test_partial_evaluation_reports_applied_modifiers() {
        let log = CallLog::default();
        let action = ScriptedAction::returning("A", &log, "action");
        let step = build_step(action, three_modifiers(&log));
        let (applied, pending) = step.modifiers().split_at(1);

        let outcome = evaluate(&step, &mut (), applied, pending, step.action());

        assert_eq!(outcome.value().map(String::as_str), Some("action|m2|m1"));
        assert_eq!(
            log.entries(),
            vec!["pre:m1", "pre:m2", "call:A", "post:m2", "post:m1"]
        );
        assert_eq!(log.applied_seen_by("m1"), vec![names(&["m0"])]);
        assert_eq!(log.applied_seen_by("m2"), vec![names(&["m0", "m1"])]);
        assert_eq!(log.pending_seen_by("m1"), vec![names(&["m2"])]);
        assert_eq!(log.pending_seen_by("m2"), vec![names(&[])]);

        assert!(log.applied_seen_by("m0").is_empty());
        assert!(log.post_lists_seen_by("m0").is_empty());
        assert_eq!(
            log.post_lists_seen_by("m2"),
            vec![(names(&[]), names(&["m0", "m1"]))]
        );
        assert_eq!(
            log.post_lists_seen_by("m1"),
            vec![(names(&["m2"]), names(&["m0"]))]
        );
    }

    #[test]
    fn test_partial_evaluation_never_raises() {
        let log = CallLog::default();
        let action = ScriptedAction::returning("A", &log, "action");
        let step = build_step(action, vec![]);
        let failing = ScriptedAction::failing("B", &log, "bad");

        let outcome = step.evaluate(&mut (), &[], &[], &failing);
        assert!(outcome.is_failed());
        assert_eq!(log.entries(), vec!["call:B"]);
    }
}
