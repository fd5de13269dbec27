//! Values threaded through the hook chain

use std::fmt;

/// A captured runtime failure carried as an ordinary value
///
/// The wrapped [`anyhow::Error`] keeps the failure's full identity: the
/// concrete error type stays reachable through [`ExceptionalResult::downcast_ref`],
/// and the message and cause chain are preserved for the caller that finally
/// surfaces it.
pub struct ExceptionalResult {
    error: anyhow::Error,
}

impl ExceptionalResult {
    pub fn new(error: anyhow::Error) -> Self {
        Self { error }
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    /// Check whether the captured failure is of type `E`
    pub fn is<E>(&self) -> bool
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.is::<E>()
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    /// Messages of the failure and each of its causes, outermost first
    pub fn chain(&self) -> Vec<String> {
        self.error.chain().map(|cause| cause.to_string()).collect()
    }

    /// Give the captured failure back, for surfacing it as an `Err`
    pub fn into_error(self) -> anyhow::Error {
        self.error
    }
}

impl From<anyhow::Error> for ExceptionalResult {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for ExceptionalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionalResult")
            .field("error", &format_args!("{:#}", self.error))
            .finish()
    }
}

impl fmt::Display for ExceptionalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

/// Result of evaluating a step, or part of its hook chain
#[derive(Debug)]
pub enum Outcome<T> {
    /// Value returned by the action or substituted by a modifier
    Value(T),
    /// Processing was aborted without a replacement value
    Skipped,
    /// A hook or the action failed
    Failed(ExceptionalResult),
}

impl<T> Outcome<T> {
    /// Wrap an action or hook return into an outcome
    pub fn from_result(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Value(value),
            Err(err) => Outcome::Failed(ExceptionalResult::new(err)),
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ExceptionalResult> {
        match self {
            Outcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Transform a value, leaving skips and failures untouched
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Value(value) => Outcome::Value(f(value)),
            Outcome::Skipped => Outcome::Skipped,
            Outcome::Failed(failure) => Outcome::Failed(failure),
        }
    }

    /// Surface a captured failure as an error
    ///
    /// Returns `Ok(None)` for a skipped step and `Ok(Some(value))` otherwise.
    pub fn into_result(self) -> anyhow::Result<Option<T>> {
        match self {
            Outcome::Value(value) => Ok(Some(value)),
            Outcome::Skipped => Ok(None),
            Outcome::Failed(failure) => Err(failure.into_error()),
        }
    }
}

/// Control token a pre-hook returns to stop the step early
///
/// Aborting is not a failure: the outcome carried here becomes the step's
/// result and the post-hooks of the modifiers applied so far still run.
#[derive(Debug)]
pub struct AbortSignal<T> {
    result: Outcome<T>,
}

impl<T> AbortSignal<T> {
    /// Abort, reporting the step as skipped
    pub fn skip() -> Self {
        Self {
            result: Outcome::Skipped,
        }
    }

    /// Abort, using `value` as the step's result
    pub fn with_value(value: T) -> Self {
        Self {
            result: Outcome::Value(value),
        }
    }

    /// Abort with an arbitrary outcome
    pub fn with_outcome(result: Outcome<T>) -> Self {
        Self { result }
    }

    pub fn into_outcome(self) -> Outcome<T> {
        self.result
    }
}

impl<T> Default for AbortSignal<T> {
    fn default() -> Self {
        Self::skip()
    }
}

/// Ways a pre-hook can stop forward processing
#[derive(Debug)]
pub enum HookInterrupt<T> {
    Abort(AbortSignal<T>),
    Failure(anyhow::Error),
}

impl<T> From<AbortSignal<T>> for HookInterrupt<T> {
    fn from(signal: AbortSignal<T>) -> Self {
        HookInterrupt::Abort(signal)
    }
}

impl<T> From<anyhow::Error> for HookInterrupt<T> {
    fn from(err: anyhow::Error) -> Self {
        HookInterrupt::Failure(err)
    }
}

/// Return type of pre-hooks
pub type HookResult<T> = std::result::Result<(), HookInterrupt<T>>;
