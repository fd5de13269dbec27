//! Inherited hint sets
//!
//! Modifier types carry four name sets (`before`, `after`, `required`,
//! `prohibited`) and step kinds carry a `metadata_keys` set. A type's
//! effective set is the union of what it declares itself and what every
//! parent type it extends declares. Each type computes its sets once, usually
//! inside a `once_cell::sync::Lazy` static, and hands out a reference to the
//! frozen result:
//!
//! ```
//! use once_cell::sync::Lazy;
//! use stepmaker::step::hints::{ModifierHints, Restriction};
//!
//! static LOOP_HINTS: Lazy<ModifierHints> = Lazy::new(|| {
//!     ModifierHints::declare()
//!         .restriction(Restriction::LAZY)
//!         .before(["when"])
//!         .build()
//! });
//!
//! static RETRY_HINTS: Lazy<ModifierHints> = Lazy::new(|| {
//!     ModifierHints::declare()
//!         .extends(&LOOP_HINTS)
//!         .before(["timeout"])
//!         .prohibited(["ignore-errors"])
//!         .build()
//! });
//!
//! assert!(RETRY_HINTS.before().contains("when"));
//! assert!(RETRY_HINTS.before().contains("timeout"));
//! assert_eq!(RETRY_HINTS.restriction(), Restriction::LAZY);
//! ```

use std::collections::BTreeSet;
use std::fmt;

/// Ordered set of modifier or metadata key names
pub type NameSet = BTreeSet<String>;

/// Whether an action runs at parse time or later against a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionClass {
    Lazy,
    Eager,
}

impl ActionClass {
    pub fn of(eager: bool) -> Self {
        if eager {
            ActionClass::Eager
        } else {
            ActionClass::Lazy
        }
    }
}

impl fmt::Display for ActionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionClass::Lazy => write!(f, "lazy"),
            ActionClass::Eager => write!(f, "eager"),
        }
    }
}

/// The action classes a modifier may be combined with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Restriction {
    lazy: bool,
    eager: bool,
}

impl Restriction {
    pub const LAZY: Restriction = Restriction {
        lazy: true,
        eager: false,
    };
    pub const EAGER: Restriction = Restriction {
        lazy: false,
        eager: true,
    };
    pub const ALL: Restriction = Restriction {
        lazy: true,
        eager: true,
    };

    /// Check whether the restriction admits an action class
    pub fn allows(&self, class: ActionClass) -> bool {
        match class {
            ActionClass::Lazy => self.lazy,
            ActionClass::Eager => self.eager,
        }
    }
}

impl Default for Restriction {
    fn default() -> Self {
        Restriction::ALL
    }
}

/// Frozen hint sets of a modifier type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierHints {
    restriction: Restriction,
    before: NameSet,
    after: NameSet,
    required: NameSet,
    prohibited: NameSet,
}

impl ModifierHints {
    /// Start declaring the hints of a modifier type
    pub fn declare() -> HintsBuilder {
        HintsBuilder::default()
    }

    pub fn restriction(&self) -> Restriction {
        self.restriction
    }

    /// Modifiers this one must be applied before
    pub fn before(&self) -> &NameSet {
        &self.before
    }

    /// Modifiers this one must be applied after
    pub fn after(&self) -> &NameSet {
        &self.after
    }

    /// Modifiers that must be present alongside this one
    pub fn required(&self) -> &NameSet {
        &self.required
    }

    /// Modifiers that must not be present alongside this one
    pub fn prohibited(&self) -> &NameSet {
        &self.prohibited
    }
}

/// Builder collecting a type's own hints and those of its parents
#[derive(Debug, Default)]
pub struct HintsBuilder {
    restriction: Option<Restriction>,
    inherited_restriction: Option<Restriction>,
    before: NameSet,
    after: NameSet,
    required: NameSet,
    prohibited: NameSet,
}

impl HintsBuilder {
    /// Declare the action classes the type works with
    ///
    /// Unlike the name sets this is not merged: the type's own declaration
    /// wins over anything inherited.
    pub fn restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = Some(restriction);
        self
    }

    pub fn before<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn after<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn prohibited<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prohibited.extend(names.into_iter().map(Into::into));
        self
    }

    /// Inherit from a parent type's frozen hints
    ///
    /// May be called several times for multiple parents. The restriction of
    /// the first parent is used when the type declares none.
    pub fn extends(mut self, parent: &ModifierHints) -> Self {
        self.inherited_restriction.get_or_insert(parent.restriction);
        self.before.extend(parent.before.iter().cloned());
        self.after.extend(parent.after.iter().cloned());
        self.required.extend(parent.required.iter().cloned());
        self.prohibited.extend(parent.prohibited.iter().cloned());
        self
    }

    /// Freeze the merged hints
    pub fn build(self) -> ModifierHints {
        ModifierHints {
            restriction: self
                .restriction
                .or(self.inherited_restriction)
                .unwrap_or_default(),
            before: self.before,
            after: self.after,
            required: self.required,
            prohibited: self.prohibited,
        }
    }
}

/// Merge a type's own metadata keys with those of its parent kinds
pub fn inherit_keys<'a, I, S>(own: I, parents: impl IntoIterator<Item = &'a NameSet>) -> NameSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut keys: NameSet = own.into_iter().map(Into::into).collect();
    for parent in parents {
        keys.extend(parent.iter().cloned());
    }
    keys
}
