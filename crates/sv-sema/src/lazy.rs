//! Lazy binding cells.
//!
//! A cell holds exactly one of {unresolved syntax reference, resolved
//! semantic value}. It transitions at most once; re-entrant resolution
//! (cell X's own evaluation transitively reads cell X) is a cycle and is
//! reported, then the cell is left resolved to a bad sentinel so it never
//! re-diagnoses on subsequent reads.
//!
//! `begin`/`finish` split the transition in two so that callers never hold
//! a symbol's `RefCell` borrow across the (possibly re-entrant) call into
//! the external checker: `begin` marks the cell `Resolving` and returns,
//! the caller drops its borrow, calls the checker, then re-borrows to
//! `finish`.

use sv_sema_checker::{ConstantValue, Statement, StatementList, TypeSymbol};
use sv_sema_syntax::NodeIndex;

/// A value a lazy cell can hold, with a sentinel for failed resolution.
pub trait BadSentinel {
    fn bad_sentinel() -> Self;
}

impl BadSentinel for ConstantValue {
    fn bad_sentinel() -> Self {
        ConstantValue::bad()
    }
}

impl BadSentinel for TypeSymbol {
    fn bad_sentinel() -> Self {
        TypeSymbol::bad()
    }
}

impl BadSentinel for Statement {
    fn bad_sentinel() -> Self {
        Statement { is_bad: true }
    }
}

impl BadSentinel for StatementList {
    fn bad_sentinel() -> Self {
        StatementList {
            statements: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
enum LazyState<T> {
    /// Seeded with no syntax at all (e.g. an optional initializer that was
    /// never written); `get_opt` returns empty without ever evaluating.
    Empty,
    Unresolved(NodeIndex),
    Resolving,
    Resolved(T),
}

impl<T> Default for LazyState<T> {
    fn default() -> Self {
        LazyState::Empty
    }
}

/// Outcome of starting a read. The caller must finish a `NeedsEval` by
/// evaluating the syntax and calling [`LazyCell::finish`].
pub enum LazyRead<T> {
    Ready(T),
    NeedsEval(NodeIndex),
}

/// One of the four (or five, depending how you count `LazyInitializer`
/// against `LazyConstant`) concrete cell kinds, generic over
/// the resolved value type.
#[derive(Clone, Debug, Default)]
pub struct LazyCell<T> {
    state: LazyState<T>,
}

impl<T: Clone + BadSentinel> LazyCell<T> {
    #[must_use]
    pub fn unresolved(syntax: NodeIndex) -> Self {
        Self {
            state: LazyState::Unresolved(syntax),
        }
    }

    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self {
            state: LazyState::Resolved(value),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            state: LazyState::Empty,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self.state, LazyState::Resolved(_))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.state, LazyState::Empty)
    }

    /// Replace the cell's contents outright (`set(value)`/`set(syntax)`).
    pub fn set_value(&mut self, value: T) {
        self.state = LazyState::Resolved(value);
    }

    pub fn set_syntax(&mut self, syntax: NodeIndex) {
        self.state = LazyState::Unresolved(syntax);
    }

    /// Begin a read. On `Resolved`, returns the cached value directly. On a
    /// cycle (`Resolving` re-entered), installs the bad sentinel and
    /// returns it — the caller should still report the cycle diagnostic
    /// itself, since only it knows the symbol's name/location. On
    /// `Unresolved`, transitions to `Resolving` and hands back the syntax
    /// to evaluate. `Empty` behaves like an already-resolved bad sentinel,
    /// without installing it into the cell (so `is_empty` stays accurate).
    pub fn begin(&mut self) -> LazyRead<T> {
        match &self.state {
            LazyState::Resolved(v) => LazyRead::Ready(v.clone()),
            LazyState::Empty => LazyRead::Ready(T::bad_sentinel()),
            LazyState::Resolving => {
                let bad = T::bad_sentinel();
                self.state = LazyState::Resolved(bad.clone());
                LazyRead::Ready(bad)
            }
            LazyState::Unresolved(syntax) => {
                let syntax = *syntax;
                self.state = LazyState::Resolving;
                LazyRead::NeedsEval(syntax)
            }
        }
    }

    /// Was the cell in `Resolving` (i.e. did `begin` just detect a cycle)?
    /// Callers check this via the `LazyRead` variant instead; kept for
    /// completeness/tests.
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        matches!(self.state, LazyState::Resolving)
    }

    pub fn finish(&mut self, value: T) {
        self.state = LazyState::Resolved(value);
    }
}

pub type LazyConstant = LazyCell<ConstantValue>;
pub type LazyInitializer = LazyCell<ConstantValue>;
pub type LazyType = LazyCell<TypeSymbol>;
pub type LazyStatement = LazyCell<Statement>;
pub type LazyStatementList = LazyCell<StatementList>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_read_is_idempotent() {
        let mut cell = LazyConstant::resolved(ConstantValue::int(3));
        match cell.begin() {
            LazyRead::Ready(v) => assert_eq!(v, ConstantValue::int(3)),
            LazyRead::NeedsEval(_) => panic!("expected ready"),
        }
        match cell.begin() {
            LazyRead::Ready(v) => assert_eq!(v, ConstantValue::int(3)),
            LazyRead::NeedsEval(_) => panic!("expected ready"),
        }
    }

    #[test]
    fn reentrant_begin_is_a_cycle() {
        let mut cell = LazyConstant::unresolved(NodeIndex(0));
        match cell.begin() {
            LazyRead::NeedsEval(_) => {}
            LazyRead::Ready(_) => panic!("expected needs-eval"),
        }
        match cell.begin() {
            LazyRead::Ready(v) => assert!(v.is_bad()),
            LazyRead::NeedsEval(_) => panic!("expected cycle sentinel"),
        }
        assert!(cell.is_resolved());
    }

    #[test]
    fn empty_cell_never_transitions() {
        let mut cell: LazyConstant = LazyCell::empty();
        match cell.begin() {
            LazyRead::Ready(v) => assert!(v.is_bad()),
            LazyRead::NeedsEval(_) => panic!("expected ready"),
        }
        assert!(cell.is_empty());
    }
}
