//! String interning for symbol names.
//!
//! Every `name: Atom` field on every symbol kind is a cheap, `Copy` handle
//! into an [`Interner`] rather than an owned `String` — comparing two names
//! for equality is an integer compare, and the arena never stores the same
//! identifier text twice.

use rustc_hash::FxHashMap;

/// A cheap, interned handle to a string.
///
/// `Atom`s are only comparable within the [`Interner`] that produced them;
/// comparing atoms from two different interners is meaningless (but safe —
/// it just won't mean what you think).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    /// The interned empty string. Every `Interner` reserves index 0 for it,
    /// so this is valid against any interner without a lookup.
    pub const EMPTY: Atom = Atom(0);

    #[must_use]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Deduplicating string table.
///
/// Single-threaded: a compilation owns exactly one `Interner`
/// alongside its `Factory`.
#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    lookup: FxHashMap<Box<str>, Atom>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Self {
            strings: Vec::new(),
            lookup: FxHashMap::default(),
        };
        let empty: Box<str> = "".into();
        interner.lookup.insert(empty.clone(), Atom::EMPTY);
        interner.strings.push(empty);
        interner
    }

    /// Intern `text`, returning its existing `Atom` if already present.
    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(&atom) = self.lookup.get(text) {
            return atom;
        }
        let atom = Atom(u32::try_from(self.strings.len()).expect("interner overflowed u32"));
        let boxed: Box<str> = text.into();
        self.strings.push(boxed.clone());
        self.lookup.insert(boxed, atom);
        atom
    }

    /// Resolve an `Atom` back to its text.
    ///
    /// # Panics
    /// Panics if `atom` was not produced by this interner — a programmer
    /// error, not a recoverable condition.
    #[must_use]
    pub fn resolve(&self, atom: Atom) -> &str {
        &self.strings[atom.0 as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_text_twice_dedupes() {
        let mut interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_text_gets_distinct_atoms() {
        let mut interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_round_trips() {
        let mut interner = Interner::new();
        let atom = interner.intern("hello");
        assert_eq!(interner.resolve(atom), "hello");
    }

    #[test]
    fn empty_atom_resolves_without_interning() {
        let interner = Interner::new();
        assert_eq!(interner.resolve(Atom::EMPTY), "");
    }
}
