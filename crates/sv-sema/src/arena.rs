//! Arena & Factory.
//!
//! Owns every symbol for one compilation, plus the interned-string table and
//! the diagnostic sink every symbol reports through. An index-arena keyed
//! by a newtype `SymbolId`, rather than `Rc`/`Arc` graphs, is cheap, `Copy`,
//! and free of borrow-checker friction when symbols cross-reference each
//! other (parent pointers, scope lookups, lazy-cell targets).
//!
//! Each symbol is independently `Rc<RefCell<_>>`-wrapped rather than the
//! whole arena being a single `RefCell<Vec<SymbolRecord>>`: elaboration
//! allocates new symbols (instances, generate blocks) while other symbols'
//! records are being read, and per-symbol cells keep those borrows from
//! contending with each other. Single-threaded throughout — `RefCell`,
//! not `RwLock`, is deliberate.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use sv_sema_common::{Atom, Diagnostics, Interner, Location};
use sv_sema_syntax::{NodeIndex, SyntaxTree};

use crate::generate::ElaborationOptions;
use crate::symbol::{SymbolId, SymbolRecord};

pub struct Factory {
    symbols: RefCell<Vec<Rc<RefCell<SymbolRecord>>>>,
    interner: RefCell<Interner>,
    diagnostics: Rc<RefCell<Diagnostics>>,
    tree: SyntaxTree,
    options: ElaborationOptions,
    /// The top-level source-unit nodes the root scope populates itself
    /// with — the root scope is constructed and populated with
    /// compilation-unit children. Usually one entry (one file);
    /// an embedder compiling several files passes one per file.
    source_units: Vec<NodeIndex>,
    /// Syntax backing a lazily-filled scope whose `SymbolPayload` variant
    /// has no room for it (`CompilationUnit`/`Package` are plain
    /// `ScopeData` in their data model). Keyed by the scope's own
    /// `SymbolId` rather than widening those variants.
    scope_syntax: RefCell<FxHashMap<SymbolId, NodeIndex>>,
    /// Flat name -> symbol registries for Definition-mode and package
    /// lookup, populated synchronously at construction time rather than
    /// discovered by walking the (lazily-initialising) scope graph.
    ///
    /// Definition-mode and Scoped-fallback lookups are root-anchored, but
    /// the root and compilation-unit scopes they'd otherwise
    /// have to walk are themselves under lazy construction during the very
    /// pass that declares the module/package being looked up: a module and
    /// an instantiation of it in the same source unit are sibling items
    /// processed in one `build_members_from_items` call, so looking the
    /// module up through `ensure_init` would re-enter the unit's own
    /// `Initialising` scope and spuriously report `CyclicDependency`. A
    /// registry outside the lazy scope machinery sidesteps that rather than
    /// requiring two passes over each compilation unit's item list.
    definitions: RefCell<FxHashMap<Atom, SymbolId>>,
    packages: RefCell<FxHashMap<Atom, SymbolId>>,
}

impl Factory {
    #[must_use]
    pub fn new(tree: SyntaxTree, source_units: Vec<NodeIndex>) -> Self {
        Self::with_options(tree, source_units, ElaborationOptions::default())
    }

    #[must_use]
    pub fn with_options(tree: SyntaxTree, source_units: Vec<NodeIndex>, options: ElaborationOptions) -> Self {
        Self {
            symbols: RefCell::new(Vec::new()),
            interner: RefCell::new(Interner::new()),
            diagnostics: Rc::new(RefCell::new(Diagnostics::new())),
            tree,
            options,
            source_units,
            scope_syntax: RefCell::new(FxHashMap::default()),
            definitions: RefCell::new(FxHashMap::default()),
            packages: RefCell::new(FxHashMap::default()),
        }
    }

    /// Register a module/interface/program definition under its name,
    /// for later Definition-mode lookup.
    pub(crate) fn register_definition(&self, name: Atom, id: SymbolId) {
        self.definitions.borrow_mut().insert(name, id);
    }

    /// Definition-mode lookup's only step: a flat lookup, never a scope
    /// walk — see the field doc on `definitions`.
    #[must_use]
    pub(crate) fn lookup_definition(&self, name: Atom) -> Option<SymbolId> {
        self.definitions.borrow().get(&name).copied()
    }

    /// Register a package under its name, for later package lookup.
    pub(crate) fn register_package(&self, name: Atom, id: SymbolId) {
        self.packages.borrow_mut().insert(name, id);
    }

    /// Package lookup by name, never by walking the root scope (see the
    /// field doc on `packages`).
    #[must_use]
    pub(crate) fn lookup_package(&self, name: Atom) -> Option<SymbolId> {
        self.packages.borrow().get(&name).copied()
    }

    #[must_use]
    pub fn source_units(&self) -> &[NodeIndex] {
        &self.source_units
    }

    pub(crate) fn set_scope_syntax(&self, id: SymbolId, syntax: NodeIndex) {
        self.scope_syntax.borrow_mut().insert(id, syntax);
    }

    #[must_use]
    pub(crate) fn scope_syntax_of(&self, id: SymbolId) -> NodeIndex {
        self.scope_syntax.borrow().get(&id).copied().unwrap_or(NodeIndex::NONE)
    }

    #[must_use]
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    #[must_use]
    pub fn options(&self) -> &ElaborationOptions {
        &self.options
    }

    pub fn intern(&self, s: &str) -> Atom {
        self.interner.borrow_mut().intern(s)
    }

    #[must_use]
    pub fn resolve_atom(&self, atom: Atom) -> String {
        self.interner.borrow().resolve(atom).to_string()
    }

    #[must_use]
    pub fn diagnostics(&self) -> Rc<RefCell<Diagnostics>> {
        Rc::clone(&self.diagnostics)
    }

    pub(crate) fn alloc(&self, record: SymbolRecord) -> SymbolId {
        let mut symbols = self.symbols.borrow_mut();
        let id = SymbolId(u32::try_from(symbols.len()).expect("symbol arena overflowed u32"));
        symbols.push(Rc::new(RefCell::new(record)));
        id
    }

    /// Allocate a symbol that needs its own id while building its record —
    /// the root, whose `parent_scope` is itself (its only self-reference).
    pub(crate) fn alloc_self_parented(&self, make: impl FnOnce(SymbolId) -> SymbolRecord) -> SymbolId {
        let mut symbols = self.symbols.borrow_mut();
        let id = SymbolId(u32::try_from(symbols.len()).expect("symbol arena overflowed u32"));
        symbols.push(Rc::new(RefCell::new(make(id))));
        id
    }

    pub(crate) fn get_record(&self, id: SymbolId) -> Rc<RefCell<SymbolRecord>> {
        self.symbols
            .borrow()
            .get(id.0 as usize)
            .unwrap_or_else(|| panic!("invalid symbol id {id:?}"))
            .clone()
    }

    /// Wrap a syntax node's span into a `Location`. Falls back to a
    /// synthetic location for `NodeIndex::NONE` or a dangling index.
    #[must_use]
    pub fn location_of_syntax(&self, idx: sv_sema_syntax::NodeIndex) -> Location {
        match self.tree.get(idx) {
            Some(node) => Location::new("<unit>", node.span),
            None => Location::synthetic(),
        }
    }

    pub(crate) fn report(
        &self,
        code: sv_sema_common::DiagnosticCode,
        location: Location,
        args: &[&str],
    ) {
        self.diagnostics.borrow_mut().report(code, location, args);
    }
}
