//! Lookup engine: the five name-resolution modes, and `ScopeRef`,
//! the `sv-sema-checker::ScopeLookup` impl handed to the external checker
//! so it can resolve identifiers it encounters while binding.

use sv_sema_checker::{ConstantValue, SemanticChecker, ScopeLookup};
use sv_sema_common::{Atom, DiagnosticCode, Location};

use crate::arena::Factory;
use crate::symbol::{SymbolId, SymbolKind, SymbolPayload};

/// The five lookup modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupMode {
    Direct,
    Local,
    Scoped,
    Callable,
    Definition,
}

fn admits(mode: LookupMode, kind: SymbolKind) -> bool {
    match mode {
        LookupMode::Callable => kind == SymbolKind::Subroutine,
        LookupMode::Definition => {
            matches!(kind, SymbolKind::Module | SymbolKind::Interface | SymbolKind::Program)
        }
        LookupMode::Direct | LookupMode::Local | LookupMode::Scoped => true,
    }
}

/// A scope plus the checker needed to resolve constants found while
/// servicing the checker's own `lookup_constant` calls (a parameter's
/// default may itself reference another parameter, whose cell the checker
/// needs resolved to answer).
pub struct ScopeRef<'f> {
    factory: &'f Factory,
    scope: SymbolId,
    checker: &'f dyn SemanticChecker<ScopeRef<'f>>,
}

impl<'f> ScopeRef<'f> {
    #[must_use]
    pub fn new(factory: &'f Factory, scope: SymbolId, checker: &'f dyn SemanticChecker<ScopeRef<'f>>) -> Self {
        Self {
            factory,
            scope,
            checker,
        }
    }
}

impl<'f> ScopeLookup for ScopeRef<'f> {
    fn lookup_constant(&self, name: &str) -> Option<ConstantValue> {
        let loc = self.factory.location_of(self.scope);
        let id = self
            .factory
            .lookup(self.scope, name, &loc, LookupMode::Scoped, self.checker)?;
        Some(self.factory.constant_value_of(id, self.checker))
    }
}

/// Unwrap an explicit/implicit import to the symbol it targets. Anything
/// else passes through unchanged — the returned symbol is always the
/// imported target, never the import wrapper itself.
fn unwrap_import<'f>(factory: &'f Factory, id: SymbolId, checker: &dyn SemanticChecker<ScopeRef<'f>>) -> SymbolId {
    match factory.kind_of(id) {
        SymbolKind::ExplicitImport => crate::imports::explicit_import_target(factory, id, checker).unwrap_or(id),
        SymbolKind::ImplicitImport => crate::imports::implicit_import_target(factory, id),
        _ => id,
    }
}

/// Is `candidate`'s declaration lexically after `lookup_location`, within
/// the same file? Only meaningful when comparing against the *origin*
/// scope of a Local lookup; ancestor-scope matches are never
/// subjected to this check.
fn declared_after(candidate: &Location, lookup_location: &Location) -> bool {
    if candidate.is_synthetic() || lookup_location.is_synthetic() {
        return false;
    }
    if candidate.file != lookup_location.file {
        return false;
    }
    candidate.span.start > lookup_location.span.start
}

impl Factory {
    /// Direct: `S.member_map[name]`, no parent traversal, no import
    /// consideration.
    pub fn direct_lookup<'f>(
        &'f self,
        scope: SymbolId,
        name: Atom,
        checker: &dyn SemanticChecker<ScopeRef<'f>>,
    ) -> Option<SymbolId> {
        self.ensure_init(scope, checker);
        let rec = self.get_record(scope);
        let found = {
            let rec = rec.borrow();
            crate::scope::scope_data(&rec.payload).and_then(|s| s.member_map.get(&name).copied())
        };
        found.map(|id| unwrap_import(self, id, checker))
    }

    fn resolve_via_wildcards<'f>(
        &'f self,
        scope: SymbolId,
        name: Atom,
        lookup_location: &Location,
        checker: &dyn SemanticChecker<ScopeRef<'f>>,
    ) -> Option<SymbolId> {
        let wildcards = {
            let rec = self.get_record(scope);
            let rec = rec.borrow();
            crate::scope::scope_data(&rec.payload).map(|s| s.wildcard_imports.clone())
        }?;
        let name_str = self.resolve_atom(name);
        for wildcard in wildcards {
            if let Some(implicit) = crate::imports::wildcard_resolve(self, wildcard, &name_str, lookup_location, checker)
            {
                let rec = self.get_record(scope);
                let mut rec = rec.borrow_mut();
                if let Some(s) = crate::scope::scope_data_mut(&mut rec.payload) {
                    s.member_map.insert(name, implicit);
                }
                return Some(crate::imports::implicit_import_target(self, implicit));
            }
        }
        None
    }

    /// Local/Callable/Definition share this shape: direct match (with
    /// admission + visibility at the origin scope only), then wildcard
    /// fallback, then the parent walk — bounded by
    /// `MAX_SCOPE_WALK_ITERATIONS`.
    fn local_lookup<'f>(
        &'f self,
        origin: SymbolId,
        name: Atom,
        lookup_location: &Location,
        mode: LookupMode,
        checker: &dyn SemanticChecker<ScopeRef<'f>>,
    ) -> Option<SymbolId> {
        let mut current = origin;
        for _ in 0..sv_sema_common::limits::MAX_SCOPE_WALK_ITERATIONS {
            self.ensure_init(current, checker);

            let direct = {
                let rec = self.get_record(current);
                let rec = rec.borrow();
                crate::scope::scope_data(&rec.payload).and_then(|s| s.member_map.get(&name).copied())
            };
            if let Some(found) = direct {
                let unwrapped = unwrap_import(self, found, checker);
                if admits(mode, self.kind_of(unwrapped)) {
                    let hidden = current == origin && declared_after(&self.location_of(unwrapped), lookup_location);
                    if !hidden {
                        return Some(unwrapped);
                    }
                }
            }

            if let Some(found) = self.resolve_via_wildcards(current, name, lookup_location, checker) {
                if admits(mode, self.kind_of(found)) {
                    return Some(found);
                }
            }

            let parent = self.parent(current);
            if parent == current {
                break;
            }
            current = parent;
        }
        None
    }

    /// Package lookup by name — Definition-style lookup at the compilation
    /// root: a flat registry lookup rather than a walk
    /// of the root's (possibly still-initialising) scope — see the
    /// `Factory::packages` field doc for why. `root`/`checker` are accepted
    /// for call-site compatibility with the scope-walking API this
    /// replaced; a package is visible from anywhere once declared, so
    /// neither the calling scope nor the checker affects the answer.
    #[allow(unused_variables)]
    pub fn resolve_package_at_root<'f>(
        &'f self,
        name: Atom,
        root: SymbolId,
        checker: &dyn SemanticChecker<ScopeRef<'f>>,
    ) -> Option<SymbolId> {
        self.lookup_package(name)
    }

    /// The lookup engine's public entry point: dispatches by `mode`.
    pub fn lookup<'f>(
        &'f self,
        scope: SymbolId,
        name: &str,
        lookup_location: &Location,
        mode: LookupMode,
        checker: &dyn SemanticChecker<ScopeRef<'f>>,
    ) -> Option<SymbolId> {
        let name_atom = self.intern(name);
        match mode {
            LookupMode::Direct => self.direct_lookup(scope, name_atom, checker),
            LookupMode::Local | LookupMode::Callable => {
                self.local_lookup(scope, name_atom, lookup_location, mode, checker)
            }
            LookupMode::Scoped => {
                if let Some(found) = self.local_lookup(scope, name_atom, lookup_location, LookupMode::Local, checker)
                {
                    return Some(found);
                }
                self.lookup_package(name_atom)
            }
            LookupMode::Definition => self.lookup_definition(name_atom),
        }
    }

    /// Typed lookup for call sites that have already established presence:
    /// traps rather than returning `None` on absence or a kind
    /// mismatch.
    ///
    /// # Panics
    /// Panics if `name` does not resolve under `mode`, or resolves to a
    /// symbol whose kind differs from `expected`.
    pub fn lookup_as<'f>(
        &'f self,
        scope: SymbolId,
        name: &str,
        lookup_location: &Location,
        mode: LookupMode,
        expected: SymbolKind,
        checker: &dyn SemanticChecker<ScopeRef<'f>>,
    ) -> SymbolId {
        let id = self
            .lookup(scope, name, lookup_location, mode, checker)
            .unwrap_or_else(|| panic!("lookup({name:?}) expected a result under {mode:?} but found none"));
        self.as_kind(id, expected)
            .unwrap_or_else(|err| panic!("lookup({name:?}): {err}"))
    }

    /// Read a symbol's constant value, dispatching by kind (`Parameter`,
    /// plus the fixed-value `EnumValue`/`Genvar` kinds).
    /// Anything else yields a bad sentinel.
    pub fn constant_value_of<'f>(&'f self, id: SymbolId, checker: &dyn SemanticChecker<ScopeRef<'f>>) -> ConstantValue {
        match self.kind_of(id) {
            SymbolKind::Parameter => self.parameter_value(id, checker),
            SymbolKind::EnumValue => {
                let rec = self.get_record(id);
                let rec = rec.borrow();
                match &rec.payload {
                    SymbolPayload::EnumValue(e) => e.value,
                    _ => ConstantValue::bad(),
                }
            }
            SymbolKind::Genvar => {
                let rec = self.get_record(id);
                let rec = rec.borrow();
                match &rec.payload {
                    SymbolPayload::Genvar(g) => g.value,
                    _ => ConstantValue::bad(),
                }
            }
            found => {
                let found_text = found.name();
                self.add_error(id, DiagnosticCode::KindMismatch, &["Parameter, EnumValue, or Genvar", found_text]);
                ConstantValue::bad()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_sema_checker::StubChecker;
    use sv_sema_syntax::builder::TreeBuilder;

    use crate::root;

    #[test]
    fn constant_value_of_a_variable_reports_kind_mismatch() {
        let mut b = TreeBuilder::new();
        let ty = b.data_type(sv_sema_syntax::DataTypeKind::Int);
        let var = b.data_decl("x", ty, sv_sema_syntax::NodeIndex::NONE);
        let pkg = b.package_decl("p", vec![var]);
        let unit = b.source_unit(vec![pkg]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let pkg_id = factory.member(unit_id, 0, &checker).expect("package");
        let var_id = factory.member(pkg_id, 0, &checker).expect("variable");

        assert!(factory.constant_value_of(var_id, &checker).is_bad());
        let count = factory
            .diagnostics()
            .borrow()
            .iter()
            .filter(|d| d.code == DiagnosticCode::KindMismatch)
            .count();
        assert_eq!(count, 1);
    }
}
