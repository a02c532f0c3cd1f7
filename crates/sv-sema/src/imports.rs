//! Import resolution: explicit imports, wildcard imports, and the
//! implicit imports a wildcard produces on demand.

use rustc_hash::FxHashMap;
use sv_sema_checker::SemanticChecker;
use sv_sema_common::{Atom, DiagnosticCode, Location};
use sv_sema_syntax::NodeIndex;

use crate::arena::Factory;
use crate::lookup::ScopeRef;
use crate::symbol::{SymbolId, SymbolPayload, SymbolRecord};

#[derive(Debug, Default)]
pub struct ExplicitImportData {
    pub package_name: Atom,
    pub imported_name: Atom,
    package: Option<SymbolId>,
    target: Option<SymbolId>,
    missing_package_reported: bool,
    missing_member_reported: bool,
}

#[derive(Debug, Default)]
pub struct WildcardImportData {
    pub package_name: Atom,
    package: Option<SymbolId>,
    missing_package_reported: bool,
    /// Memoised per (this wildcard, name): results are memoised per
    /// (wildcard, name) pair.
    resolved: FxHashMap<Atom, SymbolId>,
}

#[derive(Clone, Copy, Debug)]
pub struct ImplicitImportData {
    pub target: SymbolId,
    pub wildcard: SymbolId,
}

pub(crate) fn construct_explicit_import(factory: &Factory, parent: SymbolId, syntax: NodeIndex) -> SymbolId {
    let (package, imported) = factory
        .tree()
        .get_explicit_import(syntax)
        .map(|(p, i)| (p.to_string(), i.to_string()))
        .unwrap_or_default();
    let package_atom = factory.intern(&package);
    let imported_atom = factory.intern(&imported);
    let location = factory.location_of_syntax(syntax);
    factory.alloc(SymbolRecord {
        name: imported_atom,
        location,
        parent_scope: parent,
        payload: SymbolPayload::ExplicitImport(ExplicitImportData {
            package_name: package_atom,
            imported_name: imported_atom,
            ..Default::default()
        }),
    })
}

pub(crate) fn construct_wildcard_import(factory: &Factory, parent: SymbolId, syntax: NodeIndex) -> SymbolId {
    let package = factory.tree().get_wildcard_import(syntax).unwrap_or_default().to_string();
    let package_atom = factory.intern(&package);
    let location = factory.location_of_syntax(syntax);
    factory.alloc(SymbolRecord {
        name: Atom::EMPTY,
        location,
        parent_scope: parent,
        payload: SymbolPayload::WildcardImport(WildcardImportData {
            package_name: package_atom,
            ..Default::default()
        }),
    })
}

/// Shared by explicit and wildcard imports: resolve+memoise the package
/// symbol, diagnosing `MissingPackage` at most once per import symbol.
fn resolve_package<'f>(
    factory: &'f Factory,
    import_id: SymbolId,
    package_name: Atom,
    checker: &dyn SemanticChecker<ScopeRef<'f>>,
) -> Option<SymbolId> {
    let cached = {
        let rec = factory.get_record(import_id);
        let rec = rec.borrow();
        match &rec.payload {
            SymbolPayload::ExplicitImport(d) => d.package,
            SymbolPayload::WildcardImport(d) => d.package,
            _ => None,
        }
    };
    if let Some(p) = cached {
        return Some(p);
    }
    let root = factory.root(import_id);
    if let Some(p) = factory.resolve_package_at_root(package_name, root, checker) {
        let rec = factory.get_record(import_id);
        let mut rec = rec.borrow_mut();
        match &mut rec.payload {
            SymbolPayload::ExplicitImport(d) => d.package = Some(p),
            SymbolPayload::WildcardImport(d) => d.package = Some(p),
            _ => {}
        }
        return Some(p);
    }
    let already_reported = {
        let rec = factory.get_record(import_id);
        let rec = rec.borrow();
        match &rec.payload {
            SymbolPayload::ExplicitImport(d) => d.missing_package_reported,
            SymbolPayload::WildcardImport(d) => d.missing_package_reported,
            _ => true,
        }
    };
    if !already_reported {
        let text = factory.resolve_atom(package_name);
        factory.add_error(import_id, DiagnosticCode::MissingPackage, &[&text]);
        let rec = factory.get_record(import_id);
        let mut rec = rec.borrow_mut();
        match &mut rec.payload {
            SymbolPayload::ExplicitImport(d) => d.missing_package_reported = true,
            SymbolPayload::WildcardImport(d) => d.missing_package_reported = true,
            _ => {}
        }
    }
    None
}

/// `ExplicitImport.imported_symbol()`: Direct lookup of the imported
/// name within the resolved package, memoised, diagnosing
/// `MissingImportedMember` at most once.
pub(crate) fn explicit_import_target<'f>(
    factory: &'f Factory,
    id: SymbolId,
    checker: &dyn SemanticChecker<ScopeRef<'f>>,
) -> Option<SymbolId> {
    let (cached, package_name, imported_name) = {
        let rec = factory.get_record(id);
        let rec = rec.borrow();
        match &rec.payload {
            SymbolPayload::ExplicitImport(d) => (d.target, d.package_name, d.imported_name),
            _ => return None,
        }
    };
    if let Some(t) = cached {
        return Some(t);
    }
    let package = resolve_package(factory, id, package_name, checker)?;
    match factory.direct_lookup(package, imported_name, checker) {
        Some(target) => {
            let rec = factory.get_record(id);
            let mut rec = rec.borrow_mut();
            if let SymbolPayload::ExplicitImport(d) = &mut rec.payload {
                d.target = Some(target);
            }
            Some(target)
        }
        None => {
            let already_reported = {
                let rec = factory.get_record(id);
                let rec = rec.borrow();
                matches!(&rec.payload, SymbolPayload::ExplicitImport(d) if d.missing_member_reported)
            };
            if !already_reported {
                let pkg_text = factory.resolve_atom(package_name);
                let name_text = factory.resolve_atom(imported_name);
                factory.add_error(id, DiagnosticCode::MissingImportedMember, &[&pkg_text, &name_text]);
                let rec = factory.get_record(id);
                let mut rec = rec.borrow_mut();
                if let SymbolPayload::ExplicitImport(d) = &mut rec.payload {
                    d.missing_member_reported = true;
                }
            }
            None
        }
    }
}

/// `WildcardImport.resolve(name, L)`: Direct lookup in the package;
/// on success builds (or returns the memoised) `ImplicitImport`.
pub(crate) fn wildcard_resolve<'f>(
    factory: &'f Factory,
    wildcard_id: SymbolId,
    name: &str,
    lookup_location: &Location,
    checker: &dyn SemanticChecker<ScopeRef<'f>>,
) -> Option<SymbolId> {
    let name_atom = factory.intern(name);
    let (cached, package_name) = {
        let rec = factory.get_record(wildcard_id);
        let rec = rec.borrow();
        match &rec.payload {
            SymbolPayload::WildcardImport(d) => (d.resolved.get(&name_atom).copied(), d.package_name),
            _ => return None,
        }
    };
    if let Some(implicit) = cached {
        return Some(implicit);
    }
    let package = resolve_package(factory, wildcard_id, package_name, checker)?;
    let target = factory.direct_lookup(package, name_atom, checker)?;
    let implicit = factory.alloc(SymbolRecord {
        name: name_atom,
        location: lookup_location.clone(),
        parent_scope: factory.parent(wildcard_id),
        payload: SymbolPayload::ImplicitImport(ImplicitImportData {
            target,
            wildcard: wildcard_id,
        }),
    });
    let rec = factory.get_record(wildcard_id);
    let mut rec = rec.borrow_mut();
    if let SymbolPayload::WildcardImport(d) = &mut rec.payload {
        d.resolved.insert(name_atom, implicit);
    }
    Some(implicit)
}

pub(crate) fn implicit_import_target(factory: &Factory, id: SymbolId) -> SymbolId {
    let rec = factory.get_record(id);
    let rec = rec.borrow();
    match &rec.payload {
        SymbolPayload::ImplicitImport(d) => d.target,
        _ => id,
    }
}
