//! Root, compilation unit, package, and dynamic-scope construction: the
//! handful of scope kinds that exist outside the
//! definition/instance/generate elaboration flow.

use sv_sema_checker::SemanticChecker;
use sv_sema_common::{Atom, Location};
use sv_sema_syntax::{NodeIndex, NodeList};

use crate::arena::Factory;
use crate::lookup::ScopeRef;
use crate::scope::{build_members_from_items, DynamicScopeData, MemberBuilder, ScopeData};
use crate::symbol::{SymbolId, SymbolPayload, SymbolRecord};

/// Allocate the design root. Self-parented — the only symbol that
/// is its own ancestor.
#[must_use]
pub fn create_root(factory: &Factory) -> SymbolId {
    factory.alloc_self_parented(|id| SymbolRecord {
        name: Atom::EMPTY,
        location: Location::synthetic(),
        parent_scope: id,
        payload: SymbolPayload::Root(ScopeData::default()),
    })
}

/// `Root.fill_members`: one `CompilationUnit` shell per source unit
/// the factory was constructed with. Each unit's own items are expanded
/// lazily by its own `fill_members`, not forced here — forcing them here
/// would re-enter this very scope's `Initialising` state the moment a
/// unit's `HierarchyInstantiation` looked up a sibling module by Definition
/// mode.
pub(crate) fn fill_members_root<'f>(
    factory: &'f Factory,
    id: SymbolId,
    builder: &mut MemberBuilder,
    _checker: &dyn SemanticChecker<ScopeRef<'f>>,
) {
    for &unit_syntax in factory.source_units() {
        let location = factory.location_of_syntax(unit_syntax);
        let unit_id = factory.alloc(SymbolRecord {
            name: Atom::EMPTY,
            location,
            parent_scope: id,
            payload: SymbolPayload::CompilationUnit(ScopeData::default()),
        });
        factory.set_scope_syntax(unit_id, unit_syntax);
        builder.add(factory, unit_id);
    }
}

/// `CompilationUnit.fill_members`: expand the unit's own item list.
pub(crate) fn fill_members_compilation_unit<'f>(
    factory: &'f Factory,
    id: SymbolId,
    builder: &mut MemberBuilder,
    checker: &dyn SemanticChecker<ScopeRef<'f>>,
) {
    let syntax = factory.scope_syntax_of(id);
    let items = factory.tree().get_source_unit(syntax).cloned().unwrap_or_default();
    build_members_from_items(factory, id, &items, checker, builder);
}

/// Package construction: registers the package under its name in the
/// factory-level registry immediately (not lazily), so Scoped/Definition
/// lookup never has to walk the root to find it (see `Factory::packages`).
pub(crate) fn construct_package(factory: &Factory, parent: SymbolId, syntax: NodeIndex) -> SymbolId {
    let name = factory
        .tree()
        .get_package(syntax)
        .map(|(name, _)| name.to_string())
        .unwrap_or_default();
    let name_atom = factory.intern(&name);
    let location = factory.location_of_syntax(syntax);
    let id = factory.alloc(SymbolRecord {
        name: name_atom,
        location,
        parent_scope: parent,
        payload: SymbolPayload::Package(ScopeData::default()),
    });
    factory.set_scope_syntax(id, syntax);
    factory.register_package(name_atom, id);
    id
}

/// The item list backing a `Package` symbol's `fill_members`.
pub(crate) fn package_items(factory: &Factory, id: SymbolId) -> NodeList {
    let syntax = factory.scope_syntax_of(id);
    factory
        .tree()
        .get_package(syntax)
        .map(|(_, items)| items.clone())
        .unwrap_or_default()
}

/// `DynamicScope`: a scope an embedder populates directly (no backing
/// syntax), for cases outside the declarative source (e.g. a REPL's
/// ambient bindings).
#[must_use]
pub fn create_dynamic_scope(factory: &Factory, parent: SymbolId) -> SymbolId {
    factory.alloc(SymbolRecord {
        name: Atom::EMPTY,
        location: factory.location_of(parent),
        parent_scope: parent,
        payload: SymbolPayload::DynamicScope(DynamicScopeData::default()),
    })
}

/// By design, a `DynamicScope`'s `fill_members` is a
/// no-op rebuild — it just re-installs whatever `set_members`/`set_member`
/// last recorded, rather than attempting to regenerate anything from
/// syntax (there is none).
pub(crate) fn fill_members_dynamic_scope(factory: &Factory, id: SymbolId, builder: &mut MemberBuilder) {
    let preserved = {
        let rec = factory.get_record(id);
        let rec = rec.borrow();
        match &rec.payload {
            SymbolPayload::DynamicScope(d) => d.preserved.clone(),
            _ => return,
        }
    };
    for member in preserved {
        builder.add(factory, member);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_sema_checker::{ConstantValue, StubChecker};
    use sv_sema_syntax::builder::TreeBuilder;
    use sv_sema_syntax::DataTypeKind;

    use crate::lookup::LookupMode;
    use crate::symbol::SymbolKind;

    #[test]
    fn root_creates_one_compilation_unit_per_source_file() {
        let mut b = TreeBuilder::new();
        let pkg = b.package_decl("p", vec![]);
        let unit_a = b.source_unit(vec![pkg]);
        let unit_b = b.source_unit(vec![]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit_a, unit_b]);
        let checker = StubChecker::new();
        let root_id = create_root(&factory);
        let units = factory.members(root_id, &checker);
        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|&u| factory.kind_of(u) == SymbolKind::CompilationUnit));
    }

    #[test]
    fn explicit_import_resolves_package_member() {
        let mut b = TreeBuilder::new();
        let ty = b.data_type(DataTypeKind::Int);
        let default = b.int_literal(5);
        let k = b.param_decl("K", false, ty, default);
        let pkg = b.package_decl("p", vec![k]);
        let imp = b.explicit_import("p", "K");
        let unit = b.source_unit(vec![pkg, imp]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let loc = factory.location_of(unit_id);
        let resolved = factory
            .lookup(unit_id, "K", &loc, LookupMode::Scoped, &checker)
            .expect("K resolves through explicit import");
        assert_eq!(factory.kind_of(resolved), SymbolKind::Parameter);
        assert_eq!(factory.parameter_value(resolved, &checker), ConstantValue::int(5));
    }

    #[test]
    fn wildcard_import_resolves_package_member() {
        let mut b = TreeBuilder::new();
        let ty = b.data_type(DataTypeKind::Int);
        let default = b.int_literal(9);
        let k = b.param_decl("K", false, ty, default);
        let pkg = b.package_decl("p", vec![k]);
        let wc = b.wildcard_import("p");
        let unit = b.source_unit(vec![pkg, wc]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let loc = factory.location_of(unit_id);
        let first = factory
            .lookup(unit_id, "K", &loc, LookupMode::Scoped, &checker)
            .expect("first resolve");
        let second = factory
            .lookup(unit_id, "K", &loc, LookupMode::Scoped, &checker)
            .expect("second resolve, memoised");
        assert_eq!(first, second);
        assert_eq!(factory.kind_of(first), SymbolKind::Parameter);
        assert_eq!(factory.parameter_value(first, &checker), ConstantValue::int(9));
    }

    #[test]
    fn dynamic_scope_rebuild_is_a_noop() {
        let b = TreeBuilder::new();
        let tree = b.finish();
        let factory = Factory::new(tree, vec![]);
        let checker = StubChecker::new();
        let root_id = create_root(&factory);
        let dyn_id = create_dynamic_scope(&factory, root_id);

        factory.set_member(dyn_id, root_id);
        assert_eq!(factory.members(dyn_id, &checker), vec![root_id]);

        factory.mark_dirty(dyn_id);
        assert_eq!(factory.members(dyn_id, &checker), vec![root_id]);
    }
}
