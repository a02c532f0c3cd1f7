//! Free-standing parameter declarations (`build_members_from_items`
//! `ParamDecl` case): a `parameter`/`localparam` that appears directly in a
//! scope's item list — a package, a compilation unit, a generate block, a
//! function body — rather than in a module/interface/program's parameter
//! port list.
//!
//! These never go through instance elaboration: there is no assignment map
//! to consult, so the parameter's type and value cells evaluate against the
//! scope that declares it, not an instance scope (contrast
//! `ParameterData::owning_scope`, which for a module's parameters is always
//! the instance).

use sv_sema_syntax::NodeIndex;

use crate::arena::Factory;
use crate::lazy::{LazyConstant, LazyType};
use crate::symbol::{ParameterData, SymbolId, SymbolPayload, SymbolRecord};

pub(crate) fn construct_local_parameter(factory: &Factory, parent: SymbolId, syntax: NodeIndex) -> SymbolId {
    let (name, is_local, data_type, default_value) = factory
        .tree()
        .get_param_decl(syntax)
        .map(|(name, is_local, ty, default)| (name.to_string(), is_local, ty, default))
        .unwrap_or_default();
    let name_atom = factory.intern(&name);
    let location = factory.location_of_syntax(syntax);

    let type_cell = if data_type.is_some() {
        LazyType::unresolved(data_type)
    } else {
        LazyType::empty()
    };
    let value_cell = if default_value.is_some() {
        LazyConstant::unresolved(default_value)
    } else {
        LazyConstant::empty()
    };

    factory.alloc(SymbolRecord {
        name: name_atom,
        location,
        parent_scope: parent,
        payload: SymbolPayload::Parameter(ParameterData {
            // A free-standing parameter is never port-overridable: there is
            // no instantiation that assigns it, so treat it the same as a
            // local parameter for override purposes, regardless of whether
            // the declaration used `parameter` or `localparam`.
            is_local_param: is_local,
            is_port_param: false,
            owning_scope: parent,
            type_cell,
            value_cell,
            missing_reported: false,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_sema_checker::StubChecker;
    use sv_sema_syntax::builder::TreeBuilder;

    use crate::root;

    #[test]
    fn local_parameter_resolves_against_its_own_scope() {
        let mut b = TreeBuilder::new();
        let ty = b.data_type(sv_sema_syntax::DataTypeKind::Int);
        let default = b.int_literal(10);
        let p = b.param_decl("K", false, ty, default);
        let pkg = b.package_decl("p", vec![p]);
        let unit = b.source_unit(vec![pkg]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);

        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let pkg_id = factory.member(unit_id, 0, &checker).expect("package");
        let param_id = factory.member(pkg_id, 0, &checker).expect("parameter");
        assert_eq!(factory.parameter_value(param_id, &checker), sv_sema_checker::ConstantValue::int(10));
    }
}
