//! Definition & Instance elaboration: parameter-info extraction from
//! a module/interface/program declaration, and instantiation of
//! parameterised instance scopes from a `HierarchyInstantiationSyntax`.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use sv_sema_checker::{ConstantValue, SemanticChecker};
use sv_sema_common::{Atom, DiagnosticCode, Location};
use sv_sema_syntax::{NodeIndex, NodeList, SyntaxKind};

use crate::arena::Factory;
use crate::lazy::{LazyConstant, LazyRead, LazyType};
use crate::lookup::{LookupMode, ScopeRef};
use crate::scope::{build_members_from_items, MemberBuilder, ScopeData};
use crate::symbol::{ParameterData, SymbolId, SymbolKind, SymbolPayload, SymbolRecord};

/// One parameter slot in a definition's cached list: a port
/// parameter or a body parameter, each exactly one entry, in declaration
/// order.
#[derive(Clone, Debug)]
pub struct ParameterInfo {
    pub name: Atom,
    pub location: Location,
    pub type_syntax: NodeIndex,
    pub default: NodeIndex,
    pub is_local: bool,
    pub is_port: bool,
}

type ParamInfoList = SmallVec<[ParameterInfo; 4]>;

/// The Definition symbol's payload: raw declaration syntax plus the
/// cached `ParameterInfo` list, extracted once and reused by every
/// instantiation.
#[derive(Debug)]
pub struct DefinitionData {
    pub syntax: NodeIndex,
    params: Option<ParamInfoList>,
}

/// The Instance symbol's payload: a reference to its Definition plus
/// the assignment map (parameter name -> assigning expression syntax) that
/// this particular instantiation supplied.
#[derive(Debug)]
pub struct InstanceData {
    pub definition: SymbolId,
    pub assignments: FxHashMap<Atom, NodeIndex>,
    pub scope: ScopeData,
}

pub(crate) fn construct_definition(factory: &Factory, parent: SymbolId, syntax: NodeIndex) -> SymbolId {
    let kind = factory.tree().kind_of(syntax);
    let name = factory
        .tree()
        .get_definition(syntax)
        .map(|d| d.name.clone())
        .unwrap_or_default();
    let name_atom = factory.intern(&name);
    let location = factory.location_of_syntax(syntax);
    let data = DefinitionData { syntax, params: None };
    let payload = match kind {
        Some(SyntaxKind::InterfaceDecl) => SymbolPayload::Interface(data),
        Some(SyntaxKind::ProgramDecl) => SymbolPayload::Program(data),
        _ => SymbolPayload::Module(data),
    };
    let id = factory.alloc(SymbolRecord {
        name: name_atom,
        location,
        parent_scope: parent,
        payload,
    });
    factory.register_definition(name_atom, id);
    id
}

fn definition_syntax(factory: &Factory, id: SymbolId) -> NodeIndex {
    let rec = factory.get_record(id);
    let rec = rec.borrow();
    match &rec.payload {
        SymbolPayload::Module(d) | SymbolPayload::Interface(d) | SymbolPayload::Program(d) => d.syntax,
        _ => NodeIndex::NONE,
    }
}

#[allow(clippy::too_many_arguments)]
fn push_param_info(
    factory: &Factory,
    seen: &mut FxHashSet<Atom>,
    infos: &mut ParamInfoList,
    name: &str,
    is_local: bool,
    is_port: bool,
    type_syntax: NodeIndex,
    default: NodeIndex,
    node: NodeIndex,
) {
    let name_atom = factory.intern(name);
    if !seen.insert(name_atom) {
        // Duplicate parameter names are diagnosed against the first
        // occurrence — report at the duplicate's own location, keep only
        // the first in the list.
        factory.report(DiagnosticCode::DuplicateDefinition, factory.location_of_syntax(node), &[name]);
        return;
    }
    infos.push(ParameterInfo {
        name: name_atom,
        location: factory.location_of_syntax(node),
        type_syntax,
        default,
        is_local,
        is_port,
    });
}

/// Parameter-info extraction, cached on first call (`DefinitionData`
/// carries the cache since a Definition is never rebuilt).
///
/// The "last local" rule: within the
/// port-parameter sequence a `localparam` makes every later port parameter
/// local too, until the port list ends. Body parameters carry their own
/// `is_local` independently — the rule is scoped to the port list.
fn extract_parameter_info(factory: &Factory, id: SymbolId) -> ParamInfoList {
    {
        let rec = factory.get_record(id);
        let rec = rec.borrow();
        let cached = match &rec.payload {
            SymbolPayload::Module(d) | SymbolPayload::Interface(d) | SymbolPayload::Program(d) => d.params.clone(),
            _ => None,
        };
        if let Some(params) = cached {
            return params;
        }
    }

    let syntax = definition_syntax(factory, id);
    let (port_params, body_params) = {
        let tree = factory.tree();
        match tree.get_definition(syntax) {
            Some(def) => (def.port_params.clone(), def.body_params.clone()),
            None => (NodeList::default(), NodeList::default()),
        }
    };

    let mut seen = FxHashSet::default();
    let mut infos = ParamInfoList::new();
    let mut local_state = false;
    for &node in &port_params.nodes {
        let Some((name, is_local, ty, default)) = factory.tree().get_param_decl(node) else {
            continue;
        };
        if is_local {
            local_state = true;
        }
        let name = name.to_string();
        push_param_info(factory, &mut seen, &mut infos, &name, local_state, true, ty, default, node);
    }
    for &node in &body_params.nodes {
        let Some((name, is_local, ty, default)) = factory.tree().get_param_decl(node) else {
            continue;
        };
        let name = name.to_string();
        push_param_info(factory, &mut seen, &mut infos, &name, is_local, false, ty, default, node);
    }

    let rec = factory.get_record(id);
    let mut rec = rec.borrow_mut();
    if let SymbolPayload::Module(d) | SymbolPayload::Interface(d) | SymbolPayload::Program(d) = &mut rec.payload {
        d.params = Some(infos.clone());
    }
    infos
}

/// Instantiation: one instance symbol per `InstanceNameSyntax` entry
/// (array instantiations are modelled as a flattened element list in
/// `sv-sema-syntax`, so "one symbol per element, named per the element
/// syntax" falls out of this loop without extra handling).
pub(crate) fn elaborate_hierarchy_instantiation<'f>(
    factory: &'f Factory,
    scope_id: SymbolId,
    syntax: NodeIndex,
    checker: &dyn SemanticChecker<ScopeRef<'f>>,
) -> Vec<SymbolId> {
    let Some((def_name, assigns, instances)) = factory.tree().get_hierarchy_instantiation(syntax) else {
        return Vec::new();
    };
    let location = factory.location_of_syntax(syntax);
    let Some(def_id) = factory.lookup(scope_id, def_name, &location, LookupMode::Definition, checker) else {
        factory.report(DiagnosticCode::UndeclaredIdentifier, location, &[def_name]);
        return Vec::new();
    };

    let params = extract_parameter_info(factory, def_id);
    // Positional assignments bind to the non-local port
    // parameters in port order; local parameters are never targets of a
    // positional (or named) external assignment.
    let non_local_ports: Vec<Atom> = params
        .iter()
        .filter(|p| p.is_port && !p.is_local)
        .map(|p| p.name)
        .collect();

    let mut assignments: FxHashMap<Atom, NodeIndex> = FxHashMap::default();
    let mut positional_idx = 0usize;
    for assign in assigns {
        match &assign.name {
            Some(name) => {
                assignments.insert(factory.intern(name), assign.value);
            }
            None => {
                if let Some(&name_atom) = non_local_ports.get(positional_idx) {
                    assignments.insert(name_atom, assign.value);
                }
                positional_idx += 1;
            }
        }
    }

    let instance_kind = factory.kind_of(def_id);
    instances
        .iter()
        .map(|inst| {
            let name_atom = factory.intern(&inst.name);
            let payload = InstanceData {
                definition: def_id,
                assignments: assignments.clone(),
                scope: ScopeData::default(),
            };
            let symbol_payload = match instance_kind {
                SymbolKind::Interface => SymbolPayload::InterfaceInstance(payload),
                SymbolKind::Program => SymbolPayload::Instance(payload),
                _ => SymbolPayload::ModuleInstance(payload),
            };
            factory.alloc(SymbolRecord {
                name: name_atom,
                location: location.clone(),
                parent_scope: scope_id,
                payload: symbol_payload,
            })
        })
        .collect()
}

/// `InstanceSymbol.fill_members`: one Parameter symbol per definition
/// entry, seeded from the assignment map (falling back to the default,
/// then to "missing"), followed by the definition's non-parameter members
/// cloned as children of the instance so their lazy cells resolve against
/// it rather than the definition.
pub(crate) fn fill_members_instance<'f>(
    factory: &'f Factory,
    id: SymbolId,
    builder: &mut MemberBuilder,
    checker: &dyn SemanticChecker<ScopeRef<'f>>,
) {
    let (definition, assignments) = {
        let rec = factory.get_record(id);
        let rec = rec.borrow();
        match &rec.payload {
            SymbolPayload::ModuleInstance(d) | SymbolPayload::InterfaceInstance(d) | SymbolPayload::Instance(d) => {
                (d.definition, d.assignments.clone())
            }
            _ => return,
        }
    };

    let params = extract_parameter_info(factory, definition);
    for info in &params {
        let assigned = assignments.get(&info.name).copied();
        let (value_syntax, overriding_local) = match assigned {
            Some(_) if info.is_local => {
                let name_text = factory.resolve_atom(info.name);
                factory.add_error(id, DiagnosticCode::ParamOverrideOfLocal, &[&name_text]);
                (info.default, true)
            }
            Some(value_syntax) => (value_syntax, false),
            None => (info.default, false),
        };
        let missing = value_syntax.is_none() && !info.is_local && !overriding_local;

        let value_cell = if missing {
            let name_text = factory.resolve_atom(info.name);
            factory.report(DiagnosticCode::MissingRequiredParameter, info.location.clone(), &[&name_text]);
            LazyConstant::resolved(ConstantValue::bad())
        } else if value_syntax.is_some() {
            LazyConstant::unresolved(value_syntax)
        } else {
            LazyConstant::empty()
        };
        let type_cell = if info.type_syntax.is_some() {
            LazyType::unresolved(info.type_syntax)
        } else {
            LazyType::empty()
        };

        let param_id = factory.alloc(SymbolRecord {
            name: info.name,
            location: info.location.clone(),
            parent_scope: id,
            payload: SymbolPayload::Parameter(ParameterData {
                is_local_param: info.is_local,
                is_port_param: info.is_port,
                owning_scope: id,
                type_cell,
                value_cell,
                missing_reported: missing,
            }),
        });
        builder.add(factory, param_id);
    }

    let items = {
        let syntax = definition_syntax(factory, definition);
        factory
            .tree()
            .get_definition(syntax)
            .map(|d| d.items.clone())
            .unwrap_or_default()
    };
    build_members_from_items(factory, id, &items, checker, builder);
}

impl Factory {
    /// Read (and cache) a parameter's constant value, evaluated
    /// lazily against its owning scope — the instance scope for a module
    /// parameter, the declaring scope for a free-standing one, never the
    /// definition scope.
    pub fn parameter_value<'f>(&'f self, id: SymbolId, checker: &dyn SemanticChecker<ScopeRef<'f>>) -> ConstantValue {
        let owning_scope = {
            let rec = self.get_record(id);
            let rec = rec.borrow();
            match &rec.payload {
                SymbolPayload::Parameter(p) => p.owning_scope,
                _ => return ConstantValue::bad(),
            }
        };
        let (read, was_resolving) = {
            let rec = self.get_record(id);
            let mut rec = rec.borrow_mut();
            match &mut rec.payload {
                SymbolPayload::Parameter(p) => {
                    let was_resolving = p.value_cell.is_resolving();
                    (p.value_cell.begin(), was_resolving)
                }
                _ => return ConstantValue::bad(),
            }
        };
        if was_resolving {
            let name_text = self.resolve_atom(self.name_of(id));
            self.add_error(id, DiagnosticCode::CyclicDependency, &[&name_text]);
        }
        match read {
            LazyRead::Ready(v) => v,
            LazyRead::NeedsEval(syntax) => {
                let target_type = self.parameter_type(id, checker);
                let err_loc = self.location_of(id);
                let value = self.evaluate_constant_and_convert(owning_scope, syntax, target_type, err_loc, checker);
                let rec = self.get_record(id);
                let mut rec = rec.borrow_mut();
                if let SymbolPayload::Parameter(p) = &mut rec.payload {
                    p.value_cell.finish(value);
                }
                value
            }
        }
    }

    /// Companion to [`Factory::parameter_value`] for the type cell.
    pub fn parameter_type<'f>(
        &'f self,
        id: SymbolId,
        checker: &dyn SemanticChecker<ScopeRef<'f>>,
    ) -> sv_sema_checker::TypeSymbol {
        let owning_scope = {
            let rec = self.get_record(id);
            let rec = rec.borrow();
            match &rec.payload {
                SymbolPayload::Parameter(p) => p.owning_scope,
                _ => return sv_sema_checker::TypeSymbol::bad(),
            }
        };
        let (read, was_resolving) = {
            let rec = self.get_record(id);
            let mut rec = rec.borrow_mut();
            match &mut rec.payload {
                SymbolPayload::Parameter(p) => {
                    let was_resolving = p.type_cell.is_resolving();
                    (p.type_cell.begin(), was_resolving)
                }
                _ => return sv_sema_checker::TypeSymbol::bad(),
            }
        };
        if was_resolving {
            let name_text = self.resolve_atom(self.name_of(id));
            self.add_error(id, DiagnosticCode::CyclicDependency, &[&name_text]);
        }
        match read {
            LazyRead::Ready(v) => v,
            LazyRead::NeedsEval(syntax) => {
                let scope_ref = ScopeRef::new(self, owning_scope, checker);
                let ty = checker.bind_type(&scope_ref, self.tree(), syntax);
                let rec = self.get_record(id);
                let mut rec = rec.borrow_mut();
                if let SymbolPayload::Parameter(p) = &mut rec.payload {
                    p.type_cell.finish(ty);
                }
                ty
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_sema_checker::StubChecker;
    use sv_sema_syntax::builder::TreeBuilder;
    use sv_sema_syntax::{InstanceNameSyntax, ParamAssignSyntax};

    use crate::root;

    fn one_param_module(b: &mut TreeBuilder, default: i64) -> NodeIndex {
        let ty = b.data_type(sv_sema_syntax::DataTypeKind::Int);
        let default_node = b.int_literal(default);
        let p = b.param_decl("P", false, ty, default_node);
        b.module_decl("m", vec![p], vec![], vec![])
    }

    #[test]
    fn scenario_1_default_parameter() {
        let mut b = TreeBuilder::new();
        let module = one_param_module(&mut b, 3);
        let inst = b.hierarchy_instantiation("m", vec![], vec![InstanceNameSyntax { name: "u".into() }]);
        let unit = b.source_unit(vec![module, inst]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let instance_id = factory.member(unit_id, 1, &checker).expect("instance");
        assert_eq!(factory.kind_of(instance_id), SymbolKind::ModuleInstance);
        let param_id = factory.member(instance_id, 0, &checker).expect("parameter");
        assert_eq!(factory.kind_of(param_id), SymbolKind::Parameter);
        assert_eq!(factory.parameter_value(param_id, &checker), ConstantValue::int(3));
    }

    #[test]
    fn scenario_2_parameter_override() {
        let mut b = TreeBuilder::new();
        let module = one_param_module(&mut b, 3);
        let value = b.int_literal(7);
        let inst = b.hierarchy_instantiation(
            "m",
            vec![ParamAssignSyntax {
                name: Some("P".into()),
                value,
            }],
            vec![InstanceNameSyntax { name: "u".into() }],
        );
        let unit = b.source_unit(vec![module, inst]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let instance_id = factory.member(unit_id, 1, &checker).expect("instance");
        let param_id = factory.member(instance_id, 0, &checker).expect("parameter");
        assert_eq!(factory.parameter_value(param_id, &checker), ConstantValue::int(7));
        assert!(!factory.diagnostics().borrow().iter().any(|d| d.code == DiagnosticCode::MissingRequiredParameter));
    }

    #[test]
    fn missing_required_parameter_is_reported_once() {
        let mut b = TreeBuilder::new();
        let ty = b.data_type(sv_sema_syntax::DataTypeKind::Int);
        let p = b.param_decl("P", false, ty, NodeIndex::NONE);
        let module = b.module_decl("m", vec![p], vec![], vec![]);
        let inst = b.hierarchy_instantiation("m", vec![], vec![InstanceNameSyntax { name: "u".into() }]);
        let unit = b.source_unit(vec![module, inst]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let instance_id = factory.member(unit_id, 1, &checker).expect("instance");
        let param_id = factory.member(instance_id, 0, &checker).expect("parameter");
        assert!(factory.parameter_value(param_id, &checker).is_bad());
        // A second read must not re-report.
        let _ = factory.parameter_value(param_id, &checker);
        let count = factory
            .diagnostics()
            .borrow()
            .iter()
            .filter(|d| d.code == DiagnosticCode::MissingRequiredParameter)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn three_parameter_cycle_is_reported_once_and_leaves_bad_sentinels() {
        let mut b = TreeBuilder::new();
        let ty_a = b.data_type(sv_sema_syntax::DataTypeKind::Int);
        let ty_b = b.data_type(sv_sema_syntax::DataTypeKind::Int);
        let ty_c = b.data_type(sv_sema_syntax::DataTypeKind::Int);
        let default_a = b.identifier("B");
        let default_b = b.identifier("C");
        let default_c = b.identifier("A");
        let p_a = b.param_decl("A", false, ty_a, default_a);
        let p_b = b.param_decl("B", false, ty_b, default_b);
        let p_c = b.param_decl("C", false, ty_c, default_c);
        let module = b.module_decl("m", vec![p_a, p_b, p_c], vec![], vec![]);
        let inst = b.hierarchy_instantiation("m", vec![], vec![InstanceNameSyntax { name: "u".into() }]);
        let unit = b.source_unit(vec![module, inst]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let instance_id = factory.member(unit_id, 1, &checker).expect("instance");
        let a_id = factory.member(instance_id, 0, &checker).expect("A");
        let b_id = factory.member(instance_id, 1, &checker).expect("B");
        let c_id = factory.member(instance_id, 2, &checker).expect("C");

        assert!(factory.parameter_value(a_id, &checker).is_bad());
        assert!(factory.parameter_value(b_id, &checker).is_bad());
        assert!(factory.parameter_value(c_id, &checker).is_bad());

        let count = factory
            .diagnostics()
            .borrow()
            .iter()
            .filter(|d| d.code == DiagnosticCode::CyclicDependency)
            .count();
        assert_eq!(count, 1);
    }
}
