//! Generate elaboration: if-generate, loop-generate, and the
//! `GenerateBlock` scope they each install one or more of as children.
//!
//! Both constructs evaluate their controlling expression(s) against the
//! *parent* scope — the scope the `IfGenerate`/`LoopGenerate` symbol itself
//! is a child of — never against their own (still-empty) scope, since the
//! implicit loop-index parameter a `LoopGenerate` binds is only visible
//! inside the generated blocks, not to the loop's own condition/step
//! — the "last local" rule is unrelated, but the same left-to-right,
//! outer-scope-first discipline applies here.

use sv_sema_checker::{ConstantValue, SemanticChecker, TypeKind, TypeSymbol};
use sv_sema_common::{Atom, DiagnosticCode};
use sv_sema_syntax::{NodeIndex, NodeList};

use crate::arena::Factory;
use crate::lazy::{LazyConstant, LazyType};
use crate::lookup::ScopeRef;
use crate::scope::{build_members_from_items, scope_data_mut, MemberBuilder, ScopeData, ScopeState};
use crate::symbol::{GenvarData, ParameterData, SymbolId, SymbolPayload, SymbolRecord};

/// Tunable bounds for elaboration: centralised here rather than threaded
/// as bare constants, following `sv-sema-common::limits`'s "centralize
/// tunables" convention but scoped to the one embedder-overridable knob
/// elaboration actually needs.
#[derive(Clone, Copy, Debug)]
pub struct ElaborationOptions {
    /// Maximum number of iterations a `LoopGenerate` may expand before
    /// `GenerateLoopTooManyIterations` is reported and expansion stops.
    pub max_generate_iterations: usize,
}

impl Default for ElaborationOptions {
    fn default() -> Self {
        Self {
            max_generate_iterations: sv_sema_common::limits::MAX_GENERATE_ITERATIONS,
        }
    }
}

/// The `IfGenerate` symbol's payload. A scope containing at most one
/// `GenerateBlock` child, chosen by evaluating `condition` in
/// `parent_scope`.
#[derive(Debug)]
pub struct IfGenerateData {
    pub syntax: NodeIndex,
    pub parent_scope: SymbolId,
    pub scope: ScopeData,
}

/// The `LoopGenerate` symbol's payload. A scope containing one
/// `GenerateBlock` per iteration, each carrying the implicit loop-index
/// parameter for that iteration's value.
#[derive(Debug)]
pub struct LoopGenerateData {
    pub syntax: NodeIndex,
    pub parent_scope: SymbolId,
    pub scope: ScopeData,
}

/// The implicit per-iteration parameter a `LoopGenerate` injects into each
/// `GenerateBlock` it produces.
#[derive(Clone, Copy, Debug)]
pub struct ImplicitGenerateParam {
    pub name: Atom,
    pub value: ConstantValue,
}

/// The `GenerateBlock` symbol's payload — a scope whose `fill_members`
/// expands a single body node, optionally seeded with an implicit
/// loop-index parameter.
#[derive(Debug)]
pub struct GenerateBlockData {
    pub body: NodeIndex,
    pub implicit_param: Option<ImplicitGenerateParam>,
    pub scope: ScopeData,
}

pub(crate) fn construct_if_generate(factory: &Factory, parent: SymbolId, syntax: NodeIndex) -> SymbolId {
    let location = factory.location_of_syntax(syntax);
    factory.alloc(SymbolRecord {
        name: Atom::EMPTY,
        location,
        parent_scope: parent,
        payload: SymbolPayload::IfGenerate(IfGenerateData {
            syntax,
            parent_scope: parent,
            scope: ScopeData::default(),
        }),
    })
}

pub(crate) fn construct_loop_generate(factory: &Factory, parent: SymbolId, syntax: NodeIndex) -> SymbolId {
    let location = factory.location_of_syntax(syntax);
    factory.alloc(SymbolRecord {
        name: Atom::EMPTY,
        location,
        parent_scope: parent,
        payload: SymbolPayload::LoopGenerate(LoopGenerateData {
            syntax,
            parent_scope: parent,
            scope: ScopeData::default(),
        }),
    })
}

/// Build the one `GenerateBlock` child an `IfGenerate`/`LoopGenerate`
/// installs for a given body syntax node. The name is the block's own
/// label if `body` is itself a labelled generate block (`begin: g ...
/// end`); an unlabelled single-item body (a bare statement, no `begin`) is
/// anonymous. `array_index`, when present (loop-generate only), is
/// appended as `name[index]` (e.g. `b[0]`, `b[1]`, `b[2]`).
fn construct_generate_block(
    factory: &Factory,
    parent: SymbolId,
    body: NodeIndex,
    array_index: Option<i64>,
    implicit_param: Option<ImplicitGenerateParam>,
) -> SymbolId {
    let base_label = factory
        .tree()
        .get_generate_block(body)
        .map(|(label, _)| label.to_string())
        .unwrap_or_default();
    let name = match array_index {
        Some(i) if !base_label.is_empty() => format!("{base_label}[{i}]"),
        _ => base_label,
    };
    let name_atom = factory.intern(&name);
    let location = factory.location_of_syntax(body);
    factory.alloc(SymbolRecord {
        name: name_atom,
        location,
        parent_scope: parent,
        payload: SymbolPayload::GenerateBlock(GenerateBlockData {
            body,
            implicit_param,
            scope: ScopeData::default(),
        }),
    })
}

/// `IfGenerate::fill_members`: evaluate `condition` in the parent
/// scope, install the chosen branch's `GenerateBlock` (if any) as this
/// symbol's sole member.
pub(crate) fn fill_members_if_generate<'f>(
    factory: &'f Factory,
    id: SymbolId,
    builder: &mut MemberBuilder,
    checker: &dyn SemanticChecker<ScopeRef<'f>>,
) {
    let (syntax, parent_scope) = {
        let rec = factory.get_record(id);
        let rec = rec.borrow();
        match &rec.payload {
            SymbolPayload::IfGenerate(d) => (d.syntax, d.parent_scope),
            _ => return,
        }
    };
    let Some((condition, then_block, else_block)) = factory.tree().get_if_generate(syntax) else {
        return;
    };
    let value = factory.evaluate_constant(parent_scope, condition, checker);
    let chosen = if value.is_truthy() { then_block } else { else_block };
    if chosen.is_none() {
        return;
    }
    let block_id = construct_generate_block(factory, id, chosen, None, None);
    builder.add(factory, block_id);
}

/// Build a throwaway scope holding just `genvar_name` bound to `value`,
/// parented to `parent_scope` so every other identifier falls through to the
/// loop's surrounding scope via the ordinary parent walk. Seeded already
/// `Initialised` — never routed through `ensure_init`/`do_init` — since a
/// `LoopGenerate`'s own scope is still `Initialising` while its condition and
/// step are evaluated, and this scope must not be confused with that one.
fn bind_genvar(factory: &Factory, parent_scope: SymbolId, genvar_name: Atom, value: ConstantValue) -> SymbolId {
    let location = factory.location_of(parent_scope);
    let scope_id = factory.alloc(SymbolRecord {
        name: Atom::EMPTY,
        location: location.clone(),
        parent_scope,
        payload: SymbolPayload::SequentialBlock(ScopeData::default()),
    });
    let genvar_id = factory.alloc(SymbolRecord {
        name: genvar_name,
        location,
        parent_scope: scope_id,
        payload: SymbolPayload::Genvar(GenvarData { value }),
    });
    let rec = factory.get_record(scope_id);
    let mut rec = rec.borrow_mut();
    if let Some(s) = scope_data_mut(&mut rec.payload) {
        s.member_list.push(genvar_id);
        s.member_map.insert(genvar_name, genvar_id);
        s.state = ScopeState::Initialised;
    }
    scope_id
}

fn eval_with_genvar<'f>(
    factory: &'f Factory,
    parent_scope: SymbolId,
    checker: &dyn SemanticChecker<ScopeRef<'f>>,
    genvar_name: Atom,
    genvar_value: ConstantValue,
    syntax: NodeIndex,
) -> ConstantValue {
    let scope_id = bind_genvar(factory, parent_scope, genvar_name, genvar_value);
    factory.evaluate_constant(scope_id, syntax, checker)
}

/// Static non-termination check:
/// a loop-generate whose condition never mentions the iterator can never
/// become false by iterating it, so it is flagged before any expansion
/// rather than run until the (separate) iteration-count bound kicks in.
fn expr_references_name(tree: &sv_sema_syntax::SyntaxTree, idx: NodeIndex, name: &str) -> bool {
    use sv_sema_syntax::SyntaxNodeData;
    match tree.get(idx).map(|n| &n.data) {
        Some(SyntaxNodeData::Identifier { name: n }) => n == name,
        Some(SyntaxNodeData::BinaryExpr { lhs, rhs, .. }) => {
            expr_references_name(tree, *lhs, name) || expr_references_name(tree, *rhs, name)
        }
        _ => false,
    }
}

/// `LoopGenerate::fill_members`: bind the iteration variable, evaluate
/// init/condition/step as constants against the parent scope, expanding one
/// `GenerateBlock` per iteration until the condition is false, the
/// iteration bound is hit, or the loop is flagged non-terminating.
pub(crate) fn fill_members_loop_generate<'f>(
    factory: &'f Factory,
    id: SymbolId,
    builder: &mut MemberBuilder,
    checker: &dyn SemanticChecker<ScopeRef<'f>>,
) {
    let (syntax, parent_scope) = {
        let rec = factory.get_record(id);
        let rec = rec.borrow();
        match &rec.payload {
            SymbolPayload::LoopGenerate(d) => (d.syntax, d.parent_scope),
            _ => return,
        }
    };
    let Some((genvar_name, init_value, condition, step, body)) = factory.tree().get_loop_generate(syntax) else {
        return;
    };
    let genvar_atom = factory.intern(genvar_name);
    let location = factory.location_of_syntax(syntax);

    if !expr_references_name(factory.tree(), condition, genvar_name) {
        factory.report(DiagnosticCode::GenerateLoopNonTerminating, location, &[genvar_name]);
        return;
    }

    let mut iter_value = factory.evaluate_constant(parent_scope, init_value, checker);
    if iter_value.is_bad() {
        return;
    }

    let max_iterations = factory.options().max_generate_iterations;
    let mut index: i64 = 0;
    loop {
        let index_usize = usize::try_from(index).unwrap_or(usize::MAX);
        if index_usize >= max_iterations {
            let bound_text = max_iterations.to_string();
            factory.report(
                DiagnosticCode::GenerateLoopTooManyIterations,
                factory.location_of_syntax(syntax),
                &[&bound_text],
            );
            break;
        }

        let still_true = eval_with_genvar(factory, parent_scope, checker, genvar_atom, iter_value, condition);
        if !still_true.is_truthy() {
            break;
        }

        let param = ImplicitGenerateParam {
            name: genvar_atom,
            value: iter_value,
        };
        let block_id = construct_generate_block(factory, id, body, Some(index), Some(param));
        builder.add(factory, block_id);

        iter_value = eval_with_genvar(factory, parent_scope, checker, genvar_atom, iter_value, step);
        if iter_value.is_bad() {
            break;
        }
        index += 1;
    }
}

/// `GenerateBlock::fill_members`: expand the single body node (a
/// labelled block of items, or a lone item) and inject the implicit
/// loop-index parameter, if this block was produced by a `LoopGenerate`.
pub(crate) fn fill_members_generate_block<'f>(
    factory: &'f Factory,
    id: SymbolId,
    builder: &mut MemberBuilder,
    checker: &dyn SemanticChecker<ScopeRef<'f>>,
) {
    let (body, implicit_param) = {
        let rec = factory.get_record(id);
        let rec = rec.borrow();
        match &rec.payload {
            SymbolPayload::GenerateBlock(d) => (d.body, d.implicit_param),
            _ => return,
        }
    };

    if let Some(param) = implicit_param {
        let param_id = factory.alloc(SymbolRecord {
            name: param.name,
            location: factory.location_of(id),
            parent_scope: id,
            payload: SymbolPayload::Parameter(ParameterData {
                is_local_param: true,
                is_port_param: false,
                owning_scope: id,
                type_cell: LazyType::resolved(TypeSymbol::new(TypeKind::Int, 32)),
                value_cell: LazyConstant::resolved(param.value),
                missing_reported: false,
            }),
        });
        builder.add(factory, param_id);
    }

    if body.is_none() {
        return;
    }
    match factory.tree().get_generate_block(body) {
        Some((_, items)) => build_members_from_items(factory, id, items, checker, builder),
        None => {
            let single = NodeList::new(vec![body]);
            build_members_from_items(factory, id, &single, checker, builder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_sema_checker::StubChecker;
    use sv_sema_syntax::{BinaryOp, DataTypeKind};
    use sv_sema_syntax::builder::TreeBuilder;

    use crate::root;
    use crate::symbol::SymbolKind;

    #[test]
    fn scenario_5_if_generate_picks_then_branch() {
        let mut b = TreeBuilder::new();
        let ty = b.data_type(DataTypeKind::Int);
        let one = b.int_literal(1);
        let two = b.int_literal(2);
        let r1 = b.param_decl("R", false, ty, one);
        let then_block = b.generate_block("g", vec![r1]);
        let r2 = b.param_decl("R", false, ty, two);
        let else_block = b.generate_block("g", vec![r2]);
        let cond = b.int_literal(1);
        let if_gen = b.if_generate(cond, then_block, else_block);
        let module = b.module_decl("m", vec![], vec![], vec![if_gen]);
        let inst = b.hierarchy_instantiation(
            "m",
            vec![],
            vec![sv_sema_syntax::InstanceNameSyntax { name: "u".into() }],
        );
        let unit = b.source_unit(vec![module, inst]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let instance_id = factory.member(unit_id, 1, &checker).expect("instance");

        let members = factory.members(instance_id, &checker);
        let if_gen_ids: Vec<_> = members
            .iter()
            .copied()
            .filter(|&m| factory.kind_of(m) == SymbolKind::IfGenerate)
            .collect();
        assert_eq!(if_gen_ids.len(), 1);
        let blocks = factory.members(if_gen_ids[0], &checker);
        assert_eq!(blocks.len(), 1);
        assert_eq!(factory.kind_of(blocks[0]), SymbolKind::GenerateBlock);
        assert_eq!(factory.resolve_atom(factory.name_of(blocks[0])), "g");
        let r_param = factory.member(blocks[0], 0, &checker).expect("R");
        assert_eq!(factory.parameter_value(r_param, &checker), ConstantValue::int(1));
    }

    #[test]
    fn scenario_6_loop_generate_expands_three_blocks() {
        let mut b = TreeBuilder::new();
        let ty = b.data_type(DataTypeKind::Int);
        let i_ref = b.identifier("i");
        let x = b.param_decl("X", false, ty, i_ref);
        let body = b.generate_block("b", vec![x]);

        let init = b.int_literal(0);
        let i_lhs = b.identifier("i");
        let three = b.int_literal(3);
        let cond = b.binary_expr(BinaryOp::Lt, i_lhs, three);
        let i_rhs = b.identifier("i");
        let one = b.int_literal(1);
        let step = b.binary_expr(BinaryOp::Add, i_rhs, one);
        let loop_gen = b.loop_generate("i", init, cond, step, body);

        let module = b.module_decl("m", vec![], vec![], vec![loop_gen]);
        let inst = b.hierarchy_instantiation(
            "m",
            vec![],
            vec![sv_sema_syntax::InstanceNameSyntax { name: "u".into() }],
        );
        let unit = b.source_unit(vec![module, inst]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let instance_id = factory.member(unit_id, 1, &checker).expect("instance");

        let members = factory.members(instance_id, &checker);
        let loop_id = members
            .iter()
            .copied()
            .find(|&m| factory.kind_of(m) == SymbolKind::LoopGenerate)
            .expect("loop generate");

        let blocks = factory.members(loop_id, &checker);
        assert_eq!(blocks.len(), 3);
        for (idx, &block) in blocks.iter().enumerate() {
            assert_eq!(factory.resolve_atom(factory.name_of(block)), format!("b[{idx}]"));
            let block_members = factory.members(block, &checker);
            let i_param = block_members
                .iter()
                .copied()
                .find(|&m| factory.resolve_atom(factory.name_of(m)) == "i")
                .expect("implicit i parameter");
            assert_eq!(factory.parameter_value(i_param, &checker), ConstantValue::int(idx as i64));
            let x_param = block_members
                .iter()
                .copied()
                .find(|&m| factory.resolve_atom(factory.name_of(m)) == "X")
                .expect("X parameter");
            assert_eq!(factory.parameter_value(x_param, &checker), ConstantValue::int(idx as i64));
        }
    }

    #[test]
    fn non_terminating_condition_is_diagnosed_and_does_not_expand() {
        let mut b = TreeBuilder::new();
        let init = b.int_literal(0);
        let always_true = b.int_literal(1);
        let step = b.identifier("i");
        let body = b.generate_block("b", vec![]);
        let loop_gen = b.loop_generate("i", init, always_true, step, body);
        let module = b.module_decl("m", vec![], vec![], vec![loop_gen]);
        let inst = b.hierarchy_instantiation(
            "m",
            vec![],
            vec![sv_sema_syntax::InstanceNameSyntax { name: "u".into() }],
        );
        let unit = b.source_unit(vec![module, inst]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let instance_id = factory.member(unit_id, 1, &checker).expect("instance");
        let members = factory.members(instance_id, &checker);
        let loop_id = members
            .iter()
            .copied()
            .find(|&m| factory.kind_of(m) == SymbolKind::LoopGenerate)
            .expect("loop generate");
        assert!(factory.members(loop_id, &checker).is_empty());
        assert!(factory
            .diagnostics()
            .borrow()
            .iter()
            .any(|d| d.code == DiagnosticCode::GenerateLoopNonTerminating));
    }

    #[test]
    fn iteration_bound_stops_expansion_and_is_diagnosed_once() {
        let mut b = TreeBuilder::new();
        let init = b.int_literal(0);
        let i_lhs = b.identifier("i");
        let huge = b.int_literal(1000);
        let cond = b.binary_expr(BinaryOp::Lt, i_lhs, huge);
        let i_rhs = b.identifier("i");
        let one = b.int_literal(1);
        let step = b.binary_expr(BinaryOp::Add, i_rhs, one);
        let body = b.generate_block("b", vec![]);
        let loop_gen = b.loop_generate("i", init, cond, step, body);
        let module = b.module_decl("m", vec![], vec![], vec![loop_gen]);
        let inst = b.hierarchy_instantiation(
            "m",
            vec![],
            vec![sv_sema_syntax::InstanceNameSyntax { name: "u".into() }],
        );
        let unit = b.source_unit(vec![module, inst]);
        let tree = b.finish();

        let options = ElaborationOptions {
            max_generate_iterations: 5,
        };
        let factory = Factory::with_options(tree, vec![unit], options);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let instance_id = factory.member(unit_id, 1, &checker).expect("instance");
        let members = factory.members(instance_id, &checker);
        let loop_id = members
            .iter()
            .copied()
            .find(|&m| factory.kind_of(m) == SymbolKind::LoopGenerate)
            .expect("loop generate");
        assert_eq!(factory.members(loop_id, &checker).len(), 5);
        let count = factory
            .diagnostics()
            .borrow()
            .iter()
            .filter(|d| d.code == DiagnosticCode::GenerateLoopTooManyIterations)
            .count();
        assert_eq!(count, 1);
    }
}
