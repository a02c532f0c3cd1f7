//! Scope: the lazily-built member map/list/wildcard-import sideband,
//! its init/dirty lifecycle, and `MemberBuilder`.

use rustc_hash::FxHashMap;
use sv_sema_checker::{ConstantValue, SemanticChecker, StatementList, TypeSymbol};
use sv_sema_common::{Atom, DiagnosticCode, Location};
use sv_sema_syntax::{NodeIndex, NodeList, SyntaxKind, SyntaxNodeData};
use tracing::{span, Level};

use crate::arena::Factory;
use crate::definition::construct_local_parameter;
use crate::generate::fill_members_generate_block;
use crate::imports::{construct_explicit_import, construct_wildcard_import};
use crate::instance::{elaborate_hierarchy_instantiation, fill_members_instance};
use crate::lazy::{LazyInitializer, LazyRead, LazyStatementList, LazyType};
use crate::lookup::ScopeRef;
use crate::symbol::{SubroutineData, SymbolId, SymbolKind, SymbolPayload, SymbolRecord, VariableData};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScopeState {
    #[default]
    Uninitialised,
    Initialising,
    Initialised,
}

/// The scope capability's lazily built data: `member_map` keys are
/// unique and, on a name collision, hold the *last*-declared symbol —
/// the builder process only ever keeps one symbol live per name in the
/// stored map.
#[derive(Debug, Default)]
pub struct ScopeData {
    pub member_map: FxHashMap<Atom, SymbolId>,
    pub member_list: Vec<SymbolId>,
    pub wildcard_imports: Vec<SymbolId>,
    pub state: ScopeState,
}

/// A `DynamicScope`'s members are held in an explicit list rather than
/// derived from syntax; `fill_members` just re-installs whatever was
/// present before the last dirty mark.
#[derive(Debug, Default)]
pub struct DynamicScopeData {
    pub scope: ScopeData,
    pub preserved: Vec<SymbolId>,
}

/// Scratch builder passed to a kind's `fill_members` implementation.
/// Collision handling mirrors `ScopeData.member_map`: later entries replace
/// earlier ones in the map, both stay in `member_list`, and a collision is
/// diagnosed once.
#[derive(Debug, Default)]
pub struct MemberBuilder {
    pub member_list: Vec<SymbolId>,
    pub member_map: FxHashMap<Atom, SymbolId>,
    pub wildcard_imports: Vec<SymbolId>,
}

impl MemberBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, factory: &Factory, id: SymbolId) {
        self.member_list.push(id);
        let rec = factory.get_record(id);
        let (kind, name) = {
            let rec = rec.borrow();
            (rec.kind(), rec.name)
        };
        if kind == SymbolKind::WildcardImport {
            self.wildcard_imports.push(id);
            return;
        }
        if name == Atom::EMPTY {
            return;
        }
        if self.member_map.contains_key(&name) {
            let text = factory.resolve_atom(name);
            factory.add_error(id, DiagnosticCode::DuplicateDefinition, &[&text]);
        }
        self.member_map.insert(name, id);
    }
}

pub(crate) fn scope_data(payload: &SymbolPayload) -> Option<&ScopeData> {
    match payload {
        SymbolPayload::Root(s)
        | SymbolPayload::CompilationUnit(s)
        | SymbolPayload::Package(s)
        | SymbolPayload::ProceduralBlock(s)
        | SymbolPayload::SequentialBlock(s) => Some(s),
        SymbolPayload::DynamicScope(d) => Some(&d.scope),
        SymbolPayload::ModuleInstance(i) | SymbolPayload::InterfaceInstance(i) | SymbolPayload::Instance(i) => {
            Some(&i.scope)
        }
        SymbolPayload::IfGenerate(g) => Some(&g.scope),
        SymbolPayload::LoopGenerate(g) => Some(&g.scope),
        SymbolPayload::GenerateBlock(g) => Some(&g.scope),
        _ => None,
    }
}

pub(crate) fn scope_data_mut(payload: &mut SymbolPayload) -> Option<&mut ScopeData> {
    match payload {
        SymbolPayload::Root(s)
        | SymbolPayload::CompilationUnit(s)
        | SymbolPayload::Package(s)
        | SymbolPayload::ProceduralBlock(s)
        | SymbolPayload::SequentialBlock(s) => Some(s),
        SymbolPayload::DynamicScope(d) => Some(&mut d.scope),
        SymbolPayload::ModuleInstance(i) | SymbolPayload::InterfaceInstance(i) | SymbolPayload::Instance(i) => {
            Some(&mut i.scope)
        }
        SymbolPayload::IfGenerate(g) => Some(&mut g.scope),
        SymbolPayload::LoopGenerate(g) => Some(&mut g.scope),
        SymbolPayload::GenerateBlock(g) => Some(&mut g.scope),
        _ => None,
    }
}

/// Walk `items`, constructing and enrolling a child symbol for every syntax
/// kind the core understands. Shared by every scope kind whose members are
/// a flat declaration list (compilation unit, package, instance body,
/// generate block).
pub(crate) fn build_members_from_items<'f>(
    factory: &'f Factory,
    scope_id: SymbolId,
    items: &NodeList,
    checker: &dyn SemanticChecker<ScopeRef<'f>>,
    builder: &mut MemberBuilder,
) {
    let tree = factory.tree();
    for &item in &items.nodes {
        let Some(kind) = tree.kind_of(item) else {
            continue;
        };
        match kind {
            SyntaxKind::ParamDecl => {
                let id = construct_local_parameter(factory, scope_id, item);
                builder.add(factory, id);
            }
            SyntaxKind::DataDecl => {
                let id = construct_variable(factory, scope_id, item);
                builder.add(factory, id);
            }
            SyntaxKind::FunctionDecl => {
                let id = construct_subroutine(factory, scope_id, item);
                builder.add(factory, id);
            }
            SyntaxKind::ExplicitImport => {
                let id = construct_explicit_import(factory, scope_id, item);
                builder.add(factory, id);
            }
            SyntaxKind::WildcardImport => {
                let id = construct_wildcard_import(factory, scope_id, item);
                builder.add(factory, id);
            }
            SyntaxKind::IfGenerate => {
                let id = crate::generate::construct_if_generate(factory, scope_id, item);
                builder.add(factory, id);
            }
            SyntaxKind::LoopGenerate => {
                let id = crate::generate::construct_loop_generate(factory, scope_id, item);
                builder.add(factory, id);
            }
            SyntaxKind::HierarchyInstantiation => {
                for id in elaborate_hierarchy_instantiation(factory, scope_id, item, checker) {
                    builder.add(factory, id);
                }
            }
            SyntaxKind::ModuleDecl | SyntaxKind::InterfaceDecl | SyntaxKind::ProgramDecl => {
                let id = crate::instance::construct_definition(factory, scope_id, item);
                builder.add(factory, id);
            }
            SyntaxKind::PackageDecl => {
                let id = crate::root::construct_package(factory, scope_id, item);
                builder.add(factory, id);
            }
            _ => {}
        }
    }
}

fn construct_variable(factory: &Factory, parent: SymbolId, syntax: NodeIndex) -> SymbolId {
    let (name, data_type, initializer) = match factory.tree().get(syntax).map(|n| &n.data) {
        Some(SyntaxNodeData::DataDecl {
            name,
            data_type,
            initializer,
        }) => (name.clone(), *data_type, *initializer),
        _ => (String::new(), NodeIndex::NONE, NodeIndex::NONE),
    };
    let name_atom = factory.intern(&name);
    let location = factory.location_of_syntax(syntax);
    let initializer_cell = if initializer.is_some() {
        LazyInitializer::unresolved(initializer)
    } else {
        LazyInitializer::empty()
    };
    factory.alloc(SymbolRecord {
        name: name_atom,
        location,
        parent_scope: parent,
        payload: SymbolPayload::Variable(VariableData {
            owning_scope: parent,
            type_cell: LazyType::unresolved(data_type),
            initializer_cell,
        }),
    })
}

fn construct_subroutine(factory: &Factory, parent: SymbolId, syntax: NodeIndex) -> SymbolId {
    let name = match factory.tree().get(syntax).map(|n| &n.data) {
        Some(SyntaxNodeData::FunctionDecl { name, .. }) => name.clone(),
        _ => String::new(),
    };
    let name_atom = factory.intern(&name);
    let location = factory.location_of_syntax(syntax);
    factory.alloc(SymbolRecord {
        name: name_atom,
        location,
        parent_scope: parent,
        payload: SymbolPayload::Subroutine(SubroutineData {
            owning_scope: parent,
            syntax,
            body_cell: LazyStatementList::unresolved(syntax),
        }),
    })
}

impl Factory {
    /// Read (and cache) a variable's declared type, evaluated lazily
    /// against its owning scope — the scope declaring it, analogous to
    /// `Factory::parameter_type`.
    pub fn variable_type<'f>(&'f self, id: SymbolId, checker: &dyn SemanticChecker<ScopeRef<'f>>) -> TypeSymbol {
        let owning_scope = {
            let rec = self.get_record(id);
            let rec = rec.borrow();
            match &rec.payload {
                SymbolPayload::Variable(v) => v.owning_scope,
                _ => return TypeSymbol::bad(),
            }
        };
        let (read, was_resolving) = {
            let rec = self.get_record(id);
            let mut rec = rec.borrow_mut();
            match &mut rec.payload {
                SymbolPayload::Variable(v) => {
                    let was_resolving = v.type_cell.is_resolving();
                    (v.type_cell.begin(), was_resolving)
                }
                _ => return TypeSymbol::bad(),
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
                if let SymbolPayload::Variable(v) = &mut rec.payload {
                    v.type_cell.finish(ty);
                }
                ty
            }
        }
    }

    /// Read (and cache) a variable's initializer constant, evaluated
    /// lazily against its owning scope. A variable declared without an
    /// initializer carries an `empty` cell and this returns the bad
    /// sentinel without ever forcing anything.
    pub fn variable_initializer<'f>(&'f self, id: SymbolId, checker: &dyn SemanticChecker<ScopeRef<'f>>) -> ConstantValue {
        let owning_scope = {
            let rec = self.get_record(id);
            let rec = rec.borrow();
            match &rec.payload {
                SymbolPayload::Variable(v) => v.owning_scope,
                _ => return ConstantValue::bad(),
            }
        };
        let (read, was_resolving) = {
            let rec = self.get_record(id);
            let mut rec = rec.borrow_mut();
            match &mut rec.payload {
                SymbolPayload::Variable(v) => {
                    let was_resolving = v.initializer_cell.is_resolving();
                    (v.initializer_cell.begin(), was_resolving)
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
                let value = self.evaluate_constant(owning_scope, syntax, checker);
                let rec = self.get_record(id);
                let mut rec = rec.borrow_mut();
                if let SymbolPayload::Variable(v) = &mut rec.payload {
                    v.initializer_cell.finish(value);
                }
                value
            }
        }
    }

    /// Read (and cache) a subroutine's bound body, evaluated lazily against
    /// its owning scope. `body_cell`'s syntax reference is the
    /// `FunctionDecl` node itself; `NeedsEval` re-derives the actual
    /// statement list from it via `SyntaxTree::get_function`.
    pub fn subroutine_body<'f>(&'f self, id: SymbolId, checker: &dyn SemanticChecker<ScopeRef<'f>>) -> StatementList {
        let owning_scope = {
            let rec = self.get_record(id);
            let rec = rec.borrow();
            match &rec.payload {
                SymbolPayload::Subroutine(s) => s.owning_scope,
                _ => return StatementList::default(),
            }
        };
        let (read, was_resolving) = {
            let rec = self.get_record(id);
            let mut rec = rec.borrow_mut();
            match &mut rec.payload {
                SymbolPayload::Subroutine(s) => {
                    let was_resolving = s.body_cell.is_resolving();
                    (s.body_cell.begin(), was_resolving)
                }
                _ => return StatementList::default(),
            }
        };
        if was_resolving {
            let name_text = self.resolve_atom(self.name_of(id));
            self.add_error(id, DiagnosticCode::CyclicDependency, &[&name_text]);
        }
        match read {
            LazyRead::Ready(v) => v,
            LazyRead::NeedsEval(syntax) => {
                let items = self.tree().get_function(syntax).map(|(_, body)| body.clone()).unwrap_or_default();
                let scope_ref = ScopeRef::new(self, owning_scope, checker);
                let stmts = checker.bind_statement_list(&scope_ref, self.tree(), &items);
                let rec = self.get_record(id);
                let mut rec = rec.borrow_mut();
                if let SymbolPayload::Subroutine(s) = &mut rec.payload {
                    s.body_cell.finish(stmts.clone());
                }
                stmts
            }
        }
    }
}

impl Factory {
    /// `ensure_init`: cheap when initialised, else calls `do_init`.
    pub fn ensure_init<'f>(&'f self, id: SymbolId, checker: &dyn SemanticChecker<ScopeRef<'f>>) {
        let already_init = {
            let rec = self.get_record(id);
            let rec = rec.borrow();
            scope_data(&rec.payload).map(|s| s.state)
        };
        match already_init {
            Some(ScopeState::Initialised) => {}
            Some(ScopeState::Initialising) => {
                self.add_error(
                    id,
                    DiagnosticCode::CyclicDependency,
                    &["re-entrant scope initialisation"],
                );
            }
            Some(ScopeState::Uninitialised) => self.do_init(id, checker),
            None => {}
        }
    }

    fn do_init<'f>(&'f self, id: SymbolId, checker: &dyn SemanticChecker<ScopeRef<'f>>) {
        let _span = span!(Level::DEBUG, "fill_members", scope = id.0).entered();

        {
            let rec = self.get_record(id);
            let mut rec = rec.borrow_mut();
            if let Some(s) = scope_data_mut(&mut rec.payload) {
                s.state = ScopeState::Initialising;
            }
        }

        let mut builder = MemberBuilder::new();
        self.fill_members(id, &mut builder, checker);

        let rec = self.get_record(id);
        let mut rec = rec.borrow_mut();
        if let Some(s) = scope_data_mut(&mut rec.payload) {
            s.member_list = builder.member_list;
            s.member_map = builder.member_map;
            s.wildcard_imports = builder.wildcard_imports;
            s.state = ScopeState::Initialised;
        }
    }

    /// Dispatch `fill_members` by kind tag, not by vtable.
    fn fill_members<'f>(&'f self, id: SymbolId, builder: &mut MemberBuilder, checker: &dyn SemanticChecker<ScopeRef<'f>>) {
        let kind = self.kind_of(id);
        match kind {
            SymbolKind::Root => crate::root::fill_members_root(self, id, builder, checker),
            SymbolKind::CompilationUnit => crate::root::fill_members_compilation_unit(self, id, builder, checker),
            SymbolKind::DynamicScope => crate::root::fill_members_dynamic_scope(self, id, builder),
            SymbolKind::Package => {
                let items = crate::root::package_items(self, id);
                build_members_from_items(self, id, &items, checker, builder);
            }
            SymbolKind::ModuleInstance | SymbolKind::InterfaceInstance | SymbolKind::Instance => {
                fill_members_instance(self, id, builder, checker);
            }
            SymbolKind::GenerateBlock => fill_members_generate_block(self, id, builder, checker),
            SymbolKind::IfGenerate => crate::generate::fill_members_if_generate(self, id, builder, checker),
            SymbolKind::LoopGenerate => crate::generate::fill_members_loop_generate(self, id, builder, checker),
            _ => {}
        }
    }

    /// `mark_dirty`: clears `members_initialized`; next `ensure_init`
    /// rebuilds. A `DynamicScope`'s explicit list is unaffected (its
    /// `fill_members` is a no-op).
    pub fn mark_dirty(&self, id: SymbolId) {
        let rec = self.get_record(id);
        let mut rec = rec.borrow_mut();
        if let Some(s) = scope_data_mut(&mut rec.payload) {
            s.state = ScopeState::Uninitialised;
        }
    }

    /// `members()`.
    pub fn members<'f>(&'f self, id: SymbolId, checker: &dyn SemanticChecker<ScopeRef<'f>>) -> Vec<SymbolId> {
        self.ensure_init(id, checker);
        let rec = self.get_record(id);
        let rec = rec.borrow();
        scope_data(&rec.payload).map(|s| s.member_list.clone()).unwrap_or_default()
    }

    /// `member(i)`.
    pub fn member<'f>(&'f self, id: SymbolId, index: usize, checker: &dyn SemanticChecker<ScopeRef<'f>>) -> Option<SymbolId> {
        self.members(id, checker).get(index).copied()
    }

    /// `set_members`/`set_member`: manual override for `DynamicScope`
    /// and tests.
    pub fn set_members(&self, id: SymbolId, members: Vec<SymbolId>) {
        {
            let rec = self.get_record(id);
            let mut rec = rec.borrow_mut();
            if let SymbolPayload::DynamicScope(d) = &mut rec.payload {
                d.preserved = members.clone();
                d.scope.member_list = members.clone();
                d.scope.wildcard_imports.clear();
                d.scope.member_map.clear();
                d.scope.state = ScopeState::Initialised;
            } else {
                return;
            }
        }
        for m in members {
            let name = self.name_of(m);
            if name == Atom::EMPTY {
                continue;
            }
            let rec = self.get_record(id);
            let mut rec = rec.borrow_mut();
            if let SymbolPayload::DynamicScope(d) = &mut rec.payload {
                d.scope.member_map.insert(name, m);
            }
        }
    }

    pub fn set_member(&self, id: SymbolId, member: SymbolId) {
        let existing = {
            let rec = self.get_record(id);
            let rec = rec.borrow();
            match &rec.payload {
                SymbolPayload::DynamicScope(d) => d.preserved.clone(),
                _ => return,
            }
        };
        let mut members = existing;
        members.push(member);
        self.set_members(id, members);
    }

    /// `evaluate_constant`: bind then reduce.
    pub fn evaluate_constant<'f>(
        &'f self,
        scope: SymbolId,
        syntax: NodeIndex,
        checker: &dyn SemanticChecker<ScopeRef<'f>>,
    ) -> ConstantValue {
        let scope_ref = ScopeRef::new(self, scope, checker);
        let expr = checker.bind_expression(&scope_ref, self.tree(), syntax);
        checker.evaluate_constant(&expr)
    }

    /// `evaluate_constant_and_convert`.
    pub fn evaluate_constant_and_convert<'f>(
        &'f self,
        scope: SymbolId,
        syntax: NodeIndex,
        target_type: TypeSymbol,
        err_loc: Location,
        checker: &dyn SemanticChecker<ScopeRef<'f>>,
    ) -> ConstantValue {
        let value = self.evaluate_constant(scope, syntax, checker);
        checker.convert_constant(value, target_type, err_loc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_sema_checker::StubChecker;
    use sv_sema_syntax::builder::TreeBuilder;
    use sv_sema_syntax::DataTypeKind;

    use crate::root;

    #[test]
    fn variable_type_and_initializer_resolve_against_declaring_scope() {
        let mut b = TreeBuilder::new();
        let ty = b.data_type(DataTypeKind::Int);
        let init = b.int_literal(5);
        let var = b.data_decl("x", ty, init);
        let pkg = b.package_decl("p", vec![var]);
        let unit = b.source_unit(vec![pkg]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let pkg_id = factory.member(unit_id, 0, &checker).expect("package");
        let var_id = factory.member(pkg_id, 0, &checker).expect("variable");
        assert_eq!(factory.kind_of(var_id), SymbolKind::Variable);

        assert_eq!(factory.variable_type(var_id, &checker), TypeSymbol::new(sv_sema_checker::TypeKind::Int, 32));
        assert_eq!(factory.variable_initializer(var_id, &checker), ConstantValue::int(5));
    }

    #[test]
    fn variable_without_initializer_yields_bad_without_forcing_anything() {
        let mut b = TreeBuilder::new();
        let ty = b.data_type(DataTypeKind::Int);
        let var = b.data_decl("x", ty, NodeIndex::NONE);
        let pkg = b.package_decl("p", vec![var]);
        let unit = b.source_unit(vec![pkg]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let pkg_id = factory.member(unit_id, 0, &checker).expect("package");
        let var_id = factory.member(pkg_id, 0, &checker).expect("variable");

        assert!(factory.variable_initializer(var_id, &checker).is_bad());
    }

    #[test]
    fn subroutine_body_binds_against_declaring_scope() {
        let mut b = TreeBuilder::new();
        let lit = b.int_literal(1);
        let stmt = b.expr_statement(lit);
        let func = b.function_decl("f", vec![stmt]);
        let pkg = b.package_decl("p", vec![func]);
        let unit = b.source_unit(vec![pkg]);
        let tree = b.finish();

        let factory = Factory::new(tree, vec![unit]);
        let checker = StubChecker::new();
        let root_id = root::create_root(&factory);
        let unit_id = factory.member(root_id, 0, &checker).expect("unit");
        let pkg_id = factory.member(unit_id, 0, &checker).expect("package");
        let sub_id = factory.member(pkg_id, 0, &checker).expect("subroutine");
        assert_eq!(factory.kind_of(sub_id), SymbolKind::Subroutine);

        let body = factory.subroutine_body(sub_id, &checker);
        assert_eq!(body.statements.len(), 1);

        // A second read returns the cached body without re-binding.
        let body_again = factory.subroutine_body(sub_id, &checker);
        assert_eq!(body_again.statements.len(), 1);
    }
}
