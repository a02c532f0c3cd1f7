//! Symbol base and the closed set of symbol kinds.

use sv_sema_checker::ConstantValue;
use sv_sema_common::{Atom, DiagnosticCode, Location};
use sv_sema_syntax::NodeIndex;

use crate::error::CoreError;
use crate::generate::{GenerateBlockData, IfGenerateData, LoopGenerateData};
use crate::imports::{ExplicitImportData, ImplicitImportData, WildcardImportData};
use crate::instance::{DefinitionData, InstanceData};
use crate::lazy::{LazyInitializer, LazyStatementList, LazyType};
use crate::scope::{DynamicScopeData, ScopeData};

/// An index into a [`crate::arena::Factory`]'s symbol arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// The closed set of symbol kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Unknown,
    Root,
    DynamicScope,
    CompilationUnit,
    IntegralType,
    RealType,
    StringType,
    CHandleType,
    VoidType,
    EventType,
    EnumType,
    TypeAlias,
    Parameter,
    EnumValue,
    Module,
    Interface,
    Modport,
    ModuleInstance,
    InterfaceInstance,
    Package,
    ExplicitImport,
    ImplicitImport,
    WildcardImport,
    Program,
    Attribute,
    Genvar,
    IfGenerate,
    LoopGenerate,
    GenerateBlock,
    ProceduralBlock,
    SequentialBlock,
    Variable,
    Instance,
    FormalArgument,
    Subroutine,
}

impl SymbolKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        use SymbolKind::*;
        match self {
            Unknown => "Unknown",
            Root => "Root",
            DynamicScope => "DynamicScope",
            CompilationUnit => "CompilationUnit",
            IntegralType => "IntegralType",
            RealType => "RealType",
            StringType => "StringType",
            CHandleType => "CHandleType",
            VoidType => "VoidType",
            EventType => "EventType",
            EnumType => "EnumType",
            TypeAlias => "TypeAlias",
            Parameter => "Parameter",
            EnumValue => "EnumValue",
            Module => "Module",
            Interface => "Interface",
            Modport => "Modport",
            ModuleInstance => "ModuleInstance",
            InterfaceInstance => "InterfaceInstance",
            Package => "Package",
            ExplicitImport => "ExplicitImport",
            ImplicitImport => "ImplicitImport",
            WildcardImport => "WildcardImport",
            Program => "Program",
            Attribute => "Attribute",
            Genvar => "Genvar",
            IfGenerate => "IfGenerate",
            LoopGenerate => "LoopGenerate",
            GenerateBlock => "GenerateBlock",
            ProceduralBlock => "ProceduralBlock",
            SequentialBlock => "SequentialBlock",
            Variable => "Variable",
            Instance => "Instance",
            FormalArgument => "FormalArgument",
            Subroutine => "Subroutine",
        }
    }
}

/// Parameter symbol: constructed either from a fixed type/value or from
/// syntax references evaluated lazily against the instance scope it belongs
/// to (not the definition scope).
#[derive(Clone, Debug)]
pub struct ParameterData {
    pub is_local_param: bool,
    pub is_port_param: bool,
    /// The scope the type/value cells evaluate against — an instance scope,
    /// never the definition.
    pub owning_scope: SymbolId,
    pub type_cell: LazyType,
    pub value_cell: crate::lazy::LazyConstant,
    /// Set once `MissingRequiredParameter` has already been diagnosed for
    /// this parameter, so a second read doesn't re-report it.
    pub missing_reported: bool,
}

#[derive(Clone, Debug)]
pub struct VariableData {
    /// The scope the type/initializer cells evaluate against — the scope
    /// that declares the variable, same as a free-standing parameter.
    pub owning_scope: SymbolId,
    pub type_cell: LazyType,
    pub initializer_cell: LazyInitializer,
}

#[derive(Clone, Debug)]
pub struct SubroutineData {
    /// The scope the body statements evaluate against — the scope that
    /// declares the subroutine.
    pub owning_scope: SymbolId,
    /// The `FunctionDecl` node itself; `body_cell`'s `NeedsEval` carries
    /// this same index back so the accessor can re-fetch the statement
    /// list via `SyntaxTree::get_function`.
    pub syntax: NodeIndex,
    pub body_cell: LazyStatementList,
}

#[derive(Clone, Copy, Debug)]
pub struct EnumValueData {
    pub value: ConstantValue,
}

#[derive(Clone, Copy, Debug)]
pub struct GenvarData {
    pub value: ConstantValue,
}

/// The payload of a symbol: the kind-specific data `SymbolKind` tags.
/// Dispatch (`fill_members`, scope access) matches on this rather than
/// going through a vtable.
#[derive(Debug)]
pub enum SymbolPayload {
    Unknown,
    Root(ScopeData),
    DynamicScope(DynamicScopeData),
    CompilationUnit(ScopeData),
    IntegralType,
    RealType,
    StringType,
    CHandleType,
    VoidType,
    EventType,
    EnumType,
    TypeAlias,
    Parameter(ParameterData),
    EnumValue(EnumValueData),
    Module(DefinitionData),
    Interface(DefinitionData),
    Modport,
    ModuleInstance(InstanceData),
    InterfaceInstance(InstanceData),
    Package(ScopeData),
    ExplicitImport(ExplicitImportData),
    ImplicitImport(ImplicitImportData),
    WildcardImport(WildcardImportData),
    Program(DefinitionData),
    Attribute,
    Genvar(GenvarData),
    IfGenerate(IfGenerateData),
    LoopGenerate(LoopGenerateData),
    GenerateBlock(GenerateBlockData),
    ProceduralBlock(ScopeData),
    SequentialBlock(ScopeData),
    Variable(VariableData),
    Instance(InstanceData),
    FormalArgument(VariableData),
    Subroutine(SubroutineData),
}

impl SymbolPayload {
    #[must_use]
    pub const fn kind(&self) -> SymbolKind {
        match self {
            SymbolPayload::Unknown => SymbolKind::Unknown,
            SymbolPayload::Root(_) => SymbolKind::Root,
            SymbolPayload::DynamicScope(_) => SymbolKind::DynamicScope,
            SymbolPayload::CompilationUnit(_) => SymbolKind::CompilationUnit,
            SymbolPayload::IntegralType => SymbolKind::IntegralType,
            SymbolPayload::RealType => SymbolKind::RealType,
            SymbolPayload::StringType => SymbolKind::StringType,
            SymbolPayload::CHandleType => SymbolKind::CHandleType,
            SymbolPayload::VoidType => SymbolKind::VoidType,
            SymbolPayload::EventType => SymbolKind::EventType,
            SymbolPayload::EnumType => SymbolKind::EnumType,
            SymbolPayload::TypeAlias => SymbolKind::TypeAlias,
            SymbolPayload::Parameter(_) => SymbolKind::Parameter,
            SymbolPayload::EnumValue(_) => SymbolKind::EnumValue,
            SymbolPayload::Module(_) => SymbolKind::Module,
            SymbolPayload::Interface(_) => SymbolKind::Interface,
            SymbolPayload::Modport => SymbolKind::Modport,
            SymbolPayload::ModuleInstance(_) => SymbolKind::ModuleInstance,
            SymbolPayload::InterfaceInstance(_) => SymbolKind::InterfaceInstance,
            SymbolPayload::Package(_) => SymbolKind::Package,
            SymbolPayload::ExplicitImport(_) => SymbolKind::ExplicitImport,
            SymbolPayload::ImplicitImport(_) => SymbolKind::ImplicitImport,
            SymbolPayload::WildcardImport(_) => SymbolKind::WildcardImport,
            SymbolPayload::Program(_) => SymbolKind::Program,
            SymbolPayload::Attribute => SymbolKind::Attribute,
            SymbolPayload::Genvar(_) => SymbolKind::Genvar,
            SymbolPayload::IfGenerate(_) => SymbolKind::IfGenerate,
            SymbolPayload::LoopGenerate(_) => SymbolKind::LoopGenerate,
            SymbolPayload::GenerateBlock(_) => SymbolKind::GenerateBlock,
            SymbolPayload::ProceduralBlock(_) => SymbolKind::ProceduralBlock,
            SymbolPayload::SequentialBlock(_) => SymbolKind::SequentialBlock,
            SymbolPayload::Variable(_) => SymbolKind::Variable,
            SymbolPayload::Instance(_) => SymbolKind::Instance,
            SymbolPayload::FormalArgument(_) => SymbolKind::FormalArgument,
            SymbolPayload::Subroutine(_) => SymbolKind::Subroutine,
        }
    }
}

/// One symbol: the common header plus its kind-specific payload.
#[derive(Debug)]
pub struct SymbolRecord {
    pub name: Atom,
    pub location: Location,
    /// The design root is its own parent — the only self-reference.
    pub parent_scope: SymbolId,
    pub payload: SymbolPayload,
}

impl SymbolRecord {
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        self.payload.kind()
    }
}

impl crate::arena::Factory {
    #[must_use]
    pub fn kind_of(&self, id: SymbolId) -> SymbolKind {
        self.get_record(id).borrow().kind()
    }

    #[must_use]
    pub fn name_of(&self, id: SymbolId) -> Atom {
        self.get_record(id).borrow().name
    }

    #[must_use]
    pub fn location_of(&self, id: SymbolId) -> Location {
        self.get_record(id).borrow().location.clone()
    }

    /// The symbol's immediate enclosing scope.
    #[must_use]
    pub fn parent(&self, id: SymbolId) -> SymbolId {
        self.get_record(id).borrow().parent_scope
    }

    /// Walk parents until the symbol is its own parent.
    #[must_use]
    pub fn root(&self, id: SymbolId) -> SymbolId {
        self.find_ancestor(id, SymbolKind::Root)
    }

    /// Walk parent pointers until a symbol of `kind` is found or the root
    /// is reached. Bounded by `MAX_SCOPE_WALK_ITERATIONS` against a
    /// corrupted parent chain.
    #[must_use]
    pub fn find_ancestor(&self, id: SymbolId, kind: SymbolKind) -> SymbolId {
        let mut current = id;
        for _ in 0..sv_sema_common::limits::MAX_SCOPE_WALK_ITERATIONS {
            let rec = self.get_record(current);
            let rec = rec.borrow();
            if rec.kind() == kind {
                return current;
            }
            if rec.kind() == SymbolKind::Root {
                return if kind == SymbolKind::Root {
                    current
                } else {
                    SymbolId(u32::MAX)
                };
            }
            let parent = rec.parent_scope;
            drop(rec);
            if parent == current {
                return current;
            }
            current = parent;
        }
        self.report(
            DiagnosticCode::CyclicDependency,
            Location::synthetic(),
            &["parent-scope walk"],
        );
        SymbolId(u32::MAX)
    }

    /// Checked downcast: traps on mismatch, for call sites that have
    /// already established the symbol's kind.
    ///
    /// # Panics
    /// Panics if `id`'s kind differs from `expected` — a contract violation
    /// by the caller, not a SystemVerilog-level error.
    pub fn as_kind(&self, id: SymbolId, expected: SymbolKind) -> Result<SymbolId, CoreError> {
        let found = self.kind_of(id);
        if found == expected {
            Ok(id)
        } else {
            Err(CoreError::KindMismatch {
                id,
                expected: expected.name(),
                found: found.name(),
            })
        }
    }

    /// Append a diagnostic tagged to `id`'s location.
    pub fn add_error(&self, id: SymbolId, code: DiagnosticCode, args: &[&str]) {
        let location = self.location_of(id);
        self.report(code, location, args);
    }
}
