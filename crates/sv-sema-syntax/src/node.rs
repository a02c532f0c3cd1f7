//! The node arena: `SyntaxTree` + `NodeIndex`, and the typed node payloads.

use sv_sema_common::Span;

/// An index into a [`SyntaxTree`]'s node arena.
///
/// `NodeIndex::NONE` stands in for an absent optional child (e.g. a
/// `LoopGenerate` with no `else` branch would not use this, but
/// `IfGenerate.else_block` does), following an `is_none()`-checked
/// sentinel pattern rather than a nested `Option<NodeIndex>` at every call
/// site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[must_use]
    pub const fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// An ordered list of child nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeList {
    pub nodes: Vec<NodeIndex>,
}

impl NodeList {
    #[must_use]
    pub fn new(nodes: Vec<NodeIndex>) -> Self {
        Self { nodes }
    }
}

/// The kind tag of a syntax node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    SourceUnit,
    PackageDecl,
    ModuleDecl,
    InterfaceDecl,
    ProgramDecl,
    ParamDecl,
    DataDecl,
    FunctionDecl,
    IfGenerate,
    LoopGenerate,
    GenerateBlock,
    HierarchyInstantiation,
    ExplicitImport,
    WildcardImport,
    Identifier,
    IntLiteral,
    BinaryExpr,
    DataType,
    ExprStatement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataTypeKind {
    Int,
    Logic,
    String,
}

/// Shared shape of module/interface/program declarations: a name, a
/// parameter port list, body-declared parameters, and the item list.
///
/// Port parameters and body parameters are kept in separate lists rather
/// than one list with a `body_param` flag per entry, so that the "last
/// local" rule (threaded only across the *port* list) has an
/// unambiguous sequence to thread across.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefinitionSyntax {
    pub name: String,
    pub port_params: NodeList,
    pub body_params: NodeList,
    pub items: NodeList,
}

/// One parameter assignment in a hierarchy instantiation: `.P(expr)` if
/// `name` is `Some`, an ordered (positional) assignment otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamAssignSyntax {
    pub name: Option<String>,
    pub value: NodeIndex,
}

/// One instance name within a `HierarchyInstantiation` (`u` in `m u();`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceNameSyntax {
    pub name: String,
}

/// The payload of a syntax node. See [`SyntaxKind`] for the discriminant
/// this mirrors; `SyntaxNode::kind` derives the kind from the variant so
/// the two can never disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxNodeData {
    SourceUnit {
        items: NodeList,
    },
    PackageDecl {
        name: String,
        items: NodeList,
    },
    ModuleDecl(DefinitionSyntax),
    InterfaceDecl(DefinitionSyntax),
    ProgramDecl(DefinitionSyntax),
    ParamDecl {
        name: String,
        is_local: bool,
        data_type: NodeIndex,
        default_value: NodeIndex,
    },
    DataDecl {
        name: String,
        data_type: NodeIndex,
        initializer: NodeIndex,
    },
    FunctionDecl {
        name: String,
        body: NodeList,
    },
    IfGenerate {
        condition: NodeIndex,
        then_block: NodeIndex,
        else_block: NodeIndex,
    },
    LoopGenerate {
        genvar_name: String,
        init_value: NodeIndex,
        condition: NodeIndex,
        step: NodeIndex,
        body: NodeIndex,
    },
    GenerateBlock {
        label: String,
        items: NodeList,
    },
    HierarchyInstantiation {
        definition_name: String,
        param_assignments: Vec<ParamAssignSyntax>,
        instances: Vec<InstanceNameSyntax>,
    },
    ExplicitImport {
        package: String,
        imported_name: String,
    },
    WildcardImport {
        package: String,
    },
    Identifier {
        name: String,
    },
    IntLiteral {
        value: i64,
    },
    BinaryExpr {
        op: BinaryOp,
        lhs: NodeIndex,
        rhs: NodeIndex,
    },
    DataType {
        kind: DataTypeKind,
    },
    ExprStatement {
        expr: NodeIndex,
    },
}

/// One node in the tree: a payload plus the source span it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxNode {
    pub span: Span,
    pub data: SyntaxNodeData,
}

impl SyntaxNode {
    #[must_use]
    pub fn kind(&self) -> SyntaxKind {
        match &self.data {
            SyntaxNodeData::SourceUnit { .. } => SyntaxKind::SourceUnit,
            SyntaxNodeData::PackageDecl { .. } => SyntaxKind::PackageDecl,
            SyntaxNodeData::ModuleDecl(_) => SyntaxKind::ModuleDecl,
            SyntaxNodeData::InterfaceDecl(_) => SyntaxKind::InterfaceDecl,
            SyntaxNodeData::ProgramDecl(_) => SyntaxKind::ProgramDecl,
            SyntaxNodeData::ParamDecl { .. } => SyntaxKind::ParamDecl,
            SyntaxNodeData::DataDecl { .. } => SyntaxKind::DataDecl,
            SyntaxNodeData::FunctionDecl { .. } => SyntaxKind::FunctionDecl,
            SyntaxNodeData::IfGenerate { .. } => SyntaxKind::IfGenerate,
            SyntaxNodeData::LoopGenerate { .. } => SyntaxKind::LoopGenerate,
            SyntaxNodeData::GenerateBlock { .. } => SyntaxKind::GenerateBlock,
            SyntaxNodeData::HierarchyInstantiation { .. } => SyntaxKind::HierarchyInstantiation,
            SyntaxNodeData::ExplicitImport { .. } => SyntaxKind::ExplicitImport,
            SyntaxNodeData::WildcardImport { .. } => SyntaxKind::WildcardImport,
            SyntaxNodeData::Identifier { .. } => SyntaxKind::Identifier,
            SyntaxNodeData::IntLiteral { .. } => SyntaxKind::IntLiteral,
            SyntaxNodeData::BinaryExpr { .. } => SyntaxKind::BinaryExpr,
            SyntaxNodeData::DataType { .. } => SyntaxKind::DataType,
            SyntaxNodeData::ExprStatement { .. } => SyntaxKind::ExprStatement,
        }
    }
}

/// The read-only (from the core's point of view) node arena handed to the
/// binder by the parser. Owned and mutated only by whoever builds it (the
/// parser, or a test via [`crate::builder`]).
#[derive(Debug, Default)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, span: Span, data: SyntaxNodeData) -> NodeIndex {
        let idx = NodeIndex(u32::try_from(self.nodes.len()).expect("syntax tree overflowed u32"));
        self.nodes.push(SyntaxNode { span, data });
        idx
    }

    #[must_use]
    pub fn get(&self, idx: NodeIndex) -> Option<&SyntaxNode> {
        if idx.is_none() {
            return None;
        }
        self.nodes.get(idx.0 as usize)
    }

    #[must_use]
    pub fn kind_of(&self, idx: NodeIndex) -> Option<SyntaxKind> {
        self.get(idx).map(SyntaxNode::kind)
    }

    #[must_use]
    pub fn get_identifier_name(&self, idx: NodeIndex) -> Option<&str> {
        match &self.get(idx)?.data {
            SyntaxNodeData::Identifier { name } => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_definition(&self, idx: NodeIndex) -> Option<&DefinitionSyntax> {
        match &self.get(idx)?.data {
            SyntaxNodeData::ModuleDecl(def)
            | SyntaxNodeData::InterfaceDecl(def)
            | SyntaxNodeData::ProgramDecl(def) => Some(def),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_if_generate(
        &self,
        idx: NodeIndex,
    ) -> Option<(NodeIndex, NodeIndex, NodeIndex)> {
        match &self.get(idx)?.data {
            SyntaxNodeData::IfGenerate {
                condition,
                then_block,
                else_block,
            } => Some((*condition, *then_block, *else_block)),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_generate_block(&self, idx: NodeIndex) -> Option<(&str, &NodeList)> {
        match &self.get(idx)?.data {
            SyntaxNodeData::GenerateBlock { label, items } => Some((label.as_str(), items)),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_loop_generate(
        &self,
        idx: NodeIndex,
    ) -> Option<(&str, NodeIndex, NodeIndex, NodeIndex, NodeIndex)> {
        match &self.get(idx)?.data {
            SyntaxNodeData::LoopGenerate {
                genvar_name,
                init_value,
                condition,
                step,
                body,
            } => Some((genvar_name.as_str(), *init_value, *condition, *step, *body)),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_param_decl(
        &self,
        idx: NodeIndex,
    ) -> Option<(&str, bool, NodeIndex, NodeIndex)> {
        match &self.get(idx)?.data {
            SyntaxNodeData::ParamDecl {
                name,
                is_local,
                data_type,
                default_value,
            } => Some((name.as_str(), *is_local, *data_type, *default_value)),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_package(&self, idx: NodeIndex) -> Option<(&str, &NodeList)> {
        match &self.get(idx)?.data {
            SyntaxNodeData::PackageDecl { name, items } => Some((name.as_str(), items)),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_function(&self, idx: NodeIndex) -> Option<(&str, &NodeList)> {
        match &self.get(idx)?.data {
            SyntaxNodeData::FunctionDecl { name, body } => Some((name.as_str(), body)),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_source_unit(&self, idx: NodeIndex) -> Option<&NodeList> {
        match &self.get(idx)?.data {
            SyntaxNodeData::SourceUnit { items } => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_explicit_import(&self, idx: NodeIndex) -> Option<(&str, &str)> {
        match &self.get(idx)?.data {
            SyntaxNodeData::ExplicitImport {
                package,
                imported_name,
            } => Some((package.as_str(), imported_name.as_str())),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_wildcard_import(&self, idx: NodeIndex) -> Option<&str> {
        match &self.get(idx)?.data {
            SyntaxNodeData::WildcardImport { package } => Some(package.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_int_literal(&self, idx: NodeIndex) -> Option<i64> {
        match &self.get(idx)?.data {
            SyntaxNodeData::IntLiteral { value } => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_binary_expr(&self, idx: NodeIndex) -> Option<(BinaryOp, NodeIndex, NodeIndex)> {
        match &self.get(idx)?.data {
            SyntaxNodeData::BinaryExpr { op, lhs, rhs } => Some((*op, *lhs, *rhs)),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_data_type(&self, idx: NodeIndex) -> Option<DataTypeKind> {
        match &self.get(idx)?.data {
            SyntaxNodeData::DataType { kind } => Some(*kind),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_hierarchy_instantiation(
        &self,
        idx: NodeIndex,
    ) -> Option<(&str, &[ParamAssignSyntax], &[InstanceNameSyntax])> {
        match &self.get(idx)?.data {
            SyntaxNodeData::HierarchyInstantiation {
                definition_name,
                param_assignments,
                instances,
            } => Some((
                definition_name.as_str(),
                param_assignments.as_slice(),
                instances.as_slice(),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_index_none_round_trips() {
        assert!(NodeIndex::NONE.is_none());
        assert!(!NodeIndex::NONE.is_some());
        assert!(NodeIndex(0).is_some());
    }

    #[test]
    fn alloc_returns_increasing_indices() {
        let mut tree = SyntaxTree::new();
        let a = tree.alloc(Span::dummy(), SyntaxNodeData::Identifier { name: "a".into() });
        let b = tree.alloc(Span::dummy(), SyntaxNodeData::Identifier { name: "b".into() });
        assert_eq!(a, NodeIndex(0));
        assert_eq!(b, NodeIndex(1));
        assert_eq!(tree.get_identifier_name(a), Some("a"));
    }

    #[test]
    fn get_on_none_is_none() {
        let tree = SyntaxTree::new();
        assert!(tree.get(NodeIndex::NONE).is_none());
    }
}
