//! Ergonomic construction of [`SyntaxTree`]s for tests.
//!
//! There is no real parser behind this crate, so every test that
//! needs a tree has to build one by hand. `TreeBuilder` exists only to keep
//! that hand-building terse; it is not part of the core's public contract
//! with a real parser, which would hand over an already-built `SyntaxTree`.

use sv_sema_common::Span;

use crate::node::{
    BinaryOp, DataTypeKind, DefinitionSyntax, InstanceNameSyntax, NodeIndex, NodeList,
    ParamAssignSyntax, SyntaxNodeData, SyntaxTree,
};

/// Wraps a [`SyntaxTree`] with helpers that allocate nodes at a dummy span.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: SyntaxTree,
}

impl TreeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: SyntaxTree::new(),
        }
    }

    fn alloc(&mut self, data: SyntaxNodeData) -> NodeIndex {
        self.tree.alloc(Span::dummy(), data)
    }

    pub fn identifier(&mut self, name: impl Into<String>) -> NodeIndex {
        self.alloc(SyntaxNodeData::Identifier { name: name.into() })
    }

    pub fn int_literal(&mut self, value: i64) -> NodeIndex {
        self.alloc(SyntaxNodeData::IntLiteral { value })
    }

    pub fn data_type(&mut self, kind: DataTypeKind) -> NodeIndex {
        self.alloc(SyntaxNodeData::DataType { kind })
    }

    pub fn binary_expr(&mut self, op: BinaryOp, lhs: NodeIndex, rhs: NodeIndex) -> NodeIndex {
        self.alloc(SyntaxNodeData::BinaryExpr { op, lhs, rhs })
    }

    pub fn param_decl(
        &mut self,
        name: impl Into<String>,
        is_local: bool,
        data_type: NodeIndex,
        default_value: NodeIndex,
    ) -> NodeIndex {
        self.alloc(SyntaxNodeData::ParamDecl {
            name: name.into(),
            is_local,
            data_type,
            default_value,
        })
    }

    pub fn data_decl(
        &mut self,
        name: impl Into<String>,
        data_type: NodeIndex,
        initializer: NodeIndex,
    ) -> NodeIndex {
        self.alloc(SyntaxNodeData::DataDecl {
            name: name.into(),
            data_type,
            initializer,
        })
    }

    pub fn function_decl(&mut self, name: impl Into<String>, body: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(SyntaxNodeData::FunctionDecl {
            name: name.into(),
            body: NodeList::new(body),
        })
    }

    pub fn module_decl(
        &mut self,
        name: impl Into<String>,
        port_params: Vec<NodeIndex>,
        body_params: Vec<NodeIndex>,
        items: Vec<NodeIndex>,
    ) -> NodeIndex {
        self.alloc(SyntaxNodeData::ModuleDecl(DefinitionSyntax {
            name: name.into(),
            port_params: NodeList::new(port_params),
            body_params: NodeList::new(body_params),
            items: NodeList::new(items),
        }))
    }

    pub fn interface_decl(
        &mut self,
        name: impl Into<String>,
        port_params: Vec<NodeIndex>,
        body_params: Vec<NodeIndex>,
        items: Vec<NodeIndex>,
    ) -> NodeIndex {
        self.alloc(SyntaxNodeData::InterfaceDecl(DefinitionSyntax {
            name: name.into(),
            port_params: NodeList::new(port_params),
            body_params: NodeList::new(body_params),
            items: NodeList::new(items),
        }))
    }

    pub fn program_decl(
        &mut self,
        name: impl Into<String>,
        port_params: Vec<NodeIndex>,
        body_params: Vec<NodeIndex>,
        items: Vec<NodeIndex>,
    ) -> NodeIndex {
        self.alloc(SyntaxNodeData::ProgramDecl(DefinitionSyntax {
            name: name.into(),
            port_params: NodeList::new(port_params),
            body_params: NodeList::new(body_params),
            items: NodeList::new(items),
        }))
    }

    pub fn package_decl(&mut self, name: impl Into<String>, items: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(SyntaxNodeData::PackageDecl {
            name: name.into(),
            items: NodeList::new(items),
        })
    }

    pub fn explicit_import(
        &mut self,
        package: impl Into<String>,
        imported_name: impl Into<String>,
    ) -> NodeIndex {
        self.alloc(SyntaxNodeData::ExplicitImport {
            package: package.into(),
            imported_name: imported_name.into(),
        })
    }

    pub fn wildcard_import(&mut self, package: impl Into<String>) -> NodeIndex {
        self.alloc(SyntaxNodeData::WildcardImport {
            package: package.into(),
        })
    }

    pub fn hierarchy_instantiation(
        &mut self,
        definition_name: impl Into<String>,
        param_assignments: Vec<ParamAssignSyntax>,
        instances: Vec<InstanceNameSyntax>,
    ) -> NodeIndex {
        self.alloc(SyntaxNodeData::HierarchyInstantiation {
            definition_name: definition_name.into(),
            param_assignments,
            instances,
        })
    }

    pub fn if_generate(
        &mut self,
        condition: NodeIndex,
        then_block: NodeIndex,
        else_block: NodeIndex,
    ) -> NodeIndex {
        self.alloc(SyntaxNodeData::IfGenerate {
            condition,
            then_block,
            else_block,
        })
    }

    pub fn loop_generate(
        &mut self,
        genvar_name: impl Into<String>,
        init_value: NodeIndex,
        condition: NodeIndex,
        step: NodeIndex,
        body: NodeIndex,
    ) -> NodeIndex {
        self.alloc(SyntaxNodeData::LoopGenerate {
            genvar_name: genvar_name.into(),
            init_value,
            condition,
            step,
            body,
        })
    }

    pub fn generate_block(&mut self, label: impl Into<String>, items: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(SyntaxNodeData::GenerateBlock {
            label: label.into(),
            items: NodeList::new(items),
        })
    }

    pub fn expr_statement(&mut self, expr: NodeIndex) -> NodeIndex {
        self.alloc(SyntaxNodeData::ExprStatement { expr })
    }

    pub fn source_unit(&mut self, items: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(SyntaxNodeData::SourceUnit {
            items: NodeList::new(items),
        })
    }

    #[must_use]
    pub fn finish(self) -> SyntaxTree {
        self.tree
    }

    #[must_use]
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_module_with_a_port_parameter() {
        let mut b = TreeBuilder::new();
        let ty = b.data_type(DataTypeKind::Int);
        let default = b.int_literal(8);
        let p = b.param_decl("WIDTH", false, ty, default);
        let module = b.module_decl("counter", vec![p], vec![], vec![]);
        let tree = b.finish();

        let def = tree.get_definition(module).expect("module decl");
        assert_eq!(def.name, "counter");
        assert_eq!(def.port_params.nodes, vec![p]);
        assert!(def.body_params.nodes.is_empty());
    }

    #[test]
    fn builds_an_instantiation_with_named_param_assignment() {
        let mut b = TreeBuilder::new();
        let value = b.int_literal(16);
        let inst = b.hierarchy_instantiation(
            "counter",
            vec![ParamAssignSyntax {
                name: Some("WIDTH".into()),
                value,
            }],
            vec![InstanceNameSyntax { name: "u0".into() }],
        );
        let tree = b.finish();

        let (def_name, assigns, instances) =
            tree.get_hierarchy_instantiation(inst).expect("instantiation");
        assert_eq!(def_name, "counter");
        assert_eq!(assigns[0].name.as_deref(), Some("WIDTH"));
        assert_eq!(instances[0].name, "u0");
    }
}
