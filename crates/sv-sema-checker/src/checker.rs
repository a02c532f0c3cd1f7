//! The `SemanticChecker` trait and a `StubChecker` implementation of it.

use sv_sema_common::Location;
use sv_sema_syntax::{BinaryOp, DataTypeKind, NodeIndex, NodeList, SyntaxTree};
use tracing::{debug, span, Level};

use crate::value::{ConstantValue, Expression, Statement, StatementList, TypeKind, TypeSymbol};

/// What a `SemanticChecker`'s caller (the sv-sema core) exposes back to the
/// checker so it can resolve identifiers it encounters while binding.
///
/// The core's own `Scope` type implements this; living here rather than on
/// `sv-sema` avoids a dependency cycle between the two crates.
pub trait ScopeLookup {
    /// Resolve `name` to a constant value as seen from this scope, or
    /// `None` if no such name is visible.
    fn lookup_constant(&self, name: &str) -> Option<ConstantValue>;
}

/// The expression/statement checker consumed by lazy binding cells.
/// Generic over the caller's scope type rather than a concrete one so
/// this crate never has to depend on `sv-sema`.
pub trait SemanticChecker<S: ScopeLookup> {
    fn bind_statement(&self, scope: &S, tree: &SyntaxTree, syntax: NodeIndex) -> Statement;
    fn bind_statement_list(
        &self,
        scope: &S,
        tree: &SyntaxTree,
        syntax_list: &NodeList,
    ) -> StatementList;
    fn bind_expression(&self, scope: &S, tree: &SyntaxTree, syntax: NodeIndex) -> Expression;
    fn bind_type(&self, scope: &S, tree: &SyntaxTree, syntax: NodeIndex) -> TypeSymbol;
    fn evaluate_constant(&self, expression: &Expression) -> ConstantValue;
    fn convert_constant(
        &self,
        value: ConstantValue,
        target_type: TypeSymbol,
        loc: Location,
    ) -> ConstantValue;
}

/// A minimal, literal-and-arithmetic-only checker. Exercises every lazy
/// cell kind end-to-end without implementing any real SystemVerilog typing
/// rule; good enough for the core's own tests, nothing more.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubChecker;

impl StubChecker {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S: ScopeLookup> SemanticChecker<S> for StubChecker {
    fn bind_statement(&self, _scope: &S, tree: &SyntaxTree, syntax: NodeIndex) -> Statement {
        Statement {
            is_bad: tree.get(syntax).is_none(),
        }
    }

    fn bind_statement_list(
        &self,
        scope: &S,
        tree: &SyntaxTree,
        syntax_list: &NodeList,
    ) -> StatementList {
        StatementList {
            statements: syntax_list
                .nodes
                .iter()
                .map(|&node| self.bind_statement(scope, tree, node))
                .collect(),
        }
    }

    fn bind_expression(&self, scope: &S, tree: &SyntaxTree, syntax: NodeIndex) -> Expression {
        let _span = span!(Level::DEBUG, "bind_expression", node = syntax.0).entered();

        if let Some(value) = tree.get_int_literal(syntax) {
            return Expression::Constant(ConstantValue::int(value));
        }
        if let Some(name) = tree.get_identifier_name(syntax) {
            return match scope.lookup_constant(name) {
                Some(value) => Expression::Constant(value),
                None => {
                    debug!(name, "identifier did not resolve to a constant");
                    Expression::Bad
                }
            };
        }
        if let Some((op, lhs, rhs)) = tree.get_binary_expr(syntax) {
            let lhs = self.bind_expression(scope, tree, lhs);
            let rhs = self.bind_expression(scope, tree, rhs);
            return Expression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Expression::Bad
    }

    fn bind_type(&self, _scope: &S, tree: &SyntaxTree, syntax: NodeIndex) -> TypeSymbol {
        match tree.get_data_type(syntax) {
            Some(DataTypeKind::Int) => TypeSymbol::new(TypeKind::Int, 32),
            Some(DataTypeKind::Logic) => TypeSymbol::new(TypeKind::Logic, 1),
            Some(DataTypeKind::String) => TypeSymbol::new(TypeKind::String, 0),
            None => TypeSymbol::bad(),
        }
    }

    fn evaluate_constant(&self, expression: &Expression) -> ConstantValue {
        match expression {
            Expression::Constant(value) => *value,
            Expression::Bad => ConstantValue::bad(),
            Expression::Binary { op, lhs, rhs } => {
                let lhs = self.evaluate_constant(lhs);
                let rhs = self.evaluate_constant(rhs);
                if lhs.is_bad() || rhs.is_bad() {
                    return ConstantValue::bad();
                }
                let width = lhs.width.max(rhs.width);
                let bits = match op {
                    BinaryOp::Add => lhs.bits + rhs.bits,
                    BinaryOp::Sub => lhs.bits - rhs.bits,
                    BinaryOp::Lt => i64::from(lhs.bits < rhs.bits),
                    BinaryOp::Le => i64::from(lhs.bits <= rhs.bits),
                    BinaryOp::Gt => i64::from(lhs.bits > rhs.bits),
                    BinaryOp::Ge => i64::from(lhs.bits >= rhs.bits),
                    BinaryOp::Eq => i64::from(lhs.bits == rhs.bits),
                    BinaryOp::Ne => i64::from(lhs.bits != rhs.bits),
                };
                ConstantValue::new(bits, width)
            }
        }
    }

    fn convert_constant(
        &self,
        value: ConstantValue,
        target_type: TypeSymbol,
        _loc: Location,
    ) -> ConstantValue {
        if value.is_bad() || target_type.is_bad() {
            return ConstantValue::bad();
        }
        ConstantValue::new(value.bits, target_type.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use sv_sema_syntax::builder::TreeBuilder;

    struct MapScope(HashMap<String, ConstantValue>);

    impl ScopeLookup for MapScope {
        fn lookup_constant(&self, name: &str) -> Option<ConstantValue> {
            self.0.get(name).copied()
        }
    }

    #[test]
    fn binds_int_literal() {
        let mut b = TreeBuilder::new();
        let lit = b.int_literal(42);
        let tree = b.finish();
        let scope = MapScope(HashMap::new());
        let checker = StubChecker::new();

        let expr = checker.bind_expression(&scope, &tree, lit);
        assert_eq!(checker.evaluate_constant(&expr), ConstantValue::int(42));
    }

    #[test]
    fn unresolved_identifier_binds_bad() {
        let mut b = TreeBuilder::new();
        let id = b.identifier("K");
        let tree = b.finish();
        let scope = MapScope(HashMap::new());
        let checker = StubChecker::new();

        let expr = checker.bind_expression(&scope, &tree, id);
        assert!(expr.is_bad());
        assert!(checker.evaluate_constant(&expr).is_bad());
    }

    #[test]
    fn binary_add_reduces() {
        let mut b = TreeBuilder::new();
        let lhs = b.int_literal(3);
        let rhs = b.int_literal(4);
        let add = b.binary_expr(BinaryOp::Add, lhs, rhs);
        let tree = b.finish();
        let scope = MapScope(HashMap::new());
        let checker = StubChecker::new();

        let expr = checker.bind_expression(&scope, &tree, add);
        assert_eq!(checker.evaluate_constant(&expr), ConstantValue::int(7));
    }

    #[test]
    fn identifier_resolves_through_scope() {
        let mut b = TreeBuilder::new();
        let id = b.identifier("K");
        let tree = b.finish();
        let mut map = HashMap::new();
        map.insert("K".to_string(), ConstantValue::int(10));
        let scope = MapScope(map);
        let checker = StubChecker::new();

        let expr = checker.bind_expression(&scope, &tree, id);
        assert_eq!(checker.evaluate_constant(&expr), ConstantValue::int(10));
    }
}
