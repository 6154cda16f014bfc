use super::VisitMut;
use hcl::{Expression, Operation};

/// Recursively visit all [hcl::Expression]s mutably
///
/// A node is visited before its children. When the visitor replaces a node, the children of the
/// replacement are visited.
pub trait VisitExpressionsMut {
    fn visit_expressions_mut(&mut self, visitor: &mut dyn VisitMut<Expression>);
}

impl VisitExpressionsMut for Expression {
    fn visit_expressions_mut(&mut self, visitor: &mut dyn VisitMut<Expression>) {
        visitor.visit_mut(self);

        match self {
            Expression::Array(array) => {
                for expr in array {
                    expr.visit_expressions_mut(visitor);
                }
            }
            // keys are left alone
            Expression::Object(object) => {
                for value in object.values_mut() {
                    value.visit_expressions_mut(visitor);
                }
            }
            Expression::Parenthesis(expr) => {
                expr.visit_expressions_mut(visitor);
            }
            Expression::Conditional(cond) => {
                cond.cond_expr.visit_expressions_mut(visitor);
                cond.true_expr.visit_expressions_mut(visitor);
                cond.false_expr.visit_expressions_mut(visitor);
            }
            Expression::Operation(operation) => match operation.as_mut() {
                Operation::Binary(binop) => {
                    binop.lhs_expr.visit_expressions_mut(visitor);
                    binop.rhs_expr.visit_expressions_mut(visitor);
                }
                Operation::Unary(unop) => {
                    unop.expr.visit_expressions_mut(visitor);
                }
            },
            _ => {}
        }
    }
}
