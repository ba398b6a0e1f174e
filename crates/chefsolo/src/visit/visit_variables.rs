use super::Visit;
use hcl::{
    template::{Directive, Element},
    Expression, ObjectKey, Operation, Template, TraversalOperator, Variable,
};

/// Recursively visit all [hcl::Variable]s
///
/// Variables bound by `for` expressions and directives are visited as well.
pub trait VisitVariables {
    fn visit_variables(&self, visitor: &mut dyn Visit<Variable>);
}

impl VisitVariables for Expression {
    fn visit_variables(&self, visitor: &mut dyn Visit<Variable>) {
        match self {
            Expression::Variable(variable) => visitor.visit(variable),
            Expression::Traversal(traversal) => {
                traversal.expr.visit_variables(visitor);
                for operator in &traversal.operators {
                    if let TraversalOperator::Index(index) = operator {
                        index.visit_variables(visitor);
                    }
                }
            }
            Expression::Array(array) => {
                for expr in array {
                    expr.visit_variables(visitor);
                }
            }
            Expression::Object(object) => {
                for (key, value) in object {
                    if let ObjectKey::Expression(key) = key {
                        key.visit_variables(visitor);
                    }
                    value.visit_variables(visitor);
                }
            }
            Expression::TemplateExpr(template_expr) => {
                // unparsable templates fail later, during evaluation
                if let Ok(template) = Template::from_expr(template_expr) {
                    template.visit_variables(visitor);
                }
            }
            Expression::FuncCall(call) => {
                for arg in &call.args {
                    arg.visit_variables(visitor);
                }
            }
            Expression::Parenthesis(expr) => {
                expr.visit_variables(visitor);
            }
            Expression::Conditional(cond) => {
                cond.cond_expr.visit_variables(visitor);
                cond.true_expr.visit_variables(visitor);
                cond.false_expr.visit_variables(visitor);
            }
            Expression::Operation(operation) => match &**operation {
                Operation::Binary(binop) => {
                    binop.lhs_expr.visit_variables(visitor);
                    binop.rhs_expr.visit_variables(visitor);
                }
                Operation::Unary(unop) => {
                    unop.expr.visit_variables(visitor);
                }
            },
            Expression::ForExpr(forexpr) => {
                forexpr.collection_expr.visit_variables(visitor);
                forexpr
                    .key_expr
                    .iter()
                    .for_each(|e| e.visit_variables(visitor));
                forexpr.value_expr.visit_variables(visitor);
                forexpr
                    .cond_expr
                    .iter()
                    .for_each(|e| e.visit_variables(visitor));
            }
            _ => {}
        }
    }
}

impl VisitVariables for Template {
    fn visit_variables(&self, visitor: &mut dyn Visit<Variable>) {
        for element in self.elements() {
            match element {
                Element::Interpolation(interpolation) => {
                    interpolation.expr.visit_variables(visitor);
                }
                Element::Directive(directive) => match directive {
                    Directive::If(ifdir) => {
                        ifdir.cond_expr.visit_variables(visitor);
                        ifdir.true_template.visit_variables(visitor);
                        ifdir
                            .false_template
                            .iter()
                            .for_each(|t| t.visit_variables(visitor));
                    }
                    Directive::For(fordir) => {
                        fordir.collection_expr.visit_variables(visitor);
                        fordir.template.visit_variables(visitor);
                    }
                },
                Element::Literal(_) => {}
            }
        }
    }
}
