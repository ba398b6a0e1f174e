//! visitor pattern helpers
mod visit_variables;
pub use visit_variables::VisitVariables;

use std::collections::BTreeSet;

/// Visitor that inspects its subjects
pub trait Visit<T> {
    fn visit(&mut self, value: &T);
}

// blanket impl for FnMut
impl<T, F> Visit<T> for F
where
    F: FnMut(&T),
{
    fn visit(&mut self, value: &T) {
        self(value)
    }
}

/// Names of all variables referenced by `subject`
pub fn referenced_variables(subject: &dyn VisitVariables) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    subject.visit_variables(&mut |variable: &hcl::Variable| {
        names.insert(variable.as_str().to_string());
    });
    names
}
