//! substitution variables
//!
//! User supplied variables are validated by [validate_primitives] and stored as text in a [VariableScope]. A scope
//! is never mutated after construction; [VariableScope::with] returns an augmented copy.
use crate::error::ValidationError;
use crate::value::Value;
use std::collections::BTreeMap;

/// Rejects every list, map or null value in `vars`
///
/// All keys are checked before returning so the error names every offending key (sorted by name).
pub fn validate_primitives(
    field: &str,
    vars: &indexmap::IndexMap<String, Value>,
) -> Result<(), ValidationError> {
    let mut bad_keys: Vec<_> = vars
        .iter()
        .filter(|(_, value)| !value.is_primitive())
        .map(|(key, value)| (key.clone(), value.kind()))
        .collect();

    if bad_keys.is_empty() {
        return Ok(());
    }

    bad_keys.sort();
    tracing::debug!(field, ?bad_keys, "non-primitive variables");

    Err(ValidationError::NonPrimitive {
        field: field.to_string(),
        bad_keys,
    })
}

/// Flat, immutable mapping of variable names to their substitution text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableScope {
    vars: BTreeMap<String, String>,
}

impl VariableScope {
    /// Validates user variables and builds a scope from them
    pub fn from_vars(vars: &indexmap::IndexMap<String, Value>) -> Result<Self, ValidationError> {
        validate_primitives("vars", vars)?;

        Ok(vars
            .iter()
            .filter_map(|(key, value)| Some((key.clone(), value.as_substitution()?)))
            .collect())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Copy of this scope with `entries` added
    ///
    /// Entries replace existing variables of the same name.
    pub fn with<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars = self.vars.clone();
        vars.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self { vars }
    }

    /// Copy of this scope where each value is escaped for use inside a JSON string literal
    pub fn json_escaped(&self) -> Self {
        self.vars
            .iter()
            .map(|(key, value)| (key.clone(), escape_json_string(value)))
            .collect()
    }

    /// Evaluation context holding every variable and the builtin functions
    pub(crate) fn context(&self) -> hcl::eval::Context<'static> {
        let mut context = hcl::eval::Context::new();
        crate::functions::declare_builtins(&mut context);

        for (key, value) in &self.vars {
            context.declare_var(hcl::Identifier::unchecked(key), value.clone());
        }

        context
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableScope {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// `value` as it appears between the quotes of a JSON string
pub(crate) fn escape_json_string(value: &str) -> String {
    let quoted = serde_json::Value::from(value).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

#[cfg(test)]
mod test {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn vars(json: serde_json::Value) -> IndexMap<String, Value> {
        serde_json::from_value(json).expect("valid vars")
    }

    #[test]
    fn lists_are_invalid() {
        let err = validate_primitives("vars", &vars(serde_json::json!({"list": []}))).unwrap_err();
        assert!(err
            .to_string()
            .contains("vars: cannot contain non-primitives"));
    }

    #[test]
    fn maps_are_invalid() {
        let err = validate_primitives("vars", &vars(serde_json::json!({"map": {}}))).unwrap_err();
        assert!(err
            .to_string()
            .contains("vars: cannot contain non-primitives"));
    }

    #[test]
    fn primitives_are_valid() {
        let vars = vars(serde_json::json!({
            "string": "foo",
            "int": 1,
            "bool": true,
            "float": 1.0,
        }));
        assert_eq!(validate_primitives("vars", &vars), Ok(()));
    }

    #[test]
    fn every_bad_key_is_reported() {
        let vars = vars(serde_json::json!({
            "zeta": {"a": 1},
            "fine": "ok",
            "alpha": [1],
            "nothing": null,
        }));

        let err = validate_primitives("vars", &vars).unwrap_err();
        assert_eq!(
            err.to_string(),
            "vars: cannot contain non-primitives; bad keys: alpha (list), nothing (null), zeta (map)"
        );
    }

    #[test]
    fn scope_from_vars() {
        let scope = VariableScope::from_vars(&vars(serde_json::json!({
            "name": "web",
            "port": 8080,
            "debug": false,
        })))
        .unwrap();

        assert_eq!(scope.get("name"), Some("web"));
        assert_eq!(scope.get("port"), Some("8080"));
        assert_eq!(scope.get("debug"), Some("false"));
        assert_eq!(scope.len(), 3);
        assert!(VariableScope::from_vars(&IndexMap::new()).unwrap().is_empty());
    }

    #[test]
    fn with_leaves_original_untouched() {
        let scope: VariableScope = [("a", "1")].into_iter().collect();
        let augmented = scope.with([("b", "2"), ("a", "3")]);

        assert_eq!(scope.get("a"), Some("1"));
        assert!(!scope.contains("b"));
        assert_eq!(augmented.get("a"), Some("3"));
        assert_eq!(augmented.get("b"), Some("2"));
    }

    #[test]
    fn json_escaping() {
        let scope: VariableScope = [("a", r#"say "hi"\"#)].into_iter().collect();
        assert_eq!(scope.json_escaped().get("a"), Some(r#"say \"hi\"\\"#));
    }
}
