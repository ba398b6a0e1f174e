//! the `template_chef_solo` data source
//!
//! [ChefSoloConfig] holds the arguments of one data source definition, [ChefSoloData] the computed attributes.
use crate::document::{AttributeTemplates, RunSpec, Target};
use crate::error::{Error, Result, ValidationError};
use crate::render::render_document;
use crate::value::Value;
use crate::vars::VariableScope;

/// Name of the data source type
pub const DATA_SOURCE_TYPE: &str = "template_chef_solo";

/// Arguments of a `template_chef_solo` definition
///
/// `policy_group`, `named_run_list` and `environment` fall back to their defaults when unset. They are kept
/// optional so conflicts are only reported for arguments that were actually given.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChefSoloConfig {
    pub node_id: String,
    #[serde(default)]
    pub automatic_attributes: Option<String>,
    #[serde(default)]
    pub default_attributes: Option<String>,
    #[serde(default)]
    pub vars: indexmap::IndexMap<String, Value>,
    #[serde(default)]
    pub run_list: Option<Vec<String>>,
    #[serde(default)]
    pub policy_name: Option<String>,
    #[serde(default)]
    pub policy_group: Option<String>,
    #[serde(default)]
    pub named_run_list: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

impl ChefSoloConfig {
    pub const DEFAULT_POLICY_GROUP: &'static str = "local";
    pub const DEFAULT_ENVIRONMENT: &'static str = "local";

    pub fn policy_group(&self) -> &str {
        self.policy_group
            .as_deref()
            .unwrap_or(Self::DEFAULT_POLICY_GROUP)
    }

    pub fn environment(&self) -> &str {
        self.environment
            .as_deref()
            .unwrap_or(Self::DEFAULT_ENVIRONMENT)
    }

    pub fn named_run_list(&self) -> &str {
        self.named_run_list.as_deref().unwrap_or_default()
    }

    pub fn policy_name(&self) -> &str {
        self.policy_name.as_deref().unwrap_or_default()
    }

    pub fn run_list(&self) -> &[String] {
        self.run_list.as_deref().unwrap_or_default()
    }

    /// Checks arguments that can not be combined
    ///
    /// `run_list` conflicts with `policy_name`, `policy_group` and `named_run_list`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.run_list.is_none() {
            return Ok(());
        }

        let conflicts: Vec<String> = [
            ("named_run_list", self.named_run_list.is_some()),
            ("policy_group", self.policy_group.is_some()),
            ("policy_name", self.policy_name.is_some()),
        ]
        .into_iter()
        .filter(|(_, given)| *given)
        .map(|(name, _)| name.to_string())
        .collect();

        if conflicts.is_empty() {
            return Ok(());
        }

        Err(ValidationError::Conflict {
            field: "run_list".into(),
            conflicts,
        })
    }

    pub fn templates(&self) -> AttributeTemplates {
        AttributeTemplates::new(
            self.automatic_attributes.clone(),
            self.default_attributes.clone(),
        )
    }

    /// Renders the node and dna documents
    #[tracing::instrument(level = "debug", skip_all, fields(node_id = %self.node_id))]
    pub fn render(&self) -> Result<ChefSoloData> {
        self.validate()?;

        if self.node_id.is_empty() {
            return Err(Error::Configuration("node_id must not be empty".into()));
        }

        let scope = VariableScope::from_vars(&self.vars)?;
        let run_spec = RunSpec::select(self.run_list(), self.policy_name(), self.policy_group())?;
        let templates = self.templates();

        let node = render_document(Target::Node, &templates, &scope, &run_spec, &self.node_id)?;
        let dna = render_document(Target::Dna, &templates, &scope, &run_spec, &self.node_id)?;

        Ok(ChefSoloData {
            id: node.hash,
            node: node.text,
            dna: dna.text,
            use_policyfile: run_spec.uses_policyfile(),
            node_id: self.node_id.clone(),
            environment: self.environment().to_string(),
            named_run_list: self.named_run_list().to_string(),
            policy_name: self.policy_name().to_string(),
            policy_group: self.policy_group().to_string(),
        })
    }
}

/// Computed attributes of a `template_chef_solo` data source
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChefSoloData {
    /// sha256 of `node`
    pub id: String,
    pub node: String,
    pub dna: String,
    pub use_policyfile: bool,
    pub node_id: String,
    pub environment: String,
    pub named_run_list: String,
    pub policy_name: String,
    pub policy_group: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config(json: serde_json::Value) -> ChefSoloConfig {
        serde_json::from_value(json).expect("valid config")
    }

    fn parsed(text: &str) -> serde_json::Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn defaults() {
        let config = config(json!({"node_id": "n"}));
        assert_eq!(config.policy_group(), "local");
        assert_eq!(config.environment(), "local");
        assert_eq!(config.named_run_list(), "");
        assert!(config.run_list().is_empty());
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        let result = serde_json::from_value::<ChefSoloConfig>(json!({"node_id": "n", "typo": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn run_list_conflicts() {
        let config = config(json!({
            "node_id": "n",
            "run_list": ["a"],
            "policy_name": "p",
            "policy_group": "g",
        }));

        let err = config.render().unwrap_err();
        assert_eq!(
            err.to_string(),
            "run_list: conflicts with policy_group, policy_name"
        );
    }

    #[test]
    fn missing_run_spec() {
        let err = config(json!({"node_id": "n"})).render().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{err:?}");
        assert_eq!(
            err.to_string(),
            "neither run_list nor policy_name/policy_group has been set"
        );
    }

    #[test]
    fn empty_run_list_is_missing_run_spec() {
        let err = config(json!({"node_id": "n", "run_list": []}))
            .render()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{err:?}");
    }

    #[test]
    fn non_primitive_vars() {
        let err = config(json!({
            "node_id": "n",
            "run_list": ["a"],
            "vars": {"list": [], "map": {}},
        }))
        .render()
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "vars: cannot contain non-primitives; bad keys: list (list), map (map)"
        );
    }

    #[test]
    fn policyfile() {
        let data = config(json!({
            "node_id": "node_id",
            "default_attributes": r#"{"toto": ${a}}"#,
            "automatic_attributes": r#"{"titi": "pi"}"#,
            "policy_name": "a",
            "policy_group": "b",
            "vars": {"a": r#"["he", "llo"]"#},
        }))
        .render()
        .unwrap();

        assert!(data.use_policyfile);
        assert_eq!(
            parsed(&data.dna),
            json!({"toto": ["he", "llo"], "titi": "pi", "policy_name": "a", "policy_group": "b", "id": "node_id"})
        );
        assert_eq!(
            parsed(&data.node),
            json!({"policy_name": "a", "policy_group": "b", "default": {"toto": ["he", "llo"]}, "automatic": {"titi": "pi"}, "id": "node_id"})
        );
        assert!(parsed(&data.node).get("run_list").is_none());
    }

    #[test]
    fn run_list_outputs() {
        let data = config(json!({
            "node_id": "node_id",
            "default_attributes": r#"{"port": ${port}}"#,
            "run_list": ["a", "b"],
            "vars": {"port": 8080},
            "environment": "prod",
        }))
        .render()
        .unwrap();

        assert!(!data.use_policyfile);
        assert_eq!(data.environment, "prod");
        assert_eq!(data.policy_group, "local");
        assert_eq!(data.id, crate::render::content_hash(&data.node));
        assert_eq!(
            parsed(&data.dna),
            json!({"port": 8080, "run_list": ["a", "b"], "id": "node_id"})
        );
    }
}
