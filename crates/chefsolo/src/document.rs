//! attribute documents
//!
//! A chef-solo run takes its attributes from a single json file. Two shapes are in use:
//!
//! - **node** (`node.json`): each attribute level is kept under its own key
//!   `{"automatic": {...}, "default": {...}, "id": ..., "run_list": [...]}`
//! - **dna** (`dna.json`): all levels are flattened into the top-level object
//!   `{..., "id": ..., "run_list": [...]}`
//!
//! [assemble] builds either shape from the attribute templates, [AttributeDocument::with_run_spec] adds the node
//! identity and what to run.
use crate::error::{Error, Result};
use crate::interpolate;
use crate::vars::VariableScope;
use serde_json::{Map, Value};

/// Variables that only become known once a [RunSpec] is chosen
///
/// When a scope lacks one of these, references to it are left in place while the attribute levels are rendered
/// and resolved against the document afterwards.
pub const COMPUTED_VARIABLES: [&str; 4] = ["id", "run_list", "policy_name", "policy_group"];

pub(crate) const MISSING_RUN_SPEC: &str = "neither run_list nor policy_name/policy_group has been set";

/// Where in a render something happened: one of the attribute levels or the assembled document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Automatic,
    Default,
    Document,
}

/// Attribute precedence level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeLevel {
    Automatic,
    Default,
}

impl AttributeLevel {
    /// Key of this level in the node shape
    pub fn namespace(&self) -> &'static str {
        match self {
            AttributeLevel::Automatic => "automatic",
            AttributeLevel::Default => "default",
        }
    }
}

impl From<AttributeLevel> for Level {
    fn from(level: AttributeLevel) -> Self {
        match level {
            AttributeLevel::Automatic => Level::Automatic,
            AttributeLevel::Default => Level::Default,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Automatic => f.write_str("automatic_attributes"),
            Level::Default => f.write_str("default_attributes"),
            Level::Document => f.write_str("document"),
        }
    }
}

/// Shape of the rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// levels namespaced under `automatic` and `default`
    Node,
    /// levels flattened into one object
    Dna,
}

/// The raw attribute templates
///
/// Missing and blank templates are skipped.
#[derive(Debug, Clone, Default, derive_new::new)]
pub struct AttributeTemplates {
    pub automatic: Option<String>,
    pub default: Option<String>,
}

impl AttributeTemplates {
    /// Present levels in merge order
    fn levels(&self) -> impl Iterator<Item = (AttributeLevel, &str)> {
        [
            (AttributeLevel::Automatic, &self.automatic),
            (AttributeLevel::Default, &self.default),
        ]
        .into_iter()
        .filter_map(|(level, template)| {
            template
                .as_deref()
                .filter(|template| !template.trim().is_empty())
                .map(|template| (level, template))
        })
    }
}

/// Assembled attributes, not yet fully interpolated
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct AttributeDocument(Map<String, Value>);

impl AttributeDocument {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Adds `id` and the entries of `run_spec`
    ///
    /// Existing keys of the same name are replaced.
    pub fn with_run_spec(mut self, run_spec: &RunSpec, node_id: &str) -> Self {
        self.0.insert("id".into(), node_id.into());

        match run_spec {
            RunSpec::RunList(run_list) => {
                self.0.insert("run_list".into(), run_list.clone().into());
            }
            RunSpec::Policy { name, group } => {
                self.0.insert("policy_name".into(), name.as_str().into());
                self.0.insert("policy_group".into(), group.as_str().into());
            }
        }

        self
    }
}

/// Renders each attribute level and merges them into one document
///
/// Every present level is interpolated against `scope` and must produce a json object. References to
/// [COMPUTED_VARIABLES] missing from `scope` stay in the output, as do `$${...}` escapes, so the document is
/// still a template.
///
/// With [Target::Dna] the top-level keys of all levels are copied into one object. **Key collisions are not
/// detected**: automatic attributes are merged first, default attributes second, so a default attribute silently
/// replaces an automatic attribute of the same name.
#[tracing::instrument(level = "debug", skip(templates, scope))]
pub fn assemble(
    templates: &AttributeTemplates,
    scope: &VariableScope,
    target: Target,
) -> Result<AttributeDocument> {
    let mut document = Map::new();

    for (level, raw) in templates.levels() {
        let attributes = render_level(level.into(), raw, scope)?;

        match target {
            Target::Node => {
                document.insert(level.namespace().into(), Value::Object(attributes));
            }
            Target::Dna => {
                for (key, value) in attributes {
                    if document.contains_key(&key) {
                        tracing::debug!(attributes = %Level::from(level), %key, "attribute replaced");
                    }
                    document.insert(key, value);
                }
            }
        }
    }

    Ok(AttributeDocument(document))
}

fn render_level(level: Level, raw: &str, scope: &VariableScope) -> Result<Map<String, Value>> {
    let deferred: Vec<&str> = COMPUTED_VARIABLES
        .into_iter()
        .filter(|name| !scope.contains(name))
        .collect();

    let rendered = interpolate::render_partial(level, raw, scope, &deferred)?;
    tracing::trace!(attributes = %level, %rendered, "level rendered");

    match serde_json::from_str(&rendered).map_err(|err| Error::parse(level, err))? {
        Value::Object(attributes) => Ok(attributes),
        other => Err(Error::Type {
            level,
            message: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// What chef-solo runs
#[derive(Debug, Clone, PartialEq)]
pub enum RunSpec {
    RunList(Vec<String>),
    Policy { name: String, group: String },
}

impl RunSpec {
    /// Picks the policyfile when `policy_name` is set, the run list otherwise
    pub fn select(run_list: &[String], policy_name: &str, policy_group: &str) -> Result<Self> {
        if !policy_name.is_empty() {
            return Ok(RunSpec::Policy {
                name: policy_name.to_string(),
                group: policy_group.to_string(),
            });
        }

        if run_list.is_empty() {
            return Err(Error::Configuration(MISSING_RUN_SPEC.to_string()));
        }

        Ok(RunSpec::RunList(run_list.to_vec()))
    }

    pub fn uses_policyfile(&self) -> bool {
        matches!(self, RunSpec::Policy { .. })
    }

    /// Computed variables for `node_id` and this run spec
    ///
    /// `run_list` is the json array text of the run list.
    pub fn variables(&self, node_id: &str) -> Vec<(&'static str, String)> {
        let mut variables = vec![("id", node_id.to_string())];

        match self {
            RunSpec::RunList(run_list) => {
                variables.push(("run_list", Value::from(run_list.clone()).to_string()));
            }
            RunSpec::Policy { name, group } => {
                variables.push(("policy_name", name.clone()));
                variables.push(("policy_group", group.clone()));
            }
        }

        variables
    }
}

/// Sets `id` and either `run_list` or `policy_name`/`policy_group`
///
/// Fails when neither `policy_name` nor `run_list` is set. Whether both were given is checked by the caller
/// ([crate::data_source::ChefSoloConfig::validate]); here `policy_name` takes precedence.
pub fn inject_run_spec(
    document: AttributeDocument,
    run_list: &[String],
    policy_name: &str,
    policy_group: &str,
    node_id: &str,
) -> Result<AttributeDocument> {
    let run_spec = RunSpec::select(run_list, policy_name, policy_group)?;
    Ok(document.with_run_spec(&run_spec, node_id))
}
