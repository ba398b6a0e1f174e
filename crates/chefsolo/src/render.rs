//! render pipeline
//!
//! 1. [assemble] renders each attribute level with the user variables and the computed variables
//! 2. [AttributeDocument::with_run_spec] injects `id` and the run spec
//! 3. the document is serialized and interpolated once more, resolving what the levels left behind
//! 4. the result is checked to be a json object, normalized and hashed
use crate::document::{assemble, json_kind, AttributeTemplates, Level, RunSpec, Target};
use crate::error::{Error, Result};
use crate::interpolate;
use crate::vars::VariableScope;
use sha2::{Digest, Sha256};

/// A rendered document and its content hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    /// compact json, keys sorted
    pub text: String,
    /// hex encoded sha256 of `text`
    pub hash: String,
}

/// Renders one document
///
/// Any failing stage aborts the render.
#[tracing::instrument(level = "debug", skip(templates, scope, run_spec))]
pub fn render_document(
    target: Target,
    templates: &AttributeTemplates,
    scope: &VariableScope,
    run_spec: &RunSpec,
    node_id: &str,
) -> Result<RenderResult> {
    let scope = scope.with(run_spec.variables(node_id));
    let document = assemble(templates, &scope, target)?.with_run_spec(run_spec, node_id);
    let assembled =
        serde_json::to_string(&document).map_err(|err| Error::parse(Level::Document, err))?;

    // remaining markers sit inside json strings
    let rendered = interpolate::render(Level::Document, &assembled, &scope.json_escaped())?;
    tracing::trace!(%rendered, "document rendered");

    let value: serde_json::Value =
        serde_json::from_str(&rendered).map_err(|err| Error::parse(Level::Document, err))?;
    if !value.is_object() {
        return Err(Error::Type {
            level: Level::Document,
            message: format!("expected a JSON object, got {}", json_kind(&value)),
        });
    }

    let text = value.to_string();
    let hash = content_hash(&text);
    Ok(RenderResult { text, hash })
}

/// Hex encoded sha256 of `content`
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
