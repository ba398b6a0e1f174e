//! # chefsolo - render chef-solo attribute documents
//!
//! `chefsolo` renders the json documents chef-solo reads on startup (`dna.json` or `node.json`) from attribute
//! templates, substitution variables and a run list or policyfile.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `chefsolo` works internally.
//!
//! ### Definitions
//!
//! A document is described by a `template_chef_solo` data source, written in HCL the same way it is written in a
//! terraform configuration:
//!
//! ```hcl
//! data "template_chef_solo" "web" {
//!   node_id              = "web-1"
//!   automatic_attributes = "{\"fqdn\": \"$${id}.example.com\"}"
//!   default_attributes   = <<EOT
//! {"nginx": {"port": $${port}}}
//! EOT
//!   run_list             = ["recipe[base]", "role[web]"]
//!   vars                 = { port = 8080 }
//! }
//! ```
//!
//! Files are loaded into [hcl_documents::HclDocuments] which keeps track of where each block came from.
//! [definitions::Definitions::new] checks the structure (only `data "template_chef_solo" "<name>"` blocks),
//! evaluates the arguments and deserializes them into a [data_source::ChefSoloConfig].
//!
//! Note that arguments are evaluated as HCL first: `$${port}` in the file is the template `${port}`.
//!
//! ### Variables
//!
//! `vars` may only contain strings, numbers and booleans ([vars::validate_primitives]). Validated variables are
//! turned into a [vars::VariableScope] which maps each name to its substitution text.
//!
//! ### Rendering
//!
//! see [render::render_document]
//!
//! | **stage** | **input** | **scope** | **output** |
//! |-----------|-----------|-----------|------------|
//! | attribute levels ([document::assemble]) | `automatic_attributes`, `default_attributes` | `vars` + computed | one object per level |
//! | run spec ([document::AttributeDocument::with_run_spec]) | assembled object | - | object with `id`, `run_list` or `policy_name`/`policy_group` |
//! | document ([interpolate::render]) | serialized object | `vars` + computed | final json |
//!
//! Attribute levels may reference variables that come from the run spec ([document::COMPUTED_VARIABLES], e.g.
//! `"fqdn": "${replace(id, "_", "-")}"`). The run spec is chosen before any level is rendered, so `id` and the
//! injected fields are in scope from the start. A computed variable the run spec does not provide (`policy_name`
//! next to a run list) is kept as a marker by [interpolate::render_partial], which also re-escapes all literal
//! text, and fails as an unknown variable in the second stage.
//!
//! Both shapes ([document::Target]) are rendered from the same inputs. The node shape keeps the levels apart, the
//! dna shape merges them: a default attribute replaces an automatic attribute with the same name.
//!
//! ### Output
//!
//! The rendered json is normalized (compact, keys sorted) and identified by its sha256
//! ([render::RenderResult]). [data_source::ChefSoloData] carries both documents plus the pass-through arguments.
//!
pub mod data_source;
pub mod definitions;
pub mod document;
pub mod error;
mod functions;
pub mod hcl_documents;
pub mod interpolate;
pub mod render;
pub mod value;
pub mod vars;
mod visit;

pub use error::{Error, Result};
