//! Collection of `template_chef_solo` definitions
use crate::data_source::{ChefSoloConfig, ChefSoloData, DATA_SOURCE_TYPE};
use crate::hcl_documents::{HclDocuments, Source};
use hcl::eval::Evaluate;

/// All valid `data "template_chef_solo" "<name>"` blocks of some HCL documents
#[derive(Debug)]
pub struct Definitions {
    definitions: indexmap::IndexMap<String, Definition>,
}

#[derive(Debug)]
pub struct Definition {
    pub block_index: usize,
    pub source: Source,
    pub config: ChefSoloConfig,
}

impl Definitions {
    pub fn new(hcl_documents: &HclDocuments) -> Result<Self, DefinitionErrors> {
        let mut definitions: indexmap::IndexMap<String, Definition> = Default::default();
        let mut e = DefinitionErrors::new();

        for (index, _source, _attribute) in hcl_documents.attributes() {
            e.log(Issue::RootAttribute(index))
        }

        for (index, source, block) in hcl_documents.blocks() {
            if block.ident.value().as_str() != "data" {
                e.log(Issue::UnknownBlockType(index));
                continue;
            }

            let [kind, name] = block.labels.as_slice() else {
                e.log(Issue::DataBlockLabels(index));
                continue;
            };

            if kind.as_str() != DATA_SOURCE_TYPE {
                e.log(Issue::UnsupportedDataSource {
                    index,
                    kind: kind.as_str().to_string(),
                });
                continue;
            }

            if let Some(existing) = definitions.get(name.as_str()) {
                e.log(Issue::DuplicateName {
                    existing: existing.block_index,
                    new: index,
                });
                continue;
            }

            if block.body.blocks().next().is_some() {
                e.log(Issue::NestedBlock(index));
                continue;
            }

            let mut arguments = serde_json::Map::new();
            let mut valid = true;
            for attribute in block.body.attributes() {
                let key = attribute.key.value().as_str().to_string();
                let expr: hcl::Expression = attribute.value.clone().into();

                let value = match expr.evaluate(&hcl::eval::Context::new()) {
                    Ok(value) => value,
                    Err(err) => {
                        e.log(Issue::InvalidArgument {
                            index,
                            argument: key,
                            message: err.to_string(),
                        });
                        valid = false;
                        continue;
                    }
                };

                match serde_json::to_value(&value) {
                    Ok(value) => {
                        arguments.insert(key, value);
                    }
                    Err(err) => {
                        e.log(Issue::InvalidArgument {
                            index,
                            argument: key,
                            message: err.to_string(),
                        });
                        valid = false;
                    }
                }
            }

            if !valid {
                continue;
            }

            match serde_json::from_value(serde_json::Value::Object(arguments)) {
                Ok(config) => {
                    tracing::debug!(name = name.as_str(), "definition loaded");
                    definitions.insert(
                        name.as_str().to_string(),
                        Definition {
                            block_index: index,
                            source: source.clone(),
                            config,
                        },
                    );
                }
                Err(err) => e.log(Issue::InvalidDefinition {
                    index,
                    message: err.to_string(),
                }),
            }
        }

        if !e.issues.is_empty() {
            return Err(e);
        }

        Ok(Self { definitions })
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Definition)> {
        self.definitions
            .iter()
            .map(|(name, definition)| (name.as_str(), definition))
    }

    /// Renders every definition, in definition order
    pub fn render(&self) -> anyhow::Result<indexmap::IndexMap<String, ChefSoloData>> {
        self.iter()
            .map(|(name, definition)| Ok((name.to_string(), definition.render(name)?)))
            .collect()
    }
}

impl Definition {
    pub fn render(&self, name: &str) -> anyhow::Result<ChefSoloData> {
        use anyhow::Context;

        self.config.render().with_context(|| match &self.source {
            Some(path) => format!(
                "data.{DATA_SOURCE_TYPE}.{name} ({}) could not be rendered",
                path.display()
            ),
            None => format!("data.{DATA_SOURCE_TYPE}.{name} could not be rendered"),
        })
    }
}

#[derive(derive_new::new, Debug)]
pub struct DefinitionErrors {
    #[new(default)]
    issues: Vec<Issue>,
}

impl DefinitionErrors {
    pub fn log(&mut self, issue: Issue) {
        tracing::trace!(?issue, "issue found");
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

impl std::error::Error for DefinitionErrors {}

impl std::fmt::Display for DefinitionErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut issues = self.issues.iter();
        if let Some(first) = issues.next() {
            write!(f, "{first}")?;
        }
        for issue in issues {
            write!(f, "\n{issue}")?;
        }
        Ok(())
    }
}

/// Problems found in a document; indices refer to [HclDocuments] root attributes/blocks
#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
    RootAttribute(usize),
    UnknownBlockType(usize),
    DataBlockLabels(usize),
    UnsupportedDataSource { index: usize, kind: String },
    DuplicateName { existing: usize, new: usize },
    NestedBlock(usize),
    InvalidArgument {
        index: usize,
        argument: String,
        message: String,
    },
    InvalidDefinition { index: usize, message: String },
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Issue::RootAttribute(index) => {
                write!(f, "attribute #{index}: attributes are not allowed at the root")
            }
            Issue::UnknownBlockType(index) => {
                write!(f, "block #{index}: only `data` blocks are supported")
            }
            Issue::DataBlockLabels(index) => {
                write!(f, "block #{index}: data blocks need exactly two labels (type and name)")
            }
            Issue::UnsupportedDataSource { index, kind } => {
                write!(f, "block #{index}: unsupported data source `{kind}`, expected `{DATA_SOURCE_TYPE}`")
            }
            Issue::DuplicateName { existing, new } => {
                write!(f, "block #{new}: name already defined by block #{existing}")
            }
            Issue::NestedBlock(index) => {
                write!(f, "block #{index}: nested blocks are not supported")
            }
            Issue::InvalidArgument {
                index,
                argument,
                message,
            } => write!(f, "block #{index}: argument `{argument}`: {message}"),
            Issue::InvalidDefinition { index, message } => write!(f, "block #{index}: {message}"),
        }
    }
}
