//! collection of hcl documents ([Body] and path to source file)
//!
//! [HclDocuments] tracks
//! - the source path
//! - the root blocks
//! - the root attributes
//! and defines a numeric index for each. Once added those indices are stable (removal is not possible)
use hcl_edit::structure::{Attribute, Block, Body, Structure};
use std::path::Path;

/// File extensions picked up by [HclDocuments::load_directory]
pub const EXTENSIONS: [&str; 2] = ["hcl", "tf"];

#[derive(Default, Debug)]
pub struct HclDocuments {
    sources: Vec<Source>,
    root_attributes: Vec<(usize, Attribute)>,
    root_blocks: Vec<(usize, Block)>,
}

impl HclDocuments {
    /// Inserts and indexes an hcl document
    pub fn insert(&mut self, document: Body, path: impl Into<Option<std::path::PathBuf>>) {
        let source_index = self.sources.len();
        self.sources.push(path.into());

        for structure in document.into_iter() {
            match structure {
                Structure::Block(block) => self.root_blocks.push((source_index, block)),
                Structure::Attribute(attribute) => {
                    self.root_attributes.push((source_index, attribute))
                }
            }
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = SourceAttribute> {
        self.root_attributes
            .iter()
            .enumerate()
            .map(|(index, (source_index, attribute))| {
                (index, &self.sources[*source_index], attribute)
            })
    }

    pub fn blocks(&self) -> impl Iterator<Item = SourceBlock> {
        self.root_blocks
            .iter()
            .enumerate()
            .map(|(index, (source_index, block))| (index, &self.sources[*source_index], block))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl HclDocuments {
    /// Parses `contents` and inserts it; `path` is only used to report where definitions came from
    pub fn load_str(
        &mut self,
        contents: &str,
        path: Option<std::path::PathBuf>,
    ) -> Result<(), LoadError> {
        match hcl_edit::parser::parse_body(contents) {
            Ok(body) => {
                self.insert(body, path);
                Ok(())
            }
            Err(source) => Err(LoadError::Parse { path, source }),
        }
    }

    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        let read_error = |source| LoadError::Read {
            path: file_path.to_path_buf(),
            source,
        };

        let file_path = file_path.canonicalize().map_err(read_error)?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path).map_err(read_error)?;
        self.load_str(&file_contents, Some(file_path))
    }

    /// Loads all `*.hcl` and `*.tf` files of a directory, sorted by file name
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let read_error = |source| LoadError::Read {
            path: dir_path.to_path_buf(),
            source,
        };

        let mut file_paths = vec![];
        for dir_entry in std::fs::read_dir(dir_path).map_err(read_error)? {
            let file_path = dir_entry.map_err(read_error)?.path();
            let is_definition_file = file_path.is_file()
                && file_path
                    .extension()
                    .is_some_and(|ext| EXTENSIONS.iter().any(|known| ext == *known));

            if is_definition_file {
                file_paths.push(file_path);
            }
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound(dir_path.to_path_buf()));
        }

        file_paths.sort();
        file_paths
            .iter()
            .try_for_each(|file_path| self.load_file(file_path))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("no .hcl or .tf files found in {}", .0.display())]
    NoFilesFound(std::path::PathBuf),
    #[error("{}: could not be read", .path.display())]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: invalid HCL", describe_source(.path))]
    Parse {
        path: Source,
        #[source]
        source: hcl_edit::parser::Error,
    },
}

fn describe_source(source: &Source) -> String {
    match source {
        Some(path) => path.display().to_string(),
        None => "<stdin>".to_string(),
    }
}

impl From<Body> for HclDocuments {
    fn from(value: Body) -> Self {
        let mut tree = HclDocuments::default();
        tree.insert(value, None);
        tree
    }
}

/// Utility macro to create [HclDocuments]
///
/// Create from a single document
/// ```
/// # use chefsolo::hcl_documents;
/// hcl_documents!(r#"data "template_chef_solo" "web" { node_id = "web" }"#);
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use chefsolo::hcl_documents;
/// let documents = hcl_documents! {
///   "one.hcl" => r#"data "template_chef_solo" "one" { node_id = "one" }"#,
///   "two.hcl" => r#"data "template_chef_solo" "two" { node_id = "two" }"#
/// };
/// assert_eq!(documents.source_count(), 2);
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use chefsolo::hcl_documents;
/// hcl_documents!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! hcl_documents {
    // single document without source
    { $expr:expr } => {
        $crate::hcl_documents::HclDocuments::from(hcl_edit::parser::parse_body($expr).expect("body must parse"))
    };
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut docs = $crate::hcl_documents::HclDocuments::default();
        $(
            docs.insert(hcl_edit::parser::parse_body($expr).expect("body must parse"), Some($source.into()));
        )+

        docs
    }};
}

pub type Source = Option<std::path::PathBuf>;
pub type SourceAttribute<'a> = (usize, &'a Source, &'a Attribute);
pub type SourceBlock<'a> = (usize, &'a Source, &'a Block);

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    #[test]
    fn iterators() {
        let hcl_documents = hcl_documents! {r#"
        attr_1 = 1
        data "template_chef_solo" "one" {}
        three four five {}
        attr_2 = 2
        attr_3 = 3
        "#};

        assert_eq!(hcl_documents.attributes().count(), 3);
        assert_eq!(hcl_documents.blocks().count(), 2);
    }

    #[test]
    fn load_directory_picks_definition_files() {
        let dir = std::env::temp_dir().join(format!("chefsolo-load-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.tf"), "data \"template_chef_solo\" \"b\" {}").unwrap();
        std::fs::write(dir.join("a.hcl"), "data \"template_chef_solo\" \"a\" {}").unwrap();
        std::fs::write(dir.join("notes.txt"), "not hcl {").unwrap();

        let mut documents = HclDocuments::default();
        let result = documents.load_directory(&dir);
        std::fs::remove_dir_all(&dir).unwrap();
        result.unwrap();

        let names: Vec<_> = documents
            .blocks()
            .map(|(_, _, block)| block.labels[1].as_str().to_string())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn load_directory_without_files() {
        let dir = std::env::temp_dir().join(format!("chefsolo-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let result = HclDocuments::default().load_directory(&dir);
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(matches!(result, Err(LoadError::NoFilesFound(path)) if path == dir));
    }
}
