//! error kinds surfaced by a render
//!
//! Every stage of a render returns [Error]. Messages are meant to be shown to the user verbatim.
use crate::document::Level;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Input that violates a constraint of the data source (vars, conflicting fields)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Input that is incomplete
    #[error("{0}")]
    Configuration(String),

    /// The interpolation engine failed (syntax error, unknown variable, failing function)
    #[error("{level}: {message}")]
    Template { level: Level, message: String },

    /// Interpolated text is not valid JSON
    #[error("{level}: rendered text is not valid JSON: {source}")]
    Parse {
        level: Level,
        #[source]
        source: serde_json::Error,
    },

    /// A value of an unexpected type was produced
    #[error("{level}: {message}")]
    Type { level: Level, message: String },
}

impl Error {
    pub(crate) fn template(level: Level, err: impl std::fmt::Display) -> Self {
        Error::Template {
            level,
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(level: Level, source: serde_json::Error) -> Self {
        Error::Parse { level, source }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("{field}: cannot contain non-primitives; bad keys: {}", describe_bad_keys(.bad_keys))]
    NonPrimitive {
        field: String,
        bad_keys: Vec<(String, &'static str)>,
    },

    #[error("{field}: conflicts with {}", .conflicts.join(", "))]
    Conflict {
        field: String,
        conflicts: Vec<String>,
    },
}

fn describe_bad_keys(bad_keys: &[(String, &'static str)]) -> String {
    bad_keys
        .iter()
        .map(|(key, kind)| format!("{key} ({kind})"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn non_primitive_message_lists_every_key() {
        let err = ValidationError::NonPrimitive {
            field: "vars".into(),
            bad_keys: vec![("k1".into(), "list"), ("k2".into(), "map")],
        };

        assert_eq!(
            err.to_string(),
            "vars: cannot contain non-primitives; bad keys: k1 (list), k2 (map)"
        );
    }

    #[test]
    fn template_error_names_level() {
        let err = Error::template(Level::Default, "unknown variable `a`");
        assert_eq!(err.to_string(), "default_attributes: unknown variable `a`");
    }
}
