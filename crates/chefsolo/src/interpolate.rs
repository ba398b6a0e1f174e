//! `${...}` interpolation
//!
//! Templates are parsed and evaluated by [hcl]'s template engine, so the syntax is the one known from terraform:
//! `${expr}` interpolates, `$${` and `%%{` produce a literal `${` and `%{`, `%{ if }`/`%{ for }` directives work.
//!
//! Evaluation happens element by element. This allows a partial pass which keeps markers that reference
//! variables that are not known yet (see [crate::document::COMPUTED_VARIABLES]) and re-escapes everything else
//! so the output can be interpolated a second time without changing its meaning.
use crate::document::Level;
use crate::error::{Error, Result};
use crate::vars::VariableScope;
use crate::visit::{referenced_variables, VisitVariables};
use hcl::eval::Evaluate;
use hcl::template::Element;
use hcl::Template;

/// Interpolates `raw` against `scope`
///
/// Unknown variables and syntax errors are reported with `level` attached.
#[tracing::instrument(level = "debug", skip_all, fields(attributes = %level))]
pub fn render(level: Level, raw: &str, scope: &VariableScope) -> Result<String> {
    interpolate(level, raw, scope, Pass::Final)
}

/// Interpolates `raw` against `scope`, but keeps every `${...}` that references one of `deferred`
///
/// The output is a template again: literal text is escaped, so `$${x}` stays `$${x}`.
#[tracing::instrument(level = "debug", skip_all, fields(attributes = %level))]
pub fn render_partial(
    level: Level,
    raw: &str,
    scope: &VariableScope,
    deferred: &[&str],
) -> Result<String> {
    interpolate(level, raw, scope, Pass::Partial { deferred })
}

/// Turns literal text into template text that evaluates back to it
pub fn escape_markers(text: &str) -> String {
    text.replace("${", "$${").replace("%{", "%%{")
}

#[derive(Debug, Clone, Copy)]
enum Pass<'a> {
    Final,
    Partial { deferred: &'a [&'a str] },
}

impl Pass<'_> {
    fn defers(&self, subject: &dyn VisitVariables) -> bool {
        let Pass::Partial { deferred } = self else {
            return false;
        };

        referenced_variables(subject)
            .iter()
            .any(|name| deferred.contains(&name.as_str()))
    }

    fn emit(&self, rendered: &mut String, text: &str) {
        match self {
            Pass::Final => rendered.push_str(text),
            Pass::Partial { .. } => rendered.push_str(&escape_markers(text)),
        }
    }
}

fn interpolate(level: Level, raw: &str, scope: &VariableScope, pass: Pass) -> Result<String> {
    let template: Template = raw.parse().map_err(|err| Error::template(level, err))?;
    let context = scope.context();
    let mut rendered = String::with_capacity(raw.len());

    for element in template.elements() {
        match element {
            Element::Literal(literal) => pass.emit(&mut rendered, literal),
            Element::Interpolation(interpolation) => {
                if pass.defers(&interpolation.expr) {
                    let expr = hcl::format::to_string(&interpolation.expr)
                        .map_err(|err| Error::template(level, err))?;
                    tracing::trace!(attributes = %level, %expr, "deferred");
                    rendered.push_str("${");
                    rendered.push_str(&expr);
                    rendered.push('}');
                    continue;
                }

                let value = interpolation
                    .expr
                    .evaluate(&context)
                    .map_err(|err| Error::template(level, err))?;
                pass.emit(&mut rendered, &substitution_text(level, value)?);
            }
            Element::Directive(_) => {
                let directive = Template::new().add_element(element.clone());
                if pass.defers(&directive) {
                    return Err(Error::template(
                        level,
                        "template directives cannot reference computed variables",
                    ));
                }

                let text = directive
                    .evaluate(&context)
                    .map_err(|err| Error::template(level, err))?;
                pass.emit(&mut rendered, &text);
            }
        }
    }

    Ok(rendered)
}

fn substitution_text(level: Level, value: hcl::Value) -> Result<String> {
    match value {
        hcl::Value::String(s) => Ok(s),
        hcl::Value::Number(n) => Ok(n.to_string()),
        hcl::Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::Type {
            level,
            message: format!("interpolation must produce a string, got {}", hcl_kind(&other)),
        }),
    }
}

fn hcl_kind(value: &hcl::Value) -> &'static str {
    match value {
        hcl::Value::Null => "null",
        hcl::Value::Bool(_) => "bool",
        hcl::Value::Number(_) => "number",
        hcl::Value::String(_) => "string",
        hcl::Value::Array(_) => "list",
        hcl::Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scope() -> VariableScope {
        [("a", "foo"), ("list", r#"["he", "llo"]"#)].into_iter().collect()
    }

    #[test]
    fn substitutes_variables() {
        let rendered = render(Level::Default, r#"{"toto": "${a}"}"#, &scope()).unwrap();
        assert_eq!(rendered, r#"{"toto": "foo"}"#);
    }

    #[test]
    fn substitutes_json_literals_verbatim() {
        let rendered = render(Level::Default, r#"{"toto": ${list}}"#, &scope()).unwrap();
        assert_eq!(rendered, r#"{"toto": ["he", "llo"]}"#);
    }

    #[test]
    fn escaped_markers_are_literal() {
        let rendered = render(Level::Default, r#"{"toto": "$${a}"}"#, &scope()).unwrap();
        assert_eq!(rendered, r#"{"toto": "${a}"}"#);
    }

    #[test]
    fn unknown_variable_is_a_template_error() {
        let err = render(Level::Automatic, r#"{"toto": "${missing}"}"#, &scope()).unwrap_err();
        let Error::Template { level, message } = &err else {
            panic!("expected template error, got {err:?}");
        };
        assert_eq!(*level, Level::Automatic);
        assert!(message.contains("missing"), "{message}");
    }

    #[test]
    fn malformed_expression_is_a_template_error() {
        let err = render(Level::Default, r#"{"toto": "${a +}"}"#, &scope()).unwrap_err();
        assert!(matches!(err, Error::Template { .. }), "{err:?}");
    }

    #[test]
    fn non_scalar_result_is_a_type_error() {
        let err = render(Level::Default, r#"{"toto": ${[1, 2]}}"#, &scope()).unwrap_err();
        assert!(matches!(err, Error::Type { .. }), "{err:?}");
    }

    #[test]
    fn partial_pass_keeps_deferred_markers() {
        let rendered = render_partial(
            Level::Automatic,
            r#"{"fqdn": "${id}", "toto": "${a}"}"#,
            &scope(),
            &["id"],
        )
        .unwrap();
        assert_eq!(rendered, r#"{"fqdn": "${id}", "toto": "foo"}"#);
    }

    #[test]
    fn partial_pass_keeps_escapes() {
        let rendered =
            render_partial(Level::Default, r#"{"toto": "$${a}"}"#, &scope(), &["id"]).unwrap();
        assert_eq!(rendered, r#"{"toto": "$${a}"}"#);

        let scope = scope().with([("id", "node_id")]);
        assert_eq!(
            render(Level::Document, &rendered, &scope).unwrap(),
            r#"{"toto": "${a}"}"#
        );
    }

    #[test]
    fn partial_pass_escapes_substituted_values() {
        let scope = scope().with([("tricky", "${a}")]);
        let rendered =
            render_partial(Level::Default, r#"{"toto": "${tricky}"}"#, &scope, &["id"]).unwrap();
        assert_eq!(rendered, r#"{"toto": "$${a}"}"#);
    }

    #[test]
    fn directives() {
        let scope = scope().with([("flag", "true")]);
        let rendered = render(
            Level::Default,
            r#"{"toto": "%{ if flag == "true" }on%{ else }off%{ endif }"}"#,
            &scope,
        )
        .unwrap();
        assert_eq!(rendered, r#"{"toto": "on"}"#);
    }

    #[test]
    fn directives_cannot_defer() {
        let err = render_partial(
            Level::Default,
            r#"{"toto": "%{ if id == "x" }on%{ endif }"}"#,
            &scope(),
            &["id"],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Template { .. }), "{err:?}");
    }
}
