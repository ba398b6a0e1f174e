//! Snapshot tests
//!
//! Loads each *.hcl file in /tests/ individually and compares if the
//! rendered documents of its definitions change.

#[derive(serde::Serialize)]
struct Rendered {
    use_policyfile: bool,
    node: serde_json::Value,
    dna: serde_json::Value,
}

#[test]
fn snapshots() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("CHEFSOLO_LOG"))
        .with_writer(std::io::stderr)
        .init();

    insta::glob!("*.hcl", |path| {
        let mut documents = chefsolo::hcl_documents::HclDocuments::default();
        let reader = std::fs::read_to_string(path).unwrap();
        documents.insert(
            hcl_edit::parser::parse_body(&reader).unwrap(),
            Some(path.to_owned()),
        );
        let definitions = chefsolo::definitions::Definitions::new(&documents)
            .expect("must be valid definitions");

        let rendered: indexmap::IndexMap<String, Rendered> = definitions
            .render()
            .expect("must render")
            .into_iter()
            .map(|(name, data)| {
                let rendered = Rendered {
                    use_policyfile: data.use_policyfile,
                    node: serde_json::from_str(&data.node).unwrap(),
                    dna: serde_json::from_str(&data.dna).unwrap(),
                };
                (name, rendered)
            })
            .collect();

        insta::assert_yaml_snapshot!(rendered);
    });
}
