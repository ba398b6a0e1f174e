mod cli;

use chefsolo::data_source::ChefSoloData;
use chefsolo::definitions::Definitions;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("CHEFSOLO_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Render(render_cli) => render(render_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn render(cli: cli::RenderCommand) -> anyhow::Result<()> {
    let documents = load(&cli.input)?;
    let definitions = Definitions::new(&documents)?;
    anyhow::ensure!(!definitions.is_empty(), "No template_chef_solo definitions found");

    let rendered: indexmap::IndexMap<String, ChefSoloData> = match &cli.name {
        Some(name) => {
            let Some(definition) = definitions.get(name) else {
                anyhow::bail!("No template_chef_solo definition named {name}");
            };
            [(name.clone(), definition.render(name)?)].into_iter().collect()
        }
        None => definitions.render()?,
    };

    if let Some(field) = cli.field {
        match rendered.first() {
            Some((_, data)) if rendered.len() == 1 => println!("{}", select(field, data)),
            _ => anyhow::bail!(
                "--field needs exactly one definition, found {} (use --name)",
                rendered.len()
            ),
        }
        return Ok(());
    }

    output(&cli.output, &rendered)?;
    Ok(())
}

fn select(field: cli::Field, data: &ChefSoloData) -> &str {
    match field {
        cli::Field::Node => &data.node,
        cli::Field::Dna => &data.dna,
    }
}

fn load(input: &cli::InputArgs) -> anyhow::Result<chefsolo::hcl_documents::HclDocuments> {
    let mut documents = chefsolo::hcl_documents::HclDocuments::default();

    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        documents.load_str(&stdin, None)?;
        return Ok(documents);
    }

    if input.workdir {
        documents.load_directory(&std::env::current_dir()?)?;
    }

    for file_path in &input.files {
        documents.load_file(file_path)?;
    }

    for dir_path in &input.directories {
        documents.load_directory(dir_path)?;
    }

    anyhow::ensure!(documents.source_count() > 0, "No files loaded");

    Ok(documents)
}

fn output(output: &cli::OutputArgs, value: &impl serde::Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}

/// (chefsolo-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    let documents = load(&cli.input)?;

    match cli.command {
        cli::DevSubCommand::Documents => println!("{documents:#?}"),
        cli::DevSubCommand::Definitions => println!("{:#?}", Definitions::new(&documents)?),
    }

    Ok(())
}
