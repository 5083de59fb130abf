//! ontoctl - command-line front end of the ontology engine
//!
//! Opens the configured triplestore, loads the cache and runs one command
//! as a system administrator. Output is JSON on stdout; logs go to stderr
//! and follow `RUST_LOG`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use onto_cache::responder::{CreateOntologyRequest, OntologyTargetRequest};
use onto_cache::{
    ApiSchema, EngineConfig, InMemoryProjectDirectory, OntologyCache, OntologyMutation, OntologyResponder,
    OxigraphTriplestore, PermissionChecker, SmartIri, TriplestoreService, UserProfile, DEFAULT_CONFIG_FILE,
};

#[derive(Parser)]
#[command(name = "ontoctl")]
#[command(version)]
#[command(about = "Ontology cache and consistency engine", long_about = None)]
struct Cli {
    /// Engine configuration file
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Triplestore directory; overrides spec.store.path
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    InitConfig {
        /// Configuration name
        #[arg(long, default_value = "default")]
        name: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Create an empty ontology in a project
    CreateOntology {
        /// Ontology short name (e.g., anything)
        name: String,
        /// Owning project IRI
        #[arg(long)]
        project: String,
        #[arg(long)]
        label: String,
        #[arg(long)]
        comment: Option<String>,
        /// Create in the shared-ontologies project
        #[arg(long)]
        shared: bool,
    },
    /// List ontology metadata
    ListOntologies {
        /// Only ontologies of these projects
        #[arg(long)]
        project: Vec<String>,
        /// IRI schema of the output
        #[arg(long, value_enum, default_value = "internal")]
        schema: SchemaArg,
    },
    /// Show an ontology with all its classes and properties
    ShowOntology { iri: String },
    /// Show a class with its inherited cardinalities
    ShowClass { iri: String },
    /// Show a property with its superproperties
    ShowProperty { iri: String },
    /// Delete an ontology
    DeleteOntology {
        iri: String,
        /// Last modification date the deletion is based on
        #[arg(long)]
        last_modification_date: DateTime<Utc>,
    },
    /// Check whether an ontology, class or property could be deleted
    CanDelete {
        #[arg(value_enum)]
        kind: EntityKind,
        iri: String,
    },
    /// Apply a mutation read from a JSON file ("-" for stdin)
    Apply { file: PathBuf },
    /// Reload every ontology from the triplestore
    Refresh,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaArg {
    Internal,
    Complex,
    Simple,
}

impl From<SchemaArg> for ApiSchema {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Internal => ApiSchema::Internal,
            SchemaArg::Complex => ApiSchema::Complex,
            SchemaArg::Simple => ApiSchema::Simple,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EntityKind {
    Ontology,
    Class,
    Property,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OntologyListing {
    ontology_iri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_iri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modification_date: Option<DateTime<Utc>>,
    is_shared: bool,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_iri(iri: &str) -> Result<SmartIri> {
    SmartIri::parse(iri).with_context(|| format!("Invalid IRI: {}", iri))
}

async fn open_responder(config: EngineConfig, store: Option<PathBuf>) -> Result<OntologyResponder> {
    let triplestore: Arc<dyn TriplestoreService> = match store.or_else(|| config.spec.store.as_ref().map(|s| s.path.clone())) {
        Some(path) => {
            info!(path = %path.display(), "Opening triplestore");
            Arc::new(OxigraphTriplestore::open(&path)?)
        }
        None => {
            info!("No store configured, using an in-memory triplestore");
            Arc::new(OxigraphTriplestore::in_memory()?)
        }
    };
    let cache = Arc::new(OntologyCache::load(triplestore).await?);
    let projects = Arc::new(InMemoryProjectDirectory::from_config(&config)?);
    Ok(OntologyResponder::new(
        cache,
        Arc::new(PermissionChecker::new()),
        projects,
        Arc::new(config),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Commands::InitConfig { name, force } = &cli.command {
        if cli.config.exists() && !force {
            anyhow::bail!("{} already exists, use --force to overwrite", cli.config.display());
        }
        EngineConfig::new(name.clone()).save(&cli.config)?;
        println!("Wrote {}", cli.config.display());
        return Ok(());
    }

    let config = EngineConfig::load(&cli.config)
        .with_context(|| format!("Cannot load {}", cli.config.display()))?;
    let responder = open_responder(config, cli.store).await?;
    let admin = UserProfile::system_admin(SmartIri::from_trusted("http://rdfh.ch/users/ontoctl"));

    match cli.command {
        Commands::InitConfig { .. } => {}

        Commands::CreateOntology {
            name,
            project,
            label,
            comment,
            shared,
        } => {
            let request = CreateOntologyRequest {
                ontology_name: name,
                project_iri: parse_iri(&project)?,
                label,
                comment,
                is_shared: shared,
            };
            print_json(&responder.create_ontology(request, &admin).await?)?;
        }

        Commands::ListOntologies { project, schema } => {
            let projects = project.iter().map(|p| parse_iri(p)).collect::<Result<Vec<_>>>()?;
            let schema = ApiSchema::from(schema);
            let listing: Vec<OntologyListing> = responder
                .get_ontology_metadata_by_project(&projects)
                .await
                .ontologies
                .into_iter()
                .map(|m| OntologyListing {
                    ontology_iri: m.ontology_iri.to_schema(schema),
                    project_iri: m.project_iri.map(|p| p.to_string()),
                    label: m.label,
                    last_modification_date: m.last_modification_date,
                    is_shared: m.is_shared,
                })
                .collect();
            print_json(&listing)?;
        }

        Commands::ShowOntology { iri } => {
            print_json(&responder.get_ontology_entities(&parse_iri(&iri)?).await?)?;
        }

        Commands::ShowClass { iri } => {
            print_json(&responder.get_classes(&[parse_iri(&iri)?]).await?)?;
        }

        Commands::ShowProperty { iri } => {
            print_json(&responder.get_properties(&[parse_iri(&iri)?]).await?)?;
        }

        Commands::DeleteOntology {
            iri,
            last_modification_date,
        } => {
            let request = OntologyTargetRequest {
                ontology_iri: parse_iri(&iri)?,
                last_modification_date,
            };
            print_json(&responder.delete_ontology(request, &admin).await?)?;
        }

        Commands::CanDelete { kind, iri } => {
            let iri = parse_iri(&iri)?;
            let response = match kind {
                EntityKind::Ontology => responder.can_delete_ontology(&iri, &admin).await?,
                EntityKind::Class => responder.can_delete_class(&iri, &admin).await?,
                EntityKind::Property => responder.can_delete_property(&iri, &admin).await?,
            };
            print_json(&response)?;
        }

        Commands::Apply { file } => {
            let content = if file.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin())?
            } else {
                std::fs::read_to_string(&file).with_context(|| format!("Cannot read {}", file.display()))?
            };
            let mutation: OntologyMutation = serde_json::from_str(&content).context("Invalid mutation")?;
            print_json(&responder.apply(mutation, &admin).await?)?;
        }

        Commands::Refresh => {
            print_json(&responder.refresh_cache(&admin).await?)?;
        }
    }

    Ok(())
}
