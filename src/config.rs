use crate::gateway::RdfSyntax;
use crate::ontology::{DEFAULT_THRESHOLD, DisplayNameMode};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = ".ait/store";

/// Resolved runtime configuration: CLI flags over config file over defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub threshold: f64,
}

impl AppConfig {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let file_config = if let Some(path) = args.config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            data_dir: file_data_dir,
            threshold: file_threshold,
        } = file_config;

        let data_dir = args
            .data_dir
            .clone()
            .or(file_data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let threshold = args
            .threshold
            .or(file_threshold)
            .unwrap_or(DEFAULT_THRESHOLD);

        anyhow::ensure!(
            (0.0..=1.0).contains(&threshold),
            "namespace threshold must be between 0 and 1, got {threshold}"
        );
        anyhow::ensure!(
            !data_dir.as_os_str().is_empty(),
            "data directory must not be empty"
        );

        Ok(Self {
            data_dir,
            threshold,
        })
    }

    /// Create the data directory when it does not exist yet.
    pub fn ensure_data_dir(&self) -> Result<()> {
        if self.data_dir.exists() {
            anyhow::ensure!(
                self.data_dir.is_dir(),
                "data directory {:?} is not a directory",
                self.data_dir
            );
            return Ok(());
        }
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create data directory {:?}", self.data_dir))
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ait-introspect",
    about = "Inspect OWL/SKOS ontologies: class hierarchies, code lists and properties",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "AIT_DATA_DIR",
        value_name = "DIR",
        help = "Directory of the persistent RDF store",
        global = true
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "AIT_THRESHOLD",
        value_name = "FRACTION",
        help = "Share of classes a namespace needs to count as internal",
        global = true
    )]
    pub threshold: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Load an RDF document into an ontology graph
    Load {
        /// RDF/XML, Turtle, N-Triples or N-Quads file
        file: PathBuf,
        #[arg(long, value_name = "IRI", help = "Graph IRI to load into")]
        ontology: String,
        #[arg(
            long,
            value_enum,
            help = "Input syntax; guessed from the extension, then by trial"
        )]
        format: Option<RdfSyntax>,
        #[arg(long, help = "Clear the graph before loading")]
        replace: bool,
    },
    /// List loaded ontologies
    Ontologies,
    /// Class counts per namespace
    Namespaces { ontology: String },
    /// Flat class hierarchy
    Hierarchy {
        ontology: String,
        #[arg(long, help = "Only classes from internal namespaces")]
        internal_only: bool,
    },
    /// SKOS concept schemes and collections
    Codelists { ontology: String },
    /// Members of one code list
    Codelist { ontology: String, entity: String },
    /// Declared, inherited and incoming properties of a class
    ClassProperties { ontology: String, class: String },
    /// Kind, domains and ranges of a property
    Property { ontology: String, property: String },
    /// Details of any entity
    Entity { ontology: String, entity: String },
    /// Show stored settings of an ontology
    ConfigShow { ontology: String },
    /// Update stored settings of an ontology
    ConfigSet {
        ontology: String,
        #[arg(
            long = "namespace",
            value_name = "IRI",
            value_delimiter = ',',
            help = "Internal namespaces, replacing the stored selection"
        )]
        namespaces: Option<Vec<String>>,
        #[arg(long, help = "Drop the stored namespace selection")]
        clear_namespaces: bool,
        #[arg(long, value_enum)]
        display_name_mode: Option<DisplayNameMode>,
        #[arg(long, value_name = "BOOL")]
        show_deprecated: Option<bool>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Load { .. } => "load",
            Command::Ontologies => "ontologies",
            Command::Namespaces { .. } => "namespaces",
            Command::Hierarchy { .. } => "hierarchy",
            Command::Codelists { .. } => "codelists",
            Command::Codelist { .. } => "codelist",
            Command::ClassProperties { .. } => "class-properties",
            Command::Property { .. } => "property",
            Command::Entity { .. } => "entity",
            Command::ConfigShow { .. } => "config-show",
            Command::ConfigSet { .. } => "config-set",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    data_dir: Option<PathBuf>,
    threshold: Option<f64>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
