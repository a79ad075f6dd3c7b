//! Oimtax: a loader and validator for Open Information Model taxonomies.
//!
//! Taxonomy and report documents (JSON or YAML) are built into an in-memory
//! object graph, imports are followed through a pluggable resolver, and a
//! multi-pass validator reports every structural and semantic problem as a
//! coded diagnostic.
//!
//! # Modules
//!
//! - [`model`]: QNames, object kinds and the object arena
//! - [`builder`]: Document loading, imports and selections
//! - [`relationships`]: Queries over network and domain edges
//! - [`cube`]: Cube dimension resolution and fact membership
//! - [`validation`]: Diagnostics and the validation passes
//! - [`inspect`]: Human-readable taxonomy summaries
//! - [`error`]: Error types for oimtax operations

pub mod builder;
pub mod cube;
pub mod error;
pub mod inspect;
pub mod model;
pub mod relationships;
pub mod validation;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use builder::{Catalog, ImportResolver, LoadOptions, NoImports, TaxonomyBuilder};
use model::io::{read_document, DocumentFormat};
use model::TaxonomyModel;
use validation::{ValidateOptions, ValidationReport};

pub use error::TaxonomyError;

/// The oimtax CLI application.
#[derive(Parser)]
#[command(name = "oimtax")]
#[command(version, author, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log debug output to stderr (overrides OIMTAX_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate a taxonomy or report document.
    Validate(ValidateArgs),
    /// Summarize the contents of a taxonomy.
    Inspect(InspectArgs),
    /// List the cubes each fact of a report can be placed in.
    Cubes(CubesArgs),
}

/// How input documents are found and parsed.
#[derive(clap::Args)]
struct LoadArgs {
    /// Input document.
    input: PathBuf,

    /// Input syntax ('auto', 'json' or 'yaml').
    #[arg(long, default_value = "auto")]
    format: String,

    /// Directory of taxonomy documents used to resolve imports.
    #[arg(long, env = "OIMTAX_CATALOG")]
    catalog: Option<PathBuf>,

    /// Do not follow importedTaxonomies.
    #[arg(long)]
    no_imports: bool,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Render networks and domains as trees.
    #[arg(long)]
    trees: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Arguments for the cubes subcommand.
#[derive(clap::Args)]
struct CubesArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Output format for the listing.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Run the oimtax CLI.
///
/// This is the main entry point for the CLI, called from `main.rs` once
/// logging is set up.
pub fn run(cli: Cli) -> Result<(), TaxonomyError> {
    match cli.command {
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        Some(Commands::Cubes(args)) => run_cubes(args),
        None => {
            println!("oimtax {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Loader and validator for Open Information Model taxonomies.");
            println!();
            println!("Run 'oimtax --help' for usage information.");
            Ok(())
        }
    }
}

/// Loads the input document (and its imports) into a fresh model.
fn load(args: &LoadArgs) -> Result<(TaxonomyModel, ValidationReport), TaxonomyError> {
    let format = DocumentFormat::parse(&args.format)?;
    let document = read_document(&args.input, format)?;

    let catalog = match &args.catalog {
        Some(dir) => Catalog::from_dir(dir)?,
        None => Catalog::new(),
    };
    let resolver: &dyn ImportResolver = if args.no_imports { &NoImports } else { &catalog };
    let options = LoadOptions {
        follow_imports: !args.no_imports,
        ..LoadOptions::default()
    };

    let outcome = TaxonomyBuilder::new(resolver)
        .with_options(options)
        .build(&document, &location(&args.input))?;
    Ok((outcome.model, outcome.report))
}

fn location(path: &Path) -> String {
    path.display().to_string()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), TaxonomyError> {
    let text = serde_json::to_string_pretty(value).map_err(TaxonomyError::ReportSerialize)?;
    println!("{}", text);
    Ok(())
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), TaxonomyError> {
    let (model, mut report) = load(&args.load)?;

    let opts = ValidateOptions {
        strict: args.strict,
        ..ValidateOptions::default()
    };
    report.merge(validation::validate_taxonomy(&model, &opts));

    match args.output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print!("{}", report),
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(TaxonomyError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs) -> Result<(), TaxonomyError> {
    let (model, _) = load(&args.load)?;

    let opts = inspect::InspectOptions {
        show_trees: args.trees,
    };
    let report = inspect::inspect_taxonomy(&model, &opts);

    match args.output {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print!("{}", report);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct FactCubes {
    fact: String,
    cubes: Vec<String>,
}

/// Execute the cubes subcommand.
///
/// Cube membership is only defined on a validated model, so validation
/// runs first; its diagnostics are not printed here.
fn run_cubes(args: CubesArgs) -> Result<(), TaxonomyError> {
    let (model, _) = load(&args.load)?;
    let opts = ValidateOptions {
        check_facts: false,
        ..ValidateOptions::default()
    };
    validation::validate_taxonomy(&model, &opts);

    let mut listing = Vec::new();
    for fact in model.facts() {
        let cubes = cube::usable_cubes(fact, &model)?
            .into_iter()
            .map(|id| model.label_of(id).to_string())
            .collect();
        listing.push(FactCubes {
            fact: fact.label().to_string(),
            cubes,
        });
    }

    match args.output {
        OutputFormat::Json => print_json(&listing)?,
        OutputFormat::Text => {
            if listing.is_empty() {
                println!("No facts found.");
            }
            for entry in &listing {
                if entry.cubes.is_empty() {
                    println!("{}: (no cube)", entry.fact);
                } else {
                    println!("{}: {}", entry.fact, entry.cubes.join(", "));
                }
            }
        }
    }
    Ok(())
}
