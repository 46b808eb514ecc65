use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use erdforge_codegen::{CodeGenerator, CodegenError, write_artifact};
use erdforge_core::{
    ArtifactKind, ArtifactRecord, Config, ExtractionResult, ModelTarget, RunReport, Severity,
    SynthesizedSchema,
};
use erdforge_engine::SchemaSynthesizer;
use erdforge_frontend::{JsonRegionSource, RegionExtractor, TextParser, extract_from_source};

const DEFAULT_CONFIG: &str = "erdforge.toml";

/// erdforge - ERD to schema, migration and model generator
#[derive(Parser)]
#[command(name = "erdforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: erdforge.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an ERD and print the extraction result as JSON
    Extract {
        /// ERD text file, or detector JSON with --regions
        input: PathBuf,

        /// Treat the input as detector output (regions and lines)
        #[arg(short, long)]
        regions: bool,
    },

    /// Print the synthesized schema as JSON
    Schema {
        /// ERD text file, or detector JSON with --regions
        input: PathBuf,

        /// Treat the input as detector output (regions and lines)
        #[arg(short, long)]
        regions: bool,
    },

    /// Generate DDL, migration and model files
    Generate {
        /// ERD text file, or detector JSON with --regions
        input: PathBuf,

        /// Treat the input as detector output (regions and lines)
        #[arg(short, long)]
        regions: bool,

        /// Output file for the DDL script
        #[arg(long)]
        ddl: Option<PathBuf>,

        /// Output file for the migration script
        #[arg(long)]
        migration: Option<PathBuf>,

        /// Output file for model source
        #[arg(long)]
        models: Option<PathBuf>,

        /// SQLite database file to create from the DDL
        #[arg(long)]
        database: Option<PathBuf>,

        /// Model language: sqlmodel or rust (overrides config)
        #[arg(short, long)]
        target: Option<ModelTarget>,

        /// Output file for the run report
        #[arg(long, default_value = "erdforge-report.json")]
        report: PathBuf,
    },

    /// Write a default config file
    InitConfig {
        /// Where to write the config
        #[arg(default_value = DEFAULT_CONFIG)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Extract { input, regions } => extract_command(&config, &input, regions),
        Commands::Schema { input, regions } => schema_command(&config, &input, regions),
        Commands::Generate {
            input,
            regions,
            ddl,
            migration,
            models,
            database,
            target,
            report,
        } => {
            let outputs = Outputs {
                ddl,
                migration,
                models,
                database,
                report,
            };
            generate_command(&config, &input, regions, target, &outputs, cli.verbose)
        }
        Commands::InitConfig { path, force } => init_config_command(&path, force),
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let config = if let Some(path) = path {
        Config::from_file(path)?
    } else if Path::new(DEFAULT_CONFIG).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    if verbose {
        eprintln!(
            "{} model target: {:?}, strict references: {}",
            "Using".cyan(),
            config.generation.model_target,
            config.generation.strict_references
        );
    }

    Ok(config)
}

/// Run the selected frontend; unreadable input stops the run here
fn extract_input(config: &Config, input: &Path, regions: bool) -> Result<ExtractionResult> {
    let mut result = if regions {
        let extractor = RegionExtractor::from_config(&config.extraction);
        extract_from_source(&JsonRegionSource, &extractor, input)?
    } else {
        TextParser::from_config(&config.extraction).parse_file(input)?
    };

    for diagnostic in &mut result.diagnostics {
        diagnostic.severity = config.severity.get_severity(diagnostic.code, diagnostic.severity);
    }

    tracing::info!(
        entities = result.entities.len(),
        relationships = result.relationships.len(),
        "extracted {}",
        input.display()
    );

    Ok(result)
}

fn synthesize(config: &Config, result: &ExtractionResult) -> SynthesizedSchema {
    SchemaSynthesizer::new()
        .with_severity(config.severity.clone())
        .synthesize(result)
}

/// Extract command - print the IR
fn extract_command(config: &Config, input: &Path, regions: bool) -> Result<()> {
    let result = extract_input(config, input, regions)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Schema command - print the synthesized schema
fn schema_command(config: &Config, input: &Path, regions: bool) -> Result<()> {
    let result = extract_input(config, input, regions)?;
    let schema = synthesize(config, &result);

    for diagnostic in result.diagnostics.iter().chain(&schema.diagnostics) {
        eprintln!("[{}] {}: {}", severity_label(diagnostic.severity), diagnostic.code, diagnostic.message);
    }

    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

struct Outputs {
    ddl: Option<PathBuf>,
    migration: Option<PathBuf>,
    models: Option<PathBuf>,
    database: Option<PathBuf>,
    report: PathBuf,
}

/// Generate command - write the requested artifacts and a run report
fn generate_command(
    config: &Config,
    input: &Path,
    regions: bool,
    target: Option<ModelTarget>,
    outputs: &Outputs,
    verbose: bool,
) -> Result<()> {
    if outputs.ddl.is_none()
        && outputs.migration.is_none()
        && outputs.models.is_none()
        && outputs.database.is_none()
    {
        anyhow::bail!("Nothing to generate: pass --ddl, --migration, --models and/or --database");
    }

    let result = extract_input(config, input, regions)?;
    let schema = synthesize(config, &result);

    let mut generator = CodeGenerator::from_config(&config.generation);
    if let Some(target) = target {
        generator = generator.with_target(target);
    }

    let mut report = RunReport::for_extraction(&result);
    report.extend_diagnostics(schema.diagnostics.iter().cloned());

    if verbose {
        eprintln!(
            "{} {} tables, {} junction tables, {} indexes",
            "Synthesized".cyan(),
            schema.tables.len(),
            schema.junctions.len(),
            schema.indexes.len()
        );
    }

    if let Some(path) = &outputs.ddl {
        emit(&mut report, ArtifactKind::Ddl, path, generator.ddl(&schema), verbose)?;
    }
    if let Some(path) = &outputs.migration {
        emit(&mut report, ArtifactKind::Migration, path, generator.migration(&schema), verbose)?;
    }
    if let Some(path) = &outputs.models {
        emit(&mut report, ArtifactKind::Models, path, Ok(generator.models(&schema)), verbose)?;
    }
    if let Some(path) = &outputs.database {
        record(&mut report, ArtifactKind::Database, path, generator.database(&schema, path), verbose)?;
    }

    report.save_to_file(&outputs.report)?;
    if verbose {
        eprintln!("{} {}", "Report saved to:".green(), outputs.report.display());
    }

    print_report_summary(&report);

    // Exit with error code if there are errors
    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Write one rendered artifact, then record it
fn emit(
    report: &mut RunReport,
    kind: ArtifactKind,
    path: &Path,
    rendered: Result<String, CodegenError>,
    verbose: bool,
) -> Result<()> {
    let written = rendered.and_then(|contents| {
        write_artifact(path, &contents)?;
        Ok(contents)
    });
    record(report, kind, path, written, verbose)
}

/// Record a written artifact, or why it was withheld
fn record(
    report: &mut RunReport,
    kind: ArtifactKind,
    path: &Path,
    written: Result<String, CodegenError>,
    verbose: bool,
) -> Result<()> {
    match written {
        Ok(contents) => {
            report.add_artifact(ArtifactRecord::new(kind, path.display().to_string(), &contents));
            if verbose {
                eprintln!("{} {}", "Wrote".green(), path.display());
            }
            Ok(())
        }
        Err(CodegenError::DanglingReference { dangling }) => {
            // Already reported by the synthesizer
            eprintln!(
                "{} {} ({} unresolvable foreign key(s))",
                "Skipped".yellow(),
                path.display(),
                dangling.len()
            );
            Ok(())
        }
        Err(err @ CodegenError::Verification(_)) => {
            eprintln!("{} {}: {}", "Skipped".yellow(), path.display(), err);
            report.extend_diagnostics(err.to_diagnostics());
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Init-config command - write default settings
fn init_config_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Config::default().save_to_file(path)?;
    println!("{} {}", "Created".green(), path.display());
    Ok(())
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Error => "ERROR".red().bold(),
        Severity::Warn => "WARN".yellow().bold(),
        Severity::Info => "INFO".cyan(),
    }
}

fn print_report_summary(report: &RunReport) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "ERD Generation Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!(
        "Entities: {}  Relationships: {}  Confidence: {:.2}",
        report.summary.entities, report.summary.relationships, report.summary.confidence
    );
    println!();

    println!("{}", "Summary:".bold());
    println!("  Total diagnostics: {}", report.summary.total);

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }

    println!("  Info:     {}", report.summary.info);
    println!();

    if !report.artifacts.is_empty() {
        println!("{}", "Artifacts:".bold());
        for artifact in &report.artifacts {
            println!(
                "  {} ({} bytes, sha256 {})",
                artifact.path.green(),
                artifact.bytes,
                &artifact.sha256[..12]
            );
        }
        println!();
    }

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            println!("  [{}] {}: {}", severity_label(diag.severity), diag.code, diag.message);
            if let Some(location) = &diag.location {
                println!("    at {}", location);
            }
            if let (Some(expected), Some(actual)) = (&diag.expected, &diag.actual) {
                println!("    expected: {}, actual: {}", expected.green(), actual.red());
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}
