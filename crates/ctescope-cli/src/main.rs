use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ctescope_core::{Config, DialectConfig};
use ctescope_sql::{QueryAnalysis, QueryAnalyzer};

/// CteScope - decompose WITH queries and extract qualified table references
#[derive(Parser)]
#[command(name = "ctescope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQL file to analyze (reads stdin when omitted)
    file: Option<PathBuf>,

    /// Inline SQL text instead of a file
    #[arg(short = 'e', long = "sql", conflicts_with = "file")]
    sql: Option<String>,

    /// SQL dialect (overrides the config file)
    #[arg(short, long, value_enum)]
    dialect: Option<DialectArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Write the JSON report to a file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Continue after a fragment fails to parse
    #[arg(short, long)]
    keep_going: bool,

    /// Path to config file (default: ctescope.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Ansi,
    Mssql,
    Postgres,
    Bigquery,
    Snowflake,
}

impl From<DialectArg> for DialectConfig {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Ansi => DialectConfig::Ansi,
            DialectArg::Mssql => DialectConfig::MsSql,
            DialectArg::Postgres => DialectConfig::Postgres,
            DialectArg::Bigquery => DialectConfig::BigQuery,
            DialectArg::Snowflake => DialectConfig::Snowflake,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Per-fragment reference listing
    Text,

    /// JSON report (stable v1 schema)
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
        }))
        .init();

    let mut config = load_config(&cli)?;
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect.into();
    }
    if cli.keep_going {
        config.keep_going = true;
    }

    if cli.verbose {
        eprintln!("{} dialect: {:?}", "Using".cyan(), config.dialect);
    }

    let sql = read_input(&cli)?;
    let analyzer = QueryAnalyzer::from_config(&config);
    let analysis = analyzer.analyze(&sql).context("query analysis failed")?;
    tracing::debug!(
        fragments = analysis.fragments.len(),
        references = analysis.all_references().count(),
        "analysis complete"
    );
    let report = analysis.to_report();

    match cli.format {
        Format::Text => print_text(&analysis),
        Format::Json => println!("{}", report.to_json()?),
    }

    if let Some(path) = &cli.output {
        report
            .save_to_file(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        eprintln!("{} {}", "Report written to".green(), path.display());
    }

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    if let Some(path) = &cli.config {
        return Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }

    let default_path = Path::new("ctescope.toml");
    if default_path.exists() {
        return Config::from_file(default_path).context("failed to load ctescope.toml");
    }

    if cli.verbose {
        eprintln!("{}", "No config file found, using defaults".yellow());
    }
    Ok(Config::default())
}

fn read_input(cli: &Cli) -> Result<String> {
    if let Some(sql) = &cli.sql {
        return Ok(sql.clone());
    }

    if let Some(path) = &cli.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }

    let mut sql = String::new();
    std::io::stdin()
        .read_to_string(&mut sql)
        .context("failed to read SQL from stdin")?;
    Ok(sql)
}

fn print_text(analysis: &QueryAnalysis) {
    for fragment in &analysis.fragments {
        let heading = if fragment.name == ctescope_core::MAIN_QUERY {
            "Main Query".to_string()
        } else {
            format!("CTE {}", fragment.name)
        };
        println!("{}", heading.cyan().bold());
        println!("{}", fragment.sql);

        if fragment.references.is_empty() {
            println!("{}", "  (no table references)".dimmed());
        } else {
            println!("{}", "Databases, Schemas, Tables and Aliases:".cyan());
            for reference in &fragment.references {
                println!(
                    "  Database: {}, Schema: {}, Table: {}, Alias: {}",
                    render_component(reference.database.as_deref()),
                    render_component(reference.schema.as_deref()),
                    reference.table,
                    reference.alias
                );
            }
        }

        for diagnostic in &fragment.diagnostics {
            println!("  {}", diagnostic.to_string().yellow());
        }

        println!();
    }
}

fn render_component(component: Option<&str>) -> &str {
    component.unwrap_or("-")
}
