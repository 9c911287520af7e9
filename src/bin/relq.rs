//! relq: compile query definitions to SQL.
//!
//! # Usage
//!
//! ```bash
//! # Compile a comprehension stored as JSON
//! relq build query.json --dialect sqlserver
//!
//! # Table DDL
//! relq ddl users.json --dialect sqlite
//!
//! # What each dialect supports
//! relq dialects
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use relq::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relq")]
#[command(version)]
#[command(about = "Relational query compiler", long_about = None)]
#[command(after_help = "EXAMPLES:
    relq build query.json
    relq build query.json --dialect derby
    relq ddl users.json --dialect mysql
    RELQ_LOG=relq=debug relq build query.json")]
struct Cli {
    /// Target dialect, overriding the config file
    #[arg(short, long, global = true, env = "RELQ_DIALECT")]
    dialect: Option<DialectKind>,

    /// Config file (default: ./relq.toml, then the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON comprehension to SQL
    Build {
        /// Path to the comprehension JSON
        file: PathBuf,
    },
    /// Print create and drop statements for a JSON table definition
    Ddl {
        /// Path to the table definition JSON
        file: PathBuf,
    },
    /// List built-in dialects and the capabilities they lack
    Dialects,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("RELQ_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Build { file } => build(cli, file),
        Commands::Ddl { file } => ddl(cli, file),
        Commands::Dialects => {
            show_dialects();
            Ok(())
        }
    }
}

fn compiler(cli: &Cli) -> Result<Compiler> {
    let mut config = match &cli.config {
        Some(path) => CompilerConfig::load(path).with_context(|| format!("reading {}", path.display()))?,
        None => CompilerConfig::discover()?,
    };
    if let Some(kind) = cli.dialect {
        config.dialect = kind;
    }
    Ok(Compiler::from_config(&config))
}

fn build(cli: &Cli, file: &Path) -> Result<()> {
    let content = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let query: Comprehension =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", file.display()))?;

    let compiler = compiler(cli)?;
    let stmt = compiler.select(&query)?;

    println!("{} {}", "Dialect:".dimmed(), compiler.dialect().name().cyan());
    println!("{}", "Generated SQL:".green().bold());
    println!("{}", stmt.sql.white());

    if !stmt.setters.is_empty() {
        println!();
        println!("{}", "Parameters:".cyan());
        for (i, kind) in stmt.setter_kinds().iter().enumerate() {
            println!("  ?{} : {}", i + 1, kind.to_string().yellow());
        }
    }
    if stmt.skip_rows > 0 {
        println!();
        println!(
            "{}",
            format!("⚠ Skip the first {} rows of the result on the client", stmt.skip_rows).yellow()
        );
    }
    Ok(())
}

fn ddl(cli: &Cli, file: &Path) -> Result<()> {
    let content = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let table: TableDef = serde_json::from_str(&content).with_context(|| format!("parsing {}", file.display()))?;

    let compiler = compiler(cli)?;
    println!("{}", "-- create".green().bold());
    for stmt in compiler.create_table(&table)? {
        println!("{};", stmt);
    }
    println!();
    println!("{}", "-- drop".green().bold());
    for stmt in compiler.drop_table(&table)? {
        println!("{};", stmt);
    }
    Ok(())
}

fn show_dialects() {
    for kind in DialectKind::ALL {
        let dialect = kind.profile();
        let missing = dialect.capabilities().missing();
        let summary = if missing.is_empty() {
            "full capability set".green().to_string()
        } else {
            let names: Vec<&str> = missing.iter().map(|c| c.name()).collect();
            format!("{} {}", "lacks".dimmed(), names.join(", ").yellow())
        };
        println!("{:10} {}", kind.name().cyan().bold(), summary);
    }
}
