//! The sqlsheet CLI
//!
//! Inspect, expand and generate code from named SQL statement files.
//!
//! # Usage
//!
//! ```bash
//! # List the queries in a file
//! sqlsheet parse queries.sql
//!
//! # Show every whitelist expansion of one query
//! sqlsheet expand queries.sql list-users
//!
//! # Render a call without touching a database
//! sqlsheet call queries.sql list-users --kwarg role=admin --kwarg col=name
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqlsheet::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlsheet")]
#[command(version)]
#[command(about = "Named SQL statements: parse, expand whitelists, generate callables", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlsheet parse queries.sql --format json
    sqlsheet names queries.sql
    sqlsheet expand queries.sql list-users
    sqlsheet call queries.sql get-user --arg 42 --placeholder sqlite
    sqlsheet generate queries.sql -o src/queries.rs")]
struct Cli {
    /// Config file (defaults to ./sqlsheet.toml, then the user config dir)
    #[arg(long, global = true, env = "SQLSHEET_CONFIG")]
    config: Option<PathBuf>,

    /// Placeholder style for rendered SQL (overrides the config)
    #[arg(long, global = true, value_enum)]
    placeholder: Option<PlaceholderArg>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlaceholderArg {
    Postgres,
    Sqlite,
    Question,
    Named,
}

impl From<PlaceholderArg> for Placeholder {
    fn from(arg: PlaceholderArg) -> Self {
        match arg {
            PlaceholderArg::Postgres => Placeholder::Postgres,
            PlaceholderArg::Sqlite => Placeholder::Sqlite,
            PlaceholderArg::Question => Placeholder::Question,
            PlaceholderArg::Named => Placeholder::Named,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and list its queries
    Parse {
        file: PathBuf,
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List query names with the lenient header scanner
    Names { file: PathBuf },
    /// Show every whitelist expansion of a query
    Expand { file: PathBuf, query: String },
    /// Render one call of a query without executing it
    Call {
        file: PathBuf,
        query: String,
        /// Positional argument (JSON, or a bare string)
        #[arg(short, long = "arg")]
        args: Vec<String>,
        /// Keyword argument as KEY=VALUE
        #[arg(short, long = "kwarg")]
        kwargs: Vec<String>,
    },
    /// Generate a Rust module with one function per query
    Generate {
        file: PathBuf,
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "sqlsheet=debug" } else { "sqlsheet=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = SheetConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(placeholder) = cli.placeholder {
        config.placeholder = placeholder.into();
    }

    match &cli.command {
        Commands::Parse { file, format } => list_queries(&load(file)?, format),
        Commands::Names { file } => {
            for spec in scan_names(&read(file)?) {
                println!("{}", spec.to_string().cyan());
            }
            Ok(())
        }
        Commands::Expand { file, query } => {
            let query = find(&load(file)?, query)?;
            show_expansions(&query, &config)
        }
        Commands::Call {
            file,
            query,
            args,
            kwargs,
        } => {
            let query = find(&load(file)?, query)?;
            call_query(&query, args, kwargs, &config)
        }
        Commands::Generate { file, output } => {
            let code = Generator::new(config).emit(&load(file)?)?;
            match output {
                Some(path) => {
                    fs::write(path, &code)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("{} Wrote {}", "✓".green(), path.display().to_string().cyan());
                }
                None => print!("{}", code),
            }
            Ok(())
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load(path: &Path) -> Result<Vec<Query>> {
    let text = read(path)?;
    parse_all(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Look a query up by written name or identifier.
fn find(queries: &[Query], name: &str) -> Result<Query> {
    match queries.iter().find(|q| q.name() == name || q.id() == name) {
        Some(q) => Ok(q.clone()),
        None => bail!("No query named '{}'", name),
    }
}

fn list_queries(queries: &[Query], format: &OutputFormat) -> Result<()> {
    if queries.is_empty() {
        println!("{}", "(no queries)".dimmed());
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(queries)?);
        }
        OutputFormat::Table => {
            let rows: Vec<[String; 3]> = queries
                .iter()
                .map(|q| {
                    [
                        q.call_spec().to_string(),
                        q.args().to_string(),
                        Callable::new(q).expansions().to_string(),
                    ]
                })
                .collect();

            let headers = ["Query", "Arguments", "Variants"];
            let widths: Vec<usize> = (0..3)
                .map(|i| {
                    rows.iter()
                        .map(|r| r[i].chars().count())
                        .chain(std::iter::once(headers[i].len()))
                        .max()
                        .unwrap_or(0)
                })
                .collect();

            let header: Vec<String> = headers
                .iter()
                .zip(&widths)
                .map(|(h, w)| format!("{:width$}", h, width = *w))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for row in &rows {
                let cells: Vec<String> = row
                    .iter()
                    .zip(&widths)
                    .map(|(c, w)| format!("{:width$}", c, width = *w))
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} query(s)", queries.len().to_string().cyan());
        }
    }
    Ok(())
}

fn show_expansions(query: &Query, config: &SheetConfig) -> Result<()> {
    println!("{} {}", "Query:".dimmed(), query.call_spec().to_string().cyan().bold());
    println!("{} {}", "Arguments:".dimmed(), query.args().to_string().white());
    println!();

    let mut leaves = Vec::new();
    build_query_tree(query, |leaf| leaves.push(leaf.clone()));

    for (i, leaf) in leaves.iter().enumerate() {
        let rendered = leaf.to_sql(config.placeholder)?;
        println!("{} {}", format!("[{}]", i + 1).yellow(), rendered.sql.white());
        if !rendered.binds.is_empty() {
            println!("    {} {}", "binds:".dimmed(), rendered.binds.join(", "));
        }
    }

    println!();
    println!("{} variant(s)", leaves.len().to_string().cyan());
    Ok(())
}

fn call_query(query: &Query, args: &[String], kwargs: &[String], config: &SheetConfig) -> Result<()> {
    let mut call = CallArgs::new();
    for arg in args {
        call = call.arg(parse_value(arg));
    }
    for kwarg in kwargs {
        let Some((key, value)) = kwarg.split_once('=') else {
            bail!("Keyword argument '{}' must be KEY=VALUE", kwarg);
        };
        call = call.kwarg(key.trim(), parse_value(value));
    }

    let inv = Callable::new(query).call(&call, config.placeholder)?;

    println!("{}", "Generated SQL:".green().bold());
    println!("{}", inv.sql.white());
    if !inv.params.is_empty() {
        println!();
        println!("{}", "Bindings:".cyan());
        for (i, value) in inv.params.iter().enumerate() {
            println!("  {} = {}", i + 1, value.to_string().yellow());
        }
    }
    Ok(())
}

/// JSON when it parses as JSON, otherwise a bare string.
fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}
