//! salesql CLI - Compile analytics requests to parameterized SQL
//!
//! Usage:
//!   salesql compile <request.json> [--schema <schema.toml>] [--dialect <dialect>] [--output <format>]
//!   salesql schema [--schema <schema.toml>]
//!   salesql check <request.json> [--schema <schema.toml>]
//!
//! Examples:
//!   salesql compile demos/monthly_revenue.json
//!   salesql compile demos/top_products.json --dialect duckdb --output json
//!   salesql schema --schema demos/schema.toml

use clap::{Parser, Subcommand, ValueEnum};
use salesql::compile::Compiler;
use salesql::config::Settings;
use salesql::request::RawRequest;
use salesql::schema::{AllowLists, SchemaRegistry};
use salesql::sql::Dialect;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "salesql")]
#[command(about = "salesql - Compile analytics requests to parameterized SQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON request to SQL
    Compile {
        /// Path to the request .json file
        file: PathBuf,

        /// Schema TOML file (overrides the configured schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// SQL dialect to generate (overrides the configured dialect)
        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Show tables, joins and allow-lists of a schema
    Schema {
        /// Schema TOML file (overrides the configured schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Validate a JSON request without printing SQL
    Check {
        /// Path to the request .json file
        file: PathBuf,

        /// Schema TOML file (overrides the configured schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Postgres,
    Duckdb,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Duckdb => Dialect::DuckDb,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// SQL followed by the parameter list as comments
    Sql,
    /// The whole plan as JSON
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            file,
            schema,
            dialect,
            output,
        } => cmd_compile(file, schema, dialect, output),
        Commands::Schema { schema } => cmd_schema(schema),
        Commands::Check { file, schema } => cmd_check(file, schema),
    }
}

/// Build a compiler from settings, with command-line overrides applied.
fn load_compiler(schema: Option<PathBuf>, dialect: Option<DialectArg>) -> Result<Compiler, String> {
    let settings = Settings::load().map_err(|e| format!("Error loading settings: {}", e))?;

    let registry = match schema {
        Some(path) => SchemaRegistry::from_file(&path)
            .map(Arc::new)
            .map_err(|e| e.to_string())?,
        None => settings.schema_registry().map_err(|e| e.to_string())?,
    };

    let mut options = settings.compile_options();
    if let Some(dialect) = dialect {
        options = options.with_dialect(dialect.into());
    }

    Ok(Compiler::new(registry).with_options(options))
}

fn read_request(file: &Path) -> Result<RawRequest, String> {
    let source = fs::read_to_string(file)
        .map_err(|e| format!("Error reading file '{}': {}", file.display(), e))?;
    RawRequest::from_json_str(&source)
        .map_err(|e| format!("Invalid request in '{}': {}", file.display(), e))
}

fn cmd_compile(
    file: PathBuf,
    schema: Option<PathBuf>,
    dialect: Option<DialectArg>,
    output: OutputFormat,
) -> ExitCode {
    let compiled = load_compiler(schema, dialect).and_then(|compiler| {
        let raw = read_request(&file)?;
        compiler
            .compile_raw(raw)
            .map_err(|e| format!("Compilation error: {}", e))
    });

    let plan = match compiled {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match output {
        OutputFormat::Sql => {
            println!("{}", plan.sql);
            println!();
            for (i, param) in plan.params.iter().enumerate() {
                let value = serde_json::to_string(param).unwrap_or_default();
                println!("-- ${}: {}", i + 1, value);
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&plan) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing plan: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

fn cmd_schema(schema: Option<PathBuf>) -> ExitCode {
    let compiler = match load_compiler(schema, None) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let registry = compiler.registry();

    let main = registry.main();
    println!("Main table: {} (alias: {})", main.name, main.alias);
    print_allow_lists(&main.columns);
    println!("Temporal column: {}", registry.temporal_column());
    println!();

    if registry.joins().is_empty() {
        println!("No joinable tables.");
        return ExitCode::SUCCESS;
    }

    println!("Joinable tables:");
    for table in registry.joins() {
        println!("  - {} (alias: {})", table.name, table.alias);
        println!("    on: {}", table.on);
        if let Some(dep) = &table.depends_on {
            println!("    depends on: {}", dep);
        }
        print_allow_lists(&table.columns);
    }

    ExitCode::SUCCESS
}

fn print_allow_lists(lists: &AllowLists) {
    let show = |label: &str, cols: &std::collections::BTreeSet<String>| {
        if !cols.is_empty() {
            let cols: Vec<_> = cols.iter().map(String::as_str).collect();
            println!("    {}: {}", label, cols.join(", "));
        }
    };
    show("metric", &lists.metric);
    show("group by", &lists.group_by);
    show("filter", &lists.filter);
}

fn cmd_check(file: PathBuf, schema: Option<PathBuf>) -> ExitCode {
    let checked = load_compiler(schema, None).and_then(|compiler| {
        let request = read_request(&file)?
            .normalize()
            .map_err(|e| format!("Invalid request: {}", e))?;
        compiler
            .check(&request)
            .map_err(|e| format!("Invalid request: {}", e))
    });

    match checked {
        Ok(()) => {
            println!("OK: {} is valid", file.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
