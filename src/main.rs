use clap::{ArgAction, Parser as ClapParser, Subcommand};
use pql_compiler::cli::{self, CliError, CompileOptions, SearchOptions};
use pql_compiler::{DocType, EngineConfig, QueryEngine};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "pql")]
#[command(about = "PQL - compile portal queries into nested-document search requests")]
#[command(version)]
struct Cli {
    /// Engine configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log compilation stages to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a PQL query into a search request
    Compile {
        /// The PQL query (reads from stdin if not provided)
        pql: Option<String>,

        /// Document type the query targets
        #[arg(short = 't', long = "type", default_value = "donor-centric")]
        doc_type: DocType,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Print the resolved expression tree instead of the request
        #[arg(long)]
        tree: bool,
    },

    /// Print a PQL query in canonical form
    Format {
        /// The PQL query (reads from stdin if not provided)
        pql: Option<String>,
    },

    /// Convert portal JSON filters to PQL
    Convert {
        /// The filters JSON (reads from stdin if not provided)
        filters: Option<String>,

        /// Document type the filters target
        #[arg(short = 't', long = "type", default_value = "donor-centric")]
        doc_type: DocType,
    },

    /// Run a PQL query against a JSON array of documents
    Search {
        /// The PQL query (reads from stdin if not provided)
        pql: Option<String>,

        /// Document type of the documents
        #[arg(short = 't', long = "type", default_value = "donor-centric")]
        doc_type: DocType,

        /// File holding the documents
        #[arg(long)]
        docs: PathBuf,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "pql_compiler=debug",
        _ => "pql_compiler=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let engine = QueryEngine::new(config);

    let output = match cli.command {
        Commands::Compile {
            pql,
            doc_type,
            pretty,
            tree,
        } => {
            let options = CompileOptions {
                pql: read_input(pql)?,
                doc_type,
                pretty,
                tree,
            };
            cli::execute_compile(&engine, &options)?
        }
        Commands::Format { pql } => cli::format_pql(&read_input(pql)?)?,
        Commands::Convert { filters, doc_type } => cli::execute_convert(&read_input(filters)?, doc_type)?,
        Commands::Search {
            pql,
            doc_type,
            docs,
            pretty,
        } => {
            let options = SearchOptions {
                pql: read_input(pql)?,
                doc_type,
                documents: fs::read_to_string(docs)?,
                pretty,
            };
            cli::execute_search(&engine, &options)?
        }
    };

    println!("{}", output);
    Ok(())
}

/// The argument, or stdin when it is omitted and something is piped in.
fn read_input(arg: Option<String>) -> Result<String, CliError> {
    match arg {
        Some(s) => Ok(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer.trim().to_string())
        }
        None => Err(CliError::NoInput),
    }
}
