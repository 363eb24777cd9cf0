use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "mediator")]
/// SPARQL query mediator over federated relational sources
pub struct Args {
    /// The log level (trace, debug, info, warn or error)
    ///
    /// The RUST_LOG environment variable takes precedence.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Executes a SPARQL query against the sources of a configuration
    Query {
        /// The TOML configuration of the ontology and the sources
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// The SPARQL query to execute
        ///
        /// If no query or query file are given, stdin is read.
        #[arg(short, long, conflicts_with = "query_file")]
        query: Option<String>,
        /// File in which the query is stored
        #[arg(long, conflicts_with = "query", value_hint = ValueHint::FilePath)]
        query_file: Option<PathBuf>,
        /// File in which the query results will be stored
        ///
        /// If no file is given, stdout is used.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        results_file: Option<PathBuf>,
        /// The format of the results
        ///
        /// It can be an extension like "json" or "nt" or a MIME type like
        /// "application/sparql-results+json".
        ///
        /// By default the format is guessed from the results file extension. Solutions and
        /// booleans fall back to JSON and graphs to N-Triples.
        #[arg(long)]
        results_format: Option<String>,
        /// Overrides the edit distance threshold of the configuration
        #[arg(long)]
        ambiguity_threshold: Option<usize>,
    },
    /// Prints the sources of a configuration with their tables and keys
    DescribeSources {
        /// The TOML configuration of the ontology and the sources
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
    },
}
