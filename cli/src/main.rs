use crate::cli::{Args, Command};
use crate::config::MediatorConfig;
use anyhow::{anyhow, bail, Context};
use clap::Parser;
use mediator::common::{SourceDescriptor, SourceRegistry};
use mediator::engine::QueryResults;
use mediator::storage::{GraphOntology, RelationalSource, TableDescriptor};
use mediator::{Mediator, MediatorOptions};
use oxrdfio::RdfFormat;
use sparesults::QueryResultsFormat;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, stdin, stdout, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let matches = Args::parse();
    init_tracing(&matches.log_level)?;
    match matches.command {
        Command::Query {
            config,
            query,
            query_file,
            results_file,
            results_format,
            ambiguity_threshold,
        } => {
            let query = if let Some(query) = query {
                query
            } else if let Some(query_file) = query_file {
                fs::read_to_string(&query_file).with_context(|| {
                    format!("Not able to read query file {}", query_file.display())
                })?
            } else {
                io::read_to_string(stdin().lock())?
            };
            let config = MediatorConfig::from_path(&config)?;
            let mediator = build_mediator(&config, ambiguity_threshold).await?;
            let results = mediator.query(&query).await?;

            match results_file {
                Some(results_file) => {
                    let format = results_format
                        .or_else(|| extension(&results_file).map(str::to_owned));
                    close_file_writer(write_results(
                        results,
                        format.as_deref(),
                        BufWriter::new(File::create(&results_file)?),
                    )?)?;
                }
                None => {
                    write_results(results, results_format.as_deref(), stdout().lock())?
                        .flush()?;
                }
            }
            Ok(())
        }
        Command::DescribeSources { config } => {
            let config = MediatorConfig::from_path(&config)?;
            let registry = build_registry(&config).await?;
            describe_sources(&registry, stdout().lock()).await?.flush()?;
            Ok(())
        }
    }
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .with_context(|| format!("Invalid log level '{log_level}'"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow!("Failed to initialize logging: {error}"))
}

async fn build_mediator(
    config: &MediatorConfig,
    ambiguity_threshold: Option<usize>,
) -> anyhow::Result<Mediator> {
    let format = match &config.ontology_format {
        Some(format) => rdf_format_from_name(format)?,
        None => rdf_format_from_path(&config.ontology)?,
    };
    let file = File::open(&config.ontology).with_context(|| {
        format!("Not able to open the ontology {}", config.ontology.display())
    })?;
    let ontology = GraphOntology::from_reader(format, None, file).with_context(|| {
        format!("Not able to load the ontology {}", config.ontology.display())
    })?;

    let registry = build_registry(config).await?;
    let options = MediatorOptions {
        ambiguity_threshold: ambiguity_threshold
            .or(config.ambiguity_threshold)
            .unwrap_or(MediatorOptions::default().ambiguity_threshold),
    };
    Ok(Mediator::new_with_options(
        registry,
        Arc::new(ontology),
        options,
    ))
}

async fn build_registry(config: &MediatorConfig) -> anyhow::Result<SourceRegistry> {
    let mut registry = SourceRegistry::new();
    for source_config in &config.sources {
        let mut source = RelationalSource::new(&source_config.database);
        for table_config in &source_config.tables {
            let mut table = TableDescriptor::new(&table_config.name);
            if let Some(primary_key) = &table_config.primary_key {
                table = table.with_primary_key(primary_key);
            }
            for foreign_key in &table_config.foreign_keys {
                table = table.with_foreign_key(&foreign_key.column, &foreign_key.references);
            }
            let path = table_config.csv.to_str().with_context(|| {
                format!("The path {} is not valid UTF-8", table_config.csv.display())
            })?;
            source.register_csv(table, path).await.with_context(|| {
                format!(
                    "Not able to register the table {} of {}",
                    table_config.name, source_config.database
                )
            })?;
        }
        info!(
            namespace = %source_config.namespace(),
            tables = source.tables().len(),
            "Registered source"
        );
        let descriptor = SourceDescriptor::new(source_config.namespace(), Arc::new(source))?;
        registry.register(descriptor).with_context(|| {
            format!("Not able to register the source {}", source_config.database)
        })?;
    }
    Ok(registry)
}

async fn describe_sources<W: Write>(
    registry: &SourceRegistry,
    mut writer: W,
) -> anyhow::Result<W> {
    for source in registry.sources() {
        writeln!(writer, "{} ({})", source.namespace(), source.database())?;
        let loader = source.loader();
        for table in loader.list_tables().await? {
            match loader.primary_key(&table).await {
                Ok(primary_key) => writeln!(writer, "  {table} [{primary_key}]")?,
                Err(_) => writeln!(writer, "  {table}")?,
            }
        }
    }
    Ok(writer)
}

fn write_results<W: Write>(
    results: QueryResults,
    format: Option<&str>,
    writer: W,
) -> anyhow::Result<W> {
    Ok(match results {
        QueryResults::Graph(_) => {
            let format = match format {
                Some(format) => rdf_format_from_name(format)?,
                None => RdfFormat::NTriples,
            };
            results.write_graph(writer, format)?
        }
        QueryResults::Solutions(_) | QueryResults::Boolean(_) => {
            let format = match format {
                Some(format) => query_results_format_from_name(format)?,
                None => QueryResultsFormat::Json,
            };
            results.write(writer, format)?
        }
    })
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(OsStr::to_str)
}

fn format_from_path<T>(
    path: &Path,
    from_extension: impl FnOnce(&str) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    if let Some(ext) = extension(path) {
        from_extension(ext).map_err(|e| {
            e.context(format!(
                "Not able to guess the file format from file name extension '{ext}'"
            ))
        })
    } else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    }
}

fn rdf_format_from_path(path: &Path) -> anyhow::Result<RdfFormat> {
    format_from_path(path, |ext| {
        RdfFormat::from_extension(ext)
            .with_context(|| format!("The file extension '{ext}' is unknown"))
    })
}

fn rdf_format_from_name(name: &str) -> anyhow::Result<RdfFormat> {
    if let Some(t) = RdfFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = RdfFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The file format '{name}' is unknown")
}

fn query_results_format_from_name(name: &str) -> anyhow::Result<QueryResultsFormat> {
    if let Some(t) = QueryResultsFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = QueryResultsFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The query results format '{name}' is unknown")
}

fn close_file_writer(writer: BufWriter<File>) -> io::Result<()> {
    let mut file = writer
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?;
    file.flush()?;
    file.sync_all()
}
