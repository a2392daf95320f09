//! eventql query inspector
//!
//! Prints the targets, aliases and field map of a query as JSON and, given name
//! mappings, the rewritten statement.
//!
//! ```text
//! eql_inspect "SELECT a, other.b FROM TargetA AS other"
//! eql_inspect --file query.epl --map TargetA=T_0001 --config analysis.yaml
//! ```

use clap::Parser;
use eventql::eventql::sql::query::SubQuery;
use eventql::eventql::sql::{FEATURES, VERSION};
use eventql::{AnalysisConfig, Query, QueryRewriter};
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "eql_inspect")]
#[command(about = "Inspect targets, aliases and fields of an event query")]
#[command(version)]
struct Cli {
    /// Query expression (omit when using --file)
    expression: Option<String>,

    /// Read the query expression from a file
    #[arg(short, long, conflicts_with = "expression")]
    file: Option<PathBuf>,

    /// Query name used in the report
    #[arg(long, default_value = "inspect")]
    name: String,

    /// Query group used in the report
    #[arg(long)]
    group: Option<String>,

    /// Target name mapping `logical=physical`; repeat for several targets
    #[arg(short, long = "map", value_parser = parse_mapping)]
    mappings: Vec<(String, String)>,

    /// Analysis configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also report every nested subquery
    #[arg(long)]
    subqueries: bool,
}

fn parse_mapping(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((logical, physical)) if !logical.is_empty() && !physical.is_empty() => {
            Ok((logical.to_string(), physical.to_string()))
        }
        _ => Err(format!("expected logical=physical, got '{}'", value)),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match inspect(cli) {
        Ok(report) => println!("{}", report),
        Err(error) => {
            eprintln!("❌ {}", error);
            process::exit(1);
        }
    }
}

fn inspect(cli: Cli) -> Result<String, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    let expression = match (&cli.expression, &cli.file) {
        (Some(expression), _) => expression.clone(),
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => return Err("a query expression or --file is required".into()),
    };

    let mut builder = Query::builder(cli.name, expression).config(config.clone());
    if let Some(group) = cli.group {
        builder = builder.group(group);
    }
    let query = builder.build()?;
    log::debug!("Inspecting query '{}'", query.name());

    let mut report = json!({
        "query": query.to_info()?,
        "aliases": query.aliases()?,
        "fields": query.field_map()?,
        "analyzer": { "version": VERSION, "features": FEATURES },
    });

    if cli.subqueries {
        let subqueries: Vec<_> = query
            .subqueries()?
            .into_iter()
            .map(|subquery: SubQuery<'_>| {
                json!({
                    "statement": subquery.ast().to_string(),
                    "targets": subquery.targets(),
                    "aliases": subquery.aliases(),
                })
            })
            .collect();
        report["subqueries"] = json!(subqueries);
    }

    if !cli.mappings.is_empty() {
        let mapping: HashMap<String, String> = cli.mappings.into_iter().collect();
        let mut model = query.compile()?;
        QueryRewriter::with_config(&mapping, config).rewrite(&mut model)?;
        report["rewritten"] = json!(model.to_epl());
    }

    Ok(serde_json::to_string_pretty(&report)?)
}
