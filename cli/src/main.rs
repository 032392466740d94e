use clap::{Args, Parser, Subcommand};
use querykit::*;
use std::io::{self, Read};
use std::process::exit;

/// Querykit SQL builder
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the SQL statement for a JSON query description
    Build(BuildArgs),
    /// Summarize the tables of a schema
    Tables(TablesArgs),
}

#[derive(Debug, Args)]
struct BuildArgs {
    /// Path to the schema JSON file
    #[arg(short, long)]
    schema: String,
    /// The query description to build. If empty, stdin will be used.
    query: Option<String>,
}

#[derive(Debug, Args)]
struct TablesArgs {
    /// Path to the schema JSON file
    #[arg(short, long)]
    schema: String,
}

fn get_stdin() -> String {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).unwrap();
    buffer
}

fn load_database(path: &str) -> Database {
    let schema_json = std::fs::read_to_string(path).unwrap();
    Database::from_json(&schema_json).unwrap()
}

fn build(args: BuildArgs) {
    let description_json = args.query.unwrap_or_else(get_stdin);
    let db = load_database(&args.schema);
    let description = QueryDescription::from_json(&description_json).unwrap();
    let query = description.build(&db).unwrap();
    match query.sql_string() {
        Some(sql) => println!("{sql}"),
        None => {
            eprintln!("query cannot be rendered: nothing to select");
            exit(1);
        }
    }
}

fn tables(args: TablesArgs) {
    let db = load_database(&args.schema);
    let locale = Locale::default();
    for table in &db.tables {
        let kind = match table.kind {
            TableKind::Table => "table",
            TableKind::Linker => "linker",
        };
        println!("{} ({kind})", table.display_name(&locale));
        for field in &table.fields {
            let operators = field
                .allowed_operators()
                .iter()
                .map(|op| op.label())
                .collect::<Vec<_>>()
                .join(", ");
            println!("  {} [{:?}] {operators}", field.label, field.field_type);
        }
    }
}

fn main() {
    let args = Cli::parse();
    match args.command {
        Command::Build(args) => build(args),
        Command::Tables(args) => tables(args),
    }
}
