use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::Value as JsonValue;
use tracing_subscriber::EnvFilter;

use sql_record::{Database, DatabaseOptions, Record, SortDirection, SqlRecordError, Table};

#[derive(Parser, Debug)]
#[command(author, version, about = "Query a SQLite file through sql-record and print JSON")]
struct Args {
    /// Database file; created if missing.
    #[arg(long)]
    db: String,
    #[arg(long)]
    wal: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run raw SQL (several statements allowed).
    Exec { sql: String },
    /// Run a raw SELECT and print the rows.
    Query { sql: String },
    /// Print the row with the given primary key.
    Find {
        #[command(flatten)]
        table: TableArgs,
        #[arg(long)]
        id: i64,
    },
    /// Print the first row under the given order.
    First(OrderedArgs),
    /// Print the last row under the given order.
    Last(OrderedArgs),
    /// Print the number of rows.
    Count {
        #[command(flatten)]
        table: TableArgs,
    },
    /// Insert a JSON object, or an array of objects in one transaction.
    Insert {
        #[command(flatten)]
        table: TableArgs,
        json: String,
    },
}

#[derive(ClapArgs, Debug)]
struct TableArgs {
    #[arg(long)]
    table: String,
    #[arg(long, default_value = "id")]
    primary_key: String,
}

#[derive(ClapArgs, Debug)]
struct OrderedArgs {
    #[command(flatten)]
    table: TableArgs,
    #[arg(long)]
    order: Option<String>,
    #[arg(long, value_enum, default_value = "asc")]
    direction: SortDirection,
}

impl TableArgs {
    fn open(&self, db: &Database) -> Result<Table, SqlRecordError> {
        db.table(&self.table).with_primary_key(&self.primary_key)
    }
}

impl OrderedArgs {
    fn open(&self, db: &Database) -> Result<Table, SqlRecordError> {
        let table = self.table.open(db)?;
        match &self.order {
            Some(column) => table.order_by_dir(column, self.direction),
            None => Ok(table),
        }
    }
}

async fn run(args: Args) -> Result<Option<JsonValue>, SqlRecordError> {
    let db = DatabaseOptions::builder(args.db).wal(args.wal).build().await?;
    let output = match args.command {
        Command::Exec { sql } => {
            db.execute(&sql).await?;
            None
        }
        Command::Query { sql } => Some(db.query_json(&sql).await?),
        Command::Find { table, id } => Some(record_json(table.open(&db)?.find(id).await?)),
        Command::First(ordered) => Some(record_json(ordered.open(&db)?.first().await?)),
        Command::Last(ordered) => Some(record_json(ordered.open(&db)?.last().await?)),
        Command::Count { table } => Some(JsonValue::from(table.open(&db)?.count().await?)),
        Command::Insert { table, json } => {
            let value: JsonValue = serde_json::from_str(&json)
                .map_err(|e| SqlRecordError::InvalidInsert(format!("argument is not JSON: {e}")))?;
            Some(JsonValue::from(table.open(&db)?.insert_json(&value).await?))
        }
    };
    db.close().await?;
    Ok(output)
}

fn record_json(record: Option<Record>) -> JsonValue {
    record.map_or(JsonValue::Null, |r| r.data())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(Args::parse()).await {
        Ok(None) => ExitCode::SUCCESS,
        Ok(Some(output)) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string())
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            let payload = serde_json::to_string(&err.to_payload())
                .unwrap_or_else(|_| format!("{{\"message\":{:?}}}", err.to_string()));
            eprintln!("{payload}");
            ExitCode::FAILURE
        }
    }
}
