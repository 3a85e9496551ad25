//! rowsql CLI
//!
//! Command-line access to the repository. Every command prints JSON.

use clap::{Args, Parser, Subcommand};
use rowsql_core::{ColumnInput, InputKind, Page, RowItem};
use serde::Serialize;
use serde_json::json;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info};

use rowsql::{Config, Database, LogContext, Repository};

/// Browse and edit database tables without writing SQL.
#[derive(Parser)]
#[command(name = "rowsql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Row ordering, shared by listing and the commands that re-scan a page.
#[derive(Args)]
struct Ordering {
    /// Column to order by.
    #[arg(long, default_value = "")]
    order_by: String,

    /// Order descending.
    #[arg(long)]
    desc: bool,
}

impl Ordering {
    const fn dir(&self) -> &'static str {
        if self.desc {
            "desc"
        } else {
            "asc"
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List tables.
    Tables,

    /// List the columns of a table.
    Columns {
        /// Table name.
        table: String,
    },

    /// List a page of rows, each prefixed with its token.
    Rows {
        /// Table name.
        table: String,

        /// Page number, starting at 1.
        #[arg(short, long, default_value_t = 1)]
        page: i64,

        #[command(flatten)]
        ordering: Ordering,
    },

    /// Show the row behind a token.
    Get {
        /// Table name.
        table: String,

        /// Row token from `rows`.
        token: String,

        /// Page the row was listed on.
        #[arg(short, long, default_value_t = 1)]
        page: i64,

        #[command(flatten)]
        ordering: Ordering,
    },

    /// Insert a row from `column=value` pairs.
    Insert {
        /// Table name.
        table: String,

        /// Values as `column=value` or `column:kind=value`.
        #[arg(value_parser = parse_item)]
        values: Vec<RowItem>,
    },

    /// Update the row behind a token.
    Update {
        /// Table name.
        table: String,

        /// Row token from `rows`.
        token: String,

        /// Values as `column=value` or `column:kind=value`.
        #[arg(value_parser = parse_item, required = true)]
        values: Vec<RowItem>,

        /// Page the row was listed on.
        #[arg(short, long, default_value_t = 1)]
        page: i64,

        #[command(flatten)]
        ordering: Ordering,
    },

    /// Delete the row behind a token.
    Delete {
        /// Table name.
        table: String,

        /// Row token from `rows`.
        token: String,

        /// Page the row was listed on.
        #[arg(short, long, default_value_t = 1)]
        page: i64,

        #[command(flatten)]
        ordering: Ordering,
    },

    /// Create a table from `name:TYPE[:flags]` columns.
    ///
    /// Flags are comma-separated: `pk`, `ai`, `unique`, `null`.
    CreateTable {
        /// Table name.
        table: String,

        /// Column definitions, e.g. `id:INTEGER:pk,ai` or `name:VARCHAR(80)`.
        #[arg(value_parser = parse_column, required = true)]
        columns: Vec<ColumnInput>,
    },

    /// Drop a table.
    DropTable {
        /// Table name.
        table: String,

        /// The exact statement, e.g. "DROP TABLE IF EXISTS users".
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Count the rows of a table.
    Count {
        /// Table name.
        table: String,
    },

    /// Show the mutation history.
    History {
        /// Page number, starting at 1.
        #[arg(short, long, default_value_t = 1)]
        page: i64,

        /// Delete this entry instead of listing.
        #[arg(long)]
        delete: Option<i64>,
    },

    /// Show the column types offered by `create-table`.
    Types,
}

/// Parses `column=value` or `column:kind=value`.
fn parse_item(raw: &str) -> Result<RowItem, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected column=value, got '{raw}'"))?;
    let (column, kind) = match key.split_once(':') {
        Some((column, kind)) => (column, parse_kind(kind)?),
        None => (key, InputKind::Text),
    };
    Ok(RowItem::new(column, value).kind(kind))
}

fn parse_kind(raw: &str) -> Result<InputKind, String> {
    serde_json::from_value(json!(raw.to_ascii_lowercase()))
        .map_err(|_| format!("unknown input kind '{raw}'"))
}

/// Parses `name:TYPE[:flags]`, with an optional `(size)` on the type.
fn parse_column(raw: &str) -> Result<ColumnInput, String> {
    let mut parts = raw.splitn(3, ':');
    let name = parts.next().unwrap_or_default();
    let ty = parts
        .next()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| format!("expected name:TYPE, got '{raw}'"))?;

    let mut column = match ty.split_once('(') {
        Some((base, size)) => {
            let size = size
                .strip_suffix(')')
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| format!("invalid size in '{ty}'"))?;
            ColumnInput::new(name, base.trim()).size(size)
        }
        None => ColumnInput::new(name, ty),
    };

    for flag in parts.next().unwrap_or_default().split(',').filter(|f| !f.is_empty()) {
        column = match flag.trim().to_ascii_lowercase().as_str() {
            "pk" => column.primary_key(),
            "ai" => column.auto_increment(),
            "unique" => column.unique(),
            "null" => column.nullable(),
            other => return Err(format!("unknown column flag '{other}'")),
        };
    }
    Ok(column)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config;
    let db = Database::connect(&config.database_url).await?;
    let repo = Repository::new(db.clone(), config.max_items_per_page, config.cache_capacity);
    repo.init().await?;
    debug!(dialect = %repo.kind(), "Connected");

    let window = |page: i64| Page::new(page, repo.max_per_page());

    match cli.command {
        Commands::Tables => print_json(&repo.list_tables().await?)?,

        Commands::Columns { table } => print_json(&repo.list_columns(&table).await?)?,

        Commands::Rows {
            table,
            page,
            ordering,
        } => {
            let columns = repo.list_columns(&table).await?;
            let rows = repo
                .list_page(&table, page, &ordering.order_by, ordering.dir())
                .await?;
            let total = repo.count_rows(&table).await?;

            let mut names = vec![String::from("token")];
            names.extend(columns.into_iter().map(|c| c.name));
            print_json(&json!({
                "columns": names,
                "rows": rows,
                "page": page.max(1),
                "hasNext": window(page).has_next(total),
            }))?;
        }

        Commands::Get {
            table,
            token,
            page,
            ordering,
        } => {
            repo.set_scan_order(&table, &ordering.order_by, ordering.dir());
            let page = window(page);
            let row = repo
                .get_row_by_token(&table, &token, page.offset(), page.per_page)
                .await?;
            print_json(&row)?;
        }

        Commands::Insert { table, values } => {
            let affected = repo.insert_row(&table, &values).await?;
            print_json(&json!({ "inserted": affected }))?;
        }

        Commands::Update {
            table,
            token,
            values,
            page,
            ordering,
        } => {
            repo.set_scan_order(&table, &ordering.order_by, ordering.dir());
            let page = window(page);
            let affected = repo
                .update_row(&table, &token, &values, page.offset(), page.per_page)
                .await?;
            print_json(&json!({ "updated": affected }))?;
        }

        Commands::Delete {
            table,
            token,
            page,
            ordering,
        } => {
            repo.set_scan_order(&table, &ordering.order_by, ordering.dir());
            let page = window(page);
            let affected = repo
                .delete_row(&table, &token, page.offset(), page.per_page)
                .await?;
            print_json(&json!({ "deleted": affected }))?;
        }

        Commands::CreateTable { table, columns } => {
            repo.create_table(&table, &columns).await?;
            print_json(&json!({ "created": table }))?;
        }

        Commands::DropTable { table, confirm } => match confirm {
            Some(confirmation) => {
                repo.delete_table(&table, &confirmation).await?;
                print_json(&json!({ "dropped": table }))?;
            }
            None => {
                let expected = repo.drop_confirmation(&table)?;
                info!("Pass --confirm \"{expected}\" to drop '{table}'");
                print_json(&json!({ "confirm": expected }))?;
            }
        },

        Commands::Count { table } => print_json(&json!({ "count": repo.count_rows(&table).await? }))?,

        Commands::History { page, delete } => match delete {
            Some(id) => print_json(&json!({ "deleted": repo.delete_history(id).await? }))?,
            None => print_json(&repo.list_history(page).await?)?,
        },

        Commands::Types => print_json(&repo.type_catalog())?,
    }

    db.close().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.config.validate()?;

    let dispatch = LogContext::from_config(&cli.config, cli.verbose).dispatch()?;
    run(cli).with_subscriber(dispatch).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        let item = parse_item("name=ann").unwrap();
        assert_eq!(item, RowItem::new("name", "ann"));

        let item = parse_item("doc:json={\"a\":1}").unwrap();
        assert_eq!(item.column, "doc");
        assert_eq!(item.kind, InputKind::Json);
        assert_eq!(item.value, "{\"a\":1}");

        let item = parse_item("note=a=b").unwrap();
        assert_eq!(item.value, "a=b");

        assert!(parse_item("novalue").is_err());
        assert!(parse_item("x:blob=1").is_err());
    }

    #[test]
    fn test_parse_column() {
        let column = parse_column("id:INTEGER:pk,ai").unwrap();
        assert_eq!(
            column,
            ColumnInput::new("id", "INTEGER").primary_key().auto_increment()
        );

        let column = parse_column("name:VARCHAR(80):unique,null").unwrap();
        assert_eq!(column.data_type, "VARCHAR");
        assert_eq!(column.size, Some(80));
        assert!(column.unique && column.nullable);

        let column = parse_column("price:DOUBLE PRECISION").unwrap();
        assert_eq!(column.data_type, "DOUBLE PRECISION");

        assert!(parse_column("id").is_err());
        assert!(parse_column("id:VARCHAR(x)").is_err());
        assert!(parse_column("id:INTEGER:sparkly").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "rowsql",
            "-d",
            "app.db",
            "rows",
            "people",
            "--page",
            "2",
            "--order-by",
            "name",
            "--desc",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Rows { page: 2, ref ordering, .. }
                if ordering.order_by == "name" && ordering.dir() == "desc"
        ));

        let cli = Cli::try_parse_from([
            "rowsql", "-d", "app.db", "delete", "people", "a1b2c3", "--page", "3", "--order-by",
            "name",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Delete { page: 3, ref token, ref ordering, .. }
                if token == "a1b2c3" && ordering.order_by == "name" && ordering.dir() == "asc"
        ));

        let cli = Cli::try_parse_from([
            "rowsql",
            "-d",
            "app.db",
            "drop-table",
            "people",
            "--confirm",
            "DROP TABLE IF EXISTS people",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::DropTable { confirm: Some(_), .. }));
    }
}
