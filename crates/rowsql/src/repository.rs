//! The repository: every table, row and history operation.
//!
//! All I/O goes through here. Each table-addressed call first checks the
//! table against the allow-list gathered by [`Repository::list_tables`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use rowsql_core::{
    row_token, Builder, ColumnDescriptor, ColumnInput, DialectKind, Page, Row, RowCache, RowItem,
    TableDescriptor, TypeCatalog, Value, HISTORY_TABLE,
};
use tracing::{debug, info, warn};

use crate::connection::Database;
use crate::error::{RepoError, Result};
use crate::history::{HistoryEntry, HistoryLog};

/// A listed row: its token followed by its values.
pub type TokenRow = Row;

/// Ordering a table was last listed with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ScanOrder {
    order_by: String,
    order_dir: String,
}

/// Data access over one database.
#[derive(Debug)]
pub struct Repository {
    db: Database,
    builder: Builder,
    cache: RowCache,
    history: HistoryLog,
    tables: RwLock<Vec<TableDescriptor>>,
    scan_orders: RwLock<HashMap<String, ScanOrder>>,
}

impl Repository {
    /// Creates a repository over `db`.
    ///
    /// `max_per_page` caps every page size; `cache_capacity` bounds the
    /// number of rows remembered by token.
    #[must_use]
    pub fn new(db: Database, max_per_page: i64, cache_capacity: usize) -> Self {
        let builder = Builder::new(db.kind(), max_per_page);
        let history = HistoryLog::new(db.clone(), max_per_page);
        Self {
            db,
            builder,
            cache: RowCache::new(cache_capacity),
            history,
            tables: RwLock::new(Vec::new()),
            scan_orders: RwLock::new(HashMap::new()),
        }
    }

    /// Creates the history table and loads the allow-list.
    pub async fn init(&self) -> Result<()> {
        self.history.ensure_table().await?;
        let tables = self.list_tables().await?;
        info!(dialect = %self.kind(), tables = tables.len(), "Repository ready");
        Ok(())
    }

    /// Returns the engine in use.
    #[must_use]
    pub fn kind(&self) -> DialectKind {
        self.builder.kind()
    }

    /// Returns the largest page size accepted.
    #[must_use]
    pub const fn max_per_page(&self) -> i64 {
        self.builder.max_limit()
    }

    /// Returns the row cache.
    #[must_use]
    pub const fn cache(&self) -> &RowCache {
        &self.cache
    }

    /// Returns the history log.
    #[must_use]
    pub const fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Column types offered when creating a table.
    #[must_use]
    pub fn type_catalog(&self) -> TypeCatalog {
        self.builder.dialect().type_catalog()
    }

    fn ensure_allowed(&self, table: &str) -> Result<()> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        if tables.iter().any(|t| t.name == table) {
            Ok(())
        } else {
            Err(RepoError::TableNotAllowed(String::from(table)))
        }
    }

    /// Sets the ordering used to re-scan `table` for a token.
    ///
    /// [`Self::list_rows`] records its ordering on its own. Callers that
    /// listed the page elsewhere, such as a previous process, pass it here.
    pub fn set_scan_order(&self, table: &str, order_by: &str, order_dir: &str) {
        self.scan_orders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                String::from(table),
                ScanOrder {
                    order_by: String::from(order_by),
                    order_dir: String::from(order_dir),
                },
            );
    }

    fn scan_order(&self, table: &str) -> ScanOrder {
        self.scan_orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Lists user tables and refreshes the allow-list.
    pub async fn list_tables(&self) -> Result<Vec<TableDescriptor>> {
        let (sql, args) = self.builder.list_tables();
        let rows = self
            .db
            .fetch_all(&sql, args)
            .await
            .map_err(RepoError::execution("list", "tables"))?;

        let tables: Vec<TableDescriptor> = rows
            .into_iter()
            .filter_map(|row| {
                let mut values = row.into_iter();
                let schema = values.next()?;
                let name = values.next()?;
                Some(TableDescriptor {
                    schema: if schema.is_null() {
                        String::new()
                    } else {
                        schema.to_string()
                    },
                    name: name.to_string(),
                })
            })
            .filter(|t| t.name != HISTORY_TABLE)
            .collect();

        *self.tables.write().unwrap_or_else(PoisonError::into_inner) = tables.clone();
        Ok(tables)
    }

    /// Lists the columns of an allow-listed table.
    pub async fn list_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        self.ensure_allowed(table)?;
        let (sql, args) = self.builder.list_columns(table)?;
        let rows = self
            .db
            .fetch_all(&sql, args)
            .await
            .map_err(RepoError::execution("list columns of", table))?;

        rows.into_iter()
            .map(|row| {
                let [name, declared_type, has_default, is_unique, auto_increment] =
                    <[Value; 5]>::try_from(row).map_err(|row| {
                        RepoError::Decode(format!(
                            "expected 5 column attributes, got {}",
                            row.len()
                        ))
                    })?;
                let mut column = ColumnDescriptor::new(name.to_string(), declared_type.to_string());
                column.has_default = has_default.is_truthy();
                column.is_unique = is_unique.is_truthy();
                column.has_auto_increment = auto_increment.is_truthy();
                Ok(column)
            })
            .collect()
    }

    /// Returns true if the table exists in the database right now.
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let (sql, args) = self.builder.table_exists(table)?;
        let row = self
            .db
            .fetch_optional(&sql, args)
            .await
            .map_err(RepoError::execution("look up", table))?;
        Ok(row.is_some())
    }

    /// Counts the rows of an allow-listed table.
    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        self.ensure_allowed(table)?;
        let (sql, args) = self.builder.count_rows(table)?;
        let row = self
            .db
            .fetch_optional(&sql, args)
            .await
            .map_err(RepoError::execution("count rows of", table))?;
        row.and_then(|r| r.first().and_then(Value::as_i64))
            .ok_or_else(|| RepoError::Decode(String::from("COUNT(*) returned no integer")))
    }

    /// Lists a page of rows, each prefixed with its token.
    ///
    /// Every returned row is cached under its token so that a later
    /// mutation can find it again without reading the table.
    pub async fn list_rows(
        &self,
        table: &str,
        limit: i64,
        offset: i64,
        order_by: &str,
        order_dir: &str,
    ) -> Result<Vec<TokenRow>> {
        self.ensure_allowed(table)?;
        let (sql, args) = self
            .builder
            .list_rows(table, limit, offset, order_by, order_dir)?;
        self.set_scan_order(table, order_by, order_dir);
        let rows = self
            .db
            .fetch_all(&sql, args)
            .await
            .map_err(RepoError::execution("list rows of", table))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let token = row_token(&row);
                let mut listed = Vec::with_capacity(row.len() + 1);
                listed.push(Value::Text(token.clone()));
                listed.extend(row.iter().cloned());
                self.cache.set(token, row);
                listed
            })
            .collect())
    }

    /// Lists one page of rows by page number, using the largest page size.
    pub async fn list_page(
        &self,
        table: &str,
        page: i64,
        order_by: &str,
        order_dir: &str,
    ) -> Result<Vec<TokenRow>> {
        let page = Page::new(page, self.max_per_page());
        self.list_rows(table, page.per_page, page.offset(), order_by, order_dir)
            .await
    }

    /// Resolves a token to the row's current values.
    ///
    /// A cache miss re-reads rows one at a time from `offset`, for at most
    /// `limit` rows, until one hashes to `token`. The re-read follows the
    /// table's scan order (see [`Self::set_scan_order`]). The row found is
    /// cached.
    pub async fn get_row_by_token(
        &self,
        table: &str,
        token: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Row> {
        self.ensure_allowed(table)?;
        if let Some(row) = self.cache.get(token) {
            debug!(table = %table, token = %token, "Row cache hit");
            return Ok(row);
        }

        warn!(table = %table, token = %token, offset, limit, "Row cache miss, scanning");
        let order = self.scan_order(table);
        for position in offset..offset.saturating_add(limit) {
            let (sql, args) =
                self.builder
                    .row_at(table, position, &order.order_by, &order.order_dir)?;
            let row = self
                .db
                .fetch_optional(&sql, args)
                .await
                .map_err(RepoError::execution("scan", table))?;
            let Some(row) = row else {
                break;
            };
            if row_token(&row) == token {
                self.cache.set(token, row.clone());
                return Ok(row);
            }
        }

        Err(RepoError::RowNotFound {
            table: String::from(table),
            token: String::from(token),
        })
    }

    /// Inserts a row. Returns the number of rows inserted.
    pub async fn insert_row(&self, table: &str, items: &[RowItem]) -> Result<u64> {
        self.ensure_allowed(table)?;
        self.builder.validate_items(items)?;
        let columns = self.list_columns(table).await?;
        let (sql, args) = self.builder.insert_typed(table, items, &columns)?;
        let affected = self
            .db
            .execute(&sql, args)
            .await
            .map_err(RepoError::execution("insert into", table))?;

        info!(table = %table, "Inserted row");
        self.history
            .record(&format!("Inserted row into table '{table}'"))
            .await;
        Ok(affected)
    }

    /// Updates the row identified by `token`. Returns the number of rows
    /// changed, at most one.
    ///
    /// `offset` and `limit` bound the re-scan on a cache miss.
    pub async fn update_row(
        &self,
        table: &str,
        token: &str,
        items: &[RowItem],
        offset: i64,
        limit: i64,
    ) -> Result<u64> {
        self.ensure_allowed(table)?;
        self.builder.validate_items(items)?;
        let row = self.get_row_by_token(table, token, offset, limit).await?;
        let columns = self.list_columns(table).await?;
        let (sql, args) = self.builder.update_row(table, items, &columns, &row)?;
        let affected = self
            .db
            .execute(&sql, args)
            .await
            .map_err(RepoError::execution("update", table))?;
        self.cache.delete(token);

        if affected == 0 {
            warn!(table = %table, token = %token, "Update matched no row");
            return Ok(0);
        }
        info!(table = %table, token = %token, affected, "Updated row");
        self.history
            .record(&format!("Updated row in table '{table}'"))
            .await;
        Ok(affected)
    }

    /// Deletes the row identified by `token`. Returns the number of rows
    /// removed, at most one.
    pub async fn delete_row(
        &self,
        table: &str,
        token: &str,
        offset: i64,
        limit: i64,
    ) -> Result<u64> {
        let row = self.get_row_by_token(table, token, offset, limit).await?;
        let columns = self.list_columns(table).await?;
        let (sql, args) = self.builder.delete_row(table, &columns, &row)?;
        let affected = self
            .db
            .execute(&sql, args)
            .await
            .map_err(RepoError::execution("delete from", table))?;
        self.cache.delete(token);

        if affected == 0 {
            warn!(table = %table, token = %token, "Delete matched no row");
            return Ok(0);
        }
        info!(table = %table, token = %token, affected, "Deleted row");
        self.history
            .record(&format!("Deleted row from table '{table}'"))
            .await;
        Ok(affected)
    }

    /// Creates a table and refreshes the allow-list.
    pub async fn create_table(&self, table: &str, columns: &[ColumnInput]) -> Result<()> {
        let sql = self.builder.create_table(table, columns)?;
        self.db
            .execute(&sql, Vec::new())
            .await
            .map_err(RepoError::execution("create table", table))?;
        self.list_tables().await?;

        info!(table = %table, "Created table");
        self.history.record(&format!("Created table '{table}'")).await;
        Ok(())
    }

    /// Returns the text an operator must echo back to drop `table`.
    pub fn drop_confirmation(&self, table: &str) -> Result<String> {
        self.builder.drop_table(table).map_err(RepoError::from)
    }

    /// Drops a table once `confirmation` repeats the DROP statement.
    ///
    /// Whitespace differences in the confirmation are ignored.
    pub async fn delete_table(&self, table: &str, confirmation: &str) -> Result<()> {
        self.ensure_allowed(table)?;
        let sql = self.builder.drop_table(table)?;
        if normalize_whitespace(confirmation) != normalize_whitespace(&sql) {
            return Err(RepoError::ConfirmationMismatch { expected: sql });
        }

        self.db
            .execute(&sql, Vec::new())
            .await
            .map_err(RepoError::execution("drop table", table))?;
        self.list_tables().await?;

        info!(table = %table, "Dropped table");
        self.history.record(&format!("Dropped table '{table}'")).await;
        Ok(())
    }

    /// Lists history entries, newest first.
    pub async fn list_history(&self, page: i64) -> Result<Vec<HistoryEntry>> {
        self.history
            .list(Page::new(page, self.max_per_page()))
            .await
    }

    /// Deletes one history entry.
    pub async fn delete_history(&self, id: i64) -> Result<u64> {
        self.history.delete(id).await
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use rowsql_core::InputKind;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn repository() -> Repository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        let repo = Repository::new(Database::from(pool), 10, 100);
        repo.init().await.unwrap();
        repo
    }

    async fn people(repo: &Repository) {
        repo.create_table(
            "people",
            &[
                ColumnInput::new("name", "TEXT"),
                ColumnInput::new("age", "INTEGER").nullable(),
            ],
        )
        .await
        .unwrap();
        for (name, age) in [("ann", "30"), ("bob", "41"), ("ann", "30")] {
            repo.insert_row(
                "people",
                &[
                    RowItem::new("name", name),
                    RowItem::new("age", age).kind(InputKind::Numeric),
                ],
            )
            .await
            .unwrap();
        }
    }

    fn token_of(row: &TokenRow) -> String {
        row[0].to_string()
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  DROP   TABLE\tIF EXISTS\n users "),
            "DROP TABLE IF EXISTS users"
        );
    }

    #[tokio::test]
    async fn test_history_table_is_hidden() {
        let repo = repository().await;
        assert!(repo.list_tables().await.unwrap().is_empty());
        assert!(repo.table_exists(HISTORY_TABLE).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_table_is_rejected() {
        let repo = repository().await;
        let err = repo.list_rows("people", 10, 0, "", "").await.unwrap_err();
        assert!(err.is_authorization());
        let err = repo.count_rows("people").await.unwrap_err();
        assert!(err.is_authorization());
    }

    #[tokio::test]
    async fn test_list_columns() {
        let repo = repository().await;
        repo.create_table(
            "items",
            &[
                ColumnInput::new("id", "INTEGER").primary_key().auto_increment(),
                ColumnInput::new("label", "VARCHAR").size(40).unique(),
                ColumnInput::new("doc", "JSON").nullable(),
            ],
        )
        .await
        .unwrap();

        let columns = repo.list_columns("items").await.unwrap();
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "label", "doc"]);
        assert!(columns[0].is_unique);
        assert!(columns[0].has_auto_increment);
        assert_eq!(columns[0].input_kind, InputKind::Numeric);
        assert!(columns[1].is_unique);
        assert!(!columns[2].is_unique);
        assert_eq!(columns[2].input_kind, InputKind::Json);
    }

    #[tokio::test]
    async fn test_list_rows_prepends_token_and_caches() {
        let repo = repository().await;
        people(&repo).await;

        let rows = repo.list_rows("people", 10, 0, "name", "asc").await.unwrap();
        assert_eq!(rows.len(), 3);
        for row in &rows {
            let token = token_of(row);
            assert_eq!(token, row_token(&row[1..]));
            assert_eq!(repo.cache().get(&token).as_deref(), Some(&row[1..]));
        }
        assert_eq!(repo.count_rows("people").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_get_row_by_token_rescans_after_eviction() {
        let repo = repository().await;
        people(&repo).await;

        let rows = repo.list_rows("people", 10, 0, "", "").await.unwrap();
        let token = token_of(&rows[1]);
        repo.cache().delete(&token);

        let row = repo.get_row_by_token("people", &token, 0, 10).await.unwrap();
        assert_eq!(row, vec![Value::from("bob"), Value::Int(41)]);
        assert!(repo.cache().get(&token).is_some());

        repo.cache().delete(&token);
        let err = repo
            .get_row_by_token("people", &token, 0, 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_removes_one_duplicate() {
        let repo = repository().await;
        people(&repo).await;

        let rows = repo.list_rows("people", 10, 0, "", "").await.unwrap();
        let ann = token_of(&rows[0]);
        assert_eq!(ann, token_of(&rows[2]));

        assert_eq!(repo.delete_row("people", &ann, 0, 10).await.unwrap(), 1);
        assert_eq!(repo.count_rows("people").await.unwrap(), 2);
        assert!(repo.cache().get(&ann).is_none());
    }

    #[tokio::test]
    async fn test_update_changes_one_row() {
        let repo = repository().await;
        people(&repo).await;

        let rows = repo.list_rows("people", 10, 0, "", "").await.unwrap();
        let ann = token_of(&rows[0]);
        let affected = repo
            .update_row(
                "people",
                &ann,
                &[RowItem::new("age", "").kind(InputKind::Numeric)],
                0,
                10,
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let rows = repo.list_rows("people", 10, 0, "", "").await.unwrap();
        let ages: Vec<_> = rows.iter().map(|r| r[2].clone()).collect();
        assert_eq!(ages.iter().filter(|v| v.is_null()).count(), 1);

        let nulled = rows.iter().find(|r| r[2].is_null()).unwrap();
        let affected = repo
            .update_row(
                "people",
                &token_of(nulled),
                &[RowItem::new("age", "5").kind(InputKind::Numeric)],
                0,
                10,
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_delete_table_requires_confirmation() {
        let repo = repository().await;
        people(&repo).await;

        let err = repo
            .delete_table("people", "DROP TABLE people")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::ConfirmationMismatch { ref expected } if expected == "DROP TABLE IF EXISTS people"
        ));

        repo.delete_table("people", "  drop TABLE IF EXISTS people")
            .await
            .unwrap_err();
        repo.delete_table("people", "DROP  TABLE IF EXISTS\npeople")
            .await
            .unwrap();
        assert!(!repo.table_exists("people").await.unwrap());
        assert!(repo.count_rows("people").await.unwrap_err().is_authorization());
    }

    #[tokio::test]
    async fn test_mutations_are_recorded() {
        let repo = repository().await;
        people(&repo).await;

        let history = repo.list_history(1).await.unwrap();
        let messages: Vec<_> = history.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages[0], "Inserted row into table 'people'");
        assert_eq!(messages[3], "Created table 'people'");

        assert_eq!(repo.delete_history(history[0].id).await.unwrap(), 1);
        assert_eq!(repo.list_history(1).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_fail_mutation() {
        let repo = repository().await;
        people(&repo).await;
        repo.db
            .execute(&format!("DROP TABLE {HISTORY_TABLE}"), Vec::new())
            .await
            .unwrap();
        repo.db
            .execute(
                &format!("CREATE TABLE {HISTORY_TABLE} (id INTEGER PRIMARY KEY, other TEXT)"),
                Vec::new(),
            )
            .await
            .unwrap();

        let affected = repo
            .insert_row("people", &[RowItem::new("name", "cy")])
            .await
            .unwrap();
        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_update_validates_before_resolving_token() {
        let repo = repository().await;
        people(&repo).await;

        let err = repo
            .update_row(
                "people",
                "deadbeef",
                &[RowItem::new("name", "{bad").kind(InputKind::Json)],
                0,
                10,
            )
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{err}");

        let rows = repo.list_rows("people", 10, 0, "", "").await.unwrap();
        let bob = token_of(&rows[1]);
        repo.cache().delete(&bob);
        let err = repo
            .update_row(
                "people",
                &bob,
                &[RowItem::new("name", "a"), RowItem::new("name", "b")],
                0,
                10,
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(repo.cache().get(&bob).is_none());
    }

    #[tokio::test]
    async fn test_no_history_when_nothing_changed() {
        let repo = repository().await;
        people(&repo).await;

        let rows = repo.list_rows("people", 10, 0, "", "").await.unwrap();
        let bob = token_of(&rows[1]);
        repo.db
            .execute("DELETE FROM people WHERE name = 'bob'", Vec::new())
            .await
            .unwrap();
        let before = repo.history().count().await.unwrap();

        assert_eq!(repo.delete_row("people", &bob, 0, 10).await.unwrap(), 0);
        assert_eq!(repo.history().count().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_rescan_follows_listing_order() {
        let repo = repository().await;
        people(&repo).await;

        let rows = repo.list_rows("people", 1, 0, "name", "desc").await.unwrap();
        let bob = token_of(&rows[0]);
        repo.cache().delete(&bob);
        let row = repo.get_row_by_token("people", &bob, 0, 1).await.unwrap();
        assert_eq!(row[0], Value::from("bob"));

        let other = Repository::new(repo.db.clone(), 10, 100);
        other.init().await.unwrap();
        assert!(other
            .get_row_by_token("people", &bob, 0, 1)
            .await
            .unwrap_err()
            .is_not_found());
        other.set_scan_order("people", "name", "DESC");
        assert!(other.get_row_by_token("people", &bob, 0, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_validation_happens_before_execution() {
        let repo = repository().await;
        people(&repo).await;

        let err = repo
            .insert_row("people", &[RowItem::new("name", "a"), RowItem::new("name", "b")])
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(repo.count_rows("people").await.unwrap(), 3);

        let err = repo.list_rows("people", 11, 0, "", "").await.unwrap_err();
        assert!(err.is_validation());
    }
}
