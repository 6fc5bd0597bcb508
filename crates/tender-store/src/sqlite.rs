// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! SQLite procurement repository.
//!
//! A single rusqlite connection behind a mutex. Every call hops onto the
//! blocking thread pool so the async runtime is never stalled on disk I/O.
//!
//! Storage formats:
//!
//! | field | column type | format |
//! |-------|-------------|--------|
//! | prices | TEXT | decimal string, exact |
//! | dates | TEXT | `YYYY-MM-DD` |
//! | times | TEXT | `HH:MM:SS` |
//! | `created_at` | INTEGER | microseconds since the Unix epoch |

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::{debug, info};

use tender_core::error::{StoreError, StoreResult};
use tender_core::{Page, PageRequest, Procurement, ProcurementId, ProcurementRepository};

use crate::schema;
use crate::users::SqliteUserRepository;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// A [`ProcurementRepository`] backed by SQLite.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
    location: Option<PathBuf>,
}

impl SqliteRepository {
    /// Opens (or creates) a database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path).map_err(store_error)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
            location: Some(path.to_path_buf()),
        };
        repo.init_schema()?;
        info!(path = %path.display(), "Opened SQLite procurement store");
        Ok(repo)
    }

    /// Opens a private in-memory database.
    pub fn memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(store_error)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
            location: None,
        };
        repo.init_schema()?;
        Ok(repo)
    }

    /// User accounts kept in the same database.
    pub fn users(&self) -> SqliteUserRepository {
        SqliteUserRepository::new(self.clone())
    }

    /// Path of the database file, `None` for in-memory databases.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(store_error)?;
        conn.execute_batch(schema::DDL).map_err(store_error)
    }

    pub(crate) async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::unavailable(format!("{operation} task failed: {e}")))?;

        result.map_err(|e| {
            debug!(operation, error = %e, "SQLite operation failed");
            store_error(e)
        })
    }
}

#[async_trait]
impl ProcurementRepository for SqliteRepository {
    async fn insert(&self, mut record: Procurement) -> StoreResult<Procurement> {
        let values = encode(&record);
        let id = self
            .with_conn("insert", move |conn| {
                conn.execute(&schema::insert_sql(), params_from_iter(values.iter()))?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        record.id = Some(ProcurementId::new(id));
        // The column holds microseconds; hand back exactly what was stored.
        record.created_at = record
            .created_at
            .and_then(|at| DateTime::from_timestamp_micros(at.timestamp_micros()));
        Ok(record)
    }

    async fn replace(&self, record: Procurement) -> StoreResult<Option<Procurement>> {
        let Some(id) = record.id else {
            return Ok(None);
        };
        let mut values = encode(&record);
        values.push(Value::Integer(id.get()));

        self.with_conn("replace", move |conn| {
            let changed = conn.execute(&schema::update_sql(), params_from_iter(values.iter()))?;
            if changed == 0 {
                return Ok(None);
            }
            select_one(conn, id)
        })
        .await
    }

    async fn find_by_id(&self, id: ProcurementId) -> StoreResult<Option<Procurement>> {
        self.with_conn("find_by_id", move |conn| select_one(conn, id))
            .await
    }

    async fn find_all(&self, page: PageRequest) -> StoreResult<Page<Procurement>> {
        self.with_conn("find_all", move |conn| {
            select_page(conn, "", Vec::new(), page)
        })
        .await
    }

    async fn find_by_ids(
        &self,
        ids: &[ProcurementId],
        page: PageRequest,
    ) -> StoreResult<Page<Procurement>> {
        let mut ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(Page::empty(page));
        }

        self.with_conn("find_by_ids", move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let filter = format!("WHERE id IN ({placeholders})");
            let args = ids.into_iter().map(Value::Integer).collect();
            select_page(conn, &filter, args, page)
        })
        .await
    }

    async fn find_by_fz_number(&self, fz_number: i32) -> StoreResult<Vec<Procurement>> {
        self.with_conn("find_by_fz_number", move |conn| {
            let sql = format!(
                "SELECT {} FROM procurements WHERE fz_number = ?1 ORDER BY id",
                schema::select_list()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([fz_number], decode_row)?;
            rows.collect()
        })
        .await
    }

    async fn find_created_before(
        &self,
        cutoff: DateTime<Utc>,
        page: PageRequest,
    ) -> StoreResult<Page<Procurement>> {
        let cutoff_us = cutoff.timestamp_micros();
        self.with_conn("find_created_before", move |conn| {
            select_page(
                conn,
                "WHERE created_at_us IS NOT NULL AND created_at_us < ?",
                vec![Value::Integer(cutoff_us)],
                page,
            )
        })
        .await
    }

    async fn find_by_business_key(
        &self,
        uin: &str,
        fz_number: i32,
    ) -> StoreResult<Option<Procurement>> {
        let uin = uin.to_string();
        self.with_conn("find_by_business_key", move |conn| {
            let sql = format!(
                "SELECT {} FROM procurements WHERE uin = ?1 AND fz_number = ?2 ORDER BY id LIMIT 1",
                schema::select_list()
            );
            conn.query_row(&sql, rusqlite::params![uin, fz_number], decode_row)
                .optional()
        })
        .await
    }

    async fn delete(&self, id: ProcurementId) -> StoreResult<bool> {
        self.with_conn("delete", move |conn| {
            let removed = conn.execute("DELETE FROM procurements WHERE id = ?1", [id.get()])?;
            Ok(removed > 0)
        })
        .await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.with_conn("count", |conn| {
            conn.query_row("SELECT COUNT(*) FROM procurements", [], |row| {
                row.get::<_, i64>(0)
            })
        })
        .await
        .map(|n| n.max(0) as u64)
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.with_conn("health_check", |conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        })
        .await
        .map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

// =============================================================================
// Queries
// =============================================================================

fn select_one(conn: &Connection, id: ProcurementId) -> rusqlite::Result<Option<Procurement>> {
    let sql = format!(
        "SELECT {} FROM procurements WHERE id = ?1",
        schema::select_list()
    );
    conn.query_row(&sql, [id.get()], decode_row).optional()
}

fn select_page(
    conn: &Connection,
    filter: &str,
    mut args: Vec<Value>,
    page: PageRequest,
) -> rusqlite::Result<Page<Procurement>> {
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM procurements {filter}"),
        params_from_iter(args.iter()),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {} FROM procurements {filter} ORDER BY id LIMIT ? OFFSET ?",
        schema::select_list()
    );
    args.push(Value::Integer(i64::from(page.size)));
    args.push(Value::Integer(
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    ));

    let mut stmt = conn.prepare(&sql)?;
    let content = stmt
        .query_map(params_from_iter(args.iter()), decode_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Page::new(content, page, total.max(0) as u64))
}

// =============================================================================
// Encoding
// =============================================================================

fn encode(record: &Procurement) -> Vec<Value> {
    vec![
        Value::Integer(i64::from(record.fz_number)),
        Value::Text(record.uin.clone()),
        Value::Text(record.object_of.clone()),
        Value::Text(record.publisher_name.clone()),
        opt_text(record.contract_price.map(|p| p.to_string())),
        Value::Text(record.procedure_type.clone()),
        opt_text(record.stage.clone()),
        opt_text(record.link_on_placement.clone()),
        opt_date(record.application_deadline),
        opt_text(record.application_secure.clone()),
        opt_text(record.contract_secure.clone()),
        opt_text(record.restrictions.clone()),
        opt_date(record.last_updated_from_eis),
        opt_date(record.date_of_placement),
        opt_date(record.date_of_auction),
        opt_text(record.time_of_auction.map(|t| t.format(TIME_FORMAT).to_string())),
        opt_text(record.time_zone.clone()),
        opt_text(record.etp_name.clone()),
        opt_text(record.etp_url.clone()),
        opt_date(record.summing_up_date),
        record
            .created_at
            .map_or(Value::Null, |at| Value::Integer(at.timestamp_micros())),
    ]
}

fn opt_text(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::Text)
}

fn opt_date(value: Option<NaiveDate>) -> Value {
    opt_text(value.map(|d| d.format(DATE_FORMAT).to_string()))
}

fn decode_row(row: &Row<'_>) -> rusqlite::Result<Procurement> {
    Ok(Procurement {
        id: Some(ProcurementId::new(row.get(0)?)),
        fz_number: row.get(1)?,
        uin: row.get(2)?,
        object_of: row.get(3)?,
        publisher_name: row.get(4)?,
        contract_price: parse_column(row, 5, Decimal::from_str)?,
        procedure_type: row.get(6)?,
        stage: row.get(7)?,
        link_on_placement: row.get(8)?,
        application_deadline: parse_column(row, 9, parse_date)?,
        application_secure: row.get(10)?,
        contract_secure: row.get(11)?,
        restrictions: row.get(12)?,
        last_updated_from_eis: parse_column(row, 13, parse_date)?,
        date_of_placement: parse_column(row, 14, parse_date)?,
        date_of_auction: parse_column(row, 15, parse_date)?,
        time_of_auction: parse_column(row, 16, |s| NaiveTime::parse_from_str(s, TIME_FORMAT))?,
        time_zone: row.get(17)?,
        etp_name: row.get(18)?,
        etp_url: row.get(19)?,
        summing_up_date: parse_column(row, 20, parse_date)?,
        created_at: match row.get::<_, Option<i64>>(21)? {
            None => None,
            Some(us) => Some(
                DateTime::from_timestamp_micros(us)
                    .ok_or(rusqlite::Error::IntegralValueOutOfRange(21, us))?,
            ),
        },
    })
}

fn parse_date(s: &str) -> chrono::ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
}

fn parse_column<T, E>(
    row: &Row<'_>,
    index: usize,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<Option<T>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(index)?;
    raw.map(|s| {
        parse(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn store_error(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::constraint(err.to_string())
        }
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen
            ) =>
        {
            StoreError::unavailable(err.to_string())
        }
        rusqlite::Error::FromSqlConversionFailure(index, _, inner) => {
            StoreError::corrupt(schema::column_name(*index), inner.to_string())
        }
        rusqlite::Error::IntegralValueOutOfRange(index, value) => {
            StoreError::corrupt(schema::column_name(*index), format!("out of range: {value}"))
        }
        _ => StoreError::backend(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn full_record() -> Procurement {
        let mut record = Procurement::new(44, "0373200041524000123")
            .with_object_of("Road maintenance")
            .with_publisher_name("City administration")
            .with_procedure_type("Electronic auction")
            .with_contract_price(Decimal::from_str("1234567.89").unwrap())
            .with_stage("Submission of applications")
            .with_auction(
                NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
                NaiveTime::from_hms_opt(10, 30, 0),
            )
            .with_created_at(Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap());
        record.application_deadline = NaiveDate::from_ymd_opt(2024, 5, 31);
        record.time_zone = Some("MSK".into());
        record.etp_url = Some("https://etp.example".into());
        record
    }

    #[tokio::test]
    async fn test_insert_and_read_back_every_field() {
        let repo = SqliteRepository::memory().unwrap();
        let saved = repo.insert(full_record()).await.unwrap();
        let id = saved.id.unwrap();

        let loaded = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.contract_price.unwrap().to_string(), "1234567.89");
    }

    #[tokio::test]
    async fn test_replace_keeps_created_at_and_detects_missing() {
        let repo = SqliteRepository::memory().unwrap();
        let saved = repo.insert(full_record()).await.unwrap();

        let mut update = saved.clone().with_stage("Finished");
        update.created_at = None;
        let replaced = repo.replace(update).await.unwrap().unwrap();
        assert_eq!(replaced.created_at, saved.created_at);
        assert_eq!(replaced.stage.as_deref(), Some("Finished"));

        let ghost = full_record().with_id(ProcurementId::new(4242));
        assert!(repo.replace(ghost).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_paging_and_filters() {
        let repo = SqliteRepository::memory().unwrap();
        for n in 0..7 {
            let fz = if n % 2 == 0 { 44 } else { 223 };
            repo.insert(Procurement::new(fz, format!("uin-{n}"))).await.unwrap();
        }

        let page = repo.find_all(PageRequest::of(1, 3)).await.unwrap();
        let uins: Vec<_> = page.content.iter().map(|r| r.uin.as_str()).collect();
        assert_eq!(uins, vec!["uin-3", "uin-4", "uin-5"]);
        assert_eq!(page.total_elements, 7);
        assert_eq!(page.total_pages, 3);

        assert_eq!(repo.find_by_fz_number(223).await.unwrap().len(), 3);
        assert!(repo.find_by_fz_number(615).await.unwrap().is_empty());

        let ids = [7, 1, 1, 30].map(ProcurementId::new);
        let subset = repo.find_by_ids(&ids, PageRequest::of(0, 10)).await.unwrap();
        assert_eq!(subset.total_elements, 2);
        assert_eq!(subset.content[0].uin, "uin-0");
    }

    #[tokio::test]
    async fn test_business_key_and_delete() {
        let repo = SqliteRepository::memory().unwrap();
        let saved = repo.insert(full_record()).await.unwrap();

        let found = repo
            .find_by_business_key("0373200041524000123", 44)
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.id), Some(saved.id));
        assert!(repo.find_by_business_key("0373200041524000123", 223).await.unwrap().is_none());

        assert!(repo.delete(saved.id.unwrap()).await.unwrap());
        assert!(!repo.delete(saved.id.unwrap()).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tender.db");

        {
            let repo = SqliteRepository::open(&path).unwrap();
            repo.insert(full_record()).await.unwrap();
            assert_eq!(repo.location(), Some(path.as_path()));
        }

        let reopened = SqliteRepository::open(&path).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        reopened.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_price_is_reported() {
        let repo = SqliteRepository::memory().unwrap();
        let saved = repo.insert(full_record()).await.unwrap();
        {
            let conn = repo.conn.lock();
            conn.execute("UPDATE procurements SET contract_price = 'abc'", [])
                .unwrap();
        }

        let err = repo.find_by_id(saved.id.unwrap()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::CorruptValue { ref column, .. } if column == "contract_price"
        ));
    }
}
