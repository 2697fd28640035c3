//! Persistence gateway over SQLite.
//!
//! Every call opens its own connection and drops it before returning, so nothing is shared
//! between concurrent requests except the immutable [`DatabaseConfig`]. Writes go through
//! [`Database::execute`], which runs an ordered batch of statements in a single transaction.

mod schema;

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, Type, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, Row, Transaction};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::domain::{
    BloodType, DonationId, DonorId, RequestStatus, ScreeningId, UnitId, UnitStatus,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One parameterized statement in a transactional batch.
#[derive(Debug, Clone)]
pub struct Statement {
    sql: Cow<'static, str>,
    params: Vec<Value>,
    min_rows: Option<usize>,
}

impl Statement {
    pub fn new(sql: impl Into<Cow<'static, str>>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            min_rows: None,
        }
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn bind_date(self, date: NaiveDate) -> Self {
        self.bind(date.format(DATE_FORMAT).to_string())
    }

    pub fn bind_timestamp(self, timestamp: NaiveDateTime) -> Self {
        self.bind(timestamp.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Treat the statement as failed, and roll the batch back, if it touches fewer rows.
    pub fn expect_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = Some(min_rows);
        self
    }

    fn run(&self, tx: &Transaction<'_>, index: usize) -> Result<usize, GatewayError> {
        let affected = tx
            .execute(&self.sql, params_from_iter(self.params.iter()))
            .map_err(|source| GatewayError::Statement { index, source })?;

        match self.min_rows {
            Some(expected) if affected < expected => Err(GatewayError::RowCount {
                index,
                expected,
                affected,
            }),
            _ => Ok(affected),
        }
    }
}

/// What a committed batch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub rows_affected: Vec<usize>,
    /// Store-generated key of the last successful insert in the batch.
    pub last_insert_rowid: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("database unavailable at '{path}': {source}")]
    Unavailable {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("statement {index} failed: {source}")]
    Statement {
        index: usize,
        #[source]
        source: rusqlite::Error,
    },
    #[error("statement {index} affected {affected} row(s), expected at least {expected}")]
    RowCount {
        index: usize,
        expected: usize,
        affected: usize,
    },
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

impl GatewayError {
    /// Connection could not be acquired; no work was attempted.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, GatewayError::Unavailable { .. })
    }

    fn sqlite_failure(&self) -> Option<&rusqlite::ffi::Error> {
        match self {
            GatewayError::Statement {
                source: rusqlite::Error::SqliteFailure(err, _),
                ..
            }
            | GatewayError::Query(rusqlite::Error::SqliteFailure(err, _)) => Some(err),
            _ => None,
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        self.sqlite_failure()
            .is_some_and(|err| err.code == ErrorCode::ConstraintViolation)
    }

    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    pub fn is_duplicate_key(&self) -> bool {
        self.sqlite_failure().is_some_and(|err| {
            err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        })
    }

    /// Index of the statement that broke the batch, if a statement was at fault.
    pub fn failed_statement(&self) -> Option<usize> {
        match self {
            GatewayError::Statement { index, .. } | GatewayError::RowCount { index, .. } => {
                Some(*index)
            }
            GatewayError::Unavailable { .. } | GatewayError::Query(_) => None,
        }
    }
}

/// Handle to the relational store. Cheap to clone; holds configuration only.
#[derive(Debug, Clone)]
pub struct Database {
    config: DatabaseConfig,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn connect(&self) -> Result<Connection, GatewayError> {
        let unavailable = |source| GatewayError::Unavailable {
            path: self.config.path.display().to_string(),
            source,
        };

        let conn = Connection::open(&self.config.path).map_err(unavailable)?;
        conn.busy_timeout(self.config.busy_timeout)
            .map_err(unavailable)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(unavailable)?;
        // Forces the file to actually be opened so a bad path fails here, not mid-batch.
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map_err(unavailable)?;
        Ok(conn)
    }

    /// Create tables and reference rows that are missing.
    pub fn migrate(&self) -> Result<(), GatewayError> {
        let conn = self.connect()?;
        conn.execute_batch(schema::SCHEMA)?;
        debug!(path = %self.config.path.display(), "schema migrated");
        Ok(())
    }

    /// Run `statements` in order inside one transaction.
    ///
    /// Commits only when every statement succeeds. The first failure rolls the whole batch
    /// back and is returned with the index of the offending statement.
    pub fn execute(&self, statements: &[Statement]) -> Result<CommitReport, GatewayError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let mut rows_affected = Vec::with_capacity(statements.len());
        for (index, statement) in statements.iter().enumerate() {
            match statement.run(&tx, index) {
                Ok(affected) => rows_affected.push(affected),
                Err(err) => {
                    warn!(index, error = %err, "statement failed, rolling back transaction");
                    if let Err(rollback) = tx.rollback() {
                        warn!(error = %rollback, "rollback failed");
                    }
                    return Err(err);
                }
            }
        }

        let last_insert_rowid = tx.last_insert_rowid();
        tx.commit()?;

        Ok(CommitReport {
            rows_affected,
            last_insert_rowid,
        })
    }

    /// Run a read-only query on a fresh connection.
    pub fn read<T, F>(&self, query: F) -> Result<T, GatewayError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.connect()?;
        query(&conn).map_err(GatewayError::Query)
    }
}

/// Reads a blood type persisted as separate group and rh columns.
pub(crate) fn blood_type_at(row: &Row<'_>, group: usize, rh: usize) -> rusqlite::Result<BloodType> {
    let group_value: String = row.get(group)?;
    let rh_value: String = row.get(rh)?;
    BloodType::from_parts(&group_value, &rh_value)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(group, Type::Text, Box::new(err)))
}

pub(crate) fn blood_type_params(blood_type: &BloodType) -> (String, String) {
    (
        blood_type.group.label().to_string(),
        blood_type.rh.symbol().to_string(),
    )
}

impl FromSql for UnitStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

impl FromSql for RequestStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

impl FromSql for DonorId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(DonorId)
    }
}

impl FromSql for ScreeningId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(ScreeningId)
    }
}

impl FromSql for DonationId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(DonationId)
    }
}

impl FromSql for UnitId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(UnitId)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::TempDatabase;
    use super::*;

    fn insert_role(name: &str) -> Statement {
        Statement::new("INSERT INTO roles (role_name) VALUES (?1)").bind(name.to_string())
    }

    #[test]
    fn migrate_seeds_reference_rows_once() {
        let temp = TempDatabase::new();
        temp.database.migrate().expect("second migration is a no-op");
        assert_eq!(temp.count("roles"), 4);
        assert_eq!(temp.count("tasks"), 4);
    }

    #[test]
    fn execute_commits_every_statement() {
        let temp = TempDatabase::new();
        let report = temp
            .database
            .execute(&[insert_role("Courier"), insert_role("Receptionist")])
            .expect("batch commits");

        assert_eq!(report.rows_affected, vec![1, 1]);
        assert_eq!(report.last_insert_rowid, 6);
        assert_eq!(temp.count("roles"), 6);
    }

    #[test]
    fn execute_rolls_back_earlier_statements_on_failure() {
        let temp = TempDatabase::new();
        let err = temp
            .database
            .execute(&[insert_role("Courier"), insert_role("Nurse")])
            .expect_err("duplicate role violates unique constraint");

        assert_eq!(err.failed_statement(), Some(1));
        assert!(err.is_constraint_violation());
        assert!(err.is_duplicate_key());
        assert!(!err.is_unavailable());
        assert_eq!(temp.count("roles"), 4);
    }

    #[test]
    fn execute_rolls_back_when_row_expectation_is_missed() {
        let temp = TempDatabase::new();
        let update = Statement::new("UPDATE roles SET role_name = ?1 WHERE role_id = ?2")
            .bind("Ghost".to_string())
            .bind(999_i64)
            .expect_rows(1);

        let err = temp
            .database
            .execute(&[insert_role("Courier"), update])
            .expect_err("missing row fails the batch");

        assert!(matches!(
            err,
            GatewayError::RowCount {
                index: 1,
                expected: 1,
                affected: 0
            }
        ));
        assert_eq!(temp.count("roles"), 4);
    }

    #[test]
    fn unreachable_store_is_reported_as_unavailable() {
        let path = std::env::temp_dir()
            .join(format!("missing-{}", uuid::Uuid::new_v4()))
            .join("bank.db");
        let database = Database::new(DatabaseConfig::new(path));

        let err = database
            .execute(&[insert_role("Courier")])
            .expect_err("directory does not exist");
        assert!(err.is_unavailable());
        assert_eq!(err.failed_statement(), None);

        let err = database
            .read(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .expect_err("reads fail the same way");
        assert!(err.is_unavailable());
    }

    #[test]
    fn blood_type_columns_round_trip() {
        let temp = TempDatabase::new();
        let blood_type: BloodType = "AB-".parse().expect("valid");
        let (group, rh) = blood_type_params(&blood_type);

        let read = temp
            .database
            .read(|conn| {
                conn.query_row("SELECT ?1, ?2", [group, rh], |row| {
                    blood_type_at(row, 0, 1)
                })
            })
            .expect("query runs");
        assert_eq!(read, blood_type);
    }
}
