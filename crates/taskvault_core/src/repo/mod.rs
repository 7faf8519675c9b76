//! Repository contracts and the SQLite-backed querier.
//!
//! # Responsibility
//! - Define the per-entity store traits the service layer depends on.
//! - Execute query plans over one owned connection with a uniform
//!   read/write/transaction discipline.
//!
//! # Invariants
//! - Every create/update/archive pairs its primary write with an audit-log
//!   insert inside one transaction; a failed audit insert undoes the
//!   primary write.
//! - A transaction handle is owned by the single logical operation that
//!   opened it.
//! - Scan loops abort on the first row error; no partial result escapes.

use crate::db::{self, migrations, DbError};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::model::audit::AuditEvent;
use crate::model::filter::QueryFilter;
use crate::model::ValidationError;
use crate::query::{self, QueryPlan};
use log::{debug, error, warn};
use rusqlite::{params_from_iter, Connection, Row, Transaction};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

mod account_repo;
mod api_client_repo;
mod audit_repo;
mod item_repo;
mod membership_repo;
mod plan_repo;
mod user_repo;
mod webhook_repo;

pub use account_repo::AccountStore;
pub use api_client_repo::ApiClientStore;
pub use audit_repo::AuditLogStore;
pub use item_repo::ItemStore;
pub use membership_repo::MembershipStore;
pub use plan_repo::PlanStore;
pub use user_repo::UserStore;
pub use webhook_repo::WebhookStore;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error taxonomy.
#[derive(Debug)]
pub enum RepoError {
    /// Input rejected before any database interaction.
    Validation(ValidationError),
    /// Connection, bootstrap or migration failure.
    Db(DbError),
    /// The addressed row does not exist (or is archived).
    NotFound { entity: &'static str, id: String },
    /// Begin/commit/rollback failure, wrapped with the operation name.
    Transaction {
        op: &'static str,
        source: rusqlite::Error,
    },
    /// Statement execution failure on a write path.
    Write {
        op: &'static str,
        source: rusqlite::Error,
    },
    /// Statement execution failure on a read path.
    Read {
        op: &'static str,
        source: rusqlite::Error,
    },
    /// Persisted state that no longer parses; never masked as absent data.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Transaction { op, source } => write!(f, "{op}: {source}"),
            Self::Write { op, source } => write!(f, "executing {op} query: {source}"),
            Self::Read { op, source } => write!(f, "executing {op} query: {source}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Transaction { source, .. }
            | Self::Write { source, .. }
            | Self::Read { source, .. } => Some(source),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One page of a list query, with the counts carried by the result shape.
///
/// `filtered_count <= total_count` holds for every non-empty result; both
/// values are read from the first row only, which is sound because the
/// list-query shape produces identical counts on every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResult<T> {
    pub page: u64,
    pub limit: u8,
    pub filtered_count: u64,
    pub total_count: u64,
    pub rows: Vec<T>,
}

impl<T> ListResult<T> {
    fn for_filter(filter: Option<&QueryFilter>) -> Self {
        let (page, limit) = filter.map_or((1, 0), |f| (f.normalized_page(), f.clamped_limit()));
        Self {
            page,
            limit,
            filtered_count: 0,
            total_count: 0,
            rows: Vec::new(),
        }
    }
}

/// Row-to-record mapping implemented by every stored entity.
///
/// Implementations read columns by name in registry order and surface
/// unparseable persisted state as [`RepoError::InvalidData`].
pub trait FromSqlRow: Sized {
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

/// Outcome of a paired write, distinguishing the idempotent no-op case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    Applied,
    NoRows,
}

fn default_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// SQLite-backed implementation of every store trait.
///
/// Owns the connection; concurrency comes from callers, not from anything
/// scheduled here. Every operation is a synchronous blocking call.
pub struct SqliteQuerier {
    conn: Connection,
    ids: Box<dyn IdGenerator>,
    clock: fn() -> u64,
}

impl std::fmt::Debug for SqliteQuerier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteQuerier").finish_non_exhaustive()
    }
}

impl SqliteQuerier {
    /// Wraps an already-bootstrapped connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            ids: Box::new(UuidGenerator),
            clock: default_clock,
        }
    }

    /// Opens and migrates a file-backed database.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(db::open_db(path)?))
    }

    /// Opens and migrates an in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::new(db::open_db_in_memory()?))
    }

    /// Replaces the identifier generator collaborator.
    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Applies pending migrations once the readiness probe succeeds.
    ///
    /// Idempotent across calls and processes: the persisted schema version
    /// decides whether anything runs.
    pub fn migrate(&mut self, max_attempts: u8) -> RepoResult<()> {
        if !db::is_ready(&self.conn, max_attempts) {
            return Err(RepoError::Db(DbError::NotReady {
                attempts: max_attempts,
            }));
        }

        migrations::apply_migrations(&mut self.conn)?;
        Ok(())
    }

    /// Probes the database with a bounded number of ping attempts.
    pub fn is_ready(&self, max_attempts: u8) -> bool {
        db::is_ready(&self.conn, max_attempts)
    }

    /// Read access to the underlying connection for embedding hosts.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn generate_id(&self) -> String {
        self.ids.generate()
    }

    /// Caller-side clock used only to populate returned records; persisted
    /// timestamps come from the database clock.
    pub(crate) fn now(&self) -> u64 {
        (self.clock)()
    }

    pub(crate) fn begin(&self, op: &'static str) -> RepoResult<Transaction<'_>> {
        self.conn.unchecked_transaction().map_err(|source| {
            error!("event=tx_begin module=repo status=error op={op} error={source}");
            RepoError::Transaction {
                op: "beginning transaction",
                source,
            }
        })
    }

    pub(crate) fn commit(&self, tx: Transaction<'_>, op: &'static str) -> RepoResult<()> {
        tx.commit().map_err(|source| {
            error!("event=tx_commit module=repo status=error op={op} error={source}");
            RepoError::Transaction {
                op: "committing transaction",
                source,
            }
        })
    }

    /// Rolls back and logs; rollback failure is not surfaced over the
    /// original error.
    pub(crate) fn rollback(&self, tx: Transaction<'_>, op: &'static str) {
        if let Err(err) = tx.rollback() {
            error!("event=tx_rollback module=repo status=error op={op} error={err}");
        }
    }

    /// Executes a write, reporting rows affected. Zero rows is a soft
    /// signal logged for the caller to interpret.
    pub(crate) fn perform_write(
        &self,
        conn: &Connection,
        op: &'static str,
        plan: &QueryPlan,
    ) -> RepoResult<usize> {
        let affected = conn
            .execute(&plan.query, params_from_iter(plan.args.iter()))
            .map_err(|source| RepoError::Write { op, source })?;

        if affected == 0 {
            debug!("event=write module=repo status=no_rows op={op}");
        }

        Ok(affected)
    }

    /// Executes a boolean query; a missing row reads as `false`.
    pub(crate) fn perform_boolean_query(&self, plan: &QueryPlan) -> RepoResult<bool> {
        match self.conn.query_row(
            &plan.query,
            params_from_iter(plan.args.iter()),
            |row| row.get::<_, bool>(0),
        ) {
            Ok(exists) => Ok(exists),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(source) => Err(RepoError::Read {
                op: "boolean query",
                source,
            }),
        }
    }

    pub(crate) fn perform_count_query(
        &self,
        op: &'static str,
        plan: &QueryPlan,
    ) -> RepoResult<u64> {
        self.conn
            .query_row(&plan.query, params_from_iter(plan.args.iter()), |row| {
                row.get::<_, u64>(0)
            })
            .map_err(|source| RepoError::Read { op, source })
    }

    /// Fetches a single scalar text column; `None` when no row matches.
    pub(crate) fn get_one_text(
        &self,
        op: &'static str,
        plan: &QueryPlan,
    ) -> RepoResult<Option<String>> {
        match self.conn.query_row(
            &plan.query,
            params_from_iter(plan.args.iter()),
            |row| row.get::<_, String>(0),
        ) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(source) => Err(RepoError::Read { op, source }),
        }
    }

    /// Fetches one record; the no-rows case is `None`, never an error.
    pub(crate) fn get_one<T: FromSqlRow>(
        &self,
        op: &'static str,
        plan: &QueryPlan,
    ) -> RepoResult<Option<T>> {
        let mut stmt = self
            .conn
            .prepare(&plan.query)
            .map_err(|source| RepoError::Read { op, source })?;
        let mut rows = stmt
            .query(params_from_iter(plan.args.iter()))
            .map_err(|source| RepoError::Read { op, source })?;

        match rows.next().map_err(|source| RepoError::Read { op, source })? {
            Some(row) => Ok(Some(T::from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Scans every row of a read query. Aborts on the first row error.
    pub(crate) fn perform_read<T: FromSqlRow>(
        &self,
        op: &'static str,
        plan: &QueryPlan,
    ) -> RepoResult<Vec<T>> {
        let mut stmt = self
            .conn
            .prepare(&plan.query)
            .map_err(|source| RepoError::Read { op, source })?;
        let mut rows = stmt
            .query(params_from_iter(plan.args.iter()))
            .map_err(|source| RepoError::Read { op, source })?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(|source| RepoError::Read { op, source })? {
            records.push(T::from_row(row)?);
        }

        Ok(records)
    }

    /// Scans a list query whose rows carry the uniform count columns.
    ///
    /// Both counts are read from the first row only; the list-query shape
    /// guarantees every row agrees.
    pub(crate) fn perform_read_with_counts<T: FromSqlRow>(
        &self,
        op: &'static str,
        plan: &QueryPlan,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<T>> {
        let mut stmt = self
            .conn
            .prepare(&plan.query)
            .map_err(|source| RepoError::Read { op, source })?;
        let mut rows = stmt
            .query(params_from_iter(plan.args.iter()))
            .map_err(|source| RepoError::Read { op, source })?;

        let mut result = ListResult::for_filter(filter);
        while let Some(row) = rows.next().map_err(|source| RepoError::Read { op, source })? {
            if result.rows.is_empty() {
                result.total_count = row
                    .get("total_count")
                    .map_err(|source| RepoError::Read { op, source })?;
                result.filtered_count = row
                    .get("filtered_count")
                    .map_err(|source| RepoError::Read { op, source })?;
            }
            result.rows.push(T::from_row(row)?);
        }

        Ok(result)
    }

    /// Appends an audit entry inside the caller's transaction.
    pub(crate) fn append_audit(
        &self,
        tx: &Transaction<'_>,
        event: AuditEvent,
    ) -> RepoResult<()> {
        let input = event.into_creation_input();
        let plan = query::audit::build_create_audit_log_entry_query(&input);
        self.perform_write(tx, "audit log entry creation", &plan)
            .map(|_| ())
    }

    /// The atomic mutate-plus-audit pattern shared by every create, update
    /// and archive operation.
    ///
    /// Begin, primary write, audit insert, commit. Any failure rolls back
    /// and surfaces; when the primary write touches zero rows the whole
    /// transaction is rolled back without an audit entry and the no-op is
    /// reported for the caller to interpret.
    pub(crate) fn write_with_audit(
        &self,
        op: &'static str,
        plan: &QueryPlan,
        event: AuditEvent,
    ) -> RepoResult<WriteOutcome> {
        let tx = self.begin(op)?;

        let affected = match self.perform_write(&tx, op, plan) {
            Ok(affected) => affected,
            Err(err) => {
                self.rollback(tx, op);
                return Err(err);
            }
        };

        if affected == 0 {
            self.rollback(tx, op);
            warn!("event=write module=repo status=no_rows op={op}");
            return Ok(WriteOutcome::NoRows);
        }

        if let Err(err) = self.append_audit(&tx, event) {
            error!("event=audit_append module=repo status=error op={op} error={err}");
            self.rollback(tx, op);
            return Err(err);
        }

        self.commit(tx, op)?;
        debug!("event=write module=repo status=ok op={op}");

        Ok(WriteOutcome::Applied)
    }
}

/// The single seam the excluded HTTP layer uses to reach the database.
pub trait DataStore:
    ItemStore
    + UserStore
    + AccountStore
    + MembershipStore
    + WebhookStore
    + ApiClientStore
    + PlanStore
    + AuditLogStore
{
    fn migrate(&mut self, max_attempts: u8) -> RepoResult<()>;
    fn is_ready(&self, max_attempts: u8) -> bool;
}

impl DataStore for SqliteQuerier {
    fn migrate(&mut self, max_attempts: u8) -> RepoResult<()> {
        SqliteQuerier::migrate(self, max_attempts)
    }

    fn is_ready(&self, max_attempts: u8) -> bool {
        SqliteQuerier::is_ready(self, max_attempts)
    }
}
