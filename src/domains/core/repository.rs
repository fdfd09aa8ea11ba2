use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::EntityKind;
use async_trait::async_trait;
use log::error;
use sqlx::sqlite::SqliteRow;
use sqlx::{query_as, query_scalar, Executor, FromRow, Sqlite, SqliteConnection, Transaction};
use uuid::Uuid;

/// Trait for finding entities by ID
#[async_trait]
pub trait FindById<T> {
    /// Find an entity by ID
    async fn find_by_id(&self, id: Uuid) -> DomainResult<T>;
}

/// Commit on success, roll back on failure. Either way the transaction is consumed.
pub async fn finish_tx<T>(
    tx: Transaction<'_, Sqlite>,
    result: DomainResult<T>,
    operation: &str,
) -> DomainResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await.map_err(DbError::from)?;
            Ok(value)
        }
        Err(e) => {
            error!("{} failed, rolling back: {}", operation, e);
            let _ = tx.rollback().await;
            Err(e)
        }
    }
}

/// Fail with `EntityNotFound` unless a row with this id exists.
pub async fn ensure_exists(conn: &mut SqliteConnection, kind: EntityKind, id: Uuid) -> DomainResult<()> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", kind.table_name());
    let count: i64 = query_scalar(&sql)
        .bind(id.to_string())
        .fetch_one(&mut *conn)
        .await
        .map_err(DbError::from)?;

    if count == 0 {
        return Err(DomainError::EntityNotFound(kind.display_name().to_string(), id));
    }
    Ok(())
}

/// Load one row of `kind` by id, selecting `columns`.
pub async fn fetch_row_by_id<'e, R, E>(
    executor: E,
    kind: EntityKind,
    columns: &str,
    id: Uuid,
) -> DomainResult<R>
where
    E: Executor<'e, Database = Sqlite>,
    R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let sql = format!("SELECT {} FROM {} WHERE id = ?", columns, kind.table_name());
    query_as::<_, R>(&sql)
        .bind(id.to_string())
        .fetch_optional(executor)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound(kind.display_name().to_string(), id))
}

/// Target of a write to a record owned by a parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildWrite {
    /// Insert a new row under this parent
    Create { parent_id: Uuid },
    /// Replace the editable fields of this row
    Update(Uuid),
}

impl ChildWrite {
    /// Fail with `EntityNotFound` unless the parent (on create) or the row (on update) exists.
    pub async fn ensure_target(
        &self,
        conn: &mut SqliteConnection,
        parent: EntityKind,
        kind: EntityKind,
    ) -> DomainResult<()> {
        match *self {
            ChildWrite::Create { parent_id } => ensure_exists(conn, parent, parent_id).await,
            ChildWrite::Update(id) => ensure_exists(conn, kind, id).await,
        }
    }
}
