//! PostgreSQL-based rotation store implementation.

use crate::store::RotationStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rotation_core::{
    Banner, EntityKind, Event, EventType, Group, Rotation, RotationError, RotationKey,
    RotationResult, Slot,
};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, Pool, Postgres};
use std::str::FromStr;
use uuid::Uuid;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

const ROTATION_COLUMNS: &str = "id, banner_id, slot_id, group_id, shows, clicks, deleted";

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// Classify a driver error. Unique violations mean the caller tried to create
/// something that already exists; everything else is a transport or
/// transaction failure.
fn db_err(err: sqlx::Error) -> RotationError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return RotationError::AlreadyExists(db.message().to_string());
        }
    }
    RotationError::StoreUnavailable(err.to_string())
}

fn entity_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Banner => "banners",
        EntityKind::Slot => "slots",
        EntityKind::Group => "groups",
    }
}

fn rotation_column(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Banner => "banner_id",
        EntityKind::Slot => "slot_id",
        EntityKind::Group => "group_id",
    }
}

#[derive(Debug, FromRow)]
struct RotationRow {
    id: i64,
    banner_id: Uuid,
    slot_id: Uuid,
    group_id: Uuid,
    shows: i64,
    clicks: i64,
    deleted: bool,
}

impl From<RotationRow> for Rotation {
    fn from(row: RotationRow) -> Self {
        Self {
            id: row.id,
            banner_id: row.banner_id,
            slot_id: row.slot_id,
            group_id: row.group_id,
            shows: row.shows.max(0) as u64,
            clicks: row.clicks.max(0) as u64,
            deleted: row.deleted,
        }
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    rotation_id: i64,
    event_type: String,
    stamp: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = RotationError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let event_type = EventType::parse(&row.event_type).ok_or_else(|| {
            RotationError::Internal(anyhow::anyhow!(
                "unknown event type '{}' for rotation {}",
                row.event_type,
                row.rotation_id
            ))
        })?;
        Ok(Self {
            rotation_id: row.rotation_id,
            event_type,
            timestamp: row.stamp,
        })
    }
}

/// PostgreSQL-based rotation store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Connect using a connection URL and apply the schema.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> RotationResult<Self> {
        let mut opts = PgConnectOptions::from_str(url).map_err(db_err)?;

        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await
            .map_err(db_err)?;

        tracing::info!(max_connections, "Connected to PostgreSQL");

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Apply the embedded schema. Every statement is idempotent.
    pub async fn migrate(&self) -> RotationResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared statement.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }
        Ok(())
    }

    async fn insert_entity(
        &self,
        kind: EntityKind,
        id: Uuid,
        description: &str,
    ) -> RotationResult<()> {
        let query = format!(
            "INSERT INTO {} (id, description) VALUES ($1, $2)",
            entity_table(kind)
        );
        sqlx::query(&query)
            .bind(id)
            .bind(description)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn entity_description(&self, kind: EntityKind, id: Uuid) -> RotationResult<String> {
        let query = format!(
            "SELECT description FROM {} WHERE id = $1 AND deleted = FALSE",
            entity_table(kind)
        );
        sqlx::query_scalar::<_, String>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RotationError::NotFound(format!("{kind} {id}")))
    }

    /// Soft-delete an entity and every rotation referencing it in one
    /// transaction. A cascade that matches no rotations still commits.
    async fn delete_entity(&self, kind: EntityKind, id: Uuid) -> RotationResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let delete_entity = format!(
            "UPDATE {} SET deleted = TRUE, deleted_at = now() WHERE id = $1 AND deleted = FALSE",
            entity_table(kind)
        );
        let result = sqlx::query(&delete_entity)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(RotationError::NotFound(format!("{kind} {id}")));
        }

        // now() is fixed for the transaction, so both steps share a timestamp.
        let delete_rotations = format!(
            "UPDATE rotations SET deleted = TRUE, deleted_at = now() WHERE {} = $1 AND deleted = FALSE",
            rotation_column(kind)
        );
        let cascaded = sqlx::query(&delete_rotations)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        tx.commit().await.map_err(db_err)?;

        tracing::debug!(kind = %kind, id = %id, cascaded, "Soft-deleted entity");
        Ok(())
    }

    async fn bump(&self, key: RotationKey, event_type: EventType) -> RotationResult<Rotation> {
        let column = match event_type {
            EventType::Show => "shows",
            EventType::Click => "clicks",
        };
        let query = format!(
            "UPDATE rotations SET {column} = {column} + 1 \
             WHERE banner_id = $1 AND slot_id = $2 AND group_id = $3 AND deleted = FALSE \
             RETURNING {ROTATION_COLUMNS}"
        );
        let rotation: Rotation = sqlx::query_as::<_, RotationRow>(&query)
            .bind(key.banner_id)
            .bind(key.slot_id)
            .bind(key.group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RotationError::NoSuchRotation(key.to_string()))?
            .into();

        // The counter is already committed; the event row is audit only.
        if let Err(e) = sqlx::query("INSERT INTO events (rotation_id, event_type) VALUES ($1, $2)")
            .bind(rotation.id)
            .bind(event_type.as_str())
            .execute(&self.pool)
            .await
        {
            tracing::warn!(
                error = %e,
                rotation_id = rotation.id,
                event_type = event_type.as_str(),
                "Counter updated but event append failed"
            );
            return Err(db_err(e));
        }

        Ok(rotation)
    }
}

#[async_trait]
impl RotationStore for PostgresStore {
    async fn add_banner(&self, banner: &Banner) -> RotationResult<()> {
        self.insert_entity(EntityKind::Banner, banner.id, &banner.description)
            .await
    }

    async fn get_banner(&self, banner_id: Uuid) -> RotationResult<Banner> {
        let description = self
            .entity_description(EntityKind::Banner, banner_id)
            .await?;
        Ok(Banner {
            id: banner_id,
            description,
        })
    }

    async fn delete_banner(&self, banner_id: Uuid) -> RotationResult<()> {
        self.delete_entity(EntityKind::Banner, banner_id).await
    }

    async fn add_slot(&self, slot: &Slot) -> RotationResult<()> {
        self.insert_entity(EntityKind::Slot, slot.id, &slot.description)
            .await
    }

    async fn get_slot(&self, slot_id: Uuid) -> RotationResult<Slot> {
        let description = self.entity_description(EntityKind::Slot, slot_id).await?;
        Ok(Slot {
            id: slot_id,
            description,
        })
    }

    async fn delete_slot(&self, slot_id: Uuid) -> RotationResult<()> {
        self.delete_entity(EntityKind::Slot, slot_id).await
    }

    async fn add_group(&self, group: &Group) -> RotationResult<()> {
        self.insert_entity(EntityKind::Group, group.id, &group.description)
            .await
    }

    async fn get_group(&self, group_id: Uuid) -> RotationResult<Group> {
        let description = self
            .entity_description(EntityKind::Group, group_id)
            .await?;
        Ok(Group {
            id: group_id,
            description,
        })
    }

    async fn delete_group(&self, group_id: Uuid) -> RotationResult<()> {
        self.delete_entity(EntityKind::Group, group_id).await
    }

    async fn add_rotation(&self, key: RotationKey) -> RotationResult<Rotation> {
        let query = format!(
            r#"
            INSERT INTO rotations (banner_id, slot_id, group_id)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM banners WHERE id = $1 AND deleted = FALSE)
              AND EXISTS (SELECT 1 FROM slots WHERE id = $2 AND deleted = FALSE)
              AND EXISTS (SELECT 1 FROM groups WHERE id = $3 AND deleted = FALSE)
            RETURNING {ROTATION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, RotationRow>(&query)
            .bind(key.banner_id)
            .bind(key.slot_id)
            .bind(key.group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| {
                RotationError::NotFound(format!("banner, slot or group for rotation {key}"))
            })?;
        Ok(row.into())
    }

    async fn get_rotation(&self, key: RotationKey) -> RotationResult<Rotation> {
        let query = format!(
            "SELECT {ROTATION_COLUMNS} FROM rotations \
             WHERE banner_id = $1 AND slot_id = $2 AND group_id = $3 AND deleted = FALSE"
        );
        let row = sqlx::query_as::<_, RotationRow>(&query)
            .bind(key.banner_id)
            .bind(key.slot_id)
            .bind(key.group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RotationError::NotFound(format!("rotation {key}")))?;
        Ok(row.into())
    }

    async fn delete_rotation(&self, key: RotationKey) -> RotationResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE rotations SET deleted = TRUE, deleted_at = now()
            WHERE banner_id = $1 AND slot_id = $2 AND group_id = $3 AND deleted = FALSE
            "#,
        )
        .bind(key.banner_id)
        .bind(key.slot_id)
        .bind(key.group_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RotationError::NoSuchRotation(key.to_string()));
        }
        Ok(())
    }

    async fn get_all_rotations(&self) -> RotationResult<Vec<Rotation>> {
        let query =
            format!("SELECT {ROTATION_COLUMNS} FROM rotations WHERE deleted = FALSE ORDER BY id");
        let rows = sqlx::query_as::<_, RotationRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Rotation::from).collect())
    }

    async fn get_total_shows(&self) -> RotationResult<u64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(shows), 0)::BIGINT FROM rotations WHERE deleted = FALSE",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(total.max(0) as u64)
    }

    async fn add_show(&self, key: RotationKey) -> RotationResult<Rotation> {
        self.bump(key, EventType::Show).await
    }

    async fn add_click(&self, key: RotationKey) -> RotationResult<Rotation> {
        self.bump(key, EventType::Click).await
    }

    async fn get_rotation_stats(&self, key: RotationKey) -> RotationResult<Vec<Event>> {
        let rotation = self.get_rotation(key).await?;
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT rotation_id, event_type, stamp FROM events WHERE rotation_id = $1 ORDER BY id",
        )
        .bind(rotation.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(Event::try_from).collect()
    }

    async fn health_check(&self) -> RotationResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
