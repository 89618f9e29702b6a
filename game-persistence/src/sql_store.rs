use async_trait::async_trait;
use game_core::{CURRENT_SCHEMA_VERSION, FetchOutcome, RoomStore, StoreError, VersionedRoom, upgrade};
use game_types::RoomDocument;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, SqlErr};

use crate::entities::{prelude::*, rooms};
use crate::room_names::random_room_name;

const NAME_ATTEMPTS: usize = 32;

/// Rooms stored one row each in SQL. A commit is a single conditional
/// `UPDATE ... WHERE name = ? AND version = ?`, so the database does the
/// compare-and-swap.
pub struct SqlRoomStore {
    db: DatabaseConnection,
}

fn backend(err: DbErr) -> StoreError {
    tracing::error!(%err, "room database error");
    StoreError::Backend(err.to_string())
}

fn name_taken(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn to_i32(version: u32) -> Result<i32, StoreError> {
    i32::try_from(version).map_err(|_| StoreError::Backend(format!("version {version} out of range")))
}

impl SqlRoomStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Writes a raw document row, e.g. one exported from an older deployment.
    /// The document is upgraded the next time it is read.
    pub async fn import_room(&self, room: &str, version: u32, schema_version: u32, data: &str) -> Result<(), StoreError> {
        self.insert_row(room, to_i32(version)?, to_i32(schema_version)?, data)
            .await
            .map_err(backend)
    }

    async fn insert_row(&self, room: &str, version: i32, schema_version: i32, data: &str) -> Result<(), DbErr> {
        let now = chrono::Utc::now().into();
        let model = rooms::ActiveModel {
            name: ActiveValue::Set(room.to_string()),
            version: ActiveValue::Set(version),
            schema_version: ActiveValue::Set(schema_version),
            data: ActiveValue::Set(data.to_string()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        Rooms::insert(model).exec(&self.db).await?;
        Ok(())
    }

    fn decode(model: rooms::Model) -> Result<VersionedRoom, StoreError> {
        let value: serde_json::Value = serde_json::from_str(&model.data)?;
        let schema_version = u32::try_from(model.schema_version)
            .map_err(|_| StoreError::Serialization(format!("bad schema version {}", model.schema_version)))?;
        let mut rng = StdRng::from_entropy();
        let document = upgrade(value, schema_version, &mut rng).map_err(|err| {
            tracing::warn!(room = %model.name, %err, "stored room could not be read");
            StoreError::Serialization(err.to_string())
        })?;
        let version = u32::try_from(model.version)
            .map_err(|_| StoreError::Serialization(format!("bad version {}", model.version)))?;
        Ok(VersionedRoom { version, document })
    }
}

#[async_trait]
impl RoomStore for SqlRoomStore {
    async fn fetch(&self, room: &str, known_version: Option<u32>) -> Result<FetchOutcome, StoreError> {
        let Some(model) = Rooms::find_by_id(room.to_string())
            .one(&self.db)
            .await
            .map_err(backend)?
        else {
            return Ok(FetchOutcome::NotFound);
        };
        if known_version.is_some_and(|known| i64::from(known) == i64::from(model.version)) {
            return Ok(FetchOutcome::Unchanged);
        }
        Ok(FetchOutcome::Found(Self::decode(model)?))
    }

    async fn commit(&self, room: &str, expected_version: u32, document: &RoomDocument) -> Result<bool, StoreError> {
        let data = serde_json::to_string(document)?;
        let expected = to_i32(expected_version)?;
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let result = Rooms::update_many()
            .col_expr(rooms::Column::Version, Expr::value(expected + 1))
            .col_expr(rooms::Column::SchemaVersion, Expr::value(CURRENT_SCHEMA_VERSION as i32))
            .col_expr(rooms::Column::Data, Expr::value(data))
            .col_expr(rooms::Column::UpdatedAt, Expr::value(now))
            .filter(rooms::Column::Name.eq(room))
            .filter(rooms::Column::Version.eq(expected))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        if result.rows_affected != 1 {
            tracing::debug!(room, expected_version, "stale commit refused");
            return Ok(false);
        }
        Ok(true)
    }

    async fn create_room(&self, document: &RoomDocument) -> Result<String, StoreError> {
        let data = serde_json::to_string(document)?;
        for _ in 0..NAME_ATTEMPTS {
            let name = random_room_name(&mut StdRng::from_entropy());
            let taken = Rooms::find_by_id(name.clone())
                .one(&self.db)
                .await
                .map_err(backend)?
                .is_some();
            if taken {
                continue;
            }
            match self.insert_row(&name, 0, CURRENT_SCHEMA_VERSION as i32, &data).await {
                Ok(()) => {
                    tracing::info!(room = %name, "room created");
                    return Ok(name);
                }
                // another creator took the name since the lookup
                Err(err) if name_taken(&err) => {
                    tracing::debug!(room = %name, "room name taken concurrently");
                    continue;
                }
                Err(err) => return Err(backend(err)),
            }
        }
        Err(StoreError::Backend("could not find a free room name".into()))
    }
}
