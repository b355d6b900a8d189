use chrono::{DateTime, FixedOffset, Offset, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr};

use crate::constants::store::RECORD_UTC_OFFSET_SECS;
use crate::entities::ig_hashtags;
use crate::error::{HarvestError, Result};

pub struct HashtagRepository {
    conn: DatabaseConnection,
}

impl HashtagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_id(&self, name: &str) -> Result<Option<String>> {
        let row = ig_hashtags::Entity::find()
            .filter(ig_hashtags::Column::Name.eq(name))
            .one(&self.conn)
            .await?;

        Ok(row.map(|m| m.ig_hashtag_id))
    }

    pub async fn insert(&self, name: &str, hashtag_id: &str, now: DateTime<Utc>) -> Result<()> {
        let active_model = ig_hashtags::ActiveModel {
            name: Set(name.to_string()),
            ig_hashtag_id: Set(hashtag_id.to_string()),
            timestamp: Set(record_timestamp(now)),
            ..Default::default()
        };

        ig_hashtags::Entity::insert(active_model)
            .exec(&self.conn)
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(detail)) => HarvestError::DuplicateKey(
                    format!("hashtag '{name}' / id '{hashtag_id}' already stored ({detail})"),
                ),
                _ => HarvestError::Database(err),
            })?;

        Ok(())
    }
}

fn record_offset() -> FixedOffset {
    FixedOffset::east_opt(RECORD_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Renders `now` at the fixed record offset, independent of the host zone.
#[must_use]
pub fn record_timestamp(now: DateTime<Utc>) -> String {
    now.with_timezone(&record_offset()).to_rfc3339()
}
