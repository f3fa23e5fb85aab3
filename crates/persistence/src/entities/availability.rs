//! Availability window and blocked date entities.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use domain::models::availability::{AvailabilityWindow, BlockedDate};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the availability_windows table.
#[derive(Debug, Clone, FromRow)]
pub struct AvailabilityWindowEntity {
    pub id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AvailabilityWindowEntity> for AvailabilityWindow {
    fn from(entity: AvailabilityWindowEntity) -> Self {
        Self {
            id: entity.id,
            day_of_week: entity.day_of_week,
            start_time: entity.start_time,
            end_time: entity.end_time,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the blocked_dates table.
#[derive(Debug, Clone, FromRow)]
pub struct BlockedDateEntity {
    pub id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BlockedDateEntity> for BlockedDate {
    fn from(entity: BlockedDateEntity) -> Self {
        Self {
            id: entity.id,
            date: entity.date,
            reason: entity.reason,
            created_at: entity.created_at,
        }
    }
}
