use chrono::{DateTime, TimeZone, Utc};
use diesel::prelude::*;

use mm_core::user::{SyncAction, UserRecord};

use crate::db::schema::t_user;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = t_user)]
pub struct UserRow {
    pub id: String,
    pub remote_id: Option<String>,
    pub email: String,
    pub full_name: String,
    pub password_digest: String,
    pub is_logged_in: bool,
    pub pending_registration_sync: bool,
    pub pending_plain_password: Option<String>,
    pub pending_sync: bool,
    pub pending_sync_action: Option<String>,
    pub pending_password_sync: bool,
    pub pending_old_password: Option<String>,
    pub pending_new_password: Option<String>,
    pub last_synced_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            remote_id: row.remote_id,
            email: row.email,
            full_name: row.full_name,
            password_digest: row.password_digest,
            is_logged_in: row.is_logged_in,
            pending_registration_sync: row.pending_registration_sync,
            pending_plain_password: row.pending_plain_password,
            pending_sync: row.pending_sync,
            pending_sync_action: row.pending_sync_action.as_deref().and_then(SyncAction::parse),
            pending_password_sync: row.pending_password_sync,
            pending_old_password: row.pending_old_password,
            pending_new_password: row.pending_new_password,
            last_synced_at: row.last_synced_at.map(millis_to_datetime),
            created_at: millis_to_datetime(row.created_at),
            updated_at: millis_to_datetime(row.updated_at),
        }
    }
}

impl From<&UserRecord> for UserRow {
    fn from(record: &UserRecord) -> Self {
        UserRow {
            id: record.id.clone(),
            remote_id: record.remote_id.clone(),
            email: record.email.clone(),
            full_name: record.full_name.clone(),
            password_digest: record.password_digest.clone(),
            is_logged_in: record.is_logged_in,
            pending_registration_sync: record.pending_registration_sync,
            pending_plain_password: record.pending_plain_password.clone(),
            pending_sync: record.pending_sync,
            pending_sync_action: record.pending_sync_action.map(|a| a.as_str().to_string()),
            pending_password_sync: record.pending_password_sync,
            pending_old_password: record.pending_old_password.clone(),
            pending_new_password: record.pending_new_password.clone(),
            last_synced_at: record.last_synced_at.map(|t| t.timestamp_millis()),
            created_at: record.created_at.timestamp_millis(),
            updated_at: record.updated_at.timestamp_millis(),
        }
    }
}
