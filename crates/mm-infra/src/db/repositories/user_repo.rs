use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;

use mm_core::ports::{ClockPort, UserStoreError, UserStorePort};
use mm_core::user::{SyncAction, UserRecord};

use crate::db::{models::UserRow, pool::DbPool, schema::t_user::dsl::*};

/// Diesel-backed user store.
///
/// Every ledger mutation is a single `UPDATE` statement so a flag and its
/// payload can never be observed half-cleared, even across a crash.
pub struct DieselUserRepository {
    pool: DbPool,
    clock: Arc<dyn ClockPort>,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool, clock: Arc<dyn ClockPort>) -> Self {
        Self { pool, clock }
    }

    fn conn(
        &self,
    ) -> Result<
        diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>,
        UserStoreError,
    > {
        self.pool
            .get()
            .map_err(|e| UserStoreError::Storage(e.to_string()))
    }

    fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

fn storage_err(e: DieselError) -> UserStoreError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            UserStoreError::EmailExists
        }
        other => UserStoreError::Storage(other.to_string()),
    }
}

fn one_row_or_not_found(affected: usize) -> Result<(), UserStoreError> {
    if affected == 0 {
        Err(UserStoreError::NotFound)
    } else {
        Ok(())
    }
}

#[async_trait]
impl UserStorePort for DieselUserRepository {
    async fn get_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, UserStoreError> {
        let mut conn = self.conn()?;
        let row = t_user
            .filter(id.eq(user_id))
            .first::<UserRow>(&mut conn)
            .optional()
            .map_err(storage_err)?;
        Ok(row.map(UserRecord::from))
    }

    async fn get_logged_in(&self) -> Result<Option<UserRecord>, UserStoreError> {
        let mut conn = self.conn()?;
        let row = t_user
            .filter(is_logged_in.eq(true))
            .first::<UserRow>(&mut conn)
            .optional()
            .map_err(storage_err)?;
        Ok(row.map(UserRecord::from))
    }

    async fn email_exists(&self, user_email: &str) -> Result<bool, UserStoreError> {
        let mut conn = self.conn()?;
        let count: i64 = t_user
            .filter(email.eq(user_email))
            .count()
            .get_result(&mut conn)
            .map_err(storage_err)?;
        Ok(count > 0)
    }

    async fn get_all_with_pending_registration(&self) -> Result<Vec<UserRecord>, UserStoreError> {
        let mut conn = self.conn()?;
        let rows = t_user
            .filter(pending_registration_sync.eq(true))
            .load::<UserRow>(&mut conn)
            .map_err(storage_err)?;
        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn get_with_pending_password(&self) -> Result<Option<UserRecord>, UserStoreError> {
        let mut conn = self.conn()?;
        let row = t_user
            .filter(pending_password_sync.eq(true))
            .first::<UserRow>(&mut conn)
            .optional()
            .map_err(storage_err)?;
        Ok(row.map(UserRecord::from))
    }

    async fn get_all_with_pending_profile_sync(&self) -> Result<Vec<UserRecord>, UserStoreError> {
        let mut conn = self.conn()?;
        let rows = t_user
            .filter(pending_sync.eq(true))
            .filter(pending_sync_action.eq(SyncAction::Update.as_str()))
            .load::<UserRow>(&mut conn)
            .map_err(storage_err)?;
        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn insert(&self, record: UserRecord) -> Result<(), UserStoreError> {
        let mut conn = self.conn()?;
        let row = UserRow::from(&record);
        diesel::insert_into(t_user)
            .values(&row)
            .execute(&mut conn)
            .map_err(storage_err)?;
        Ok(())
    }

    async fn set_logged_in(&self, user_id: &str) -> Result<(), UserStoreError> {
        let mut conn = self.conn()?;
        let now = self.now_millis();
        conn.transaction::<_, DieselError, _>(|conn| {
            diesel::update(t_user.filter(is_logged_in.eq(true)))
                .set((is_logged_in.eq(false), updated_at.eq(now)))
                .execute(conn)?;
            let affected = diesel::update(t_user.filter(id.eq(user_id)))
                .set((is_logged_in.eq(true), updated_at.eq(now)))
                .execute(conn)?;
            if affected == 0 {
                return Err(DieselError::NotFound);
            }
            Ok(())
        })
        .map_err(|e| match e {
            DieselError::NotFound => UserStoreError::NotFound,
            other => storage_err(other),
        })
    }

    async fn clear_logged_in(&self) -> Result<(), UserStoreError> {
        let mut conn = self.conn()?;
        diesel::update(t_user.filter(is_logged_in.eq(true)))
            .set((is_logged_in.eq(false), updated_at.eq(self.now_millis())))
            .execute(&mut conn)
            .map_err(storage_err)?;
        Ok(())
    }

    async fn update_profile_pending(
        &self,
        user_id: &str,
        new_full_name: &str,
        new_email: &str,
    ) -> Result<(), UserStoreError> {
        let mut conn = self.conn()?;
        let affected = diesel::update(t_user.filter(id.eq(user_id)))
            .set((
                full_name.eq(new_full_name),
                email.eq(new_email),
                pending_sync.eq(true),
                pending_sync_action.eq(SyncAction::Update.as_str()),
                updated_at.eq(self.now_millis()),
            ))
            .execute(&mut conn)
            .map_err(storage_err)?;
        one_row_or_not_found(affected)
    }

    async fn update_password_pending(
        &self,
        user_id: &str,
        digest: &str,
        old_plain: &str,
        new_plain: &str,
    ) -> Result<(), UserStoreError> {
        let mut conn = self.conn()?;
        let affected = diesel::update(t_user.filter(id.eq(user_id)))
            .set((
                password_digest.eq(digest),
                pending_password_sync.eq(true),
                pending_old_password.eq(old_plain),
                pending_new_password.eq(new_plain),
                updated_at.eq(self.now_millis()),
            ))
            .execute(&mut conn)
            .map_err(storage_err)?;
        one_row_or_not_found(affected)
    }

    async fn update_password_digest(
        &self,
        user_id: &str,
        digest: &str,
    ) -> Result<(), UserStoreError> {
        let mut conn = self.conn()?;
        let affected = diesel::update(t_user.filter(id.eq(user_id)))
            .set((
                password_digest.eq(digest),
                updated_at.eq(self.now_millis()),
            ))
            .execute(&mut conn)
            .map_err(storage_err)?;
        one_row_or_not_found(affected)
    }

    async fn clear_registration_pending(
        &self,
        user_id: &str,
        new_remote_id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        let mut conn = self.conn()?;
        let synced_millis = synced_at.timestamp_millis();
        let affected = diesel::update(t_user.filter(id.eq(user_id)))
            .set((
                remote_id.eq(new_remote_id),
                pending_registration_sync.eq(false),
                pending_plain_password.eq(None::<String>),
                last_synced_at.eq(synced_millis),
                updated_at.eq(synced_millis),
            ))
            .execute(&mut conn)
            .map_err(storage_err)?;
        one_row_or_not_found(affected)
    }

    async fn clear_password_pending(
        &self,
        user_id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        let mut conn = self.conn()?;
        let synced_millis = synced_at.timestamp_millis();
        let affected = diesel::update(t_user.filter(id.eq(user_id)))
            .set((
                pending_password_sync.eq(false),
                pending_old_password.eq(None::<String>),
                pending_new_password.eq(None::<String>),
                last_synced_at.eq(synced_millis),
                updated_at.eq(synced_millis),
            ))
            .execute(&mut conn)
            .map_err(storage_err)?;
        one_row_or_not_found(affected)
    }

    async fn clear_profile_pending(
        &self,
        user_id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        let mut conn = self.conn()?;
        let synced_millis = synced_at.timestamp_millis();
        let affected = diesel::update(t_user.filter(id.eq(user_id)))
            .set((
                pending_sync.eq(false),
                pending_sync_action.eq(None::<String>),
                last_synced_at.eq(synced_millis),
                updated_at.eq(synced_millis),
            ))
            .execute(&mut conn)
            .map_err(storage_err)?;
        one_row_or_not_found(affected)
    }
}
