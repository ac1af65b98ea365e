use chrono::{DateTime, Utc};
use sqlx::Row;

use mailbot_core::address::EmailAddress;
use mailbot_core::domain::record::{ChatUserId, UserRecord};

use super::{RepositoryError, UserRecordRepository};
use crate::DbPool;

pub struct SqlUserRecordRepository {
    pool: DbPool,
}

impl SqlUserRecordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRecordRepository for SqlUserRecordRepository {
    async fn find_by_id(&self, id: &ChatUserId) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT chat_user_id, email, created_at FROM user_records WHERE chat_user_id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let created_at = row
                .get::<String, _>("created_at")
                .parse::<DateTime<Utc>>()
                .map_err(|error| RepositoryError::Decode(format!("created_at: {error}")))?;

            Ok(UserRecord {
                id: ChatUserId::new(row.get::<String, _>("chat_user_id")),
                email: EmailAddress::new(row.get::<String, _>("email")),
                created_at,
            })
        })
        .transpose()
    }

    async fn save(&self, record: UserRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_records (chat_user_id, email, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (chat_user_id)
             DO UPDATE SET email = excluded.email, created_at = excluded.created_at",
        )
        .bind(record.id.as_str())
        .bind(record.email.as_str())
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &ChatUserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM user_records WHERE chat_user_id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mailbot_core::address::EmailAddress;
    use mailbot_core::domain::record::{ChatUserId, UserRecord};

    use crate::repositories::{SqlUserRecordRepository, UserRecordRepository};
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlUserRecordRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        SqlUserRecordRepository::new(pool)
    }

    #[tokio::test]
    async fn save_find_delete_round_trip() {
        let repo = repository().await;
        let record = UserRecord::new(
            ChatUserId::new("U123"),
            EmailAddress::new("ada.lovelace@example.com"),
        );

        repo.save(record.clone()).await.expect("save record");
        let found = repo.find_by_id(&record.id).await.expect("find record");
        assert_eq!(found, Some(record.clone()));

        repo.delete(&record.id).await.expect("delete record");
        let gone = repo.find_by_id(&record.id).await.expect("find after delete");
        assert_eq!(gone, None);
    }

    #[tokio::test]
    async fn find_returns_none_for_unknown_identity() {
        let repo = repository().await;
        let found = repo.find_by_id(&ChatUserId::new("U-missing")).await.expect("find");
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn save_overwrites_existing_mapping() {
        let repo = repository().await;
        let first = UserRecord::new(
            ChatUserId::new("U123"),
            EmailAddress::new("ada.lovelace@example.com"),
        );
        let second =
            UserRecord::new(ChatUserId::new("U123"), EmailAddress::new("ada.byron@example.com"));

        repo.save(first).await.expect("save first");
        repo.save(second.clone()).await.expect("save second");

        let found = repo.find_by_id(&second.id).await.expect("find record");
        assert_eq!(found, Some(second));
    }

    #[tokio::test]
    async fn delete_of_absent_key_is_a_no_op() {
        let repo = repository().await;
        repo.delete(&ChatUserId::new("U-missing")).await.expect("delete absent key");
    }
}
