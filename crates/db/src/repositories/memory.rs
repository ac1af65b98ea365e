use std::collections::HashMap;

use tokio::sync::RwLock;

use mailbot_core::domain::record::{ChatUserId, UserRecord};

use super::{RepositoryError, UserRecordRepository};

#[derive(Default)]
pub struct InMemoryUserRecordRepository {
    records: RwLock<HashMap<String, UserRecord>>,
}

#[async_trait::async_trait]
impl UserRecordRepository for InMemoryUserRecordRepository {
    async fn find_by_id(&self, id: &ChatUserId) -> Result<Option<UserRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(id.as_str()).cloned())
    }

    async fn save(&self, record: UserRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.insert(record.id.as_str().to_owned(), record);
        Ok(())
    }

    async fn delete(&self, id: &ChatUserId) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.remove(id.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mailbot_core::address::EmailAddress;
    use mailbot_core::domain::record::{ChatUserId, UserRecord};

    use crate::repositories::{InMemoryUserRecordRepository, UserRecordRepository};

    #[tokio::test]
    async fn in_memory_record_repo_round_trip() {
        let repo = InMemoryUserRecordRepository::default();
        let record = UserRecord::new(
            ChatUserId::new("U123"),
            EmailAddress::new("ada.lovelace@example.com"),
        );

        repo.save(record.clone()).await.expect("save record");
        let found = repo.find_by_id(&record.id).await.expect("find record");
        assert_eq!(found, Some(record.clone()));

        repo.delete(&record.id).await.expect("delete record");
        assert_eq!(repo.find_by_id(&record.id).await.expect("find"), None);
    }
}
