//! In-memory `UserStore` used by the merge tests.

use super::UserStore;
use crate::models::{DuplicateGroup, UpdateOutcome};
use crate::utils::AppError;
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<Vec<Document>>,
    failing_ids: Mutex<HashSet<ObjectId>>,
    writes: Mutex<usize>,
    fail_grouping: bool,
}

impl MemoryStore {
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            docs: Mutex::new(docs),
            ..Default::default()
        }
    }

    /// Store whose grouping query always fails (lost connectivity)
    pub fn unreachable() -> Self {
        Self {
            fail_grouping: true,
            ..Default::default()
        }
    }

    pub fn fail_writes_for(&self, id: ObjectId) {
        self.failing_ids.lock().unwrap().insert(id);
    }

    pub fn get(&self, id: &ObjectId) -> Option<Document> {
        self.docs
            .lock()
            .unwrap()
            .iter()
            .find(|doc| doc.get_object_id("_id").ok() == Some(*id))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_duplicate_email_groups(&self) -> Result<Vec<DuplicateGroup>, AppError> {
        if self.fail_grouping {
            return Err(AppError::DatabaseError("connection refused".to_string()));
        }

        let docs = self.docs.lock().unwrap();
        let mut groups: Vec<DuplicateGroup> = Vec::new();

        for doc in docs.iter() {
            if doc.get_bool("isArchived").unwrap_or(false) {
                continue;
            }
            let email = match doc.get_str("email") {
                Ok(email) if !email.is_empty() => email,
                _ => continue,
            };

            match groups.iter_mut().find(|g| g.email == email) {
                Some(group) => {
                    group.count += 1;
                    group.members.push(doc.clone());
                }
                None => groups.push(DuplicateGroup {
                    email: email.to_string(),
                    count: 1,
                    members: vec![doc.clone()],
                }),
            }
        }

        groups.retain(|g| g.count > 1);
        Ok(groups)
    }

    async fn set_fields(&self, id: &ObjectId, fields: Document) -> Result<UpdateOutcome, AppError> {
        *self.writes.lock().unwrap() += 1;

        if self.failing_ids.lock().unwrap().contains(id) {
            return Err(AppError::DatabaseError(format!("write rejected for {}", id)));
        }

        let mut docs = self.docs.lock().unwrap();
        let target = docs
            .iter_mut()
            .find(|doc| doc.get_object_id("_id").ok() == Some(*id));

        let Some(doc) = target else {
            return Ok(UpdateOutcome::default());
        };

        let mut modified = false;
        for (key, value) in fields {
            if doc.get(&key) != Some(&value) {
                modified = true;
            }
            doc.insert(key, value);
        }

        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(modified),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, Bson};

    #[tokio::test]
    async fn test_groups_skip_archived_and_singletons() {
        let store = MemoryStore::new(vec![
            doc! { "_id": ObjectId::new(), "email": "a@x.edu", "clerkUserId": "user_1" },
            doc! { "_id": ObjectId::new(), "email": "a@x.edu", "clerkUserId": "seed_clerk_1", "isArchived": true },
            doc! { "_id": ObjectId::new(), "email": "b@x.edu", "clerkUserId": "user_2" },
            doc! { "_id": ObjectId::new(), "email": "b@x.edu", "clerkUserId": "seed_clerk_2" },
            doc! { "_id": ObjectId::new(), "email": "", "clerkUserId": "user_3" },
            doc! { "_id": ObjectId::new(), "email": "", "clerkUserId": "user_4" },
            doc! { "_id": ObjectId::new(), "clerkUserId": "user_5", "email": Bson::Null },
        ]);

        let groups = store.find_duplicate_email_groups().await.unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].email, "b@x.edu");
        assert_eq!(groups[0].count, 2);
    }

    #[tokio::test]
    async fn test_set_fields_unknown_id_matches_nothing() {
        let store = MemoryStore::new(vec![]);

        let outcome = store
            .set_fields(&ObjectId::new(), doc! { "bio": "x" })
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::default());
    }
}
