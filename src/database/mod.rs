#[cfg(test)]
pub mod memory;

use crate::models::{DuplicateGroup, UpdateOutcome};
use crate::utils::AppError;
use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::{Client, Collection, Database};

/// Operações que o merge precisa da collection de usuários
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Non-archived documents grouped by email, only groups with more than one member
    async fn find_duplicate_email_groups(&self) -> Result<Vec<DuplicateGroup>, AppError>;

    /// Targeted `$set` on one document by `_id`
    async fn set_fields(&self, id: &ObjectId, fields: Document) -> Result<UpdateOutcome, AppError>;
}

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
    users_collection: String,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str, users_collection: &str) -> Result<Self, AppError> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Batch job: poucas conexões bastam
        client_options.max_pool_size = Some(4);
        client_options.app_name = Some("seed-user-merge".to_string());

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self {
            client,
            db,
            users_collection: users_collection.to_string(),
        };

        mongodb.ensure_indexes().await;

        Ok(mongodb)
    }

    /// Index on email so the grouping scan doesn't sort the whole collection.
    /// Not unique: duplicates are exactly what this tool cleans up.
    async fn ensure_indexes(&self) {
        use mongodb::IndexModel;

        let email_index = IndexModel::builder().keys(doc! { "email": 1 }).build();

        match self.users().create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index ready: {}(email)", self.users_collection),
            Err(e) => log::debug!("   ℹ️  Index not created: {}", e),
        }
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    fn users(&self) -> Collection<Document> {
        self.collection::<Document>(&self.users_collection)
    }

    /// Fecha o pool de conexões. Consome o handle.
    pub async fn close(self) {
        self.client.shutdown().await;
        log::debug!("🔌 MongoDB connection closed");
    }
}

/// `$match` → `$group` por email → `$match count > 1`
pub fn duplicate_groups_pipeline() -> Vec<Document> {
    vec![
        doc! {
            "$match": {
                "isArchived": { "$ne": true },
                "email": { "$type": "string", "$ne": "" },
            }
        },
        doc! {
            "$group": {
                "_id": "$email",
                "count": { "$sum": 1 },
                "users": { "$push": "$$ROOT" },
            }
        },
        doc! { "$match": { "count": { "$gt": 1 } } },
    ]
}

fn group_from_document(doc: &Document) -> Result<DuplicateGroup, AppError> {
    let email = doc
        .get_str("_id")
        .map_err(|e| AppError::InvalidRecord(format!("group without email key: {}", e)))?
        .to_string();

    let count = match doc.get("count") {
        Some(Bson::Int32(n)) => *n as usize,
        Some(Bson::Int64(n)) => *n as usize,
        _ => 0,
    };

    let members = doc
        .get_array("users")
        .map_err(|e| AppError::InvalidRecord(format!("group {} without members: {}", email, e)))?
        .iter()
        .filter_map(|member| member.as_document().cloned())
        .collect::<Vec<_>>();

    Ok(DuplicateGroup {
        email,
        count,
        members,
    })
}

#[async_trait]
impl UserStore for MongoDB {
    async fn find_duplicate_email_groups(&self) -> Result<Vec<DuplicateGroup>, AppError> {
        let mut cursor = self.users().aggregate(duplicate_groups_pipeline()).await?;

        let mut groups = Vec::new();
        while let Some(result) = cursor.next().await {
            let doc = result?;
            groups.push(group_from_document(&doc)?);
        }

        Ok(groups)
    }

    async fn set_fields(&self, id: &ObjectId, fields: Document) -> Result<UpdateOutcome, AppError> {
        let result = self
            .users()
            .update_one(doc! { "_id": *id }, doc! { "$set": fields })
            .await?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }
}
