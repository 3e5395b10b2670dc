use crate::merge::fields::PROFILE_FIELDS;
use crate::utils::AppError;
use mongodb::bson::{oid::ObjectId, Bson, DateTime, Document};

/// Documento da collection "users", reduzido ao que o merge lê
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: ObjectId,
    /// `clerkUserId`; the prefix says which auth system issued it
    pub identity_key: String,
    pub email: String,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
    /// Only the mergeable profile fields that are present on the document
    pub profile: Document,
}

impl UserRecord {
    pub fn from_document(doc: &Document) -> Result<Self, AppError> {
        let id = doc
            .get_object_id("_id")
            .map_err(|_| AppError::InvalidRecord("document has no ObjectId _id".to_string()))?;

        let identity_key = doc
            .get_str("clerkUserId")
            .map_err(|_| AppError::InvalidRecord(format!("user {} has no clerkUserId", id)))?
            .to_string();

        let email = doc.get_str("email").unwrap_or_default().to_string();

        let mut profile = Document::new();
        for field in PROFILE_FIELDS {
            if let Some(value) = doc.get(field.name) {
                profile.insert(field.name, value.clone());
            }
        }

        Ok(Self {
            id,
            identity_key,
            email,
            created_at: optional_datetime(doc, "createdAt"),
            updated_at: optional_datetime(doc, "updatedAt"),
            profile,
        })
    }
}

fn optional_datetime(doc: &Document, key: &str) -> Option<DateTime> {
    match doc.get(key) {
        Some(Bson::DateTime(dt)) => Some(*dt),
        _ => None,
    }
}

/// Grupo de documentos com o mesmo email (count > 1)
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub email: String,
    pub count: usize,
    pub members: Vec<Document>,
}

/// Resultado de um `$set` direcionado por `_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}
