use crate::models::UserRecord;
use mongodb::bson::{Bson, DateTime, Document};

/// Como um campo de perfil é combinado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    List,
    Map,
}

#[derive(Debug, Clone, Copy)]
pub struct ProfileField {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> ProfileField {
    ProfileField { name, kind }
}

pub const PROFILE_FIELDS: &[ProfileField] = &[
    field("bio", FieldKind::Scalar),
    field("headline", FieldKind::Scalar),
    field("city", FieldKind::Scalar),
    field("location", FieldKind::Scalar),
    field("profilePhotoUrl", FieldKind::Scalar),
    field("coverPhotoUrl", FieldKind::Scalar),
    field("skills", FieldKind::List),
    field("education", FieldKind::List),
    field("experience", FieldKind::List),
    field("featuredProjectId", FieldKind::Scalar),
    field("profileLinks", FieldKind::Map),
];

/// Perfil combinado pronto para o `$set` no documento live
#[derive(Debug, Clone, PartialEq)]
pub struct MergedProfile {
    pub fields: Document,
    pub created_at: Option<DateTime>,
    pub updated_at: DateTime,
}

impl MergedProfile {
    pub fn to_set_document(&self) -> Document {
        let mut set = self.fields.clone();
        if let Some(created_at) = self.created_at {
            set.insert("createdAt", created_at);
        }
        set.insert("updatedAt", self.updated_at);
        set
    }
}

/// Null, absent and "" all count as "no value"
fn has_value(value: Option<&Bson>) -> bool {
    match value {
        None | Some(Bson::Null) => false,
        Some(Bson::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn merge_scalar(live: Option<&Bson>, legacy: Option<&Bson>) -> Option<Bson> {
    if has_value(live) {
        return live.cloned();
    }
    match legacy {
        None | Some(Bson::Null) => None,
        Some(value) => Some(value.clone()),
    }
}

/// Merge one profile field. Live wins when it has a value, legacy fills
/// the gap. Lists are taken whole from one side; maps merge key by key.
pub fn merge_field(kind: FieldKind, live: Option<&Bson>, legacy: Option<&Bson>) -> Option<Bson> {
    match kind {
        FieldKind::List => {
            if let Some(Bson::Array(items)) = live {
                if !items.is_empty() {
                    return Some(Bson::Array(items.clone()));
                }
            }
            match legacy {
                Some(Bson::Array(items)) => Some(Bson::Array(items.clone())),
                _ => Some(Bson::Array(Vec::new())),
            }
        }
        FieldKind::Map => match (live, legacy) {
            (Some(Bson::Document(live_map)), Some(Bson::Document(legacy_map))) => {
                let mut merged = legacy_map.clone();
                for (key, value) in live_map {
                    if has_value(Some(value)) {
                        merged.insert(key.clone(), value.clone());
                    }
                }
                Some(Bson::Document(merged))
            }
            _ => merge_scalar(live, legacy),
        },
        FieldKind::Scalar => merge_scalar(live, legacy),
    }
}

/// Combina o perfil legacy no live sem alterar nenhum dos dois.
///
/// `createdAt` fica com o mais antigo dos dois; `updatedAt` recebe `now`.
/// Campos cujo resultado é vazio ficam de fora do documento.
pub fn merge_profile(live: &UserRecord, legacy: &UserRecord, now: DateTime) -> MergedProfile {
    let mut fields = Document::new();

    for field in PROFILE_FIELDS {
        let merged = merge_field(
            field.kind,
            live.profile.get(field.name),
            legacy.profile.get(field.name),
        );
        if let Some(value) = merged {
            log::debug!("      {} <- {:?}", field.name, value);
            fields.insert(field.name, value);
        }
    }

    let created_at = match (live.created_at, legacy.created_at) {
        (Some(live_at), Some(legacy_at)) if legacy_at < live_at => Some(legacy_at),
        (None, Some(legacy_at)) => Some(legacy_at),
        (live_at, _) => live_at,
    };

    MergedProfile {
        fields,
        created_at,
        updated_at: now,
    }
}
