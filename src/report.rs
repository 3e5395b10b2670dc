// ==================== OPERATOR REPORT ====================
// Snapshots legíveis dos documentos antes/depois do merge.
// Nada aqui é lido de volta pelo programa.

use crate::merge::processor::RunSummary;
use crate::models::{UpdateOutcome, UserRecord};
use mongodb::bson::{Bson, DateTime, Document};
use serde::Serialize;

const BIO_PREVIEW_CHARS: usize = 80;
const URL_PREVIEW_CHARS: usize = 40;
const URL_REDACT_OVER: usize = 60;

#[derive(Debug, Serialize)]
pub struct RecordSnapshot {
    pub id: String,
    pub clerk_user_id: String,
    pub email: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub profile_photo_url: Option<String>,
    pub cover_photo_url: Option<String>,
    pub skills: usize,
    pub education: usize,
    pub experience: usize,
}

impl RecordSnapshot {
    pub fn of(record: &UserRecord) -> Self {
        Self::from_parts(record, &record.profile, record.created_at, record.updated_at)
    }

    /// Snapshot of `record` as it will look once `profile` and the timestamps are written
    pub fn from_parts(
        record: &UserRecord,
        profile: &Document,
        created_at: Option<DateTime>,
        updated_at: Option<DateTime>,
    ) -> Self {
        Self {
            id: record.id.to_hex(),
            clerk_user_id: record.identity_key.clone(),
            email: record.email.clone(),
            created_at: created_at.and_then(format_datetime),
            updated_at: updated_at.and_then(format_datetime),
            headline: string_field(profile, "headline"),
            bio: string_field(profile, "bio").map(|bio| truncate(&bio, BIO_PREVIEW_CHARS)),
            profile_photo_url: string_field(profile, "profilePhotoUrl").map(|url| redact_url(&url)),
            cover_photo_url: string_field(profile, "coverPhotoUrl").map(|url| redact_url(&url)),
            skills: list_len(profile, "skills"),
            education: list_len(profile, "education"),
            experience: list_len(profile, "experience"),
        }
    }
}

fn format_datetime(dt: DateTime) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(dt.timestamp_millis()).map(|d| d.to_rfc3339())
}

fn string_field(profile: &Document, key: &str) -> Option<String> {
    match profile.get(key) {
        Some(Bson::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn list_len(profile: &Document, key: &str) -> usize {
    profile.get_array(key).map(|items| items.len()).unwrap_or(0)
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}…", head)
}

/// Long URLs (signed upload links, data URIs) are cut down to their prefix
pub fn redact_url(url: &str) -> String {
    let len = url.chars().count();
    if len <= URL_REDACT_OVER {
        return url.to_string();
    }
    let head: String = url.chars().take(URL_PREVIEW_CHARS).collect();
    format!("{}…[{} chars]", head, len)
}

pub fn print_banner(collection: &str, dry_run: bool) {
    log::info!("════════════════════════════════════════════════");
    log::info!("🔀 Seed user → Clerk user merge ({})", collection);
    if dry_run {
        log::info!("🧪 DRY RUN: nothing will be written");
    }
    log::info!("════════════════════════════════════════════════");
}

pub fn print_snapshot(label: &str, snapshot: &RecordSnapshot) {
    match serde_json::to_string_pretty(snapshot) {
        Ok(json) => log::info!("   {}:\n{}", label, json),
        Err(e) => log::warn!("   {}: could not render snapshot: {}", label, e),
    }
}

pub fn print_write(label: &str, outcome: &UpdateOutcome) {
    log::info!(
        "   💾 {}: matched={} modified={}",
        label,
        outcome.matched,
        outcome.modified
    );
}

pub fn print_summary(summary: &RunSummary) {
    log::info!("════════════════════════════════════════════════");
    log::info!("📊 Merge summary");
    log::info!("   Duplicate email groups: {}", summary.groups_found);
    if summary.dry_run {
        log::info!("   Would merge:            {}", summary.merged);
    } else {
        log::info!("   Merged:                 {}", summary.merged);
    }
    log::info!("   Skipped:                {}", summary.skipped);
    log::info!("   Failed:                 {}", summary.failed);
    log::info!("════════════════════════════════════════════════");
    log::info!("💡 Re-run the duplicate-user audit to confirm no live duplicates remain");
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId};

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("curto", 80), "curto");
        assert_eq!(truncate("pesquisação", 8), "pesquisa…");
    }

    #[test]
    fn test_redact_url() {
        let short = "https://img.uni.edu/a.png";
        assert_eq!(redact_url(short), short);

        let long = format!("data:image/png;base64,{}", "A".repeat(200));
        let redacted = redact_url(&long);
        assert!(redacted.starts_with("data:image/png;base64,"));
        assert!(redacted.ends_with("[222 chars]"));
    }

    #[test]
    fn test_snapshot_counts_lists() {
        let record = UserRecord {
            id: ObjectId::new(),
            identity_key: "user_2".to_string(),
            email: "a@x.edu".to_string(),
            created_at: Some(DateTime::from_millis(0)),
            updated_at: None,
            profile: doc! {
                "headline": "",
                "skills": ["Go", "Rust"],
                "education": [{ "school": "UFPE" }],
            },
        };

        let snapshot = RecordSnapshot::of(&record);

        assert_eq!(snapshot.skills, 2);
        assert_eq!(snapshot.education, 1);
        assert_eq!(snapshot.experience, 0);
        assert_eq!(snapshot.headline, None);
        assert_eq!(snapshot.created_at.as_deref(), Some("1970-01-01T00:00:00+00:00"));
    }
}
