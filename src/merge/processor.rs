// ==================== IDENTITY MERGE PROCESSOR ====================
// Encontra emails duplicados (seed + Clerk), combina o perfil seed no
// documento Clerk e arquiva o seed. Nenhum documento é apagado.

use super::fields::{merge_profile, MergedProfile};
use super::identity::{classify_identity, IdentityKind};
use crate::config::IdentityPrefixes;
use crate::database::UserStore;
use crate::models::{DuplicateGroup, UpdateOutcome, UserRecord};
use crate::report::{self, RecordSnapshot};
use crate::utils::AppError;
use mongodb::bson::{doc, DateTime, Document};
use std::fmt;

/// Exactly one seed and one live record of the same email
#[derive(Debug, Clone)]
pub struct MergePair {
    pub live: UserRecord,
    pub legacy: UserRecord,
}

/// Por que um grupo ficou de fora do merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingSeed,
    MissingLive,
    MultipleSeeds(usize),
    MultipleLive(usize),
    UnrecognizedIdentity(String),
    InvalidRecord(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingSeed => write!(f, "no seed record"),
            SkipReason::MissingLive => write!(f, "no live record"),
            SkipReason::MultipleSeeds(n) => write!(f, "{} seed records", n),
            SkipReason::MultipleLive(n) => write!(f, "{} live records", n),
            SkipReason::UnrecognizedIdentity(key) => {
                write!(f, "identity key '{}' matches no known prefix", key)
            }
            SkipReason::InvalidRecord(msg) => write!(f, "{}", msg),
        }
    }
}

/// Picks the seed/live pair out of a duplicate-email group.
///
/// Only the shape "one seed + one live, nothing else" is merged; any other
/// group is left untouched.
pub fn select_merge_pair(
    members: &[Document],
    prefixes: &IdentityPrefixes,
) -> Result<MergePair, SkipReason> {
    let mut seeds = Vec::new();
    let mut lives = Vec::new();

    for member in members {
        let record = UserRecord::from_document(member)
            .map_err(|e| SkipReason::InvalidRecord(e.to_string()))?;

        match classify_identity(&record.identity_key, prefixes) {
            IdentityKind::Seed => seeds.push(record),
            IdentityKind::Live => lives.push(record),
            IdentityKind::Unknown => {
                return Err(SkipReason::UnrecognizedIdentity(record.identity_key));
            }
        }
    }

    if seeds.len() > 1 {
        return Err(SkipReason::MultipleSeeds(seeds.len()));
    }
    if lives.len() > 1 {
        return Err(SkipReason::MultipleLive(lives.len()));
    }

    match (lives.pop(), seeds.pop()) {
        (Some(live), Some(legacy)) => Ok(MergePair { live, legacy }),
        (None, _) => Err(SkipReason::MissingLive),
        (_, None) => Err(SkipReason::MissingSeed),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub groups_found: usize,
    pub merged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub dry_run: bool,
}

pub struct IdentityMergeProcessor<'a, S: UserStore + ?Sized> {
    store: &'a S,
    prefixes: IdentityPrefixes,
    dry_run: bool,
}

impl<'a, S: UserStore + ?Sized> IdentityMergeProcessor<'a, S> {
    pub fn new(store: &'a S, prefixes: IdentityPrefixes, dry_run: bool) -> Self {
        Self {
            store,
            prefixes,
            dry_run,
        }
    }

    pub async fn find_duplicate_email_groups(&self) -> Result<Vec<DuplicateGroup>, AppError> {
        self.store.find_duplicate_email_groups().await
    }

    /// Writes the merged profile onto the live record, then archives the seed record.
    ///
    /// Two independent `$set`s, no transaction. A missing document on
    /// either side is `NotFound`.
    pub async fn apply_merge(
        &self,
        live: &UserRecord,
        legacy: &UserRecord,
        merged: &MergedProfile,
    ) -> Result<(UpdateOutcome, UpdateOutcome), AppError> {
        let live_outcome = self
            .store
            .set_fields(&live.id, merged.to_set_document())
            .await?;
        if live_outcome.matched == 0 {
            return Err(AppError::NotFound(format!("live user {}", live.id)));
        }

        let archive = doc! {
            "mergedIntoId": live.id,
            "mergedIntoClerkUserId": live.identity_key.clone(),
            "archivedAt": merged.updated_at,
            "isArchived": true,
        };
        let legacy_outcome = self.store.set_fields(&legacy.id, archive).await?;
        if legacy_outcome.matched == 0 {
            return Err(AppError::NotFound(format!("seed user {}", legacy.id)));
        }

        Ok((live_outcome, legacy_outcome))
    }

    /// Runs the whole batch. Only a failure to list the groups is fatal;
    /// write failures are logged and counted per group.
    pub async fn run(&self) -> Result<RunSummary, AppError> {
        let groups = self.find_duplicate_email_groups().await?;

        let mut summary = RunSummary {
            groups_found: groups.len(),
            dry_run: self.dry_run,
            ..Default::default()
        };

        log::info!("🔎 Found {} duplicate email group(s)", groups.len());

        for (index, group) in groups.iter().enumerate() {
            log::info!(
                "── [{}/{}] {} ({} records)",
                index + 1,
                groups.len(),
                group.email,
                group.count
            );

            let pair = match select_merge_pair(&group.members, &self.prefixes) {
                Ok(pair) => pair,
                Err(reason) => {
                    log::warn!("   ⏭️  Skipping {}: {}", group.email, reason);
                    summary.skipped += 1;
                    continue;
                }
            };

            report::print_snapshot("seed (before)", &RecordSnapshot::of(&pair.legacy));
            report::print_snapshot("live (before)", &RecordSnapshot::of(&pair.live));

            let merged = merge_profile(&pair.live, &pair.legacy, DateTime::now());

            if self.dry_run {
                report::print_snapshot(
                    "live (planned)",
                    &RecordSnapshot::from_parts(
                        &pair.live,
                        &merged.fields,
                        merged.created_at,
                        Some(merged.updated_at),
                    ),
                );
                summary.merged += 1;
                continue;
            }

            match self.apply_merge(&pair.live, &pair.legacy, &merged).await {
                Ok((live_outcome, legacy_outcome)) => {
                    report::print_write("live updated", &live_outcome);
                    report::print_write("seed archived", &legacy_outcome);
                    report::print_snapshot(
                        "live (after)",
                        &RecordSnapshot::from_parts(
                            &pair.live,
                            &merged.fields,
                            merged.created_at,
                            Some(merged.updated_at),
                        ),
                    );
                    log::info!(
                        "   ✅ Merged {} into {}",
                        pair.legacy.identity_key,
                        pair.live.identity_key
                    );
                    summary.merged += 1;
                }
                Err(e) => {
                    log::error!(
                        "   ❌ Merge failed for {} (live {}, seed {}): {}",
                        group.email,
                        pair.live.id,
                        pair.legacy.id,
                        e
                    );
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
