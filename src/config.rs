use crate::utils::AppError;
use std::env;

const DEFAULT_DATABASE: &str = "research_collab";
const DEFAULT_COLLECTION: &str = "users";
const DEFAULT_SEED_PREFIX: &str = "seed_clerk_";
const DEFAULT_LIVE_PREFIX: &str = "user_";

/// Identity key prefixes that tell seed accounts apart from live Clerk accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPrefixes {
    pub seed: String,
    pub live: String,
}

impl Default for IdentityPrefixes {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED_PREFIX.to_string(),
            live: DEFAULT_LIVE_PREFIX.to_string(),
        }
    }
}

/// Runtime configuration, read from the environment after `.env` is loaded
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub database_url: String,
    pub database_name: String,
    pub users_collection: String,
    pub prefixes: IdentityPrefixes,
    pub dry_run: bool,
}

impl MergeConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("DATABASE_URL must be set".to_string()))?;

        let database_name = database_name_from_uri(&database_url)
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let users_collection =
            lookup("USERS_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        let prefixes = IdentityPrefixes {
            seed: lookup("SEED_IDENTITY_PREFIX").unwrap_or_else(|| DEFAULT_SEED_PREFIX.to_string()),
            live: lookup("LIVE_IDENTITY_PREFIX").unwrap_or_else(|| DEFAULT_LIVE_PREFIX.to_string()),
        };

        if prefixes.seed.is_empty() || prefixes.live.is_empty() {
            return Err(AppError::ConfigError(
                "identity prefixes must not be empty".to_string(),
            ));
        }
        if prefixes.seed.starts_with(&prefixes.live) || prefixes.live.starts_with(&prefixes.seed) {
            return Err(AppError::ConfigError(format!(
                "identity prefixes '{}' and '{}' overlap",
                prefixes.seed, prefixes.live
            )));
        }

        let dry_run = match lookup("MERGE_DRY_RUN") {
            Some(value) => parse_flag(&value)?,
            None => false,
        };

        Ok(Self {
            database_url,
            database_name,
            users_collection,
            prefixes,
            dry_run,
        })
    }
}

/// Database name from the URI path (`mongodb://host:27017/<name>?opts`)
pub fn database_name_from_uri(uri: &str) -> Option<String> {
    let without_scheme = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    let (_, path) = without_scheme.split_once('/')?;
    let name = path.split('?').next().unwrap_or("");

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn parse_flag(value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::ConfigError(format!(
            "MERGE_DRY_RUN has invalid value '{}'",
            other
        ))),
    }
}
