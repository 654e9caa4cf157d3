use anyhow::anyhow;
use campusplay_core::lifecycle::LifecyclePolicy;
use campusplay_core::{Actor, Role};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Settings {
    pub store_path: PathBuf,
    pub log_level: LevelFilter,
    pub policy: LifecyclePolicy,
    pub actor: Actor,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from a key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store_path = match get("CAMPUSPLAY_STORE") {
            Some(path) => PathBuf::from(path),
            None => default_store_path(get("XDG_CONFIG_HOME"), get("HOME")),
        };

        let log_level = match get("CAMPUSPLAY_LOG") {
            Some(level) => level
                .trim()
                .parse::<LevelFilter>()
                .map_err(|e| anyhow!("CAMPUSPLAY_LOG={level}: {e}"))?,
            None => LevelFilter::Info,
        };

        let policy = match get("CAMPUSPLAY_POLICY") {
            Some(name) => name
                .parse::<LifecyclePolicy>()
                .map_err(|e| anyhow!("CAMPUSPLAY_POLICY: {e}"))?,
            None => LifecyclePolicy::default(),
        };

        let role = match get("CAMPUSPLAY_ROLE") {
            Some(role) => role.parse::<Role>().map_err(|e| anyhow!("CAMPUSPLAY_ROLE: {e}"))?,
            None => Role::Coach,
        };
        let username = get("CAMPUSPLAY_USER")
            .or_else(|| get("USER"))
            .unwrap_or_else(|| "coach".to_string());
        let actor = Actor {
            id: get("CAMPUSPLAY_USER_ID").unwrap_or_else(|| username.clone()),
            username,
            role,
            sport_category: get("CAMPUSPLAY_SPORT"),
        };

        Ok(Self { store_path, log_level, policy, actor })
    }
}

fn default_store_path(config_home: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(config_dir) = config_home {
        return PathBuf::from(config_dir).join("campusplay").join("store.json");
    }
    if let Some(home) = home {
        return PathBuf::from(home)
            .join(".config")
            .join("campusplay")
            .join("store.json");
    }
    PathBuf::from("campusplay.json")
}
