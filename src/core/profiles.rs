/*
 * This module manages DXVK configuration profiles. A fixed set of builtin
 * profiles ships with the application; user-created profiles are persisted
 * as a JSON array in `profiles.json` under the per-user config directory.
 * The two sets are composed at read time — the builtin set is never
 * mutated on disk or in memory, and deleting a builtin is rejected with a
 * dedicated error kind.
 *
 * It includes a trait for profile operations (`ProfileManagerOperations`)
 * to facilitate testing and dependency injection, and a concrete
 * implementation (`CoreProfileManager`).
 */
use super::path_utils;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use uuid::Uuid;

pub const PROFILES_FILENAME: &str = "profiles.json";

#[derive(Debug)]
pub enum ProfileError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoConfigDirectory,
    BuiltinProfile(String),
}

impl From<io::Error> for ProfileError {
    fn from(err: io::Error) -> Self {
        ProfileError::Io(err)
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(err: serde_json::Error) -> Self {
        ProfileError::Serde(err)
    }
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::Io(e) => write!(f, "I/O error: {e}"),
            ProfileError::Serde(e) => write!(f, "Serialization/Deserialization error: {e}"),
            ProfileError::NoConfigDirectory => {
                write!(f, "Could not determine config directory for profiles")
            }
            ProfileError::BuiltinProfile(id) => {
                write!(f, "Profile '{id}' is builtin and cannot be deleted")
            }
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfileError::Io(e) => Some(e),
            ProfileError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProfileError>;

/*
 * One DXVK profile. The tuning fields are individually optional; an unset
 * field means "leave DXVK's own default in place", which keeps saved JSON
 * minimal and forward-compatible.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DxvkProfile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_builtin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_async: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_compiler_threads: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_frame_latency: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hud: Option<Vec<String>>,
    // Stored as "enableHDR", the spelling existing profiles.json files use.
    #[serde(default, rename = "enableHDR", skip_serializing_if = "Option::is_none")]
    pub enable_hdr: Option<bool>,
}

impl DxvkProfile {
    fn builtin(id: &str, name: &str, description: &str) -> Self {
        DxvkProfile {
            id: id.to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
            is_builtin: true,
            enable_async: None,
            num_compiler_threads: None,
            max_frame_latency: None,
            sync_interval: None,
            log_level: None,
            hud: None,
            enable_hdr: None,
        }
    }
}

/*
 * The immutable builtin catalog. Constructed fresh on each call so callers
 * can never mutate shared state through it.
 */
pub fn builtin_profiles() -> Vec<DxvkProfile> {
    vec![
        DxvkProfile {
            enable_async: Some(true),
            log_level: Some("warn".to_string()),
            ..DxvkProfile::builtin(
                "builtin-default",
                "DXVK Defaults",
                "Standard DXVK behavior with no overrides.",
            )
        },
        DxvkProfile {
            enable_async: Some(true),
            num_compiler_threads: Some(0),
            max_frame_latency: Some(1),
            sync_interval: Some(0),
            log_level: Some("none".to_string()),
            enable_hdr: Some(false),
            ..DxvkProfile::builtin(
                "builtin-performance",
                "Max Performance",
                "Optimized for lowest latency and highest throughput.",
            )
        },
        DxvkProfile {
            // Async can cause crashes in some games.
            enable_async: Some(false),
            num_compiler_threads: Some(1),
            max_frame_latency: Some(3),
            log_level: Some("info".to_string()),
            ..DxvkProfile::builtin(
                "builtin-compatibility",
                "Compatibility Mode",
                "Safest settings for troublesome games.",
            )
        },
        DxvkProfile {
            enable_async: Some(true),
            hud: Some(vec!["full".to_string()]),
            log_level: Some("debug".to_string()),
            ..DxvkProfile::builtin(
                "builtin-debugging",
                "Debugging",
                "Enables HUD and detailed logging.",
            )
        },
    ]
}

fn is_builtin_id(id: &str) -> bool {
    builtin_profiles().iter().any(|p| p.id == id)
}

pub trait ProfileManagerOperations: Send + Sync {
    /// All profiles, builtins first, composed at read time.
    fn all_profiles(&self) -> Result<Vec<DxvkProfile>>;
    /// Upserts a profile into the user set and returns the stored form.
    fn save_profile(&self, profile: DxvkProfile) -> Result<DxvkProfile>;
    /// Removes a user profile. Ok(false) when the id was not found.
    fn delete_profile(&self, id: &str) -> Result<bool>;
}

pub struct CoreProfileManager {
    storage_dir: PathBuf,
}

impl CoreProfileManager {
    /*
     * Creates a manager storing user profiles under the application's
     * per-user config directory. Returns `None` when that directory cannot
     * be determined or created.
     */
    pub fn for_app(app_name: &str) -> Option<Self> {
        path_utils::get_base_app_config_local_dir(app_name)
            .map(|storage_dir| CoreProfileManager { storage_dir })
    }

    /// Creates a manager with an explicit storage directory.
    pub fn with_storage_dir(storage_dir: PathBuf) -> Self {
        CoreProfileManager { storage_dir }
    }

    fn profiles_path(&self) -> PathBuf {
        self.storage_dir.join(PROFILES_FILENAME)
    }

    /*
     * Loads the user set from `profiles.json`. A missing file is an empty
     * set. Entries that fail to deserialize are skipped with a warning so
     * one hand-edited bad entry cannot take every other profile with it.
     */
    fn load_user_profiles(&self) -> Result<Vec<DxvkProfile>> {
        let path = self.profiles_path();
        if !path.exists() {
            log::trace!("CoreProfileManager: No profiles file at {path:?}; empty user set.");
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let raw: serde_json::Value = serde_json::from_reader(reader)?;
        let Some(entries) = raw.as_array() else {
            log::warn!("CoreProfileManager: {path:?} is not a JSON array; ignoring it.");
            return Ok(Vec::new());
        };

        let mut profiles = Vec::new();
        let mut skipped = 0usize;
        for entry in entries {
            match serde_json::from_value::<DxvkProfile>(entry.clone()) {
                Ok(profile) => profiles.push(profile),
                Err(e) => {
                    skipped += 1;
                    log::warn!("CoreProfileManager: Skipping invalid profile entry: {e}");
                }
            }
        }
        if skipped > 0 {
            log::warn!("CoreProfileManager: Skipped {skipped} invalid profile(s) in {path:?}.");
        }
        Ok(profiles)
    }

    fn save_user_profiles(&self, profiles: &[DxvkProfile]) -> Result<()> {
        let path = self.profiles_path();
        let file = File::create(&path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, profiles)?;
        log::debug!(
            "CoreProfileManager: Saved {} user profile(s) to {path:?}.",
            profiles.len()
        );
        Ok(())
    }
}

impl ProfileManagerOperations for CoreProfileManager {
    fn all_profiles(&self) -> Result<Vec<DxvkProfile>> {
        let mut profiles = builtin_profiles();
        profiles.extend(self.load_user_profiles()?);
        Ok(profiles)
    }

    /*
     * Upserts into the user set. A profile without an id gets a fresh UUID;
     * `is_builtin` is forced false so a saved profile can never masquerade
     * as part of the builtin catalog.
     */
    fn save_profile(&self, profile: DxvkProfile) -> Result<DxvkProfile> {
        let mut user_profiles = self.load_user_profiles()?;

        let mut stored = profile;
        if stored.id.is_empty() {
            stored.id = Uuid::new_v4().to_string();
        }
        stored.is_builtin = false;

        if let Some(existing) = user_profiles.iter_mut().find(|p| p.id == stored.id) {
            *existing = stored.clone();
        } else {
            user_profiles.push(stored.clone());
        }

        self.save_user_profiles(&user_profiles)?;
        log::debug!(
            "CoreProfileManager: Saved profile '{}' ({}).",
            stored.name,
            stored.id
        );
        Ok(stored)
    }

    fn delete_profile(&self, id: &str) -> Result<bool> {
        if is_builtin_id(id) {
            return Err(ProfileError::BuiltinProfile(id.to_string()));
        }

        let mut user_profiles = self.load_user_profiles()?;
        let before = user_profiles.len();
        user_profiles.retain(|p| p.id != id);
        if user_profiles.len() == before {
            log::debug!("CoreProfileManager: Profile '{id}' not found; nothing deleted.");
            return Ok(false);
        }

        self.save_user_profiles(&user_profiles)?;
        log::debug!("CoreProfileManager: Deleted profile '{id}'.");
        Ok(true)
    }
}
