/*
 * Shared data types for library discovery: the per-scan records produced by
 * the index and manifest readers, the deduplicated inventory, and the
 * structured warning taxonomy collected during a scan. Warnings are plain
 * data handed back to the caller; they are never used as control flow.
 */
use super::search_terms::normalize_title;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Subdirectory of a library root that holds the `appmanifest_*.acf` files.
pub const STEAMAPPS_DIR_NAME: &str = "steamapps";

/*
 * One filesystem location known to contain installed games, as declared by
 * an entry in `libraryfolders.vdf`. `apps` maps the app identifier to the
 * opaque build/version token Steam stores alongside it. Immutable once
 * produced for a given scan.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryRoot {
    pub path: PathBuf,
    pub apps: HashMap<String, String>,
}

impl LibraryRoot {
    /// Directory under this root where manifests are enumerated.
    pub fn steamapps_dir(&self) -> PathBuf {
        self.path.join(STEAMAPPS_DIR_NAME)
    }
}

/*
 * The normalized description of one discovered installed game, extracted
 * from an `appmanifest_*.acf` document. A record without an app id and a
 * name is invalid and never enters the inventory; the remaining fields
 * default to zero when absent or garbled.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub app_id: u64,
    pub name: String,
    pub install_dir: String,
    pub size_on_disk: u64,
    pub last_updated: i64,
    pub state_flags: u32,
}

impl ItemRecord {
    /*
     * The lowercased, word-segmented search key for this record's title,
     * computed on demand. Derived data only; it is never part of the
     * record's identity and is not persisted.
     */
    pub fn search_key(&self) -> String {
        normalize_title(&self.name)
    }
}

/// Deduplicated result of one scan: at most one record per app id.
pub type Inventory = HashMap<u64, ItemRecord>;

/*
 * A recoverable fault observed during a scan. Each variant carries the
 * affected path or identifier so callers can surface it in logs or UI
 * without the scan itself failing.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum ScanWarning {
    /// The index document had no recognizable library-folders block.
    IndexRootMissing { path: PathBuf },
    /// A library entry in the index lacked its required `path` field.
    LibraryEntryMissingPath { key: String },
    /// Listing manifest files under a library root failed.
    ManifestListing { dir: PathBuf, detail: String },
    /// A manifest file could not be read.
    ManifestUnreadable { path: PathBuf, detail: String },
    /// A document parsed with local faults (truncation, unbalanced braces).
    MalformedDocument { path: PathBuf, detail: String },
    /// A manifest parsed but lacked a required field; the record was dropped.
    ManifestInvalid { path: PathBuf, detail: String },
    /// A numeric manifest field held a non-numeric value and was zeroed.
    NumericFieldDefaulted { field: &'static str, value: String },
    /// The same app id appeared under two roots; the later record won.
    DuplicateApp {
        app_id: u64,
        kept_root: PathBuf,
        replaced_root: PathBuf,
    },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanWarning::IndexRootMissing { path } => {
                write!(f, "index document {path:?} has no library-folders block")
            }
            ScanWarning::LibraryEntryMissingPath { key } => {
                write!(f, "library entry \"{key}\" has no path field; skipped")
            }
            ScanWarning::ManifestListing { dir, detail } => {
                write!(f, "could not list manifests under {dir:?}: {detail}")
            }
            ScanWarning::ManifestUnreadable { path, detail } => {
                write!(f, "could not read manifest {path:?}: {detail}")
            }
            ScanWarning::MalformedDocument { path, detail } => {
                write!(f, "document {path:?} parsed with faults: {detail}")
            }
            ScanWarning::ManifestInvalid { path, detail } => {
                write!(f, "manifest {path:?} is invalid: {detail}")
            }
            ScanWarning::NumericFieldDefaulted { field, value } => {
                write!(f, "field \"{field}\" held non-numeric \"{value}\"; defaulted to 0")
            }
            ScanWarning::DuplicateApp {
                app_id,
                kept_root,
                replaced_root,
            } => write!(
                f,
                "app {app_id} found under both {replaced_root:?} and {kept_root:?}; kept the latter"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_steamapps_dir_joins_subdirectory() {
        let root = LibraryRoot {
            path: PathBuf::from("/games/SteamLibrary"),
            apps: HashMap::new(),
        };
        assert_eq!(
            root.steamapps_dir(),
            Path::new("/games/SteamLibrary/steamapps")
        );
    }

    #[test]
    fn test_search_key_derived_from_name() {
        let record = ItemRecord {
            app_id: 220,
            name: "HalfLife2".to_string(),
            install_dir: "Half-Life 2".to_string(),
            size_on_disk: 0,
            last_updated: 0,
            state_flags: 0,
        };
        assert_eq!(record.search_key(), "half life 2");
    }

    #[test]
    fn test_warning_display_mentions_identifier() {
        let warning = ScanWarning::DuplicateApp {
            app_id: 220,
            kept_root: PathBuf::from("/b"),
            replaced_root: PathBuf::from("/a"),
        };
        assert!(warning.to_string().contains("220"));
    }
}
