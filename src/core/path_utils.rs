/*
 * This module provides path-related helpers shared across the core: the
 * platform-specific per-user configuration directory (where the profile
 * store keeps `profiles.json`) and a pure predicate for classifying library
 * paths found in VDF documents.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

/*
 * Retrieves the application's local (non-roaming) configuration directory,
 * creating it if necessary. The path is derived without an organization
 * qualifier, placing it directly under the user's local application data
 * directory (e.g., AppData/Local on Windows). Returns `None` if the
 * directory could not be determined or created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Attempting to get base app config local dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|proj_dirs| {
        let config_path = proj_dirs.config_local_dir();
        if !config_path.exists() {
            if let Err(e) = fs::create_dir_all(config_path) {
                log::error!(
                    "PathUtils: Failed to create base app config directory {config_path:?}: {e}"
                );
                return None;
            }
            log::debug!("PathUtils: Created base app config directory: {config_path:?}");
        }
        Some(config_path.to_path_buf())
    })
}

/*
 * Returns true when a path string is rooted at a drive letter in the
 * Windows style: a single ASCII letter, a colon, then a backslash. Library
 * paths in `libraryfolders.vdf` use this form on Windows installs; paths
 * without the prefix are treated as POSIX-style and used as-is. Purely a
 * string test; performs no filesystem access.
 */
pub fn is_drive_rooted(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(letter), Some(':'), Some('\\')) if letter.is_ascii_alphabetic()
    )
}
