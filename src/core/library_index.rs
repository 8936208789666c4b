/*
 * This module reads the parsed form of the root library index document
 * (`libraryfolders.vdf`) and yields the set of library roots Steam knows
 * about. Each entry's ordinal key ("0", "1", ...) is positional only and is
 * discarded. Faulty entries are skipped with a warning; only the scanner's
 * failure to read the index file itself is ever fatal, and that is handled
 * upstream.
 */
use super::models::{LibraryRoot, ScanWarning};
use super::path_utils::is_drive_rooted;
use super::vdf::{VdfBlock, VdfValue};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const LIBRARY_FOLDERS_KEY: &str = "libraryfolders";

/*
 * Extracts library roots from one parsed index document. Returns the roots
 * in document order plus any warnings:
 *  - a missing `libraryfolders` block yields zero roots and a warning;
 *  - an entry without a `path` scalar is skipped with a warning;
 *  - a missing `apps` block yields an empty identifier map, not a fault.
 */
pub fn read_index(document: &VdfBlock, index_path: &Path) -> (Vec<LibraryRoot>, Vec<ScanWarning>) {
    let mut warnings = Vec::new();
    let Some(folders) = document.get_block(LIBRARY_FOLDERS_KEY) else {
        log::warn!("LibraryIndexReader: No '{LIBRARY_FOLDERS_KEY}' block in {index_path:?}.");
        warnings.push(ScanWarning::IndexRootMissing {
            path: index_path.to_path_buf(),
        });
        return (Vec::new(), warnings);
    };

    let mut roots = Vec::new();
    for (key, value) in folders.iter() {
        let VdfValue::Block(entry) = value else {
            // Scalars at this level ("contentid" on some client versions)
            // carry no library information.
            continue;
        };
        let Some(path_text) = entry.get_scalar("path") else {
            log::warn!("LibraryIndexReader: Entry \"{key}\" has no path field; skipping.");
            warnings.push(ScanWarning::LibraryEntryMissingPath {
                key: key.to_string(),
            });
            continue;
        };
        if !is_drive_rooted(path_text) {
            log::trace!(
                "LibraryIndexReader: Path '{path_text}' is not drive-rooted; treating as POSIX."
            );
        }

        let mut apps = HashMap::new();
        if let Some(apps_block) = entry.get_block("apps") {
            for (app_id, token) in apps_block.iter() {
                if let VdfValue::Scalar(token) = token {
                    apps.insert(app_id.to_string(), token.clone());
                }
            }
        }

        roots.push(LibraryRoot {
            path: PathBuf::from(path_text),
            apps,
        });
    }

    log::debug!(
        "LibraryIndexReader: Found {} library root(s) in {index_path:?}.",
        roots.len()
    );
    (roots, warnings)
}
