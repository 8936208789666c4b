/*
 * This module aggregates the per-document readers into one library scan: it
 * reads the root index, enumerates manifest files under every library root,
 * and folds the resulting records into a single deduplicated inventory.
 *
 * Filesystem access goes through the `FileAccessOperations` trait so tests
 * and alternative backends can supply their own file source; the concrete
 * `CoreFileAccess` uses `std::fs` and glob matching.
 *
 * Only failure to read the root index aborts a scan — with no index there
 * is nothing to enumerate. Every other fault (unreadable file, malformed
 * document, invalid record, duplicate app id) degrades to a structured
 * `ScanWarning`, because a partial inventory is strictly more useful than
 * an aborted scan over a tree known to contain occasionally-corrupt files.
 */
use super::library_index::read_index;
use super::manifest::read_manifest;
use super::models::{Inventory, LibraryRoot, ScanWarning};
use super::vdf;
use glob::glob;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MANIFEST_GLOB: &str = "appmanifest_*.acf";

#[derive(Debug)]
pub enum ScanError {
    IndexRead { path: PathBuf, source: io::Error },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::IndexRead { path, source } => {
                write!(f, "could not read library index {path:?}: {source}")
            }
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::IndexRead { source, .. } => Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

/*
 * Narrow filesystem-read contract the scanner depends on. Both operations
 * are synchronous; `list_manifest_files` enumerates candidate manifest
 * paths under one library root's steamapps directory.
 */
pub trait FileAccessOperations: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn list_manifest_files(&self, steamapps_dir: &Path) -> io::Result<Vec<PathBuf>>;
}

/*
 * Concrete `FileAccessOperations` backed by the real filesystem. Manifest
 * enumeration uses the `glob` crate with the `appmanifest_*.acf` pattern
 * and sorts the results so scans are deterministic.
 */
pub struct CoreFileAccess {}

impl CoreFileAccess {
    pub fn new() -> Self {
        CoreFileAccess {}
    }
}

impl Default for CoreFileAccess {
    fn default() -> Self {
        Self::new()
    }
}

impl FileAccessOperations for CoreFileAccess {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn list_manifest_files(&self, steamapps_dir: &Path) -> io::Result<Vec<PathBuf>> {
        let pattern = steamapps_dir.join(MANIFEST_GLOB);
        let pattern = pattern
            .to_str()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "non-UTF-8 library path"))?;
        let entries =
            glob(pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => files.push(path),
                Err(e) => log::warn!("CoreFileAccess: Skipping unreadable glob entry: {e}"),
            }
        }
        files.sort_unstable();
        Ok(files)
    }
}

/*
 * The full result of one scan pass: the library roots the index declared,
 * the deduplicated inventory, and every warning collected along the way.
 * Scans share no state; each call produces a fresh outcome.
 */
#[derive(Debug)]
pub struct ScanOutcome {
    pub roots: Vec<LibraryRoot>,
    pub inventory: Inventory,
    pub warnings: Vec<ScanWarning>,
}

pub struct CoreLibraryScanner {
    file_access: Arc<dyn FileAccessOperations>,
}

impl CoreLibraryScanner {
    pub fn new(file_access: Arc<dyn FileAccessOperations>) -> Self {
        CoreLibraryScanner { file_access }
    }

    /*
     * Scans every library root declared by the index document at
     * `index_path` and returns the deduplicated inventory. Roots are
     * processed in document order and the fold is last-root-wins: when two
     * roots declare the same app id, the record from the later root
     * replaces the earlier one and a `DuplicateApp` warning is recorded.
     * Every record in the returned inventory passed the manifest reader's
     * validity check.
     */
    pub fn scan(&self, index_path: &Path) -> Result<ScanOutcome> {
        log::debug!("LibraryScanner: Starting scan from index {index_path:?}.");
        let index_text =
            self.file_access
                .read_to_string(index_path)
                .map_err(|source| ScanError::IndexRead {
                    path: index_path.to_path_buf(),
                    source,
                })?;

        let mut warnings = Vec::new();
        let parsed = vdf::parse(&index_text);
        push_parse_warnings(&mut warnings, index_path, &parsed.diagnostics);

        let (roots, index_warnings) = read_index(&parsed.root, index_path);
        warnings.extend(index_warnings);

        let mut inventory = Inventory::new();
        let mut origins: HashMap<u64, PathBuf> = HashMap::new();
        for root in &roots {
            self.scan_root(root, &mut inventory, &mut origins, &mut warnings);
        }

        log::debug!(
            "LibraryScanner: Scan complete. {} game(s) across {} root(s), {} warning(s).",
            inventory.len(),
            roots.len(),
            warnings.len()
        );
        Ok(ScanOutcome {
            roots,
            inventory,
            warnings,
        })
    }

    fn scan_root(
        &self,
        root: &LibraryRoot,
        inventory: &mut Inventory,
        origins: &mut HashMap<u64, PathBuf>,
        warnings: &mut Vec<ScanWarning>,
    ) {
        let steamapps = root.steamapps_dir();
        let files = match self.file_access.list_manifest_files(&steamapps) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("LibraryScanner: Could not list manifests under {steamapps:?}: {e}");
                warnings.push(ScanWarning::ManifestListing {
                    dir: steamapps,
                    detail: e.to_string(),
                });
                return;
            }
        };
        log::trace!(
            "LibraryScanner: {} manifest file(s) under {steamapps:?}.",
            files.len()
        );

        for file in files {
            let text = match self.file_access.read_to_string(&file) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("LibraryScanner: Could not read {file:?}: {e}");
                    warnings.push(ScanWarning::ManifestUnreadable {
                        path: file,
                        detail: e.to_string(),
                    });
                    continue;
                }
            };

            let parsed = vdf::parse(&text);
            push_parse_warnings(warnings, &file, &parsed.diagnostics);

            match read_manifest(&parsed.root) {
                Ok((record, record_warnings)) => {
                    warnings.extend(record_warnings);
                    let app_id = record.app_id;
                    if inventory.insert(app_id, record).is_some() {
                        let replaced_root = origins
                            .get(&app_id)
                            .cloned()
                            .unwrap_or_else(|| root.path.clone());
                        log::warn!(
                            "LibraryScanner: App {app_id} already seen under {replaced_root:?}; keeping the record from {:?}.",
                            root.path
                        );
                        warnings.push(ScanWarning::DuplicateApp {
                            app_id,
                            kept_root: root.path.clone(),
                            replaced_root,
                        });
                    }
                    origins.insert(app_id, root.path.clone());
                }
                Err(e) => {
                    log::warn!("LibraryScanner: Dropping invalid manifest {file:?}: {e}");
                    warnings.push(ScanWarning::ManifestInvalid {
                        path: file,
                        detail: e.to_string(),
                    });
                }
            }
        }
    }
}

fn push_parse_warnings(
    warnings: &mut Vec<ScanWarning>,
    path: &Path,
    diagnostics: &[vdf::VdfDiagnostic],
) {
    if diagnostics.is_empty() {
        return;
    }
    let detail = diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    warnings.push(ScanWarning::MalformedDocument {
        path: path.to_path_buf(),
        detail,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    const INDEX_PATH: &str = "/steam/steamapps/libraryfolders.vdf";

    /*
     * In-memory `FileAccessOperations` used to drive the scanner without a
     * real filesystem. Manifest listings are grouped per steamapps dir.
     */
    struct MockFileAccess {
        files: HashMap<PathBuf, String>,
        listings: HashMap<PathBuf, Vec<PathBuf>>,
    }

    impl MockFileAccess {
        fn new() -> Self {
            MockFileAccess {
                files: HashMap::new(),
                listings: HashMap::new(),
            }
        }

        fn add_manifest(&mut self, steamapps_dir: &str, file_name: &str, text: &str) {
            let dir = PathBuf::from(steamapps_dir);
            let path = dir.join(file_name);
            self.files.insert(path.clone(), text.to_string());
            self.listings.entry(dir).or_default().push(path);
        }

        fn set_index(&mut self, text: &str) {
            self.files
                .insert(PathBuf::from(INDEX_PATH), text.to_string());
        }
    }

    impl FileAccessOperations for MockFileAccess {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }

        fn list_manifest_files(&self, steamapps_dir: &Path) -> io::Result<Vec<PathBuf>> {
            Ok(self
                .listings
                .get(steamapps_dir)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn manifest(app_id: &str, name: &str) -> String {
        format!(
            r#""AppState" {{ "appid" "{app_id}" "name" "{name}" "installdir" "{name}" }}"#
        )
    }

    fn two_root_index() -> &'static str {
        r#"
"libraryfolders"
{
  "0" { "path" "/steam" }
  "1" { "path" "/mnt/games" }
}
"#
    }

    fn scan(mock: MockFileAccess) -> ScanOutcome {
        CoreLibraryScanner::new(Arc::new(mock))
            .scan(Path::new(INDEX_PATH))
            .expect("scan should succeed")
    }

    #[test]
    fn test_scan_aggregates_records_across_roots() {
        let mut mock = MockFileAccess::new();
        mock.set_index(two_root_index());
        mock.add_manifest("/steam/steamapps", "appmanifest_220.acf", &manifest("220", "Half-Life 2"));
        mock.add_manifest(
            "/mnt/games/steamapps",
            "appmanifest_730.acf",
            &manifest("730", "CounterStrike2"),
        );

        let outcome = scan(mock);
        assert!(outcome.warnings.is_empty(), "warnings: {:?}", outcome.warnings);
        assert_eq!(outcome.roots.len(), 2);
        assert_eq!(outcome.inventory.len(), 2);
        assert_eq!(outcome.inventory[&220].name, "Half-Life 2");
        assert_eq!(outcome.inventory[&730].search_key(), "counter strike 2");
    }

    #[test]
    fn test_duplicate_app_id_is_last_root_wins() {
        let mut mock = MockFileAccess::new();
        mock.set_index(two_root_index());
        mock.add_manifest("/steam/steamapps", "appmanifest_220.acf", &manifest("220", "First Copy"));
        mock.add_manifest(
            "/mnt/games/steamapps",
            "appmanifest_220.acf",
            &manifest("220", "Second Copy"),
        );

        let outcome = scan(mock);
        assert_eq!(outcome.inventory.len(), 1);
        assert_eq!(outcome.inventory[&220].name, "Second Copy");
        assert_eq!(
            outcome.warnings,
            vec![ScanWarning::DuplicateApp {
                app_id: 220,
                kept_root: PathBuf::from("/mnt/games"),
                replaced_root: PathBuf::from("/steam"),
            }]
        );
    }

    #[test]
    fn test_corrupt_manifest_does_not_stop_scan() {
        let mut mock = MockFileAccess::new();
        mock.set_index(r#""libraryfolders" { "0" { "path" "/steam" } }"#);
        mock.add_manifest(
            "/steam/steamapps",
            "appmanifest_1.acf",
            r#""AppState" { "appid" "1" "name" "truncated
"#,
        );
        mock.add_manifest("/steam/steamapps", "appmanifest_220.acf", &manifest("220", "Half-Life 2"));

        let outcome = scan(mock);
        // The corrupt file yields a malformed-document warning plus an
        // invalid-record warning (its name was lost to the truncation), but
        // the sibling manifest is still discovered.
        assert_eq!(outcome.inventory.len(), 1);
        assert!(outcome.inventory.contains_key(&220));
        assert!(
            outcome
                .warnings
                .iter()
                .any(|w| matches!(w, ScanWarning::MalformedDocument { .. }))
        );
    }

    #[test]
    fn test_invalid_record_is_dropped_with_warning() {
        let mut mock = MockFileAccess::new();
        mock.set_index(r#""libraryfolders" { "0" { "path" "/steam" } }"#);
        mock.add_manifest(
            "/steam/steamapps",
            "appmanifest_5.acf",
            r#""AppState" { "appid" "5" }"#,
        );

        let outcome = scan(mock);
        assert!(outcome.inventory.is_empty());
        assert!(
            outcome
                .warnings
                .iter()
                .any(|w| matches!(w, ScanWarning::ManifestInvalid { .. }))
        );
    }

    #[test]
    fn test_unreadable_index_is_fatal() {
        let scanner = CoreLibraryScanner::new(Arc::new(MockFileAccess::new()));
        let result = scanner.scan(Path::new(INDEX_PATH));
        assert!(matches!(result, Err(ScanError::IndexRead { .. })));
    }

    #[test]
    fn test_unlistable_root_degrades_to_warning() {
        struct FailingListing(MockFileAccess);
        impl FileAccessOperations for FailingListing {
            fn read_to_string(&self, path: &Path) -> io::Result<String> {
                self.0.read_to_string(path)
            }
            fn list_manifest_files(&self, _dir: &Path) -> io::Result<Vec<PathBuf>> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            }
        }

        let mut mock = MockFileAccess::new();
        mock.set_index(r#""libraryfolders" { "0" { "path" "/steam" } }"#);
        let scanner = CoreLibraryScanner::new(Arc::new(FailingListing(mock)));
        let outcome = scanner
            .scan(Path::new(INDEX_PATH))
            .expect("scan should still succeed");
        assert!(outcome.inventory.is_empty());
        assert!(
            outcome
                .warnings
                .iter()
                .any(|w| matches!(w, ScanWarning::ManifestListing { .. }))
        );
    }

    #[test]
    fn test_core_file_access_lists_only_manifests_sorted() -> io::Result<()> {
        let dir = tempdir()?;
        let steamapps = dir.path().join("steamapps");
        fs::create_dir_all(&steamapps)?;
        fs::write(steamapps.join("appmanifest_730.acf"), "")?;
        fs::write(steamapps.join("appmanifest_220.acf"), "")?;
        fs::write(steamapps.join("libraryfolders.vdf"), "")?;
        fs::write(steamapps.join("notes.txt"), "")?;

        let files = CoreFileAccess::new().list_manifest_files(&steamapps)?;
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["appmanifest_220.acf", "appmanifest_730.acf"]);
        Ok(())
    }
}
