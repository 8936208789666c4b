mod core;

use crate::core::{CoreFileAccess, CoreLibraryScanner, CoreProfileManager, ItemRecord};
use crate::core::{ProfileManagerOperations, ScanOutcome};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const APP_NAME: &str = "DxvkManager";

/*
 * Candidate locations of the root library index, checked in order when no
 * path is given on the command line. Steam keeps `libraryfolders.vdf` in
 * the steamapps directory of its own install.
 */
fn default_index_locations() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if cfg!(target_os = "windows") {
        candidates.push(PathBuf::from(
            r"C:\Program Files (x86)\Steam\steamapps\libraryfolders.vdf",
        ));
    }
    if let Some(base_dirs) = directories::BaseDirs::new() {
        let home = base_dirs.home_dir();
        candidates.push(home.join(".steam/steam/steamapps/libraryfolders.vdf"));
        candidates.push(home.join(".local/share/Steam/steamapps/libraryfolders.vdf"));
    }
    candidates
}

fn resolve_index_path() -> Option<PathBuf> {
    if let Some(arg) = std::env::args().nth(1) {
        return Some(PathBuf::from(arg));
    }
    default_index_locations().into_iter().find(|p| p.exists())
}

fn format_last_updated(record: &ItemRecord) -> String {
    if record.last_updated == 0 {
        return "-".to_string();
    }
    OffsetDateTime::from_unix_timestamp(record.last_updated)
        .ok()
        .and_then(|ts| ts.format(&Rfc3339).ok())
        .unwrap_or_else(|| record.last_updated.to_string())
}

fn print_outcome(outcome: &ScanOutcome) {
    let mut records: Vec<&ItemRecord> = outcome.inventory.values().collect();
    records.sort_by(|a, b| a.name.cmp(&b.name));

    println!(
        "Found {} installed game(s) across {} library root(s):",
        records.len(),
        outcome.roots.len()
    );
    for record in records {
        println!(
            "  {:>8}  {:<40}  [{}]  {:>6} MiB  updated {}",
            record.app_id,
            record.name,
            record.search_key(),
            record.size_on_disk / (1024 * 1024),
            format_last_updated(record),
        );
    }

    if !outcome.warnings.is_empty() {
        println!("\n{} warning(s):", outcome.warnings.len());
        for warning in &outcome.warnings {
            println!("  - {warning}");
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialize logger: {e}");
    }

    let Some(index_path) = resolve_index_path() else {
        log::error!("Main: No library index found; pass the path to libraryfolders.vdf.");
        return ExitCode::FAILURE;
    };

    let scanner = CoreLibraryScanner::new(Arc::new(CoreFileAccess::new()));
    let outcome = match scanner.scan(&index_path) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Main: Scan failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    print_outcome(&outcome);

    match CoreProfileManager::for_app(APP_NAME) {
        Some(manager) => match manager.all_profiles() {
            Ok(profiles) => println!("\n{} DXVK profile(s) available.", profiles.len()),
            Err(e) => log::warn!("Main: Could not load profiles: {e}"),
        },
        None => log::warn!("Main: Could not determine profile storage directory."),
    }

    ExitCode::SUCCESS
}
