/*
 * This module consolidates the core, platform-agnostic logic of the
 * application: VDF parsing, library discovery (index reading, manifest
 * reading, inventory aggregation), search-term normalization, and DXVK
 * profile management. It re-exports the key data structures and the
 * operation traits (`FileAccessOperations`, `ProfileManagerOperations`)
 * used for dependency injection.
 */
pub mod library_index;
pub mod manifest;
pub mod models;
pub mod path_utils;
pub mod profiles;
pub mod scanner;
pub mod search_terms;
pub mod vdf;

// Re-export key structures and enums
pub use models::{Inventory, ItemRecord, LibraryRoot, ScanWarning};

// Re-export parser related items
pub use vdf::{ParseOutcome, VdfBlock, VdfDiagnostic, VdfValue};

// Re-export reader related items
pub use library_index::read_index;
pub use manifest::{ManifestError, read_manifest};

// Re-export scanner related items
pub use scanner::{
    CoreFileAccess, CoreLibraryScanner, FileAccessOperations, ScanError, ScanOutcome,
};

// Re-export search and profile related items
pub use profiles::{CoreProfileManager, DxvkProfile, ProfileError, ProfileManagerOperations};
pub use search_terms::normalize_title;
