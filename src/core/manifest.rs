/*
 * This module extracts one `ItemRecord` from the parsed form of an
 * `appmanifest_<id>.acf` document. The app id and name are required; a
 * record missing either is invalid and is rejected outright, because an
 * inventory entry with a wrong identifier or title is worse than no entry.
 * The numeric fields are individually optional and degrade to zero with a
 * warning when absent or garbled — an approximate size is still useful.
 */
use super::models::{ItemRecord, ScanWarning};
use super::vdf::VdfBlock;
use std::fmt;
use std::str::FromStr;

const APP_STATE_KEY: &str = "AppState";

#[derive(Debug, Clone, PartialEq)]
pub enum ManifestError {
    MissingAppState,
    MissingField(&'static str),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::MissingAppState => {
                write!(f, "manifest has no '{APP_STATE_KEY}' block")
            }
            ManifestError::MissingField(field) => {
                write!(f, "manifest is missing required field \"{field}\"")
            }
        }
    }
}

impl std::error::Error for ManifestError {}

pub type Result<T> = std::result::Result<T, ManifestError>;

/*
 * Parses a numeric scalar field, defaulting to zero with a warning when the
 * field is present but not numeric. Absent fields default silently; only
 * actively garbled values are worth surfacing.
 */
fn numeric_field<T>(
    state: &VdfBlock,
    field: &'static str,
    warnings: &mut Vec<ScanWarning>,
) -> T
where
    T: FromStr + Default,
{
    match state.get_scalar(field) {
        None => T::default(),
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            log::warn!("ManifestReader: Field \"{field}\" holds non-numeric \"{raw}\"; using 0.");
            warnings.push(ScanWarning::NumericFieldDefaulted {
                field,
                value: raw.to_string(),
            });
            T::default()
        }),
    }
}

/*
 * Reads one manifest document into an `ItemRecord`. Returns the record plus
 * any numeric-field warnings, or a `ManifestError` when the document has no
 * `AppState` block or lacks `appid`/`name`.
 */
pub fn read_manifest(document: &VdfBlock) -> Result<(ItemRecord, Vec<ScanWarning>)> {
    let state = document
        .get_block(APP_STATE_KEY)
        .ok_or(ManifestError::MissingAppState)?;

    if state.get_scalar("appid").is_none() {
        return Err(ManifestError::MissingField("appid"));
    }
    let name = state
        .get_scalar("name")
        .ok_or(ManifestError::MissingField("name"))?
        .to_string();

    let mut warnings = Vec::new();
    let record = ItemRecord {
        app_id: numeric_field(state, "appid", &mut warnings),
        name,
        install_dir: state.get_scalar("installdir").unwrap_or_default().to_string(),
        size_on_disk: numeric_field(state, "SizeOnDisk", &mut warnings),
        last_updated: numeric_field(state, "LastUpdated", &mut warnings),
        state_flags: numeric_field(state, "StateFlags", &mut warnings),
    };
    log::trace!(
        "ManifestReader: Read app {} (\"{}\").",
        record.app_id,
        record.name
    );
    Ok((record, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vdf;

    const FULL_MANIFEST: &str = r#"
"AppState"
{
  "appid"   "220"
  "Universe"    "1"
  "name"    "Half-Life 2"
  "StateFlags"    "4"
  "installdir"    "Half-Life 2"
  "LastUpdated"   "1609459200"
  "SizeOnDisk"    "6144000000"
}
"#;

    fn read(text: &str) -> Result<(ItemRecord, Vec<ScanWarning>)> {
        read_manifest(&vdf::parse(text).root)
    }

    #[test]
    fn test_full_manifest_yields_complete_record() {
        let (record, warnings) = read(FULL_MANIFEST).expect("manifest should be valid");
        assert!(warnings.is_empty());
        assert_eq!(
            record,
            ItemRecord {
                app_id: 220,
                name: "Half-Life 2".to_string(),
                install_dir: "Half-Life 2".to_string(),
                size_on_disk: 6_144_000_000,
                last_updated: 1_609_459_200,
                state_flags: 4,
            }
        );
    }

    #[test]
    fn test_omitted_numeric_fields_default_to_zero() {
        let (record, warnings) = read(
            r#""AppState" { "appid" "220" "name" "Half-Life 2" "installdir" "Half-Life 2" }"#,
        )
        .expect("manifest should be valid");
        assert!(warnings.is_empty());
        assert_eq!(record.size_on_disk, 0);
        assert_eq!(record.last_updated, 0);
        assert_eq!(record.state_flags, 0);
    }

    #[test]
    fn test_non_numeric_field_defaults_with_warning() {
        let (record, warnings) = read(
            r#""AppState" { "appid" "220" "name" "X" "SizeOnDisk" "about 6 GB" }"#,
        )
        .expect("record should still be produced");
        assert_eq!(record.size_on_disk, 0);
        assert_eq!(
            warnings,
            vec![ScanWarning::NumericFieldDefaulted {
                field: "SizeOnDisk",
                value: "about 6 GB".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_appid_invalidates_record() {
        let result = read(r#""AppState" { "name" "Nameless" }"#);
        assert_eq!(result, Err(ManifestError::MissingField("appid")));
    }

    #[test]
    fn test_missing_name_invalidates_record() {
        let result = read(r#""AppState" { "appid" "220" }"#);
        assert_eq!(result, Err(ManifestError::MissingField("name")));
    }

    #[test]
    fn test_missing_app_state_block() {
        let result = read(r#""SomethingElse" { "appid" "220" }"#);
        assert_eq!(result, Err(ManifestError::MissingAppState));
    }
}
