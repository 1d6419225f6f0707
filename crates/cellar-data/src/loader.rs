//! Loading pipeline: reads data files, validates names, builds the registry.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus the built-in data set shipped with the crate.

use crate::schema::DrinkData;
use cellar_core::barrel::{AgingRules, RulesError};
use cellar_core::registry::{Registry, RegistryBuilder, RegistryError};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Environment variable naming the data directory used by [`load_from_env`].
pub const DATA_DIR_ENV: &str = "CELLAR_DATA_DIR";

/// Base name of the drink definitions file.
pub const DRINKS_FILE: &str = "drinks";

/// Base name of the optional aging rules file.
pub const RULES_FILE: &str = "rules";

const BUILTIN_DRINKS: &str = include_str!("../data/drinks.ron");

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The definitions parsed but do not form a valid registry.
    #[error("invalid definitions in {file}: {source}")]
    Registry {
        file: PathBuf,
        #[source]
        source: RegistryError,
    },

    /// The rules file parsed but holds values the clock cannot use.
    #[error("invalid rules in {file}: {source}")]
    Rules {
        file: PathBuf,
        #[source]
        source: RulesError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at
/// `toml_key` from the top-level table. RON and JSON hold the list directly.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }

    let content = std::fs::read_to_string(path)?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .remove(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Registry assembly
// ===========================================================================

/// Everything a host needs to run barrels.
#[derive(Debug, Clone)]
pub struct CellarData {
    pub registry: Registry,
    pub rules: AgingRules,
}

/// Build a registry from parsed drinks. `source` names where they came from
/// in error messages.
pub fn build_registry(drinks: &[DrinkData], source: &Path) -> Result<Registry, DataLoadError> {
    let mut seen = HashSet::new();
    let mut builder = RegistryBuilder::new();

    for drink in drinks {
        if !seen.insert(drink.id.as_str()) {
            return Err(DataLoadError::DuplicateName {
                file: source.to_path_buf(),
                name: drink.id.clone(),
            });
        }
        builder.register_drink(drink.to_def());
    }

    builder.build().map_err(|source_err| DataLoadError::Registry {
        file: source.to_path_buf(),
        source: source_err,
    })
}

/// Read and validate an aging rules file.
pub fn load_rules(path: &Path) -> Result<AgingRules, DataLoadError> {
    let rules: AgingRules = deserialize_file(path)?;
    rules.validate().map_err(|source| DataLoadError::Rules {
        file: path.to_path_buf(),
        source,
    })?;
    Ok(rules)
}

/// Load `drinks.{ron,toml,json}` (required) and `rules.{ron,toml,json}`
/// (optional, defaults otherwise) from `dir`.
pub fn load_data_dir(dir: &Path) -> Result<CellarData, DataLoadError> {
    let drinks_path = require_data_file(dir, DRINKS_FILE)?;
    let drinks: Vec<DrinkData> = deserialize_list(&drinks_path, "drinks")?;
    let registry = build_registry(&drinks, &drinks_path)?;

    let rules = match find_data_file(dir, RULES_FILE)? {
        Some(path) => load_rules(&path)?,
        None => AgingRules::default(),
    };

    tracing::info!(
        target: "cellar::data",
        dir = %dir.display(),
        drinks = registry.len(),
        multiplier = rules.multiplier,
        age_unloaded = rules.age_unloaded,
        "loaded data directory"
    );

    Ok(CellarData { registry, rules })
}

/// The drink set shipped with the crate, with default rules.
pub fn load_builtin() -> Result<CellarData, DataLoadError> {
    let source = Path::new("<builtin>/drinks.ron");
    let drinks: Vec<DrinkData> =
        ron::from_str(BUILTIN_DRINKS).map_err(|e| parse_error(source, e))?;
    let registry = build_registry(&drinks, source)?;
    tracing::debug!(target: "cellar::data", drinks = registry.len(), "loaded builtin drinks");
    Ok(CellarData {
        registry,
        rules: AgingRules::default(),
    })
}

/// Load from the directory named by `CELLAR_DATA_DIR`, or the built-in set
/// when it is unset or fails to load.
pub fn load_from_env() -> Result<CellarData, DataLoadError> {
    match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) => {
            let dir = PathBuf::from(dir);
            load_data_dir(&dir).or_else(|err| {
                tracing::warn!(
                    target: "cellar::data",
                    dir = %dir.display(),
                    error = %err,
                    "data directory failed to load, using builtin drinks"
                );
                load_builtin()
            })
        }
        None => {
            tracing::info!(target: "cellar::data", "{DATA_DIR_ENV} not set, using builtin drinks");
            load_builtin()
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
