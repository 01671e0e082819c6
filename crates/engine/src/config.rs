//! Database configuration via `sieve.toml`
//!
//! Every database directory carries a `sieve.toml` written at creation. It
//! records what the directory holds (schema, identity) and the parameters
//! every stored fingerprint was built with. Fingerprint parameters are fixed
//! for the life of the database; durability may be edited between opens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sieve_core::{Error, Result, SchemaKind};
use sieve_fingerprint::FingerprintParams;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

/// Config file name placed in the database directory.
pub const CONFIG_FILE_NAME: &str = "sieve.toml";

/// When inserted records reach stable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Records are written on insert and synced on flush, close or drop
    #[default]
    Standard,
    /// Every insert is synced before it returns
    Always,
}

impl DurabilityMode {
    /// Parse `"standard"` or `"always"`.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(DurabilityMode::Standard),
            "always" => Ok(DurabilityMode::Always),
            other => Err(Error::InvalidOperation(format!(
                "Invalid durability mode '{}'. Expected \"standard\" or \"always\".",
                other
            ))),
        }
    }

    /// Name as written to `sieve.toml`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DurabilityMode::Standard => "standard",
            DurabilityMode::Always => "always",
        }
    }
}

fn default_durability_str() -> String {
    "standard".to_string()
}

/// Database configuration loaded from `sieve.toml`.
///
/// # Example
///
/// ```toml
/// schema = "molecule"
/// uuid = "1b4e28ba-2fa1-11d2-883f-0016d3cca427"
/// created_at = "2026-01-01T00:00:00Z"
/// durability = "standard"
///
/// [fingerprint]
/// sub_bits = 2048
/// sim_bits = 2048
/// similarity_mode = "sim"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Object class every record of this database has
    pub schema: SchemaKind,
    /// Database identity, also stamped into the record log header
    pub uuid: Uuid,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Durability mode: `"standard"` or `"always"`.
    #[serde(default = "default_durability_str")]
    pub durability: String,
    /// Parameters of every stored fingerprint
    #[serde(default)]
    pub fingerprint: FingerprintParams,
}

impl StoreConfig {
    /// Fresh configuration for a new database.
    pub fn new(schema: SchemaKind, options: &DatabaseOptions) -> Self {
        StoreConfig {
            schema,
            uuid: Uuid::new_v4(),
            created_at: Utc::now(),
            durability: options.durability.as_str().to_string(),
            fingerprint: options.fingerprint.clone(),
        }
    }

    /// Parse the durability string into a `DurabilityMode`.
    pub fn durability_mode(&self) -> Result<DurabilityMode> {
        DurabilityMode::parse(&self.durability)
    }

    /// Config file content: a comment header followed by the settings.
    pub fn to_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self)
            .map_err(|e| Error::SerializationError(format!("Failed to serialize config: {}", e)))?;
        Ok(format!(
            r#"# SieveDB database configuration
#
# schema, uuid, created_at and [fingerprint] describe the stored records
# and must not be edited.
#
# Durability mode: "standard" (default) or "always"
#   "standard" = records are synced on flush, close and drop
#   "always"   = every insert is synced before it returns
{}"#,
            body
        ))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// durability or fingerprint settings are invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::StorageError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            Error::Corruption(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.durability_mode()?;
        config.fingerprint.validate()?;
        Ok(config)
    }

    /// Serialize this config to TOML and write it to the given path.
    ///
    /// The file is written beside `path` and renamed into place, so `path`
    /// either holds a complete config or does not exist.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;
        let staging = path.with_extension("toml.tmp");
        let written = File::create(&staging)
            .and_then(|mut file| {
                file.write_all(contents.as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| std::fs::rename(&staging, path));
        written.map_err(|e| {
            let _ = std::fs::remove_file(&staging);
            Error::StorageError(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// Options accepted when creating a database.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatabaseOptions {
    /// Durability mode
    pub durability: DurabilityMode,
    /// Fingerprint parameters for stored records
    pub fingerprint: FingerprintParams,
}

impl DatabaseOptions {
    /// Parse a `key:value;key:value` option string over the defaults.
    pub fn parse(options: &str) -> Result<Self> {
        Self::default().merged(options)
    }

    /// Apply a `key:value;key:value` option string on top of `self`.
    ///
    /// Keys: `durability`, `similarity-type`, `fp-sub-bits`, `fp-sim-bits`,
    /// `fp-path-length`, `fp-subgraph-edges`, `fp-labeled-edges`,
    /// `fp-max-subgraphs`, `fp-chem-radius`. Empty entries are skipped;
    /// unknown keys and malformed entries fail.
    pub fn merged(mut self, options: &str) -> Result<Self> {
        for entry in options.split(';') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (key, value) = entry.split_once(':').ok_or_else(|| {
                Error::InvalidOperation(format!("option '{}' is not key:value", entry))
            })?;
            let key = key.trim();
            let value = value.trim();
            if key.eq_ignore_ascii_case("durability") {
                self.durability = DurabilityMode::parse(value)?;
            } else {
                self.fingerprint.set_option(key, value)?;
            }
        }
        Ok(self)
    }

    /// Options with the given fingerprint parameters and default durability.
    pub fn with_fingerprint(fingerprint: FingerprintParams) -> Self {
        DatabaseOptions {
            fingerprint,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_core::ObjectClass;
    use sieve_fingerprint::SimilarityMode;
    use tempfile::TempDir;

    #[test]
    fn default_options_are_standard() {
        let options = DatabaseOptions::parse("").unwrap();
        assert_eq!(options.durability, DurabilityMode::Standard);
        assert_eq!(options.fingerprint, FingerprintParams::default());
    }

    #[test]
    fn parse_option_string() {
        let options =
            DatabaseOptions::parse("durability:always; similarity-type:ecfp4;fp-sim-bits:1024;")
                .unwrap();
        assert_eq!(options.durability, DurabilityMode::Always);
        assert_eq!(options.fingerprint.similarity_mode, SimilarityMode::Ecfp4);
        assert_eq!(options.fingerprint.sim_bits, 1024);
    }

    #[test]
    fn unknown_or_malformed_options_fail() {
        assert!(DatabaseOptions::parse("colour:blue").is_err());
        assert!(DatabaseOptions::parse("durability").is_err());
        assert!(DatabaseOptions::parse("durability:turbo").is_err());
        assert!(DatabaseOptions::parse("fp-sub-bits:1000").is_err());
    }

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let options = DatabaseOptions::parse("durability:always;similarity-type:chem").unwrap();
        let config = StoreConfig::new(ObjectClass::Reaction, &options);
        config.write_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# SieveDB database configuration"));
        assert!(!path.with_extension("toml.tmp").exists());

        let loaded = StoreConfig::from_file(&path).unwrap();
        assert_eq!(loaded.schema, ObjectClass::Reaction);
        assert_eq!(loaded.uuid, config.uuid);
        assert_eq!(loaded.durability_mode().unwrap(), DurabilityMode::Always);
        assert_eq!(loaded.fingerprint.similarity_mode, SimilarityMode::Chem);
    }

    #[test]
    fn invalid_durability_in_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = StoreConfig::new(ObjectClass::Molecule, &DatabaseOptions::default());
        let content = config.to_toml().unwrap().replace("\"standard\"", "\"turbo\"");
        std::fs::write(&path, content).unwrap();
        assert!(StoreConfig::from_file(&path).is_err());
    }

    #[test]
    fn missing_fingerprint_section_uses_defaults() {
        let content = r#"
schema = "molecule"
uuid = "1b4e28ba-2fa1-11d2-883f-0016d3cca427"
created_at = "2026-01-01T00:00:00Z"
"#;
        let config: StoreConfig = toml::from_str(content).unwrap();
        assert_eq!(config.durability, "standard");
        assert_eq!(config.fingerprint, FingerprintParams::default());
    }
}
