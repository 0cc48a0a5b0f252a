// ── Bridge credential storage ──
//
// One credential per installation: the bridge address and the application
// key it issued. Both backends store the same JSON document, with the two
// values base64-encoded:
//
//   { "bridge_ip": "...", "bridge_username": "...",
//     "created_at": "<RFC 3339>", "version": "2.0" }
//
// Documents without `created_at` and `version` are the legacy format; they
// are accepted on load and rewritten in the current format.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{SecondsFormat, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use huectl_core::BridgeCredential;

use crate::ConfigError;

/// Current document format version.
pub const FORMAT_VERSION: &str = "2.0";

const KEYRING_SERVICE: &str = "huectl";
const KEYRING_ACCOUNT: &str = "bridge";

/// Persistent home of the bridge credential.
pub trait CredentialStore: Send + Sync {
    /// Load the stored credential. `ConfigError::NotFound` when none exists.
    fn load(&self) -> Result<BridgeCredential, ConfigError> {
        self.load_record().map(|r| r.credential)
    }

    /// Load the credential together with its metadata.
    fn load_record(&self) -> Result<CredentialRecord, ConfigError>;

    /// Store `credential`, replacing any existing one.
    fn save(&self, credential: &BridgeCredential) -> Result<(), ConfigError>;

    /// Remove the stored credential. Returns whether one existed.
    fn clear(&self) -> Result<bool, ConfigError>;

    /// Human-readable location, for messages.
    fn location(&self) -> String;
}

/// A loaded credential and the metadata stored with it.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub credential: BridgeCredential,
    pub created_at: Option<String>,
    pub version: Option<String>,
    /// Loaded from the legacy format (and rewritten if possible).
    pub migrated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    bridge_ip: String,
    bridge_username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

impl Document {
    fn new(credential: &BridgeCredential) -> Self {
        Self {
            bridge_ip: STANDARD.encode(credential.address().to_string()),
            bridge_username: STANDARD.encode(credential.token().expose_secret()),
            created_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            version: Some(FORMAT_VERSION.into()),
        }
    }

    fn is_legacy(&self) -> bool {
        self.created_at.is_none() && self.version.is_none()
    }

    fn into_record(self, location: &str) -> Result<CredentialRecord, ConfigError> {
        let address = decode_field(&self.bridge_ip, "bridge_ip", location)?;
        let token = decode_field(&self.bridge_username, "bridge_username", location)?;
        let migrated = self.is_legacy();
        Ok(CredentialRecord {
            credential: BridgeCredential::parse(&address, &token)?,
            created_at: self.created_at,
            version: self.version,
            migrated,
        })
    }
}

fn decode_field(value: &str, field: &str, location: &str) -> Result<String, ConfigError> {
    let corrupt = |reason: String| ConfigError::Corrupt {
        location: location.to_owned(),
        reason,
    };
    let bytes = STANDARD
        .decode(value.trim())
        .map_err(|e| corrupt(format!("{field} is not base64: {e}")))?;
    String::from_utf8(bytes).map_err(|_| corrupt(format!("{field} is not UTF-8")))
}

fn encode(credential: &BridgeCredential) -> Result<String, ConfigError> {
    Ok(serde_json::to_string_pretty(&Document::new(credential))?)
}

fn decode(text: &str, location: &str) -> Result<CredentialRecord, ConfigError> {
    let doc: Document = serde_json::from_str(text).map_err(|e| ConfigError::Corrupt {
        location: location.to_owned(),
        reason: e.to_string(),
    })?;
    doc.into_record(location)
}

// ── File backend ────────────────────────────────────────────────────

/// Credential stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load_record(&self) -> Result<CredentialRecord, ConfigError> {
        let location = self.location();
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound { location });
            }
            Err(e) => return Err(e.into()),
        };

        let record = decode(&text, &location)?;
        if record.migrated {
            info!(path = %location, "migrating legacy credentials file");
            if let Err(e) = self.save(&record.credential) {
                warn!(path = %location, error = %e, "could not rewrite legacy credentials");
            }
        }
        Ok(record)
    }

    /// Writes a private temp file next to the target and renames it over.
    fn save(&self, credential: &BridgeCredential) -> Result<(), ConfigError> {
        let document = encode(credential)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // NamedTempFile is created with mode 0600 on unix.
        let mut file = tempfile::Builder::new()
            .prefix(".credentials")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        file.write_all(document.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }

    fn clear(&self) -> Result<bool, ConfigError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

// ── Keyring backend ─────────────────────────────────────────────────

/// Credential stored in the platform keyring.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
    account: String,
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, ConfigError> {
        Ok(keyring::Entry::new(&self.service, &self.account)?)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE, KEYRING_ACCOUNT)
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load_record(&self) -> Result<CredentialRecord, ConfigError> {
        let location = self.location();
        let text = match self.entry()?.get_password() {
            Ok(text) => text,
            Err(keyring::Error::NoEntry) => return Err(ConfigError::NotFound { location }),
            Err(e) => return Err(e.into()),
        };

        let record = decode(&text, &location)?;
        if record.migrated {
            if let Err(e) = self.save(&record.credential) {
                warn!(error = %e, "could not rewrite legacy keyring entry");
            }
        }
        Ok(record)
    }

    fn save(&self, credential: &BridgeCredential) -> Result<(), ConfigError> {
        self.entry()?.set_password(&encode(credential)?)?;
        debug!(service = %self.service, "credentials saved to keyring");
        Ok(())
    }

    fn clear(&self) -> Result<bool, ConfigError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        format!("keyring {}/{}", self.service, self.account)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const TOKEN: &str = "Zb3xk1-9PqLmN0aTfY7cVw2HdEoR5sUi";

    fn credential() -> BridgeCredential {
        BridgeCredential::parse("192.168.1.20", TOKEN).unwrap()
    }

    fn store() -> (tempfile::TempDir, FileCredentialStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("creds/hue_credentials.json"));
        (dir, store)
    }

    #[test]
    fn save_writes_current_format() {
        let (_dir, store) = store();
        store.save(&credential()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["bridge_ip"], STANDARD.encode("192.168.1.20"));
        assert_eq!(raw["bridge_username"], STANDARD.encode(TOKEN));
        assert_eq!(raw["version"], FORMAT_VERSION);
        assert!(raw["created_at"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn load_returns_saved_credential() {
        let (_dir, store) = store();
        store.save(&credential()).unwrap();

        let record = store.load_record().unwrap();
        assert_eq!(record.credential, credential());
        assert!(!record.migrated);
        assert_eq!(record.version.as_deref(), Some(FORMAT_VERSION));
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(store.load(), Err(ConfigError::NotFound { .. })));
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn legacy_file_is_migrated() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        let legacy = serde_json::json!({
            "bridge_ip": STANDARD.encode("192.168.1.20"),
            "bridge_username": STANDARD.encode(TOKEN),
        });
        fs::write(store.path(), legacy.to_string()).unwrap();

        let record = store.load_record().unwrap();
        assert!(record.migrated);
        assert_eq!(record.credential, credential());

        let rewritten = store.load_record().unwrap();
        assert!(!rewritten.migrated);
        assert_eq!(rewritten.version.as_deref(), Some(FORMAT_VERSION));
    }

    #[test]
    fn garbage_is_corrupt() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{"bridge_ip": "%%%", "bridge_username": "x"}"#).unwrap();
        assert!(matches!(store.load(), Err(ConfigError::Corrupt { .. })));

        fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(ConfigError::Corrupt { .. })));
    }

    #[test]
    fn public_address_is_rejected_on_load() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        let doc = serde_json::json!({
            "bridge_ip": STANDARD.encode("8.8.8.8"),
            "bridge_username": STANDARD.encode(TOKEN),
            "created_at": "2025-01-01T00:00:00Z",
            "version": "2.0",
        });
        fs::write(store.path(), doc.to_string()).unwrap();
        assert!(matches!(store.load(), Err(ConfigError::InvalidCredential(_))));
    }

    #[test]
    fn save_replaces_file_without_leftovers() {
        let (_dir, store) = store();
        let parent = store.path().parent().unwrap().to_owned();
        fs::create_dir_all(&parent).unwrap();
        fs::write(store.path(), "stale").unwrap();

        store.save(&credential()).unwrap();

        assert_eq!(store.load().unwrap().address().to_string(), "192.168.1.20");
        let names: Vec<String> = fs::read_dir(&parent)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["hue_credentials.json".to_owned()]);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "stale").unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&credential()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn clear_removes_file() {
        let (_dir, store) = store();
        store.save(&credential()).unwrap();
        assert!(store.clear().unwrap());
        assert!(!store.path().exists());
    }
}
