use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::fs::{ensure_parent, replace_file};
use crate::paths::credentials_path_for;

/// Keyring service name. Changing it orphans stored tokens.
const SERVICE: &str = "factify";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKey {
    AccessToken,
}

impl SecretKey {
    fn user(self) -> &'static str {
        match self {
            SecretKey::AccessToken => "access_token",
        }
    }
}

/// Where credentials live between runs.
pub trait SecretStore: Send + Sync {
    /// `Ok(None)` when nothing is stored yet.
    fn get(&self, key: SecretKey) -> anyhow::Result<Option<String>>;

    fn set(&self, key: SecretKey, value: &str) -> anyhow::Result<()>;

    /// Deleting a missing secret is not an error.
    fn delete(&self, key: SecretKey) -> anyhow::Result<()>;
}

/// The platform credential store (Keychain, Credential Manager, kernel
/// keyutils).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringStore;

impl KeyringStore {
    fn entry(key: SecretKey) -> anyhow::Result<keyring::Entry> {
        keyring::Entry::new(SERVICE, key.user())
            .with_context(|| format!("open keyring entry {SERVICE}/{}", key.user()))
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, key: SecretKey) -> anyhow::Result<Option<String>> {
        match Self::entry(key)?.get_password() {
            Ok(v) => Ok(Some(v)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)).with_context(|| format!("read {}", key.user())),
        }
    }

    fn set(&self, key: SecretKey, value: &str) -> anyhow::Result<()> {
        Self::entry(key)?
            .set_password(value)
            .with_context(|| format!("store {}", key.user()))
    }

    fn delete(&self, key: SecretKey) -> anyhow::Result<()> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)).with_context(|| format!("delete {}", key.user())),
        }
    }
}

/// JSON map in a file only the owner can read.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> anyhow::Result<BTreeMap<String, String>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("failed to parse {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(anyhow::Error::new(e))
                .with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    fn save(&self, secrets: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if secrets.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(anyhow::Error::new(e))
                    .with_context(|| format!("failed to remove {}", self.path.display())),
            };
        }

        ensure_parent(&self.path)?;
        let bytes = serde_json::to_vec_pretty(secrets)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)
            .with_context(|| format!("failed to write temp: {}", tmp.display()))?;
        restrict_to_owner(&tmp)?;
        replace_file(&tmp, &self.path)
    }
}

impl SecretStore for FileStore {
    fn get(&self, key: SecretKey) -> anyhow::Result<Option<String>> {
        Ok(self.load()?.remove(key.user()))
    }

    fn set(&self, key: SecretKey, value: &str) -> anyhow::Result<()> {
        let mut secrets = self.load()?;
        secrets.insert(key.user().to_string(), value.to_string());
        self.save(&secrets)
    }

    fn delete(&self, key: SecretKey) -> anyhow::Result<()> {
        let mut secrets = self.load()?;
        if secrets.remove(key.user()).is_some() {
            self.save(&secrets)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to restrict {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}

/// OS keyring first. The file takes over whenever the keyring errors, so a
/// host without a reachable secret service can still sign in.
pub struct LayeredStore {
    primary: Box<dyn SecretStore>,
    fallback: FileStore,
}

impl LayeredStore {
    pub fn new(primary: impl SecretStore + 'static, fallback: FileStore) -> Self {
        Self {
            primary: Box::new(primary),
            fallback,
        }
    }
}

impl SecretStore for LayeredStore {
    fn get(&self, key: SecretKey) -> anyhow::Result<Option<String>> {
        match self.primary.get(key) {
            Ok(Some(v)) => Ok(Some(v)),
            Ok(None) => self.fallback.get(key),
            Err(e) => {
                log::warn!("OS keyring unavailable, reading {}: {e:#}", self.fallback.path().display());
                self.fallback.get(key)
            }
        }
    }

    fn set(&self, key: SecretKey, value: &str) -> anyhow::Result<()> {
        match self.primary.set(key, value) {
            Ok(()) => {
                // Drop any copy an earlier fallback left behind.
                if let Err(e) = self.fallback.delete(key) {
                    log::warn!("failed to clear {}: {e:#}", self.fallback.path().display());
                }
                Ok(())
            }
            Err(e) => {
                log::warn!(
                    "OS keyring unavailable, storing {} in {}: {e:#}",
                    key.user(),
                    self.fallback.path().display()
                );
                self.fallback.set(key, value)
            }
        }
    }

    fn delete(&self, key: SecretKey) -> anyhow::Result<()> {
        if let Err(e) = self.primary.delete(key) {
            log::warn!("failed to delete {} from the OS keyring: {e:#}", key.user());
        }
        self.fallback.delete(key)
    }
}

/// The store used by the CLI. Platforms without a native keyring backend
/// keep credentials in the file next to `config_path`.
pub fn secret_store_for(config_path: &Path) -> Arc<dyn SecretStore> {
    let file = FileStore::at_path(credentials_path_for(config_path));
    if cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows")) {
        Arc::new(LayeredStore::new(KeyringStore, file))
    } else {
        Arc::new(file)
    }
}
