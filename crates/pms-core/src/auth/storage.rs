//! Durable storage for the session's token pair.
//!
//! The pair is persisted as one serialized record under a single fixed key.
//! A missing record means the next start begins as a guest.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use keyring::Entry;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tokens::TokenPair;

/// Key the token record is stored under, in every backend.
pub const STORAGE_KEY: &str = "authTokens";

/// Keychain service name
const KEYRING_SERVICE: &str = "pms-client";

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

pub trait TokenStore: Send + Sync {
    /// Read the persisted pair, `None` if nothing has been stored
    fn load(&self) -> Result<Option<TokenPair>>;

    fn save(&self, tokens: &TokenPair) -> Result<()>;

    /// Remove the persisted pair. Succeeds when there is nothing to remove.
    fn clear(&self) -> Result<()>;
}

/// Which backend holds the token record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Encrypted,
    Keyring,
    Memory,
}

impl std::str::FromStr for TokenStorage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(TokenStorage::File),
            "encrypted" => Ok(TokenStorage::Encrypted),
            "keyring" => Ok(TokenStorage::Keyring),
            "memory" => Ok(TokenStorage::Memory),
            other => bail!("Unknown token storage backend: {}", other),
        }
    }
}

impl TokenStorage {
    /// Open the configured backend
    pub fn open(&self, cache_dir: &Path, passphrase: Option<&str>) -> Result<Arc<dyn TokenStore>> {
        debug!(backend = ?self, ?cache_dir, "Opening token store");
        let store: Arc<dyn TokenStore> = match self {
            TokenStorage::File => Arc::new(FileTokenStore::new(cache_dir)),
            TokenStorage::Encrypted => {
                let passphrase = passphrase
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| anyhow!("Encrypted token storage needs a passphrase (PMS_PASSPHRASE)"))?;
                Arc::new(EncryptedFileTokenStore::new(cache_dir, passphrase))
            }
            TokenStorage::Keyring => Arc::new(KeyringTokenStore::new()),
            TokenStorage::Memory => Arc::new(MemoryTokenStore::new()),
        };
        Ok(store)
    }
}

// ============================================================================
// Plain file
// ============================================================================

/// JSON record at `<cache_dir>/authTokens.json`.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(format!("{}.json", STORAGE_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path).context("Failed to read token file")?;
        let tokens = serde_json::from_str(&contents).context("Failed to parse token file")?;
        Ok(Some(tokens))
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        let contents = serde_json::to_string_pretty(tokens)?;
        write_private(&self.path, contents.as_bytes())
    }

    fn clear(&self) -> Result<()> {
        remove_if_exists(&self.path)
    }
}

// ============================================================================
// Encrypted file
// ============================================================================

/// Token record encrypted at rest with ChaCha20-Poly1305.
///
/// The key is derived from a passphrase with Argon2. A fresh salt and nonce
/// are drawn on every save; the file is `salt | nonce | ciphertext`.
pub struct EncryptedFileTokenStore {
    path: PathBuf,
    passphrase: String,
}

impl EncryptedFileTokenStore {
    pub fn new(cache_dir: &Path, passphrase: &str) -> Self {
        Self {
            path: cache_dir.join(format!("{}.enc", STORAGE_KEY)),
            passphrase: passphrase.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cipher(&self, salt: &[u8]) -> Result<ChaCha20Poly1305> {
        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(self.passphrase.as_bytes(), salt, &mut key)
            .map_err(|e| anyhow!("Failed to derive token key: {}", e))?;
        Ok(ChaCha20Poly1305::new(Key::from_slice(&key)))
    }
}

impl TokenStore for EncryptedFileTokenStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read(&self.path).context("Failed to read encrypted token file")?;
        if contents.len() <= SALT_LEN + NONCE_LEN {
            bail!("Encrypted token file is truncated");
        }

        let (salt, rest) = contents.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
        let plaintext = self
            .cipher(salt)?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow!("Failed to decrypt token file (wrong passphrase?)"))?;

        let tokens = serde_json::from_slice(&plaintext).context("Failed to parse decrypted token record")?;
        Ok(Some(tokens))
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        let mut rng = rand::thread_rng();
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce);

        let plaintext = serde_json::to_vec(tokens)?;
        let ciphertext = self
            .cipher(&salt)?
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| anyhow!("Failed to encrypt token record"))?;

        let mut contents = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        contents.extend_from_slice(&salt);
        contents.extend_from_slice(&nonce);
        contents.extend_from_slice(&ciphertext);
        write_private(&self.path, &contents)
    }

    fn clear(&self) -> Result<()> {
        remove_if_exists(&self.path)
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// JSON record kept in the OS keychain.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, STORAGE_KEY).context("Failed to create keyring entry")
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        match self.entry()?.get_password() {
            Ok(record) => {
                let tokens = serde_json::from_str(&record).context("Failed to parse keychain token record")?;
                Ok(Some(tokens))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read tokens from keychain"),
        }
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        let record = serde_json::to_string(tokens)?;
        self.entry()?
            .set_password(&record)
            .context("Failed to store tokens in keychain")
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete tokens from keychain"),
        }
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Process-local store; nothing survives a restart unless the store itself is shared.
#[derive(Default)]
pub struct MemoryTokenStore {
    record: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            record: Mutex::new(Some(tokens)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<TokenPair>>> {
        self.record
            .lock()
            .map_err(|_| anyhow!("Token store lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        *self.lock()? = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Write a file readable only by the current user.
///
/// New files are created 0600; an existing file is narrowed to 0600 before
/// the new contents go in.
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
    }

    file.write_all(contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}
