use crate::error::{Result, VaultError};
use crate::storage::WalletRepository;
use crate::types::Wallet;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// In-memory wallet map mirrored to a single JSON array on disk.
///
/// Every mutation holds the write lock across both the map change and the
/// snapshot rewrite, so writers are serialised and the file never reflects a
/// half-applied change. Snapshots are written to a temporary file in the same
/// directory and renamed over the old one. A failed write rolls the in-memory
/// change back. There is no cross-process file locking.
pub struct JsonWalletStore {
    path: PathBuf,
    wallets: RwLock<HashMap<String, Wallet>>,
}

impl JsonWalletStore {
    /// Create an empty store bound to `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            wallets: RwLock::new(HashMap::new()),
        }
    }

    /// Construct and load in one step, creating the parent directory if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self::new(path);
        fs::create_dir_all(store.directory()).map_err(|e| {
            VaultError::storage(format!(
                "Failed to create directory {}: {}",
                store.directory().display(),
                e
            ))
        })?;
        store.load()?;
        Ok(store)
    }

    /// Replace the in-memory map with the snapshot on disk.
    ///
    /// A missing file yields an empty store; a malformed one is an error.
    pub fn load(&self) -> Result<usize> {
        let mut wallets = self.wallets.write();

        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                wallets.clear();
                tracing::debug!("No wallet snapshot at {}, starting empty", self.path.display());
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: Vec<Wallet> = serde_json::from_slice(&data).map_err(|e| {
            VaultError::storage(format!(
                "Corrupt wallet snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut loaded = HashMap::with_capacity(snapshot.len());
        for wallet in snapshot {
            if loaded.contains_key(&wallet.id) {
                return Err(VaultError::storage(format!(
                    "Corrupt wallet snapshot {}: duplicate wallet id {}",
                    self.path.display(),
                    wallet.id
                )));
            }
            loaded.insert(wallet.id.clone(), wallet);
        }

        *wallets = loaded;
        tracing::debug!(
            "Loaded {} wallets from {}",
            wallets.len(),
            self.path.display()
        );
        Ok(wallets.len())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Rewrite the whole snapshot. Callers hold the write lock.
    fn persist(&self, wallets: &HashMap<String, Wallet>) -> Result<()> {
        let mut snapshot: Vec<&Wallet> = wallets.values().collect();
        snapshot.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let data = serde_json::to_vec_pretty(&snapshot)?;

        let mut file = NamedTempFile::new_in(self.directory()).map_err(|e| {
            VaultError::storage(format!("Failed to create temporary snapshot: {}", e))
        })?;
        file.write_all(&data)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| {
            VaultError::storage(format!(
                "Failed to replace snapshot {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        tracing::debug!(
            "Persisted {} wallets to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl WalletRepository for JsonWalletStore {
    fn save(&self, wallet: &Wallet) -> Result<()> {
        let mut wallets = self.wallets.write();

        if wallets.contains_key(&wallet.id) {
            return Err(VaultError::WalletExists {
                id: wallet.id.clone(),
            });
        }

        wallets.insert(wallet.id.clone(), wallet.clone());
        if let Err(e) = self.persist(&wallets) {
            wallets.remove(&wallet.id);
            return Err(e);
        }
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Wallet> {
        let wallets = self.wallets.read();
        wallets
            .get(id)
            .cloned()
            .ok_or_else(|| VaultError::wallet_not_found(id))
    }

    fn find_by_address(&self, address: &str) -> Result<Wallet> {
        let wallets = self.wallets.read();
        wallets
            .values()
            .find(|w| w.address == address)
            .cloned()
            .ok_or_else(|| VaultError::AddressNotFound {
                address: address.to_string(),
            })
    }

    fn find_all(&self) -> Result<Vec<Wallet>> {
        let wallets = self.wallets.read();
        let mut all: Vec<Wallet> = wallets.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    fn update(&self, wallet: &Wallet) -> Result<()> {
        let mut wallets = self.wallets.write();

        let previous = match wallets.get_mut(&wallet.id) {
            Some(slot) => std::mem::replace(slot, wallet.clone()),
            None => return Err(VaultError::wallet_not_found(&wallet.id)),
        };

        if let Err(e) = self.persist(&wallets) {
            wallets.insert(previous.id.clone(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut wallets = self.wallets.write();

        let removed = wallets
            .remove(id)
            .ok_or_else(|| VaultError::wallet_not_found(id))?;

        if let Err(e) = self.persist(&wallets) {
            wallets.insert(removed.id.clone(), removed);
            return Err(e);
        }
        Ok(())
    }
}
