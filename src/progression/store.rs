//! Account store collaborators.
//!
//! The pipeline only needs two operations: read the active account, and
//! atomically mutate-and-persist it. Stores serialize concurrent mutations
//! themselves.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::error::StoreError;
use crate::progression::account::Account;

/// Mutation callback. Edits the account in place, or returns a full
/// replacement record.
pub type Mutation<'a> = dyn FnMut(&mut Account) -> Option<Account> + 'a;

pub trait AccountStore: Send + Sync {
    fn read_active(&self) -> Result<Account, StoreError>;

    /// Apply `f` to the active account and persist the result. Either the
    /// whole mutation commits or nothing does.
    fn mutate_active(&self, f: &mut Mutation<'_>) -> Result<Account, StoreError>;
}

/// Run one mutation over a working copy: normalize, apply, normalize.
fn run_mutation(current: &Account, f: &mut Mutation<'_>) -> Account {
    let mut working = current.clone();
    working.normalize();
    if let Some(replacement) = f(&mut working) {
        working = replacement;
    }
    working.normalize();
    working
}

/// In-memory store, for tests and embedding.
#[derive(Default)]
pub struct InMemoryStore {
    active: RwLock<Option<Account>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(account: Account) -> Self {
        Self {
            active: RwLock::new(Some(account)),
        }
    }

    pub fn set_active(&self, account: Account) -> Result<(), StoreError> {
        let mut guard = self.active.write().map_err(|_| StoreError::LockPoisoned)?;
        *guard = Some(account);
        Ok(())
    }
}

impl AccountStore for InMemoryStore {
    fn read_active(&self) -> Result<Account, StoreError> {
        let guard = self.active.read().map_err(|_| StoreError::LockPoisoned)?;
        guard.clone().ok_or(StoreError::NoActiveAccount)
    }

    fn mutate_active(&self, f: &mut Mutation<'_>) -> Result<Account, StoreError> {
        let mut guard = self.active.write().map_err(|_| StoreError::LockPoisoned)?;
        let current = guard.as_ref().ok_or(StoreError::NoActiveAccount)?;
        let next = run_mutation(current, f);
        *guard = Some(next.clone());
        Ok(next)
    }
}

/// Single-account JSON file store. Writes go to a temp file that is then
/// renamed over the target.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create the file with `account` if it does not exist yet.
    pub fn create_if_missing(path: impl AsRef<Path>, account: &Account) -> Result<Self, StoreError> {
        let store = Self::new(path);
        if !store.path.exists() {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            store.save(account)?;
            tracing::info!(path = %store.path.display(), name = %account.name, "created account file");
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Account, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NoActiveAccount);
        }
        let bytes = fs::read(&self.path)?;
        let account: Account = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %self.path.display(), "loaded account");
        Ok(account)
    }

    fn save(&self, account: &Account) -> Result<(), StoreError> {
        let temp_path = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(account)?;
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &self.path)?;
        tracing::debug!(path = %self.path.display(), "saved account");
        Ok(())
    }
}

impl AccountStore for FileStore {
    fn read_active(&self) -> Result<Account, StoreError> {
        self.load()
    }

    fn mutate_active(&self, f: &mut Mutation<'_>) -> Result<Account, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let current = self.load()?;
        let next = run_mutation(&current, f);
        self.save(&next)?;
        Ok(next)
    }
}
