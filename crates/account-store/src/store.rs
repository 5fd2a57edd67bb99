//! Account file storage
//!
//! File shape: `{"accounts":[{"label":"acc1","cookie":"..."}]}`. The legacy
//! single-account shape `{"cookie":"..."}` is migrated into a one-element
//! list on load and rewritten in the current shape on the next save.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// One account: a unique label and its session cookie (may be empty).
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "cookie")]
    pub credential: String,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("label", &self.label)
            .field("has_credential", &!self.credential.is_empty())
            .finish()
    }
}

/// Handle to an account in an `AccountStore`.
///
/// Only the store hands these out and accounts are never removed, so a
/// handle always indexes a live entry of the store that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(usize);

/// On-disk shapes, legacy first so an `accounts` list never matches it.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFile {
    Legacy {
        cookie: String,
    },
    Current {
        #[serde(default)]
        accounts: Vec<Account>,
    },
}

#[derive(Serialize)]
struct StoredFileRef<'a> {
    accounts: &'a [Account],
}

/// Ordered account list backed by a JSON file.
#[derive(Debug)]
pub struct AccountStore {
    path: PathBuf,
    accounts: Vec<Account>,
}

impl AccountStore {
    /// Load accounts from `path`.
    ///
    /// A missing file starts an empty store and creates the file. Empty
    /// labels are filled in as `accN` (1-based position). Duplicate labels
    /// are rejected.
    pub async fn load(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "account file not found, starting with empty store");
            let store = Self {
                path,
                accounts: Vec::new(),
            };
            store.save().await?;
            return Ok(store);
        }

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Io(format!("reading account file: {e}")))?;
        let stored: StoredFile = serde_json::from_str(&contents)
            .map_err(|e| Error::Parse(format!("parsing account file: {e}")))?;

        let accounts = match stored {
            StoredFile::Legacy { cookie } => {
                info!(path = %path.display(), "migrating legacy single-cookie account file");
                vec![Account {
                    label: String::new(),
                    credential: cookie,
                }]
            }
            StoredFile::Current { accounts } => accounts,
        };

        let store = Self::from_accounts(path, accounts)?;
        info!(path = %store.path.display(), accounts = store.len(), "loaded accounts");
        Ok(store)
    }

    /// Build a store from an in-memory list, applying default labels and
    /// the uniqueness check. Nothing is written.
    pub fn from_accounts(path: PathBuf, mut accounts: Vec<Account>) -> Result<Self> {
        let mut seen = HashSet::new();
        for (i, account) in accounts.iter_mut().enumerate() {
            account.label = account.label.trim().to_string();
            if account.label.is_empty() {
                account.label = format!("acc{}", i + 1);
            }
            if !seen.insert(account.label.clone()) {
                return Err(Error::DuplicateLabel(account.label.clone()));
            }
        }
        Ok(Self { path, accounts })
    }

    /// Persist the current list to disk.
    pub async fn save(&self) -> Result<()> {
        write_atomic(&self.path, &self.accounts).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Handles for every account, in file order.
    pub fn ids(&self) -> Vec<AccountId> {
        (0..self.accounts.len()).map(AccountId).collect()
    }

    /// Find an account by label.
    pub fn find(&self, label: &str) -> Option<AccountId> {
        self.accounts
            .iter()
            .position(|a| a.label == label)
            .map(AccountId)
    }

    pub fn label(&self, id: AccountId) -> &str {
        &self.accounts[id.0].label
    }

    pub fn credential(&self, id: AccountId) -> &str {
        &self.accounts[id.0].credential
    }

    /// Replace the in-memory credential without persisting.
    pub fn set_credential(&mut self, id: AccountId, credential: String) {
        self.accounts[id.0].credential = credential;
    }

    /// Forget the in-memory credential. The file keeps the old value until
    /// a replacement is persisted.
    pub fn clear_credential(&mut self, id: AccountId) {
        self.accounts[id.0].credential.clear();
    }

    /// Set the credential and write the whole list through to disk.
    pub async fn persist_credential(&mut self, id: AccountId, credential: String) -> Result<()> {
        self.set_credential(id, credential);
        debug!(account = %self.accounts[id.0].label, "persisting credential");
        self.save().await
    }

    /// Append an account with an empty credential (in memory only).
    ///
    /// Without a label, the first free `accN` is used.
    pub fn add(&mut self, label: Option<String>) -> Result<AccountId> {
        let label = match label.map(|l| l.trim().to_string()) {
            Some(l) if !l.is_empty() => {
                if self.find(&l).is_some() {
                    return Err(Error::DuplicateLabel(l));
                }
                l
            }
            _ => {
                let mut n = self.accounts.len() + 1;
                while self.find(&format!("acc{n}")).is_some() {
                    n += 1;
                }
                format!("acc{n}")
            }
        };
        self.accounts.push(Account {
            label: label.clone(),
            credential: String::new(),
        });
        info!(account = %label, "account added");
        Ok(AccountId(self.accounts.len() - 1))
    }
}

/// Write the account list atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. Sets permissions to 0600 since the file holds session cookies.
async fn write_atomic(path: &Path, accounts: &[Account]) -> Result<()> {
    let json = serde_json::to_string_pretty(&StoredFileRef { accounts })
        .map_err(|e| Error::Parse(format!("serializing accounts: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("account path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".accounts.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp account file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting account file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp account file: {e}")))?;

    debug!(path = %path.display(), "persisted accounts");
    Ok(())
}
