use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Long-lived login credential. Unrelated to the short-lived proof session.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub employee_id: String,
}

impl Credential {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && now < self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("employee_id", &self.employee_id)
            .finish()
    }
}

pub trait CredentialStore: Send + Sync {
    fn credential(&self) -> Option<Credential>;
    fn save_credential(&self, credential: Credential) -> Result<()>;
    /// Drop the access credential. The company code survives a logout.
    fn clear(&self) -> Result<()>;
    fn company_code(&self) -> Option<String>;
    fn set_company_code(&self, code: &str) -> Result<()>;

    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.credential()
            .map(|credential| credential.is_valid_at(now))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCredentials {
    credential: Option<Credential>,
    company_code: Option<String>,
}

/// In-process store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    data: RwLock<StoredCredentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            data: RwLock::new(StoredCredentials {
                credential: Some(credential),
                company_code: None,
            }),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn credential(&self) -> Option<Credential> {
        read(&self.data).credential.clone()
    }

    fn save_credential(&self, credential: Credential) -> Result<()> {
        write(&self.data).credential = Some(credential);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        write(&self.data).credential = None;
        Ok(())
    }

    fn company_code(&self) -> Option<String> {
        read(&self.data).company_code.clone()
    }

    fn set_company_code(&self, code: &str) -> Result<()> {
        write(&self.data).company_code = Some(code.trim().to_string());
        Ok(())
    }
}

/// JSON-file backed store. Every mutation is written through.
pub struct FileCredentialStore {
    path: PathBuf,
    data: RwLock<StoredCredentials>,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read credentials from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Discarding unreadable credential file {}: {err}",
                    path.display()
                );
                StoredCredentials::default()
            })
        } else {
            StoredCredentials::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn update(&self, mutate: impl FnOnce(&mut StoredCredentials)) -> Result<()> {
        let mut guard = write(&self.data);
        mutate(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &StoredCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create credential directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write credentials to {}", self.path.display()))
    }
}

impl CredentialStore for FileCredentialStore {
    fn credential(&self) -> Option<Credential> {
        read(&self.data).credential.clone()
    }

    fn save_credential(&self, credential: Credential) -> Result<()> {
        self.update(|data| data.credential = Some(credential))
    }

    fn clear(&self) -> Result<()> {
        self.update(|data| data.credential = None)
    }

    fn company_code(&self) -> Option<String> {
        read(&self.data).company_code.clone()
    }

    fn set_company_code(&self, code: &str) -> Result<()> {
        let code = code.trim().to_string();
        self.update(|data| data.company_code = Some(code))
    }
}

fn read(lock: &RwLock<StoredCredentials>) -> RwLockReadGuard<'_, StoredCredentials> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write(lock: &RwLock<StoredCredentials>) -> RwLockWriteGuard<'_, StoredCredentials> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
