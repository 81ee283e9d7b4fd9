//! Storage addressing and the upload protocol.

use super::{
    credentials::CredentialProvider,
    error::{Result, UploadError},
    store::ObjectStore,
    vcs::VersionControl,
};
use crate::bundler::{BuildArtifact, CommitHashFormat, utils::fs};
use std::{
    fmt,
    sync::{Arc, OnceLock},
};

/// Repository name and commit, fixed for a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositoryIdentity {
    /// Repository name
    pub name: String,
    /// Full or abbreviated commit hash
    pub commit: String,
}

/// `{repositoryName}/{commitHash}/{artifactFileName}`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageKey {
    /// Repository name
    pub repository: String,
    /// Commit hash
    pub commit: String,
    /// Archive file name
    pub file_name: String,
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.repository, self.commit, self.file_name)
    }
}

/// Publishes artifacts and removes their local copies.
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    vcs: Arc<dyn VersionControl>,
    credentials: Arc<dyn CredentialProvider>,
    hash_format: CommitHashFormat,
    identity: OnceLock<std::result::Result<RepositoryIdentity, String>>,
}

impl Uploader {
    /// Creates an uploader.
    ///
    /// # Arguments
    ///
    /// * `store` - Destination client
    /// * `vcs` - Repository identity source, queried at most once
    /// * `credentials` - Credentials injected into every put
    /// * `hash_format` - Full or abbreviated commit hash in keys
    pub fn new(
        store: Arc<dyn ObjectStore>,
        vcs: Arc<dyn VersionControl>,
        credentials: Arc<dyn CredentialProvider>,
        hash_format: CommitHashFormat,
    ) -> Self {
        Self {
            store,
            vcs,
            credentials,
            hash_format,
            identity: OnceLock::new(),
        }
    }

    /// Repository identity, resolved on first use and cached for the run.
    pub fn identity(&self) -> Result<&RepositoryIdentity> {
        self.identity
            .get_or_init(|| -> std::result::Result<RepositoryIdentity, String> {
                let name = self.vcs.repository_name().map_err(|e| e.to_string())?;
                let commit = self
                    .vcs
                    .commit_hash(self.hash_format)
                    .map_err(|e| e.to_string())?;
                log::info!("Publishing for {} at {}", name, commit);
                Ok(RepositoryIdentity { name, commit })
            })
            .as_ref()
            .map_err(|reason| UploadError::Identity {
                reason: reason.clone(),
            })
    }

    /// Storage key of `artifact`.
    pub fn storage_key(&self, artifact: &BuildArtifact) -> Result<StorageKey> {
        let identity = self.identity()?;
        Ok(StorageKey {
            repository: identity.name.clone(),
            commit: identity.commit.clone(),
            file_name: artifact.file_name(),
        })
    }

    /// Uploads `artifact` and deletes its local file.
    ///
    /// Returns `Ok(None)` without contacting the store when the local file
    /// no longer exists. On failure the local file is left untouched.
    pub fn upload(&self, artifact: BuildArtifact) -> Result<Option<StorageKey>> {
        let path = artifact.local_path();
        let Some(len) = fs::file_len(path) else {
            log::debug!("{} no longer exists, skipping upload", path.display());
            return Ok(None);
        };
        if len == 0 {
            return Err(UploadError::EmptyArtifact {
                path: path.to_path_buf(),
            });
        }

        let key = self.storage_key(&artifact)?;
        let credentials = self.credentials.credentials()?;

        log::info!("Uploading {} to {}/{}", artifact, self.store, key);
        self.store
            .put_object(&key.to_string(), path, credentials.as_ref())
            .map_err(|source| UploadError::Store {
                key: key.to_string(),
                source,
            })?;

        if let Err(e) = fs::remove_file(path) {
            log::warn!("Uploaded {} but could not remove it: {}", key, e);
        }
        Ok(Some(key))
    }
}

impl fmt::Debug for Uploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uploader")
            .field("store", &self.store.to_string())
            .field("hash_format", &self.hash_format)
            .field("identity", &self.identity.get())
            .finish()
    }
}
