//! Publishing staged artifacts to object storage.
//!
//! Artifacts are stored under `{repositoryName}/{commitHash}/{fileName}`.
//! Repository identity is resolved once per run through [`VersionControl`],
//! credentials come from an injected [`CredentialProvider`], and the transfer
//! itself is a single put through an [`ObjectStore`].

mod credentials;
mod error;
mod store;
mod uploader;
mod vcs;

pub use credentials::{
    AmbientCredentials, AssumeRoleCredentials, CredentialProvider, Credentials,
    DEFAULT_SESSION_NAME,
};
pub use error::{Result, UploadError};
pub use store::{AwsCliStore, FsObjectStore, ObjectStore};
pub use uploader::{RepositoryIdentity, StorageKey, Uploader};
pub use vcs::{GitCli, VersionControl};
