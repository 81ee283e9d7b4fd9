//! Credentials injected into storage calls.
//!
//! Nothing here touches the process environment: credentials are handed to
//! each storage invocation explicitly.

use super::error::{Result, UploadError};
use crate::bundler::{
    AssumeRole,
    utils::process::{ToolInvocation, ToolRunner},
};
use serde::Deserialize;
use std::{
    fmt,
    sync::{Arc, OnceLock},
};

/// Session name recorded for assumed-role sessions
pub const DEFAULT_SESSION_NAME: &str = "lambda-build";

/// Temporary or static cloud credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token for temporary credentials
    pub session_token: Option<String>,
    /// Region to sign requests for
    pub region: Option<String>,
}

impl Credentials {
    /// Environment variables understood by the AWS CLI.
    pub fn to_env(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("AWS_ACCESS_KEY_ID".to_string(), self.access_key_id.clone()),
            (
                "AWS_SECRET_ACCESS_KEY".to_string(),
                self.secret_access_key.clone(),
            ),
        ];
        if let Some(token) = &self.session_token {
            env.push(("AWS_SESSION_TOKEN".to_string(), token.clone()));
        }
        if let Some(region) = &self.region {
            env.push(("AWS_REGION".to_string(), region.clone()));
            env.push(("AWS_DEFAULT_REGION".to_string(), region.clone()));
        }
        env
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &"<redacted>")
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .finish()
    }
}

/// Supplies credentials for uploads.
pub trait CredentialProvider: Send + Sync {
    /// Credentials to inject, `None` to rely on the ambient configuration.
    fn credentials(&self) -> Result<Option<Credentials>>;
}

/// Uses whatever the environment already provides.
#[derive(Debug, Default)]
pub struct AmbientCredentials;

impl CredentialProvider for AmbientCredentials {
    fn credentials(&self) -> Result<Option<Credentials>> {
        Ok(None)
    }
}

/// Assumes a role once through `aws sts assume-role` and reuses the session.
pub struct AssumeRoleCredentials {
    role: AssumeRole,
    session_name: String,
    program: String,
    tools: Arc<dyn ToolRunner>,
    session: OnceLock<std::result::Result<Credentials, String>>,
}

impl AssumeRoleCredentials {
    /// Creates a provider assuming `role` with the AWS CLI at `program`.
    pub fn new(role: AssumeRole, program: impl Into<String>, tools: Arc<dyn ToolRunner>) -> Self {
        Self {
            role,
            session_name: DEFAULT_SESSION_NAME.to_string(),
            program: program.into(),
            tools,
            session: OnceLock::new(),
        }
    }

    /// Overrides the session name.
    pub fn session_name(mut self, name: impl Into<String>) -> Self {
        self.session_name = name.into();
        self
    }

    fn assume(&self) -> Result<Credentials> {
        log::info!(
            "Assuming role {} in {}",
            self.role.role_arn,
            self.role.region
        );

        let invocation = ToolInvocation::new(&self.program, std::env::temp_dir())
            .args(["sts", "assume-role", "--role-arn", self.role.role_arn.as_str()])
            .args(["--role-session-name", self.session_name.as_str()])
            .args(["--region", self.role.region.as_str(), "--output", "json"]);
        let output = self.tools.run_checked(&invocation)?;

        let response: AssumeRoleResponse = serde_json::from_str(&output.stdout)?;
        let StsCredentials {
            access_key_id,
            secret_access_key,
            session_token,
        } = response.credentials;

        Ok(Credentials {
            access_key_id,
            secret_access_key,
            session_token: Some(session_token),
            region: Some(self.role.region.clone()),
        })
    }
}

impl fmt::Debug for AssumeRoleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumeRoleCredentials")
            .field("role", &self.role)
            .field("session_name", &self.session_name)
            .field("assumed", &self.session.get().is_some())
            .finish()
    }
}

impl CredentialProvider for AssumeRoleCredentials {
    fn credentials(&self) -> Result<Option<Credentials>> {
        self.session
            .get_or_init(|| self.assume().map_err(|e| e.to_string()))
            .clone()
            .map(Some)
            .map_err(|reason| UploadError::Credentials { reason })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResponse {
    credentials: StsCredentials,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
}
