//! Object storage clients.

use super::credentials::Credentials;
use crate::bundler::{
    Result,
    error::ErrorExt,
    utils::{
        fs,
        process::{ToolInvocation, ToolRunner},
    },
};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Destination for staged artifacts.
///
/// A put is a single attempt that overwrites any existing object under the
/// same key.
pub trait ObjectStore: Send + Sync + fmt::Display {
    /// Uploads `local_path` under `key`.
    fn put_object(
        &self,
        key: &str,
        local_path: &Path,
        credentials: Option<&Credentials>,
    ) -> Result<()>;
}

/// S3 through `aws s3api put-object`.
pub struct AwsCliStore {
    bucket: String,
    program: String,
    tools: Arc<dyn ToolRunner>,
}

impl AwsCliStore {
    /// Store writing to `bucket` with the AWS CLI at `program`.
    pub fn new(
        bucket: impl Into<String>,
        program: impl Into<String>,
        tools: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            program: program.into(),
            tools,
        }
    }
}

impl fmt::Display for AwsCliStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}", self.bucket)
    }
}

impl ObjectStore for AwsCliStore {
    fn put_object(
        &self,
        key: &str,
        local_path: &Path,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        let working_dir = local_path.parent().unwrap_or(Path::new("."));
        let mut invocation = ToolInvocation::new(&self.program, working_dir)
            .args(["s3api", "put-object", "--bucket", self.bucket.as_str(), "--key", key])
            .arg("--body")
            .path_arg(local_path);
        if let Some(credentials) = credentials {
            for (name, value) in credentials.to_env() {
                invocation = invocation.env(name, value);
            }
        }

        self.tools.run_checked(&invocation)?;
        Ok(())
    }
}

/// A local directory standing in for a bucket.
///
/// Objects are written to `<root>/<key>` through a temporary file renamed
/// into place, so readers never see a partial object.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Store rooted at `root`, created on first put.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the objects.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl fmt::Display for FsObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file://{}", self.root.display())
    }
}

impl ObjectStore for FsObjectStore {
    fn put_object(
        &self,
        key: &str,
        local_path: &Path,
        _credentials: Option<&Credentials>,
    ) -> Result<()> {
        let dest = key
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment));
        let parent = dest.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent, false)?;

        let temp = parent.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        let result = std::fs::copy(local_path, &temp)
            .fs_context("copying artifact", local_path)
            .and_then(|_| std::fs::rename(&temp, &dest).fs_context("storing object", &dest));
        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::utils::testutil::ScriptedTools;
    use tempfile::TempDir;

    #[test]
    fn aws_store_passes_bucket_key_body_and_credentials() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("fn-a.zip");
        std::fs::write(&artifact, b"PK").unwrap();
        let tools = Arc::new(ScriptedTools::new());
        let store = AwsCliStore::new("artifacts", "aws", tools.clone());
        let credentials = Credentials {
            access_key_id: "ASIAEXAMPLE".into(),
            secret_access_key: "secret".into(),
            session_token: None,
            region: Some("eu-west-1".into()),
        };

        store
            .put_object("repo/abc/fn-a.zip", &artifact, Some(&credentials))
            .unwrap();

        let call = &tools.calls_to("aws")[0];
        assert!(call.starts_with(&["s3api", "put-object"]));
        assert_eq!(call.arg_after("--bucket"), Some("artifacts"));
        assert_eq!(call.arg_after("--key"), Some("repo/abc/fn-a.zip"));
        assert_eq!(call.arg_after("--body"), artifact.to_str());
        assert!(call.env.contains(&("AWS_REGION".into(), "eu-west-1".into())));
        assert_eq!(store.to_string(), "s3://artifacts");
    }

    #[test]
    fn aws_store_surfaces_client_errors() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("fn-a.zip");
        std::fs::write(&artifact, b"PK").unwrap();
        let tools = Arc::new(ScriptedTools::new().failing(
            "aws",
            &["s3api"],
            "An error occurred (NoSuchBucket) when calling the PutObject operation",
        ));

        let err = AwsCliStore::new("missing", "aws", tools)
            .put_object("repo/abc/fn-a.zip", &artifact, None)
            .unwrap_err();
        assert!(err.to_string().contains("NoSuchBucket"));
    }

    #[test]
    fn fs_store_writes_and_overwrites_objects() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("fn-a.zip");
        let store = FsObjectStore::new(tmp.path().join("bucket"));

        std::fs::write(&artifact, b"first").unwrap();
        store.put_object("repo/abc/fn-a.zip", &artifact, None).unwrap();
        std::fs::write(&artifact, b"second").unwrap();
        store.put_object("repo/abc/fn-a.zip", &artifact, None).unwrap();

        let object = tmp.path().join("bucket/repo/abc/fn-a.zip");
        assert_eq!(std::fs::read(&object).unwrap(), b"second");
        let names: Vec<_> = std::fs::read_dir(object.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["fn-a.zip"]);
    }

    #[test]
    fn fs_store_missing_source_leaves_nothing_behind() {
        let tmp = TempDir::new().unwrap();
        let store = FsObjectStore::new(tmp.path().join("bucket"));

        assert!(store
            .put_object("repo/abc/gone.zip", &tmp.path().join("gone.zip"), None)
            .is_err());
        assert_eq!(
            std::fs::read_dir(tmp.path().join("bucket/repo/abc")).unwrap().count(),
            0
        );
    }
}
