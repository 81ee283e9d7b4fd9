//! Compiled units: one static executable, no layer.

use super::{BuildContext, BuildStrategy};
use crate::bundler::{
    Error, Result, Runtime,
    utils::{archive, fs, process::ToolInvocation},
};

/// Cross-compiles a Go module and archives the executable alone.
///
/// Statically linked (`CGO_ENABLED=0`), so no layer is ever produced.
#[derive(Debug, Default)]
pub struct GoStrategy;

impl BuildStrategy for GoStrategy {
    fn runtime(&self) -> Runtime {
        Runtime::Compiled
    }

    fn build_code(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let settings = ctx.settings;
        let target = settings.target();
        let binary_name = settings.go_binary_name();
        let binary = ctx.work_dir.join(binary_name);

        log::info!("Compiling {} for {}/{}", ctx.unit, target.os, target.arch);
        ctx.tools.run_checked(
            &ToolInvocation::new(&settings.toolchain().go, ctx.unit_dir())
                .args(["build", "-trimpath", "-ldflags", "-s -w", "-o"])
                .path_arg(&binary)
                .arg(".")
                .env("GOOS", &target.os)
                .env("GOARCH", target.arch.go_arch())
                .env("CGO_ENABLED", "0"),
        )?;

        if fs::file_len(&binary).unwrap_or(0) == 0 {
            return Err(Error::MissingOutput { path: binary });
        }

        archive::zip_executable(&binary, binary_name, ctx.code_archive)?;
        fs::remove_file(&binary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        ArtifactKind,
        utils::testutil::{ScriptedTools, UnitFixture, zip_entries},
    };

    const GO_UNIT: &[(&str, &str)] = &[
        ("go.mod", "module example.com/fn-a\n\ngo 1.22\n"),
        ("main.go", "package main\n\nfunc main() {}\n"),
    ];

    #[test]
    fn archive_holds_a_single_executable_and_no_layer() {
        let fixture = UnitFixture::new("fn-a", GO_UNIT);
        let tools = ScriptedTools::new();

        let output = GoStrategy.build(&fixture.context(&tools));

        let code = output.code.unwrap();
        assert_eq!(code.kind(), ArtifactKind::Code);
        assert_eq!(code.file_name(), "fn-a.zip");
        assert!(output.layer.is_none());
        assert_eq!(zip_entries(&fixture.code_archive), vec!["handler"]);
        assert!(!fixture.layer_archive.exists());
        assert!(!fixture.work_dir.join("handler").exists());
    }

    #[cfg(unix)]
    #[test]
    fn executable_entry_is_marked_executable() {
        let fixture = UnitFixture::new("fn-a", GO_UNIT);
        GoStrategy
            .build_code(&fixture.context(&ScriptedTools::new()))
            .unwrap();

        let mut zip =
            zip::ZipArchive::new(std::fs::File::open(&fixture.code_archive).unwrap()).unwrap();
        let entry = zip.by_index(0).unwrap();
        assert_eq!(entry.unix_mode().unwrap() & 0o777, 0o755);
    }

    #[test]
    fn cross_compiles_with_explicit_environment() {
        let fixture = UnitFixture::new("fn-a", GO_UNIT);
        let tools = ScriptedTools::new();

        GoStrategy.build_code(&fixture.context(&tools)).unwrap();

        let calls = tools.calls_to("go");
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.working_dir, fixture.unit_dir());
        assert!(call.starts_with(&["build", "-trimpath", "-ldflags", "-s -w", "-o"]));
        assert_eq!(call.args.last().map(String::as_str), Some("."));
        for (key, value) in [("GOOS", "linux"), ("GOARCH", "amd64"), ("CGO_ENABLED", "0")] {
            assert!(call.env.contains(&(key.to_string(), value.to_string())));
        }
    }

    #[test]
    fn compiler_error_fails_code_with_diagnostics() {
        let fixture = UnitFixture::new("fn-a", GO_UNIT);
        let tools = ScriptedTools::new().failing("go", &["build"], "./main.go:3:1: syntax error");

        let output = GoStrategy.build(&fixture.context(&tools));

        let err = output.code.unwrap_err();
        assert_eq!(err.runtime, Runtime::Compiled);
        assert!(!err.is_dependency_resolution());
        assert!(err.to_string().contains("syntax error"));
        assert!(output.layer.is_none());
        assert!(!fixture.code_archive.exists());
    }

    #[test]
    fn compiler_producing_nothing_is_missing_output() {
        let fixture = UnitFixture::new("fn-a", GO_UNIT);
        let tools = ScriptedTools::new().with_hook(|inv| {
            (inv.program == "go").then(|| crate::bundler::utils::testutil::ok(""))
        });

        let err = GoStrategy.build_code(&fixture.context(&tools)).unwrap_err();
        assert!(matches!(err, Error::MissingOutput { .. }));
    }
}
