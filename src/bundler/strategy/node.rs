//! Script units (TypeScript and plain Node.js).
//!
//! TypeScript units with a `build` script are compiled with npm and their
//! output directory is archived; everything else archives `src/`. Production
//! dependencies are installed in the unit directory, so relative specs such
//! as `file:../shared` resolve as they do for developers, and archived under
//! `nodejs/node_modules/`.

use super::{BuildContext, BuildStrategy};
use crate::{
    bundler::{
        Result, Runtime,
        utils::{
            archive,
            fs::{ScopedDir, ScopedFile},
            process::ToolInvocation,
        },
    },
    metadata,
};
use std::path::Path;

/// Lock file npm writes when the unit has none
const LOCK_FILE: &str = "package-lock.json";

/// Layer directory recognized by the Node.js runtime
const LAYER_PREFIX: &str = "nodejs/node_modules";

/// Builds Node.js units, compiling them first when `compile` is set.
#[derive(Debug)]
pub struct NodeStrategy {
    compile: bool,
}

impl NodeStrategy {
    /// Strategy for units with a `tsconfig.json`.
    pub fn typescript() -> Self {
        Self { compile: true }
    }

    /// Strategy for plain scripts; never runs a build step.
    pub fn javascript() -> Self {
        Self { compile: false }
    }

    fn npm(&self, ctx: &BuildContext<'_>, dir: &Path) -> ToolInvocation {
        ToolInvocation::new(&ctx.settings.toolchain().npm, dir)
    }
}

impl BuildStrategy for NodeStrategy {
    fn runtime(&self) -> Runtime {
        if self.compile {
            Runtime::BundledScript
        } else {
            Runtime::Script
        }
    }

    fn build_code(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let unit_dir = ctx.unit_dir();
        let manifest = metadata::load_package_manifest(unit_dir)?;

        let build_declared = manifest.as_ref().is_some_and(|m| m.has_build_script());
        if !(self.compile && build_declared) {
            archive::zip_directory(&unit_dir.join("src"), "", ctx.code_archive)?;
            return Ok(());
        }

        let out_dir = metadata::typescript_out_dir(unit_dir);
        // Guards are dropped after archiving, also when a step fails
        let _node_modules = ScopedDir::adopt_if_absent(unit_dir.join("node_modules"));
        let _lock_file = ScopedFile::adopt_if_absent(unit_dir.join(LOCK_FILE));
        let _out_dir = ScopedDir::adopt_if_absent(&out_dir);

        log::info!("Compiling {}", ctx.unit);
        ctx.tools.run_checked(
            &self
                .npm(ctx, unit_dir)
                .args(["install", "--production=false", "--no-audit", "--no-fund"]),
        )?;
        ctx.tools
            .run_checked(&self.npm(ctx, unit_dir).args(["run", "build"]))?;

        archive::zip_directory(&out_dir, "", ctx.code_archive)?;
        Ok(())
    }

    fn build_layer(&self, ctx: &BuildContext<'_>) -> Result<bool> {
        let unit_dir = ctx.unit_dir();
        let Some(manifest) = metadata::load_package_manifest(unit_dir)? else {
            return Ok(false);
        };
        if !manifest.has_production_dependencies() {
            return Ok(false);
        }

        let node_modules = unit_dir.join("node_modules");
        let _node_modules = ScopedDir::adopt_if_absent(&node_modules);
        let _lock_file = ScopedFile::adopt_if_absent(unit_dir.join(LOCK_FILE));

        log::info!("Installing production dependencies for {}", ctx.unit);
        ctx.tools.run_checked(
            &self
                .npm(ctx, unit_dir)
                .args(["install", "--omit=dev", "--no-audit", "--no-fund"]),
        )?;

        archive::zip_directory(&node_modules, LAYER_PREFIX, ctx.layer_archive)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        Error,
        utils::testutil::{ScriptedTools, UnitFixture, failure, ok, write, zip_entries},
    };

    const HANDLER: (&str, &str) = ("src/index.js", "exports.handler = async () => ({});\n");
    const TS_HANDLER: (&str, &str) = ("src/index.ts", "export const handler = async () => ({});\n");

    #[test]
    fn script_with_dependency_yields_code_and_layer() {
        let fixture = UnitFixture::new(
            "fn-b",
            &[
                HANDLER,
                ("package.json", r#"{"name":"fn-b","dependencies":{"left-pad":"^1.3.0"}}"#),
                ("package-lock.json", "{}"),
            ],
        );
        let tools = ScriptedTools::new();

        let output = NodeStrategy::javascript().build(&fixture.context(&tools));

        assert_eq!(output.code.unwrap().file_name(), "fn-b.zip");
        assert_eq!(output.layer.unwrap().unwrap().file_name(), "fn-b_layer.zip");
        assert_eq!(zip_entries(&fixture.code_archive), vec!["index.js"]);
        assert_eq!(
            zip_entries(&fixture.layer_archive),
            vec![
                "nodejs/",
                "nodejs/node_modules/",
                "nodejs/node_modules/left-pad/",
                "nodejs/node_modules/left-pad/index.js"
            ]
        );

        let install = &tools.calls_to("npm")[0];
        assert!(install.starts_with(&["install", "--omit=dev"]));
        assert_eq!(install.working_dir, fixture.unit_dir());
        assert!(!fixture.unit_dir().join("node_modules").exists());
        // committed lock file stays
        assert!(fixture.unit_dir().join("package-lock.json").exists());
    }

    /// npm stand-in that resolves `file:` dependencies against its working
    /// directory and writes a lock file, like the real one.
    fn npm_resolving_local_paths() -> ScriptedTools {
        ScriptedTools::new().with_hook(|inv| {
            if inv.program != "npm" || !inv.starts_with(&["install"]) {
                return None;
            }
            let manifest = std::fs::read_to_string(inv.working_dir.join("package.json")).ok()?;
            let manifest: serde_json::Value = serde_json::from_str(&manifest).ok()?;
            for (name, spec) in manifest["dependencies"].as_object()? {
                if let Some(rel) = spec.as_str().and_then(|s| s.strip_prefix("file:")) {
                    let source = inv.working_dir.join(rel);
                    if !source.is_dir() {
                        return Some(failure(&format!(
                            "npm ERR! enoent ENOENT: no such file or directory, open '{}'",
                            source.display()
                        )));
                    }
                }
                write(
                    &inv.working_dir.join("node_modules").join(name).join("index.js"),
                    "module.exports = {};\n",
                );
            }
            write(&inv.working_dir.join("package-lock.json"), "{}");
            Some(ok(""))
        })
    }

    #[test]
    fn local_path_dependencies_resolve_from_the_unit_directory() {
        let fixture = UnitFixture::new(
            "fn-mono",
            &[
                HANDLER,
                (
                    "package.json",
                    r#"{"dependencies":{"shared":"file:../shared"}}"#,
                ),
                ("../shared/package.json", r#"{"name":"shared"}"#),
            ],
        );
        let tools = npm_resolving_local_paths();

        let output = NodeStrategy::javascript().build(&fixture.context(&tools));

        assert!(output.code.is_ok());
        output.layer.unwrap().unwrap();
        assert!(
            zip_entries(&fixture.layer_archive)
                .contains(&"nodejs/node_modules/shared/index.js".to_string())
        );
    }

    #[test]
    fn generated_lock_file_does_not_leak_into_the_checkout() {
        let fixture = UnitFixture::new(
            "fn-b",
            &[
                HANDLER,
                ("package.json", r#"{"dependencies":{"left-pad":"^1.3.0"}}"#),
            ],
        );
        let tools = npm_resolving_local_paths();

        let output = NodeStrategy::javascript().build(&fixture.context(&tools));

        output.layer.unwrap().unwrap();
        assert!(!fixture.unit_dir().join("package-lock.json").exists());
        assert!(!fixture.unit_dir().join("node_modules").exists());
    }

    #[test]
    fn typescript_unit_builds_code_and_layer() {
        let fixture = UnitFixture::new(
            "fn-ts",
            &[
                TS_HANDLER,
                ("tsconfig.json", r#"{"compilerOptions":{"outDir":"dist"}}"#),
                (
                    "package.json",
                    r#"{"scripts":{"build":"tsc"},"dependencies":{"left-pad":"^1.3.0"},"devDependencies":{"typescript":"^5"}}"#,
                ),
            ],
        );
        let tools = ScriptedTools::new();

        let output = NodeStrategy::typescript().build(&fixture.context(&tools));

        assert_eq!(output.code.unwrap().file_name(), "fn-ts.zip");
        assert_eq!(output.layer.unwrap().unwrap().file_name(), "fn-ts_layer.zip");
        assert_eq!(zip_entries(&fixture.code_archive), vec!["index.js"]);
        assert!(
            zip_entries(&fixture.layer_archive)
                .contains(&"nodejs/node_modules/left-pad/index.js".to_string())
        );

        let calls = tools.calls_to("npm");
        assert_eq!(calls.len(), 3);
        assert!(calls[2].starts_with(&["install", "--omit=dev"]));
        assert!(!fixture.unit_dir().join("dist").exists());
        assert!(!fixture.unit_dir().join("node_modules").exists());
    }

    #[test]
    fn dev_only_manifest_has_no_layer() {
        let fixture = UnitFixture::new(
            "fn-c",
            &[
                HANDLER,
                ("package.json", r#"{"devDependencies":{"jest":"^29"}}"#),
            ],
        );
        let tools = ScriptedTools::new();

        let output = NodeStrategy::javascript().build(&fixture.context(&tools));

        assert!(output.code.is_ok());
        assert!(output.layer.is_none());
        assert!(tools.calls().is_empty());
    }

    #[test]
    fn lock_file_without_manifest_has_no_layer() {
        let fixture = UnitFixture::new("fn-d", &[HANDLER, ("yarn.lock", "")]);
        let output = NodeStrategy::javascript().build(&fixture.context(&ScriptedTools::new()));
        assert!(output.code.is_ok());
        assert!(output.layer.is_none());
    }

    #[test]
    fn typescript_build_archives_output_directory() {
        let fixture = UnitFixture::new(
            "fn-ts",
            &[
                TS_HANDLER,
                ("tsconfig.json", r#"{"compilerOptions":{"outDir":"dist"}}"#),
                ("package.json", r#"{"scripts":{"build":"tsc"}}"#),
            ],
        );
        let tools = ScriptedTools::new();

        let output = NodeStrategy::typescript().build(&fixture.context(&tools));

        assert!(output.code.is_ok());
        assert!(output.layer.is_none());
        assert_eq!(zip_entries(&fixture.code_archive), vec!["index.js"]);

        let calls = tools.calls_to("npm");
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with(&["install", "--production=false"]));
        assert!(calls[1].starts_with(&["run", "build"]));
        assert!(calls.iter().all(|c| c.working_dir == fixture.unit_dir()));

        // Build byproducts do not leak into the checkout
        assert!(!fixture.unit_dir().join("dist").exists());
        assert!(!fixture.unit_dir().join("node_modules").exists());
    }

    #[test]
    fn preexisting_output_directory_is_left_alone() {
        let fixture = UnitFixture::new(
            "fn-ts",
            &[
                TS_HANDLER,
                ("tsconfig.json", "{}"),
                ("package.json", r#"{"scripts":{"build":"tsc"}}"#),
                ("dist/stale.js", "// committed\n"),
            ],
        );

        let output = NodeStrategy::typescript().build(&fixture.context(&ScriptedTools::new()));

        assert!(output.code.is_ok());
        assert!(fixture.unit_dir().join("dist/stale.js").exists());
        assert!(!fixture.unit_dir().join("node_modules").exists());
    }

    #[test]
    fn typescript_without_build_script_archives_src() {
        let fixture = UnitFixture::new(
            "fn-ts",
            &[TS_HANDLER, ("tsconfig.json", "{}"), ("package.json", "{}")],
        );
        let tools = ScriptedTools::new();

        let output = NodeStrategy::typescript().build(&fixture.context(&tools));

        assert!(output.code.is_ok());
        assert_eq!(zip_entries(&fixture.code_archive), vec!["index.ts"]);
        assert!(tools.calls().is_empty());
    }

    #[test]
    fn plain_scripts_never_run_a_build() {
        let fixture = UnitFixture::new(
            "fn-js",
            &[HANDLER, ("package.json", r#"{"scripts":{"build":"webpack"}}"#)],
        );
        let tools = ScriptedTools::new();

        NodeStrategy::javascript()
            .build_code(&fixture.context(&tools))
            .unwrap();
        assert!(tools.calls().is_empty());
    }

    #[test]
    fn failed_build_cleans_up_and_skips_layer() {
        let fixture = UnitFixture::new(
            "fn-ts",
            &[
                TS_HANDLER,
                ("tsconfig.json", "{}"),
                (
                    "package.json",
                    r#"{"scripts":{"build":"tsc"},"dependencies":{"uuid":"^9"}}"#,
                ),
            ],
        );
        let tools = ScriptedTools::new().failing(
            "npm",
            &["run", "build"],
            "src/index.ts(1,1): error TS2304",
        );

        let output = NodeStrategy::typescript().build(&fixture.context(&tools));

        let err = output.code.unwrap_err();
        assert_eq!(err.runtime, Runtime::BundledScript);
        assert!(err.to_string().contains("TS2304"));
        assert!(output.layer.is_none());
        assert!(!fixture.unit_dir().join("node_modules").exists());
    }

    #[test]
    fn invalid_manifest_fails_code() {
        let fixture = UnitFixture::new("fn-x", &[HANDLER, ("package.json", "{ not json")]);
        let output = NodeStrategy::javascript().build(&fixture.context(&ScriptedTools::new()));
        assert!(matches!(output.code.unwrap_err().source, Error::Json(_)));
    }
}
