use crate::cmd::{CommandLine, Invocation, ProcessRunner};
use crate::context::Context;
use crate::error::Error;
use crate::result::Result;
use crate::utils;
use std::path::{Path, PathBuf};

/// Lines of steamcmd output shown when an upload fails
const OUTPUT_TAIL_LINES: usize = 20;

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].iter().map(|line| format!("{}\n", line)).collect()
}

/// Uploads a build described by an app manifest through steamcmd
#[derive(Debug, Clone)]
pub struct DeployBuild {
    username: String,
    app_manifest: PathBuf,
}

impl DeployBuild {
    pub fn new<U: Into<String>, P: Into<PathBuf>>(username: U, app_manifest: P) -> Result<Self> {
        let username = username.into();
        if username.is_empty() {
            return Err(Error::custom("Steam build username not set"));
        }

        Ok(Self {
            username,
            app_manifest: app_manifest.into(),
        })
    }

    /// steamcmd arguments: log in, run the app build, quit
    pub fn arguments(&self, manifest: &Path) -> Vec<String> {
        vec![
            "+login".to_string(),
            self.username.clone(),
            "+run_app_build".to_string(),
            manifest.display().to_string(),
            "+quit".to_string(),
        ]
    }

    pub fn execute(&self, ctx: &Context, runner: &dyn ProcessRunner) -> Result<()> {
        let builder_dir = ctx.content_builder_dir()?;
        let logs = ctx.steam_logs_dir()?;

        let manifest = ctx.resolve(&self.app_manifest);
        if !manifest.is_file() {
            return Err(Error::ManifestNotFound(manifest));
        }

        utils::clear_dir_contents(&logs)?;

        let steamcmd = ctx.steamcmd_path()?;
        if !steamcmd.is_file() {
            return Err(Error::SteamCmdMissing(steamcmd));
        }

        let invocation = self
            .arguments(&manifest)
            .into_iter()
            .fold(Invocation::new(&steamcmd), Invocation::arg)
            .current_dir(builder_dir);

        tracing::info!(
            "Running {} {}",
            steamcmd.display(),
            CommandLine(&invocation.args)
        );

        let output = runner.run(&invocation)?;
        if !output.success() {
            if !ctx.verbose {
                tracing::error!(
                    "steamcmd output (last {} lines):\n{}{}",
                    OUTPUT_TAIL_LINES,
                    tail(&output.stdout, OUTPUT_TAIL_LINES),
                    output.stderr
                );
            }
            let code = output
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "<terminated>".to_string());
            return Err(Error::UploadFailed { code, logs });
        }

        tracing::info!("Build for {} uploaded", manifest.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::ProcessOutput;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    struct FakeRunner {
        code: Option<i32>,
        calls: RefCell<Vec<Invocation>>,
    }

    impl FakeRunner {
        fn exiting(code: Option<i32>) -> Self {
            Self {
                code,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
            self.calls.borrow_mut().push(invocation.clone());
            Ok(ProcessOutput {
                code: self.code,
                ..Default::default()
            })
        }
    }

    struct Sandbox {
        _tmp: TempDir,
        ctx: Context,
        manifest: PathBuf,
    }

    fn sandbox(with_steamcmd: bool) -> Sandbox {
        let tmp = TempDir::new().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), Some(tmp.path().join("sdks")), false);
        let builder = ctx.content_builder_dir().unwrap();
        fs::create_dir_all(&builder).unwrap();
        if with_steamcmd {
            fs::write(ctx.steamcmd_path().unwrap(), "").unwrap();
        }
        let manifest = tmp.path().join("app_build.vdf");
        fs::write(&manifest, "\"AppBuild\"\n{\n}\n").unwrap();
        Sandbox {
            _tmp: tmp,
            ctx,
            manifest,
        }
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\n", 2), "b\nc\n");
        assert_eq!(tail("a", 5), "a\n");
        assert_eq!(tail("", 5), "");
    }

    #[test]
    fn test_empty_username_is_rejected() {
        assert!(DeployBuild::new("", "app.vdf").is_err());
        assert!(DeployBuild::new("builder", "app.vdf").is_ok());
    }

    #[test]
    fn test_invokes_steamcmd_with_login_build_quit() {
        let sb = sandbox(true);
        let runner = FakeRunner::exiting(Some(0));

        DeployBuild::new("builder", "app_build.vdf")
            .unwrap()
            .execute(&sb.ctx, &runner)
            .unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.program, sb.ctx.steamcmd_path().unwrap());
        assert_eq!(call.working_dir, Some(sb.ctx.content_builder_dir().unwrap()));
        assert_eq!(
            CommandLine(&call.args).to_string(),
            format!(
                "+login \"builder\" +run_app_build \"{}\" +quit",
                sb.manifest.display()
            )
        );
    }

    #[test]
    fn test_missing_manifest_spawns_nothing() {
        let sb = sandbox(true);
        let runner = FakeRunner::exiting(Some(0));

        let err = DeployBuild::new("builder", "missing.vdf")
            .unwrap()
            .execute(&sb.ctx, &runner)
            .unwrap_err();

        assert!(matches!(err, Error::ManifestNotFound(_)));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_steamcmd_is_distinct_from_failed_upload() {
        let missing = sandbox(false);
        let runner = FakeRunner::exiting(Some(0));
        let err = DeployBuild::new("builder", &missing.manifest)
            .unwrap()
            .execute(&missing.ctx, &runner)
            .unwrap_err();
        assert!(matches!(err, Error::SteamCmdMissing(_)));
        assert!(err.to_string().contains("Check the SDK installation"));
        assert!(runner.calls.borrow().is_empty());

        let present = sandbox(true);
        let runner = FakeRunner::exiting(Some(6));
        let err = DeployBuild::new("builder", &present.manifest)
            .unwrap()
            .execute(&present.ctx, &runner)
            .unwrap_err();
        assert!(matches!(err, Error::UploadFailed { ref code, .. } if code == "6"));
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn test_signal_termination_is_a_failure() {
        let sb = sandbox(true);
        let runner = FakeRunner::exiting(None);
        let err = DeployBuild::new("builder", &sb.manifest)
            .unwrap()
            .execute(&sb.ctx, &runner)
            .unwrap_err();
        assert!(matches!(err, Error::UploadFailed { .. }));
    }

    #[test]
    fn test_logs_are_cleared_before_run() {
        let sb = sandbox(true);
        let logs = sb.ctx.steam_logs_dir().unwrap();
        fs::create_dir_all(logs.join("old")).unwrap();
        fs::write(logs.join("console_log.txt"), "stale").unwrap();
        fs::write(logs.join("old/stderr.txt"), "stale").unwrap();

        DeployBuild::new("builder", &sb.manifest)
            .unwrap()
            .execute(&sb.ctx, &FakeRunner::exiting(Some(0)))
            .unwrap();

        assert_eq!(fs::read_dir(&logs).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_sdk_root_fails_before_manifest_check() {
        let tmp = TempDir::new().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), None, false);
        let runner = FakeRunner::exiting(Some(0));

        let err = DeployBuild::new("builder", Path::new("missing.vdf"))
            .unwrap()
            .execute(&ctx, &runner)
            .unwrap_err();
        assert!(matches!(err, Error::MissingEnv(_)));
        assert_eq!(err.exit_code(), crate::error::ExitCode::Configuration);
        assert!(runner.calls.borrow().is_empty());
    }
}
