mod args;
mod auth;
mod cmd;
mod config;
mod context;
mod deploy;
mod error;
mod manifest;
mod platform;
mod products;
mod result;
mod tpl;
mod utils;
mod vdf;

use args::{Action, Args, ManifestArgs};
use auth::SteamAuth;
use cmd::SystemRunner;
use config::DeployConfig;
use context::Context;
use deploy::DeployBuild;
use manifest::AppManifest;
use products::BuildProducts;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        let _ = cliclack::outro_cancel("Steam deployment failed");
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code().code());
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "steam_deploy=debug" } else { "steam_deploy=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> result::Result<()> {
    // Parse command-line arguments
    let Args {
        verbose,
        sdks_root,
        action,
    } = Args::parse();

    init_tracing(verbose);

    let cwd = std::env::current_dir()?;

    cliclack::intro("steam-deploy")?;

    match action {
        Action::Auth { env_var } => {
            let ctx = Context::new(cwd, sdks_root, verbose);
            run_auth(&ctx, &SteamAuth::new(env_var))?;
        }
        Action::Manifest(args) => {
            let ctx = Context::new(cwd, sdks_root, verbose);
            let products = args.products.clone();
            run_manifest(&ctx, &app_manifest(args), products.as_deref())?;
        }
        Action::Deploy { username, manifest } => {
            let ctx = Context::new(cwd, sdks_root, verbose);
            let deploy = DeployBuild::new(username, manifest)?;
            run_deploy(&ctx, &deploy)?;
        }
        Action::Publish {
            config,
            username,
            products,
        } => {
            let config_path = utils::find_config(config.as_deref())?;
            let base_dir = cwd.join(config_path.parent().unwrap_or(Path::new("")));
            let ctx = Context::new(base_dir, sdks_root, verbose);

            let config = DeployConfig::load(&config_path)?;
            // Resolve the upload request up front so a missing username fails before any I/O
            let deploy = config.deploy(username)?;

            run_auth(&ctx, &config.auth)?;
            run_manifest(&ctx, &config.manifest, products.as_deref())?;
            run_deploy(&ctx, &deploy)?;
        }
    }

    cliclack::outro("Steam deployment finished")?;
    Ok(())
}

fn app_manifest(args: ManifestArgs) -> AppManifest {
    AppManifest {
        app_id: args.app_id,
        description: args.description,
        content_root: args.content_root,
        depot_local_dir: args.local_dir,
        depot_path: args.depot_path,
        release_branch: args.branch,
        output: args.output,
        build_output: args.build_output,
        tag: args.tag,
    }
}

fn run_auth(ctx: &Context, auth: &SteamAuth) -> result::Result<()> {
    let spinner = cliclack::spinner();
    spinner.start(format!("Restoring steamcmd config from {}...", auth.env_var));
    match auth.execute(ctx) {
        Ok(files) => {
            spinner.stop(format!("Extracted {} config file(s)", files.len()));
            Ok(())
        }
        Err(e) => {
            spinner.error("Failed to restore steamcmd config");
            Err(e)
        }
    }
}

fn run_manifest(ctx: &Context, manifest: &AppManifest, products: Option<&Path>) -> result::Result<()> {
    let spinner = cliclack::spinner();
    spinner.start("Writing app manifest...");
    let record = match manifest.execute(ctx) {
        Ok(record) => {
            spinner.stop(format!("Wrote {}", ctx.resolve(&manifest.output).display()));
            record
        }
        Err(e) => {
            spinner.error("Failed to write app manifest");
            return Err(e);
        }
    };

    if let Some(path) = products {
        let path: PathBuf = ctx.resolve(path);
        let mut existing = BuildProducts::load(&path)?;
        existing.merge(record);
        existing.save(&path)?;
        cliclack::log::info(format!("Recorded build products in {}", path.display()))?;
    }

    Ok(())
}

fn run_deploy(ctx: &Context, deploy: &DeployBuild) -> result::Result<()> {
    cliclack::log::step("Uploading build with steamcmd...")?;
    let runner = SystemRunner { verbose: ctx.verbose };
    deploy.execute(ctx, &runner)?;
    cliclack::log::success("Build uploaded")?;
    Ok(())
}
