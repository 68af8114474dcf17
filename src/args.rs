use crate::auth::DEFAULT_CONFIG_VDF_ENV;
use crate::context::SDKS_ROOT_ENV;
use crate::manifest::DEFAULT_BUILD_OUTPUT;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::path::PathBuf;

/// Command-line arguments for the steam-deploy tool
#[derive(Debug)]
pub struct Args {
    /// Enable verbose output
    pub verbose: bool,

    /// SDK installation root containing the Steam content builder
    pub sdks_root: Option<PathBuf>,

    /// Task to run
    pub action: Action,
}

#[derive(Debug)]
pub enum Action {
    /// Extract the steamcmd config bundle from the environment
    Auth { env_var: String },

    /// Write an app build manifest
    Manifest(ManifestArgs),

    /// Upload a build with steamcmd
    Deploy { username: String, manifest: PathBuf },

    /// Run auth, manifest and deploy from a configuration file
    Publish {
        config: Option<PathBuf>,
        username: Option<String>,
        products: Option<PathBuf>,
    },
}

#[derive(Debug)]
pub struct ManifestArgs {
    pub app_id: u32,
    pub description: String,
    pub content_root: PathBuf,
    pub local_dir: String,
    pub depot_path: String,
    pub branch: String,
    pub output: PathBuf,
    pub build_output: String,
    pub tag: String,
    pub products: Option<PathBuf>,
}

fn products_arg() -> Arg {
    Arg::new("products")
        .long("products")
        .value_name("FILE")
        .help("Record written files and their tags in this TOML file")
}

fn command() -> Command {
    Command::new("steam-deploy")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Steam build upload tool")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable verbose output")
        )
        .arg(
            Arg::new("sdks-root")
                .long("sdks-root")
                .value_name("DIR")
                .env(SDKS_ROOT_ENV)
                .global(true)
                .help("SDK installation root containing the Steam content builder")
        )
        .subcommand(
            Command::new("auth")
                .about("Create the steamcmd config directory from a base64 encoded zip in the environment")
                .arg(
                    Arg::new("env-var")
                        .long("env-var")
                        .value_name("NAME")
                        .default_value(DEFAULT_CONFIG_VDF_ENV)
                        .help("Environment variable holding the encoded config bundle")
                )
        )
        .subcommand(
            Command::new("manifest")
                .about("Write an app build manifest for steamcmd")
                .arg(
                    Arg::new("app-id")
                        .long("app-id")
                        .value_name("ID")
                        .required(true)
                        .value_parser(value_parser!(u32))
                        .help("Steam AppId")
                )
                .arg(
                    Arg::new("description")
                        .long("description")
                        .value_name("TEXT")
                        .help("Description of the build in the Steamworks build database")
                )
                .arg(
                    Arg::new("content-root")
                        .long("content-root")
                        .value_name("DIR")
                        .required(true)
                        .help("Root directory for content; depot paths are relative to it")
                )
                .arg(
                    Arg::new("local-dir")
                        .long("local-dir")
                        .value_name("DIR")
                        .required(true)
                        .help("Directory with the depot files, relative to the content root")
                )
                .arg(
                    Arg::new("depot-path")
                        .long("depot-path")
                        .value_name("PATH")
                        .help("Relative path in the installed depot (defaults to '.')")
                )
                .arg(
                    Arg::new("branch")
                        .long("branch")
                        .value_name("NAME")
                        .required(true)
                        .help("Set the build live on this branch")
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .required(true)
                        .help("Path to write the manifest to")
                )
                .arg(
                    Arg::new("build-output")
                        .long("build-output")
                        .value_name("DIR")
                        .default_value(DEFAULT_BUILD_OUTPUT)
                        .help("Build cache and log file output directory")
                )
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .value_name("TAGS")
                        .help("';'-separated tags (e.g. #SteamManifest) applied to the manifest")
                )
                .arg(products_arg())
        )
        .subcommand(
            Command::new("deploy")
                .about("Upload a build described by an app manifest with steamcmd")
                .arg(
                    Arg::new("username")
                        .short('u')
                        .long("username")
                        .value_name("NAME")
                        .required(true)
                        .help("Steam username of the build account")
                )
                .arg(
                    Arg::new("manifest")
                        .short('m')
                        .long("manifest")
                        .value_name("FILE")
                        .required(true)
                        .help("Path to the app manifest to upload")
                )
        )
        .subcommand(
            Command::new("publish")
                .about("Run auth, manifest and deploy from a Steam.toml configuration")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Path to Steam.toml or directory containing it")
                )
                .arg(
                    Arg::new("username")
                        .short('u')
                        .long("username")
                        .value_name("NAME")
                        .help("Steam username, overrides the configuration")
                )
                .arg(products_arg())
        )
}

fn string(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

fn path(matches: &ArgMatches, id: &str) -> Option<PathBuf> {
    matches.get_one::<String>(id).map(PathBuf::from)
}

impl Args {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let action = match matches.subcommand() {
            Some(("auth", m)) => Action::Auth {
                env_var: string(m, "env-var"),
            },
            Some(("manifest", m)) => Action::Manifest(ManifestArgs {
                app_id: m.get_one::<u32>("app-id").copied().unwrap_or_default(),
                description: string(m, "description"),
                content_root: PathBuf::from(string(m, "content-root")),
                local_dir: string(m, "local-dir"),
                depot_path: string(m, "depot-path"),
                branch: string(m, "branch"),
                output: PathBuf::from(string(m, "output")),
                build_output: string(m, "build-output"),
                tag: string(m, "tag"),
                products: path(m, "products"),
            }),
            Some(("deploy", m)) => Action::Deploy {
                username: string(m, "username"),
                manifest: PathBuf::from(string(m, "manifest")),
            },
            Some(("publish", m)) => Action::Publish {
                config: path(m, "config"),
                username: m.get_one::<String>("username").cloned(),
                products: path(m, "products"),
            },
            _ => unreachable!("a subcommand is required"),
        };

        Self {
            verbose: matches.get_flag("verbose"),
            sdks_root: path(matches, "sdks-root"),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let matches = command()
            .try_get_matches_from(std::iter::once("steam-deploy").chain(args.iter().copied()))
            .unwrap();
        Args::from_matches(&matches)
    }

    #[test]
    fn test_command_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn test_manifest_defaults() {
        let args = parse(&[
            "manifest", "--app-id", "100", "--content-root", "Staged", "--local-dir", "Win64",
            "--branch", "beta", "-o", "app.vdf",
        ]);
        match args.action {
            Action::Manifest(m) => {
                assert_eq!(m.app_id, 100);
                assert_eq!(m.depot_path, "");
                assert_eq!(m.build_output, DEFAULT_BUILD_OUTPUT);
                assert_eq!(m.tag, "");
                assert!(m.products.is_none());
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["deploy", "-u", "builder", "-m", "app.vdf", "-v", "--sdks-root", "/sdks"]);
        assert!(args.verbose);
        assert_eq!(args.sdks_root, Some(PathBuf::from("/sdks")));
        assert!(matches!(args.action, Action::Deploy { ref username, .. } if username == "builder"));
    }

    #[test]
    fn test_auth_default_variable() {
        let args = parse(&["auth"]);
        assert!(matches!(args.action, Action::Auth { ref env_var } if env_var == DEFAULT_CONFIG_VDF_ENV));
    }
}
