use crate::auth::{DEFAULT_CONFIG_VDF_ENV, SteamAuth};
use crate::deploy::DeployBuild;
use crate::error::Error;
use crate::manifest::{AppManifest, DEFAULT_BUILD_OUTPUT};
use crate::platform::Platform;
use crate::result::Result;
use crate::tpl::Tpl;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of a `Steam.toml` deployment configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeployConfigFile {
    #[serde(default)]
    pub steam: SteamSection,
    pub app: AppSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SteamSection {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub config_vdf_env: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AppSection {
    pub app_id: u32,

    #[serde(default)]
    pub description: Option<String>,

    pub content_root: String,

    pub depot_local_dir: String,

    #[serde(default)]
    pub depot_path: Option<String>,

    pub release_branch: String,

    pub manifest_output: String,

    #[serde(default)]
    pub build_output: Option<String>,

    #[serde(default)]
    pub tag: Option<String>,
}

/// Parsed and template-expanded deployment configuration
#[derive(Debug)]
pub struct DeployConfig {
    pub auth: SteamAuth,
    pub manifest: AppManifest,
    pub username: Option<String>,
}

impl DeployConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: DeployConfigFile = toml::from_str(content)?;
        let app = file.app;

        let mut tpl = Tpl::new();
        tpl.register("APPID", app.app_id.to_string());
        tpl.register("BRANCH", app.release_branch.as_str());
        tpl.register("PLATFORM", Platform::current().as_str());

        let manifest = AppManifest {
            app_id: app.app_id,
            description: app.description.map(|d| tpl.parse(&d)).unwrap_or_default(),
            content_root: PathBuf::from(tpl.parse(&app.content_root)),
            depot_local_dir: tpl.parse(&app.depot_local_dir),
            depot_path: app.depot_path.map(|p| tpl.parse(&p)).unwrap_or_default(),
            release_branch: app.release_branch.clone(),
            output: PathBuf::from(tpl.parse(&app.manifest_output)),
            build_output: app
                .build_output
                .map(|b| tpl.parse(&b))
                .unwrap_or_else(|| DEFAULT_BUILD_OUTPUT.to_string()),
            tag: app.tag.unwrap_or_default(),
        };

        let auth = SteamAuth::new(
            file.steam
                .config_vdf_env
                .unwrap_or_else(|| DEFAULT_CONFIG_VDF_ENV.to_string()),
        );

        Ok(DeployConfig {
            auth,
            manifest,
            username: file.steam.username,
        })
    }

    /// Upload request for the configured manifest, using `username` when given
    pub fn deploy(&self, username: Option<String>) -> Result<DeployBuild> {
        let username = username
            .or_else(|| self.username.clone())
            .ok_or(Error::MissingParameter("Username"))?;
        DeployBuild::new(username, &self.manifest.output)
    }
}
