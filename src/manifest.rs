use crate::context::Context;
use crate::error::Error;
use crate::products::{self, BuildProducts};
use crate::result::Result;
use crate::utils;
use crate::vdf::{Block, Document};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Default build cache and log output directory used by steamcmd
pub const DEFAULT_BUILD_OUTPUT: &str = "BuildOutput";

/// Parameters of a Steam app build manifest with a single depot
#[derive(Debug, Clone)]
pub struct AppManifest {
    /// Steam AppId; the depot id is `app_id + 1`
    pub app_id: u32,

    /// Description shown in the Steamworks build database
    pub description: String,

    /// Root directory for content, depot paths are relative to it
    pub content_root: PathBuf,

    /// Directory, relative to `content_root`, holding the depot files
    pub depot_local_dir: String,

    /// Relative path inside the installed depot; empty means `.`
    pub depot_path: String,

    /// Branch the build is set live on
    pub release_branch: String,

    /// Path the manifest is written to
    pub output: PathBuf,

    /// Build cache and log output directory
    pub build_output: String,

    /// `;`-separated tags applied to the written manifest
    pub tag: String,
}

impl AppManifest {
    pub fn depot_id(&self) -> Result<u32> {
        self.app_id
            .checked_add(1)
            .ok_or_else(|| Error::custom(format!("AppId {} leaves no room for a depot id", self.app_id)))
    }

    fn depot_path_or_root(&self) -> &str {
        if self.depot_path.is_empty() { "." } else { &self.depot_path }
    }

    fn local_path(&self) -> String {
        format!("{}/*", self.depot_local_dir.trim_end_matches(['/', '\\']))
    }

    /// Build the `AppBuild` document for the given resolved content root
    pub fn document(&self, content_root: &Path) -> Result<Document> {
        let file_mapping = Block::new()
            .string("LocalPath", self.local_path())
            .string("DepotPath", self.depot_path_or_root())
            .string("Recursive", "1");

        let depots = Block::new().block(
            self.depot_id()?.to_string(),
            Block::new().block("FileMapping", file_mapping),
        );

        let root = Block::new()
            .string("AppID", self.app_id.to_string())
            .string("Desc", self.description.as_str())
            .string("SetLive", self.release_branch.as_str())
            .string("ContentRoot", content_root.display().to_string())
            .string("BuildOutput", self.build_output.as_str())
            .block("Depots", depots);

        Ok(Document::new("AppBuild", root))
    }

    /// Validate the content layout, write the manifest and report it as a build product
    pub fn execute(&self, ctx: &Context) -> Result<BuildProducts> {
        if self.output.as_os_str().is_empty() {
            return Err(Error::MissingParameter("ManifestOutputFile"));
        }
        if self.depot_local_dir.is_empty() {
            return Err(Error::MissingParameter("Depot1LocalDir"));
        }
        let tags = products::parse_tag_list(&self.tag)?;

        let content_root = ctx.resolve(&self.content_root);
        if !content_root.is_dir() {
            return Err(Error::ContentRootMissing(content_root));
        }
        validate_local_dir(&content_root, &self.depot_local_dir)?;

        if self.depot_path.is_empty() {
            tracing::info!("Depot path not set. Defaulting to root directory ('.')");
        }

        let text = self.document(&content_root)?.render()?;

        let output = ctx.resolve(&self.output);
        utils::ensure_parent(&output)?;
        fs::write(&output, text)?;
        tracing::info!("Wrote app manifest for AppID {} to {}", self.app_id, output.display());

        let mut record = BuildProducts::default();
        record.add(&output, &tags);
        Ok(record)
    }
}

fn validate_local_dir(content_root: &Path, local_dir: &str) -> Result<()> {
    let relative = Path::new(local_dir);
    let invalid = || Error::LocalDirInvalid(content_root.join(relative));

    if relative
        .components()
        .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(invalid());
    }

    let local = content_root.join(relative);
    if !local.is_dir() {
        return Err(invalid());
    }

    let root = fs::canonicalize(content_root)?;
    if !fs::canonicalize(&local)?.starts_with(&root) {
        return Err(invalid());
    }

    Ok(())
}
