use crate::error::Error;
use crate::platform::Platform;
use crate::result::Result;
use std::path::{Path, PathBuf};

/// Name of the environment variable pointing at the SDK installation root
pub const SDKS_ROOT_ENV: &str = "UE_SDKS_ROOT";

/// Location of the Steam content builder below the SDK root
const CONTENT_BUILDER_DIR: [&str; 6] = ["HostWin64", "Win64", "steam", "tools", "ContentBuilder", "builder"];

/// Context passed to every task, populated once at startup
#[derive(Clone, Debug)]
pub struct Context {
    /// Enable verbose output (echo steamcmd output)
    pub verbose: bool,

    /// Base directory relative paths are resolved against
    pub base_dir: PathBuf,

    /// SDK installation root, `None` when not configured
    pub sdks_root: Option<PathBuf>,
}

impl Context {
    pub fn new(base_dir: PathBuf, sdks_root: Option<PathBuf>, verbose: bool) -> Self {
        Self {
            verbose,
            base_dir,
            sdks_root: sdks_root.filter(|root| !root.as_os_str().is_empty()),
        }
    }

    /// Resolve `path` against the base directory unless it is already absolute
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Steam content builder directory inside the SDK root
    pub fn content_builder_dir(&self) -> Result<PathBuf> {
        let root = self
            .sdks_root
            .as_ref()
            .ok_or_else(|| Error::MissingEnv(SDKS_ROOT_ENV.to_string()))?;
        Ok(CONTENT_BUILDER_DIR.iter().fold(root.clone(), |dir, part| dir.join(part)))
    }

    pub fn steam_config_dir(&self) -> Result<PathBuf> {
        Ok(self.content_builder_dir()?.join("config"))
    }

    pub fn steam_logs_dir(&self) -> Result<PathBuf> {
        Ok(self.content_builder_dir()?.join("logs"))
    }

    pub fn steamcmd_path(&self) -> Result<PathBuf> {
        Ok(self.content_builder_dir()?.join(Platform::current().steamcmd_name()))
    }
}
