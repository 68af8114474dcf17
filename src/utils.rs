use crate::error::Error;
use crate::result::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default name of the deployment configuration file
pub const CONFIG_FILE_NAME: &str = "Steam.toml";

/// Find the deployment configuration in the current directory or specified path
pub fn find_config(path: Option<&Path>) -> Result<PathBuf> {
    let base_path = match path {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?,
    };

    let config_path = if base_path.is_dir() {
        base_path.join(CONFIG_FILE_NAME)
    } else {
        base_path
    };

    if !config_path.is_file() {
        return Err(Error::ConfigNotFound(config_path.display().to_string()));
    }

    Ok(config_path)
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Ensure the parent directory of `file` exists
pub fn ensure_parent(file: &Path) -> Result<()> {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Delete everything inside `dir`, including read-only entries.
/// The directory itself is kept; a missing directory is not an error.
pub fn clear_dir_contents(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    // Directories must be writable before their children can be unlinked
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            make_writable(&entry)?;
        }
    }

    for entry in WalkDir::new(dir).min_depth(1).contents_first(true) {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type().is_dir() {
            fs::remove_dir(path)?;
        } else {
            make_writable(&entry)?;
            fs::remove_file(path)?;
        }
    }

    Ok(())
}

fn make_writable(entry: &walkdir::DirEntry) -> Result<()> {
    if entry.path_is_symlink() {
        return Ok(());
    }
    let mut perms = entry.metadata()?.permissions();
    if perms.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(entry.path(), perms)?;
    }
    Ok(())
}
