use crate::error::Error;
use crate::result::Result;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Split a `;`-separated tag list into tag names. Every tag must start with `#`.
pub fn parse_tag_list(list: &str) -> Result<Vec<String>> {
    let mut tags = Vec::new();
    for tag in list.split(';').map(str::trim).filter(|t| !t.is_empty()) {
        if tag.len() < 2 || !tag.starts_with('#') {
            return Err(Error::InvalidTag(tag.to_string()));
        }
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    Ok(tags)
}

/// Files produced by tasks, and the tag sets they were published under
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BuildProducts {
    #[serde(default)]
    pub products: BTreeSet<PathBuf>,

    #[serde(default)]
    pub tags: BTreeMap<String, BTreeSet<PathBuf>>,
}

impl BuildProducts {
    /// Load a record from disk; a missing file yields an empty record
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        utils::ensure_parent(path)?;
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Register `file` as a build product and add it to each tag set
    pub fn add(&mut self, file: &Path, tags: &[String]) {
        self.products.insert(file.to_path_buf());
        for tag in tags {
            self.tags
                .entry(tag.clone())
                .or_default()
                .insert(file.to_path_buf());
        }
    }

    pub fn merge(&mut self, other: BuildProducts) {
        self.products.extend(other.products);
        for (tag, files) in other.tags {
            self.tags.entry(tag).or_default().extend(files);
        }
    }
}
