use crate::context::Context;
use crate::error::Error;
use crate::result::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Default environment variable holding the base64 encoded config bundle
pub const DEFAULT_CONFIG_VDF_ENV: &str = "SteamConfigVdf";

/// Restores the steamcmd `config` directory (authenticated `config.vdf` and
/// friends) from a base64 encoded zip archive stored in an environment variable.
#[derive(Debug, Clone)]
pub struct SteamAuth {
    pub env_var: String,
}

impl Default for SteamAuth {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_VDF_ENV)
    }
}

impl SteamAuth {
    pub fn new<S: Into<String>>(env_var: S) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    /// Extract the bundle named by the process environment
    pub fn execute(&self, ctx: &Context) -> Result<Vec<PathBuf>> {
        self.execute_with(ctx, |name| std::env::var(name).ok())
    }

    /// Extract the bundle, looking the variable up through `lookup`.
    /// Returns the extracted files in archive order.
    pub fn execute_with<F>(&self, ctx: &Context, lookup: F) -> Result<Vec<PathBuf>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_dir = ctx.steam_config_dir()?;

        let encoded = lookup(&self.env_var)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| Error::MissingEnv(self.env_var.clone()))?;

        tracing::info!("Creating steamcmd config from environment variable {}", self.env_var);

        let bytes = decode(&encoded).map_err(Error::extraction)?;
        extract(&bytes, &config_dir).map_err(Error::extraction)
    }
}

fn decode(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(STANDARD.decode(compact)?)
}

fn extract(bytes: &[u8], config_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut extracted = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let relative = entry
            .enclosed_name()
            .ok_or_else(|| Error::UnsafeEntry(entry.name().to_string()))?;
        let output = config_dir.join(relative);
        tracing::info!("Extracting {} to {}", entry.name(), output.display());

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&output)?;
        io::copy(&mut entry, &mut file)?;
        extracted.push(output);
    }

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn bundle(entries: &[(&str, Option<&[u8]>)]) -> String {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, content) in entries {
            match content {
                Some(bytes) => {
                    zip.start_file(*name, options).unwrap();
                    zip.write_all(bytes).unwrap();
                }
                None => zip.add_directory(*name, options).unwrap(),
            }
        }
        STANDARD.encode(zip.finish().unwrap().into_inner())
    }

    fn context(tmp: &TempDir) -> Context {
        Context::new(tmp.path().to_path_buf(), Some(tmp.path().join("sdks")), false)
    }

    fn env(value: String) -> impl Fn(&str) -> Option<String> {
        move |name| (name == DEFAULT_CONFIG_VDF_ENV).then(|| value.clone())
    }

    #[test]
    fn test_extracts_config_vdf() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        let encoded = bundle(&[("config.vdf", Some(b"abc"))]);

        let files = SteamAuth::default().execute_with(&ctx, env(encoded)).unwrap();

        let expected = ctx.steam_config_dir().unwrap().join("config.vdf");
        assert_eq!(files, vec![expected.clone()]);
        assert_eq!(fs::read(expected).unwrap(), b"abc");
    }

    #[test]
    fn test_one_file_per_entry_and_directories_skipped() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        let encoded = bundle(&[
            ("config.vdf", Some(b"one")),
            ("sub/", None),
            ("sub/ssfn123", Some(b"\x00\x01binary")),
            ("loginusers.vdf", Some(b"")),
        ]);

        let files = SteamAuth::default().execute_with(&ctx, env(encoded)).unwrap();
        let config_dir = ctx.steam_config_dir().unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(fs::read(config_dir.join("config.vdf")).unwrap(), b"one");
        assert_eq!(fs::read(config_dir.join("sub/ssfn123")).unwrap(), b"\x00\x01binary");
        assert_eq!(fs::read(config_dir.join("loginusers.vdf")).unwrap(), b"");
        assert!(config_dir.join("sub").is_dir());
    }

    #[test]
    fn test_overwrites_existing_files() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        let config_dir = ctx.steam_config_dir().unwrap();
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.vdf"), "stale contents").unwrap();

        let encoded = bundle(&[("config.vdf", Some(b"fresh"))]);
        SteamAuth::default().execute_with(&ctx, env(encoded)).unwrap();

        assert_eq!(fs::read(config_dir.join("config.vdf")).unwrap(), b"fresh");
    }

    #[test]
    fn test_missing_or_empty_variable_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);

        let unset = SteamAuth::default().execute_with(&ctx, |_| None);
        assert!(matches!(unset, Err(Error::MissingEnv(name)) if name == DEFAULT_CONFIG_VDF_ENV));

        let empty = SteamAuth::default().execute_with(&ctx, env(String::new()));
        assert!(matches!(empty, Err(Error::MissingEnv(_))));

        assert!(!tmp.path().join("sdks").exists());
    }

    #[test]
    fn test_custom_variable_name() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        let encoded = bundle(&[("config.vdf", Some(b"abc"))]);

        let auth = SteamAuth::new("CustomVdf");
        let result = auth.execute_with(&ctx, env(encoded.clone()));
        assert!(matches!(result, Err(Error::MissingEnv(name)) if name == "CustomVdf"));

        let files = auth
            .execute_with(&ctx, move |name| (name == "CustomVdf").then(|| encoded.clone()))
            .unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_whitespace_in_encoded_value_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        let encoded = bundle(&[("config.vdf", Some(b"abc"))]);
        let (head, tail) = encoded.split_at(encoded.len() / 2);

        let files = SteamAuth::default()
            .execute_with(&ctx, env(format!("{}\n  {}\n", head, tail)))
            .unwrap();
        assert_eq!(fs::read(&files[0]).unwrap(), b"abc");
    }

    #[test]
    fn test_malformed_base64_is_wrapped() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);

        let err = SteamAuth::default()
            .execute_with(&ctx, env("not*base64!".to_string()))
            .unwrap_err();
        match err {
            Error::Extraction { source } => assert!(matches!(*source, Error::Base64(_))),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_zip_payload_is_wrapped() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);

        let err = SteamAuth::default()
            .execute_with(&ctx, env(STANDARD.encode(b"definitely not a zip")))
            .unwrap_err();
        match err {
            Error::Extraction { source } => assert!(matches!(*source, Error::Zip(_))),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_entry_escaping_config_dir_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        let encoded = bundle(&[("../../escape.txt", Some(b"x"))]);

        let err = SteamAuth::default().execute_with(&ctx, env(encoded)).unwrap_err();
        match err {
            Error::Extraction { source } => assert!(matches!(*source, Error::UnsafeEntry(_))),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
