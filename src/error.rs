use std::path::PathBuf;
use thiserror::Error;

/// Process exit classification reported by `main`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Unknown,
    Configuration,
    InvalidInput,
    SdkNotFound,
    UploadFailed,
    UnknownDeployFailure,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Unknown => 1,
            ExitCode::Configuration => 2,
            ExitCode::InvalidInput => 3,
            ExitCode::SdkNotFound => 10,
            ExitCode::UploadFailed => 11,
            ExitCode::UnknownDeployFailure => 12,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Custom(String),

    #[error("Environment variable {0} not set")]
    MissingEnv(String),

    #[error("Required parameter {0} not set")]
    MissingParameter(&'static str),

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    #[error("ContentRootDir must exist: {0}")]
    ContentRootMissing(PathBuf),

    #[error("Depot local directory must be relative to ContentRootDir, and must exist: {0}")]
    LocalDirInvalid(PathBuf),

    #[error("AppManifest file not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Invalid tag name '{0}': tags must start with '#'")]
    InvalidTag(String),

    #[error("Value for \"{key}\" cannot be written to the manifest: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("Archive entry '{0}' would be extracted outside of the config directory")]
    UnsafeEntry(String),

    #[error("Failed extracting steam configuration: {source}")]
    Extraction {
        #[source]
        source: Box<Error>,
    },

    #[error("SteamCmd is missing from deployment. Check the SDK installation. Searched {0}")]
    SteamCmdMissing(PathBuf),

    #[error("Failed to start {program}: {source}. Check the SDK installation")]
    CommandFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("steamcmd failed with exit code {code}; check the logs in {logs}")]
    UploadFailed { code: String, logs: PathBuf },

    #[error("Invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl Error {
    pub fn custom<T: Into<String>>(msg: T) -> Self {
        Error::Custom(msg.into())
    }

    /// Wrap a failure raised while unpacking the credential bundle
    pub fn extraction(err: impl Into<Error>) -> Self {
        Error::Extraction {
            source: Box::new(err.into()),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::MissingEnv(_)
            | Error::MissingParameter(_)
            | Error::ConfigNotFound(_)
            | Error::TomlDe(_) => ExitCode::Configuration,
            Error::ContentRootMissing(_)
            | Error::LocalDirInvalid(_)
            | Error::ManifestNotFound(_)
            | Error::InvalidTag(_)
            | Error::InvalidValue { .. } => ExitCode::InvalidInput,
            Error::SteamCmdMissing(_) | Error::CommandFailed { .. } => ExitCode::SdkNotFound,
            Error::UploadFailed { .. } => ExitCode::UploadFailed,
            Error::Extraction { .. } => ExitCode::UnknownDeployFailure,
            _ => ExitCode::Unknown,
        }
    }
}
