#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOS,
}

impl Platform {
    /// Get the current platform
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Get platform identifier as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::MacOS => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }

    /// File name of the steamcmd launcher shipped in the content builder
    pub fn steamcmd_name(&self) -> &'static str {
        match self {
            Platform::Windows => "steamcmd.exe",
            Platform::Linux | Platform::MacOS => "steamcmd.sh",
        }
    }
}
