//! Launcher settings.
//!
//! Settings are read from:
//! 1. A YAML settings file
//! 2. Environment variables (with `ALISTAIRE_` prefix)
//!
//! Precedence (highest to lowest): environment, settings file, defaults.
//! The credential itself is never part of the settings; only the location
//! of the secrets file and the key under which the token is stored.

use std::path::{Path, PathBuf};
use std::time::Duration;

use alistaire_hal::{HalResult, PollPolicy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LauncherError, LauncherResult};

/// Complete launcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub terminal: TerminalSettings,

    #[serde(default)]
    pub host: HostSettings,

    #[serde(default)]
    pub files: FileSettings,

    #[serde(default)]
    pub dispatch: DispatchSettings,

    #[serde(default)]
    pub community: CommunitySettings,
}

/// Terminal presentation and connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Renderer name (e.g. "hterm")
    #[serde(default = "default_renderer")]
    pub renderer: String,

    /// Connection type: "mosh" or "ssh"
    #[serde(default = "default_connection")]
    pub connection: String,

    /// Caps key behavior per editor
    #[serde(default = "default_caps_key")]
    pub caps_key: Vec<CapsKeyBinding>,

    #[serde(default = "default_fonts")]
    pub fonts: Vec<String>,

    #[serde(default = "default_themes")]
    pub themes: Vec<String>,

    #[serde(default = "default_true")]
    pub split_view: bool,

    #[serde(default = "default_true")]
    pub cloud_sync: bool,
}

/// What the caps key sends while a given editor is focused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapsKeyBinding {
    pub editor: String,
    pub key: String,
}

impl CapsKeyBinding {
    pub fn new(editor: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            editor: editor.into(),
            key: key.into(),
        }
    }
}

/// Remote host the terminal connects to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSettings {
    #[serde(default = "default_host_address")]
    pub address: String,

    /// Name of the SSH key registered with the terminal
    #[serde(default = "default_host_key")]
    pub key: String,
}

/// Files loaded at launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default = "default_model_file")]
    pub model: PathBuf,

    #[serde(default = "default_data_file")]
    pub data: PathBuf,

    #[serde(default = "default_secrets_file")]
    pub secrets: PathBuf,

    /// Key of the backend token inside the secrets file
    #[serde(default = "default_token_key")]
    pub token_key: String,
}

/// Remote computation dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSettings {
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Result wait timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Base URL of the remote job service
    #[serde(default = "default_service_url")]
    pub service_url: String,

    #[serde(default)]
    pub poll: PollSettings,
}

/// Status polling cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSettings {
    #[serde(default = "default_poll_initial")]
    pub initial_ms: u64,

    #[serde(default = "default_poll_factor")]
    pub factor: u32,

    #[serde(default = "default_poll_max")]
    pub max_ms: u64,
}

/// Community links opened after the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySettings {
    #[serde(default = "default_website")]
    pub website: String,
}

fn default_renderer() -> String {
    "hterm".to_string()
}

fn default_connection() -> String {
    "mosh".to_string()
}

fn default_caps_key() -> Vec<CapsKeyBinding> {
    vec![
        CapsKeyBinding::new("vim", "esc"),
        CapsKeyBinding::new("emacs", "ctrl"),
    ]
}

fn default_fonts() -> Vec<String> {
    vec!["FiraCode".to_string(), "SourceCodePro".to_string()]
}

fn default_themes() -> Vec<String> {
    vec!["Monokai".to_string(), "Solarized Dark".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_host_address() -> String {
    "example.com".to_string()
}

fn default_host_key() -> String {
    "ssh_key_rsa".to_string()
}

fn default_model_file() -> PathBuf {
    PathBuf::from("model.mojo")
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_secrets_file() -> PathBuf {
    PathBuf::from("secrets.json")
}

fn default_token_key() -> String {
    "ibm_api_token".to_string()
}

fn default_backend() -> String {
    "ibmq_qasm_simulator".to_string()
}

fn default_shots() -> u32 {
    1024
}

fn default_timeout() -> u64 {
    300
}

fn default_service_url() -> String {
    "https://jobs.example.com/api/v1".to_string()
}

fn default_poll_initial() -> u64 {
    50
}

fn default_poll_factor() -> u32 {
    2
}

fn default_poll_max() -> u64 {
    2000
}

fn default_website() -> String {
    "https://blink-community.org".to_string()
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            renderer: default_renderer(),
            connection: default_connection(),
            caps_key: default_caps_key(),
            fonts: default_fonts(),
            themes: default_themes(),
            split_view: true,
            cloud_sync: true,
        }
    }
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            address: default_host_address(),
            key: default_host_key(),
        }
    }
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            model: default_model_file(),
            data: default_data_file(),
            secrets: default_secrets_file(),
            token_key: default_token_key(),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            shots: default_shots(),
            timeout_seconds: default_timeout(),
            service_url: default_service_url(),
            poll: PollSettings::default(),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_ms: default_poll_initial(),
            factor: default_poll_factor(),
            max_ms: default_poll_max(),
        }
    }
}

impl Default for CommunitySettings {
    fn default() -> Self {
        Self {
            website: default_website(),
        }
    }
}

impl Settings {
    /// `<config dir>/alistaire/settings.yaml`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("alistaire").join("settings.yaml"))
    }

    /// Load settings from a YAML file. Missing sections take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> LauncherResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| LauncherError::io(path, e))?;
        serde_yaml_ng::from_str(&contents).map_err(|source| LauncherError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings with the following precedence:
    /// 1. Environment variable overrides
    /// 2. `config_file`, or the default settings file when it exists
    /// 3. Defaults
    pub fn load(config_file: Option<&Path>) -> LauncherResult<Self> {
        let settings = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    debug!("Loading settings from {}", path.display());
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };

        let settings = settings.merge_env()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Merge `ALISTAIRE_*` variables from the process environment.
    pub fn merge_env(self) -> LauncherResult<Self> {
        self.merge_env_from(|var| std::env::var(var).ok())
    }

    /// Merge overrides from `lookup`. Absent variables leave fields unchanged.
    pub fn merge_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> LauncherResult<Self> {
        // Terminal
        if let Some(v) = lookup("ALISTAIRE_RENDERER") {
            self.terminal.renderer = v;
        }
        if let Some(v) = lookup("ALISTAIRE_CONNECTION") {
            self.terminal.connection = v;
        }
        if let Some(v) = lookup("ALISTAIRE_SPLIT_VIEW") {
            self.terminal.split_view = parse_var("ALISTAIRE_SPLIT_VIEW", &v)?;
        }
        if let Some(v) = lookup("ALISTAIRE_CLOUD_SYNC") {
            self.terminal.cloud_sync = parse_var("ALISTAIRE_CLOUD_SYNC", &v)?;
        }

        // Host
        if let Some(v) = lookup("ALISTAIRE_HOST") {
            self.host.address = v;
        }
        if let Some(v) = lookup("ALISTAIRE_HOST_KEY") {
            self.host.key = v;
        }

        // Files
        if let Some(v) = lookup("ALISTAIRE_MODEL") {
            self.files.model = PathBuf::from(v);
        }
        if let Some(v) = lookup("ALISTAIRE_DATA") {
            self.files.data = PathBuf::from(v);
        }
        if let Some(v) = lookup("ALISTAIRE_SECRETS") {
            self.files.secrets = PathBuf::from(v);
        }
        if let Some(v) = lookup("ALISTAIRE_TOKEN_KEY") {
            self.files.token_key = v;
        }

        // Dispatch
        if let Some(v) = lookup("ALISTAIRE_BACKEND") {
            self.dispatch.backend = v;
        }
        if let Some(v) = lookup("ALISTAIRE_SHOTS") {
            self.dispatch.shots = parse_var("ALISTAIRE_SHOTS", &v)?;
        }
        if let Some(v) = lookup("ALISTAIRE_TIMEOUT") {
            self.dispatch.timeout_seconds = parse_var("ALISTAIRE_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("ALISTAIRE_SERVICE_URL") {
            self.dispatch.service_url = v;
        }

        Ok(self)
    }

    /// Validate settings values.
    pub fn validate(&self) -> LauncherResult<()> {
        if self.terminal.renderer.trim().is_empty() {
            return Err(LauncherError::Validation("renderer must not be empty".into()));
        }

        match self.terminal.connection.as_str() {
            "mosh" | "ssh" => {}
            other => {
                return Err(LauncherError::Validation(format!(
                    "Unknown connection type: {other}"
                )));
            }
        }

        for binding in &self.terminal.caps_key {
            if binding.editor.trim().is_empty() || binding.key.trim().is_empty() {
                return Err(LauncherError::Validation(
                    "caps key bindings need both an editor and a key".into(),
                ));
            }
        }

        if self.host.address.trim().is_empty() {
            return Err(LauncherError::Validation("host address must not be empty".into()));
        }

        if self.files.token_key.trim().is_empty() {
            return Err(LauncherError::Validation("token_key must not be empty".into()));
        }

        if self.dispatch.backend.trim().is_empty() {
            return Err(LauncherError::Validation("backend must not be empty".into()));
        }

        if self.dispatch.shots == 0 {
            return Err(LauncherError::Validation(
                "shots must be greater than 0".into(),
            ));
        }

        let url = &self.dispatch.service_url;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(LauncherError::Validation(format!(
                "service_url must be an http(s) URL: {url}"
            )));
        }

        self.poll_policy()
            .map_err(|e| LauncherError::Validation(e.to_string()))?;

        Ok(())
    }

    /// Poll policy described by `dispatch.poll`.
    pub fn poll_policy(&self) -> HalResult<PollPolicy> {
        let poll = &self.dispatch.poll;
        PollPolicy::new(
            Duration::from_millis(poll.initial_ms),
            poll.factor,
            Duration::from_millis(poll.max_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch.timeout_seconds)
    }
}

fn parse_var<T: std::str::FromStr>(var: &str, value: &str) -> LauncherResult<T> {
    value.trim().parse().map_err(|_| LauncherError::Env {
        var: var.to_string(),
        value: value.to_string(),
    })
}
