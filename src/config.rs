use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nucleiview_core::{Severity, SeverityFilter};
use nucleiview_runner::{DecodePolicy, NucleiConfig};

use crate::cli::args::{OutputFormat, ScanArgs};

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct NucleiviewConfig {
    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Settings for the nuclei subprocess
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ScannerConfig {
    /// Path to the nuclei binary
    #[serde(default = "default_scanner_path")]
    pub path: PathBuf,

    /// Timeout in seconds for a whole scan (0 disables it)
    #[serde(default = "default_scanner_timeout")]
    pub timeout_secs: u64,

    /// Handling of invalid UTF-8 in nuclei output: "replace", "ignore" or "strict"
    #[serde(default)]
    pub decode_policy: DecodePolicy,

    /// Parent directory for per-scan temporary output
    pub work_dir: Option<PathBuf>,

    /// Extra arguments passed to nuclei after the standard ones
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Directory to save nuclei execution logs
    pub log_dir: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ScanConfig {
    pub target: Option<String>,

    #[serde(default = "default_severities")]
    pub severities: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_scanner_path() -> PathBuf {
    PathBuf::from("nuclei")
}

fn default_scanner_timeout() -> u64 {
    1800
}

fn default_severities() -> Vec<String> {
    vec!["critical".to_string(), "high".to_string()]
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            path: default_scanner_path(),
            timeout_secs: default_scanner_timeout(),
            decode_policy: DecodePolicy::default(),
            work_dir: None,
            extra_args: Vec::new(),
            log_dir: None,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target: None,
            severities: default_severities(),
        }
    }
}

/// One config file as written: only the keys it sets are `Some`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ConfigLayer {
    pub scanner: ScannerLayer,
    pub scan: ScanLayer,
    pub output: OutputLayer,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ScannerLayer {
    pub path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub decode_policy: Option<DecodePolicy>,
    pub work_dir: Option<PathBuf>,
    pub extra_args: Option<Vec<String>>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ScanLayer {
    pub target: Option<String>,
    pub severities: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct OutputLayer {
    pub format: Option<OutputFormat>,
}

impl ConfigLayer {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl NucleiviewConfig {
    /// Apply every key the layer sets, including ones equal to the defaults.
    pub fn merge(&mut self, layer: &ConfigLayer) {
        let scanner = &layer.scanner;
        if let Some(ref path) = scanner.path {
            self.scanner.path = path.clone();
        }
        if let Some(timeout_secs) = scanner.timeout_secs {
            self.scanner.timeout_secs = timeout_secs;
        }
        if let Some(policy) = scanner.decode_policy {
            self.scanner.decode_policy = policy;
        }
        if let Some(ref work_dir) = scanner.work_dir {
            self.scanner.work_dir = Some(work_dir.clone());
        }
        if let Some(ref extra_args) = scanner.extra_args {
            self.scanner.extra_args = extra_args.clone();
        }
        if let Some(ref log_dir) = scanner.log_dir {
            self.scanner.log_dir = Some(log_dir.clone());
        }

        if let Some(ref target) = layer.scan.target {
            self.scan.target = Some(target.clone());
        }
        if let Some(ref severities) = layer.scan.severities {
            self.scan.severities = severities.clone();
        }

        if let Some(format) = layer.output.format {
            self.output.format = format;
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value in {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid path in {field}: {path} does not exist")]
    InvalidPath { field: String, path: PathBuf },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl NucleiviewConfig {
    pub fn generate_default_config() -> String {
        let default_config = Self::default();
        toml::to_string_pretty(&default_config).unwrap_or_else(|_| {
            r#"# nucleiview configuration file

[scanner]
path = "nuclei"
timeout_secs = 1800
decode_policy = "replace"
extra_args = []
# work_dir = "/var/tmp/nucleiview"
# log_dir = "logs"

[scan]
# target = "https://example.com"
severities = ["critical", "high"]

[output]
format = "table"
"#
            .to_string()
        })
    }

    /// Get the user config file path (~/.config/nucleiview/config.toml)
    pub fn get_user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/nucleiview/config.toml"))
    }

    /// Get the system config file path (/etc/nucleiview/config.toml)
    pub fn get_system_config_path() -> PathBuf {
        PathBuf::from("/etc/nucleiview/config.toml")
    }

    /// Get the current directory config file path (./nucleiview.toml)
    pub fn get_current_config_path() -> PathBuf {
        PathBuf::from("./nucleiview.toml")
    }

    /// Ensure user config file exists, creating it if necessary
    /// Returns the path to the user config file
    pub fn ensure_user_config_exists() -> Result<PathBuf> {
        let user_config_path = Self::get_user_config_path()
            .ok_or_else(|| anyhow!("Could not determine home directory"))?;

        if !user_config_path.exists() {
            if let Some(parent) = user_config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            std::fs::write(&user_config_path, Self::generate_default_config())?;

            tracing::info!("Created user config file at: {}", user_config_path.display());
        }

        Ok(user_config_path)
    }

    /// Load and merge configs from all sources with priority:
    /// 1. User config (~/.config/nucleiview/config.toml) - lowest priority (base)
    /// 2. Current directory (./nucleiview.toml)
    /// 3. System config (/etc/nucleiview/config.toml) - highest priority
    pub fn load_with_merged_configs() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let mut sources = Vec::new();
        if let Some(user_path) = Self::get_user_config_path() {
            sources.push(user_path);
        }
        sources.push(Self::get_current_config_path());
        sources.push(Self::get_system_config_path());

        for path in sources {
            if !path.exists() {
                continue;
            }
            match ConfigLayer::load_from_file(&path) {
                Ok(layer) => {
                    config.merge(&layer);
                    tracing::debug!("Loaded config from: {}", path.display());
                }
                Err(e) => {
                    tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                }
            }
        }

        Ok(config)
    }

    pub fn apply_env_vars(&mut self, env_vars: &HashMap<String, String>) -> Result<()> {
        for (key, value) in env_vars {
            if let Some(config_key) = key.strip_prefix("NUCLEIVIEW_") {
                match config_key {
                    "SCANNER_PATH" => self.scanner.path = PathBuf::from(value),
                    "SCANNER_TIMEOUT_SECS" => {
                        self.scanner.timeout_secs = value
                            .parse()
                            .map_err(|_| anyhow!("Invalid timeout_secs value: {}", value))?;
                    }
                    "SCANNER_DECODE_POLICY" => {
                        self.scanner.decode_policy = value.parse()?;
                    }
                    "SCANNER_WORK_DIR" => self.scanner.work_dir = Some(PathBuf::from(value)),
                    "SCANNER_EXTRA_ARGS" => {
                        self.scanner.extra_args =
                            value.split_whitespace().map(str::to_string).collect();
                    }
                    "SCANNER_LOG_DIR" => self.scanner.log_dir = Some(PathBuf::from(value)),
                    "SCAN_TARGET" => self.scan.target = Some(value.clone()),
                    "SCAN_SEVERITIES" => self.scan.severities = split_list(value),
                    "OUTPUT_FORMAT" => {
                        self.output.format = value
                            .parse()
                            .map_err(|_| anyhow!("Invalid output format value: {}", value))?;
                    }
                    _ => {} // Ignore unknown environment variables
                }
            }
        }
        Ok(())
    }

    pub fn apply_scan_args(&mut self, args: &ScanArgs) -> Result<()> {
        if let Some(ref target) = args.target {
            self.scan.target = Some(target.clone());
        }

        if let Some(ref severity) = args.severity {
            self.scan.severities = split_list(severity);
        }

        if let Some(ref path) = args.nuclei_path {
            self.scanner.path = path.clone();
        }

        if let Some(timeout) = args.timeout {
            self.scanner.timeout_secs = timeout;
        }

        if let Some(policy) = args.decode_policy {
            self.scanner.decode_policy = policy;
        }

        if let Some(ref work_dir) = args.work_dir {
            self.scanner.work_dir = Some(work_dir.clone());
        }

        if let Some(ref log_dir) = args.log_dir {
            self.scanner.log_dir = Some(log_dir.clone());
        }

        if let Some(format) = args.format {
            self.output.format = format;
        }

        Ok(())
    }

    /// Load configuration with full precedence chain:
    /// 1. Default values (lowest)
    /// 2. User config (~/.config/nucleiview/config.toml) - auto-created on first run
    /// 3. Current directory (./nucleiview.toml)
    /// 4. System config (/etc/nucleiview/config.toml) - highest file priority
    /// 5. Environment variables (NUCLEIVIEW_*)
    /// 6. CLI arguments (highest)
    ///
    /// If config_path is explicitly provided, it's loaded and merged after step 4.
    pub fn load_with_precedence(
        config_path: Option<PathBuf>,
        cli_args: &ScanArgs,
        env_vars: &HashMap<String, String>,
    ) -> Result<Self> {
        if let Err(e) = Self::ensure_user_config_exists() {
            tracing::debug!("Could not create user config: {}", e);
        }

        let mut config = Self::load_with_merged_configs().unwrap_or_else(|_| Self::default());

        if let Some(path) = config_path {
            let explicit_layer = ConfigLayer::load_from_file(&path)
                .map_err(|e| anyhow!("Failed to load config file {}: {}", path.display(), e))?;
            config.merge(&explicit_layer);
        }

        config.apply_env_vars(env_vars)?;
        config.apply_scan_args(cli_args)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for severity in &self.scan.severities {
            if let Err(e) = severity.parse::<Severity>() {
                return Err(ConfigError::InvalidValue {
                    field: "scan.severities".to_string(),
                    message: e.to_string(),
                });
            }
        }

        if let Some(ref work_dir) = self.scanner.work_dir {
            if !work_dir.is_dir() {
                return Err(ConfigError::InvalidPath {
                    field: "scanner.work_dir".to_string(),
                    path: work_dir.clone(),
                });
            }
        }

        Ok(())
    }

    /// Severity filter for the next scan.
    pub fn severity_filter(&self) -> Result<SeverityFilter> {
        Ok(SeverityFilter::parse(&self.scan.severities.join(","))?)
    }

    pub fn to_runner_config(&self) -> NucleiConfig {
        let mut config = NucleiConfig::new(self.scanner.path.clone())
            .with_timeout(self.scanner.timeout_secs)
            .with_decode_policy(self.scanner.decode_policy)
            .with_extra_args(self.scanner.extra_args.clone());

        if let Some(ref work_dir) = self.scanner.work_dir {
            config = config.with_work_dir(work_dir.clone());
        }
        if let Some(ref log_dir) = self.scanner.log_dir {
            config = config.with_log_dir(log_dir.clone());
        }
        config
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = NucleiviewConfig::default();
        assert_eq!(config.scanner.path, PathBuf::from("nuclei"));
        assert_eq!(config.scanner.timeout_secs, 1800);
        assert_eq!(config.scanner.decode_policy, DecodePolicy::Replace);
        assert_eq!(config.scan.severities, vec!["critical", "high"]);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert!(config.scan.target.is_none());
    }

    #[test]
    fn test_toml_parsing() {
        let toml_content = r#"
[scanner]
path = "/opt/nuclei/nuclei"
timeout_secs = 60
decode_policy = "strict"
extra_args = ["-rl", "50"]

[scan]
target = "https://example.com"
severities = ["medium"]

[output]
format = "json"
"#;

        let config: NucleiviewConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.scanner.path, PathBuf::from("/opt/nuclei/nuclei"));
        assert_eq!(config.scanner.timeout_secs, 60);
        assert_eq!(config.scanner.decode_policy, DecodePolicy::Strict);
        assert_eq!(config.scanner.extra_args, vec!["-rl", "50"]);
        assert_eq!(config.scan.target, Some("https://example.com".to_string()));
        assert_eq!(config.scan.severities, vec!["medium"]);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_env_var_application() {
        let mut config = NucleiviewConfig::default();
        let mut env_vars = HashMap::new();
        env_vars.insert("NUCLEIVIEW_SCANNER_TIMEOUT_SECS".to_string(), "0".to_string());
        env_vars.insert("NUCLEIVIEW_SCAN_SEVERITIES".to_string(), "low, info".to_string());
        env_vars.insert("NUCLEIVIEW_SCANNER_DECODE_POLICY".to_string(), "ignore".to_string());
        env_vars.insert("NUCLEIVIEW_OUTPUT_FORMAT".to_string(), "json".to_string());
        env_vars.insert("UNRELATED".to_string(), "x".to_string());

        config.apply_env_vars(&env_vars).unwrap();

        assert_eq!(config.scanner.timeout_secs, 0);
        assert_eq!(config.scan.severities, vec!["low", "info"]);
        assert_eq!(config.scanner.decode_policy, DecodePolicy::Ignore);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_env_var_is_rejected() {
        let mut config = NucleiviewConfig::default();
        let mut env_vars = HashMap::new();
        env_vars.insert("NUCLEIVIEW_SCANNER_TIMEOUT_SECS".to_string(), "soon".to_string());
        assert!(config.apply_env_vars(&env_vars).is_err());
    }

    #[test]
    fn test_scan_args_take_precedence() {
        let mut config = NucleiviewConfig::default();
        config.scan.target = Some("https://from-config.example".to_string());

        let args = ScanArgs {
            target: Some("https://from-cli.example".to_string()),
            severity: Some("medium,low".to_string()),
            timeout: Some(30),
            format: Some(OutputFormat::Json),
            ..ScanArgs::default()
        };
        config.apply_scan_args(&args).unwrap();

        assert_eq!(config.scan.target.as_deref(), Some("https://from-cli.example"));
        assert_eq!(config.scan.severities, vec!["medium", "low"]);
        assert_eq!(config.scanner.timeout_secs, 30);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_empty_severity_arg_means_tool_default() {
        let mut config = NucleiviewConfig::default();
        let args = ScanArgs {
            severity: Some(String::new()),
            ..ScanArgs::default()
        };
        config.apply_scan_args(&args).unwrap();

        assert!(config.scan.severities.is_empty());
        assert!(config.severity_filter().unwrap().is_empty());
    }

    #[test]
    fn test_config_file_loading() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[scanner]
timeout_secs = 120

[scan]
target = "https://example.com"
"#
        )
        .unwrap();

        let mut config = NucleiviewConfig::default();
        config.merge(&ConfigLayer::load_from_file(temp_file.path()).unwrap());
        assert_eq!(config.scanner.timeout_secs, 120);
        assert_eq!(config.scan.target, Some("https://example.com".to_string()));
        assert_eq!(config.scan.severities, vec!["critical", "high"]);
    }

    #[test]
    fn test_generate_default_config_round_trips() {
        let config_string = NucleiviewConfig::generate_default_config();
        assert!(config_string.contains("[scanner]"));
        assert!(config_string.contains("timeout_secs = 1800"));

        let parsed: NucleiviewConfig = toml::from_str(&config_string).unwrap();
        assert_eq!(parsed.scan.severities, vec!["critical", "high"]);
        assert_eq!(parsed.scanner.decode_policy, DecodePolicy::Replace);
    }

    #[test]
    fn test_validation() {
        let mut config = NucleiviewConfig::default();
        assert!(config.validate().is_ok());

        config.scan.severities = vec!["high".to_string(), "urgent".to_string()];
        assert!(config.validate().is_err());

        config.scan.severities = vec!["high".to_string()];
        config.scanner.work_dir = Some(PathBuf::from("/nonexistent/nucleiview-work"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_merge_priority() {
        let mut config = NucleiviewConfig::default();

        let user_layer: ConfigLayer = toml::from_str(
            r#"
[scanner]
timeout_secs = 600

[scan]
severities = ["low"]
"#,
        )
        .unwrap();
        config.merge(&user_layer);

        let system_layer: ConfigLayer = toml::from_str(
            r#"
[scanner]
path = "/usr/local/bin/nuclei"
"#,
        )
        .unwrap();
        config.merge(&system_layer);

        assert_eq!(config.scanner.path, PathBuf::from("/usr/local/bin/nuclei"));
        assert_eq!(config.scanner.timeout_secs, 600);
        assert_eq!(config.scan.severities, vec!["low"]);
    }

    #[test]
    fn test_later_layer_can_restore_default_values() {
        let mut user_file = NamedTempFile::new().unwrap();
        writeln!(
            user_file,
            r#"
[scanner]
timeout_secs = 600
decode_policy = "strict"

[scan]
severities = ["low"]

[output]
format = "json"
"#
        )
        .unwrap();

        let mut explicit_file = NamedTempFile::new().unwrap();
        writeln!(
            explicit_file,
            r#"
[scanner]
timeout_secs = 1800
decode_policy = "replace"

[scan]
severities = ["critical", "high"]

[output]
format = "table"
"#
        )
        .unwrap();

        let mut config = NucleiviewConfig::default();
        config.merge(&ConfigLayer::load_from_file(user_file.path()).unwrap());
        assert_eq!(config.scanner.timeout_secs, 600);

        config.merge(&ConfigLayer::load_from_file(explicit_file.path()).unwrap());
        assert_eq!(config.scanner.timeout_secs, 1800);
        assert_eq!(config.scanner.decode_policy, DecodePolicy::Replace);
        assert_eq!(config.scan.severities, vec!["critical", "high"]);
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_layer_without_a_key_keeps_earlier_value() {
        let mut config = NucleiviewConfig::default();
        config.scanner.timeout_secs = 600;

        let layer: ConfigLayer = toml::from_str("[scan]\ntarget = \"https://example.com\"\n").unwrap();
        config.merge(&layer);

        assert_eq!(config.scanner.timeout_secs, 600);
        assert_eq!(config.scan.target.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_layer_rejects_unknown_decode_policy() {
        let result: Result<ConfigLayer, _> = toml::from_str("[scanner]\ndecode_policy = \"lossy\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_to_runner_config() {
        let mut config = NucleiviewConfig::default();
        config.scanner.timeout_secs = 5;
        config.scanner.log_dir = Some(PathBuf::from("logs"));

        let runner_config = config.to_runner_config();
        assert_eq!(runner_config.timeout_secs, 5);
        assert_eq!(runner_config.log_dir, Some(PathBuf::from("logs")));
        assert_eq!(runner_config.nuclei_path, PathBuf::from("nuclei"));
    }

    #[test]
    fn test_get_config_paths() {
        let user_path = NucleiviewConfig::get_user_config_path().unwrap();
        assert!(user_path.ends_with(".config/nucleiview/config.toml"));
        assert_eq!(
            NucleiviewConfig::get_system_config_path(),
            PathBuf::from("/etc/nucleiview/config.toml")
        );
        assert_eq!(
            NucleiviewConfig::get_current_config_path(),
            PathBuf::from("./nucleiview.toml")
        );
    }
}
