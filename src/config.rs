//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.prreport.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = ".prreport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Locations of the CI artifacts.
    #[serde(default)]
    pub inputs: InputsConfig,

    /// Report output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Pylint thresholds.
    #[serde(default)]
    pub lint: LintConfig,

    /// GitHub settings.
    #[serde(default)]
    pub github: GithubConfig,
}

/// Paths of every artifact, relative to the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsConfig {
    #[serde(default = "default_pylint_report")]
    pub pylint_report: PathBuf,

    #[serde(default = "default_pylint3k_report")]
    pub pylint3k_report: PathBuf,

    #[serde(default = "default_pycodestyle_report")]
    pub pycodestyle_report: PathBuf,

    #[serde(default = "default_unstable_tests")]
    pub unstable_tests: PathBuf,

    /// Baseline (master) xunit tree.
    #[serde(default = "default_base_unit_tests")]
    pub base_unit_tests: PathBuf,

    /// Current (pull request) xunit tree.
    #[serde(default = "default_test_unit_tests")]
    pub test_unit_tests: PathBuf,

    #[serde(default = "default_futurize_dir")]
    pub futurize_dir: PathBuf,

    #[serde(default = "default_functional_dir")]
    pub functional_dir: PathBuf,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            pylint_report: default_pylint_report(),
            pylint3k_report: default_pylint3k_report(),
            pycodestyle_report: default_pycodestyle_report(),
            unstable_tests: default_unstable_tests(),
            base_unit_tests: default_base_unit_tests(),
            test_unit_tests: default_test_unit_tests(),
            futurize_dir: default_futurize_dir(),
            functional_dir: default_functional_dir(),
        }
    }
}

fn default_pylint_report() -> PathBuf {
    PathBuf::from("LatestPylint/pylintReport.json")
}

fn default_pylint3k_report() -> PathBuf {
    PathBuf::from("LatestPylint/pylint3kReport.json")
}

fn default_pycodestyle_report() -> PathBuf {
    PathBuf::from("LatestPylint/pep8.txt")
}

fn default_unstable_tests() -> PathBuf {
    PathBuf::from("UnstableTests.txt")
}

fn default_base_unit_tests() -> PathBuf {
    PathBuf::from("MasterUnitTests")
}

fn default_test_unit_tests() -> PathBuf {
    PathBuf::from("LatestUnitTests")
}

fn default_futurize_dir() -> PathBuf {
    PathBuf::from("LatestFuturize")
}

fn default_functional_dir() -> PathBuf {
    PathBuf::from("CRABSubmitResults")
}

impl InputsConfig {
    /// Resolve every relative path against `base`.
    pub fn rooted_at(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };

        Self {
            pylint_report: join(&self.pylint_report),
            pylint3k_report: join(&self.pylint3k_report),
            pycodestyle_report: join(&self.pycodestyle_report),
            unstable_tests: join(&self.unstable_tests),
            base_unit_tests: join(&self.base_unit_tests),
            test_unit_tests: join(&self.test_unit_tests),
            futurize_dir: join(&self.futurize_dir),
            functional_dir: join(&self.functional_dir),
        }
    }
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the HTML report is written.
    #[serde(default = "default_html")]
    pub html: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html: default_html(),
        }
    }
}

fn default_html() -> PathBuf {
    PathBuf::from("artifacts/PullRequestReport.html")
}

/// Pylint pass/fail thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    /// Warning/error codes that are reported but never fail the build.
    #[serde(default = "default_ok_warnings")]
    pub ok_warnings: Vec<String>,

    /// Any file scoring below this fails.
    #[serde(default = "default_fail_below")]
    pub fail_below: f64,

    /// A file scoring below this fails if its score dropped.
    #[serde(default = "default_regression_below")]
    pub regression_below: f64,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            ok_warnings: default_ok_warnings(),
            fail_below: default_fail_below(),
            regression_below: default_regression_below(),
        }
    }
}

fn default_ok_warnings() -> Vec<String> {
    vec!["0511", "0703", "0613"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_fail_below() -> f64 {
    8.0
}

fn default_regression_below() -> f64 {
    9.0
}

/// GitHub settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Organisation owning the code repository.
    #[serde(default = "default_team")]
    pub team: String,

    /// Code repository name.
    #[serde(default = "default_code_repo")]
    pub code_repo: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            team: default_team(),
            code_repo: default_code_repo(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_team() -> String {
    "dmwm".to_string()
}

fn default_code_repo() -> String {
    "WMCore".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl GithubConfig {
    /// `owner/name` of the code repository.
    pub fn repo_name(&self) -> String {
        format!("{}/{}", self.team, self.code_repo)
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location inside `dir`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default(dir: &Path) -> Result<Option<Self>> {
        let default_path = dir.join(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(&default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and the environment variables backing them) take
    /// precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.output.html = output.clone();
        }
        if let Some(ref team) = args.team {
            self.github.team = team.clone();
        }
        if let Some(ref repo) = args.code_repo {
            self.github.code_repo = repo.clone();
        }
        if let Some(ref api_url) = args.api_url {
            self.github.api_url = api_url.clone();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }

    /// Write the default configuration into `dir`, where
    /// [`load_default`](Self::load_default) looks for it. Refuses to
    /// overwrite an existing file.
    pub fn write_default(dir: &Path) -> Result<PathBuf> {
        let path = dir.join(DEFAULT_CONFIG_FILE);
        if path.exists() {
            anyhow::bail!(
                "{} already exists. Remove it first or edit it manually.",
                path.display()
            );
        }

        std::fs::write(&path, Self::default_toml())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
