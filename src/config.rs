use crate::cli::CliArgs;
use crate::gateway::{CatalogSource, DEFAULT_CATALOG_URL};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BridgeSettings {
    pub enabled: bool,
    pub program: String,
    pub args: Vec<String>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_bridge_program(),
            args: default_bridge_args(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub source: Option<String>,
    pub catalog: CatalogSource,
    pub bridge: BridgeSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct LabdeckConfigFile {
    #[serde(default, alias = "url")]
    catalog_url: Option<String>,
    #[serde(default)]
    catalog_file: Option<PathBuf>,
    #[serde(default)]
    bridge: Option<BridgeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
struct BridgeSpec {
    #[serde(default = "default_bridge_enabled")]
    enabled: bool,
    #[serde(default, alias = "cmd")]
    program: Option<String>,
    #[serde(default)]
    args: Option<Vec<String>>,
}

impl RuntimeConfig {
    /// Merges CLI flags over the discovered config file over built-in defaults.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let path = args.config.clone().or_else(discover_config_path);
        let (source, parsed) = match path {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                let parsed = parse_config(&raw)
                    .with_context(|| format!("failed to parse config {}", path.display()))?;
                (Some(path.display().to_string()), parsed)
            }
            None => (None, LabdeckConfigFile::default()),
        };

        Ok(Self::merge(source, parsed, args))
    }

    fn merge(source: Option<String>, file: LabdeckConfigFile, args: &CliArgs) -> Self {
        let catalog = if let Some(path) = &args.catalog_file {
            CatalogSource::File(path.clone())
        } else if let Some(url) = &args.catalog_url {
            CatalogSource::Remote(url.clone())
        } else if let Some(path) = file.catalog_file {
            CatalogSource::File(path)
        } else {
            CatalogSource::Remote(
                file.catalog_url
                    .filter(|url| !url.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            )
        };

        let mut bridge = match file.bridge {
            Some(spec) => BridgeSettings {
                enabled: spec.enabled,
                program: spec
                    .program
                    .filter(|program| !program.trim().is_empty())
                    .unwrap_or_else(default_bridge_program),
                args: spec.args.unwrap_or_else(default_bridge_args),
            },
            None => BridgeSettings::default(),
        };
        if args.no_bridge {
            bridge.enabled = false;
        }

        Self {
            source,
            catalog,
            bridge,
        }
    }
}

fn parse_config(raw: &str) -> Result<LabdeckConfigFile> {
    if raw.trim().is_empty() {
        return Ok(LabdeckConfigFile::default());
    }
    serde_yaml::from_str(raw).context("invalid labdeck yaml")
}

fn default_bridge_enabled() -> bool {
    true
}

fn default_bridge_program() -> String {
    if cfg!(windows) {
        "cmd".to_string()
    } else {
        "sh".to_string()
    }
}

fn default_bridge_args() -> Vec<String> {
    if cfg!(windows) {
        vec!["/C".to_string()]
    } else {
        vec!["-c".to_string()]
    }
}

const CONFIG_ENV_VAR: &str = "LABDECK_CONFIG";
const CWD_CONFIG_NAMES: [&str; 3] = ["labdeck.yaml", "labdeck.yml", ".labdeck.yaml"];
const HOME_CONFIG_PATHS: [&str; 3] = [
    ".config/labdeck/config.yaml",
    ".config/labdeck/config.yml",
    ".labdeck.yaml",
];

fn discover_config_path() -> Option<PathBuf> {
    let explicit = std::env::var(CONFIG_ENV_VAR)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from);
    if explicit.is_some() {
        return explicit;
    }

    let home = std::env::var_os("HOME").map(PathBuf::from);
    config_candidates(home.as_deref())
        .into_iter()
        .find(|candidate| candidate.exists())
}

/// Lookup order below the env var: working directory first, then home.
fn config_candidates(home: Option<&Path>) -> Vec<PathBuf> {
    let local = CWD_CONFIG_NAMES.iter().map(PathBuf::from);
    let user = home
        .into_iter()
        .flat_map(|home| HOME_CONFIG_PATHS.iter().map(move |path| home.join(path)));
    local.chain(user).collect()
}
