use crate::havoc::MutationMode;
use crate::rng::DEFAULT_SEED;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct EngineSettings {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub mode: MutationMode,
}

pub fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            mode: MutationMode::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    pub input_paths: Option<Vec<PathBuf>>,
    pub replay_log: Option<PathBuf>,
    #[serde(default = "default_dedupe")]
    pub dedupe: bool,
}

pub fn default_iterations() -> u64 {
    1_000
}
pub fn default_threads() -> usize {
    1
}
pub fn default_output_dir() -> PathBuf {
    PathBuf::from("./havoc_out")
}
fn default_dedupe() -> bool {
    true
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            threads: default_threads(),
            output_dir: default_output_dir(),
            input_paths: None,
            replay_log: None,
            dedupe: default_dedupe(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct HavocConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub run: RunSettings,
}

impl HavocConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        Self::from_toml_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
