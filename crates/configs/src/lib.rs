use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: BackendKind::File, path: default_storage_path() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub serialize_writes: bool,
    #[serde(default)]
    pub secondary_index: bool,
    /// 0 means unbounded
    #[serde(default)]
    pub max_hidden_tabs: usize,
    #[serde(default = "default_blocked_schemes")]
    pub blocked_schemes: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            serialize_writes: false,
            secondary_index: false,
            max_hidden_tabs: 0,
            blocked_schemes: default_blocked_schemes(),
        }
    }
}

fn default_storage_path() -> String { "data/identities.json".into() }
fn default_blocked_schemes() -> Vec<String> {
    vec!["about".into(), "chrome".into(), "moz-extension".into()]
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 环境变量优先于 TOML 中的存储路径
        self.storage.normalize_from_env();
        self.storage.validate()?;
        self.identity.normalize();
        Ok(())
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(path) = std::env::var("IDENTITY_STORAGE_PATH") {
            if !path.trim().is_empty() {
                self.path = path;
            }
        }
        self.path = self.path.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == BackendKind::File && self.path.is_empty() {
            return Err(anyhow!("storage.path is empty; set it in config.toml or IDENTITY_STORAGE_PATH"));
        }
        Ok(())
    }
}

impl IdentityConfig {
    fn normalize(&mut self) {
        let mut schemes: Vec<String> = self
            .blocked_schemes
            .iter()
            .map(|s| s.trim().trim_end_matches(':').to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        schemes.sort();
        schemes.dedup();
        self.blocked_schemes = schemes;
    }

    /// Archive bound as an option, `None` when unbounded.
    pub fn hidden_tabs_limit(&self) -> Option<usize> {
        (self.max_hidden_tabs > 0).then_some(self.max_hidden_tabs)
    }
}
