use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatestConfig {
    pub glob: String,
    pub outdir_name: String,
    pub force: bool,
    pub delete: bool,
    pub relative_links: bool,
}

impl Default for LatestConfig {
    fn default() -> Self {
        Self {
            glob: "*".to_string(),
            outdir_name: "latest".to_string(),
            force: false,
            delete: false,
            relative_links: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReprocessConfig {
    pub newest_only: bool,
}

impl Default for ReprocessConfig {
    fn default() -> Self {
        Self { newest_only: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DbpConfig {
    pub latest: LatestConfig,
    pub reprocess: ReprocessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialDbpConfig {
    latest: Option<LatestConfig>,
    reprocess: Option<ReprocessConfig>,
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => {
            let trimmed = v.trim();
            match trimmed {
                "1" | "true" | "TRUE" | "yes" | "on" => true,
                "0" | "false" | "FALSE" | "no" | "off" => false,
                _ => fallback,
            }
        }
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &DbpConfig) -> Result<()> {
    if cfg.latest.glob.trim().is_empty() {
        return Err(anyhow!("invalid latest glob: cannot be empty"));
    }
    let name = cfg.latest.outdir_name.trim();
    if name.is_empty() {
        return Err(anyhow!("invalid latest outdir name: cannot be empty"));
    }
    if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
        return Err(anyhow!(
            "invalid latest outdir name `{name}`: must be a single directory name"
        ));
    }
    Ok(())
}

pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("DBP_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".dbp").join("dbp.toml"))
}

fn merge_toml(base: &mut DbpConfig, raw: &str) -> Result<()> {
    let parsed: PartialDbpConfig = toml::from_str(raw)?;
    if let Some(latest) = parsed.latest {
        base.latest = latest;
    }
    if let Some(reprocess) = parsed.reprocess {
        base.reprocess = reprocess;
    }
    Ok(())
}

fn merge_file_config(base: &mut DbpConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    merge_toml(base, &raw)
        .map_err(|err| anyhow!("failed to parse dbp config {}: {err}", path.display()))
}

pub fn load_config() -> Result<DbpConfig> {
    let mut cfg = DbpConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.latest.glob = env_or_string("DBP_LATEST_GLOB", &cfg.latest.glob);
    cfg.latest.outdir_name = env_or_string("DBP_LATEST_OUTDIR_NAME", &cfg.latest.outdir_name);
    cfg.latest.force = env_or_bool("DBP_LATEST_FORCE", cfg.latest.force);
    cfg.latest.delete = env_or_bool("DBP_LATEST_DELETE", cfg.latest.delete);
    cfg.latest.relative_links =
        env_or_bool("DBP_LATEST_RELATIVE_LINKS", cfg.latest.relative_links);
    cfg.reprocess.newest_only =
        env_or_bool("DBP_REPROCESS_NEWEST_ONLY", cfg.reprocess.newest_only);

    validate(&cfg)?;
    Ok(cfg)
}
