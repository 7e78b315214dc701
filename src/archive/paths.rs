use anyhow::Result;
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ArchivePaths {
    pub dbp_home: PathBuf,
    pub catalog_file: PathBuf,
    pub queue_file: PathBuf,
    pub logs_dir: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn default_home(home: &Path) -> PathBuf {
    home.join(".dbp")
}

pub fn resolve_paths() -> Result<ArchivePaths> {
    let dbp_home = match env::var("DBP_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => default_home(&required_home_dir()?),
    };

    let catalog_file = env_or_default_path("DBP_CATALOG_FILE", dbp_home.join("catalog.json"));
    let queue_file = env_or_default_path(
        "DBP_QUEUE_FILE",
        dbp_home.join("queue").join("process_queue.jsonl"),
    );
    let logs_dir = env_or_default_path("DBP_LOGS_DIR", dbp_home.join("logs"));

    Ok(ArchivePaths {
        dbp_home,
        catalog_file,
        queue_file,
        logs_dir,
    })
}

/// Expand a leading `~` the way a shell would for the input directory.
pub fn expand_user(raw: &Path) -> PathBuf {
    let Ok(rest) = raw.strip_prefix("~") else {
        return raw.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => raw.to_path_buf(),
    }
}

/// Resolve `.`, `..` and symlinks in an absolute path. Components that do
/// not exist yet are kept as written, so a directory about to be created
/// resolves to where it will land.
pub fn resolve_real(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for part in path.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => {
                out.push(other.as_os_str());
                if let Ok(real) = fs::canonicalize(&out) {
                    out = real;
                }
            }
        }
    }
    out
}
