use std::env;
use std::path::{Path, PathBuf};

use crate::archive::paths::default_home;

/// `.env` files in lookup order: the working directory, then the archive
/// home (`$DBP_HOME` or `~/.dbp`).
fn dotenv_candidates(
    cwd: Option<&Path>,
    dbp_home: Option<&Path>,
    home: Option<&Path>,
) -> Vec<PathBuf> {
    let archive_home = dbp_home
        .map(Path::to_path_buf)
        .or_else(|| home.map(default_home));
    cwd.into_iter()
        .map(Path::to_path_buf)
        .chain(archive_home)
        .map(|dir| dir.join(".env"))
        .collect()
}

/// Load the first `.env` that exists. Variables already set in the
/// environment win over the file.
pub fn load_dotenv() {
    let cwd = env::current_dir().ok();
    let dbp_home = env::var_os("DBP_HOME").map(PathBuf::from);
    let home = dirs::home_dir();
    let candidates = dotenv_candidates(cwd.as_deref(), dbp_home.as_deref(), home.as_deref());

    if let Some(path) = candidates.iter().find(|path| path.is_file()) {
        let _ = dotenvy::from_path(path);
    }
}

#[cfg(test)]
mod tests {
    use super::dotenv_candidates;
    use std::path::{Path, PathBuf};

    #[test]
    fn working_directory_comes_before_archive_home() {
        let got = dotenv_candidates(
            Some(Path::new("/work")),
            Some(Path::new("/archive/dbp")),
            Some(Path::new("/home/alice")),
        );
        assert_eq!(
            got,
            vec![PathBuf::from("/work/.env"), PathBuf::from("/archive/dbp/.env")]
        );
    }

    #[test]
    fn home_default_is_used_without_dbp_home() {
        let got = dotenv_candidates(None, None, Some(Path::new("/home/alice")));
        assert_eq!(got, vec![PathBuf::from("/home/alice/.dbp/.env")]);
    }

    #[test]
    fn no_directories_means_no_candidates() {
        assert!(dotenv_candidates(None, None, None).is_empty());
    }
}
