use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use wbx_config::ProjectPaths;
use wbx_errors::Error;
use wbx_types::CleanScope;

/// Folders removed for `scope`
pub(crate) fn clean_targets(paths: &ProjectPaths, scope: CleanScope) -> Vec<PathBuf> {
    let build = || vec![paths.build_root.clone()];
    let outputs = || {
        paths
            .outputs()
            .iter()
            .map(|path| path.to_path_buf())
            .collect::<Vec<_>>()
    };
    match scope {
        CleanScope::Build => build(),
        CleanScope::Output => outputs(),
        CleanScope::All => {
            let mut all = build();
            all.extend(outputs());
            all
        }
    }
}

/// Remove each folder, returning the ones that existed
pub(crate) async fn remove_all(targets: Vec<PathBuf>) -> Result<Vec<PathBuf>, Error> {
    let mut removed = Vec::new();
    for path in targets {
        if remove_dir(&path).await? {
            removed.push(path);
        }
    }
    Ok(removed)
}

async fn remove_dir(path: &Path) -> Result<bool, Error> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io_with_path(&e, path)),
    }
}
