use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use wbx_config::constants::IGNORED_DIRS;
use wbx_errors::Error;
use wbx_gate::matches_extension;

/// Files below `root` whose extension is one of `extensions` (any file when
/// empty), sorted. Dependency folders are not entered.
pub(crate) async fn list_files(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, Error> {
    let root = root.to_path_buf();
    let extensions: Vec<String> = extensions.iter().map(ToString::to_string).collect();
    tokio::task::spawn_blocking(move || {
        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .filter_entry(|entry| {
                !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| IGNORED_DIRS.contains(&name))
            })
            .build();

        let mut files: Vec<PathBuf> = walker
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(ignore::DirEntry::into_path)
            .filter(|path| matches_extension(path, &extensions))
            .collect();
        files.sort();
        files
    })
    .await
    .map_err(|e| Error::internal(format!("file walk failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn skips_dependency_folders() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("styles/node_modules/pkg")).unwrap();
        std::fs::write(root.join("styles/app.scss"), "").unwrap();
        std::fs::write(root.join("styles/node_modules/pkg/lib.scss"), "").unwrap();
        std::fs::write(root.join("index.html"), "").unwrap();

        let files = list_files(root, &["scss"]).await.unwrap();
        assert_eq!(files, vec![root.join("styles/app.scss")]);

        let all = list_files(root, &[]).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
