use async_trait::async_trait;
use ignore::WalkBuilder;
use std::io;
use std::path::{Path, PathBuf};
use wbx_config::constants::RESOURCES_SUFFIX;
use wbx_errors::{BuildError, Error};
use wbx_events::EventEmitter;
use wbx_types::PhaseKind;

use super::exists;
use crate::context::PhaseContext;
use crate::phase::{Phase, PhaseStatus};

/// Moves the compiler's resource bundles into the output folder.
///
/// The content of every `*.resources` folder lands at the output root,
/// keeping its relative layout; each source file is deleted after copying.
/// Failures on single files are reported as warnings.
pub(crate) struct ResourcesPhase;

#[async_trait]
impl Phase for ResourcesPhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Resources
    }

    fn label(&self) -> String {
        "copy resources".to_string()
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<PhaseStatus, Error> {
        let compiled = ctx.compiled_dir();
        if !exists(&compiled).await {
            return Err(BuildError::OutputMissing {
                path: compiled.display().to_string(),
                reason: "the project has not been compiled".to_string(),
            }
            .into());
        }

        let folders = resource_folders(&compiled, &ctx.config().runtime.resource_prefix).await?;
        let output = ctx.output_dir().to_path_buf();
        let release = ctx.variant().is_release();
        let mut copied = 0usize;

        for folder in folders {
            let listing = list_resources(folder.clone(), release).await?;
            for (path, message) in listing.unreadable {
                ctx.emit_warning_with_context(
                    format!("could not read resource {}", path.display()),
                    message,
                );
            }

            for file in listing.files {
                ctx.ensure_active()?;
                let Ok(relative) = file.strip_prefix(&folder) else {
                    continue;
                };
                let destination = output.join(relative);
                if exists(&destination).await {
                    ctx.emit_debug(format!("overwriting {}", destination.display()));
                }
                match move_file(file.clone(), destination).await {
                    Ok(()) => copied += 1,
                    Err(e) => ctx.emit_warning_with_context(
                        format!("could not copy resource {}", file.display()),
                        e.to_string(),
                    ),
                }
            }
            prune_empty_dirs(folder).await;
        }

        if copied == 0 {
            return Ok(PhaseStatus::Skipped("no bundled resources".to_string()));
        }
        Ok(PhaseStatus::Completed)
    }
}

async fn resource_folders(compiled: &Path, excluded_prefix: &str) -> Result<Vec<PathBuf>, Error> {
    let mut entries = tokio::fs::read_dir(compiled)
        .await
        .map_err(|e| Error::io_with_path(&e, compiled))?;
    let mut folders = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(&e, compiled))?
    {
        let path = entry.path();
        let wanted = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(RESOURCES_SUFFIX) && !name.starts_with(excluded_prefix));
        if wanted {
            folders.push(path);
        }
    }
    folders.sort();
    Ok(folders)
}

/// Files of one resource folder, plus the entries that could not be read
#[derive(Debug, Default)]
struct ResourceListing {
    files: Vec<PathBuf>,
    unreadable: Vec<(PathBuf, String)>,
}

/// Every file below `folder` at any depth. Release builds leave source maps out.
async fn list_resources(folder: PathBuf, release: bool) -> Result<ResourceListing, Error> {
    tokio::task::spawn_blocking(move || {
        let mut listing = ResourceListing::default();
        let walker = WalkBuilder::new(&folder).standard_filters(false).build();
        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_some_and(|t| t.is_file()) => {
                    let path = entry.into_path();
                    if release && is_source_map(&path) {
                        continue;
                    }
                    listing.files.push(path);
                }
                Ok(_) => {}
                Err(e) => listing.unreadable.push((folder.clone(), e.to_string())),
            }
        }
        listing.files.sort();
        listing
    })
    .await
    .map_err(|e| Error::internal(format!("resource walk failed: {e}")))
}

fn is_source_map(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "map")
}

/// Copy `from` over `to`, then delete `from`
async fn move_file(from: PathBuf, to: PathBuf) -> io::Result<()> {
    tokio::task::spawn_blocking(move || {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&from, &to)?;
        std::fs::remove_file(&from)
    })
    .await
    .map_err(io::Error::other)?
}

/// Remove the directories of `root` left empty after moving, deepest first.
/// Folders still holding files that failed to move are kept.
async fn prune_empty_dirs(root: PathBuf) {
    let _ = tokio::task::spawn_blocking(move || {
        let mut dirs: Vec<PathBuf> = WalkBuilder::new(&root)
            .standard_filters(false)
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_dir()))
            .map(ignore::DirEntry::into_path)
            .collect();
        dirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
        for dir in dirs {
            let _ = std::fs::remove_dir(dir);
        }
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn runtime_resources_are_excluded() {
        let dir = TempDir::new().unwrap();
        for name in [
            "App_App.resources",
            "JavaScriptKit_JavaScriptKit.resources",
            "App.wasm",
        ] {
            std::fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        let folders = resource_folders(dir.path(), "JavaScriptKit_JavaScriptKit")
            .await
            .unwrap();
        assert_eq!(folders, vec![dir.path().join("App_App.resources")]);
    }

    #[tokio::test]
    async fn source_maps_are_left_out_at_every_depth_in_release() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("App_App.resources");
        std::fs::create_dir_all(folder.join("js/vendor")).unwrap();
        std::fs::write(folder.join("app.js"), "").unwrap();
        std::fs::write(folder.join("app.js.map"), "").unwrap();
        std::fs::write(folder.join("js/vendor/lib.js"), "").unwrap();
        std::fs::write(folder.join("js/vendor/lib.js.map"), "").unwrap();

        let release = list_resources(folder.clone(), true).await.unwrap();
        assert_eq!(
            release.files,
            vec![folder.join("app.js"), folder.join("js/vendor/lib.js")]
        );
        assert!(release.unreadable.is_empty());

        let debug = list_resources(folder, false).await.unwrap();
        assert_eq!(debug.files.len(), 4);
    }

    #[tokio::test]
    async fn moving_files_keeps_layout_and_prunes_the_source() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("App_App.resources");
        std::fs::create_dir_all(folder.join("images/icons")).unwrap();
        std::fs::write(folder.join("images/icons/a.png"), "a").unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(out.join("images")).unwrap();
        std::fs::write(out.join("images/keep.png"), "k").unwrap();

        for file in list_resources(folder.clone(), false).await.unwrap().files {
            let relative = file.strip_prefix(&folder).unwrap().to_path_buf();
            move_file(file, out.join(relative)).await.unwrap();
        }
        prune_empty_dirs(folder.clone()).await;

        assert_eq!(std::fs::read_to_string(out.join("images/icons/a.png")).unwrap(), "a");
        assert!(out.join("images/keep.png").exists());
        assert!(!folder.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn one_unreadable_file_does_not_stop_its_siblings() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("App_App.resources");
        std::fs::create_dir_all(folder.join("fonts")).unwrap();
        std::fs::write(folder.join("fonts/a.woff"), "a").unwrap();
        let locked = folder.join("fonts/b.woff");
        std::fs::write(&locked, "b").unwrap();
        std::fs::write(folder.join("fonts/c.woff"), "c").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::read(&locked).is_ok() {
            // Running as root; permissions are not enforced
            return;
        }

        let out = dir.path().join("out");
        let mut failed = Vec::new();
        for file in list_resources(folder.clone(), false).await.unwrap().files {
            let relative = file.strip_prefix(&folder).unwrap().to_path_buf();
            if move_file(file.clone(), out.join(relative)).await.is_err() {
                failed.push(file);
            }
        }
        prune_empty_dirs(folder.clone()).await;

        assert_eq!(failed, vec![locked.clone()]);
        assert!(out.join("fonts/a.woff").exists());
        assert!(out.join("fonts/c.woff").exists());
        assert!(locked.exists());
    }
}
