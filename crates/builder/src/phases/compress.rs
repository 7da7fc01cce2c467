use async_trait::async_trait;
use std::path::{Path, PathBuf};
use wbx_errors::{BuildError, Error};
use wbx_events::BuildEvent;
use wbx_process::{ProcessQueue, QueuedCommand};
use wbx_types::PhaseKind;

use crate::context::PhaseContext;
use crate::phase::{Phase, PhaseStatus};
use crate::walk::list_files;

/// Writes `.gz` and `.br` siblings of the output's compressible assets
pub(crate) struct CompressionPhase;

#[async_trait]
impl Phase for CompressionPhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Compression
    }

    fn label(&self) -> String {
        "compress assets".to_string()
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<PhaseStatus, Error> {
        let settings = &ctx.config().compression;
        let extensions: Vec<&str> = settings.extensions.iter().map(String::as_str).collect();
        let assets = list_files(ctx.output_dir(), &extensions).await?;
        if assets.is_empty() {
            return Ok(PhaseStatus::Skipped("no compressible assets".to_string()));
        }

        let tools = &ctx.config().tools;
        let gzip_level = format!("-{}", settings.gzip_level);
        let brotli_level = settings.brotli_level.to_string();
        for asset in &assets {
            ctx.ensure_active()?;
            let gzip = compress(
                &ctx.queues().gzip,
                QueuedCommand::new(&tools.gzip).args([gzip_level.as_str(), "-f", "--keep"]),
                asset,
            );
            let brotli = compress(
                &ctx.queues().brotli,
                QueuedCommand::new(&tools.brotli).args(["-q", brotli_level.as_str(), "-f", "--keep"]),
                asset,
            );
            let (gzip, brotli) = futures::join!(gzip, brotli);
            gzip?;
            brotli?;
            ctx.ensure_active()?;

            let original_bytes = size_of(asset).await?;
            for format in ["gz", "br"] {
                let compressed = sibling(asset, format);
                let Ok(compressed_bytes) = size_of(&compressed).await else {
                    return Err(BuildError::CompressionFailed {
                        path: asset.display().to_string(),
                        message: format!("{} was not written", compressed.display()),
                    }
                    .into());
                };
                ctx.emit_build(BuildEvent::AssetCompressed {
                    session_id: ctx.session_id().to_string(),
                    path: compressed,
                    format: format.to_string(),
                    original_bytes,
                    compressed_bytes,
                });
            }
        }
        Ok(PhaseStatus::Completed)
    }
}

/// Run a compressor on `asset` from inside its folder
async fn compress(queue: &ProcessQueue, command: QueuedCommand, asset: &Path) -> Result<(), Error> {
    let (Some(dir), Some(name)) = (asset.parent(), asset.file_name()) else {
        return Err(Error::internal(format!(
            "cannot compress {}",
            asset.display()
        )));
    };
    let name = name.to_string_lossy();
    let command = command
        .arg(name.as_ref())
        .current_dir(dir)
        .label(format!("{} {name}", queue.name()));
    queue.run_checked(command).await.map(|_| ())
}

fn sibling(asset: &Path, format: &str) -> PathBuf {
    let mut name = asset.as_os_str().to_owned();
    name.push(".");
    name.push(format);
    PathBuf::from(name)
}

async fn size_of(path: &Path) -> Result<u64, Error> {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.len())
        .map_err(|e| Error::io_with_path(&e, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siblings_keep_the_original_extension() {
        assert_eq!(
            sibling(Path::new("/out/app.wasm"), "gz"),
            PathBuf::from("/out/app.wasm.gz")
        );
    }
}
