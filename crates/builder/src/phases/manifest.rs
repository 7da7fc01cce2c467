use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use wbx_errors::{BuildError, Error};
use wbx_events::EventEmitter;
use wbx_types::PhaseKind;

use crate::context::PhaseContext;
use crate::phase::{Phase, PhaseStatus};

/// Writes the web app manifest of a PWA into the output folder.
///
/// The generated manifest comes from the [`ManifestSource`] collaborator; keys
/// of a static `<file_name>.webmanifest` in the web sources override it.
///
/// [`ManifestSource`]: crate::ManifestSource
pub(crate) struct ManifestPhase;

#[async_trait]
impl Phase for ManifestPhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Manifest
    }

    fn label(&self) -> String {
        "generate manifest".to_string()
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<PhaseStatus, Error> {
        if !ctx.is_pwa() {
            return Ok(PhaseStatus::Skipped("not a progressive web app".to_string()));
        }

        let source = Arc::clone(&ctx.collaborators().manifest);
        let service_worker = &ctx.config().project.service_worker_target;
        let mut manifest = source.generate(ctx, service_worker).await?;
        ctx.ensure_active()?;

        let file_name = ctx.manifest_file_name();
        let overrides = ctx.paths().web_sources.join(&file_name);
        match read_static(&overrides).await {
            Ok(Some(values)) => manifest.extend(values),
            Ok(None) => {}
            Err(message) => ctx.emit_warning_with_context(
                format!("ignoring static manifest {}", overrides.display()),
                message,
            ),
        }

        let text = render(&manifest)?;
        let output = ctx.output_dir();
        tokio::fs::create_dir_all(output)
            .await
            .map_err(|e| Error::io_with_path(&e, output))?;
        ctx.ensure_active()?;
        let path = output.join(file_name);
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;
        Ok(PhaseStatus::Completed)
    }
}

async fn read_static(path: &Path) -> Result<Option<Map<String, Value>>, String> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };
    // Hand-written manifests may carry comments and trailing commas
    match json5::from_str(&content) {
        Ok(Value::Object(values)) => Ok(Some(values)),
        Ok(_) => Err("not a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Tab-indented JSON
fn render(manifest: &Map<String, Value>) -> Result<String, Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    serde::Serialize::serialize(manifest, &mut serializer).map_err(|e| {
        Error::from(BuildError::ManifestFailed {
            message: e.to_string(),
        })
    })?;
    String::from_utf8(out).map_err(|e| Error::internal(e.to_string()))
}
