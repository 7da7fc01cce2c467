use async_trait::async_trait;
use std::path::Path;
use wbx_errors::Error;
use wbx_events::{AppEvent, DocumentEvent, EventEmitter};
use wbx_gate::{ArtifactKind, GateRule, SignalSource};
use wbx_merge::{merge_document, publish_document, Fragments};
use wbx_types::PhaseKind;

use super::exists;
use crate::context::PhaseContext;
use crate::phase::{Phase, PhaseStatus};
use crate::walk::list_files;

/// Merges the managed regions into the entry document, then publishes the
/// web documents to the output folder with variant attributes resolved.
pub(crate) struct DocumentPhase;

#[async_trait]
impl Phase for DocumentPhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Document
    }

    fn label(&self) -> String {
        "merge documents".to_string()
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<PhaseStatus, Error> {
        let fragments = fragments(ctx)?;
        let index = &ctx.paths().index;
        let report = merge_document(index, &fragments).await?;
        if report.generated {
            ctx.emit(AppEvent::Document(DocumentEvent::Generated {
                path: index.clone(),
            }));
        } else {
            ctx.emit(AppEvent::Document(DocumentEvent::Merged {
                path: index.clone(),
                replaced: report.replaced,
                inserted: report.inserted,
                dropped: report.dropped,
                written: report.changed,
            }));
        }
        ctx.ensure_active()?;

        let web_sources = &ctx.paths().web_sources;
        let output = ctx.output_dir();
        let published_index = output.join(&ctx.config().project.index_file);
        let kind = ArtifactKind::document(ctx.variant());
        // Consulted after the merge so the merge's own write counts as input
        ctx.gate().track(
            kind.clone(),
            GateRule::new(
                SignalSource::Tree {
                    root: web_sources.clone(),
                    extensions: vec!["html".to_string()],
                },
                &published_index,
            ),
        );
        if ctx.gate().should_skip(&kind, ctx.force()).await? {
            return Ok(PhaseStatus::Skipped("web documents unchanged".to_string()));
        }

        let marker = fragments.marker();
        for source in list_files(web_sources, &["html"]).await? {
            ctx.ensure_active()?;
            let Ok(relative) = source.strip_prefix(web_sources) else {
                continue;
            };
            let destination = output.join(relative);
            let stale = ctx.force()
                || !exists(&destination).await
                || ctx.gate().changed_since_last_success(&kind, &source).await;
            if !stale {
                continue;
            }

            let entry = source == *index;
            match publish_document(&source, &destination, ctx.variant(), marker, entry).await {
                Ok(()) => ctx.emit(AppEvent::Document(DocumentEvent::VariantResolved {
                    source: source.clone(),
                    destination,
                })),
                Err(e) if entry => return Err(e.into()),
                Err(e) => ctx.emit_warning_with_context(
                    format!("could not publish {}", display_relative(&source, web_sources)),
                    e.to_string(),
                ),
            }
        }

        ctx.ensure_active()?;
        ctx.gate().record_success(&kind).await?;
        Ok(PhaseStatus::Completed)
    }
}

fn fragments(ctx: &PhaseContext) -> Result<Fragments, Error> {
    let document = &ctx.config().document;
    let mut fragments = Fragments::new(&document.spec, document.managed_attribute.as_str())?
        .with_app_script(&ctx.config().project.app_target);
    if ctx.is_pwa() {
        fragments = fragments.with_manifest(format!("./{}", ctx.manifest_file_name()));
    }
    Ok(fragments)
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
