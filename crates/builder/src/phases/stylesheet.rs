use async_trait::async_trait;
use std::path::{Path, PathBuf};
use wbx_errors::Error;
use wbx_gate::{ArtifactKind, GateRule, SignalSource};
use wbx_process::QueuedCommand;
use wbx_types::PhaseKind;

use crate::context::PhaseContext;
use crate::phase::{Phase, PhaseStatus};
use crate::walk::list_files;

/// Compiles every non-partial `.scss` entry of the web sources to CSS
pub(crate) struct StylesheetPhase;

#[async_trait]
impl Phase for StylesheetPhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Stylesheet
    }

    fn label(&self) -> String {
        "compile stylesheets".to_string()
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<PhaseStatus, Error> {
        let web_sources = &ctx.paths().web_sources;
        let output = ctx.output_dir();
        let entries: Vec<(PathBuf, PathBuf)> = list_files(web_sources, &["scss"])
            .await?
            .into_iter()
            .filter(|path| !is_partial(path))
            .filter_map(|path| {
                let css = stylesheet_output(&path, web_sources, output)?;
                Some((path, css))
            })
            .collect();
        if entries.is_empty() {
            return Ok(PhaseStatus::Skipped("no stylesheets".to_string()));
        }

        let kind = ArtifactKind::stylesheet(ctx.variant());
        let mut rule = GateRule::new(
            SignalSource::Tree {
                root: web_sources.clone(),
                extensions: vec!["scss".to_string(), "sass".to_string()],
            },
            &entries[0].1,
        );
        for (_, css) in &entries[1..] {
            rule = rule.with_artifact(css);
        }
        ctx.gate().track(kind.clone(), rule);
        if ctx.gate().should_skip(&kind, ctx.force()).await? {
            return Ok(PhaseStatus::Skipped("stylesheets unchanged".to_string()));
        }

        for (source, css) in &entries {
            ctx.ensure_active()?;
            let mut command = QueuedCommand::new(&ctx.config().tools.sass)
                .arg(source.to_string_lossy())
                .arg(css.to_string_lossy());
            if ctx.variant().is_release() {
                command = command.args(["--style=compressed", "--no-source-map"]);
            }
            let command = command
                .current_dir(web_sources)
                .label(format!("sass {}", source.display()));
            ctx.queues().sass.run_checked(command).await?;
        }

        ctx.ensure_active()?;
        ctx.gate().record_success(&kind).await?;
        Ok(PhaseStatus::Completed)
    }
}

/// Partials (`_name.scss`) are only imported by other stylesheets
fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('_'))
}

fn stylesheet_output(source: &Path, web_sources: &Path, output: &Path) -> Option<PathBuf> {
    let relative = source.strip_prefix(web_sources).ok()?;
    Some(output.join(relative).with_extension("css"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_entries_into_the_output_folder() {
        let web = Path::new("/p/WebSources");
        let out = Path::new("/p/DevPublic");
        assert_eq!(
            stylesheet_output(&web.join("styles/main.scss"), web, out),
            Some(out.join("styles/main.css"))
        );
        assert!(is_partial(Path::new("/p/WebSources/styles/_vars.scss")));
        assert!(!is_partial(Path::new("/p/WebSources/styles/main.scss")));
    }
}
