//! Build of the vendored JS runtime package checked out by the compiler

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use wbx_errors::{BuildError, Error};
use wbx_events::{BuildEvent, EventEmitter};
use wbx_gate::{ArtifactKind, GateRule, SignalSource};
use wbx_process::QueuedCommand;
use wbx_types::PhaseKind;

use super::exists;
use crate::context::PhaseContext;
use crate::phase::{Phase, PhaseStatus};

/// Step name matched against `[retry] flaky_steps`
const BUILD_STEP: &str = "runtime-build";

pub(crate) struct RuntimePackagePhase;

#[async_trait]
impl Phase for RuntimePackagePhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::RuntimePackage
    }

    fn label(&self) -> String {
        "build runtime package".to_string()
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<PhaseStatus, Error> {
        let runtime = &ctx.config().runtime;
        let checkout = ctx.paths().checkout(&runtime.package);
        if !exists(&checkout).await {
            return Ok(PhaseStatus::Skipped(format!(
                "{} is not checked out",
                runtime.package
            )));
        }

        let marker = checkout.join(&runtime.compiled_marker);
        let modules = checkout.join("node_modules");
        let kind = ArtifactKind::RUNTIME_PACKAGE;
        ctx.gate().track(
            kind.clone(),
            GateRule::new(
                SignalSource::Content(vec![checkout.join("package.json")]),
                &marker,
            )
            .with_artifact(&modules),
        );
        if ctx.gate().should_skip(&kind, ctx.force()).await? {
            return Ok(PhaseStatus::Skipped("runtime package unchanged".to_string()));
        }

        if exists(&modules).await {
            if !exists(&marker).await {
                build_package(ctx, &checkout, &marker).await?;
            }
            check_versions(ctx, &checkout).await?;
        } else {
            install_package(ctx, &checkout, &modules).await?;
            build_package(ctx, &checkout, &marker).await?;
        }

        ctx.ensure_active()?;
        ctx.gate().record_success(&kind).await?;
        Ok(PhaseStatus::Completed)
    }
}

/// Fresh `npm install` in the checkout, dropping a stale lock file first
async fn install_package(ctx: &PhaseContext, checkout: &Path, modules: &Path) -> Result<(), Error> {
    let lock = checkout.join("package-lock.json");
    if let Err(e) = tokio::fs::remove_file(&lock).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            ctx.emit_debug(format!("could not delete {}: {e}", lock.display()));
        }
    }

    let command = npm(ctx, checkout, "runtime-install").arg("install");
    ctx.queues().npm.run_checked(command).await?;
    ctx.ensure_active()?;

    if exists(modules).await {
        Ok(())
    } else {
        Err(BuildError::OutputMissing {
            path: modules.display().to_string(),
            reason: "npm install did not install the runtime's dependencies".to_string(),
        }
        .into())
    }
}

/// `npm run build` in the checkout, attempted once more when the compiled
/// marker is still missing and the step is configured as flaky
async fn build_package(ctx: &PhaseContext, checkout: &Path, marker: &Path) -> Result<(), Error> {
    let max_attempts = if ctx.config().retry.is_flaky(BUILD_STEP) {
        2
    } else {
        1
    };

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            ctx.emit_build(BuildEvent::Retrying {
                session_id: ctx.session_id().to_string(),
                step: BUILD_STEP.to_string(),
                attempt,
                max_attempts,
                reason: format!("{} is missing", marker.display()),
            });
        }
        let command = npm(ctx, checkout, BUILD_STEP).args(["run", "build"]);
        ctx.queues().npm.run_checked(command).await?;
        ctx.ensure_active()?;
        if exists(marker).await {
            return Ok(());
        }
    }

    Err(BuildError::OutputMissing {
        path: marker.display().to_string(),
        reason: "npm run build did not compile the runtime".to_string(),
    }
    .into())
}

/// Keep the runtime copy locked in the web sources at the checkout's version,
/// reinstalling the web dependencies once when they drifted
async fn check_versions(ctx: &PhaseContext, checkout: &Path) -> Result<(), Error> {
    let package = &ctx.config().runtime.package;
    let web_sources = &ctx.paths().web_sources;
    let lock = web_sources.join("package-lock.json");
    if !exists(&lock).await {
        ctx.emit_debug("web sources have no lock file yet, skipping the runtime version check");
        return Ok(());
    }

    let manifest = checkout.join("package.json");
    let versions = read_versions(&lock, &manifest, package).await?;
    if versions.locked == versions.current {
        return Ok(());
    }

    ctx.emit_debug(format!(
        "updating {package} {} to {} in the web sources",
        versions.locked, versions.current
    ));
    let command = npm(ctx, web_sources, "web-install").arg("install");
    ctx.queues().npm.run_checked(command).await?;
    ctx.ensure_active()?;

    let versions = read_versions(&lock, &manifest, package).await?;
    if versions.locked == versions.current {
        Ok(())
    } else {
        Err(BuildError::VersionMismatch {
            package: package.clone(),
            expected: versions.current,
            actual: versions.locked,
        }
        .into())
    }
}

fn npm(ctx: &PhaseContext, dir: &Path, label: &str) -> QueuedCommand {
    QueuedCommand::new(&ctx.config().tools.npm)
        .current_dir(dir)
        .label(label)
}

#[derive(Debug, PartialEq, Eq)]
struct Versions {
    /// Version declared by the checked out package
    current: String,
    /// Version recorded in the web sources' lock file
    locked: String,
}

async fn read_versions(lock: &Path, manifest: &Path, package: &str) -> Result<Versions, Error> {
    let lock_json = read_json(lock).await?;
    let manifest_json = read_json(manifest).await?;
    parse_versions(&lock_json, &manifest_json, package)
}

async fn read_json(path: &Path) -> Result<Value, Error> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;
    serde_json::from_str(&content).map_err(|e| {
        BuildError::Failed {
            message: format!("{} is not valid JSON: {e}", path.display()),
        }
        .into()
    })
}

fn parse_versions(lock: &Value, manifest: &Value, package: &str) -> Result<Versions, Error> {
    let suffix = format!("/{package}");
    let locked: Vec<&Value> = lock
        .get("packages")
        .and_then(Value::as_object)
        .map(|packages| {
            packages
                .iter()
                .filter(|(key, _)| key.ends_with(&suffix))
                .map(|(_, entry)| entry)
                .collect()
        })
        .unwrap_or_default();

    let [entry] = locked.as_slice() else {
        return Err(BuildError::Failed {
            message: format!("{package} is not installed in the web sources"),
        }
        .into());
    };
    let version = |value: &Value| {
        value
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Ok(Versions {
        current: version(manifest),
        locked: version(*entry),
    })
}
