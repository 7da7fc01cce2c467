//! Collaborators the pipeline delegates to, with toolchain-backed defaults

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use wbx_errors::{BuildError, Error};
use wbx_process::QueuedCommand;
use wbx_types::{BuildVariant, TargetSet};

use crate::context::PhaseContext;

/// Product that marks an executable target as a service worker
const SERVICE_WORKER_PRODUCT: &str = "ServiceWorker";

/// Dependencies the resolver could not provide
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub missing: Vec<String>,
}

#[async_trait]
pub trait DependencyResolver: Send + Sync {
    /// Resolve package dependencies for one build variant
    async fn resolve(
        &self,
        ctx: &PhaseContext,
        variant: BuildVariant,
    ) -> Result<ResolveReport, Error>;
}

#[async_trait]
pub trait TargetProvider: Send + Sync {
    /// List the executable and service-worker targets of the project
    async fn targets(&self, ctx: &PhaseContext) -> Result<TargetSet, Error>;
}

#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Produce the generated web manifest of `service_worker`
    async fn generate(
        &self,
        ctx: &PhaseContext,
        service_worker: &str,
    ) -> Result<Map<String, Value>, Error>;
}

#[derive(Clone)]
pub(crate) struct Collaborators {
    pub resolver: Arc<dyn DependencyResolver>,
    pub targets: Arc<dyn TargetProvider>,
    pub manifest: Arc<dyn ManifestSource>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            resolver: Arc::new(ToolchainResolver),
            targets: Arc::new(ToolchainTargets),
            manifest: Arc::new(CommandManifestSource),
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Resolves through `<toolchain> package resolve`, then checks that every
/// required dependency has a checkout under the build path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolchainResolver;

#[async_trait]
impl DependencyResolver for ToolchainResolver {
    async fn resolve(
        &self,
        ctx: &PhaseContext,
        variant: BuildVariant,
    ) -> Result<ResolveReport, Error> {
        let config = ctx.config();
        let paths = ctx.paths();
        let command = QueuedCommand::new(&config.toolchain.compiler)
            .args(["package", "--build-path"])
            .arg(paths.build_root.to_string_lossy())
            .arg("resolve")
            .current_dir(&paths.root)
            .label(format!("resolve dependencies ({variant})"));

        ctx.queues()
            .compiler
            .run_checked(command)
            .await
            .map_err(|e| match e {
                Error::Build(BuildError::ToolFailed { stderr, .. }) => {
                    BuildError::ResolveFailed { message: stderr }.into()
                }
                other => other,
            })?;

        let mut missing = Vec::new();
        for name in &config.dependencies.required {
            if !tokio::fs::try_exists(paths.checkout(name))
                .await
                .unwrap_or(false)
            {
                missing.push(name.clone());
            }
        }
        Ok(ResolveReport { missing })
    }
}

/// Reads targets from `<toolchain> package dump-package`
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolchainTargets;

#[async_trait]
impl TargetProvider for ToolchainTargets {
    async fn targets(&self, ctx: &PhaseContext) -> Result<TargetSet, Error> {
        let config = ctx.config();
        let command = QueuedCommand::new(&config.toolchain.compiler)
            .args(["package", "dump-package"])
            .current_dir(&ctx.paths().root)
            .label("dump package");
        let result = ctx.queues().compiler.run_checked(command).await?;
        parse_dump_package(&result.stdout, &config.project.service_worker_target)
    }
}

#[derive(Deserialize)]
struct PackageDump {
    #[serde(default)]
    targets: Vec<TargetDump>,
}

#[derive(Deserialize)]
struct TargetDump {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    dependencies: Vec<Value>,
}

/// Parse a package description into executable and service-worker targets.
///
/// An executable is a service worker when it is named `service_worker` or
/// depends on the `ServiceWorker` product. Service workers are listed among
/// the executables too.
///
/// # Errors
///
/// Returns [`BuildError::InvalidTargetDescription`] if `json` is not a
/// package description.
pub fn parse_dump_package(json: &str, service_worker: &str) -> Result<TargetSet, Error> {
    let dump: PackageDump =
        serde_json::from_str(json).map_err(|e| BuildError::InvalidTargetDescription {
            message: e.to_string(),
        })?;

    let mut set = TargetSet::default();
    for target in dump.targets.into_iter().filter(|t| t.kind == "executable") {
        let is_worker = target.name == service_worker
            || target
                .dependencies
                .iter()
                .any(|dep| dependency_names(dep).contains(&SERVICE_WORKER_PRODUCT));
        if is_worker {
            set.service_workers.push(target.name.clone());
        }
        set.executables.push(target.name);
    }
    Ok(set)
}

/// Names in a dependency entry such as `{"product": ["Name", "pkg", null]}`
/// or `{"byName": ["Name", null]}`
fn dependency_names(dependency: &Value) -> Vec<&str> {
    let Value::Object(entries) = dependency else {
        return Vec::new();
    };
    entries
        .values()
        .filter_map(|value| match value {
            Value::Array(items) => items.first().and_then(Value::as_str),
            Value::String(name) => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

/// Runs the configured `[manifest] command` and reads a JSON object from
/// its standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandManifestSource;

#[async_trait]
impl ManifestSource for CommandManifestSource {
    async fn generate(
        &self,
        ctx: &PhaseContext,
        service_worker: &str,
    ) -> Result<Map<String, Value>, Error> {
        let config = ctx.config();
        let build_path = ctx.paths().build_root.to_string_lossy().into_owned();
        let variant = ctx.variant().to_string();
        let expand = |part: &String| {
            part.replace("{toolchain}", &config.toolchain.compiler)
                .replace("{build_path}", &build_path)
                .replace("{target}", service_worker)
                .replace("{variant}", &variant)
                .replace("{triple}", &config.toolchain.triple)
        };

        let mut parts = config.manifest.command.iter().map(expand);
        let Some(program) = parts.next() else {
            return Err(BuildError::ManifestFailed {
                message: "manifest command is empty".to_string(),
            }
            .into());
        };
        let command = QueuedCommand::new(program)
            .args(parts)
            .current_dir(&ctx.paths().root)
            .label(format!("manifest {service_worker}"));
        let result = ctx.queues().manifest.run_checked(command).await?;
        parse_manifest_output(&result.stdout)
    }
}

/// Extract the JSON object printed by the manifest command, ignoring any
/// log lines around it
fn parse_manifest_output(stdout: &str) -> Result<Map<String, Value>, Error> {
    let failed = |message: String| Error::from(BuildError::ManifestFailed { message });
    let (Some(start), Some(end)) = (stdout.find('{'), stdout.rfind('}')) else {
        return Err(failed("no JSON object in output".to_string()));
    };
    if end < start {
        return Err(failed("no JSON object in output".to_string()));
    }
    match serde_json::from_str(&stdout[start..=end]) {
        Ok(Value::Object(manifest)) => Ok(manifest),
        Ok(_) => Err(failed("output is not a JSON object".to_string())),
        Err(e) => Err(failed(e.to_string())),
    }
}
