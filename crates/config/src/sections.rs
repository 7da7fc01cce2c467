//! Configuration sections of `wbx.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wbx_types::DocumentSpec;

/// Project layout and target names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_app_target")]
    pub app_target: String,
    #[serde(default = "default_service_worker_target")]
    pub service_worker_target: String,
    /// Compiled sources watched by the rebuild gate
    #[serde(default = "default_sources")]
    pub sources: PathBuf,
    #[serde(default = "default_web_sources")]
    pub web_sources: PathBuf,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_dev_output")]
    pub dev_output: PathBuf,
    #[serde(default = "default_dist_output")]
    pub dist_output: PathBuf,
    /// Compiler build path, relative to the project root
    #[serde(default = "default_build_path")]
    pub build_path: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            app_target: default_app_target(),
            service_worker_target: default_service_worker_target(),
            sources: default_sources(),
            web_sources: default_web_sources(),
            index_file: default_index_file(),
            dev_output: default_dev_output(),
            dist_output: default_dist_output(),
            build_path: default_build_path(),
        }
    }
}

/// Compiler toolchain invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Compiler driver, a bare name is looked up on `PATH`
    #[serde(default = "default_compiler")]
    pub compiler: String,
    #[serde(default = "default_triple")]
    pub triple: String,
    /// Extra arguments appended to every compile
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            triple: default_triple(),
            extra_args: Vec::new(),
        }
    }
}

/// External tools used by the post-processing phases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_npm")]
    pub npm: String,
    #[serde(default = "default_bundler")]
    pub bundler: String,
    #[serde(default = "default_sass")]
    pub sass: String,
    #[serde(default = "default_gzip")]
    pub gzip: String,
    #[serde(default = "default_brotli")]
    pub brotli: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            npm: default_npm(),
            bundler: default_bundler(),
            sass: default_sass(),
            gzip: default_gzip(),
            brotli: default_brotli(),
        }
    }
}

/// Vendored JS runtime package checked out by the compiler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_runtime_package")]
    pub package: String,
    /// File whose presence proves the runtime was compiled
    #[serde(default = "default_compiled_marker")]
    pub compiled_marker: PathBuf,
    /// Resource folders starting with this prefix belong to the runtime and are not copied
    #[serde(default = "default_resource_prefix")]
    pub resource_prefix: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            package: default_runtime_package(),
            compiled_marker: default_compiled_marker(),
            resource_prefix: default_resource_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependenciesConfig {
    /// Packages that must be checked out after resolution
    #[serde(default = "default_required_dependencies")]
    pub required: Vec<String>,
}

impl Default for DependenciesConfig {
    fn default() -> Self {
        Self {
            required: default_required_dependencies(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Compress debug builds too; release builds are always compressed
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_gzip_level")]
    pub gzip_level: u32,
    #[serde(default = "default_brotli_level")]
    pub brotli_level: u32,
    #[serde(default = "default_compressed_extensions")]
    pub extensions: Vec<String>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            debug: false,
            gzip_level: default_gzip_level(),
            brotli_level: default_brotli_level(),
            extensions: default_compressed_extensions(),
        }
    }
}

/// Steps allowed one extra attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_flaky_steps")]
    pub flaky_steps: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            flaky_steps: default_flaky_steps(),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn is_flaky(&self, step: &str) -> bool {
        self.flaky_steps.iter().any(|s| s == step)
    }
}

/// Web app manifest generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Manifest file stem, written as `<file_name>.webmanifest`
    #[serde(default = "default_manifest_file_name")]
    pub file_name: String,
    /// Command printing the generated manifest JSON on stdout.
    /// `{toolchain}`, `{build_path}` and `{target}` are substituted.
    #[serde(default = "default_manifest_command")]
    pub command: Vec<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            file_name: default_manifest_file_name(),
            command: default_manifest_command(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Attribute marking generator-owned lines
    #[serde(default = "default_managed_attribute")]
    pub managed_attribute: String,
    #[serde(flatten)]
    pub spec: DocumentSpec,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            managed_attribute: default_managed_attribute(),
            spec: DocumentSpec::default(),
        }
    }
}

// Default value functions for serde
fn default_app_target() -> String {
    "App".to_string()
}

fn default_service_worker_target() -> String {
    "Service".to_string()
}

fn default_sources() -> PathBuf {
    PathBuf::from("Sources")
}

fn default_web_sources() -> PathBuf {
    PathBuf::from("WebSources")
}

fn default_index_file() -> String {
    "index.html".to_string()
}

fn default_dev_output() -> PathBuf {
    PathBuf::from("DevPublic")
}

fn default_dist_output() -> PathBuf {
    PathBuf::from("DistPublic")
}

fn default_build_path() -> PathBuf {
    PathBuf::from(".build/.wasi")
}

fn default_compiler() -> String {
    "swift".to_string()
}

fn default_triple() -> String {
    "wasm32-unknown-wasi".to_string()
}

fn default_npm() -> String {
    "npm".to_string()
}

fn default_bundler() -> String {
    "webpack-cli".to_string()
}

fn default_sass() -> String {
    "sass".to_string()
}

fn default_gzip() -> String {
    "gzip".to_string()
}

fn default_brotli() -> String {
    "brotli".to_string()
}

fn default_runtime_package() -> String {
    "JavaScriptKit".to_string()
}

fn default_compiled_marker() -> PathBuf {
    PathBuf::from("Runtime/lib/index.d.ts")
}

fn default_resource_prefix() -> String {
    "JavaScriptKit_JavaScriptKit".to_string()
}

fn default_required_dependencies() -> Vec<String> {
    vec!["JavaScriptKit".to_string()]
}

fn default_gzip_level() -> u32 {
    2
}

fn default_brotli_level() -> u32 {
    11
}

fn default_compressed_extensions() -> Vec<String> {
    vec!["wasm".to_string(), "js".to_string()]
}

fn default_flaky_steps() -> Vec<String> {
    vec!["runtime-build".to_string()]
}

fn default_manifest_file_name() -> String {
    "site".to_string()
}

fn default_manifest_command() -> Vec<String> {
    ["{toolchain}", "run", "--build-path", "{build_path}", "{target}"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_managed_attribute() -> String {
    r#"managed-by="wbx""#.to_string()
}
