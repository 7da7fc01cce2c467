//! The concrete pipeline phases

mod bundle;
mod compile;
mod compress;
mod document;
mod manifest;
mod resolve;
mod resources;
mod runtime;
mod stylesheet;
mod verify;

pub(crate) use bundle::BundlePhase;
pub(crate) use compile::CompilePhase;
pub(crate) use compress::CompressionPhase;
pub(crate) use document::DocumentPhase;
pub(crate) use manifest::ManifestPhase;
pub(crate) use resolve::ResolvePhase;
pub(crate) use resources::ResourcesPhase;
pub(crate) use runtime::RuntimePackagePhase;
pub(crate) use stylesheet::StylesheetPhase;
pub(crate) use verify::VerifyTargetsPhase;

use std::path::Path;

pub(crate) async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
