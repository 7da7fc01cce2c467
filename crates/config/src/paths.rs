//! Absolute locations derived from the project root and `[project]`

use crate::constants::CHECKOUTS_DIR;
use crate::sections::ProjectConfig;
use std::path::{Path, PathBuf};
use wbx_types::BuildVariant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub sources: PathBuf,
    pub web_sources: PathBuf,
    pub index: PathBuf,
    pub build_root: PathBuf,
    dev_output: PathBuf,
    dist_output: PathBuf,
}

impl ProjectPaths {
    #[must_use]
    pub fn new(root: &Path, project: &ProjectConfig) -> Self {
        let web_sources = root.join(&project.web_sources);
        Self {
            root: root.to_path_buf(),
            sources: root.join(&project.sources),
            index: web_sources.join(&project.index_file),
            web_sources,
            build_root: root.join(&project.build_path),
            dev_output: root.join(&project.dev_output),
            dist_output: root.join(&project.dist_output),
        }
    }

    /// Public output folder of a variant
    #[must_use]
    pub fn output(&self, variant: BuildVariant) -> &Path {
        match variant {
            BuildVariant::Debug => &self.dev_output,
            BuildVariant::Release => &self.dist_output,
        }
    }

    /// Compiler output directory of a variant
    #[must_use]
    pub fn compiled(&self, variant: BuildVariant) -> PathBuf {
        self.build_root.join(variant.as_str())
    }

    /// Checkout folder of a resolved package dependency
    #[must_use]
    pub fn checkout(&self, package: &str) -> PathBuf {
        self.build_root.join(CHECKOUTS_DIR).join(package)
    }

    /// Both output folders
    #[must_use]
    pub fn outputs(&self) -> [&Path; 2] {
        [&self.dev_output, &self.dist_output]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_variant_folders() {
        let paths = ProjectPaths::new(Path::new("/work/app"), &ProjectConfig::default());
        assert_eq!(paths.index, Path::new("/work/app/WebSources/index.html"));
        assert_eq!(
            paths.output(BuildVariant::Release),
            Path::new("/work/app/DistPublic")
        );
        assert_eq!(
            paths.compiled(BuildVariant::Debug),
            Path::new("/work/app/.build/.wasi/debug")
        );
        assert_eq!(
            paths.checkout("JavaScriptKit"),
            Path::new("/work/app/.build/.wasi/checkouts/JavaScriptKit")
        );
    }
}
