//! Fixed file and folder names of a wbx project

/// Project configuration file, looked up in the project root
pub const CONFIG_FILE: &str = "wbx.toml";

/// Extension of the web app manifest written to the output folder
pub const MANIFEST_EXTENSION: &str = "webmanifest";

/// Compiler sub-folder holding checked out package dependencies
pub const CHECKOUTS_DIR: &str = "checkouts";

/// Suffix of the resource bundle folders produced by the compiler
pub const RESOURCES_SUFFIX: &str = ".resources";

/// Folders never walked when looking for web sources
pub const IGNORED_DIRS: &[&str] = &["node_modules", ".git"];
