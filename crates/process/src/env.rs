//! Environment inherited by every spawned tool

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use wbx_errors::Error;

static GLOBAL: OnceLock<Arc<EnvSnapshot>> = OnceLock::new();

/// Environment captured once per process.
///
/// Inherited variables are overlaid with the `export KEY=VALUE` lines of the
/// user's shell profile, so tool paths configured there are visible even when
/// wbx is started from a non-login shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Process-wide snapshot, captured on first use from `~/.bashrc`
    pub fn global() -> Arc<Self> {
        GLOBAL
            .get_or_init(|| Arc::new(Self::capture(default_profile().as_deref())))
            .clone()
    }

    /// Capture the current process environment plus a profile's exports.
    /// A missing or unreadable profile contributes nothing.
    #[must_use]
    pub fn capture(profile: Option<&Path>) -> Self {
        let mut vars: BTreeMap<String, String> = std::env::vars().collect();
        if let Some(content) = profile.and_then(|p| std::fs::read_to_string(p).ok()) {
            if let Ok(exports) = parse_profile_exports(&content, &vars) {
                vars.extend(exports);
            }
        }
        Self { vars }
    }

    #[must_use]
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Snapshot overlaid with per-command overrides; overrides win
    #[must_use]
    pub fn merged(&self, overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut vars = self.vars.clone();
        vars.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars
    }
}

fn default_profile() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".bashrc"))
}

/// Extract `export KEY=VALUE` assignments from shell profile text.
///
/// `$VAR` and `${VAR}` references are expanded against `inherited` overlaid
/// with the exports parsed so far; unknown names expand to nothing. Values
/// in single quotes are taken literally. Comments and other lines are ignored.
///
/// # Errors
///
/// Returns an error if the assignment pattern fails to compile.
pub fn parse_profile_exports(
    content: &str,
    inherited: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, Error> {
    let export = Regex::new(r"^export\s+([A-Za-z_][A-Za-z0-9_]*)=(.*)$")
        .map_err(|e| Error::internal(format!("invalid export pattern: {e}")))?;
    let reference = Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .map_err(|e| Error::internal(format!("invalid reference pattern: {e}")))?;

    let mut vars = BTreeMap::new();
    for line in content.lines() {
        let Some(caps) = export.captures(line.trim()) else {
            continue;
        };
        let raw = caps[2].trim_end();
        let value = if let Some(literal) = raw.strip_prefix('\'') {
            literal.strip_suffix('\'').unwrap_or(literal).to_string()
        } else {
            let quoted = raw.strip_prefix('"').unwrap_or(raw);
            let quoted = quoted.strip_suffix('"').unwrap_or(quoted);
            reference
                .replace_all(quoted, |r: &regex::Captures<'_>| {
                    let name = r.get(1).or_else(|| r.get(2)).map_or("", |m| m.as_str());
                    vars.get(name)
                        .or_else(|| inherited.get(name))
                        .cloned()
                        .unwrap_or_default()
                })
                .into_owned()
        };
        vars.insert(caps[1].to_string(), value);
    }
    Ok(vars)
}
