//! Command description consumed by a queue runner

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Program, arguments, working directory and environment overrides of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    label: Option<String>,
}

impl QueuedCommand {
    /// Create a new command
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: BTreeMap::new(),
            label: None,
        }
    }

    /// Add an argument to the command
    #[must_use]
    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments to the command
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    /// Set the working directory for the command
    #[must_use]
    pub fn current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Override one environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Human readable description used in events
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    #[must_use]
    pub fn env_overrides(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Explicit label, or the program's file name
    #[must_use]
    pub fn get_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            Path::new(&self.program)
                .file_name()
                .map_or_else(|| self.program.clone(), |n| n.to_string_lossy().into_owned())
        })
    }
}

impl fmt::Display for QueuedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_defaults_to_program_name() {
        let cmd = QueuedCommand::new("/usr/local/bin/webpack-cli").args(["build", "--env", "development"]);
        assert_eq!(cmd.get_label(), "webpack-cli");
        assert_eq!(
            cmd.to_string(),
            "/usr/local/bin/webpack-cli build --env development"
        );
        assert_eq!(cmd.label("bundle App").get_label(), "bundle App");
    }
}
