use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wbx_errors::Error;

use crate::{ArtifactKind, ModificationRecord, ModificationSignal, SignalSource};

/// What governs an artifact kind and which outputs must exist to skip it
#[derive(Debug, Clone)]
pub struct GateRule {
    pub source: SignalSource,
    pub artifacts: Vec<PathBuf>,
}

impl GateRule {
    #[must_use]
    pub fn new(source: SignalSource, artifact: impl Into<PathBuf>) -> Self {
        Self {
            source,
            artifacts: vec![artifact.into()],
        }
    }

    #[must_use]
    pub fn with_artifact(mut self, artifact: impl Into<PathBuf>) -> Self {
        self.artifacts.push(artifact.into());
        self
    }
}

/// Skip decisions for the artifact kinds of one build
#[derive(Debug)]
pub struct RebuildGate {
    record: Arc<ModificationRecord>,
    rules: DashMap<ArtifactKind, GateRule>,
    observed: DashMap<ArtifactKind, ModificationSignal>,
}

impl RebuildGate {
    #[must_use]
    pub fn new(record: Arc<ModificationRecord>) -> Self {
        Self {
            record,
            rules: DashMap::new(),
            observed: DashMap::new(),
        }
    }

    /// Gate backed by the process-wide record
    #[must_use]
    pub fn with_global_record() -> Self {
        Self::new(ModificationRecord::global())
    }

    #[must_use]
    pub fn record(&self) -> &Arc<ModificationRecord> {
        &self.record
    }

    /// Register or replace the rule of a kind
    pub fn track(&self, kind: ArtifactKind, rule: GateRule) {
        self.rules.insert(kind, rule);
    }

    /// Whether the work producing `kind` can be skipped.
    ///
    /// Never skips when `force` is set, when no rule is tracked, when the
    /// input cannot be observed or when an artifact is missing. The observed
    /// signal is kept for [`record_success`](Self::record_success).
    ///
    /// # Errors
    ///
    /// Returns an error if an existing input cannot be read.
    pub async fn should_skip(&self, kind: &ArtifactKind, force: bool) -> Result<bool, Error> {
        let Some(rule) = self.rules.get(kind).map(|r| r.value().clone()) else {
            return Ok(false);
        };

        let current = rule.source.observe().await?;
        match &current {
            Some(signal) => {
                self.observed.insert(kind.clone(), signal.clone());
            }
            None => {
                self.observed.remove(kind);
            }
        }

        if force {
            return Ok(false);
        }
        let Some(current) = current else {
            return Ok(false);
        };
        for artifact in &rule.artifacts {
            if !tokio::fs::try_exists(artifact).await.unwrap_or(false) {
                return Ok(false);
            }
        }
        Ok(self.record.get(kind).as_ref() == Some(&current))
    }

    /// Store the signal seen when the gate was consulted for `kind`, or a
    /// fresh observation, as its last successful state.
    ///
    /// # Errors
    ///
    /// Returns an error if a fresh observation fails.
    pub async fn record_success(&self, kind: &ArtifactKind) -> Result<(), Error> {
        let signal = match self.observed.remove(kind) {
            Some((_, signal)) => Some(signal),
            None => match self.rules.get(kind).map(|r| r.source.clone()) {
                Some(source) => source.observe().await?,
                None => None,
            },
        };
        if let Some(signal) = signal {
            self.record.set(kind.clone(), signal);
        }
        Ok(())
    }

    #[must_use]
    pub fn last_success(&self, kind: &ArtifactKind) -> Option<ModificationSignal> {
        self.record.get(kind)
    }

    /// Whether `path` was modified after the last successful build of `kind`.
    /// True when nothing was recorded or the record holds no timestamp.
    pub async fn changed_since_last_success(&self, kind: &ArtifactKind, path: &Path) -> bool {
        let Some(recorded) = self.record.get(kind).and_then(|s| s.timestamp()) else {
            return true;
        };
        match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified > recorded,
            Err(_) => true,
        }
    }

    /// Drop the record of one kind so its next build runs
    pub fn forget(&self, kind: &ArtifactKind) {
        self.record.remove(kind);
        self.observed.remove(kind);
    }

    /// Drop every record
    pub fn clear(&self) {
        self.record.clear();
        self.observed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;
    use wbx_types::BuildVariant;

    fn touch(path: &Path, content: &str, mtime: SystemTime) {
        std::fs::write(path, content).unwrap();
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    fn gate() -> RebuildGate {
        RebuildGate::new(Arc::new(ModificationRecord::new()))
    }

    #[tokio::test]
    async fn skips_only_after_success_with_unchanged_input() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("main.swift");
        let artifact = dir.path().join("app.wasm");
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        touch(&source, "print(1)", t0);
        std::fs::write(&artifact, b"\0asm").unwrap();

        let kind = ArtifactKind::compiled("App", BuildVariant::Debug);
        let gate = gate();
        gate.track(kind.clone(), GateRule::new(SignalSource::File(source.clone()), &artifact));

        assert!(!gate.should_skip(&kind, false).await.unwrap());
        gate.record_success(&kind).await.unwrap();
        assert!(gate.should_skip(&kind, false).await.unwrap());
        assert!(!gate.should_skip(&kind, true).await.unwrap());

        touch(&source, "print(2)", t0 + Duration::from_secs(5));
        assert!(!gate.should_skip(&kind, false).await.unwrap());
    }

    #[tokio::test]
    async fn missing_artifact_never_skips() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("style.scss");
        std::fs::write(&source, "body {}").unwrap();
        let artifact = dir.path().join("out/style.css");

        let gate = gate();
        let kind = ArtifactKind::stylesheet(BuildVariant::Debug);
        gate.track(kind.clone(), GateRule::new(SignalSource::File(source), &artifact));
        gate.should_skip(&kind, false).await.unwrap();
        gate.record_success(&kind).await.unwrap();

        assert!(!gate.should_skip(&kind, false).await.unwrap());
    }

    #[tokio::test]
    async fn kinds_are_independent() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("artifact");
        std::fs::write(&artifact, "x").unwrap();

        let gate = gate();
        let a = ArtifactKind::compiled("App", BuildVariant::Debug);
        let b = ArtifactKind::compiled("Service", BuildVariant::Debug);
        for kind in [&a, &b] {
            gate.track(
                kind.clone(),
                GateRule::new(SignalSource::Version("1.0.0".into()), &artifact),
            );
        }

        gate.should_skip(&a, false).await.unwrap();
        gate.record_success(&a).await.unwrap();

        assert!(gate.should_skip(&a, false).await.unwrap());
        assert!(!gate.should_skip(&b, false).await.unwrap());
    }

    #[tokio::test]
    async fn records_the_signal_seen_at_consultation() {
        let dir = TempDir::new().unwrap();
        let lock = dir.path().join("package.json");
        let artifact = dir.path().join("index.d.ts");
        std::fs::write(&lock, r#"{"version":"0.19.0"}"#).unwrap();
        std::fs::write(&artifact, "").unwrap();

        let gate = gate();
        let kind = ArtifactKind::RUNTIME_PACKAGE;
        gate.track(
            kind.clone(),
            GateRule::new(SignalSource::Content(vec![lock.clone()]), &artifact),
        );
        assert!(!gate.should_skip(&kind, false).await.unwrap());

        // Input changes while the build runs; the next run must rebuild.
        std::fs::write(&lock, r#"{"version":"0.20.0"}"#).unwrap();
        gate.record_success(&kind).await.unwrap();
        assert!(!gate.should_skip(&kind, false).await.unwrap());

        gate.record_success(&kind).await.unwrap();
        assert!(gate.should_skip(&kind, false).await.unwrap());
    }

    #[tokio::test]
    async fn tree_signal_and_changed_files() {
        let dir = TempDir::new().unwrap();
        let web = dir.path().join("WebSources");
        std::fs::create_dir_all(web.join("pages")).unwrap();
        std::fs::create_dir_all(web.join("node_modules/pkg")).unwrap();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000);
        let index = web.join("index.html");
        let about = web.join("pages/about.html");
        touch(&index, "<html>", t0);
        touch(&about, "<html>", t0 - Duration::from_secs(60));
        touch(
            &web.join("node_modules/pkg/readme.html"),
            "<html>",
            t0 + Duration::from_secs(3600),
        );
        touch(&web.join("app.css"), "", t0 + Duration::from_secs(3600));

        let newest = crate::newest_modification(&web, &["html".to_string()])
            .await
            .unwrap();
        assert_eq!(newest, Some(t0));

        let gate = gate();
        let kind = ArtifactKind::document(BuildVariant::Debug);
        gate.track(
            kind.clone(),
            GateRule::new(
                SignalSource::Tree {
                    root: web.clone(),
                    extensions: vec!["html".into()],
                },
                &index,
            ),
        );
        assert!(gate.changed_since_last_success(&kind, &about).await);
        gate.should_skip(&kind, false).await.unwrap();
        gate.record_success(&kind).await.unwrap();

        assert!(!gate.changed_since_last_success(&kind, &about).await);
        touch(&about, "<html lang=\"de\">", t0 + Duration::from_secs(10));
        assert!(gate.changed_since_last_success(&kind, &about).await);

        gate.forget(&kind);
        assert!(gate.last_success(&kind).is_none());
    }

    #[tokio::test]
    async fn unobservable_input_never_skips_or_records() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("artifact");
        std::fs::write(&artifact, "x").unwrap();
        let gate = gate();
        let kind = ArtifactKind::from("custom");
        gate.track(
            kind.clone(),
            GateRule::new(SignalSource::File(dir.path().join("missing")), &artifact),
        );
        assert!(!gate.should_skip(&kind, false).await.unwrap());
        gate.record_success(&kind).await.unwrap();
        assert!(gate.last_success(&kind).is_none());
        assert!(gate.record().is_empty());
    }
}
