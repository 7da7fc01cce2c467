//! End-to-end builds against shell-script stand-ins for the external tools

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use wbx_builder::{BuildController, BuildOutcome};
use wbx_config::Config;
use wbx_errors::{BuildError, Error};
use wbx_events::{AppEvent, BuildEvent, GeneralEvent};
use wbx_gate::{ModificationRecord, RebuildGate};
use wbx_process::EnvSnapshot;
use wbx_types::{AbortHandler, BuildRequest, BuildVariant, CleanScope, PhaseKind};

const MARKER: &str = r#"managed-by="wbx""#;

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let project = Self {
            dir: TempDir::new().unwrap(),
        };
        let root = project.root();
        std::fs::create_dir_all(root.join("Sources/App")).unwrap();
        std::fs::write(root.join("Sources/App/main.swift"), "print(1)\n").unwrap();
        std::fs::create_dir_all(root.join("WebSources/styles")).unwrap();
        std::fs::write(root.join("WebSources/styles/main.scss"), "body { margin: 0 }\n").unwrap();
        std::fs::write(root.join("WebSources/styles/_vars.scss"), "$x: 1;\n").unwrap();
        std::fs::create_dir_all(root.join("tools")).unwrap();
        project.write_tools(false);
        project
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn log(&self) -> PathBuf {
        self.root().join("tools.log")
    }

    fn tool(&self, name: &str) -> String {
        self.root().join("tools").join(name).display().to_string()
    }

    fn calls(&self, prefix: &str) -> usize {
        std::fs::read_to_string(self.log())
            .unwrap_or_default()
            .lines()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    fn write_tools(&self, flaky_runtime: bool) {
        let log = self.log().display().to_string();
        let slow = self.root().join("slow").display().to_string();
        let runtime_build = if flaky_runtime {
            "if [ -f .attempted ]; then mkdir -p Runtime/lib && touch Runtime/lib/index.d.ts; else touch .attempted; fi"
        } else {
            "mkdir -p Runtime/lib && touch Runtime/lib/index.d.ts"
        };

        self.script(
            "swift",
            &format!(
                r#"echo "swift $*" >> "{log}"
case "$1" in
  package)
    case "$2" in
      dump-package)
        echo '{{"targets": [{{"name": "App", "type": "executable", "dependencies": []}}, {{"name": "Service", "type": "executable", "dependencies": [{{"product": ["ServiceWorker", "web", null, null]}}]}}]}}'
        ;;
      *)
        mkdir -p "$3/checkouts/JavaScriptKit"
        echo '{{"name": "javascript-kit", "version": "0.19.2"}}' > "$3/checkouts/JavaScriptKit/package.json"
        ;;
    esac
    ;;
  build)
    if [ -f "{slow}" ]; then exec sleep 30; fi
    mkdir -p "$7/$3/App_App.resources"
    echo wasm > "$7/$3/$5.wasm"
    echo icon > "$7/$3/App_App.resources/icon.png"
    ;;
  run)
    echo "Compiling manifest..."
    echo '{{"name": "Site", "short_name": "Site", "display": "standalone"}}'
    ;;
esac
"#
            ),
        );
        self.script(
            "npm",
            &format!(
                r#"echo "npm $*" >> "{log}"
case "$1" in
  install) mkdir -p node_modules ;;
  run) {runtime_build} ;;
esac
"#
            ),
        );
        self.script(
            "webpack-cli",
            &format!(
                r#"echo "webpack $*" >> "{log}"
for arg in "$@"; do
  case "$arg" in
    app.target=*) target="${{arg#app.target=}}" ;;
    app.absoluteOutputPath=*) out="${{arg#app.absoluteOutputPath=}}" ;;
  esac
done
mkdir -p "$out"
echo bundle > "$out/$(echo "$target" | tr 'A-Z' 'a-z').js"
"#
            ),
        );
        self.script(
            "sass",
            &format!(
                r#"echo "sass $*" >> "{log}"
mkdir -p "$(dirname "$2")"
cp "$1" "$2"
"#
            ),
        );
        self.script(
            "gzip",
            &format!(
                r#"echo "gzip $*" >> "{log}"
cp "$4" "$4.gz"
"#
            ),
        );
        self.script(
            "brotli",
            &format!(
                r#"echo "brotli $*" >> "{log}"
cp "$5" "$5.br"
"#
            ),
        );
    }

    fn script(&self, name: &str, body: &str) {
        let path = self.root().join("tools").join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn config(&self) -> Config {
        let mut config = Config::default();
        config.toolchain.compiler = self.tool("swift");
        config.tools.npm = self.tool("npm");
        config.tools.bundler = self.tool("webpack-cli");
        config.tools.sass = self.tool("sass");
        config.tools.gzip = self.tool("gzip");
        config.tools.brotli = self.tool("brotli");
        config
    }

    fn controller(&self) -> BuildController {
        self.controller_with(self.config())
    }

    fn controller_with(&self, config: Config) -> BuildController {
        BuildController::new(config, self.root())
            .with_gate(Arc::new(RebuildGate::new(Arc::new(ModificationRecord::new()))))
            .with_env(Arc::new(EnvSnapshot::from_vars(std::env::vars())))
    }

    async fn wait_for_call(&self, prefix: &str) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while self.calls(prefix) == 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("tool was never invoked");
    }
}

/// Write `content` with a modification time `ahead` in the future
fn edit(path: &Path, content: &str, ahead: Duration) {
    std::fs::write(path, content).unwrap();
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() + ahead)
        .unwrap();
}

fn debug() -> BuildRequest {
    BuildRequest::new(BuildVariant::Debug)
}

fn assert_succeeded(outcome: &BuildOutcome) {
    assert!(outcome.is_success(), "build did not succeed: {outcome:?}");
}

#[tokio::test]
async fn fresh_build_produces_output_and_managed_document() {
    let project = Project::new();
    let controller = project.controller();

    let outcome = controller.start(debug()).await;
    assert_succeeded(&outcome);

    let out = project.root().join("DevPublic");
    assert!(out.join("site.webmanifest").exists());
    assert!(out.join("app.js").exists());
    assert!(out.join("service.js").exists());
    assert!(out.join("icon.png").exists());
    assert!(out.join("styles/main.css").exists());
    assert!(!out.join("styles/_vars.css").exists());

    let manifest = std::fs::read_to_string(out.join("site.webmanifest")).unwrap();
    assert!(manifest.contains("\t\"name\": \"Site\""));

    let index = std::fs::read_to_string(project.root().join("WebSources/index.html")).unwrap();
    let app_scripts: Vec<&str> = index
        .lines()
        .filter(|line| line.contains(r#"name="app""#))
        .collect();
    assert_eq!(app_scripts.len(), 1);
    assert!(app_scripts[0].contains(MARKER));
    assert!(index.contains(r#"href="./site.webmanifest""#));

    let published = std::fs::read_to_string(out.join("index.html")).unwrap();
    assert!(!published.contains(MARKER));

    assert_eq!(project.calls("swift build"), 2);
    assert_eq!(project.calls("npm install"), 1);
    assert_eq!(project.calls("npm run build"), 1);
}

#[tokio::test]
async fn unchanged_rebuild_skips_compilation() {
    let project = Project::new();
    let controller = project.controller();
    assert_succeeded(&controller.start(debug()).await);

    let outcome = controller.start(debug()).await;
    let BuildOutcome::Succeeded { skipped, .. } = outcome else {
        panic!("second build did not succeed: {outcome:?}");
    };
    assert!(skipped.contains(&"compile App".to_string()));
    assert!(skipped.contains(&"compile Service".to_string()));
    assert!(skipped.contains(&"build runtime package".to_string()));
    assert_eq!(project.calls("swift build"), 2);
    assert_eq!(project.calls("npm"), 2);

    // Forcing ignores the gate
    assert_succeeded(&controller.start(debug().with_force(true)).await);
    assert_eq!(project.calls("swift build"), 4);
}

#[tokio::test]
async fn abort_kills_the_compiler_and_a_later_build_recovers() {
    let project = Project::new();
    std::fs::write(project.root().join("slow"), "").unwrap();
    let controller = Arc::new(project.controller());

    let abort = AbortHandler::new();
    let running = {
        let controller = Arc::clone(&controller);
        let request = debug().with_abort(abort.clone());
        tokio::spawn(async move { controller.start(request).await })
    };
    project.wait_for_call("swift build").await;
    assert!(controller.is_running());
    abort.abort();

    let outcome = tokio::time::timeout(Duration::from_secs(10), running)
        .await
        .expect("aborted build did not unwind")
        .unwrap();
    assert!(matches!(outcome, BuildOutcome::Aborted), "{outcome:?}");
    assert!(!controller.is_running());
    assert!(!project.root().join("DevPublic/site.webmanifest").exists());

    std::fs::remove_file(project.root().join("slow")).unwrap();
    assert_succeeded(&controller.start(debug()).await);
    assert!(project.root().join("DevPublic/site.webmanifest").exists());
}

#[tokio::test]
async fn concurrent_request_is_rejected() {
    let project = Project::new();
    std::fs::write(project.root().join("slow"), "").unwrap();
    let controller = Arc::new(project.controller());

    let abort = AbortHandler::new();
    let running = {
        let controller = Arc::clone(&controller);
        let request = debug().with_abort(abort.clone());
        tokio::spawn(async move { controller.start(request).await })
    };
    project.wait_for_call("swift build").await;

    let second = controller.start(debug()).await;
    assert!(matches!(second, BuildOutcome::AlreadyRunning));
    assert!(controller.clean(CleanScope::All).await.is_err());

    abort.abort();
    let first = running.await.unwrap();
    assert!(matches!(first, BuildOutcome::Aborted));
}

#[tokio::test]
async fn flaky_runtime_build_gets_a_second_attempt() {
    let project = Project::new();
    project.write_tools(true);
    let (tx, mut rx) = wbx_events::channel();
    let controller = project.controller().with_event_sender(tx);

    assert_succeeded(&controller.start(debug()).await);
    assert_eq!(project.calls("npm run build"), 2);

    let mut retries = 0;
    let mut session = None;
    while let Ok(message) = rx.try_recv() {
        if let AppEvent::Build(BuildEvent::Retrying { step, attempt, .. }) = &message.event {
            assert_eq!(step, "runtime-build");
            assert_eq!(*attempt, 2);
            retries += 1;
            session = message.meta.session_id.clone();
        }
    }
    assert_eq!(retries, 1);
    assert!(session.is_some());
}

#[tokio::test]
async fn flaky_step_without_retry_policy_fails() {
    let project = Project::new();
    project.write_tools(true);
    let mut config = project.config();
    config.retry.flaky_steps.clear();
    let controller = project.controller_with(config);

    let outcome = controller.start(debug()).await;
    let BuildOutcome::Failed(error) = outcome else {
        panic!("expected a failure: {outcome:?}");
    };
    assert!(error.to_string().contains("index.d.ts"));
    // Post-processing never started
    assert!(!project.root().join("DevPublic/app.js").exists());
}

#[tokio::test]
async fn release_build_compresses_assets() {
    let project = Project::new();
    let controller = project.controller();

    let outcome = controller.start(BuildRequest::new(BuildVariant::Release)).await;
    assert_succeeded(&outcome);

    let out = project.root().join("DistPublic");
    for asset in ["app.js", "service.js"] {
        assert!(out.join(format!("{asset}.gz")).exists(), "{asset}.gz");
        assert!(out.join(format!("{asset}.br")).exists(), "{asset}.br");
    }
    assert!(!out.join("icon.png.gz").exists());
    assert!(!project.root().join("DevPublic").exists());
}

#[tokio::test]
async fn merge_only_touches_documents() {
    let project = Project::new();
    let controller = project.controller();

    assert_succeeded(&controller.merge(debug()).await);
    assert!(project.root().join("WebSources/index.html").exists());
    assert!(project.root().join("DevPublic/index.html").exists());
    assert_eq!(project.calls("swift build"), 0);
    assert_eq!(project.calls("swift package dump-package"), 1);
}

#[tokio::test]
async fn clean_forgets_the_gate() {
    let project = Project::new();
    let controller = project.controller();
    assert_succeeded(&controller.start(debug()).await);

    let removed = controller.clean(CleanScope::All).await.unwrap();
    assert!(removed.contains(&project.root().join("DevPublic")));
    assert!(controller.gate().record().is_empty());

    assert_succeeded(&controller.start(debug()).await);
    assert_eq!(project.calls("swift build"), 4);
}

#[tokio::test]
async fn release_build_does_not_hide_edits_from_the_next_debug_build() {
    let project = Project::new();
    let controller = project.controller();
    let web = project.root().join("WebSources");
    std::fs::write(web.join("about.html"), "<p>v1</p>\n").unwrap();

    assert_succeeded(&controller.start(debug()).await);
    let dev = project.root().join("DevPublic");
    assert_eq!(std::fs::read_to_string(dev.join("about.html")).unwrap(), "<p>v1</p>\n");

    edit(&web.join("about.html"), "<p>v2</p>\n", Duration::from_secs(5));
    edit(&web.join("styles/main.scss"), "body { margin: 1px }\n", Duration::from_secs(5));
    assert_succeeded(&controller.start(BuildRequest::new(BuildVariant::Release)).await);
    let dist = project.root().join("DistPublic");
    assert_eq!(std::fs::read_to_string(dist.join("about.html")).unwrap(), "<p>v2</p>\n");

    assert_succeeded(&controller.start(debug()).await);
    assert_eq!(std::fs::read_to_string(dev.join("about.html")).unwrap(), "<p>v2</p>\n");
    assert_eq!(
        std::fs::read_to_string(dev.join("styles/main.css")).unwrap(),
        "body { margin: 1px }\n"
    );
}

#[tokio::test]
async fn first_post_processing_failure_wins_and_the_rest_finish() {
    let project = Project::new();
    let log = project.log().display().to_string();
    project.script(
        "webpack-cli",
        &format!(
            r#"echo "webpack $*" >> "{log}"
echo "bundle exploded" >&2
exit 1
"#
        ),
    );
    let (tx, mut rx) = wbx_events::channel();
    let controller = project.controller().with_event_sender(tx);

    let outcome = controller.start(debug()).await;
    let BuildOutcome::Failed(error) = outcome else {
        panic!("expected a failure: {outcome:?}");
    };
    match &error {
        Error::Build(BuildError::ToolFailed { code, stderr, .. }) => {
            assert_eq!(*code, Some(1));
            assert!(stderr.contains("bundle exploded"), "{stderr}");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Sibling phases ran to completion
    let out = project.root().join("DevPublic");
    assert!(out.join("site.webmanifest").exists());
    assert!(out.join("styles/main.css").exists());
    assert!(out.join("index.html").exists());
    assert_eq!(project.calls("webpack"), 2);

    let mut failed_phase = None;
    let mut also_failed = Vec::new();
    while let Ok(message) = rx.try_recv() {
        match message.event {
            AppEvent::Build(BuildEvent::Failed { phase, .. }) => failed_phase = phase,
            AppEvent::General(GeneralEvent::Warning { message, context })
                if message.contains("also failed") =>
            {
                also_failed.push(context.unwrap_or_default());
            }
            _ => {}
        }
    }
    assert_eq!(failed_phase, Some(PhaseKind::Bundle));
    assert_eq!(also_failed.len(), 1);
    assert!(also_failed[0].contains("bundle exploded"));
}
