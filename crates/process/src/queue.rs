//! Serial, cancellable runner for one tool family

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::{oneshot, watch};
use wbx_errors::{Error, ProcessError};
use wbx_events::{AppEvent, EventEmitter, EventMeta, EventSender, ProcessEvent};

use crate::{EnvSnapshot, ProcessResult, QueuedCommand};

type Reply = oneshot::Sender<Result<ProcessResult, Error>>;

struct Pending {
    command: QueuedCommand,
    reply: Reply,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Pending>,
    running: bool,
    cancelled: bool,
}

struct QueueInner {
    name: String,
    env: Arc<EnvSnapshot>,
    events: Option<EventSender>,
    state: Mutex<QueueState>,
    cancel: watch::Sender<bool>,
}

impl EventEmitter for QueueInner {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }

    fn enrich_event_meta(&self, _event: &AppEvent, meta: &mut EventMeta) {
        meta.labels.insert("queue".to_string(), self.name.clone());
    }
}

/// FIFO queue of external commands. Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct ProcessQueue {
    inner: Arc<QueueInner>,
}

impl ProcessQueue {
    /// Create a queue that spawns commands with the given environment snapshot
    #[must_use]
    pub fn new(name: impl Into<String>, env: Arc<EnvSnapshot>, events: Option<EventSender>) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            inner: Arc::new(QueueInner {
                name: name.into(),
                env,
                events,
                state: Mutex::new(QueueState::default()),
                cancel,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Append a command to the queue.
    ///
    /// The command is registered immediately, so enqueue order is run order
    /// even if the returned futures are awaited in a different order. The
    /// queue starts running right away when idle. Must be called from within
    /// a Tokio runtime.
    pub fn enqueue(
        &self,
        command: QueuedCommand,
    ) -> impl std::future::Future<Output = Result<ProcessResult, Error>> + Send + 'static {
        let (reply, rx) = oneshot::channel();
        let label = command.get_label();

        let start_runner = {
            let mut state = self.inner.lock();
            if state.cancelled {
                let _ = reply.send(Ok(ProcessResult::discarded(label.clone())));
                false
            } else {
                state.pending.push_back(Pending { command, reply });
                let pending = state.pending.len();
                let idle = !state.running;
                state.running = true;
                drop(state);
                self.inner
                    .emit(AppEvent::Process(ProcessEvent::CommandQueued {
                        queue: self.inner.name.clone(),
                        label: label.clone(),
                        pending,
                    }));
                idle
            }
        };

        if start_runner {
            tokio::spawn(run_queue(Arc::clone(&self.inner)));
        }

        async move {
            rx.await
                .unwrap_or_else(|_| Ok(ProcessResult::discarded(label)))
        }
    }

    /// Enqueue and wait, turning a non-zero exit into `BuildError::ToolFailed`
    /// and a cancellation into `Error::Cancelled`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned, exits unsuccessfully
    /// or is cancelled.
    pub async fn run_checked(&self, command: QueuedCommand) -> Result<ProcessResult, Error> {
        let tool = command.get_label();
        let result = self.enqueue(command).await?;
        if result.cancelled {
            return Err(Error::Cancelled);
        }
        if !result.success() {
            return Err(wbx_errors::BuildError::ToolFailed {
                tool,
                code: result.exit_code,
                stderr: result.diagnostics(20),
            }
            .into());
        }
        Ok(result)
    }

    /// Terminal cancellation: discards pending commands and kills the running one.
    pub fn cancel(&self) {
        let discarded: Vec<Pending> = {
            let mut state = self.inner.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            state.pending.drain(..).collect()
        };
        self.inner.cancel.send_replace(true);

        let count = discarded.len();
        for pending in discarded {
            let label = pending.command.get_label();
            let _ = pending
                .reply
                .send(Ok(ProcessResult::discarded(label.clone())));
            self.inner
                .emit(AppEvent::Process(ProcessEvent::CommandCancelled {
                    queue: self.inner.name.clone(),
                    label,
                    started: false,
                }));
        }
        self.inner.emit(AppEvent::Process(ProcessEvent::QueueCancelled {
            queue: self.inner.name.clone(),
            discarded: count,
        }));
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().cancelled
    }

    /// Whether a runner is active (executing or about to pick the next command)
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }
}

impl std::fmt::Debug for ProcessQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessQueue")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl QueueInner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn execute(&self, command: &QueuedCommand) -> Result<ProcessResult, Error> {
        let label = command.get_label();
        if *self.cancel.borrow() {
            return Ok(ProcessResult::discarded(label));
        }

        let program = self.resolve_program(command)?;
        let mut cmd = Command::new(&program);
        cmd.args(command.get_args())
            .env_clear()
            .envs(self.env.merged(command.env_overrides()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = command.get_current_dir() {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| ProcessError::SpawnFailed {
            program: program.display().to_string(),
            message: e.to_string(),
        })?;
        let started_at = Instant::now();
        self.emit(AppEvent::Process(ProcessEvent::CommandStarted {
            queue: self.name.clone(),
            label: label.clone(),
            program: program.display().to_string(),
            args: command.get_args().to_vec(),
            working_dir: command.get_current_dir().map(Path::to_path_buf),
        }));

        let stdout = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr = tokio::spawn(read_pipe(child.stderr.take()));

        let mut cancel_rx = self.cancel.subscribe();
        let cancelled = tokio::select! {
            status = child.wait() => Waited::Exited(status),
            _ = cancel_rx.wait_for(|cancelled| *cancelled) => Waited::Cancelled,
        };

        let (status, cancelled) = match cancelled {
            Waited::Exited(status) => (status, false),
            Waited::Cancelled => {
                let _ = child.start_kill();
                (child.wait().await, true)
            }
        };
        let status = status.map_err(|e| ProcessError::OutputFailed {
            program: program.display().to_string(),
            message: e.to_string(),
        })?;

        let (stdout, stderr) = if cancelled {
            // Grandchildren may still hold the pipes open.
            stdout.abort();
            stderr.abort();
            (String::new(), String::new())
        } else {
            (
                stdout.await.unwrap_or_default(),
                stderr.await.unwrap_or_default(),
            )
        };

        let duration = started_at.elapsed();
        if cancelled {
            self.emit(AppEvent::Process(ProcessEvent::CommandCancelled {
                queue: self.name.clone(),
                label: label.clone(),
                started: true,
            }));
        } else {
            self.emit(AppEvent::Process(ProcessEvent::CommandCompleted {
                queue: self.name.clone(),
                label: label.clone(),
                exit_code: status.code(),
                duration,
            }));
        }

        Ok(ProcessResult {
            label,
            exit_code: status.code(),
            stdout,
            stderr,
            started: true,
            cancelled,
            started_at: Some(started_at),
            duration,
        })
    }

    fn resolve_program(&self, command: &QueuedCommand) -> Result<PathBuf, Error> {
        let program = command.program();
        if Path::new(program).components().count() > 1 {
            return Ok(PathBuf::from(program));
        }
        let cwd = command
            .get_current_dir()
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();
        which::which_in(program, self.env.get("PATH"), cwd).map_err(|_| {
            ProcessError::CommandNotFound {
                program: program.to_string(),
            }
            .into()
        })
    }
}

enum Waited {
    Exited(std::io::Result<std::process::ExitStatus>),
    Cancelled,
}

async fn run_queue(inner: Arc<QueueInner>) {
    loop {
        let next = {
            let mut state = inner.lock();
            match state.pending.pop_front() {
                Some(next) if !state.cancelled => next,
                _ => {
                    state.running = false;
                    return;
                }
            }
        };
        let result = inner.execute(&next.command).await;
        let _ = next.reply.send(result);
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn queue(name: &str) -> ProcessQueue {
        ProcessQueue::new(name, Arc::new(EnvSnapshot::capture(None)), None)
    }

    fn sh(script: &str) -> QueuedCommand {
        QueuedCommand::new("sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn runs_in_enqueue_order_one_at_a_time() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join("log");
        let q = queue("test");

        let script = |tag: &str| {
            format!(
                "echo start-{tag} >> {log}; sleep 0.05; echo end-{tag} >> {log}",
                log = log.display()
            )
        };
        let a = q.enqueue(sh(&script("a")));
        let b = q.enqueue(sh(&script("b")));
        let c = q.enqueue(sh(&script("c")));

        // Await out of order; execution order is still a, b, c.
        let rc = c.await.unwrap();
        let ra = a.await.unwrap();
        let rb = b.await.unwrap();
        assert!(ra.success() && rb.success() && rc.success());

        let content = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            ["start-a", "end-a", "start-b", "end-b", "start-c", "end-c"]
        );
    }

    #[tokio::test]
    async fn failure_does_not_stall_the_queue() {
        let q = queue("test");
        let failing = q.enqueue(sh("echo oops >&2; exit 3"));
        let next = q.enqueue(sh("echo fine"));

        let failing = failing.await.unwrap();
        assert_eq!(failing.exit_code, Some(3));
        assert!(!failing.success());
        assert_eq!(failing.stderr.trim(), "oops");

        let next = next.await.unwrap();
        assert!(next.success());
        assert_eq!(next.stdout.trim(), "fine");
    }

    #[tokio::test]
    async fn overrides_reach_the_process() {
        let q = ProcessQueue::new(
            "env",
            Arc::new(EnvSnapshot::from_vars([
                ("PATH", std::env::var("PATH").unwrap_or_default()),
                ("MODE", "inherited".to_string()),
            ])),
            None,
        );
        let result = q
            .enqueue(sh("echo $MODE-$EXTRA").env("MODE", "override").env("EXTRA", "x"))
            .await
            .unwrap();
        assert_eq!(result.stdout.trim(), "override-x");
    }

    #[tokio::test]
    async fn cancel_kills_running_and_drains_pending() {
        let q = queue("test");
        let running = q.enqueue(sh("exec sleep 30"));
        let pending_a = q.enqueue(sh("echo never"));
        let pending_b = q.enqueue(sh("echo never"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        q.cancel();

        let running = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .expect("running command should be killed")
            .unwrap();
        assert!(running.started);
        assert!(running.cancelled);
        assert!(!running.success());

        for pending in [pending_a.await.unwrap(), pending_b.await.unwrap()] {
            assert!(!pending.started);
            assert!(pending.cancelled);
            assert!(!pending.success());
        }
        assert!(q.is_cancelled());
        assert_eq!(q.pending_len(), 0);
    }

    #[tokio::test]
    async fn enqueue_after_cancel_never_starts() {
        let q = queue("test");
        q.cancel();
        let result = q.enqueue(sh("echo late")).await.unwrap();
        assert!(!result.started);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn missing_program_is_reported_and_queue_continues() {
        let q = queue("test");
        let missing = q.enqueue(QueuedCommand::new("wbx-definitely-not-a-tool"));
        let next = q.enqueue(sh("true"));
        let err = missing.await.unwrap_err();
        assert!(matches!(
            err,
            Error::Process(ProcessError::CommandNotFound { .. })
        ));
        assert!(next.await.unwrap().success());
    }

    #[tokio::test]
    async fn run_checked_maps_failures() {
        let q = queue("test");
        let err = q
            .run_checked(sh("exit 2").label("bundle App"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Build(wbx_errors::BuildError::ToolFailed { code: Some(2), .. })
        ));
    }

    #[tokio::test]
    async fn emits_lifecycle_events() {
        let (tx, mut rx) = wbx_events::channel();
        let q = ProcessQueue::new("gzip", Arc::new(EnvSnapshot::capture(None)), Some(tx));
        q.enqueue(sh("true")).await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(message) = rx.try_recv() {
            assert_eq!(message.meta.labels.get("queue").map(String::as_str), Some("gzip"));
            if let AppEvent::Process(event) = message.event {
                kinds.push(match event {
                    ProcessEvent::CommandQueued { .. } => "queued",
                    ProcessEvent::CommandStarted { .. } => "started",
                    ProcessEvent::CommandCompleted { .. } => "completed",
                    _ => "other",
                });
            }
        }
        assert_eq!(kinds, ["queued", "started", "completed"]);
    }
}
