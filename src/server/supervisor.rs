//! # ServerSupervisor: owns the server process lifecycle.
//!
//! Supervises one child process at a time:
//! - spawns it with a resolved executable and the fixed `-jar <jar> nogui`
//!   argument tail,
//! - reads its output continuously on a dedicated task, extracting the
//!   ready signal and player joins/leaves,
//! - executes the graceful-stop protocol (player countdown → `stop`
//!   command → grace period → forced kill),
//! - re-enters `Starting` after an exit when auto-restart is armed.
//!
//! ## Architecture
//! ```text
//! start() ──► spawn child ──► reader task (stdout lines)
//!                                  │
//!                                  ├─ ready pattern  → Starting → Running
//!                                  ├─ join pattern   → Players.insert
//!                                  ├─ leave pattern  → Players.remove
//!                                  ├─ every line     → Bus (ServerOutput)
//!                                  └─ end of stream  → exit_tx ─► monitor task
//!                                                                    │
//!                                            dispose handle, clear players,
//!                                            → Stopped, restart if armed
//! ```
//!
//! Routing the exit through a dedicated monitor task makes the restart an
//! explicit, observable transition instead of a recursive call from inside
//! the output callback.
//!
//! ## Rules
//! - `start()` requires `Stopped`; `stop()` and `input()` require `Running`.
//! - The player set and the state are mutated only by the reader/exit path
//!   and the serialized `start()`/`stop()` entry points. Callers serialize
//!   lifecycle calls; the update loop's single-threaded iteration does.
//! - `stop()` suspends the caller until termination is confirmed, and never
//!   blocks indefinitely: the grace period resolves via forced kill.

use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError, Weak};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time;

use crate::config::ServerConfig;
use crate::error::SupervisorError;
use crate::events::{Bus, Event, EventKind};

use super::console;
use super::parser::{self, OutputEvent};
use super::state::ServerState;

#[cfg(windows)]
const JAVA_BIN: &str = "java.exe";
#[cfg(not(windows))]
const JAVA_BIN: &str = "java";

struct Inner {
    cfg: ServerConfig,
    bus: Bus,
    state_tx: watch::Sender<ServerState>,
    players: StdMutex<HashSet<String>>,
    auto_restart: AtomicBool,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    exit_tx: mpsc::UnboundedSender<()>,
}

/// Supervises the server child process.
///
/// Cheap to clone; all clones share one state machine. Must be created
/// inside a tokio runtime (the exit monitor task is spawned eagerly).
#[derive(Clone)]
pub struct ServerSupervisor {
    inner: Arc<Inner>,
}

impl ServerSupervisor {
    /// Creates a supervisor in the `Stopped` state.
    pub fn new(cfg: ServerConfig, bus: Bus) -> Self {
        let (state_tx, _) = watch::channel(ServerState::Stopped);
        let (exit_tx, exit_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            cfg,
            bus,
            state_tx,
            players: StdMutex::new(HashSet::new()),
            auto_restart: AtomicBool::new(false),
            child: Mutex::new(None),
            stdin: Mutex::new(None),
            exit_tx,
        });
        Self::spawn_exit_monitor(Arc::downgrade(&inner), exit_rx);
        Self { inner }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        *self.inner.state_tx.borrow()
    }

    /// A receiver observing state transitions as they happen.
    pub fn state_changes(&self) -> watch::Receiver<ServerState> {
        self.inner.state_tx.subscribe()
    }

    /// Snapshot of the currently known online players.
    pub fn players(&self) -> Vec<String> {
        self.players_guard().iter().cloned().collect()
    }

    /// Number of currently known online players.
    pub fn player_count(&self) -> usize {
        self.players_guard().len()
    }

    /// Whether the supervisor restarts the server after an exit.
    pub fn auto_restart(&self) -> bool {
        self.inner.auto_restart.load(AtomicOrdering::SeqCst)
    }

    /// Arms or disarms auto-restart.
    ///
    /// Takes effect at the moment the exit transition is evaluated; callers
    /// planning their own restart disarm this *before* calling [`stop`]
    /// to keep the exit monitor out of the way.
    ///
    /// [`stop`]: ServerSupervisor::stop
    pub fn set_auto_restart(&self, armed: bool) {
        self.inner.auto_restart.store(armed, AtomicOrdering::SeqCst);
    }

    /// Spawns the server process and wires up the output reader.
    ///
    /// Fails with [`SupervisorError::AlreadyRunning`] unless the supervisor
    /// is `Stopped`. The player set is cleared at this point.
    pub async fn start(&self) -> Result<(), SupervisorError> {
        if self.state() != ServerState::Stopped {
            return Err(SupervisorError::AlreadyRunning);
        }
        self.inner.state_tx.send_replace(ServerState::Starting);
        self.players_guard().clear();
        self.inner.bus.publish(Event::now(EventKind::ServerStarting));

        let executable = self
            .inner
            .cfg
            .command
            .clone()
            .unwrap_or_else(resolve_java);
        let mut cmd = Command::new(&executable);
        cmd.current_dir(&self.inner.cfg.working_dir)
            .args(&self.inner.cfg.jvm_args)
            .arg("-jar")
            .arg(&self.inner.cfg.server_jar)
            .arg("nogui")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.inner.state_tx.send_replace(ServerState::Stopped);
                return Err(SupervisorError::Spawn(e));
            }
        };
        log::info!("server process spawned via {}", executable.display());

        let stdout = child.stdout.take();
        *self.inner.stdin.lock().await = child.stdin.take();
        *self.inner.child.lock().await = Some(child);

        let reader = self.clone();
        tokio::spawn(async move { reader.read_output(stdout).await });
        Ok(())
    }

    /// Executes the graceful-stop protocol and waits for termination.
    ///
    /// Fails with [`SupervisorError::NotRunning`] unless the supervisor is
    /// `Running`. While players are online and the countdown budget lasts,
    /// a countdown notice is broadcast at a fixed cadence; then a single
    /// `stop` command is sent; if the process has not exited within the
    /// grace period it is forcibly terminated.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        if self.state() != ServerState::Running {
            return Err(SupervisorError::NotRunning);
        }
        self.inner.state_tx.send_replace(ServerState::Stopping);
        self.inner.bus.publish(Event::now(EventKind::ServerStopping));

        let cadence = self.inner.cfg.notice_interval;
        let mut remaining = self.inner.cfg.countdown;
        while !remaining.is_zero() && self.player_count() > 0 {
            let notice = console::countdown_notice(remaining.as_secs());
            let _ = self.write_line(&notice).await;
            time::sleep(cadence).await;
            remaining = remaining.saturating_sub(cadence);
        }

        // If stdin is already gone the process is exiting on its own.
        let _ = self.write_line("stop").await;

        let mut state_rx = self.inner.state_tx.subscribe();
        let timed_out = time::timeout(
            self.inner.cfg.stop_grace,
            state_rx.wait_for(|s| *s == ServerState::Stopped),
        )
        .await
        .is_err();

        if timed_out {
            log::warn!(
                "server did not exit within {:?}; forcing termination",
                self.inner.cfg.stop_grace
            );
            self.inner.bus.publish(Event::now(EventKind::ServerKilled));
            if let Some(child) = self.inner.child.lock().await.as_mut() {
                let _ = child.start_kill();
            }
            // The kill closes stdout, which drives the exit transition.
            let mut state_rx = self.inner.state_tx.subscribe();
            let _ = state_rx.wait_for(|s| *s == ServerState::Stopped).await;
        }
        Ok(())
    }

    /// Writes one command line to the server's stdin.
    ///
    /// Fails with [`SupervisorError::NotRunning`] unless the supervisor is
    /// `Running`.
    pub async fn input(&self, line: &str) -> Result<(), SupervisorError> {
        if self.state() != ServerState::Running {
            return Err(SupervisorError::NotRunning);
        }
        self.write_line(line).await
    }

    async fn write_line(&self, line: &str) -> Result<(), SupervisorError> {
        let mut guard = self.inner.stdin.lock().await;
        let stdin = guard.as_mut().ok_or(SupervisorError::NotRunning)?;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(SupervisorError::Stdin)?;
        stdin.write_all(b"\n").await.map_err(SupervisorError::Stdin)?;
        stdin.flush().await.map_err(SupervisorError::Stdin)
    }

    /// Reads output lines until end of stream, then reports the exit.
    async fn read_output(self, stdout: Option<ChildStdout>) {
        if let Some(stdout) = stdout {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                self.handle_line(&line);
            }
        }
        // End of stream: hand off to the exit monitor so restart happens as
        // an explicit transition, not a nested call inside the reader.
        let _ = self.inner.exit_tx.send(());
    }

    fn handle_line(&self, line: &str) {
        match parser::parse_line(line) {
            Some(OutputEvent::Ready) => {
                // Only meaningful while starting; later repeats are noise.
                if self.state() == ServerState::Starting {
                    self.inner.state_tx.send_replace(ServerState::Running);
                    self.inner.bus.publish(Event::now(EventKind::ServerReady));
                }
            }
            Some(OutputEvent::Joined(name)) => {
                self.players_guard().insert(name.clone());
                self.inner
                    .bus
                    .publish(Event::now(EventKind::PlayerJoined).with_player(name));
            }
            Some(OutputEvent::Left(name)) => {
                self.players_guard().remove(&name);
                self.inner
                    .bus
                    .publish(Event::now(EventKind::PlayerLeft).with_player(name));
            }
            None => {}
        }
        self.inner
            .bus
            .publish(Event::now(EventKind::ServerOutput).with_line(line));
    }

    /// Monitor task: consumes exit notices and performs the Stopped
    /// transition (and the auto-restart, when armed).
    fn spawn_exit_monitor(weak: Weak<Inner>, mut exit_rx: mpsc::UnboundedReceiver<()>) {
        tokio::spawn(async move {
            while exit_rx.recv().await.is_some() {
                let Some(inner) = weak.upgrade() else { break };
                let sup = ServerSupervisor { inner };
                sup.on_exit().await;
            }
        });
    }

    async fn on_exit(&self) {
        // Reap the child; a live process whose stdout closed is treated as
        // gone and killed before reaping.
        if let Some(mut child) = self.inner.child.lock().await.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.start_kill();
            }
            let _ = child.wait().await;
        }
        self.inner.stdin.lock().await.take();
        self.players_guard().clear();
        self.inner.state_tx.send_replace(ServerState::Stopped);
        self.inner.bus.publish(Event::now(EventKind::ServerStopped));
        log::info!("server stopped");

        if self.auto_restart() {
            log::info!("auto-restart armed; starting server again");
            if let Err(e) = self.start().await {
                log::error!("auto-restart failed: {e}");
            }
        }
    }

    fn players_guard(&self) -> MutexGuard<'_, HashSet<String>> {
        self.inner
            .players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves the JVM executable: `JAVA_HOME/bin` first, then each `PATH`
/// entry, else the bare command name.
fn resolve_java() -> PathBuf {
    resolve_java_in(env::var_os("JAVA_HOME"), env::var_os("PATH"))
}

fn resolve_java_in(java_home: Option<OsString>, path: Option<OsString>) -> PathBuf {
    if let Some(home) = java_home {
        let candidate = Path::new(&home).join("bin").join(JAVA_BIN);
        if candidate.is_file() {
            return candidate;
        }
    }
    if let Some(path) = path {
        for dir in env::split_paths(&path) {
            let candidate = dir.join(JAVA_BIN);
            if candidate.is_file() {
                return candidate;
            }
        }
    }
    PathBuf::from(JAVA_BIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tokio::sync::broadcast::Receiver;

    const READY: &str =
        r#"[12:34:56] [Server thread/INFO]: Done (1.042s)! For help, type "help" or "?""#;

    fn script_config(dir: &Path, script: &str) -> ServerConfig {
        let mut cfg = ServerConfig::new(dir, "server.jar");
        cfg.command = Some(PathBuf::from("/bin/sh"));
        cfg.jvm_args = vec!["-c".to_string(), script.to_string()];
        cfg.countdown = Duration::from_millis(100);
        cfg.notice_interval = Duration::from_millis(20);
        cfg.stop_grace = Duration::from_millis(500);
        cfg
    }

    async fn await_event(rx: &mut Receiver<Event>, kind: EventKind) -> Event {
        time::timeout(Duration::from_secs(10), async {
            loop {
                use tokio::sync::broadcast::error::RecvError;
                match rx.recv().await {
                    Ok(ev) if ev.kind == kind => return ev,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(_)) => continue,
                    Err(e) => panic!("bus closed while waiting for {kind:?}: {e}"),
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {kind:?}"))
    }

    #[tokio::test]
    async fn stop_and_input_require_running() {
        let dir = tempfile::tempdir().unwrap();
        let bus = Bus::new(64);
        let sup = ServerSupervisor::new(script_config(dir.path(), "exit 0"), bus);

        assert!(matches!(
            sup.stop().await,
            Err(SupervisorError::NotRunning)
        ));
        assert!(matches!(
            sup.input("list").await,
            Err(SupervisorError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn start_requires_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let bus = Bus::new(64);
        // Blocks on stdin so the process stays alive.
        let sup = ServerSupervisor::new(script_config(dir.path(), "read line"), bus.clone());
        let mut rx = bus.subscribe();

        sup.start().await.unwrap();
        assert_ne!(sup.state(), ServerState::Stopped);
        assert!(matches!(
            sup.start().await,
            Err(SupervisorError::AlreadyRunning)
        ));

        // Unblock the script and wait for the exit transition.
        sup.write_line("done").await.unwrap();
        await_event(&mut rx, EventKind::ServerStopped).await;
        assert_eq!(sup.state(), ServerState::Stopped);
    }

    #[tokio::test]
    async fn ready_signal_and_player_tracking() {
        let dir = tempfile::tempdir().unwrap();
        let bus = Bus::new(64);
        let script = format!(
            "echo '{READY}'; \
             echo '[12:34:56] [Server thread/INFO]: Alice joined the game'; \
             read line; \
             echo '[12:34:56] [Server thread/INFO]: Alice left the game'"
        );
        let sup = ServerSupervisor::new(script_config(dir.path(), &script), bus.clone());
        let mut rx = bus.subscribe();

        sup.start().await.unwrap();
        await_event(&mut rx, EventKind::ServerReady).await;
        assert_eq!(sup.state(), ServerState::Running);

        let joined = await_event(&mut rx, EventKind::PlayerJoined).await;
        assert_eq!(joined.player.as_deref(), Some("Alice"));
        assert_eq!(sup.players(), vec!["Alice".to_string()]);

        sup.input("anything").await.unwrap();
        await_event(&mut rx, EventKind::PlayerLeft).await;
        assert_eq!(sup.player_count(), 0);

        await_event(&mut rx, EventKind::ServerStopped).await;
        assert_eq!(sup.state(), ServerState::Stopped);
    }

    #[tokio::test]
    async fn output_lines_are_forwarded_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let bus = Bus::new(64);
        let sup = ServerSupervisor::new(
            script_config(dir.path(), "echo 'just some noise'"),
            bus.clone(),
        );
        let mut rx = bus.subscribe();

        sup.start().await.unwrap();
        let ev = await_event(&mut rx, EventKind::ServerOutput).await;
        assert_eq!(ev.line.as_deref(), Some("just some noise"));
        await_event(&mut rx, EventKind::ServerStopped).await;
    }

    #[tokio::test]
    async fn unresponsive_child_is_killed_within_grace() {
        let dir = tempfile::tempdir().unwrap();
        let bus = Bus::new(64);
        // Reaches Running, then ignores stdin forever.
        let script = format!("echo '{READY}'; while :; do sleep 1; done");
        let sup = ServerSupervisor::new(script_config(dir.path(), &script), bus.clone());
        let mut rx = bus.subscribe();

        sup.start().await.unwrap();
        await_event(&mut rx, EventKind::ServerReady).await;

        let grace = Duration::from_millis(500);
        let started = Instant::now();
        sup.stop().await.unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= grace, "killed before grace elapsed: {elapsed:?}");
        assert!(
            elapsed < grace + Duration::from_secs(5),
            "stop took unboundedly long: {elapsed:?}"
        );
        assert_eq!(sup.state(), ServerState::Stopped);
    }

    #[tokio::test]
    async fn auto_restart_reenters_starting_after_exit() {
        let dir = tempfile::tempdir().unwrap();
        let bus = Bus::new(64);
        let sup = ServerSupervisor::new(script_config(dir.path(), "exit 0"), bus.clone());
        let mut rx = bus.subscribe();

        sup.set_auto_restart(true);
        sup.start().await.unwrap();

        await_event(&mut rx, EventKind::ServerStopped).await;
        // The monitor restarts: a second ServerStarting must follow.
        await_event(&mut rx, EventKind::ServerStarting).await;
        sup.set_auto_restart(false);
        await_event(&mut rx, EventKind::ServerStopped).await;
    }

    #[test]
    fn resolve_prefers_java_home() {
        let home = tempfile::tempdir().unwrap();
        let bin = home.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let java = bin.join(JAVA_BIN);
        std::fs::write(&java, b"#!/bin/sh\n").unwrap();

        let found = resolve_java_in(Some(home.path().into()), None);
        assert_eq!(found, java);
    }

    #[test]
    fn resolve_scans_path_entries() {
        let empty = tempfile::tempdir().unwrap();
        let with_java = tempfile::tempdir().unwrap();
        let java = with_java.path().join(JAVA_BIN);
        std::fs::write(&java, b"#!/bin/sh\n").unwrap();

        let path = env::join_paths([empty.path(), with_java.path()]).unwrap();
        let found = resolve_java_in(None, Some(path));
        assert_eq!(found, java);
    }

    #[test]
    fn resolve_falls_back_to_bare_name() {
        let found = resolve_java_in(None, None);
        assert_eq!(found, PathBuf::from(JAVA_BIN));
    }
}
