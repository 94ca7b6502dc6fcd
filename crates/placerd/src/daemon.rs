//! Daemonizer — detaches the service into a long-lived background process.
//!
//! The lifecycle is an explicit state machine:
//!
//! ```text
//! Spawning → Detached → Running → Terminated
//! ```
//!
//! Underneath it is the classic Unix double fork. The invoking process
//! forks an intermediate child and blocks on a pipe waiting for the daemon
//! pid (bounded: [`HANDSHAKE_ATTEMPTS`] × [`HANDSHAKE_INTERVAL`]). The
//! intermediate child detaches — chdir to scratch, new session, cleared
//! umask, every inherited descriptor closed except the pipe's write end —
//! forks the true daemon, writes its pid through the pipe, and exits. The
//! daemon nulls its standard streams and runs the service entry point.
//!
//! A missing pid is not an error to the caller: `daemonize` logs it and
//! returns `None`, so the invoker never hangs on a child that died during
//! setup.

use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::path::PathBuf;
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use nix::sys::signal::{Signal, kill};
use nix::sys::stat::{Mode, umask};
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, Pid, chdir, close, dup2, fork, pipe, read, setsid, write};

use placer_core::ServiceConfig;
use placer_observe::{EventLog, Level};

/// How many times the parent polls the pipe for the daemon pid.
pub const HANDSHAKE_ATTEMPTS: u32 = 10;
/// Backoff between handshake polls.
pub const HANDSHAKE_INTERVAL: Duration = Duration::from_secs(1);

/// Where a daemon is in its lifecycle, as observed by the invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    /// Forked, pid not yet reported.
    Spawning,
    /// Pid reported; detachment complete.
    Detached,
    /// Liveness confirmed.
    Running,
    /// No longer alive.
    Terminated,
}

impl std::fmt::Display for DaemonState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DaemonState::Spawning => "spawning",
            DaemonState::Detached => "detached",
            DaemonState::Running => "running",
            DaemonState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Daemonization parameters.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Scratch directory the daemon chdirs into.
    pub work_dir: PathBuf,
    /// Event log path, recorded into the handle.
    pub log_path: PathBuf,
    /// Port the service will bind, recorded into the handle.
    pub listen_port: u16,
    pub handshake_attempts: u32,
    pub handshake_interval: Duration,
}

impl DaemonOptions {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            log_path: config.log_path.clone(),
            listen_port: config.port,
            handshake_attempts: HANDSHAKE_ATTEMPTS,
            handshake_interval: HANDSHAKE_INTERVAL,
        }
    }
}

/// Handle to a detached daemon, owned by the invoker.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    pub pid: i32,
    pub log_path: PathBuf,
    pub listen_port: u16,
    pub state: DaemonState,
}

/// Detach `service_main` into a background daemon.
///
/// Returns `Ok(Some(handle))` once the daemon pid arrives and the process
/// answers a liveness probe, `Ok(None)` if the handshake is exhausted (the
/// reason is in the event log). Only the invoking process returns — the
/// forked children either become the daemon or `_exit`.
pub fn daemonize<F>(
    opts: &DaemonOptions,
    log: &EventLog,
    service_main: F,
) -> anyhow::Result<Option<ServiceHandle>>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    let (pipe_rd, pipe_wr) = pipe()?;
    let state = DaemonState::Spawning;
    tracing::debug!(%state, "forking intermediate child");

    match unsafe { fork() }? {
        ForkResult::Parent { child } => {
            drop(pipe_wr);
            let pid = await_pid_token(
                &pipe_rd,
                opts.handshake_attempts,
                opts.handshake_interval,
                log,
            );
            // The intermediate child exits as soon as it has reported;
            // reap it so it never lingers as a zombie.
            let _ = waitpid(child, None);

            let Some(pid) = pid else {
                log.append(Level::Error, "failed to obtain daemon pid");
                tracing::error!(
                    attempts = opts.handshake_attempts,
                    "daemon never reported a pid"
                );
                return Ok(None);
            };

            tracing::debug!(pid, state = %DaemonState::Detached, "pid received");
            if !probe(pid) {
                log.append(
                    Level::Error,
                    &format!("daemon {pid} exited right after detaching"),
                );
                tracing::error!(pid, state = %DaemonState::Terminated, "daemon died during setup");
                return Ok(None);
            }

            let state = DaemonState::Running;
            tracing::info!(pid, %state, "daemon detached");
            Ok(Some(ServiceHandle {
                pid,
                log_path: opts.log_path.clone(),
                listen_port: opts.listen_port,
                state,
            }))
        }
        ForkResult::Child => {
            drop(pipe_rd);
            detach_and_run(pipe_wr, opts, log, service_main)
        }
    }
}

/// Deliver SIGTERM to a daemon.
pub fn stop(pid: i32) -> nix::Result<()> {
    kill(Pid::from_raw(pid), Signal::SIGTERM)
}

/// Liveness check without delivering a signal.
pub fn probe(pid: i32) -> bool {
    kill(Pid::from_raw(pid), None).is_ok()
}

/// Parent side of the handshake: poll the pipe until a pid token arrives
/// or the attempt budget runs out.
fn await_pid_token(
    pipe_rd: &OwnedFd,
    attempts: u32,
    interval: Duration,
    log: &EventLog,
) -> Option<i32> {
    if let Err(e) = fcntl(pipe_rd.as_raw_fd(), FcntlArg::F_SETFL(OFlag::O_NONBLOCK)) {
        log.append(Level::Error, &format!("pid channel setup failed: {e}"));
        return None;
    }

    let mut buf = [0u8; 32];
    for _ in 0..attempts {
        match read(pipe_rd.as_raw_fd(), &mut buf) {
            Ok(n) if n > 0 => {
                let token = parse_pid_token(&buf[..n]);
                if token.is_none() {
                    log.append(Level::Error, "received an unparseable pid token");
                }
                return token;
            }
            // Nothing yet (or the writer died without reporting); back off
            // and retry within the budget.
            Ok(_) | Err(Errno::EAGAIN) => {
                log.append(Level::Info, "waiting for pid");
                std::thread::sleep(interval);
            }
            Err(e) => {
                log.append(Level::Error, &format!("pid channel read failed: {e}"));
                return None;
            }
        }
    }
    None
}

fn parse_pid_token(bytes: &[u8]) -> Option<i32> {
    std::str::from_utf8(bytes)
        .ok()?
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|pid| *pid > 0)
}

/// Intermediate child: finish detaching, fork the daemon, report its pid,
/// and vanish. Never returns.
fn detach_and_run<F>(pipe_wr: OwnedFd, opts: &DaemonOptions, log: &EventLog, service_main: F) -> !
where
    F: FnOnce() -> anyhow::Result<()>,
{
    if let Err(e) = detach(&pipe_wr, opts) {
        log.append(Level::Error, &format!("detach failed: {e}"));
        unsafe { nix::libc::_exit(1) }
    }

    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            log.append(Level::Info, &format!("daemon pid = {child}"));
            let _ = write(&pipe_wr, child.to_string().as_bytes());
            drop(pipe_wr);
            unsafe { nix::libc::_exit(0) }
        }
        Ok(ForkResult::Child) => {
            drop(pipe_wr);
            // Downstream code expects valid standard streams.
            if let Err(e) = redirect_stdio_to_null() {
                log.append(Level::Error, &format!("stdio redirect failed: {e}"));
                unsafe { nix::libc::_exit(1) }
            }
            log.append(Level::Info, "daemon detached, starting service");
            match service_main() {
                Ok(()) => unsafe { nix::libc::_exit(0) },
                Err(e) => {
                    log.append(Level::Error, &format!("service failed to start: {e:#}"));
                    unsafe { nix::libc::_exit(1) }
                }
            }
        }
        Err(e) => {
            log.append(Level::Error, &format!("daemon fork failed: {e}"));
            unsafe { nix::libc::_exit(1) }
        }
    }
}

/// Sever every tie to the invoking session: scratch cwd, own session,
/// cleared umask, no inherited descriptors beyond the handshake pipe.
fn detach(pipe_wr: &OwnedFd, opts: &DaemonOptions) -> anyhow::Result<()> {
    chdir(&opts.work_dir)?;
    setsid()?;
    umask(Mode::empty());
    close_inherited_fds(pipe_wr.as_raw_fd());
    Ok(())
}

fn close_inherited_fds(keep: RawFd) {
    let mut fds: Vec<RawFd> = Vec::new();
    if let Ok(entries) = std::fs::read_dir("/proc/self/fd") {
        for entry in entries.flatten() {
            if let Ok(fd) = entry.file_name().to_string_lossy().parse::<RawFd>() {
                fds.push(fd);
            }
        }
    }
    // The directory handle's own fd is in the list; closing it again after
    // the iterator dropped it just reports EBADF, which we ignore.
    for fd in fds {
        if fd != keep {
            let _ = close(fd);
        }
    }
}

fn redirect_stdio_to_null() -> anyhow::Result<()> {
    use std::os::fd::IntoRawFd;

    let stdin_fd = std::fs::File::open("/dev/null")?.into_raw_fd();
    let stdout_fd = std::fs::OpenOptions::new()
        .write(true)
        .open("/dev/null")?
        .into_raw_fd();

    dup2(stdin_fd, 0)?;
    dup2(stdout_fd, 1)?;
    dup2(stdout_fd, 2)?;

    if stdin_fd > 2 {
        let _ = close(stdin_fd);
    }
    if stdout_fd > 2 {
        let _ = close(stdout_fd);
    }
    Ok(())
}
