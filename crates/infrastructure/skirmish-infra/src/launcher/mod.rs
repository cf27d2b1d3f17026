use camino::{Utf8Path, Utf8PathBuf};
use skirmish_config::MISSING_ENGINE_MESSAGE;
use skirmish_core::{LaunchEvent, LaunchRequest};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::fs_utils::absolute_path;

pub mod lifecycle;
pub mod purge;

pub use lifecycle::{LaunchHandle, Lifecycle};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Starts and supervises one engine binary.
#[derive(Debug, Clone)]
pub struct Launcher {
    engine_path: Utf8PathBuf,
    write_dir: Utf8PathBuf,
    isolation: bool,
    purge_missing_engine_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLaunchCommand {
    pub program: Utf8PathBuf,
    pub args: Vec<String>,
}

impl ResolvedLaunchCommand {
    /// Shell-quoted form, for logs only.
    pub fn display(&self) -> String {
        let parts =
            std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        shlex::try_join(parts)
            .unwrap_or_else(|_| format!("{} {}", self.program, self.args.join(" ")))
    }
}

impl Launcher {
    pub fn new(engine_path: impl Into<Utf8PathBuf>, write_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            engine_path: engine_path.into(),
            write_dir: write_dir.into(),
            isolation: false,
            purge_missing_engine_dir: true,
        }
    }

    pub fn from_request(request: &LaunchRequest) -> Self {
        Self::new(request.engine_path.clone(), request.write_dir.clone())
            .with_isolation(request.isolation)
            .with_engine_dir_purge(request.purge_missing_engine_dir)
    }

    pub fn with_isolation(mut self, isolation: bool) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_engine_dir_purge(mut self, enabled: bool) -> Self {
        self.purge_missing_engine_dir = enabled;
        self
    }

    pub fn engine_path(&self) -> &Utf8Path {
        &self.engine_path
    }

    /// `--write-dir <abs> [--isolation] [extra...]`
    pub fn resolve_command(
        &self,
        extra_args: &[String],
    ) -> Result<ResolvedLaunchCommand, LaunchError> {
        let write_dir = absolute_path(&self.write_dir)?;

        let mut args = vec!["--write-dir".to_string(), write_dir.into_string()];
        if self.isolation {
            args.push("--isolation".to_string());
        }
        args.extend(extra_args.iter().cloned());

        Ok(ResolvedLaunchCommand {
            program: self.engine_path.clone(),
            args,
        })
    }

    /// Supervises the engine on the current Tokio runtime. Every outcome is
    /// delivered through the returned handle; without a runtime the handle
    /// carries a single `Failed` event.
    pub fn launch(&self, extra_args: Vec<String>) -> LaunchHandle {
        match Handle::try_current() {
            Ok(runtime) => self.launch_on(&runtime, extra_args),
            Err(e) => {
                let (lifecycle, handle) = Lifecycle::new();
                lifecycle.fail(format!("Failed to launch engine: {e}"));
                handle
            }
        }
    }

    /// Like [`Launcher::launch`], on an explicit runtime. Callable from any thread.
    pub fn launch_on(&self, runtime: &Handle, extra_args: Vec<String>) -> LaunchHandle {
        let (lifecycle, handle) = Lifecycle::new();
        let launcher = self.clone();
        runtime.spawn(async move {
            launcher.supervise(extra_args, &lifecycle).await;
        });
        handle
    }

    /// Preflight, spawn, output forwarding and exit classification. Returns
    /// once the process is gone and any clean-up has finished.
    pub async fn supervise(&self, extra_args: Vec<String>, lifecycle: &Lifecycle) {
        let cmd = match self.resolve_command(&extra_args) {
            Ok(cmd) => cmd,
            Err(e) => {
                lifecycle.fail(format!("Failed to launch engine: {e}"));
                return;
            }
        };

        if !tokio::fs::try_exists(self.engine_path.as_std_path())
            .await
            .unwrap_or(false)
        {
            lifecycle.fail(MISSING_ENGINE_MESSAGE);
            if self.purge_missing_engine_dir {
                purge::purge_engine_dir(&self.engine_path).await;
            }
            return;
        }

        info!("Launching engine with command: {}", cmd.display());

        let mut command = Command::new(cmd.program.as_std_path());
        command
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        detach(&mut command);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                lifecycle.fail(format!("Failed to launch engine: {e}"));
                return;
            }
        };
        lifecycle.mark_running();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (_, _, status) = tokio::join!(
            forward_lines(stdout, lifecycle, LaunchEvent::Stdout),
            forward_lines(stderr, lifecycle, LaunchEvent::Stderr),
            child.wait(),
        );

        match status {
            Ok(status) => match status.code() {
                Some(0) => {
                    lifecycle.finish(0);
                }
                Some(code) => {
                    lifecycle.fail_exit(code, format!("Engine failed with code: {code}"));
                }
                None => {
                    lifecycle.fail(format!("Engine exited without an exit code: {status}"));
                }
            },
            Err(e) => {
                lifecycle.fail(format!("Failed to launch engine: {e}"));
            }
        }
    }
}

/// Forwards each `\n`-terminated chunk, minus that one newline.
async fn forward_lines<R>(
    stream: Option<R>,
    lifecycle: &Lifecycle,
    wrap: fn(String) -> LaunchEvent,
) where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                lifecycle.output(wrap(String::from_utf8_lossy(&buf).into_owned()));
            }
            Err(e) => {
                warn!("Engine output stream failed: {e}");
                break;
            }
        }
    }
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    command.process_group(0);
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}
