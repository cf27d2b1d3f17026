use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use skirmish_config::{CONNECTION_FILE_NAME, LAUNCHER_VERSION, SCRIPT_FILE_NAME};
use skirmish_core::{render_script, ConnectionDescriptor, LaunchRequest, Rendezvous, ScriptContext};
use skirmish_infra::{absolute_path, LaunchHandle, Launcher, Lifecycle};
use tracing::{debug, error};

use crate::ports::EngineSettingsPort;
use crate::settings::FileEngineSettings;

/// Turns a [`LaunchRequest`] into a supervised engine process.
///
/// `launch` never fails and never blocks: settings, artifact writes and the
/// process itself run on a spawned task and report through the returned
/// [`LaunchHandle`]. A failure can therefore only be observed after `launch`
/// has returned.
pub struct LaunchOrchestrator {
    rendezvous: Rendezvous,
    settings: Arc<dyn EngineSettingsPort>,
    launcher_version: String,
    runtime: tokio::runtime::Handle,
}

impl LaunchOrchestrator {
    pub fn new(rendezvous: Rendezvous) -> anyhow::Result<Self> {
        Ok(Self {
            rendezvous,
            settings: Arc::new(FileEngineSettings),
            launcher_version: LAUNCHER_VERSION.to_string(),
            runtime: crate::async_runtime::handle()?,
        })
    }

    pub fn with_settings_port(mut self, settings: impl EngineSettingsPort) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    pub fn with_launcher_version(mut self, version: impl Into<String>) -> Self {
        self.launcher_version = version.into();
        self
    }

    pub fn rendezvous(&self) -> &Rendezvous {
        &self.rendezvous
    }

    pub fn launch(&self, request: LaunchRequest, extra_args: Vec<String>) -> LaunchHandle {
        let (lifecycle, handle) = Lifecycle::new();
        let job = LaunchJob {
            request,
            extra_args,
            rendezvous: self.rendezvous.clone(),
            settings: Arc::clone(&self.settings),
            launcher_version: self.launcher_version.clone(),
        };
        self.runtime.spawn(async move {
            job.run(&lifecycle).await;
        });
        handle
    }
}

struct LaunchJob {
    request: LaunchRequest,
    extra_args: Vec<String>,
    rendezvous: Rendezvous,
    settings: Arc<dyn EngineSettingsPort>,
    launcher_version: String,
}

impl LaunchJob {
    async fn run(self, lifecycle: &Lifecycle) {
        if let Err(message) = self.apply_settings().await {
            lifecycle.fail(message);
            return;
        }

        let write_dir = match absolute_path(&self.request.write_dir) {
            Ok(dir) => dir,
            Err(e) => {
                lifecycle.fail(format!("Failed to resolve write directory: {e}"));
                return;
            }
        };

        // The start script replaces the caller's arguments; the connection
        // file mode passes them through.
        let extra_args = if self.request.use_external_config_file {
            match self.write_script(&write_dir).await {
                Ok(script_path) => vec![script_path.into_string()],
                Err(message) => {
                    lifecycle.fail(message);
                    return;
                }
            }
        } else {
            if let Err(message) = self.write_connection_file(&write_dir).await {
                lifecycle.fail(message);
                return;
            }
            self.extra_args.clone()
        };

        Launcher::from_request(&self.request)
            .supervise(extra_args, lifecycle)
            .await;
    }

    async fn apply_settings(&self) -> Result<(), String> {
        let settings = Arc::clone(&self.settings);
        let write_dir = self.request.write_dir.clone();
        let patch = self.request.settings.clone();

        match tokio::task::spawn_blocking(move || settings.apply(&write_dir, &patch)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("{e:#}")),
            Err(e) => Err(format!("Engine settings task failed: {e}")),
        }
    }

    async fn write_script(&self, write_dir: &Utf8Path) -> Result<Utf8PathBuf, String> {
        let script = render_script(
            &self.request.match_options,
            &ScriptContext {
                rendezvous: &self.rendezvous,
                write_path: write_dir.as_str(),
                launcher_version: &self.launcher_version,
            },
        );
        let path = write_dir.join(SCRIPT_FILE_NAME);
        write_artifact(&path, script.into_bytes())
            .await
            .map_err(|e| format!("Failed to write start script {path}: {e}"))?;
        debug!("Wrote start script to {path}");
        Ok(path)
    }

    async fn write_connection_file(&self, write_dir: &Utf8Path) -> Result<(), String> {
        let descriptor =
            ConnectionDescriptor::new(&self.rendezvous, write_dir.as_str(), &self.launcher_version);
        let path = write_dir.join(CONNECTION_FILE_NAME);
        let json = serde_json::to_vec(&descriptor)
            .map_err(|e| format!("Failed to encode connection file: {e}"))?;
        write_artifact(&path, json)
            .await
            .map_err(|e| format!("Failed to write connection file {path}: {e}"))?;
        debug!("Wrote connection file to {path}");
        Ok(())
    }
}

async fn write_artifact(path: &Utf8Path, contents: Vec<u8>) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(path, contents).await.inspect_err(|e| {
        error!("Writing {path} failed: {e}");
    })
}
