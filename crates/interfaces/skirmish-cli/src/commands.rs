use crate::{config_store, LaunchOverrides};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use skirmish_app_core::LaunchOrchestrator;
use skirmish_config::LAUNCHER_VERSION;
use skirmish_core::{render_script, LaunchEvent, ProcessState, Rendezvous, ScriptContext};
use skirmish_infra::{absolute_path, Bridge};
use std::io::Write;

/// Runs one engine session and returns the process exit code for the CLI.
pub async fn cmd_launch(
    config: Option<Utf8PathBuf>,
    overrides: LaunchOverrides,
    extra_args: Vec<String>,
) -> Result<i32> {
    let store = config_store(config)?;
    let mut launcher_config = store.load()?;
    overrides.apply(&mut launcher_config);
    let request = launcher_config.to_request()?;

    let bridge = Bridge::bind()
        .await
        .context("Failed to open the launcher bridge")?;
    tracing::debug!("Bridge listening on {}", bridge.rendezvous());

    let orchestrator = LaunchOrchestrator::new(bridge.rendezvous().clone())?;
    let mut handle = orchestrator.launch(request, extra_args);

    while let Some(event) = handle.next_event().await {
        match event {
            LaunchEvent::Stdout(line) => println!("{line}"),
            LaunchEvent::Stderr(line) => eprintln!("{line}"),
            LaunchEvent::Finished(code) => {
                tracing::info!("Engine finished with code {code}");
            }
            LaunchEvent::Failed(reason) => eprintln!(":: {reason}"),
        }
    }

    Ok(exit_code_for(&handle.state()))
}

pub fn exit_code_for(state: &ProcessState) -> i32 {
    match state {
        ProcessState::Finished { exit_code: 0 } => 0,
        _ => 1,
    }
}

/// Prints the start script that a launch with this configuration would write.
pub fn cmd_script(
    config: Option<Utf8PathBuf>,
    address: String,
    port: u16,
    out: &mut impl Write,
) -> Result<()> {
    let launcher_config = config_store(config)?.load()?;
    let write_path = if launcher_config.write_path.is_empty() {
        String::new()
    } else {
        absolute_path(Utf8Path::new(&launcher_config.write_path))?.into_string()
    };

    let rendezvous = Rendezvous { address, port };
    let script = render_script(
        &launcher_config.launch.match_options,
        &ScriptContext {
            rendezvous: &rendezvous,
            write_path: &write_path,
            launcher_version: LAUNCHER_VERSION,
        },
    );
    writeln!(out, "{script}")?;
    Ok(())
}

pub fn cmd_config_path(out: &mut impl Write) -> Result<()> {
    let store = config_store(None)?;
    writeln!(out, "{}", store.path().display())?;
    Ok(())
}

pub fn cmd_config_show(config: Option<Utf8PathBuf>, out: &mut impl Write) -> Result<()> {
    let launcher_config = config_store(config)?.load()?;
    writeln!(out, "{}", serde_json::to_string_pretty(&launcher_config)?)?;
    Ok(())
}
