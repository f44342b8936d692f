use crate::config::BridgeSettings;
use crate::error::LabError;
use crate::model::CommandKind;
use crate::resolver::ResolvedCommands;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

/// Host capability that runs a command string outside of labdeck. It is a
/// one-way handoff: nothing about the command's outcome comes back.
pub trait ExecutionBridge {
    fn name(&self) -> &str;
    fn run_command(&self, command: &str);
}

/// Runs commands through a host program such as `sh -c` or a terminal
/// emulator, with the command appended as the final argument.
#[derive(Debug, Clone)]
pub struct HostShellBridge {
    program: PathBuf,
    args: Vec<String>,
    label: String,
}

impl HostShellBridge {
    /// Returns the bridge only when it is enabled and its program resolves.
    pub fn probe(settings: &BridgeSettings) -> Option<Self> {
        if !settings.enabled {
            return None;
        }

        let program = resolve_program(&settings.program)?;
        let label = std::iter::once(settings.program.as_str())
            .chain(settings.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        Some(Self {
            program,
            args: settings.args.clone(),
            label,
        })
    }
}

impl ExecutionBridge for HostShellBridge {
    fn name(&self) -> &str {
        &self.label
    }

    fn run_command(&self, command: &str) {
        let spawned = TokioCommand::new(&self.program)
            .args(&self.args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => debug!("bridge spawned pid={:?} for command", child.id()),
            Err(error) => warn!("bridge failed to spawn {}: {error}", self.program.display()),
        }
    }
}

/// Forwards resolved commands to the execution bridge, if the host has one.
pub struct Dispatcher {
    bridge: Option<Box<dyn ExecutionBridge>>,
}

impl Dispatcher {
    pub fn new(bridge: Option<Box<dyn ExecutionBridge>>) -> Self {
        Self { bridge }
    }

    pub fn unavailable() -> Self {
        Self { bridge: None }
    }

    pub fn bridge_name(&self) -> Option<&str> {
        self.bridge.as_ref().map(|bridge| bridge.name())
    }

    /// Hands the resolved command of `kind` to the bridge. A missing command
    /// is reported before bridge availability is checked.
    pub fn execute(&self, resolved: &ResolvedCommands, kind: CommandKind) -> Result<(), LabError> {
        let command = resolved.command(kind)?;

        let Some(bridge) = self.bridge.as_ref() else {
            return Err(LabError::ExecutionUnavailable);
        };

        debug!("dispatching {} command via {}", kind.label(), bridge.name());
        bridge.run_command(command);
        Ok(())
    }
}

fn resolve_program(program: &str) -> Option<PathBuf> {
    let program = program.trim();
    if program.is_empty() {
        return None;
    }

    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| executable_candidates(&dir, program))
        .find(|path| path.is_file())
}

fn executable_candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    if cfg!(windows) && Path::new(program).extension().is_none() {
        vec![
            dir.join(format!("{program}.exe")),
            dir.join(format!("{program}.cmd")),
            dir.join(program),
        ]
    } else {
        vec![dir.join(program)]
    }
}
