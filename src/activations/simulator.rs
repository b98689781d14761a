use std::process::Command;

use tracing::info;

use super::cache::{CachePaths, NpyArray, read_array};
use super::options::RunOptions;
use super::{AgentType, Epoch};
use crate::config::SimulatorConfig;
use crate::error::{Error, Result};

/// Arrays produced by one simulator run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedEpoch {
    pub activations: NpyArray,
    pub rate_map: NpyArray,
}

/// Produces activations for an epoch the cache does not hold.
pub trait ActivitySimulator {
    /// `target` is where the loader will cache the result; implementations
    /// may write there directly but are not required to.
    fn simulate(
        &mut self,
        agent: AgentType,
        options: &RunOptions,
        epoch: Epoch,
        target: &CachePaths,
    ) -> Result<SimulatedEpoch>;
}

/// Runs an external program that writes both arrays as `.npy` files.
///
/// Invoked as `<command> <args..> --agent <type> --epoch <n> --run-id <id>
/// --activations <path> --rate-map <path>`.
#[derive(Debug, Clone, Default)]
pub struct CommandSimulator {
    command: Option<String>,
    args: Vec<String>,
}

impl CommandSimulator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            args: Vec::new(),
        }
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn build(
        &self,
        program: &str,
        agent: AgentType,
        options: &RunOptions,
        epoch: Epoch,
        target: &CachePaths,
    ) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(&self.args)
            .arg("--agent")
            .arg(agent.as_str())
            .arg("--epoch")
            .arg(epoch.to_string())
            .arg("--run-id")
            .arg(options.run_id())
            .arg("--activations")
            .arg(&target.activations)
            .arg("--rate-map")
            .arg(&target.rate_map);
        cmd
    }
}

impl ActivitySimulator for CommandSimulator {
    fn simulate(
        &mut self,
        agent: AgentType,
        options: &RunOptions,
        epoch: Epoch,
        target: &CachePaths,
    ) -> Result<SimulatedEpoch> {
        let program = self.command.as_deref().ok_or(Error::SimulatorUnavailable)?;
        for path in [&target.activations, &target.rate_map] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
            }
        }

        info!("simulating {agent} agent epoch {epoch} with {program}");
        let output = self
            .build(program, agent, options, epoch, target)
            .output()
            .map_err(|err| Error::io(program, err))?;
        if !output.status.success() {
            return Err(Error::SimulatorFailed {
                epoch,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(SimulatedEpoch {
            activations: read_array(&target.activations)?,
            rate_map: read_array(&target.rate_map)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn target() -> CachePaths {
        CachePaths {
            activations: PathBuf::from("/tmp/neuroplot_sim/a.npy"),
            rate_map: PathBuf::from("/tmp/neuroplot_sim/r.npy"),
        }
    }

    #[test]
    fn unconfigured_command_is_unavailable() {
        let mut sim = CommandSimulator::from_config(&SimulatorConfig::default());
        let err = sim
            .simulate(AgentType::Single, &RunOptions::default(), 3, &target())
            .unwrap_err();
        assert!(matches!(err, Error::SimulatorUnavailable));
    }

    #[test]
    fn command_line_carries_epoch_and_paths() {
        let sim = CommandSimulator::new("python").with_args(["-m", "grid_cells.export"]);
        let cmd = sim.build("python", AgentType::Dual, &RunOptions::default(), 7, &target());
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[..2], ["-m", "grid_cells.export"]);
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("--agent") + 1], "dual");
        assert_eq!(args[pos("--epoch") + 1], "7");
        assert_eq!(args[pos("--run-id") + 1], RunOptions::default().run_id());
        assert_eq!(args[pos("--rate-map") + 1], "/tmp/neuroplot_sim/r.npy");
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_reports_status() {
        let mut sim = CommandSimulator::new("false");
        let err = sim
            .simulate(AgentType::Single, &RunOptions::default(), 2, &target())
            .unwrap_err();
        assert!(matches!(err, Error::SimulatorFailed { epoch: 2, .. }));
    }
}
