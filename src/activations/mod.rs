//! Grid-cell RNN activations: cached `.npy` arrays per (agent, epoch),
//! recomputed through an external simulator on a miss.

pub mod cache;
pub mod loader;
pub mod options;
pub mod rate_map;
pub mod simulator;

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub use cache::{CacheLayout, CachePaths, NpyArray};
pub use loader::{ActivationLoader, LoadedActivations, state_points};
pub use options::RunOptions;
pub use rate_map::{mean_rate_map, plot_rate_map};
pub use simulator::{ActivitySimulator, CommandSimulator, SimulatedEpoch};

pub type Epoch = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentType {
    Single,
    Dual,
}

impl AgentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentType::Single => "single",
            AgentType::Dual => "dual",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(AgentType::Single),
            "dual" => Ok(AgentType::Dual),
            other => Err(Error::UnknownAgentType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_type_parses_known_names() {
        assert_eq!("single".parse::<AgentType>().unwrap(), AgentType::Single);
        assert_eq!("dual".parse::<AgentType>().unwrap(), AgentType::Dual);
        assert_eq!(AgentType::Dual.to_string(), "dual");
    }

    #[test]
    fn agent_type_rejects_unknown_names() {
        for bad in ["triple", "Single", "", " dual"] {
            let err = bad.parse::<AgentType>().unwrap_err();
            assert!(matches!(err, Error::UnknownAgentType(ref name) if name == bad));
        }
    }
}
