use ndarray::{ArrayD, IxDyn};
use tracing::{debug, info, warn};

use super::cache::{CacheLayout, NpyArray, read_array, write_array};
use super::options::RunOptions;
use super::simulator::{ActivitySimulator, SimulatedEpoch};
use super::{AgentType, Epoch};
use crate::config::CacheConfig;
use crate::error::{Error, Result};

/// Arrays for a list of epochs, index-aligned with the requested epochs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedActivations {
    pub agent: Option<AgentType>,
    pub epochs: Vec<Epoch>,
    pub activations: Vec<NpyArray>,
    pub rate_maps: Vec<NpyArray>,
    pub state_points: Vec<NpyArray>,
}

impl LoadedActivations {
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Human-readable description of the first epoch's arrays.
    pub fn summary_lines(&self) -> Vec<String> {
        let agent = self.agent.map_or("unknown", AgentType::as_str);
        let (Some(act), Some(rate), Some(states)) = (
            self.activations.first(),
            self.rate_maps.first(),
            self.state_points.first(),
        ) else {
            return vec![format!("No epochs loaded for {agent} agent model.")];
        };
        let a = act.shape();
        let r = rate.shape();
        let s = states.shape();
        vec![
            format!("Loaded epochs {:?} of {agent} agent model.", self.epochs),
            format!(
                "There are {} grid cells with {} x {} environment resolution, averaged over {} trajectories.",
                a[0], a[1], a[2], a[3]
            ),
            format!(
                "There are {} data points in the {}-dimensional state space.",
                s[1], s[0]
            ),
            format!(
                "There are {} data points averaged over {} trajectories in the {}-dimensional state space.",
                r[1], a[3], r[0]
            ),
        ]
    }
}

/// Flatten every axis after the first: `(shape[0], product(shape[1..]))`,
/// in the activations' own element type.
pub fn state_points(activations: &NpyArray) -> Result<NpyArray> {
    match activations {
        NpyArray::F32(array) => flatten_trailing(array).map(NpyArray::F32),
        NpyArray::F64(array) => flatten_trailing(array).map(NpyArray::F64),
    }
}

fn flatten_trailing<A: Clone>(array: &ArrayD<A>) -> Result<ArrayD<A>> {
    let Some((&rows, rest)) = array.shape().split_first() else {
        return Err(Error::Validation(
            "cannot derive state points from a 0-dimensional array".to_string(),
        ));
    };
    let cols = rest.iter().product::<usize>();
    let flat: Vec<A> = array.iter().cloned().collect();
    ArrayD::from_shape_vec(IxDyn(&[rows, cols]), flat)
        .map_err(|err| Error::Validation(err.to_string()))
}

/// Loads epochs from the activation cache, falling back to a simulator on
/// a miss and caching what it returns.
pub struct ActivationLoader<S> {
    layout: CacheLayout,
    options: RunOptions,
    simulator: S,
}

impl<S: ActivitySimulator> ActivationLoader<S> {
    /// The run id is resolved once here and reused for every epoch.
    pub fn new(cache: &CacheConfig, options: RunOptions, simulator: S) -> Self {
        let layout = CacheLayout::new(cache, options.run_id());
        Self {
            layout,
            options,
            simulator,
        }
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    /// Agent names other than "single" / "dual" fail before any I/O.
    pub fn load_activations(
        &mut self,
        epochs: &[Epoch],
        agent_type: &str,
        verbose: bool,
    ) -> Result<LoadedActivations> {
        let agent: AgentType = agent_type.parse()?;
        self.load(epochs, agent, verbose)
    }

    pub fn load(
        &mut self,
        epochs: &[Epoch],
        agent: AgentType,
        verbose: bool,
    ) -> Result<LoadedActivations> {
        let mut out = LoadedActivations {
            agent: Some(agent),
            ..LoadedActivations::default()
        };

        for &epoch in epochs {
            let SimulatedEpoch {
                activations,
                rate_map,
            } = self.load_epoch(agent, epoch)?;
            out.state_points.push(state_points(&activations)?);
            out.activations.push(activations);
            out.rate_maps.push(rate_map);
            out.epochs.push(epoch);
        }

        if verbose {
            for line in out.summary_lines() {
                info!("{line}");
            }
        }
        Ok(out)
    }

    /// Only arrays that pass `check_shapes` reach the cache, so a bad
    /// simulator run is retried on the next load.
    fn load_epoch(&mut self, agent: AgentType, epoch: Epoch) -> Result<SimulatedEpoch> {
        let paths = self.layout.paths(agent, epoch);
        if paths.exists() {
            debug!("cache hit: {agent} epoch {epoch}");
            let cached = SimulatedEpoch {
                activations: read_array(&paths.activations)?,
                rate_map: read_array(&paths.rate_map)?,
            };
            check_shapes(epoch, &cached)?;
            return Ok(cached);
        }

        debug!("cache miss: {agent} epoch {epoch}, running simulator");
        let simulated = self
            .simulator
            .simulate(agent, &self.options, epoch, &paths)?;
        if let Err(err) = check_shapes(epoch, &simulated) {
            // The simulator may have written straight to the cache paths.
            warn!("rejected simulator output for {agent} epoch {epoch}: {err}");
            paths.discard();
            return Err(err);
        }
        write_array(&paths.activations, &simulated.activations)?;
        write_array(&paths.rate_map, &simulated.rate_map)?;
        Ok(simulated)
    }
}

fn check_shapes(epoch: Epoch, arrays: &SimulatedEpoch) -> Result<()> {
    let activations = &arrays.activations;
    if activations.ndim() != 4 {
        return Err(Error::Validation(format!(
            "epoch {epoch}: activations must be [cell, x, y, trajectory], got shape {:?}",
            activations.shape()
        )));
    }
    let rate_map = &arrays.rate_map;
    if rate_map.ndim() < 2 {
        return Err(Error::Validation(format!(
            "epoch {epoch}: rate map must have at least 2 axes, got shape {:?}",
            rate_map.shape()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    #[test]
    fn state_points_flatten_trailing_axes() {
        let act = Array::from_shape_fn(IxDyn(&[3, 2, 2, 5]), |ix| {
            (ix[0] * 100 + ix[1] * 10 + ix[2] * 5 + ix[3]) as f32
        });
        let states = state_points(&NpyArray::F32(act.clone())).unwrap();
        let states = states.as_f32().unwrap();
        assert_eq!(states.shape(), &[3, 20]);
        assert_eq!(states[[1, 0]], 100.0);
        // row-major: [cell, x=1, y=0, traj=3] -> column 1*10 + 0*5 + 3
        assert_eq!(states[[2, 13]], act[[2, 1, 0, 3]]);
    }

    #[test]
    fn state_points_keep_f64() {
        let act = Array::from_elem(IxDyn(&[2, 3, 1, 1]), 0.1f64);
        let states = state_points(&NpyArray::F64(act)).unwrap();
        assert_eq!(states.dtype(), "float64");
        assert_eq!(states.shape(), &[2, 3]);
        assert!(states.as_f64().unwrap().iter().all(|&v| v == 0.1));
    }

    #[test]
    fn state_points_of_scalar_fail() {
        let scalar = NpyArray::F32(Array::from_elem(IxDyn(&[]), 1.0f32));
        assert!(matches!(state_points(&scalar), Err(Error::Validation(_))));
    }

    #[test]
    fn summary_reports_first_epoch_dimensions() {
        let act = NpyArray::F32(Array::zeros(IxDyn(&[8, 4, 6, 3])));
        let rate = NpyArray::F64(Array::zeros(IxDyn(&[8, 24])));
        let loaded = LoadedActivations {
            agent: Some(AgentType::Single),
            epochs: vec![0, 5],
            state_points: vec![state_points(&act).unwrap()],
            activations: vec![act],
            rate_maps: vec![rate],
        };
        let lines = loaded.summary_lines();
        assert_eq!(lines[0], "Loaded epochs [0, 5] of single agent model.");
        assert_eq!(
            lines[1],
            "There are 8 grid cells with 4 x 6 environment resolution, averaged over 3 trajectories."
        );
        assert_eq!(lines[2], "There are 72 data points in the 8-dimensional state space.");
        assert_eq!(
            lines[3],
            "There are 24 data points averaged over 3 trajectories in the 8-dimensional state space."
        );
    }

    #[test]
    fn empty_summary_has_one_line() {
        let loaded = LoadedActivations {
            agent: Some(AgentType::Dual),
            ..LoadedActivations::default()
        };
        assert_eq!(loaded.summary_lines(), vec!["No epochs loaded for dual agent model."]);
    }

    #[test]
    fn shape_check_rejects_three_axes() {
        let arrays = SimulatedEpoch {
            activations: NpyArray::F32(Array::zeros(IxDyn(&[2, 2, 2]))),
            rate_map: NpyArray::F32(Array::zeros(IxDyn(&[2, 4]))),
        };
        assert!(check_shapes(1, &arrays).is_err());
    }

    #[test]
    fn shape_check_rejects_flat_rate_map() {
        let arrays = SimulatedEpoch {
            activations: NpyArray::F32(Array::zeros(IxDyn(&[2, 2, 2, 2]))),
            rate_map: NpyArray::F64(Array::zeros(IxDyn(&[8]))),
        };
        assert!(check_shapes(1, &arrays).is_err());
    }
}
