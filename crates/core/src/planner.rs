//! Resource planning for the transcoding engine.
//!
//! Translates a coarse utilization fraction into the worker and pool counts
//! handed to the software encoder. Only one engine process runs at a time, so
//! a plan describes the whole budget of the run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigError;

/// Share of the host's processing units given to the engine.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum UtilizationFraction {
    /// 25%
    Quarter,
    /// 50%
    Half,
    /// 75%
    ThreeQuarters,
    /// 100%
    #[default]
    Full,
}

impl UtilizationFraction {
    /// All fractions in ascending order.
    pub const ALL: [UtilizationFraction; 4] =
        [Self::Quarter, Self::Half, Self::ThreeQuarters, Self::Full];

    /// The fraction as a whole percentage.
    pub fn percent(self) -> u8 {
        match self {
            Self::Quarter => 25,
            Self::Half => 50,
            Self::ThreeQuarters => 75,
            Self::Full => 100,
        }
    }
}

impl TryFrom<u8> for UtilizationFraction {
    type Error = ConfigError;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        match percent {
            25 => Ok(Self::Quarter),
            50 => Ok(Self::Half),
            75 => Ok(Self::ThreeQuarters),
            100 => Ok(Self::Full),
            other => Err(ConfigError::InvalidFraction(other)),
        }
    }
}

impl From<UtilizationFraction> for u8 {
    fn from(fraction: UtilizationFraction) -> Self {
        fraction.percent()
    }
}

impl fmt::Display for UtilizationFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Concrete parallelism handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePlan {
    /// Encoder worker threads. Always at least 1.
    pub workers: usize,
    /// Encoder thread pools (software mode only). Always at least 1.
    pub pools: usize,
    /// Processing units the plan was derived from.
    pub total_units: usize,
}

impl ResourcePlan {
    /// Plans against the processing units reported by the host.
    pub fn for_host(fraction: UtilizationFraction) -> Self {
        plan(fraction, num_cpus::get())
    }
}

/// Derives a resource plan from a fraction and a processing-unit count.
///
/// `workers = max(1, floor(units * percent / 100))` and
/// `pools = max(1, floor(workers / 2))`.
pub fn plan(fraction: UtilizationFraction, total_units: usize) -> ResourcePlan {
    let workers = (total_units * fraction.percent() as usize / 100).max(1);
    let pools = (workers / 2).max(1);

    ResourcePlan {
        workers,
        pools,
        total_units,
    }
}
