//! Engine settings, loadable from TOML.
//!
//! ```toml
//! [fd]
//! t_grid = 100
//! x_grid = 200
//! scheme = { kind = "Douglas", theta = 0.5, mu = 0.0 }
//!
//! [tree]
//! time_steps = 801
//! binomial = "LeisenReimer"
//!
//! [mc]
//! samples = 32768
//! antithetic = true
//! ```
//!
//! Every table and field is optional; missing values take their defaults.

use qn_core::{errors::Result, Error, Real, Size};
use qn_methods::{BinomialType, FdmSchemeDesc};
use serde::{Deserialize, Serialize};

/// Settings of every engine family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Finite-difference engines.
    pub fd: FdConfig,
    /// Lattice engines.
    pub tree: TreeConfig,
    /// Monte Carlo engines.
    pub mc: McConfig,
}

/// Finite-difference grid and scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FdConfig {
    /// Time steps.
    pub t_grid: Size,
    /// Points along the first (spot or short-rate) direction.
    pub x_grid: Size,
    /// Points along the second (variance or second factor) direction.
    pub v_grid: Size,
    /// Implicit Euler steps before the scheme takes over.
    pub damping_steps: Size,
    /// Time-stepping scheme.
    pub scheme: FdmSchemeDesc,
}

impl Default for FdConfig {
    fn default() -> Self {
        Self {
            t_grid: 100,
            x_grid: 100,
            v_grid: 50,
            damping_steps: 0,
            scheme: FdmSchemeDesc::douglas(),
        }
    }
}

/// Tree size and binomial variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Time steps of the lattice.
    pub time_steps: Size,
    /// Binomial tree variant for equity lattices.
    pub binomial: BinomialType,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            time_steps: 500,
            binomial: BinomialType::default(),
        }
    }
}

/// Simulation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McConfig {
    /// Paths used for the estimate (antithetic pairs count once).
    pub samples: Size,
    /// Random seed.
    pub seed: u64,
    /// Path time steps per year of maturity.
    pub time_steps_per_year: Size,
    /// Whether to average each path with its antithetic mirror.
    pub antithetic: bool,
    /// Paths used to fit the Longstaff-Schwartz regression.
    pub calibration_samples: Size,
}

impl Default for McConfig {
    fn default() -> Self {
        Self {
            samples: 10_000,
            seed: 42,
            time_steps_per_year: 50,
            antithetic: true,
            calibration_samples: 4096,
        }
    }
}

impl McConfig {
    /// Time steps for a path up to `maturity`, at least one.
    pub fn time_steps(&self, maturity: Real) -> Size {
        ((self.time_steps_per_year as Real * maturity).ceil() as Size).max(1)
    }

    /// Fails with [`Error::InvalidArgument`] on unusable settings.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidArgument(msg));
        if self.samples < 2 {
            return invalid(format!("mc.samples must be at least 2, got {}", self.samples));
        }
        if self.time_steps_per_year == 0 {
            return invalid("mc.time_steps_per_year must be positive".into());
        }
        if self.calibration_samples == 0 {
            return invalid("mc.calibration_samples must be positive".into());
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| Error::InvalidArgument(format!("engine configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self)
            .map_err(|e| Error::InvalidArgument(format!("engine configuration: {e}")))
    }

    /// Fails with [`Error::InvalidArgument`] on unusable settings.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidArgument(msg));
        let fd = &self.fd;
        if fd.t_grid == 0 {
            return invalid("fd.t_grid must be positive".into());
        }
        if fd.x_grid < 3 || fd.v_grid < 3 {
            return invalid(format!(
                "fd grids need at least three points, got x_grid = {}, v_grid = {}",
                fd.x_grid, fd.v_grid
            ));
        }
        if fd.damping_steps > fd.t_grid {
            return invalid(format!(
                "fd.damping_steps ({}) exceeds fd.t_grid ({})",
                fd.damping_steps, fd.t_grid
            ));
        }
        fd.scheme
            .validate()
            .map_err(|e| Error::InvalidArgument(format!("fd.scheme: {e}")))?;
        if self.tree.time_steps == 0 {
            return invalid("tree.time_steps must be positive".into());
        }
        self.mc.validate()
    }
}
