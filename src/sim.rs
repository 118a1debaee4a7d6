//! The driver contract: what a reporter needs from the simulation engine that
//! invokes it. The engine itself (force field, integrator, thermostat) is a
//! black box; reporters only read snapshots from it, and never mutate it.

use std::io;

use lin_alg::f64::Vec3;

/// A snapshot of the simulated system at one instant, as supplied by the driver.
#[derive(Clone, Debug)]
pub struct State {
    /// ps
    pub time: f64,
    /// nm
    pub positions: Vec<Vec3>,
    /// nm/ps. Same length and atom ordering as `positions`.
    pub velocities: Vec<Vec3>,
    /// nm. Diagonal of the orthorhombic periodic box, if the system has one.
    pub box_vectors: Option<Vec3>,
}

/// The driving simulation engine. Implemented by the host application over
/// whatever MD engine it embeds.
pub trait Simulation {
    /// Absolute number of integration steps taken so far. Monotonically
    /// non-decreasing.
    fn current_step(&self) -> u64;

    /// A snapshot of the whole system, with both positions and velocities
    /// populated.
    fn state(&self) -> io::Result<State>;
}

/// A ring-polymer (path-integral) driver: an ensemble of coupled copies of the
/// system, each with its own coordinates and velocities, sharing one clock.
pub trait RpmdSimulation: Simulation {
    /// Number of copies (beads) in the ring polymer.
    fn num_copies(&self) -> usize;

    /// A snapshot of one copy's own coordinates and velocities.
    fn copy_state(&self, copy: usize) -> io::Result<State>;
}
