//! Reporters that save molecular-dynamics trajectories in the GROMOS96 (G96)
//! text format. A driving simulation engine polls each reporter for when it
//! next needs to run ([`schedule::NextReport`]), advances that many steps,
//! then hands over a state snapshot; the reporter appends one frame per
//! invocation. Includes a per-copy variant for ring-polymer (RPMD) drivers,
//! which keeps one trajectory file open per bead.

pub mod g96;
pub mod schedule;
pub mod sim;
mod reporter;
mod rpmd;

use std::{io, io::ErrorKind};

pub use g96::G96Frame;
pub use reporter::*;
pub use rpmd::*;
pub use schedule::NextReport;
pub use sim::{RpmdSimulation, Simulation, State};

/// Optional reporter configuration. Both fields are part of the driver
/// protocol, but neither is supported here; setting one fails construction.
#[derive(Clone, Debug, Default)]
pub struct ReporterOptions {
    /// Wrap coordinates back into the periodic box before writing.
    pub enforce_periodic_box: bool,
    /// Write only these atom indices. Empty means the whole system.
    pub atom_subset: Vec<usize>,
}

impl ReporterOptions {
    /// Checked by every reporter constructor, before any file I/O.
    pub(crate) fn validate(&self) -> io::Result<()> {
        if self.enforce_periodic_box {
            return Err(io::Error::new(
                ErrorKind::Unsupported,
                "enforce_periodic_box is not implemented",
            ));
        }

        if !self.atom_subset.is_empty() {
            return Err(io::Error::new(
                ErrorKind::Unsupported,
                "atom_subset is not implemented; only whole-system output is supported",
            ));
        }

        Ok(())
    }
}
