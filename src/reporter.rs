//! The single-stream reporter: one output file, one frame appended per
//! scheduled invocation. Suitable as an entry in a driver's reporter list,
//! alongside other reporters it polls each step boundary.

use std::{
    fs::File,
    io,
    io::{BufWriter, ErrorKind, Write},
    path::Path,
};

use crate::{
    ReporterOptions,
    g96::G96Frame,
    schedule::{NextReport, steps_until_report},
    sim::{Simulation, State},
};

/// Writes a series of frames from a driving simulation to one G96 file.
///
/// The output file is created (truncating any previous contents) at
/// construction, and held open until [`G96Reporter::close`] or drop.
#[derive(Debug)]
pub struct G96Reporter {
    report_interval: u64,
    out: Option<BufWriter<File>>,
}

impl G96Reporter {
    /// Opens `path` for writing. Unsupported options are rejected before any
    /// file is created or truncated.
    pub fn new(path: &Path, report_interval: u64, options: &ReporterOptions) -> io::Result<Self> {
        options.validate()?;

        if report_interval == 0 {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                "Report interval must be positive",
            ));
        }

        let out = BufWriter::new(File::create(path)?);

        Ok(Self {
            report_interval,
            out: Some(out),
        })
    }

    /// How many steps the driver must take before invoking this reporter, and
    /// which quantities to compute. Positions-only: `report` re-fetches a full
    /// state itself.
    pub fn describe_next_report(&self, sim: &dyn Simulation) -> NextReport {
        NextReport::positions(steps_until_report(self.report_interval, sim.current_step()))
    }

    /// Appends one frame for the current step. The caller-supplied state is of
    /// unknown completeness (it may omit velocities), so the full state is
    /// always re-queried from the driver.
    pub fn report(&mut self, sim: &dyn Simulation, _state: &State) -> io::Result<()> {
        let state = sim.state()?;

        let out = self
            .out
            .as_mut()
            .ok_or_else(|| io::Error::other("Reporter is closed"))?;

        let frame = G96Frame::from_state(String::new(), sim.current_step(), state)?;
        writeln!(out, "{frame}")?;

        Ok(())
    }

    /// Flushes and releases the output stream. Safe to call more than once.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(mut out) = self.out.take() {
            out.flush()?;
        }
        Ok(())
    }
}
