//! The ring-polymer (RPMD) reporter: one output file per copy of the system.
//! The copy count lives in the driver's integrator, so streams can't be opened
//! until the first report; until then the reporter only knows its naming
//! template. Stale per-copy files from a previous run are deleted up front so
//! a shorter rerun can't leave a mix of old and new trajectories behind.

use std::{
    fs,
    fs::File,
    io,
    io::{BufWriter, ErrorKind, Write},
    mem,
    path::{Path, PathBuf},
};

use regex::Regex;

use crate::{
    ReporterOptions,
    g96::G96Frame,
    schedule::{NextReport, steps_until_report},
    sim::{RpmdSimulation, State},
};

/// Per-copy output streams. Opening is deferred until the copy count is known.
#[derive(Debug)]
enum Streams {
    Uninitialized,
    Open(Vec<BufWriter<File>>),
    Closed,
}

/// Writes one G96 trajectory per ring-polymer copy. A template path like
/// `traj_bead.g96` produces `traj_bead_0.g96`, `traj_bead_1.g96`, ...
#[derive(Debug)]
pub struct G96RpmdReporter {
    template: PathBuf,
    report_interval: u64,
    streams: Streams,
}

impl G96RpmdReporter {
    /// Validates options, then clears any files matching the per-copy naming
    /// pattern from a previous run. No streams are opened yet.
    pub fn new(
        template: &Path,
        report_interval: u64,
        options: &ReporterOptions,
    ) -> io::Result<Self> {
        options.validate()?;

        if report_interval == 0 {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                "Report interval must be positive",
            ));
        }

        remove_stale_copies(template)?;

        Ok(Self {
            template: template.to_path_buf(),
            report_interval,
            streams: Streams::Uninitialized,
        })
    }

    /// Same negotiation as the single-stream reporter: positions-only, since
    /// `report` fetches each copy's state itself.
    pub fn describe_next_report(&self, sim: &dyn RpmdSimulation) -> NextReport {
        NextReport::positions(steps_until_report(self.report_interval, sim.current_step()))
    }

    /// Appends one frame per copy, each to its own stream. On the first call,
    /// queries the copy count and opens all streams. A failure on one copy
    /// aborts the call; streams already written this call keep their frame.
    pub fn report(&mut self, sim: &dyn RpmdSimulation, _state: &State) -> io::Result<()> {
        if let Streams::Uninitialized = self.streams {
            let n = sim.num_copies();

            let mut outs = Vec::with_capacity(n);
            for i in 0..n {
                outs.push(BufWriter::new(File::create(copy_path(&self.template, i))?));
            }

            self.streams = Streams::Open(outs);
        }

        let Streams::Open(outs) = &mut self.streams else {
            return Err(io::Error::other("Reporter is closed"));
        };

        let step = sim.current_step();

        for (i, out) in outs.iter_mut().enumerate() {
            let state = sim.copy_state(i)?;
            let frame = G96Frame::from_state(format!("copy {i}"), step, state)?;
            writeln!(out, "{frame}")?;
        }

        Ok(())
    }

    /// Flushes and releases all streams (none, if no report ever ran). Safe to
    /// call more than once.
    pub fn close(&mut self) -> io::Result<()> {
        if let Streams::Open(outs) = mem::replace(&mut self.streams, Streams::Closed) {
            for mut out in outs {
                out.flush()?;
            }
        }
        Ok(())
    }
}

/// The output path for one copy: the template's file name with `.g96` replaced
/// by `_<copy>.g96`.
fn copy_path(template: &Path, copy: usize) -> PathBuf {
    let name = template
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = match name.strip_suffix(".g96") {
        Some(stem) => format!("{stem}_{copy}.g96"),
        None => format!("{name}_{copy}"),
    };

    template.with_file_name(name)
}

/// Deletes files left by a previous run whose names match the per-copy pattern
/// derived from `template`, in the template's directory.
fn remove_stale_copies(template: &Path) -> io::Result<()> {
    let dir = match template.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if !dir.is_dir() {
        return Ok(()); // Opening the streams will report the real problem.
    }

    let name = template
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let pattern = match name.strip_suffix(".g96") {
        Some(stem) => format!("^{}_\\d+\\.g96$", regex::escape(stem)),
        None => format!("^{}_\\d+$", regex::escape(&name)),
    };

    let re = Regex::new(&pattern)
        .map_err(|e| io::Error::new(ErrorKind::InvalidInput, e.to_string()))?;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if re.is_match(&entry.file_name().to_string_lossy()) {
            fs::remove_file(entry.path())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use lin_alg::f64::Vec3;

    use super::*;
    use crate::sim::Simulation;

    /// A three-copy ring polymer of one particle; copies offset so each
    /// trajectory is distinguishable.
    struct MockRpmdSim {
        step: u64,
        copies: usize,
    }

    impl Simulation for MockRpmdSim {
        fn current_step(&self) -> u64 {
            self.step
        }

        fn state(&self) -> io::Result<State> {
            self.copy_state(0)
        }
    }

    impl RpmdSimulation for MockRpmdSim {
        fn num_copies(&self) -> usize {
            self.copies
        }

        fn copy_state(&self, copy: usize) -> io::Result<State> {
            Ok(State {
                time: self.step as f64 * 0.0005,
                positions: vec![Vec3::new(copy as f64, 0.0, 0.0)],
                velocities: vec![Vec3::new(0.0, copy as f64, 0.0)],
                box_vectors: None,
            })
        }
    }

    fn frame_count(text: &str) -> usize {
        text.lines().filter(|l| *l == "TITLE").count()
    }

    #[test]
    fn copy_path_naming() {
        assert_eq!(
            copy_path(Path::new("out/traj_bead.g96"), 2),
            PathBuf::from("out/traj_bead_2.g96")
        );
        assert_eq!(copy_path(Path::new("traj"), 0), PathBuf::from("traj_0"));
    }

    #[test]
    fn stale_copies_removed_then_lazy_open() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("traj_bead.g96");

        // Leftovers from a shorter prior run, plus names that must survive.
        fs::write(dir.path().join("traj_bead_0.g96"), "old").unwrap();
        fs::write(dir.path().join("traj_bead_1.g96"), "old").unwrap();
        fs::write(dir.path().join("traj_bead.g96"), "centroid").unwrap();
        fs::write(dir.path().join("traj_bead_x.g96"), "keep").unwrap();

        let mut sim = MockRpmdSim { step: 0, copies: 3 };
        let mut reporter =
            G96RpmdReporter::new(&template, 100, &ReporterOptions::default()).unwrap();

        assert!(!dir.path().join("traj_bead_0.g96").exists());
        assert!(!dir.path().join("traj_bead_1.g96").exists());
        assert!(dir.path().join("traj_bead.g96").exists());
        assert!(dir.path().join("traj_bead_x.g96").exists());

        // No streams until the first report.
        assert!(!dir.path().join("traj_bead_2.g96").exists());

        sim.step = 100;
        let state = sim.state().unwrap();
        reporter.report(&sim, &state).unwrap();
        reporter.close().unwrap();

        for i in 0..3 {
            let text = fs::read_to_string(dir.path().join(format!("traj_bead_{i}.g96"))).unwrap();
            assert_eq!(frame_count(&text), 1);

            let frame = G96Frame::parse(text.trim_end()).unwrap();
            assert_eq!(frame.title, format!("copy {i}"));
            assert_eq!(frame.timestep.0, 100);
            assert!((frame.position[0].x - i as f64).abs() < 1e-9);
            // No box supplied: zeros.
            assert!(frame.box_vectors.x.abs() < 1e-12);
        }
    }

    #[test]
    fn repeated_reports_append_per_copy() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("traj_bead.g96");

        let mut sim = MockRpmdSim { step: 0, copies: 2 };
        let mut reporter =
            G96RpmdReporter::new(&template, 50, &ReporterOptions::default()).unwrap();

        for _ in 0..4 {
            sim.step += reporter.describe_next_report(&sim).steps;
            let state = sim.state().unwrap();
            reporter.report(&sim, &state).unwrap();
        }
        reporter.close().unwrap();

        for i in 0..2 {
            let text = fs::read_to_string(dir.path().join(format!("traj_bead_{i}.g96"))).unwrap();
            assert_eq!(frame_count(&text), 4);
        }
    }

    #[test]
    fn close_idempotent_even_when_never_opened() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("traj_bead.g96");

        let mut reporter =
            G96RpmdReporter::new(&template, 100, &ReporterOptions::default()).unwrap();
        reporter.close().unwrap();
        reporter.close().unwrap();

        // Closed reporters refuse further reports.
        let sim = MockRpmdSim { step: 100, copies: 2 };
        let state = sim.state().unwrap();
        assert!(reporter.report(&sim, &state).is_err());
    }

    #[test]
    fn unsupported_options_rejected_before_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("traj_bead.g96");
        fs::write(dir.path().join("traj_bead_0.g96"), "old").unwrap();

        let options = ReporterOptions {
            atom_subset: vec![5],
            ..Default::default()
        };
        let err = G96RpmdReporter::new(&template, 100, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);

        // Rejected construction must not have touched the filesystem.
        assert!(dir.path().join("traj_bead_0.g96").exists());
    }
}
