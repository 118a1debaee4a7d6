//! This example demonstrates attaching both reporter kinds to a driving
//! simulation: a whole-system (centroid) trajectory, plus one trajectory per
//! ring-polymer copy. The driver here is a toy in-process oscillator; in a real
//! application it would wrap your MD engine of choice.

use std::{io, path::Path};

use g96_reporter::{
    G96Reporter, G96RpmdReporter, ReporterOptions, RpmdSimulation, Simulation, State,
};
use lin_alg::f64::Vec3;

/// Four copies of a single particle on a harmonic spring.
struct ToyRpmd {
    step: u64,
    /// ps
    dt: f64,
    /// (position nm, velocity nm/ps) per copy
    copies: Vec<(Vec3, Vec3)>,
}

impl ToyRpmd {
    fn advance(&mut self, steps: u64) {
        // Spring constant, in units that keep the motion bounded.
        const K: f64 = 100.;

        for _ in 0..steps {
            for (pos, vel) in &mut self.copies {
                *vel = *vel - *pos * (K * self.dt);
                *pos = *pos + *vel * self.dt;
            }
            self.step += 1;
        }
    }
}

impl Simulation for ToyRpmd {
    fn current_step(&self) -> u64 {
        self.step
    }

    fn state(&self) -> io::Result<State> {
        // Centroid of the ring polymer.
        let scale = 1.0 / self.copies.len() as f64;

        let mut pos = Vec3::new(0., 0., 0.);
        let mut vel = Vec3::new(0., 0., 0.);
        for (p, v) in &self.copies {
            pos = pos + *p * scale;
            vel = vel + *v * scale;
        }

        Ok(State {
            time: self.step as f64 * self.dt,
            positions: vec![pos],
            velocities: vec![vel],
            box_vectors: Some(Vec3::new(1.86206, 1.86206, 1.86206)),
        })
    }
}

impl RpmdSimulation for ToyRpmd {
    fn num_copies(&self) -> usize {
        self.copies.len()
    }

    fn copy_state(&self, copy: usize) -> io::Result<State> {
        let (pos, vel) = self.copies[copy];

        Ok(State {
            time: self.step as f64 * self.dt,
            positions: vec![pos],
            velocities: vec![vel],
            box_vectors: Some(Vec3::new(1.86206, 1.86206, 1.86206)),
        })
    }
}

fn main() {
    let mut sim = ToyRpmd {
        step: 0,
        dt: 0.0005,
        copies: (0..4)
            .map(|i| {
                (
                    Vec3::new(0.1 + 0.01 * i as f64, 0., 0.),
                    Vec3::new(0., 0., 0.),
                )
            })
            .collect(),
    };

    let mut centroid =
        G96Reporter::new(Path::new("traj_centroid.g96"), 100, &ReporterOptions::default())
            .unwrap();
    let mut beads =
        G96RpmdReporter::new(Path::new("traj_bead.g96"), 100, &ReporterOptions::default())
            .unwrap();

    println!("Starting simulation");

    while sim.current_step() < 20_000 {
        // Both reporters share an interval here; in general, advance by the
        // smallest requested horizon and report whichever are due.
        let steps = centroid
            .describe_next_report(&sim)
            .steps
            .min(beads.describe_next_report(&sim).steps);

        sim.advance(steps);

        let state = sim.state().unwrap();
        centroid.report(&sim, &state).unwrap();
        beads.report(&sim, &state).unwrap();
    }

    centroid.close().unwrap();
    beads.close().unwrap();

    println!("Finished simulation");
}
