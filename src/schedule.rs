//! Report scheduling. The driver polls each reporter for when it next needs to
//! run and which quantities to compute for it, advances the simulation that
//! many steps, then invokes the reporter. The answer is per interval boundary;
//! the driver caches it and re-queries at the computed horizon.

/// A reporter's answer to "when do you next need to run, and with what".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NextReport {
    /// Integration steps the driver must take before invoking the reporter.
    pub steps: u64,
    pub positions: bool,
    pub velocities: bool,
    pub forces: bool,
    pub energies: bool,
    /// Present in the driver protocol, but periodic-box wrapping is not
    /// supported by these reporters; always false.
    pub enforce_periodic_box: bool,
}

impl NextReport {
    /// Positions-only profile: for reporters that re-fetch a full state from
    /// the driver themselves on each report.
    pub fn positions(steps: u64) -> Self {
        Self {
            steps,
            positions: true,
            velocities: false,
            forces: false,
            energies: false,
            enforce_periodic_box: false,
        }
    }

    /// Positions + velocities profile: for reporters that consume exactly the
    /// state handed to them.
    pub fn positions_velocities(steps: u64) -> Self {
        Self {
            velocities: true,
            ..Self::positions(steps)
        }
    }
}

/// Steps remaining until the next multiple of `interval`. Always in
/// `1..=interval`, so a reporter invoked exactly on a boundary waits a full
/// interval for the next one.
///
/// `interval` must be positive; reporter constructors reject zero.
pub fn steps_until_report(interval: u64, current_step: u64) -> u64 {
    debug_assert!(interval > 0, "report interval must be positive");

    interval - current_step % interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_in_bounds_and_aligned() {
        for interval in [1, 2, 3, 100, 997] {
            for step in [0, 1, 2, 99, 100, 101, 250, 999, 1_000_000] {
                let steps = steps_until_report(interval, step);

                assert!(steps >= 1);
                assert!(steps <= interval);
                assert_eq!((step + steps) % interval, 0);
            }
        }
    }

    #[test]
    fn full_interval_on_boundary() {
        assert_eq!(steps_until_report(100, 0), 100);
        assert_eq!(steps_until_report(100, 100), 100);
        assert_eq!(steps_until_report(100, 42), 58);
    }

    #[test]
    fn quantity_profiles() {
        let req = NextReport::positions(10);
        assert!(req.positions);
        assert!(!req.velocities);
        assert!(!req.forces);
        assert!(!req.energies);
        assert!(!req.enforce_periodic_box);

        let req = NextReport::positions_velocities(10);
        assert!(req.positions);
        assert!(req.velocities);
    }
}
