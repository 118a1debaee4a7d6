//! For rendering (and re-reading) single frames of the [GROMOS96 (G96)](https://manual.gromacs.org/archive/5.0.7/online/g96.html)
//! trajectory format. This is a line-oriented text format; fields are fixed-width,
//! with column position as the delimiter, so output is byte-reproducible.

use std::{
    fmt, io,
    io::ErrorKind,
    str::FromStr,
};

use lin_alg::f64::Vec3;

use crate::sim::State;

/// One trajectory snapshot: coordinates, velocities, and box geometry at a given
/// step. Built transiently by a reporter, rendered once, then discarded.
#[derive(Clone, Debug)]
pub struct G96Frame {
    /// Free text. Empty for whole-system output; identifies the copy for
    /// per-replica output.
    pub title: String,
    /// (step count, simulation time in ps)
    pub timestep: (u64, f64),
    /// nm
    pub position: Vec<Vec3>,
    /// nm/ps. One per position, same atom ordering.
    pub velocity: Vec<Vec3>,
    /// nm. Diagonal of the (orthorhombic) periodic box; zeros if no box.
    pub box_vectors: Vec3,
}

impl fmt::Display for G96Frame {
    /// Renders the canonical G96 block text. Integer step is right-justified in
    /// 15 columns; time uses 6 decimal places, coordinates, velocities and box
    /// 9, all in 15-column fields. No trailing newline; the caller decides how
    /// frames are joined in a file.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TITLE")?;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "END")?;

        writeln!(f, "TIMESTEP")?;
        writeln!(f, "{:15}{:15.6}", self.timestep.0, self.timestep.1)?;
        writeln!(f, "END")?;

        writeln!(f, "POSITIONRED")?;
        for pos in &self.position {
            writeln!(f, "{:15.9}{:15.9}{:15.9}", pos.x, pos.y, pos.z)?;
        }
        writeln!(f, "END")?;

        writeln!(f, "VELOCITYRED")?;
        for vel in &self.velocity {
            writeln!(f, "{:15.9}{:15.9}{:15.9}", vel.x, vel.y, vel.z)?;
        }
        writeln!(f, "END")?;

        writeln!(f, "BOX")?;
        writeln!(
            f,
            "{:15.9}{:15.9}{:15.9}",
            self.box_vectors.x, self.box_vectors.y, self.box_vectors.z
        )?;
        write!(f, "END")
    }
}

impl G96Frame {
    /// Builds a frame from a driver-supplied state snapshot. A missing box
    /// renders as zeros.
    pub fn from_state(title: String, step: u64, state: State) -> io::Result<Self> {
        if state.velocities.len() != state.positions.len() {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!(
                    "State has {} velocities for {} positions",
                    state.velocities.len(),
                    state.positions.len()
                ),
            ));
        }

        Ok(Self {
            title,
            timestep: (step, state.time),
            position: state.positions,
            velocity: state.velocities,
            box_vectors: state.box_vectors.unwrap_or(Vec3::new(0.0, 0.0, 0.0)),
        })
    }

    /// Parses one frame from its block text, e.g. as produced by the `Display`
    /// impl. Numeric fields are read by column position, not by whitespace.
    pub fn parse(text: &str) -> io::Result<Self> {
        let mut lines = text.lines();

        expect_line(&mut lines, "TITLE")?;
        let title = lines
            .next()
            .ok_or_else(|| {
                io::Error::new(ErrorKind::InvalidData, "Missing title line in G96 frame")
            })?
            .to_string();
        expect_line(&mut lines, "END")?;

        expect_line(&mut lines, "TIMESTEP")?;
        let ts_line = lines.next().ok_or_else(|| {
            io::Error::new(ErrorKind::InvalidData, "Missing TIMESTEP data line")
        })?;
        let step: u64 = fixed_field(ts_line, 0)?;
        let time: f64 = fixed_field(ts_line, 1)?;
        expect_line(&mut lines, "END")?;

        expect_line(&mut lines, "POSITIONRED")?;
        let position = parse_vec3_block(&mut lines)?;

        expect_line(&mut lines, "VELOCITYRED")?;
        let velocity = parse_vec3_block(&mut lines)?;

        if velocity.len() != position.len() {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Velocity count {} doesn't match position count {}",
                    velocity.len(),
                    position.len()
                ),
            ));
        }

        expect_line(&mut lines, "BOX")?;
        let box_line = lines
            .next()
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidData, "Missing BOX data line"))?;
        let box_vectors = parse_vec3_line(box_line)?;
        expect_line(&mut lines, "END")?;

        Ok(Self {
            title,
            timestep: (step, time),
            position,
            velocity,
            box_vectors,
        })
    }
}

fn expect_line<'a>(lines: &mut impl Iterator<Item = &'a str>, keyword: &str) -> io::Result<()> {
    match lines.next() {
        Some(line) if line.trim_end() == keyword => Ok(()),
        Some(line) => Err(io::Error::new(
            ErrorKind::InvalidData,
            format!("Expected `{keyword}` line, found `{line}`"),
        )),
        None => Err(io::Error::new(
            ErrorKind::InvalidData,
            format!("Expected `{keyword}` line, found end of frame"),
        )),
    }
}

/// Reads the `i`th 15-column field from a fixed-width line.
fn fixed_field<T: FromStr>(line: &str, i: usize) -> io::Result<T> {
    let (start, end) = (15 * i, 15 * (i + 1));

    // `get` also rejects a column boundary landing inside a multi-byte
    // character, so malformed input can't panic the slice.
    let field = line.get(start..end).ok_or_else(|| {
        io::Error::new(
            ErrorKind::InvalidData,
            format!("Line too short for field {i}: `{line}`"),
        )
    })?;

    field.trim().parse().map_err(|_| {
        io::Error::new(
            ErrorKind::InvalidData,
            format!("Invalid numeric field {i} in line `{line}`"),
        )
    })
}

fn parse_vec3_line(line: &str) -> io::Result<Vec3> {
    Ok(Vec3::new(
        fixed_field(line, 0)?,
        fixed_field(line, 1)?,
        fixed_field(line, 2)?,
    ))
}

/// Consumes data lines up to and including the closing `END`.
fn parse_vec3_block<'a>(lines: &mut impl Iterator<Item = &'a str>) -> io::Result<Vec<Vec3>> {
    let mut result = Vec::new();

    for line in lines {
        if line.trim_end() == "END" {
            return Ok(result);
        }
        result.push(parse_vec3_line(line)?);
    }

    Err(io::Error::new(
        ErrorKind::InvalidData,
        "Unterminated coordinate block; missing END",
    ))
}
