use super::error::{FormatError, ParseErrorKind, parse_float, parse_int};
use super::traits::{FrameReader, Structure, StructureFile, next_line};
use crate::core::models::builder::TopologyBuilder;
use crate::core::models::frame::Frame;
use crate::core::pbc::cell::{PbcType, SimulationBox};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Columns before the first coordinate field of an atom line.
const COORDINATE_START: usize = 20;
const DEFAULT_FIELD_WIDTH: usize = 8;

#[derive(Debug, Clone, PartialEq)]
struct GroAtom {
    residue_number: isize,
    residue_name: String,
    atom_name: String,
}

/// One parsed GRO block. Buffers are reused between frames.
#[derive(Debug, Default)]
struct GroBlock {
    title: String,
    time: Option<f64>,
    step: Option<i64>,
    atoms: Vec<GroAtom>,
    positions: Vec<Point3<f64>>,
    velocities: Vec<Vector3<f64>>,
    has_velocities: bool,
    simulation_box: Option<SimulationBox>,
}

/// Extracts `t=` and `step=` annotations that trajectory writers append to titles.
fn parse_title_annotations(title: &str) -> (Option<f64>, Option<i64>) {
    let mut time = None;
    let mut step = None;
    let mut tokens = title.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        for (key, is_time) in [("t=", true), ("step=", false)] {
            let Some(rest) = token.strip_prefix(key) else {
                continue;
            };
            let value = if rest.is_empty() {
                tokens.peek().copied()
            } else {
                Some(rest)
            };
            if let Some(value) = value {
                if is_time {
                    time = value.parse().ok().or(time);
                } else {
                    step = value.parse().ok().or(step);
                }
            }
        }
    }
    (time, step)
}

/// Field width of the coordinate columns, from the spacing of the first two decimal
/// points after column 20.
fn detect_field_width(line: &str) -> usize {
    let tail = line.get(COORDINATE_START..).unwrap_or("");
    let mut dots = tail.match_indices('.').map(|(i, _)| i);
    match (dots.next(), dots.next()) {
        (Some(first), Some(second)) if second > first => second - first,
        _ => DEFAULT_FIELD_WIDTH,
    }
}

fn parse_box_line(line: &str, line_num: usize) -> Result<Option<SimulationBox>, FormatError> {
    let values = line
        .split_whitespace()
        .map(|v| parse_float(v, "box vector", line_num))
        .collect::<Result<Vec<_>, _>>()?;
    let simulation_box = match values.as_slice() {
        &[x, y, z] => SimulationBox::rectangular(x, y, z),
        &[v1x, v2y, v3z, v1y, v1z, v2x, v2z, v3x, v3y] => SimulationBox::from_vectors(
            Vector3::new(v1x, v1y, v1z),
            Vector3::new(v2x, v2y, v2z),
            Vector3::new(v3x, v3y, v3z),
        ),
        _ => {
            return Err(FormatError::parse(
                line_num,
                ParseErrorKind::WrongValueCount {
                    expected: "3 or 9",
                    found: values.len(),
                },
            ));
        }
    };
    // An all-zero box marks a non-periodic system.
    Ok((!simulation_box.is_degenerate()).then_some(simulation_box))
}

fn parse_fields(
    line: &str,
    start: usize,
    width: usize,
    field: &str,
    line_num: usize,
) -> Result<[f64; 3], FormatError> {
    let mut values = [0.0; 3];
    for (d, value) in values.iter_mut().enumerate() {
        let from = start + d * width;
        let text = line.get(from..from + width).ok_or_else(|| {
            FormatError::parse(
                line_num,
                ParseErrorKind::LineTooShort {
                    record: "GRO atom",
                    min: from + width,
                },
            )
        })?;
        *value = parse_float(text.trim(), field, line_num)?;
    }
    Ok(values)
}

/// Reads the next block. Returns `false` when the input ends before a title line.
fn read_block(
    reader: &mut impl BufRead,
    buffer: &mut String,
    line_num: &mut usize,
    block: &mut GroBlock,
) -> Result<bool, FormatError> {
    loop {
        if !next_line(reader, buffer, line_num)? {
            return Ok(false);
        }
        // Trailing blank lines after the last box line are tolerated.
        if !buffer.trim().is_empty() {
            break;
        }
    }
    block.title = buffer.trim().to_string();
    (block.time, block.step) = parse_title_annotations(&block.title);

    if !next_line(reader, buffer, line_num)? {
        return Err(FormatError::parse(*line_num, ParseErrorKind::UnexpectedEof));
    }
    let atom_count: usize = parse_int(buffer.trim(), "atom count", *line_num)?;

    block.atoms.clear();
    block.positions.clear();
    block.velocities.clear();
    block.has_velocities = false;

    let mut width = DEFAULT_FIELD_WIDTH;
    for i in 0..atom_count {
        if !next_line(reader, buffer, line_num)? {
            return Err(FormatError::parse(*line_num, ParseErrorKind::UnexpectedEof));
        }
        let line = buffer.as_str();
        if i == 0 {
            width = detect_field_width(line);
        }
        let residue_number = parse_int(
            line.get(0..5).unwrap_or("").trim(),
            "residue number",
            *line_num,
        )?;
        let residue_name = line.get(5..10).unwrap_or("").trim().to_string();
        let atom_name = line.get(10..15).unwrap_or("").trim().to_string();
        if atom_name.is_empty() {
            return Err(FormatError::parse(
                *line_num,
                ParseErrorKind::MissingRequiredField {
                    field: "atom name".into(),
                },
            ));
        }

        let [x, y, z] = parse_fields(line, COORDINATE_START, width, "coordinate", *line_num)?;
        block.positions.push(Point3::new(x, y, z));

        let velocity_start = COORDINATE_START + 3 * width;
        if i == 0 {
            block.has_velocities = line.len() >= velocity_start + 3 * width;
        }
        if block.has_velocities {
            let [vx, vy, vz] = parse_fields(line, velocity_start, width, "velocity", *line_num)?;
            block.velocities.push(Vector3::new(vx, vy, vz));
        }

        block.atoms.push(GroAtom {
            residue_number,
            residue_name,
            atom_name,
        });
    }

    if !next_line(reader, buffer, line_num)? {
        return Err(FormatError::MissingRecord("box line".into()));
    }
    block.simulation_box = parse_box_line(buffer, *line_num)?;
    Ok(true)
}

/// GROMACS coordinate files in nm. A single-block file is a structure; the atoms carry
/// no connectivity.
pub struct GroFile;

impl StructureFile for GroFile {
    fn read_from(reader: &mut impl BufRead) -> Result<Structure, FormatError> {
        let mut block = GroBlock::default();
        let mut buffer = String::new();
        let mut line_num = 0;
        if !read_block(reader, &mut buffer, &mut line_num, &mut block)? {
            return Err(FormatError::MissingRecord("title line".into()));
        }

        let mut builder = TopologyBuilder::new();
        builder.title(&block.title);
        let mut current_residue: Option<(isize, &str)> = None;
        for (i, atom) in block.atoms.iter().enumerate() {
            let key = (atom.residue_number, atom.residue_name.as_str());
            if current_residue != Some(key) {
                builder.start_residue(atom.residue_number, &atom.residue_name, 'A');
                current_residue = Some(key);
            }
            // Atom numbers wrap at 100000, so serials are assigned by position.
            builder.add_atom(i + 1, &atom.atom_name, "", 0.0)?;
        }

        Ok(Structure {
            topology: builder.build(),
            positions: block.positions,
            velocities: block.has_velocities.then_some(block.velocities),
            simulation_box: block.simulation_box,
            pbc_type: if block.simulation_box.is_some() {
                PbcType::Xyz
            } else {
                PbcType::None
            },
        })
    }
}

/// A multi-block GRO file read frame by frame.
pub struct GroTrajectory<R> {
    reader: R,
    buffer: String,
    line_num: usize,
    block: GroBlock,
}

impl GroTrajectory<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> GroTrajectory<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line_num: 0,
            block: GroBlock::default(),
        }
    }
}

impl<R: BufRead> FrameReader for GroTrajectory<R> {
    fn read_frame(&mut self, frame: &mut Frame) -> Result<bool, FormatError> {
        if !read_block(
            &mut self.reader,
            &mut self.buffer,
            &mut self.line_num,
            &mut self.block,
        )? {
            return Ok(false);
        }
        frame.reset();
        frame.set_time(self.block.time);
        frame.set_step(self.block.step);
        frame.set_simulation_box(self.block.simulation_box);
        frame.set_positions(&self.block.positions);
        if self.block.has_velocities {
            frame.set_velocities(Some(self.block.velocities.as_slice()));
        }
        Ok(true)
    }
}
