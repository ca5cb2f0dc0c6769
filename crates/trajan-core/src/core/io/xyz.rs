use super::ANGSTROM_TO_NM;
use super::error::{FormatError, ParseErrorKind, parse_float, parse_int};
use super::traits::{FrameReader, next_line};
use crate::core::models::frame::Frame;
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Concatenated XYZ blocks: an atom count, a comment line, then `element x y z` lines
/// in Å. Frames carry no box and no time.
pub struct XyzTrajectory<R> {
    reader: R,
    buffer: String,
    line_num: usize,
}

impl XyzTrajectory<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> XyzTrajectory<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line_num: 0,
        }
    }

    fn require_line(&mut self) -> Result<(), FormatError> {
        if next_line(&mut self.reader, &mut self.buffer, &mut self.line_num)? {
            Ok(())
        } else {
            Err(FormatError::parse(
                self.line_num,
                ParseErrorKind::UnexpectedEof,
            ))
        }
    }
}

impl<R: BufRead> FrameReader for XyzTrajectory<R> {
    fn read_frame(&mut self, frame: &mut Frame) -> Result<bool, FormatError> {
        loop {
            if !next_line(&mut self.reader, &mut self.buffer, &mut self.line_num)? {
                return Ok(false);
            }
            if !self.buffer.trim().is_empty() {
                break;
            }
        }
        let atom_count: usize = parse_int(self.buffer.trim(), "atom count", self.line_num)?;
        self.require_line()?; // comment

        frame.reset();
        for _ in 0..atom_count {
            self.require_line()?;
            let line_num = self.line_num;
            let fields: Vec<&str> = self.buffer.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(FormatError::parse(
                    line_num,
                    ParseErrorKind::WrongValueCount {
                        expected: "element and 3 coordinates",
                        found: fields.len(),
                    },
                ));
            }
            let x = parse_float(fields[1], "x coordinate", line_num)?;
            let y = parse_float(fields[2], "y coordinate", line_num)?;
            let z = parse_float(fields[3], "z coordinate", line_num)?;
            frame.push_position(Point3::new(x, y, z) * ANGSTROM_TO_NM);
        }
        Ok(true)
    }
}
