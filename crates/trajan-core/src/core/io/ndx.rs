use super::error::{FormatError, ParseErrorKind, parse_int};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A named set of topology atoms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexGroup {
    pub name: String,
    /// Zero-based topology indices in file order.
    pub atoms: Vec<usize>,
}

impl IndexGroup {
    pub fn new(name: &str, atoms: Vec<usize>) -> Self {
        Self {
            name: name.to_string(),
            atoms,
        }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// The groups of a GROMACS index file: `[ name ]` headers followed by 1-based atom
/// numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexGroups {
    groups: Vec<IndexGroup>,
}

impl IndexGroups {
    pub fn read_from(reader: &mut impl BufRead) -> Result<Self, FormatError> {
        let mut groups: Vec<IndexGroup> = Vec::new();
        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| {
                    FormatError::parse(
                        line_num,
                        ParseErrorKind::MissingRequiredField {
                            field: "closing ']' of group header".into(),
                        },
                    )
                })?;
                groups.push(IndexGroup::new(name.trim(), Vec::new()));
                continue;
            }
            let group = groups.last_mut().ok_or_else(|| {
                FormatError::Inconsistency(format!(
                    "Atom numbers on line {} precede the first group header",
                    line_num
                ))
            })?;
            for token in trimmed.split_whitespace() {
                let number: usize = parse_int(token, "atom number", line_num)?;
                if number == 0 {
                    return Err(FormatError::Inconsistency(format!(
                        "Atom numbers are 1-based; found 0 on line {}",
                        line_num
                    )));
                }
                group.atoms.push(number - 1);
            }
        }
        Ok(Self { groups })
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        let file = File::open(path)?;
        Self::read_from(&mut BufReader::new(file))
    }

    pub fn groups(&self) -> &[IndexGroup] {
        &self.groups
    }

    /// Looks a group up by its zero-based number or by name (case-insensitive).
    pub fn find(&self, selector: &str) -> Option<&IndexGroup> {
        let selector = selector.trim();
        if let Ok(number) = selector.parse::<usize>() {
            return self.groups.get(number);
        }
        self.groups
            .iter()
            .find(|group| group.name.eq_ignore_ascii_case(selector))
    }
}
