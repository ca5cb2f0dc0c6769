use super::ANGSTROM_TO_NM;
use super::error::{FormatError, ParseErrorKind, parse_float, parse_int};
use super::traits::{Structure, StructureFile};
use crate::core::models::builder::TopologyBuilder;
use crate::core::pbc::cell::{PbcType, SimulationBox};
use nalgebra::Point3;
use std::collections::HashSet;
use std::io::BufRead;
use tracing::debug;

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

/// BIOGRF structure files: fixed-column `ATOM`/`HETATM` records, `CONECT`
/// connectivity, and an optional `CRYSTX` unit cell. Coordinates are in Å.
pub struct BgfFile;

impl StructureFile for BgfFile {
    fn read_from(reader: &mut impl BufRead) -> Result<Structure, FormatError> {
        let mut builder = TopologyBuilder::new();
        let mut positions = Vec::new();
        let mut seen_serials = HashSet::new();
        let mut temp_conect: Vec<(usize, usize)> = Vec::new();
        let mut simulation_box = None;

        let mut current_residue: Option<(char, isize)> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            let record_type = slice_and_trim(&line, 0, 6);
            match record_type {
                "ATOM" | "HETATM" => {
                    if line.len() < 80 {
                        return Err(FormatError::parse(
                            line_num,
                            ParseErrorKind::LineTooShort {
                                record: "ATOM/HETATM",
                                min: 80,
                            },
                        ));
                    }

                    let serial_str = slice_and_trim(&line, 7, 12);
                    let name_str = slice_and_trim(&line, 13, 18);
                    let res_name_str = slice_and_trim(&line, 19, 22);
                    let chain_id_str = slice_and_trim(&line, 23, 24);
                    let res_id_str = slice_and_trim(&line, 25, 30);
                    let ff_type_str = slice_and_trim(&line, 61, 66);
                    let charge_str = slice_and_trim(&line, 72, 80);

                    if name_str.is_empty() {
                        return Err(FormatError::parse(
                            line_num,
                            ParseErrorKind::MissingRequiredField {
                                field: "columns 14-18".into(),
                            },
                        ));
                    }
                    let serial: usize = parse_int(serial_str, "columns 8-12", line_num)?;
                    if !seen_serials.insert(serial) {
                        return Err(FormatError::Inconsistency(format!(
                            "Duplicate atom serial: {}",
                            serial
                        )));
                    }
                    let chain_id: char = chain_id_str.chars().next().unwrap_or('A');
                    let res_id: isize = parse_int(res_id_str, "columns 26-30", line_num)?;
                    let x = parse_float(slice_and_trim(&line, 30, 40), "columns 31-40", line_num)?;
                    let y = parse_float(slice_and_trim(&line, 40, 50), "columns 41-50", line_num)?;
                    let z = parse_float(slice_and_trim(&line, 50, 60), "columns 51-60", line_num)?;
                    if ff_type_str.is_empty() {
                        return Err(FormatError::parse(
                            line_num,
                            ParseErrorKind::MissingRequiredField {
                                field: "columns 62-66".into(),
                            },
                        ));
                    }
                    let charge = parse_float(charge_str, "columns 73-80", line_num)?;

                    if current_residue != Some((chain_id, res_id)) {
                        builder.start_residue(res_id, res_name_str, chain_id);
                        current_residue = Some((chain_id, res_id));
                    }
                    builder.add_atom(serial, name_str, ff_type_str, charge)?;
                    positions.push(Point3::new(x, y, z) * ANGSTROM_TO_NM);
                }
                "CONECT" => {
                    let parts: Vec<&str> = line.split_whitespace().skip(1).collect();
                    if parts.is_empty() {
                        return Err(FormatError::parse(
                            line_num,
                            ParseErrorKind::InvalidConectFormat,
                        ));
                    }
                    let base: usize = parse_int(parts[0], "CONECT base atom", line_num)?;
                    for partner in &parts[1..] {
                        let partner: usize = parse_int(partner, "CONECT partner", line_num)?;
                        temp_conect.push((base.min(partner), base.max(partner)));
                    }
                }
                "CRYSTX" => {
                    let values = line
                        .split_whitespace()
                        .skip(1)
                        .map(|v| parse_float(v, "CRYSTX", line_num))
                        .collect::<Result<Vec<_>, _>>()?;
                    let &[a, b, c, alpha, beta, gamma] = values.as_slice() else {
                        return Err(FormatError::parse(
                            line_num,
                            ParseErrorKind::WrongValueCount {
                                expected: "6",
                                found: values.len(),
                            },
                        ));
                    };
                    simulation_box = Some(
                        SimulationBox::from_lengths_and_angles(a, b, c, alpha, beta, gamma)
                            .scaled(ANGSTROM_TO_NM),
                    );
                }
                "DESCRP" => {
                    builder.title(line.get(6..).unwrap_or("").trim());
                }
                "END" => break,
                _ => {}
            }
        }

        if seen_serials.is_empty() {
            return Err(FormatError::MissingRecord("ATOM/HETATM records".into()));
        }

        temp_conect.sort_unstable();
        temp_conect.dedup();
        for (a1_serial, a2_serial) in temp_conect {
            builder.add_bond(a1_serial, a2_serial)?;
        }

        let topology = builder.build();
        debug!(
            atoms = topology.atom_count(),
            bonds = topology.bonds().len(),
            "Parsed BGF structure"
        );
        Ok(Structure {
            topology,
            positions,
            velocities: None,
            simulation_box,
            pbc_type: if simulation_box.is_some() {
                PbcType::Xyz
            } else {
                PbcType::None
            },
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::models::builder::TopologyBuildError;
    use std::io::Cursor;

    pub(crate) fn atom_line(
        serial: usize,
        name: &str,
        res_name: &str,
        res_id: isize,
        xyz: [f64; 3],
        ff_type: &str,
        charge: f64,
    ) -> String {
        format!(
            "{:<6} {:>5} {:<5} {:>3} {:1} {:>5}{:>10.5}{:>10.5}{:>10.5} {:<5}{:>3}{:>2} {:>8.5}",
            "HETATM", serial, name, res_name, 'A', res_id, xyz[0], xyz[1], xyz[2], ff_type, 0, 0,
            charge
        )
    }

    fn parse(content: &str) -> Result<Structure, FormatError> {
        BgfFile::read_from(&mut Cursor::new(content.as_bytes()))
    }

    fn methanol() -> String {
        let lines = [
            "BIOGRF 200".to_string(),
            "DESCRP methanol".to_string(),
            "FORCEFIELD DREIDING".to_string(),
            "CRYSTX    20.00000   30.00000   40.00000   90.00000   90.00000   90.00000".into(),
            "FORMAT ATOM   (a6,1x,i5,1x,a5,1x,a3,1x,a1,1x,a5,3f10.5,1x,a5,i3,i2,1x,f8.5)".into(),
            atom_line(1, "C1", "MOH", 1, [0.0, 0.0, 0.0], "C_3", 0.1),
            atom_line(2, "O1", "MOH", 1, [1.43, 0.0, 0.0], "O_3", -0.5),
            atom_line(3, "HO", "MOH", 1, [1.8, 0.9, 0.0], "H___A", 0.4),
            atom_line(4, "NA", "ION", 2, [5.0, 5.0, 5.0], "Na", 1.0),
            "FORMAT CONECT (a6,12i6)".into(),
            "CONECT     1     2".into(),
            "CONECT     2     1     3".into(),
            "CONECT     3     2".into(),
            "CONECT     4".into(),
            "END".into(),
            "garbage after end".into(),
        ];
        lines.join("\n")
    }

    #[test]
    fn atom_line_helper_matches_record_width() {
        assert_eq!(atom_line(1, "C1", "MOH", 1, [0.0; 3], "C_3", 0.1).len(), 80);
    }

    #[test]
    fn reads_atoms_residues_and_bonds() {
        let structure = parse(&methanol()).unwrap();
        let topology = &structure.topology;
        assert_eq!(structure.title(), "methanol");
        assert_eq!(topology.atom_count(), 4);
        assert_eq!(topology.residues().len(), 2);
        assert_eq!(topology.atom(1).unwrap().name, "O1");
        assert_eq!(topology.atom(1).unwrap().element, Some("O"));
        assert_eq!(topology.atom(3).unwrap().element, Some("Na"));
        assert!((topology.atom(2).unwrap().partial_charge - 0.4).abs() < 1e-12);
        assert_eq!(topology.bonds().len(), 2);
        assert_eq!(topology.molecules().len(), 2);
        assert!(structure.has_connectivity());
    }

    #[test]
    fn converts_coordinates_and_cell_to_nm() {
        let structure = parse(&methanol()).unwrap();
        assert!((structure.positions[1].x - 0.143).abs() < 1e-12);
        let cell = structure.simulation_box.unwrap();
        assert!((cell.vectors()[0].x - 2.0).abs() < 1e-9);
        assert!((cell.vectors()[2].z - 4.0).abs() < 1e-9);
        assert_eq!(structure.pbc_type, PbcType::Xyz);
        assert!(structure.velocities.is_none());
    }

    #[test]
    fn structure_without_crystx_has_no_box() {
        let content = [
            atom_line(1, "C1", "MOH", 1, [0.0; 3], "C_3", 0.0),
            "END".into(),
        ]
        .join("\n");
        let structure = parse(&content).unwrap();
        assert!(structure.simulation_box.is_none());
        assert_eq!(structure.pbc_type, PbcType::None);
        assert!(!structure.has_connectivity());
    }

    #[test]
    fn short_atom_line_is_rejected() {
        let err = parse("ATOM      1 C1    MOH A     1").unwrap_err();
        assert!(matches!(
            err,
            FormatError::Parse {
                line: 1,
                kind: ParseErrorKind::LineTooShort { .. }
            }
        ));
    }

    #[test]
    fn invalid_coordinate_reports_columns() {
        let mut line = atom_line(1, "C1", "MOH", 1, [0.0; 3], "C_3", 0.0);
        line.replace_range(30..40, "  abcdefgh");
        let err = parse(&line).unwrap_err();
        match err {
            FormatError::Parse {
                kind: ParseErrorKind::InvalidFloat { field, value },
                ..
            } => {
                assert_eq!(field, "columns 31-40");
                assert_eq!(value, "abcdefgh");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn conect_to_unknown_atom_is_an_error() {
        let content = [
            atom_line(1, "C1", "MOH", 1, [0.0; 3], "C_3", 0.0),
            "CONECT     1     9".into(),
        ]
        .join("\n");
        let err = parse(&content).unwrap_err();
        assert!(matches!(
            err,
            FormatError::Topology(TopologyBuildError::UnknownSerial(9))
        ));
    }

    #[test]
    fn file_without_atoms_is_missing_records() {
        let err = parse("BIOGRF 200\nEND\n").unwrap_err();
        assert!(matches!(err, FormatError::MissingRecord(_)));
    }
}
