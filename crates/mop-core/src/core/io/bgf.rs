use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::ligand::Ligand;
use crate::core::models::simulation_box::SimulationBox;
use crate::core::models::topology::{Bond, BondOrder};
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};
use thiserror::Error;

const ATOM_FORMAT_LINE: &str =
    "FORMAT ATOM   (a6,1x,i5,1x,a5,1x,a3,1x,a1,1x,a5,3f10.5,1x,a5,i3,i2,1x,f8.5)";
const CONECT_FORMAT_LINE: &str = "FORMAT CONECT (a6,12i6)";
const DEFAULT_RESIDUE_NAME: &str = "LIG";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RawLine {
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BgfMetadata {
    pub header_lines: BTreeMap<usize, RawLine>,
    pub format_lines: Vec<String>,
}

#[derive(Debug, Error)]
pub enum BgfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: BgfParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum BgfParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 80 chars)")]
    LineTooShort,
    #[error("Invalid serial '{0}' in CONECT/ORDER record")]
    InvalidConectSerial(String),
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, BgfError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| BgfError::Parse {
        line: line_num,
        kind: BgfParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_serials(parts: &[&str], line_num: usize) -> Result<Vec<usize>, BgfError> {
    parts
        .iter()
        .map(|p| {
            p.parse::<usize>().map_err(|_| BgfError::Parse {
                line: line_num,
                kind: BgfParseErrorKind::InvalidConectSerial((*p).to_string()),
            })
        })
        .collect()
}

pub struct BgfFile;

impl MolecularFile for BgfFile {
    type Metadata = BgfMetadata;
    type Error = BgfError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Ligand, Self::Metadata), Self::Error> {
        let mut metadata = BgfMetadata::default();
        let mut atoms: Vec<Atom> = Vec::new();
        let mut serial_to_index: HashMap<usize, usize> = HashMap::new();
        let mut residue_name: Option<String> = None;

        let mut conect_rows: Vec<(usize, Vec<usize>)> = Vec::new();
        let mut order_rows: HashMap<usize, Vec<BondOrder>> = HashMap::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            let record_type = slice_and_trim(&line, 0, 6);
            if record_type.is_empty() {
                if !line.trim().is_empty() {
                    metadata
                        .header_lines
                        .insert(line_num, RawLine { content: line });
                }
                continue;
            }

            match record_type {
                "ATOM" | "HETATM" => {
                    if line.len() < 80 {
                        return Err(BgfError::Parse {
                            line: line_num,
                            kind: BgfParseErrorKind::LineTooShort,
                        });
                    }

                    let serial_str = slice_and_trim(&line, 7, 12);
                    let name_str = slice_and_trim(&line, 13, 18);
                    let res_name_str = slice_and_trim(&line, 19, 22);
                    let ff_type_str = slice_and_trim(&line, 61, 66);

                    if name_str.is_empty() {
                        return Err(BgfError::Parse {
                            line: line_num,
                            kind: BgfParseErrorKind::MissingRequiredField {
                                columns: "14-18".into(),
                            },
                        });
                    }
                    let serial: usize = serial_str.parse().map_err(|_| BgfError::Parse {
                        line: line_num,
                        kind: BgfParseErrorKind::InvalidInt {
                            columns: "8-12".into(),
                            value: serial_str.into(),
                        },
                    })?;
                    if serial_to_index.contains_key(&serial) {
                        return Err(BgfError::Inconsistency(format!(
                            "Duplicate atom serial: {}",
                            serial
                        )));
                    }
                    let x = parse_float(&line, line_num, 30, 40)?;
                    let y = parse_float(&line, line_num, 40, 50)?;
                    let z = parse_float(&line, line_num, 50, 60)?;
                    if ff_type_str.is_empty() {
                        return Err(BgfError::Parse {
                            line: line_num,
                            kind: BgfParseErrorKind::MissingRequiredField {
                                columns: "62-66".into(),
                            },
                        });
                    }
                    let charge = parse_float(&line, line_num, 72, 80)?;

                    if residue_name.is_none() && !res_name_str.is_empty() {
                        residue_name = Some(res_name_str.to_string());
                    }

                    let mut atom = Atom::new(name_str, ff_type_str, Point3::new(x, y, z));
                    atom.partial_charge = charge;
                    serial_to_index.insert(serial, atoms.len());
                    atoms.push(atom);
                }
                "CONECT" | "ORDER" => {
                    let parts: Vec<&str> = line.split_whitespace().skip(1).collect();
                    let Some((first, rest)) = parts.split_first() else {
                        continue;
                    };
                    let owner = parse_serials(&[*first], line_num)?[0];
                    if record_type == "CONECT" {
                        let partners = parse_serials(rest, line_num)?;
                        if !partners.is_empty() {
                            conect_rows.push((owner, partners));
                        }
                    } else {
                        let orders = rest
                            .iter()
                            .map(|s| s.parse().unwrap_or_default())
                            .collect();
                        order_rows.insert(owner, orders);
                    }
                }
                "FORMAT" => metadata.format_lines.push(line.clone()),
                "END" => break,
                _ => {
                    metadata.header_lines.insert(
                        line_num,
                        RawLine {
                            content: line.clone(),
                        },
                    );
                }
            }
        }

        if atoms.is_empty() {
            return Err(BgfError::MissingRecord("ATOM/HETATM records".into()));
        }

        let lookup = |serial: usize| {
            serial_to_index.get(&serial).copied().ok_or_else(|| {
                BgfError::Inconsistency(format!("CONECT references unknown atom serial {}", serial))
            })
        };

        let mut bond_map: BTreeMap<(usize, usize), BondOrder> = BTreeMap::new();
        for (owner, partners) in &conect_rows {
            let a = lookup(*owner)?;
            let orders = order_rows.get(owner);
            for (k, partner) in partners.iter().enumerate() {
                let b = lookup(*partner)?;
                if a == b {
                    continue;
                }
                let order = orders
                    .and_then(|o| o.get(k))
                    .copied()
                    .unwrap_or_default();
                let key = (a.min(b), a.max(b));
                let entry = bond_map.entry(key).or_insert(order);
                if *entry == BondOrder::Single {
                    *entry = order;
                }
            }
        }
        let bonds = bond_map
            .into_iter()
            .map(|((a, b), order)| Bond::new(a, b, order))
            .collect();

        let name = residue_name.unwrap_or_else(|| DEFAULT_RESIDUE_NAME.to_string());
        Ok((Ligand::new(&name, atoms, bonds), metadata))
    }

    fn write_to(
        sim_box: &SimulationBox,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for line in metadata.header_lines.values() {
            if !line.content.starts_with("CRYSTX") {
                writeln!(writer, "{}", line.content)?;
            }
        }
        if let Some(lengths) = sim_box.boundary().dimensions() {
            writeln!(
                writer,
                "CRYSTX {:>11.5}{:>11.5}{:>11.5}{:>11.5}{:>11.5}{:>11.5}",
                lengths.x, lengths.y, lengths.z, 90.0, 90.0, 90.0
            )?;
        }
        let atom_formats: Vec<&String> = metadata
            .format_lines
            .iter()
            .filter(|l| !l.contains("CONECT"))
            .collect();
        if atom_formats.is_empty() {
            writeln!(writer, "{}", ATOM_FORMAT_LINE)?;
        } else {
            for line in atom_formats {
                writeln!(writer, "{}", line)?;
            }
        }

        // (first serial of molecule, template) per placed molecule, in output order.
        let mut placed: Vec<(usize, &Ligand)> = Vec::new();
        let mut serial = 1;
        let mut residue_number = 1;

        for (species_id, ligand) in sim_box.species_iter() {
            let res_name: String = ligand.name().chars().take(3).collect();
            let neighbor_counts: Vec<usize> = ligand.neighbors().iter().map(Vec::len).collect();

            for molecule in sim_box.molecule_list(species_id) {
                if molecule.atom_count() != ligand.atom_count() {
                    return Err(BgfError::Inconsistency(format!(
                        "Molecule has {} atoms but species '{}' has {}",
                        molecule.atom_count(),
                        ligand.name(),
                        ligand.atom_count()
                    )));
                }
                placed.push((serial, ligand));
                for (index, (atom, position)) in
                    ligand.atoms().iter().zip(molecule.positions()).enumerate()
                {
                    writeln!(
                        writer,
                        "{:<6} {:>5} {:<5} {:>3} {:1} {:>5}{:>10.5}{:>10.5}{:>10.5} {:<5}{:>3}{:>2} {:>8.5}",
                        "HETATM",
                        serial + index,
                        atom.name,
                        res_name,
                        'A',
                        residue_number,
                        position.x,
                        position.y,
                        position.z,
                        atom.force_field_type,
                        neighbor_counts[index],
                        0,
                        atom.partial_charge
                    )?;
                }
                serial += ligand.atom_count();
                residue_number += 1;
            }
        }

        if placed.iter().any(|(_, ligand)| !ligand.bonds().is_empty()) {
            writeln!(writer, "{}", CONECT_FORMAT_LINE)?;
        }
        for (first_serial, ligand) in placed {
            let mut bond_map: BTreeMap<usize, Vec<(usize, BondOrder)>> = BTreeMap::new();
            for bond in ligand.bonds() {
                bond_map
                    .entry(bond.atom1)
                    .or_default()
                    .push((bond.atom2, bond.order));
                bond_map
                    .entry(bond.atom2)
                    .or_default()
                    .push((bond.atom1, bond.order));
            }
            for (atom, conns) in &bond_map {
                write!(writer, "CONECT{:>6}", first_serial + atom)?;
                for (partner, _) in conns {
                    write!(writer, "{:>6}", first_serial + partner)?;
                }
                writeln!(writer)?;
                if conns.iter().any(|(_, o)| *o != BondOrder::Single) {
                    write!(writer, "ORDER {:>6}", first_serial + atom)?;
                    for (_, order) in conns {
                        write!(writer, "{:>6}", *order as u8)?;
                    }
                    writeln!(writer)?;
                }
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }

    fn write_box_to(sim_box: &SimulationBox, writer: &mut impl Write) -> Result<(), Self::Error> {
        let mut header_lines = BTreeMap::new();
        header_lines.insert(
            1,
            RawLine {
                content: "BIOGRF 200".to_string(),
            },
        );
        header_lines.insert(
            2,
            RawLine {
                content: "REMARK Generated by mopbuild".to_string(),
            },
        );
        let default_metadata = BgfMetadata {
            header_lines,
            ..Default::default()
        };
        Self::write_to(sim_box, &default_metadata, writer)
    }
}
