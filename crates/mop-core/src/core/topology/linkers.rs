use crate::core::models::ligand::{Ligand, LinkerPair};
use phf::phf_set;
use thiserror::Error;
use tracing::debug;

static METAL_TYPES: phf::Set<&'static str> = phf_set! {
    "FE+2", "FE+3", "CR", "MO", "AL", "PD", "PT", "CU", "ZN", "ZR", "RH",
    "RU", "NI", "CO", "PO", "MN", "MG", "V", "W", "IR", "TI",
};

static NON_METAL_TYPES: phf::Set<&'static str> = phf_set! {
    "N_1", "N_2", "N_3", "O_1", "O_2", "O_3", "S_2", "S_3", "P_3", "P_5",
    "O", "N", "S", "P",
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkerError {
    #[error("Connectivity table has {rows} rows but {types} atom types were given")]
    LengthMismatch { types: usize, rows: usize },
    #[error("Atom {atom} lists neighbour {neighbor}, which is out of range")]
    NeighborOutOfRange { atom: usize, neighbor: usize },
}

/// Anchor atoms and linker pairs derived from a ligand's connectivity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkerAtoms {
    /// Metal atoms bonded to exactly one non-metal, in atom order.
    pub anchors: Vec<usize>,
    /// Coordinating oxygen and its carbon, for every anchor bound through an oxygen.
    pub linkers: Vec<LinkerPair>,
}

pub fn is_metal(type_name: &str) -> bool {
    METAL_TYPES.contains(type_name.trim().to_ascii_uppercase().as_str())
}

pub fn is_non_metal(type_name: &str) -> bool {
    NON_METAL_TYPES.contains(type_name.trim().to_ascii_uppercase().as_str())
}

fn is_oxygen(type_name: &str) -> bool {
    type_name.trim().to_ascii_uppercase().starts_with('O')
}

fn is_carbon(type_name: &str) -> bool {
    type_name.trim().to_ascii_uppercase().starts_with('C') && !is_metal(type_name)
}

/// Derives anchors from per-atom type names and a neighbour table.
///
/// A metal with exactly one bonded neighbour, where that neighbour is a recognized
/// non-metal, marks a chemical attachment point and becomes an anchor. When the
/// neighbour is an oxygen, its first other carbon neighbour completes a [`LinkerPair`].
///
/// # Errors
///
/// Returns [`LinkerError`] if the tables disagree in length or reference missing atoms.
pub fn locate_linker_atoms<S: AsRef<str>>(
    type_names: &[S],
    neighbors: &[Vec<usize>],
) -> Result<LinkerAtoms, LinkerError> {
    if type_names.len() != neighbors.len() {
        return Err(LinkerError::LengthMismatch {
            types: type_names.len(),
            rows: neighbors.len(),
        });
    }
    for (atom, row) in neighbors.iter().enumerate() {
        if let Some(&neighbor) = row.iter().find(|&&n| n >= neighbors.len()) {
            return Err(LinkerError::NeighborOutOfRange { atom, neighbor });
        }
    }

    let mut found = LinkerAtoms::default();
    for (atom, row) in neighbors.iter().enumerate() {
        if !is_metal(type_names[atom].as_ref()) {
            continue;
        }
        let [partner] = row.as_slice() else {
            continue;
        };
        let partner_type = type_names[*partner].as_ref();
        if !is_non_metal(partner_type) {
            continue;
        }
        found.anchors.push(atom);

        if is_oxygen(partner_type) {
            let carbon = neighbors[*partner]
                .iter()
                .copied()
                .find(|&n| n != atom && is_carbon(type_names[n].as_ref()));
            if let Some(carbon) = carbon {
                found.linkers.push(LinkerPair {
                    oxygen: *partner,
                    carbon,
                });
            }
        }
    }

    debug!(
        anchors = ?found.anchors,
        linkers = found.linkers.len(),
        "Located linker atoms."
    );
    Ok(found)
}

/// Runs [`locate_linker_atoms`] on a ligand's own types and bonds.
pub fn locate_in_ligand(ligand: &Ligand) -> Result<LinkerAtoms, LinkerError> {
    let types: Vec<&str> = ligand
        .atoms()
        .iter()
        .map(|a| a.force_field_type.as_str())
        .collect();
    locate_linker_atoms(&types, &ligand.neighbors())
}
