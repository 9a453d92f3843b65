use super::atom::Atom;
use super::topology::{Bond, adjacency};
use nalgebra::Point3;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LigandError {
    #[error("Anchor index {index} is out of range for a ligand with {atom_count} atoms")]
    AnchorOutOfRange { index: usize, atom_count: usize },
    #[error("Anchor index {0} is listed more than once")]
    DuplicateAnchor(usize),
    #[error("Linker atom index {index} is out of range for a ligand with {atom_count} atoms")]
    LinkerOutOfRange { index: usize, atom_count: usize },
}

/// The coordinating oxygen of a linker and the carbon it is bonded to.
///
/// The oxygen-to-carbon vector fixes the rotation of an edge-placed ligand
/// around its anchor-anchor axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkerPair {
    pub oxygen: usize,
    pub carbon: usize,
}

/// A named ligand template.
///
/// The atom list is index-stable: anchors, bonds, linker atoms, and the positions of every
/// copy made with [`Ligand::make_instance`] all refer to atoms by their position in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Ligand {
    name: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    anchors: Vec<usize>,
    linker: Option<LinkerPair>,
}

impl Ligand {
    /// Creates a template without anchors or linker atoms.
    pub fn new(name: &str, atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        Self {
            name: name.to_string(),
            atoms,
            bonds,
            anchors: Vec::new(),
            linker: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn anchors(&self) -> &[usize] {
        &self.anchors
    }

    pub fn linker(&self) -> Option<LinkerPair> {
        self.linker
    }

    /// Replaces the anchor set.
    ///
    /// # Errors
    ///
    /// Returns [`LigandError`] if an index is out of range or repeated; the template is
    /// left untouched in that case.
    pub fn set_anchors(&mut self, anchors: Vec<usize>) -> Result<(), LigandError> {
        let mut seen = HashSet::with_capacity(anchors.len());
        for &index in &anchors {
            if index >= self.atoms.len() {
                return Err(LigandError::AnchorOutOfRange {
                    index,
                    atom_count: self.atoms.len(),
                });
            }
            if !seen.insert(index) {
                return Err(LigandError::DuplicateAnchor(index));
            }
        }
        self.anchors = anchors;
        Ok(())
    }

    pub fn set_linker(&mut self, linker: Option<LinkerPair>) -> Result<(), LigandError> {
        if let Some(pair) = linker {
            for index in [pair.oxygen, pair.carbon] {
                if index >= self.atoms.len() {
                    return Err(LigandError::LinkerOutOfRange {
                        index,
                        atom_count: self.atoms.len(),
                    });
                }
            }
        }
        self.linker = linker;
        Ok(())
    }

    /// Creates a fresh copy of this template positioned at the reference coordinates.
    pub fn make_instance(&self) -> Molecule {
        Molecule {
            positions: self.atoms.iter().map(|a| a.position).collect(),
        }
    }

    pub fn anchor_positions(&self) -> Vec<Point3<f64>> {
        self.anchors
            .iter()
            .map(|&i| self.atoms[i].position)
            .collect()
    }

    /// Bonded neighbours of every atom, in bond order.
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        adjacency(self.atoms.len(), &self.bonds)
    }

    /// Largest distance from atom `origin` to any atom of the template.
    pub fn extent_from(&self, origin: usize) -> f64 {
        let Some(center) = self.atoms.get(origin).map(|a| a.position) else {
            return 0.0;
        };
        self.atoms
            .iter()
            .map(|a| (a.position - center).norm())
            .fold(0.0, f64::max)
    }
}

/// One copy of a ligand template: only the positions, indexed like the template's atoms.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    positions: Vec<Point3<f64>>,
}

impl Molecule {
    pub fn atom_count(&self) -> usize {
        self.positions.len()
    }

    pub fn position(&self, index: usize) -> Option<&Point3<f64>> {
        self.positions.get(index)
    }

    pub fn position_mut(&mut self, index: usize) -> Option<&mut Point3<f64>> {
        self.positions.get_mut(index)
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::BondOrder;

    fn linear_ligand() -> Ligand {
        let atoms = vec![
            Atom::new("ZN1", "ZN", Point3::new(0.0, 0.0, 0.0)),
            Atom::new("O1", "O_2", Point3::new(1.0, 0.0, 0.0)),
            Atom::new("C1", "C_R", Point3::new(2.0, 0.0, 0.0)),
            Atom::new("ZN2", "ZN", Point3::new(3.0, 0.0, 0.0)),
        ];
        let bonds = vec![
            Bond::new(0, 1, BondOrder::Single),
            Bond::new(1, 2, BondOrder::Single),
            Bond::new(2, 3, BondOrder::Single),
        ];
        Ligand::new("LIN", atoms, bonds)
    }

    #[test]
    fn set_anchors_accepts_valid_indices() {
        let mut ligand = linear_ligand();
        ligand.set_anchors(vec![0, 3]).unwrap();
        assert_eq!(ligand.anchors(), &[0, 3]);
        assert_eq!(
            ligand.anchor_positions(),
            vec![Point3::origin(), Point3::new(3.0, 0.0, 0.0)]
        );
    }

    #[test]
    fn set_anchors_rejects_out_of_range_and_duplicates_without_mutation() {
        let mut ligand = linear_ligand();
        ligand.set_anchors(vec![0, 3]).unwrap();

        assert_eq!(
            ligand.set_anchors(vec![0, 4]),
            Err(LigandError::AnchorOutOfRange {
                index: 4,
                atom_count: 4
            })
        );
        assert_eq!(
            ligand.set_anchors(vec![1, 1]),
            Err(LigandError::DuplicateAnchor(1))
        );
        assert_eq!(ligand.anchors(), &[0, 3]);
    }

    #[test]
    fn set_linker_validates_indices() {
        let mut ligand = linear_ligand();
        let pair = LinkerPair {
            oxygen: 1,
            carbon: 2,
        };
        ligand.set_linker(Some(pair)).unwrap();
        assert_eq!(ligand.linker(), Some(pair));

        let bad = LinkerPair {
            oxygen: 1,
            carbon: 10,
        };
        assert!(ligand.set_linker(Some(bad)).is_err());
        assert_eq!(ligand.linker(), Some(pair));
    }

    #[test]
    fn make_instance_copies_reference_positions() {
        let ligand = linear_ligand();
        let mut copy = ligand.make_instance();
        assert_eq!(copy.atom_count(), 4);
        assert_eq!(copy.position(2), Some(&Point3::new(2.0, 0.0, 0.0)));

        *copy.position_mut(2).unwrap() = Point3::new(9.0, 9.0, 9.0);
        assert_eq!(ligand.atoms()[2].position, Point3::new(2.0, 0.0, 0.0));
        assert!(copy.position(4).is_none());
    }

    #[test]
    fn neighbors_and_extent_follow_template() {
        let ligand = linear_ligand();
        assert_eq!(ligand.neighbors()[1], vec![0, 2]);
        assert!((ligand.extent_from(0) - 3.0).abs() < 1e-12);
        assert!((ligand.extent_from(1) - 2.0).abs() < 1e-12);
        assert_eq!(ligand.extent_from(99), 0.0);
    }
}
