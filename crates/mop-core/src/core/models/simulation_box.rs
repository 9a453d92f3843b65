use super::boundary::Boundary;
use super::ids::SpeciesId;
use super::ligand::{Ligand, Molecule};
use slotmap::{SecondaryMap, SlotMap};

/// Holds the ligand species of an assembly and the molecules placed for each of them.
///
/// The box owns the templates (species) and, per species, an ordered molecule list whose
/// entries are copies of that template. It also owns the boundary whose central-image
/// function is applied after every rigid move of a molecule.
#[derive(Debug)]
pub struct SimulationBox {
    /// Periodic (or open) boundary of the box.
    boundary: Box<dyn Boundary>,
    /// Ligand templates, one per species.
    species: SlotMap<SpeciesId, Ligand>,
    /// Molecule lists, one per species, in placement order.
    molecules: SecondaryMap<SpeciesId, Vec<Molecule>>,
}

impl SimulationBox {
    /// Creates an empty box with the given boundary.
    pub fn new(boundary: Box<dyn Boundary>) -> Self {
        Self {
            boundary,
            species: SlotMap::with_key(),
            molecules: SecondaryMap::new(),
        }
    }

    /// Returns the boundary used for re-imaging.
    pub fn boundary(&self) -> &dyn Boundary {
        self.boundary.as_ref()
    }

    /// Registers a ligand template as a new species with zero molecules.
    ///
    /// # Return
    ///
    /// The identifier of the new species.
    pub fn add_species(&mut self, ligand: Ligand) -> SpeciesId {
        let id = self.species.insert(ligand);
        self.molecules.insert(id, Vec::new());
        id
    }

    /// Retrieves the template of a species.
    pub fn species(&self, id: SpeciesId) -> Option<&Ligand> {
        self.species.get(id)
    }

    /// Returns an iterator over all species in the box.
    pub fn species_iter(&self) -> impl Iterator<Item = (SpeciesId, &Ligand)> {
        self.species.iter()
    }

    /// Resizes the molecule list of a species to `count`.
    ///
    /// Existing molecules are kept in order; new ones are fresh template copies.
    ///
    /// # Return
    ///
    /// Returns `None` if the species is unknown.
    pub fn set_molecule_count(&mut self, id: SpeciesId, count: usize) -> Option<()> {
        let template = self.species.get(id)?;
        let list = self.molecules.get_mut(id)?;
        if count <= list.len() {
            list.truncate(count);
        } else {
            let missing = count - list.len();
            list.extend(std::iter::repeat_with(|| template.make_instance()).take(missing));
        }
        Some(())
    }

    /// Number of molecules of a species (zero for an unknown species).
    pub fn molecule_count(&self, id: SpeciesId) -> usize {
        self.molecules.get(id).map_or(0, Vec::len)
    }

    /// The molecules of a species in placement order.
    pub fn molecule_list(&self, id: SpeciesId) -> &[Molecule] {
        self.molecules.get(id).map_or(&[], Vec::as_slice)
    }

    /// Mutable access to the molecules of a species.
    pub fn molecule_list_mut(&mut self, id: SpeciesId) -> Option<&mut [Molecule]> {
        self.molecules.get_mut(id).map(Vec::as_mut_slice)
    }

    /// Total number of molecules across all species.
    pub fn total_molecule_count(&self) -> usize {
        self.molecules.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::boundary::{OpenBoundary, PeriodicBoundary};
    use nalgebra::{Point3, Vector3};

    fn dimer() -> Ligand {
        Ligand::new(
            "DIM",
            vec![
                Atom::new("A", "ZN", Point3::new(0.0, 0.0, 0.0)),
                Atom::new("B", "ZN", Point3::new(1.0, 0.0, 0.0)),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn new_species_starts_with_no_molecules() {
        let mut sim_box = SimulationBox::new(Box::new(OpenBoundary));
        let id = sim_box.add_species(dimer());
        assert_eq!(sim_box.molecule_count(id), 0);
        assert!(sim_box.molecule_list(id).is_empty());
        assert_eq!(sim_box.species(id).unwrap().name(), "DIM");
    }

    #[test]
    fn set_molecule_count_grows_with_template_copies_and_truncates() {
        let mut sim_box = SimulationBox::new(Box::new(OpenBoundary));
        let id = sim_box.add_species(dimer());

        sim_box.set_molecule_count(id, 3).unwrap();
        assert_eq!(sim_box.molecule_count(id), 3);
        assert_eq!(
            sim_box.molecule_list(id)[2].position(1),
            Some(&Point3::new(1.0, 0.0, 0.0))
        );

        *sim_box.molecule_list_mut(id).unwrap()[0]
            .position_mut(0)
            .unwrap() = Point3::new(5.0, 5.0, 5.0);
        sim_box.set_molecule_count(id, 1).unwrap();
        assert_eq!(sim_box.molecule_count(id), 1);
        assert_eq!(
            sim_box.molecule_list(id)[0].position(0),
            Some(&Point3::new(5.0, 5.0, 5.0))
        );
        assert_eq!(sim_box.total_molecule_count(), 1);
    }

    #[test]
    fn boundary_is_exposed_for_re_imaging() {
        let sim_box = SimulationBox::new(Box::new(PeriodicBoundary::cubic(8.0).unwrap()));
        assert_eq!(sim_box.boundary().dimensions(), Some(Vector3::repeat(8.0)));
    }
}
