use nalgebra::Point3;

/// Represents one atom of a ligand template.
///
/// Template atoms carry the identity data shared by every copy of a species
/// (name, force field type, charge) together with the reference position the
/// copies are instantiated from. Copies only store their own positions, so the
/// atom order of a template is the index space used by anchors, bonds, and
/// placed molecules alike.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "ZN1", "O3").
    pub name: String,
    /// The force field atom type (e.g., "ZN", "O_2", "C_R").
    pub force_field_type: String,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
    /// The reference 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom` with a zero partial charge.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `force_field_type` - The force field type used for anchor discovery.
    /// * `position` - The reference coordinates of the atom.
    pub fn new(name: &str, force_field_type: &str, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            force_field_type: force_field_type.to_string(),
            partial_charge: 0.0,
            position,
        }
    }

    /// Returns the force field type in the upper-case form used by the type tables.
    pub fn normalized_type(&self) -> String {
        self.force_field_type.trim().to_ascii_uppercase()
    }
}
