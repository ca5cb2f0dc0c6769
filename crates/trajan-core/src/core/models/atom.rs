use super::element;

/// Static metadata of one atom in a topology.
///
/// Coordinates are not part of the atom: they live in the frame buffer (or, for the
/// reference structure, in `TopologyInformation`), indexed by the atom's position in
/// the topology.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The serial number from the source file.
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "OW").
    pub name: String,
    /// Index of the parent residue in the topology.
    pub residue_index: usize,
    /// The force field atom type (e.g., "C_3"); empty when the format has none.
    pub force_field_type: String,
    /// The guessed element symbol, if recognizable.
    pub element: Option<&'static str>,
    /// The atomic mass in g/mol (zero when the element is unknown).
    pub mass: f64,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
}

impl Atom {
    /// Creates an atom, guessing its element and mass from the force field type and,
    /// failing that, from the atom name.
    pub fn new(serial: usize, name: &str, residue_index: usize, force_field_type: &str) -> Self {
        let element =
            element::guess_element(force_field_type).or_else(|| element::guess_element(name));
        let mass = element.and_then(element::atomic_mass).unwrap_or(0.0);
        Self {
            serial,
            name: name.to_string(),
            residue_index,
            force_field_type: force_field_type.to_string(),
            element,
            mass,
            partial_charge: 0.0,
        }
    }
}
