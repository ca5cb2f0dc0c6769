/// A residue: a named, numbered group of consecutive atoms within a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub number: isize,         // Residue sequence number from the source file
    pub name: String,          // Residue name (e.g., "ALA", "SOL")
    pub chain_id: char,        // Chain identifier (e.g., 'A')
    pub(crate) atoms: Vec<usize>, // Topology indices of the member atoms, ascending
}

impl Residue {
    pub(crate) fn new(number: isize, name: &str, chain_id: char) -> Self {
        Self {
            number,
            name: name.to_string(),
            chain_id,
            atoms: Vec::new(),
        }
    }

    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }
}
