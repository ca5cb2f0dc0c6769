use phf::phf_map;

/// Standard atomic masses in g/mol for the elements found in biomolecular simulations.
static ATOMIC_MASSES: phf::Map<&'static str, f64> = phf_map! {
    "H" => 1.008,
    "He" => 4.0026,
    "Li" => 6.94,
    "B" => 10.81,
    "C" => 12.011,
    "N" => 14.007,
    "O" => 15.999,
    "F" => 18.998,
    "Na" => 22.990,
    "Mg" => 24.305,
    "Al" => 26.982,
    "Si" => 28.085,
    "P" => 30.974,
    "S" => 32.06,
    "Cl" => 35.45,
    "Ar" => 39.948,
    "K" => 39.098,
    "Ca" => 40.078,
    "Mn" => 54.938,
    "Fe" => 55.845,
    "Co" => 58.933,
    "Ni" => 58.693,
    "Cu" => 63.546,
    "Zn" => 65.38,
    "Se" => 78.971,
    "Br" => 79.904,
    "I" => 126.90,
};

/// Returns the standard atomic mass of an element symbol (e.g. "C", "Cl").
pub fn atomic_mass(symbol: &str) -> Option<f64> {
    ATOMIC_MASSES.get(symbol).copied()
}

/// Guesses the element symbol of an atom from its name or force field type.
///
/// Leading digits are skipped (e.g. "1HB" is a hydrogen). A two-letter symbol is
/// preferred when its second letter is lowercase in the input and the symbol is known
/// (e.g. "Cl", "Na"); otherwise the first letter decides. Force field suffixes such as
/// `C_3` or `N.2` do not interfere because only leading letters are inspected.
pub fn guess_element(label: &str) -> Option<&'static str> {
    let letters: Vec<char> = label
        .trim()
        .chars()
        .skip_while(|c| c.is_ascii_digit())
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let first = letters.first()?.to_ascii_uppercase();

    if let Some(second) = letters.get(1).filter(|c| c.is_ascii_lowercase()) {
        let candidate: String = [first, *second].iter().collect();
        if let Some((symbol, _)) = ATOMIC_MASSES.get_entry(candidate.as_str()) {
            return Some(*symbol);
        }
    }

    let single = first.to_string();
    ATOMIC_MASSES
        .get_entry(single.as_str())
        .map(|(symbol, _)| *symbol)
}
