//! Random password generation under character-class constraints.
//!
//! Every draw goes through the OS CSPRNG. `SliceRandom::choose` and
//! `SliceRandom::shuffle` sample indices with rejection, so there is no
//! modulo bias.

use std::collections::BTreeSet;

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use zeroize::Zeroizing;

use crate::error::GeneratorError;

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGIT: &[u8] = b"0123456789";
const SYMBOL: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CharClass {
    Upper,
    Lower,
    Digit,
    Symbol,
}

impl CharClass {
    pub const ALL: [CharClass; 4] = [
        CharClass::Upper,
        CharClass::Lower,
        CharClass::Digit,
        CharClass::Symbol,
    ];

    pub fn alphabet(self) -> &'static [u8] {
        match self {
            CharClass::Upper => UPPER,
            CharClass::Lower => LOWER,
            CharClass::Digit => DIGIT,
            CharClass::Symbol => SYMBOL,
        }
    }

    pub fn contains(self, c: char) -> bool {
        c.is_ascii() && self.alphabet().contains(&(c as u8))
    }
}

/// Generates a password of exactly `length` characters.
///
/// One character is drawn from each selected class, the rest from the union
/// of the selected alphabets, and the result is shuffled. Duplicate classes
/// count once.
///
/// # Errors
///
/// - [`GeneratorError::EmptyCharset`] if no class is selected
/// - [`GeneratorError::LengthBelowClassCount`] if `length` cannot fit one
///   character per selected class
pub fn generate(length: usize, classes: &[CharClass]) -> Result<Zeroizing<String>, GeneratorError> {
    let classes: BTreeSet<CharClass> = classes.iter().copied().collect();
    if classes.is_empty() {
        return Err(GeneratorError::EmptyCharset);
    }
    if length < classes.len() {
        return Err(GeneratorError::LengthBelowClassCount {
            length,
            classes: classes.len(),
        });
    }

    let mut rng = OsRng;
    let mut chars: Zeroizing<Vec<u8>> = Zeroizing::new(Vec::with_capacity(length));

    for class in &classes {
        chars.extend(class.alphabet().choose(&mut rng).copied());
    }

    let pool: Vec<u8> = classes
        .iter()
        .flat_map(|class| class.alphabet().iter().copied())
        .collect();
    for _ in classes.len()..length {
        chars.extend(pool.choose(&mut rng).copied());
    }

    chars.shuffle(&mut rng);

    Ok(Zeroizing::new(chars.iter().map(|&b| b as char).collect()))
}
