// alphabet.rs - Alphabets and symbol encoding

use crate::error::{PrepError, Result};
use std::fmt::{self, Display};

/// Reference amino acid alphabet, gap first
pub const AMINO_ACIDS: &str = "-ACDEFGHIKLMNPQRSTVWY";

/// Index of the gap/wildcard symbol in every alphabet
pub const GAP: u8 = 0;

/// One encoded alignment cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Character matches an alphabet symbol exactly
    Exact(u8),
    /// Lowercase variant of an alphabet symbol
    Soft(u8),
    /// Character outside the alphabet
    Invalid,
}

impl Symbol {
    /// Alphabet index, ignoring case; `None` for out-of-alphabet cells
    pub fn index(&self) -> Option<u8> {
        match self {
            Symbol::Exact(i) | Symbol::Soft(i) => Some(*i),
            Symbol::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Symbol::Invalid)
    }

    pub fn is_gap(&self) -> bool {
        self.index() == Some(GAP)
    }

    /// Integer encoding used by existing downstream tools:
    /// `[0, n)` exact, `[-n, -1]` soft, `n` out of alphabet
    pub fn legacy_code(&self, n_codes: usize) -> i32 {
        let n = n_codes as i32;
        match self {
            Symbol::Exact(i) => *i as i32,
            Symbol::Soft(i) => *i as i32 - n,
            Symbol::Invalid => n,
        }
    }

    /// Inverse of [`Symbol::legacy_code`]
    pub fn from_legacy_code(code: i32, n_codes: usize) -> Self {
        let n = n_codes as i32;
        if (0..n).contains(&code) {
            Symbol::Exact(code as u8)
        } else if (-n..0).contains(&code) {
            Symbol::Soft((code + n) as u8)
        } else {
            Symbol::Invalid
        }
    }
}

/// Ordered symbol set; symbol 0 is the gap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
    protein: bool,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::protein()
    }
}

impl Alphabet {
    /// The reference protein alphabet (`.` read as gap, focus drops lowercase columns)
    pub fn protein() -> Self {
        Self {
            symbols: AMINO_ACIDS.as_bytes().to_vec(),
            protein: true,
        }
    }

    /// Build an alphabet from a string whose first character is the gap symbol.
    /// The protein-specific rules only apply to the reference amino acid string.
    pub fn new(symbols: &str) -> Result<Self> {
        if symbols.is_empty() {
            return Err(PrepError::config("alphabet must not be empty"));
        }
        if !symbols.is_ascii() {
            return Err(PrepError::config(format!(
                "alphabet '{}' contains non-ASCII characters",
                symbols
            )));
        }
        if symbols.len() > u8::MAX as usize {
            return Err(PrepError::config(format!(
                "alphabet has {} symbols, at most {} are supported",
                symbols.len(),
                u8::MAX
            )));
        }
        let bytes = symbols.as_bytes();
        for (k, c) in bytes.iter().enumerate() {
            if bytes[..k].contains(c) {
                return Err(PrepError::config(format!(
                    "alphabet '{}' repeats symbol '{}'",
                    symbols, *c as char
                )));
            }
        }
        Ok(Self {
            symbols: bytes.to_vec(),
            protein: symbols == AMINO_ACIDS,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn is_protein(&self) -> bool {
        self.protein
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// Character for an alphabet index
    pub fn letter(&self, index: u8) -> char {
        self.symbols[index as usize] as char
    }

    /// Encode one raw alignment character
    pub fn encode(&self, c: u8) -> Symbol {
        let c = if self.protein && c == b'.' { b'-' } else { c };
        if let Some(i) = self.symbols.iter().position(|&s| s == c) {
            return Symbol::Exact(i as u8);
        }
        let upper = c.to_ascii_uppercase();
        match self.symbols.iter().position(|&s| s == upper) {
            Some(i) => Symbol::Soft(i as u8),
            None => Symbol::Invalid,
        }
    }

    /// Decode a symbol back to a character; soft symbols come back lowercase
    pub fn decode(&self, symbol: Symbol) -> Option<char> {
        match symbol {
            Symbol::Exact(i) => Some(self.letter(i)),
            Symbol::Soft(i) => Some(self.letter(i).to_ascii_lowercase()),
            Symbol::Invalid => None,
        }
    }
}

impl Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.symbols))
    }
}
