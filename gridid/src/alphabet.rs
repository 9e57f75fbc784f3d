//! Ordered symbol sets used for every positional encoding in this
//! crate.

use crate::error::{GridIdError, Result};
use std::{fmt, str::FromStr};

/// Separator between the parts of an identifier, never a valid
/// symbol.
pub const SEPARATOR: char = '-';

pub const BASE_B10: &str = "0123456789";
pub const BASE_B14: &str = "23456789ABCDEF";
pub const BASE_B16: &str = "0123456789ABCDEF";
/// Compact base 32: no `0`, `1`, `I` or `O`, so codes can't be misread.
pub const BASE_B32_CAPS: &str = "23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
pub const BASE_B32_LOWER: &str = "23456789abcdefghjklmnpqrstuvwxyz";

/// The built-in alphabets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Base {
    #[default]
    B10,
    B14,
    B16,
    B32Caps,
    B32Lower,
}

impl Base {
    pub const ALL: [Base; 5] = [
        Base::B10,
        Base::B14,
        Base::B16,
        Base::B32Caps,
        Base::B32Lower,
    ];

    pub fn symbols(self) -> &'static str {
        match self {
            Base::B10 => BASE_B10,
            Base::B14 => BASE_B14,
            Base::B16 => BASE_B16,
            Base::B32Caps => BASE_B32_CAPS,
            Base::B32Lower => BASE_B32_LOWER,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Base::B10 => "B10",
            Base::B14 => "B14",
            Base::B16 => "B16",
            Base::B32Caps => "B32_CAPS",
            Base::B32Lower => "B32_LOWER",
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Base {
    type Err = GridIdError;

    fn from_str(s: &str) -> Result<Self> {
        Base::ALL
            .into_iter()
            .find(|base| base.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GridIdError::UnknownBase(s.to_owned()))
    }
}

/// An ordered sequence of distinct symbols.
///
/// The symbol at index 0 is the zero symbol, used for padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Box<[char]>,
}

impl Alphabet {
    /// Returns an alphabet made of the characters of `symbols`, in
    /// order.
    ///
    /// There must be at least two symbols, none repeated, and none
    /// of them whitespace or the identifier separator.
    pub fn new(symbols: &str) -> Result<Self> {
        let symbols: Box<[char]> = symbols.chars().collect();
        if symbols.len() < 2 {
            return Err(GridIdError::InvalidAlphabet(format!(
                "need at least 2 symbols, got {}",
                symbols.len()
            )));
        }
        for (i, &c) in symbols.iter().enumerate() {
            if c == SEPARATOR || c.is_whitespace() {
                return Err(GridIdError::InvalidAlphabet(format!(
                    "symbol {c:?} is reserved"
                )));
            }
            if symbols[..i].contains(&c) {
                return Err(GridIdError::InvalidAlphabet(format!(
                    "symbol {c:?} repeats"
                )));
            }
        }
        Ok(Self { symbols })
    }

    /// Number of symbols, the `B` of every encoding.
    pub fn base(&self) -> usize {
        self.symbols.len()
    }

    pub fn zero(&self) -> char {
        self.symbols[0]
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Returns the symbol for `value`.
    pub fn encode_digit(&self, value: usize) -> Result<char> {
        self.symbols
            .get(value)
            .copied()
            .ok_or(GridIdError::DigitOutOfRange {
                value,
                base: self.base(),
            })
    }

    /// Returns the position of `symbol`.
    pub fn decode_digit(&self, symbol: char) -> Result<usize> {
        self.symbols
            .iter()
            .position(|&c| c == symbol)
            .ok_or(GridIdError::SymbolNotFound(symbol))
    }
}

impl From<Base> for Alphabet {
    fn from(base: Base) -> Self {
        Self {
            symbols: base.symbols().chars().collect(),
        }
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Base::default().into()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.symbols.iter().try_for_each(|c| write!(f, "{c}"))
    }
}
