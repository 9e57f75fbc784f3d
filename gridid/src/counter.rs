use crate::{
    alphabet::Alphabet,
    error::{GridIdError, Result},
};

/// Zero-padded positional encoding of per-cell counters.
#[derive(Debug, Clone)]
pub struct CounterEncoder {
    alphabet: Alphabet,
    min_width: usize,
}

impl CounterEncoder {
    /// `min_width` is a minimum: larger counters produce longer codes.
    pub fn new(alphabet: Alphabet, min_width: usize) -> Result<Self> {
        if min_width == 0 {
            return Err(GridIdError::ZeroPadding);
        }
        Ok(Self {
            alphabet,
            min_width,
        })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn min_width(&self) -> usize {
        self.min_width
    }

    /// Returns `n` in the alphabet, most significant symbol first,
    /// left-padded with the zero symbol.
    pub fn encode(&self, mut n: u64) -> String {
        let base = self.alphabet.base() as u64;
        let symbols = self.alphabet.symbols();
        let mut digits = Vec::with_capacity(self.min_width);
        while n > 0 {
            #[allow(clippy::cast_possible_truncation)]
            digits.push(symbols[(n % base) as usize]);
            n /= base;
        }
        while digits.len() < self.min_width {
            digits.push(self.alphabet.zero());
        }
        digits.iter().rev().collect()
    }

    /// Inverse of [`encode`](Self::encode). Padding is not required.
    pub fn decode(&self, code: &str) -> Result<u64> {
        if code.is_empty() {
            return Err(GridIdError::EmptyCounter);
        }
        let base = self.alphabet.base() as u64;
        code.chars().try_fold(0_u64, |acc, c| {
            let digit = self.alphabet.decode_digit(c)? as u64;
            acc.checked_mul(base)
                .and_then(|acc| acc.checked_add(digit))
                .ok_or_else(|| GridIdError::Overflow(code.to_owned()))
        })
    }
}
