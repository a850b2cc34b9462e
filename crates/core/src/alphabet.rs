//! Fixed-alphabet letter-mask codec.
//!
//! An [`Alphabet`] is an ordered set of at most 64 lower-case symbols. Encoding a
//! text sets bit `i` of a [`LetterMask`] when the text contains alphabet symbol
//! `i` at least once. Case is folded before lookup and characters outside the
//! alphabet are ignored.
//!
//! The mask records letter *presence* only: `"aardvark"` and `"ardvk"` encode to
//! the same mask, so a pool holding a single `a` is enough to form `"aardvark"`.
//! Callers that need multiplicity must check counts themselves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::sync::OnceLock;

/// Polish alphabet (32 letters) extended with the loanword letters `q`, `v`, `x`.
pub const POLISH_LETTERS: &str = "aąbcćdeęfghijklłmnńoópqrsśtuvwxyzźż";

/// Upper bound on alphabet size, fixed by the `u64` mask word.
pub const MAX_ALPHABET_LEN: usize = 64;

/// Presence bitmask over an [`Alphabet`]. Bit `i` corresponds to alphabet position `i`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LetterMask(u64);

impl LetterMask {
    /// Mask with no letters set.
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of distinct letters present.
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether the letter at alphabet `position` is present.
    pub const fn contains(self, position: usize) -> bool {
        position < MAX_ALPHABET_LEN && self.0 & (1u64 << position) != 0
    }

    /// Returns a copy with the letter at `position` set.
    pub const fn with(self, position: usize) -> Self {
        Self(self.0 | (1u64 << position))
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// `self & pool == self`: every letter of `self` also appears in `pool`.
    pub const fn is_subset_of(self, pool: Self) -> bool {
        self.0 & pool.0 == self.0
    }
}

impl BitOr for LetterMask {
    type Output = LetterMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Errors raised while building an alphabet or parsing a rendered mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlphabetError {
    Empty,
    TooLong(usize),
    Duplicate(char),
    NotLowercase(char),
    BadMaskLength { expected: usize, actual: usize },
    BadMaskChar(char),
}

impl fmt::Display for AlphabetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlphabetError::Empty => write!(f, "alphabet must not be empty"),
            AlphabetError::TooLong(len) => write!(
                f,
                "alphabet has {} symbols, at most {} are supported",
                len, MAX_ALPHABET_LEN
            ),
            AlphabetError::Duplicate(c) => write!(f, "duplicate alphabet symbol '{}'", c),
            AlphabetError::NotLowercase(c) => {
                write!(f, "alphabet symbol '{}' is not lower-case", c)
            }
            AlphabetError::BadMaskLength { expected, actual } => write!(
                f,
                "mask string has {} bits, alphabet needs {}",
                actual, expected
            ),
            AlphabetError::BadMaskChar(c) => write!(f, "mask string contains '{}'", c),
        }
    }
}

impl std::error::Error for AlphabetError {}

/// An ordered, immutable sequence of distinct lower-case letter symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    /// Builds an alphabet from its symbols in order.
    pub fn new(symbols: &str) -> Result<Self, AlphabetError> {
        let symbols: Vec<char> = symbols.chars().collect();
        if symbols.is_empty() {
            return Err(AlphabetError::Empty);
        }
        if symbols.len() > MAX_ALPHABET_LEN {
            return Err(AlphabetError::TooLong(symbols.len()));
        }
        for (i, &c) in symbols.iter().enumerate() {
            if c.to_lowercase().ne(std::iter::once(c)) {
                return Err(AlphabetError::NotLowercase(c));
            }
            if symbols[..i].contains(&c) {
                return Err(AlphabetError::Duplicate(c));
            }
        }
        Ok(Self { symbols })
    }

    /// The shared 35-letter Polish alphabet.
    pub fn polish() -> &'static Alphabet {
        static POLISH: OnceLock<Alphabet> = OnceLock::new();
        POLISH.get_or_init(|| {
            Alphabet::new(POLISH_LETTERS).expect("POLISH_LETTERS is a valid alphabet")
        })
    }

    /// Number of symbols, which is also the mask width in bits.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// Zero-based position of `c`, compared exactly (no case folding).
    pub fn position(&self, c: char) -> Option<usize> {
        self.symbols.iter().position(|&s| s == c)
    }

    /// Encodes the set of alphabet letters present in `text`.
    pub fn encode(&self, text: &str) -> LetterMask {
        text.chars()
            .flat_map(char::to_lowercase)
            .filter_map(|c| self.position(c))
            .fold(LetterMask::empty(), LetterMask::with)
    }

    /// Renders a mask as a fixed-width `0`/`1` string, alphabet position 0 first.
    pub fn render(&self, mask: LetterMask) -> String {
        (0..self.len())
            .map(|i| if mask.contains(i) { '1' } else { '0' })
            .collect()
    }

    /// Parses the output of [`render`](Alphabet::render).
    pub fn parse_mask(&self, rendered: &str) -> Result<LetterMask, AlphabetError> {
        let actual = rendered.chars().count();
        if actual != self.len() {
            return Err(AlphabetError::BadMaskLength {
                expected: self.len(),
                actual,
            });
        }
        rendered
            .chars()
            .enumerate()
            .try_fold(LetterMask::empty(), |mask, (i, c)| match c {
                '0' => Ok(mask),
                '1' => Ok(mask.with(i)),
                other => Err(AlphabetError::BadMaskChar(other)),
            })
    }

    /// The letters present in `mask`, in alphabet order.
    pub fn letters_of(&self, mask: LetterMask) -> String {
        self.symbols
            .iter()
            .enumerate()
            .filter(|(i, _)| mask.contains(*i))
            .map(|(_, &c)| c)
            .collect()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.symbols.iter().try_for_each(|c| write!(f, "{}", c))
    }
}
