//! Character to Morse symbol table.
//!
//! Each entry packs the elements of one character into a byte, first element
//! in the least significant bit. A set bit is a dah, a clear bit is a dit.
//! The table is built at compile time from dot/dash patterns and covers the
//! 7-bit ASCII range; everything else has no symbols.

use serde::{Deserialize, Serialize};

/// Longest symbol sequence an entry can hold.
pub const MAX_SYMBOLS: usize = 8;

/// One Morse element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    Dit,
    Dah,
}

impl Symbol {
    /// Tone length in dit units.
    pub fn units(self) -> u32 {
        match self {
            Symbol::Dit => 1,
            Symbol::Dah => 3,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::Dit => '.',
            Symbol::Dah => '-',
        }
    }
}

/// The symbols for one character.
///
/// An entry with a count of zero stands for a character Morse has no code
/// for. Such characters are skipped without sound and without delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolEntry {
    count: u8,
    bits: u8,
}

impl SymbolEntry {
    pub const EMPTY: SymbolEntry = SymbolEntry { count: 0, bits: 0 };

    /// Build an entry from a pattern such as `".-"`.
    ///
    /// Only used while building [`TABLE`], so bad patterns fail the build.
    const fn from_pattern(pattern: &str) -> Self {
        let bytes = pattern.as_bytes();
        assert!(bytes.len() <= MAX_SYMBOLS, "pattern longer than 8 symbols");

        let mut bits = 0u8;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'-' => bits |= 1 << i,
                b'.' => {}
                _ => panic!("pattern may only contain '.' and '-'"),
            }
            i += 1;
        }

        SymbolEntry {
            count: bytes.len() as u8,
            bits,
        }
    }

    pub fn count(&self) -> usize {
        self.count as usize
    }

    /// Raw element bits, first element in bit 0.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterate the elements in transmission order.
    pub fn symbols(&self) -> Symbols {
        Symbols {
            bits: self.bits,
            remaining: self.count,
        }
    }

    /// Dot/dash rendering, e.g. `".-"` for `A`.
    pub fn pattern(&self) -> String {
        self.symbols().map(Symbol::as_char).collect()
    }
}

/// Iterator over the elements of a [`SymbolEntry`].
#[derive(Debug, Clone)]
pub struct Symbols {
    bits: u8,
    remaining: u8,
}

impl Iterator for Symbols {
    type Item = Symbol;

    fn next(&mut self) -> Option<Symbol> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let symbol = if self.bits & 1 == 1 {
            Symbol::Dah
        } else {
            Symbol::Dit
        };
        self.bits >>= 1;
        Some(symbol)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Symbols {}

// Letters are listed upper case only; lower case is filled in by build_table.
const PATTERNS: &[(u8, &str)] = &[
    (b'A', ".-"),
    (b'B', "-..."),
    (b'C', "-.-."),
    (b'D', "-.."),
    (b'E', "."),
    (b'F', "..-."),
    (b'G', "--."),
    (b'H', "...."),
    (b'I', ".."),
    (b'J', ".---"),
    (b'K', "-.-"),
    (b'L', ".-.."),
    (b'M', "--"),
    (b'N', "-."),
    (b'O', "---"),
    (b'P', ".--."),
    (b'Q', "--.-"),
    (b'R', ".-."),
    (b'S', "..."),
    (b'T', "-"),
    (b'U', "..-"),
    (b'V', "...-"),
    (b'W', ".--"),
    (b'X', "-..-"),
    (b'Y', "-.--"),
    (b'Z', "--.."),
    (b'0', "-----"),
    (b'1', ".----"),
    (b'2', "..---"),
    (b'3', "...--"),
    (b'4', "....-"),
    (b'5', "....."),
    (b'6', "-...."),
    (b'7', "--..."),
    (b'8', "---.."),
    (b'9', "----."),
    (b'.', ".-.-.-"),
    (b',', "--..--"),
    (b'?', "..--.."),
    (b'/', "-..-."),
    (b'\'', ".----."),
    (b'!', "-.-.--"),
    (b'(', "-.--."),
    (b')', "-.--.-"),
    (b'&', ".-..."),
    (b':', "---..."),
    (b';', "-.-.-."),
    (b'=', "-...-"),
    (b'+', ".-.-."),
    (b'-', "-....-"),
    (b'_', "..--.-"),
    (b'"', ".-..-."),
    (b'$', "...-..-"),
    // Line breaks key as AA (new line)
    (b'\n', ".-.-"),
    (b'\r', ".-.-"),
];

const fn build_table() -> [SymbolEntry; 128] {
    let mut table = [SymbolEntry::EMPTY; 128];

    let mut i = 0;
    while i < PATTERNS.len() {
        let (ch, pattern) = PATTERNS[i];
        table[ch as usize] = SymbolEntry::from_pattern(pattern);
        i += 1;
    }

    let mut c = b'a';
    while c <= b'z' {
        table[c as usize] = table[c.to_ascii_uppercase() as usize];
        c += 1;
    }

    table
}

static TABLE: [SymbolEntry; 128] = build_table();

/// Look up the symbols for a character.
///
/// Letters are case-insensitive. Characters without a Morse code, including
/// anything outside ASCII, return [`SymbolEntry::EMPTY`].
pub fn lookup(ch: char) -> SymbolEntry {
    if ch.is_ascii() {
        TABLE[ch as usize]
    } else {
        SymbolEntry::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Symbol::{Dah, Dit};

    #[test]
    fn test_lookup_a() {
        let entry = lookup('A');
        assert_eq!(entry.count(), 2);
        assert_eq!(entry.symbols().collect::<Vec<_>>(), vec![Dit, Dah]);
    }

    #[test]
    fn test_lookup_s_and_zero() {
        assert_eq!(lookup('S').symbols().collect::<Vec<_>>(), vec![Dit, Dit, Dit]);

        let zero = lookup('0');
        assert_eq!(zero.count(), 5);
        assert!(zero.symbols().all(|s| s == Dah));
    }

    #[test]
    fn test_unmapped_is_empty() {
        assert!(lookup('@').is_empty());
        assert_eq!(lookup('@').count(), 0);
        assert!(lookup('#').is_empty());
        assert!(lookup(' ').is_empty());
        assert!(lookup('é').is_empty());
        assert!(lookup('\u{7f}').is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        for upper in 'A'..='Z' {
            let lower = upper.to_ascii_lowercase();
            assert_eq!(lookup(upper), lookup(lower), "mismatch for {}", upper);
            assert!(!lookup(upper).is_empty());
        }
    }

    #[test]
    fn test_digits_have_five_symbols() {
        for digit in '0'..='9' {
            assert_eq!(lookup(digit).count(), 5, "digit {}", digit);
        }
    }

    #[test]
    fn test_punctuation_patterns() {
        assert_eq!(lookup('.').pattern(), ".-.-.-");
        assert_eq!(lookup(',').pattern(), "--..--");
        assert_eq!(lookup('?').pattern(), "..--..");
        assert_eq!(lookup('/').pattern(), "-..-.");
        assert_eq!(lookup('$').count(), 7);
        assert_eq!(lookup('\n').pattern(), ".-.-");
    }

    #[test]
    fn test_bits_are_lsb_first() {
        // B is dah dit dit dit
        assert_eq!(lookup('B').bits(), 0b0001);
        // V is dit dit dit dah
        assert_eq!(lookup('V').bits(), 0b1000);
    }

    #[test]
    fn test_symbols_exact_size() {
        let symbols = lookup('Q').symbols();
        assert_eq!(symbols.len(), 4);
    }
}
