/// Ordered glyph ramp, darkest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gradient {
    chars: Vec<char>,
}

impl Gradient {
    /// Returns `None` for an empty ramp; callers surface that as a configuration error.
    pub fn new(chars: impl AsRef<str>) -> Option<Self> {
        let chars: Vec<char> = chars.as_ref().chars().collect();
        if chars.is_empty() {
            return None;
        }
        Some(Self { chars })
    }

    /// The 16 step ramp from space to `@`.
    pub fn standard() -> Self {
        Self { chars: DEFAULT_RAMP.chars().collect() }
    }

    pub fn blocks() -> Self {
        Self { chars: " ░▒▓█".chars().collect() }
    }

    pub fn detailed() -> Self {
        Self {
            chars: " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$"
                .chars()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Ramp index for a weighted luma in `[0, LUMA_SCALE]`, truncating toward the darker glyph.
    ///
    /// Integer math keeps pure white on the last glyph instead of one step short.
    pub fn index_for_luma(&self, luma: u32) -> usize {
        let levels = (self.chars.len() - 1) as u64;
        let luma = u64::from(luma.min(LUMA_SCALE));
        ((luma * levels) / u64::from(LUMA_SCALE)) as usize
    }

    pub fn char_at(&self, index: usize) -> char {
        self.chars[index.min(self.chars.len() - 1)]
    }

    /// Glyphs drawn for unsettled cells: the ramp plus `extra`, deduplicated, whitespace removed.
    pub fn scramble_alphabet(&self, extra: &str) -> Vec<char> {
        let mut alphabet: Vec<char> = Vec::with_capacity(self.chars.len() + extra.len());
        for ch in self.chars.iter().copied().chain(extra.chars()) {
            if ch.is_whitespace() || alphabet.contains(&ch) {
                continue;
            }
            alphabet.push(ch);
        }

        if alphabet.is_empty() {
            alphabet.push('#');
        }
        alphabet
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Self::standard()
    }
}

/// Full scale of `299 R + 587 G + 114 B`.
pub const LUMA_SCALE: u32 = 255_000;

pub const DEFAULT_RAMP: &str = " .,-~:;=!*#$%&8@";

pub const DEFAULT_SCRAMBLE_EXTRA: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?/~";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_ramp_has_sixteen_steps() {
        let gradient = Gradient::standard();
        assert_eq!(gradient.len(), 16);
        assert_eq!(gradient.char_at(0), ' ');
        assert_eq!(gradient.char_at(15), '@');
    }

    #[test]
    fn empty_ramp_is_rejected() {
        assert!(Gradient::new("").is_none());
    }

    #[test]
    fn index_truncates() {
        let gradient = Gradient::standard();
        assert_eq!(gradient.index_for_luma(0), 0);
        assert_eq!(gradient.index_for_luma(LUMA_SCALE), 15);
        // 0.5 * 15 = 7.5
        assert_eq!(gradient.index_for_luma(LUMA_SCALE / 2), 7);
        assert_eq!(gradient.index_for_luma(u32::MAX), 15);
    }

    #[test]
    fn single_glyph_ramp_always_maps_to_it() {
        let gradient = Gradient::new("#").unwrap();
        assert_eq!(gradient.index_for_luma(0), 0);
        assert_eq!(gradient.index_for_luma(LUMA_SCALE), 0);
    }

    #[test]
    fn scramble_alphabet_skips_whitespace_and_duplicates() {
        let gradient = Gradient::standard();
        let alphabet = gradient.scramble_alphabet(DEFAULT_SCRAMBLE_EXTRA);
        assert!(!alphabet.contains(&' '));
        for (i, ch) in alphabet.iter().enumerate() {
            assert!(!alphabet[i + 1..].contains(ch), "duplicate {ch:?}");
        }
        assert!(alphabet.contains(&'@'));
        assert!(alphabet.contains(&'?'));
    }

    #[test]
    fn scramble_alphabet_never_empty() {
        let gradient = Gradient::new("   ").unwrap();
        assert_eq!(gradient.scramble_alphabet(""), vec!['#']);
    }
}
