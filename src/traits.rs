//! Character classification and case folding.
//!
//! Every pass that needs to know what a character "is" goes through a
//! [`RegexTraits`] value: the peek analyzer folds leading characters with it,
//! the finders use it to recognize line terminators and to fold input, and
//! the backtracker compares characters through it. Keeping this behind one
//! trait means a compiled matcher never mixes two notions of case.

/// The traits capability consumed by the optimizer and the finders
pub trait RegexTraits {
    /// Fold a character for case-insensitive comparison
    fn translate_nocase(&self, ch: char) -> char;

    /// Whether `ch` ends a line
    fn is_line_terminator(&self, ch: char) -> bool;

    /// Whether `ch` is a word character for `\b` style assertions
    fn is_word(&self, ch: char) -> bool;

    /// The line terminator as a single ASCII byte, when exactly one character
    /// terminates lines. Finders use this to scan byte-addressed haystacks
    /// with `memchr`.
    fn line_terminator_byte(&self) -> Option<u8> {
        None
    }

    /// Compare two characters, folding both when `icase` is set
    fn chars_equal(&self, a: char, b: char, icase: bool) -> bool {
        a == b || (icase && self.translate_nocase(a) == self.translate_nocase(b))
    }

    /// Map a character onto the 256 slots of a peek bitmap
    fn hash(&self, ch: char) -> u8 {
        (ch as u32 & 0xFF) as u8
    }
}

/// Unicode simple case folding with a configurable line terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultTraits {
    line_terminator: u8,
    crlf: bool,
}

impl DefaultTraits {
    /// Traits that treat `\n` as the only line terminator
    pub fn new() -> Self {
        Self {
            line_terminator: b'\n',
            crlf: false,
        }
    }

    /// Use `byte` as the line terminator
    pub fn line_terminator(mut self, byte: u8) -> Self {
        self.line_terminator = byte;
        self
    }

    /// Treat both `\r` and `\n` as line terminators
    pub fn crlf(mut self, yes: bool) -> Self {
        self.crlf = yes;
        self
    }
}

impl Default for DefaultTraits {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexTraits for DefaultTraits {
    fn translate_nocase(&self, ch: char) -> char {
        if ch.is_ascii() {
            return ch.to_ascii_lowercase();
        }
        let mut lower = ch.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(folded), None) => folded,
            _ => ch,
        }
    }

    fn is_line_terminator(&self, ch: char) -> bool {
        if self.crlf {
            ch == '\n' || ch == '\r'
        } else {
            ch as u32 == self.line_terminator as u32
        }
    }

    fn is_word(&self, ch: char) -> bool {
        ch == '_' || ch.is_alphanumeric()
    }

    fn line_terminator_byte(&self) -> Option<u8> {
        if self.crlf || !self.line_terminator.is_ascii() {
            None
        } else {
            Some(self.line_terminator)
        }
    }
}
