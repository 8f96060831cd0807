//! Input sequences and their traversal capability.
//!
//! A [`Haystack`] exposes characters at positions. Positions are whatever the
//! haystack uses natively: byte offsets for `str`, element indices for
//! `[char]` and `[u8]`. The associated [`Haystack::TRAVERSAL`] constant tells
//! the optimizer, at pattern compile time, whether positions can be jumped
//! between in constant time. Types that have it also implement the
//! [`RandomAccess`] marker, which is what position-arithmetic searches such
//! as Boyer-Moore require.

/// Whether an input sequence supports constant-time random access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Every character occupies exactly one position, so `pos + k` is the
    /// `k`-th character after `pos`
    RandomAccess,
    /// Characters have varying widths and can only be stepped over one at a
    /// time, forwards or backwards
    Bidirectional,
}

impl Traversal {
    pub fn is_random_access(self) -> bool {
        self == Traversal::RandomAccess
    }
}

/// A sequence of characters the finders and the matcher can scan
pub trait Haystack {
    /// The traversal capability of this sequence type
    const TRAVERSAL: Traversal;

    /// One past the last valid position
    fn end(&self) -> usize;

    /// The character starting at `at` and the position after it
    fn next_char(&self, at: usize) -> Option<(char, usize)>;

    /// The character ending at `at`
    fn prev_char(&self, at: usize) -> Option<char>;

    /// Find the first position in `at..end` holding the ASCII byte `byte`
    fn find_ascii(&self, byte: u8, at: usize, end: usize) -> Option<usize> {
        let mut pos = at;
        while pos < end {
            let (ch, next) = self.next_char(pos)?;
            if ch as u32 == byte as u32 {
                return Some(pos);
            }
            pos = next;
        }
        None
    }

    /// The underlying slice, for sequences that are random access
    fn indexed(&self) -> Option<Indexed<'_>> {
        None
    }
}

/// Marker for sequences where `pos + k` is always the `k`-th character after
/// `pos`
pub trait RandomAccess: Haystack {}

impl RandomAccess for [char] {}

impl RandomAccess for [u8] {}

/// A random-access haystack recovered from a generic one
#[derive(Debug, Clone, Copy)]
pub enum Indexed<'h> {
    Chars(&'h [char]),
    Bytes(&'h [u8]),
}

impl Haystack for str {
    const TRAVERSAL: Traversal = Traversal::Bidirectional;

    fn end(&self) -> usize {
        self.len()
    }

    fn next_char(&self, at: usize) -> Option<(char, usize)> {
        let ch = self.get(at..)?.chars().next()?;
        Some((ch, at + ch.len_utf8()))
    }

    fn prev_char(&self, at: usize) -> Option<char> {
        self.get(..at)?.chars().next_back()
    }

    fn find_ascii(&self, byte: u8, at: usize, end: usize) -> Option<usize> {
        debug_assert!(byte.is_ascii());
        find_byte(self.as_bytes(), byte, at, end)
    }
}

impl Haystack for [char] {
    const TRAVERSAL: Traversal = Traversal::RandomAccess;

    fn end(&self) -> usize {
        self.len()
    }

    fn next_char(&self, at: usize) -> Option<(char, usize)> {
        self.get(at).map(|&ch| (ch, at + 1))
    }

    fn prev_char(&self, at: usize) -> Option<char> {
        at.checked_sub(1).and_then(|prev| self.get(prev)).copied()
    }

    fn indexed(&self) -> Option<Indexed<'_>> {
        Some(Indexed::Chars(self))
    }
}

/// Bytes are read as Latin-1: each byte is the character with the same code
/// point.
impl Haystack for [u8] {
    const TRAVERSAL: Traversal = Traversal::RandomAccess;

    fn end(&self) -> usize {
        self.len()
    }

    fn next_char(&self, at: usize) -> Option<(char, usize)> {
        self.get(at).map(|&b| (char::from(b), at + 1))
    }

    fn prev_char(&self, at: usize) -> Option<char> {
        at.checked_sub(1)
            .and_then(|prev| self.get(prev))
            .map(|&b| char::from(b))
    }

    fn find_ascii(&self, byte: u8, at: usize, end: usize) -> Option<usize> {
        find_byte(self, byte, at, end)
    }

    fn indexed(&self) -> Option<Indexed<'_>> {
        Some(Indexed::Bytes(self))
    }
}

#[cfg(feature = "perf-literal")]
fn find_byte(bytes: &[u8], byte: u8, at: usize, end: usize) -> Option<usize> {
    let window = bytes.get(at..end.min(bytes.len()))?;
    memchr::memchr(byte, window).map(|offset| at + offset)
}

#[cfg(not(feature = "perf-literal"))]
fn find_byte(bytes: &[u8], byte: u8, at: usize, end: usize) -> Option<usize> {
    let window = bytes.get(at..end.min(bytes.len()))?;
    window.iter().position(|&b| b == byte).map(|offset| at + offset)
}
