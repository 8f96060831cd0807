//! Candidate finders.
//!
//! A finder reports the next position at which a match could start. It may
//! report positions where the full matcher then fails, but it never skips a
//! position where a match starts. Finders keep no scan cursor: the caller
//! passes the span to search on every call, so one finder can serve any
//! number of searches at once.

mod boyer_moore;
mod hash_peek;
mod line_start;

pub use self::boyer_moore::BoyerMooreFinder;
pub use self::hash_peek::HashPeekFinder;
pub use self::line_start::LineStartFinder;

use crate::haystack::{Haystack, Indexed};
use crate::traits::RegexTraits;
use std::fmt;
use std::ops::Range;

/// The contract shared by all finder strategies
pub trait CandidateFinder {
    /// Return the first position in `span.start..=span.end` at which a match
    /// could start, or `None` when there is none
    fn find<H: Haystack + ?Sized>(&self, hay: &H, span: Range<usize>) -> Option<usize>;
}

/// Tries every position: the start of the span is always a candidate
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFinder;

impl CandidateFinder for NullFinder {
    fn find<H: Haystack + ?Sized>(&self, _hay: &H, span: Range<usize>) -> Option<usize> {
        if span.start <= span.end {
            Some(span.start)
        } else {
            None
        }
    }
}

/// Which strategy a compiled matcher uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinderKind {
    Null,
    LineStart,
    HashPeek,
    BoyerMoore,
}

impl fmt::Display for FinderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FinderKind::Null => "null",
            FinderKind::LineStart => "line-start",
            FinderKind::HashPeek => "hash-peek",
            FinderKind::BoyerMoore => "boyer-moore",
        };
        f.write_str(name)
    }
}

/// The finder selected for a compiled pattern. The null strategy is
/// represented by the absence of a `Finder`.
#[derive(Debug, Clone)]
pub enum Finder<T> {
    LineStart(LineStartFinder<T>),
    HashPeek(HashPeekFinder<T>),
    BoyerMoore(BoyerMooreFinder<T>),
}

impl<T> Finder<T> {
    pub fn kind(&self) -> FinderKind {
        match self {
            Finder::LineStart(_) => FinderKind::LineStart,
            Finder::HashPeek(_) => FinderKind::HashPeek,
            Finder::BoyerMoore(_) => FinderKind::BoyerMoore,
        }
    }
}

impl<T: RegexTraits> CandidateFinder for Finder<T> {
    fn find<H: Haystack + ?Sized>(&self, hay: &H, span: Range<usize>) -> Option<usize> {
        match self {
            Finder::LineStart(finder) => finder.find(hay, span),
            Finder::HashPeek(finder) => finder.find(hay, span),
            // Boyer-Moore needs position arithmetic; anything else is searched
            // position by position.
            Finder::BoyerMoore(finder) => match hay.indexed() {
                Some(Indexed::Chars(chars)) => finder.find(chars, span),
                Some(Indexed::Bytes(bytes)) => finder.find(bytes, span),
                None => NullFinder.find(hay, span),
            },
        }
    }
}

/// Collects every candidate a finder reports on `hay`, resuming one position
/// past each hit.
#[cfg(test)]
pub(crate) fn all_candidates<F: CandidateFinder, H: Haystack + ?Sized>(finder: &F, hay: &H) -> Vec<usize> {
    let mut found = Vec::new();
    let mut at = 0;
    while let Some(pos) = finder.find(hay, at..hay.end()) {
        found.push(pos);
        at = match hay.next_char(pos) {
            Some((_, next)) => next,
            None => break,
        };
    }
    found
}
