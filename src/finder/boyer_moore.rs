use crate::haystack::RandomAccess;
use crate::peek::LiteralPrefix;
use crate::traits::RegexTraits;
use std::fmt;
use std::ops::Range;

/// Boyer-Moore search for a literal prefix, using the bad-character rule.
///
/// The pattern is aligned against the haystack and compared right to left.
/// On a mismatch the alignment moves so that the last occurrence of the
/// mismatching input character in the pattern lines up with it, and always
/// by at least one position. Case-insensitive literals are stored folded and
/// each compared input character is folded on the fly.
///
/// The comparison window is addressed as `start + k`, so the search only
/// accepts [`RandomAccess`] haystacks. A `str`, whose positions are byte
/// offsets, is rejected at compile time:
///
/// ```compile_fail
/// use regex_prefilter::finder::BoyerMooreFinder;
/// use regex_prefilter::{DefaultTraits, LiteralPrefix};
///
/// let finder = BoyerMooreFinder::new(&LiteralPrefix::new(vec!['a'], false), DefaultTraits::new());
/// finder.find("a", 0..1);
/// ```
#[derive(Clone)]
pub struct BoyerMooreFinder<T> {
    pattern: Vec<char>,
    icase: bool,
    /// Last index in `pattern` of a character hashing to each slot, or -1
    last: [isize; 256],
    traits: T,
}

impl<T: RegexTraits> BoyerMooreFinder<T> {
    pub fn new(literal: &LiteralPrefix, traits: T) -> Self {
        let icase = literal.icase();
        let pattern: Vec<char> = literal
            .chars()
            .iter()
            .map(|&ch| if icase { traits.translate_nocase(ch) } else { ch })
            .collect();

        let mut last = [-1; 256];
        for (i, &ch) in pattern.iter().enumerate() {
            last[traits.hash(ch) as usize] = i as isize;
        }

        Self {
            pattern,
            icase,
            last,
            traits,
        }
    }

    /// The literal being searched for, folded when case-insensitive
    pub fn pattern(&self) -> &[char] {
        &self.pattern
    }

    pub fn icase(&self) -> bool {
        self.icase
    }

    fn normalize(&self, ch: char) -> char {
        if self.icase {
            self.traits.translate_nocase(ch)
        } else {
            ch
        }
    }

    /// Return the first alignment in `span` at which the whole literal
    /// occurs, or `None` when there is none
    pub fn find<R: RandomAccess + ?Sized>(&self, hay: &R, span: Range<usize>) -> Option<usize> {
        let len = self.pattern.len();
        if len == 0 {
            return if span.start <= span.end { Some(span.start) } else { None };
        }

        let mut start = span.start;
        'align: while start.checked_add(len)? <= span.end {
            let mut j = len;
            while j > 0 {
                let (ch, _) = hay.next_char(start + j - 1)?;
                let ch = self.normalize(ch);
                if ch != self.pattern[j - 1] {
                    let shift = (j - 1) as isize - self.last[self.traits.hash(ch) as usize];
                    start += shift.max(1) as usize;
                    continue 'align;
                }
                j -= 1;
            }
            return Some(start);
        }
        None
    }
}

impl<T> fmt::Debug for BoyerMooreFinder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pattern: String = self.pattern.iter().collect();
        f.debug_struct("BoyerMooreFinder")
            .field("pattern", &pattern)
            .field("icase", &self.icase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DefaultTraits;

    fn finder(text: &str, icase: bool) -> BoyerMooreFinder<DefaultTraits> {
        BoyerMooreFinder::new(&LiteralPrefix::new(text.chars().collect(), icase), DefaultTraits::new())
    }

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    fn all_candidates(finder: &BoyerMooreFinder<DefaultTraits>, hay: &[char]) -> Vec<usize> {
        let mut found = Vec::new();
        let mut at = 0;
        while let Some(pos) = finder.find(hay, at..hay.len()) {
            found.push(pos);
            at = pos + 1;
        }
        found
    }

    #[test]
    fn test_finds_needle() {
        let hay = chars("haystack needle here");
        assert_eq!(finder("needle", false).find(&hay[..], 0..hay.len()), Some(9));
    }

    #[test]
    fn test_reports_overlapping_occurrences() {
        let hay = chars("aaaa");
        assert_eq!(all_candidates(&finder("aa", false), &hay[..]), vec![0, 1, 2]);
    }

    #[test]
    fn test_case_insensitive_search() {
        let hay = chars("xxNeEdLe needle");
        let finder = finder("NEEDLE", true);
        assert_eq!(finder.pattern(), &chars("needle")[..]);
        assert_eq!(all_candidates(&finder, &hay[..]), vec![2, 9]);
    }

    #[test]
    fn test_short_remainder_is_none() {
        let hay = chars("abcab");
        let finder = finder("abc", false);
        assert_eq!(finder.find(&hay[..], 1..hay.len()), None);
        assert_eq!(finder.find(&hay[..], 0..2), None);
        assert_eq!(finder.find(&hay[..], 0..3), Some(0));
    }

    #[test]
    fn test_search_bytes() {
        let finder = finder("lo w", false);
        assert_eq!(finder.find(&b"hello world"[..], 0..11), Some(3));
    }

    #[test]
    fn test_hash_collisions_stay_sound() {
        // U+0161 shares a bitmap slot with 'a'.
        let hay = chars("\u{161}ab\u{161}ba");
        assert_eq!(all_candidates(&finder("ba", false), &hay[..]), vec![4]);
        assert_eq!(all_candidates(&finder("\u{161}b", false), &hay[..]), vec![3]);
    }
}
