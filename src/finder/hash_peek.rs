use super::CandidateFinder;
use crate::haystack::Haystack;
use crate::peek::PeekBitset;
use crate::traits::RegexTraits;
use std::ops::Range;

/// Scans forward for the first character whose slot is set in the peek
/// bitset.
#[derive(Debug, Clone)]
pub struct HashPeekFinder<T> {
    bitset: PeekBitset,
    traits: T,
}

impl<T: RegexTraits> HashPeekFinder<T> {
    pub fn new(bitset: PeekBitset, traits: T) -> Self {
        Self { bitset, traits }
    }

    pub fn bitset(&self) -> &PeekBitset {
        &self.bitset
    }
}

impl<T: RegexTraits> CandidateFinder for HashPeekFinder<T> {
    fn find<H: Haystack + ?Sized>(&self, hay: &H, span: Range<usize>) -> Option<usize> {
        let mut pos = span.start;
        while pos < span.end {
            let (ch, next) = hay.next_char(pos)?;
            if self.bitset.test(ch, &self.traits) {
                return Some(pos);
            }
            pos = next;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::all_candidates;
    use crate::traits::DefaultTraits;

    fn finder(chars: &[char], icase: bool) -> HashPeekFinder<DefaultTraits> {
        let traits = DefaultTraits::new();
        let mut bitset = PeekBitset::new();
        for &ch in chars {
            bitset.set_char(ch, icase, &traits);
        }
        HashPeekFinder::new(bitset, traits)
    }

    #[test]
    fn test_reports_each_member_once() {
        let finder = finder(&['a', 'c'], false);
        assert_eq!(all_candidates(&finder, "abcabc"), vec![0, 2, 3, 5]);
    }

    #[test]
    fn test_case_insensitive_bitset_folds_input() {
        let finder = finder(&['X'], true);
        assert_eq!(all_candidates(&finder, "axbXc"), vec![1, 3]);
    }

    #[test]
    fn test_empty_bitset_finds_nothing() {
        let finder = finder(&[], false);
        assert_eq!(finder.find("anything", 0..8), None);
        assert_eq!(finder.find("", 0..0), None);
    }

    #[test]
    fn test_multibyte_positions() {
        let finder = finder(&['é'], false);
        let hay = "aébé";
        assert_eq!(all_candidates(&finder, hay), vec![1, 4]);
    }
}
