use super::CandidateFinder;
use crate::haystack::Haystack;
use crate::traits::RegexTraits;
use std::ops::Range;

/// Reports the start of the haystack and every position right after a line
/// terminator.
#[derive(Debug, Clone)]
pub struct LineStartFinder<T> {
    traits: T,
}

impl<T: RegexTraits> LineStartFinder<T> {
    pub fn new(traits: T) -> Self {
        Self { traits }
    }
}

impl<T: RegexTraits> CandidateFinder for LineStartFinder<T> {
    fn find<H: Haystack + ?Sized>(&self, hay: &H, span: Range<usize>) -> Option<usize> {
        let Range { start, end } = span;
        if start > end {
            return None;
        }
        match hay.prev_char(start) {
            None => return Some(start),
            Some(prev) if self.traits.is_line_terminator(prev) => return Some(start),
            Some(_) => {}
        }

        if let Some(byte) = self.traits.line_terminator_byte() {
            return hay.find_ascii(byte, start, end).map(|pos| pos + 1);
        }

        let mut pos = start;
        while pos < end {
            let (ch, next) = hay.next_char(pos)?;
            if self.traits.is_line_terminator(ch) {
                return Some(next);
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

    #[test]
    fn test_line_starts_in_str() {
        let finder = LineStartFinder::new(DefaultTraits::new());
        assert_eq!(all_candidates(&finder, "ab\ncd\n\nx"), vec![0, 3, 6, 7]);
    }

    #[test]
    fn test_trailing_terminator_yields_end() {
        let finder = LineStartFinder::new(DefaultTraits::new());
        assert_eq!(all_candidates(&finder, "ab\n"), vec![0, 3]);
    }

    #[test]
    fn test_resume_mid_line() {
        let finder = LineStartFinder::new(DefaultTraits::new());
        let hay = "ab\ncd";
        assert_eq!(finder.find(hay, 1..hay.len()), Some(3));
        assert_eq!(finder.find(hay, 3..hay.len()), Some(3));
        assert_eq!(finder.find(hay, 4..hay.len()), None);
    }

    #[test]
    fn test_crlf_terminators_on_chars() {
        let finder = LineStartFinder::new(DefaultTraits::new().crlf(true));
        let chars: Vec<char> = "a\r\nb\rc".chars().collect();
        assert_eq!(all_candidates(&finder, &chars[..]), vec![0, 2, 3, 5]);
    }

    #[test]
    fn test_custom_terminator_on_bytes() {
        let finder = LineStartFinder::new(DefaultTraits::new().line_terminator(b'\0'));
        assert_eq!(all_candidates(&finder, &b"ab\0c\n"[..]), vec![0, 3]);
    }
}
