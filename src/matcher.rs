use crate::backtrack::Backtracker;
use crate::config::Builder;
use crate::finder::{CandidateFinder, Finder, FinderKind, NullFinder};
use crate::graph::Graph;
use crate::haystack::Haystack;
use crate::optimize::compile_graph;
use crate::peek::PeekResult;
use crate::traits::{DefaultTraits, RegexTraits};
use crate::CompileResult;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::Arc;

/// A compiled pattern: the linked expression graph plus the finder chosen
/// for haystacks of type `H`.
///
/// A compiled matcher is immutable. Clones share the graph, and any number
/// of searches may run against one matcher at the same time.
pub struct CompiledMatcher<H: ?Sized, T = DefaultTraits> {
    graph: Arc<Graph>,
    finder: Option<Finder<T>>,
    peek: PeekResult,
    traits: T,
    _haystack: PhantomData<fn(&H)>,
}

/// A successful match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
}

impl Match {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl<H: Haystack + ?Sized> CompiledMatcher<H> {
    /// Compile `pattern` with the default configuration
    pub fn new(pattern: &str) -> CompileResult<Self> {
        Builder::new().build(pattern)
    }
}

impl<H, T> CompiledMatcher<H, T>
where
    H: Haystack + ?Sized,
    T: RegexTraits + Clone,
{
    /// Compile an expression graph built by hand
    pub fn from_graph(graph: Graph, traits: T) -> CompileResult<Self> {
        compile_graph(graph, traits, true)
    }

    pub(crate) fn from_parts(graph: Graph, finder: Option<Finder<T>>, peek: PeekResult, traits: T) -> Self {
        Self {
            graph: Arc::new(graph),
            finder,
            peek,
            traits,
            _haystack: PhantomData,
        }
    }

    /// The next position in `span.start..=span.end` where a match could
    /// start. Without a finder this is `span.start` itself.
    pub fn next_candidate(&self, hay: &H, span: Range<usize>) -> Option<usize> {
        match &self.finder {
            Some(finder) => finder.find(hay, span),
            None => NullFinder.find(hay, span),
        }
    }

    /// Find the first match starting at or after `start`
    pub fn find_at(&self, hay: &H, start: usize) -> Option<Match> {
        let end = hay.end();
        let mut backtracker = Backtracker::new(&self.graph, &self.traits, hay);
        let mut at = start;
        while let Some(pos) = self.next_candidate(hay, at..end) {
            if let Some(match_end) = backtracker.match_at(pos) {
                return Some(Match {
                    start: pos,
                    end: match_end,
                });
            }
            at = hay.next_char(pos)?.1;
        }
        None
    }

    /// Find the first match in the input
    pub fn find(&self, hay: &H) -> Option<Match> {
        self.find_at(hay, 0)
    }

    /// Check if the pattern matches anywhere in the input
    pub fn is_match(&self, hay: &H) -> bool {
        self.find(hay).is_some()
    }

    /// Iterate over successive non-overlapping matches. After an empty match
    /// the search resumes one character further.
    pub fn find_iter<'m, 'h>(&'m self, hay: &'h H) -> Matches<'m, 'h, H, T> {
        Matches {
            matcher: self,
            hay,
            offset: Some(0),
        }
    }

    /// Find all matches in the input
    pub fn find_all(&self, hay: &H) -> Vec<Match> {
        self.find_iter(hay).collect()
    }

    pub fn finder(&self) -> Option<&Finder<T>> {
        self.finder.as_ref()
    }

    pub fn finder_kind(&self) -> FinderKind {
        self.finder.as_ref().map_or(FinderKind::Null, Finder::kind)
    }

    pub fn peek(&self) -> &PeekResult {
        &self.peek
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn traits(&self) -> &T {
        &self.traits
    }
}

impl<H: ?Sized, T: Clone> Clone for CompiledMatcher<H, T> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            finder: self.finder.clone(),
            peek: self.peek.clone(),
            traits: self.traits.clone(),
            _haystack: PhantomData,
        }
    }
}

impl<H: ?Sized, T: fmt::Debug> fmt::Debug for CompiledMatcher<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledMatcher")
            .field("nodes", &self.graph.len())
            .field("finder", &self.finder)
            .field("peek", &self.peek)
            .finish()
    }
}

/// Iterator over the matches of a [`CompiledMatcher`]
pub struct Matches<'m, 'h, H: ?Sized, T> {
    matcher: &'m CompiledMatcher<H, T>,
    hay: &'h H,
    offset: Option<usize>,
}

impl<'m, 'h, H, T> Iterator for Matches<'m, 'h, H, T>
where
    H: Haystack + ?Sized,
    T: RegexTraits + Clone,
{
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        let start = self.offset?;
        let found = self.matcher.find_at(self.hay, start);
        self.offset = match found {
            Some(m) if m.is_empty() => self.hay.next_char(m.end).map(|(_, next)| next),
            Some(m) => Some(m.end),
            None => None,
        };
        found
    }
}
