//! Finder selection and the compile pipeline that feeds it.
//!
//! [`compile_graph`] turns an expression graph into a [`CompiledMatcher`]:
//! it links the graph, peeks at its leading position and picks the finder
//! with [`select_finder`]. The selection only depends on the peek result and
//! on the traversal capability of the haystack type, which is a constant of
//! that type, so the decision is made once per pattern.

use crate::finder::{BoyerMooreFinder, Finder, HashPeekFinder, LineStartFinder};
use crate::graph::Graph;
use crate::haystack::{Haystack, Traversal};
use crate::linker::Linker;
use crate::matcher::CompiledMatcher;
use crate::peek::{PeekBitset, PeekResult, Peeker};
use crate::traits::RegexTraits;
use crate::CompileResult;

/// Pick the finder for a peek result. The first applicable rule wins:
///
/// 1. random access and a literal prefix: Boyer-Moore on the literal,
/// 2. matches must start a line: line-start scan,
/// 3. some character can never start a match: bitmap scan,
/// 4. otherwise no finder, every position is tried.
pub fn select_finder<T: RegexTraits + Clone>(
    peek: &PeekResult,
    traversal: Traversal,
    traits: &T,
) -> Option<Finder<T>> {
    if traversal.is_random_access() {
        if let Some(literal) = peek.literal() {
            return Some(Finder::BoyerMoore(BoyerMooreFinder::new(literal, traits.clone())));
        }
    }
    if peek.line_start() {
        return Some(Finder::LineStart(LineStartFinder::new(traits.clone())));
    }
    if peek.bitset().count() < PeekBitset::SIZE {
        return Some(Finder::HashPeek(HashPeekFinder::new(peek.bitset().clone(), traits.clone())));
    }
    None
}

/// Link `graph`, analyze it and attach a finder suited to haystacks of type
/// `H`. With `optimize` off the finder is left out and every position is
/// tried; the graph is still linked.
pub fn compile_graph<H, T>(mut graph: Graph, traits: T, optimize: bool) -> CompileResult<CompiledMatcher<H, T>>
where
    H: Haystack + ?Sized,
    T: RegexTraits + Clone,
{
    Linker::new().link(&mut graph)?;

    let peek = Peeker::new(&traits).peek(&graph);
    let finder = if optimize {
        select_finder(&peek, H::TRAVERSAL, &traits)
    } else {
        None
    };
    debug!("selected finder: {:?}", finder);

    Ok(CompiledMatcher::from_parts(graph, finder, peek, traits))
}
