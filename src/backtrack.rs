//! A small backtracking matcher over the expression graph.
//!
//! This is the full matcher that runs at every candidate a finder reports.
//! It tries alternatives in order and repetitions greedily (or lazily), the
//! way a Perl-style engine does, and reports the first match it finds at a
//! given start position.
//!
//! All pending work lives on the heap. What remains of the pattern after the
//! current node is a chain of continuation frames in an arena, and every
//! untried alternative is pushed onto an explicit backtrack stack along with
//! the capture writes that have to be undone when it is resumed. The length
//! of the input never turns into recursion depth.

use crate::graph::{Anchor, Graph, Node, NodeId};
use crate::haystack::Haystack;
use crate::traits::RegexTraits;

/// Capture spans, indexed by group number
pub type Captures = Vec<Option<(usize, usize)>>;

/// Index of a continuation frame
type ContId = usize;

/// The frame that ends a match; always the first in the arena
const DONE: ContId = 0;

// What remains to be matched after the current node.
#[derive(Debug, Clone, Copy)]
enum Cont {
    Done,
    /// Item `index` onward of the concatenation `concat`
    Seq { concat: NodeId, index: usize, next: ContId },
    /// One more iteration of the repetition `rep` has finished; `count`
    /// iterations are done and the last one started at `start`
    Iter {
        rep: NodeId,
        count: u32,
        start: usize,
        next: ContId,
    },
    /// The body of capture group `slot` has finished
    Close { slot: usize, start: usize, next: ContId },
}

#[derive(Debug, Clone, Copy)]
enum Job {
    /// Match `node` at `at`, then continue with `next`
    Run { node: NodeId, at: usize, next: ContId },
    Resume { at: usize, next: ContId },
    /// `count` iterations of `rep` are done; choose between another one and
    /// leaving the loop
    Repeat {
        rep: NodeId,
        count: u32,
        at: usize,
        next: ContId,
    },
    /// Start iteration `count + 1` of `rep`
    Iterate {
        rep: NodeId,
        count: u32,
        at: usize,
        next: ContId,
    },
}

enum Entry {
    /// An untried alternative. Continuation frames from index `conts` on were
    /// pushed after it and are dead once it resumes.
    Choice { job: Job, conts: usize },
    /// A capture value to put back when backtracking past this point
    Restore { slot: usize, span: Option<(usize, usize)> },
}

enum Step {
    Next(Job),
    Matched(usize),
    Fail,
}

/// Matches a linked graph against one haystack.
///
/// The continuation arena and the backtrack stack are kept between calls to
/// [`Backtracker::match_at`], so trying many candidates reuses their
/// allocations.
pub struct Backtracker<'a, H: ?Sized, T: ?Sized> {
    graph: &'a Graph,
    traits: &'a T,
    hay: &'a H,
    caps: Captures,
    conts: Vec<Cont>,
    stack: Vec<Entry>,
}

impl<'a, H, T> Backtracker<'a, H, T>
where
    H: Haystack + ?Sized,
    T: RegexTraits + ?Sized,
{
    pub fn new(graph: &'a Graph, traits: &'a T, hay: &'a H) -> Self {
        Self {
            graph,
            traits,
            hay,
            caps: vec![None; graph.capture_slots()],
            conts: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Try to match starting exactly at `at`. Returns the end of the match.
    pub fn match_at(&mut self, at: usize) -> Option<usize> {
        self.caps.iter_mut().for_each(|slot| *slot = None);
        self.conts.clear();
        self.conts.push(Cont::Done);
        self.stack.clear();

        let mut job = Job::Run {
            node: self.graph.root(),
            at,
            next: DONE,
        };
        loop {
            job = match self.step(job) {
                Step::Next(next) => next,
                Step::Matched(end) => return Some(end),
                Step::Fail => self.backtrack()?,
            };
        }
    }

    /// Capture spans of the last successful match
    pub fn captures(&self) -> &[Option<(usize, usize)>] {
        &self.caps
    }

    fn step(&mut self, job: Job) -> Step {
        match job {
            Job::Run { node, at, next } => self.run(node, at, next),
            Job::Resume { at, next } => self.resume(at, next),
            Job::Repeat { rep, count, at, next } => self.repeat(rep, count, at, next),
            Job::Iterate { rep, count, at, next } => self.iterate(rep, count, at, next),
        }
    }

    // Pops to the most recent untried alternative, undoing capture writes on
    // the way.
    fn backtrack(&mut self) -> Option<Job> {
        while let Some(entry) = self.stack.pop() {
            match entry {
                Entry::Choice { job, conts } => {
                    self.conts.truncate(conts);
                    return Some(job);
                }
                Entry::Restore { slot, span } => {
                    if let Some(cap) = self.caps.get_mut(slot) {
                        *cap = span;
                    }
                }
            }
        }
        None
    }

    fn run(&mut self, id: NodeId, at: usize, next: ContId) -> Step {
        let graph = self.graph;
        match graph.node(id) {
            Node::Empty => Step::Next(Job::Resume { at, next }),
            Node::Literal(lit) => {
                let mut pos = at;
                for &want in &lit.chars {
                    match self.hay.next_char(pos) {
                        Some((ch, after)) if self.traits.chars_equal(ch, want, lit.icase) => pos = after,
                        _ => return Step::Fail,
                    }
                }
                Step::Next(Job::Resume { at: pos, next })
            }
            Node::Class(class) => match self.hay.next_char(at) {
                Some((ch, after)) if class.contains(ch) => Step::Next(Job::Resume { at: after, next }),
                _ => Step::Fail,
            },
            Node::Assert(anchor) => {
                if self.is_at(*anchor, at) {
                    Step::Next(Job::Resume { at, next })
                } else {
                    Step::Fail
                }
            }
            Node::Concat(_) => {
                let next = self.push_cont(Cont::Seq {
                    concat: id,
                    index: 0,
                    next,
                });
                Step::Next(Job::Resume { at, next })
            }
            Node::Alternate(branches) => match branches.split_first() {
                None => Step::Fail,
                Some((&first, rest)) => {
                    // Pushed last-first so that they pop in order.
                    for &branch in rest.iter().rev() {
                        self.push_choice(Job::Run { node: branch, at, next });
                    }
                    Step::Next(Job::Run { node: first, at, next })
                }
            },
            Node::Repeat(_) => Step::Next(Job::Repeat {
                rep: id,
                count: 0,
                at,
                next,
            }),
            Node::Group(group) => {
                let next = self.push_cont(Cont::Close {
                    slot: group.index as usize,
                    start: at,
                    next,
                });
                Step::Next(Job::Run {
                    node: group.sub,
                    at,
                    next,
                })
            }
            Node::BackRef(backref) => {
                let span = backref.group.and_then(|group| match graph.node(group) {
                    Node::Group(group) => self.caps.get(group.index as usize).copied().flatten(),
                    _ => None,
                });
                // A group that took no part in the match yet matches empty.
                let (mut src, src_end) = match span {
                    Some(span) => span,
                    None => return Step::Next(Job::Resume { at, next }),
                };
                let mut pos = at;
                while src < src_end {
                    let (want, src_after) = match self.hay.next_char(src) {
                        Some(found) => found,
                        None => return Step::Fail,
                    };
                    match self.hay.next_char(pos) {
                        Some((ch, after)) if self.traits.chars_equal(ch, want, backref.icase) => pos = after,
                        _ => return Step::Fail,
                    }
                    src = src_after;
                }
                Step::Next(Job::Resume { at: pos, next })
            }
        }
    }

    fn resume(&mut self, at: usize, next: ContId) -> Step {
        let cont = match self.conts.get(next) {
            Some(&cont) => cont,
            None => return Step::Fail,
        };
        match cont {
            Cont::Done => Step::Matched(at),
            Cont::Seq { concat, index, next } => {
                let graph = self.graph;
                let items = match graph.node(concat) {
                    Node::Concat(items) => items,
                    _ => return Step::Fail,
                };
                match items.get(index) {
                    None => Step::Next(Job::Resume { at, next }),
                    Some(&item) => {
                        let rest = if index + 1 < items.len() {
                            self.push_cont(Cont::Seq {
                                concat,
                                index: index + 1,
                                next,
                            })
                        } else {
                            next
                        };
                        Step::Next(Job::Run {
                            node: item,
                            at,
                            next: rest,
                        })
                    }
                }
            }
            Cont::Iter { rep, count, start, next } => {
                let min = match self.graph.node(rep) {
                    Node::Repeat(rep) => rep.min,
                    _ => return Step::Fail,
                };
                // An empty iteration past the minimum would loop forever.
                if at == start && count > min {
                    return Step::Fail;
                }
                Step::Next(Job::Repeat { rep, count, at, next })
            }
            Cont::Close { slot, start, next } => {
                self.set_capture(slot, Some((start, at)));
                Step::Next(Job::Resume { at, next })
            }
        }
    }

    fn repeat(&mut self, id: NodeId, count: u32, at: usize, next: ContId) -> Step {
        let graph = self.graph;
        let rep = match graph.node(id) {
            Node::Repeat(rep) => rep,
            _ => return Step::Fail,
        };
        let more = rep.max.map_or(true, |max| count < max);
        let done = count >= rep.min;
        let iterate = Job::Iterate {
            rep: id,
            count,
            at,
            next,
        };
        let leave = Job::Resume { at, next };
        match (more, done) {
            (false, false) => Step::Fail,
            (true, false) => Step::Next(iterate),
            (false, true) => Step::Next(leave),
            (true, true) if rep.greedy => {
                self.push_choice(leave);
                Step::Next(iterate)
            }
            (true, true) => {
                self.push_choice(iterate);
                Step::Next(leave)
            }
        }
    }

    fn iterate(&mut self, id: NodeId, count: u32, at: usize, next: ContId) -> Step {
        let graph = self.graph;
        let rep = match graph.node(id) {
            Node::Repeat(rep) => rep,
            _ => return Step::Fail,
        };
        // Each iteration starts with the repeated group unset.
        let slot = rep.group.and_then(|group| match graph.node(group) {
            Node::Group(group) => Some(group.index as usize),
            _ => None,
        });
        if let Some(slot) = slot {
            self.set_capture(slot, None);
        }

        let next = self.push_cont(Cont::Iter {
            rep: id,
            count: count.saturating_add(1),
            start: at,
            next,
        });
        Step::Next(Job::Run {
            node: rep.sub,
            at,
            next,
        })
    }

    fn push_cont(&mut self, cont: Cont) -> ContId {
        self.conts.push(cont);
        self.conts.len() - 1
    }

    fn push_choice(&mut self, job: Job) {
        let conts = self.conts.len();
        self.stack.push(Entry::Choice { job, conts });
    }

    // Writes a capture and records the old value for backtracking.
    fn set_capture(&mut self, slot: usize, span: Option<(usize, usize)>) {
        if let Some(cap) = self.caps.get_mut(slot) {
            if *cap != span {
                let old = std::mem::replace(cap, span);
                self.stack.push(Entry::Restore { slot, span: old });
            }
        }
    }

    fn is_at(&self, anchor: Anchor, at: usize) -> bool {
        let prev = self.hay.prev_char(at);
        let next = self.hay.next_char(at).map(|(ch, _)| ch);
        let word_before = prev.map_or(false, |ch| self.traits.is_word(ch));
        let word_after = next.map_or(false, |ch| self.traits.is_word(ch));
        match anchor {
            Anchor::StartText => prev.is_none(),
            Anchor::EndText => next.is_none(),
            Anchor::StartLine => prev.map_or(true, |ch| self.traits.is_line_terminator(ch)),
            Anchor::EndLine => next.map_or(true, |ch| self.traits.is_line_terminator(ch)),
            Anchor::WordBoundary => word_before != word_after,
            Anchor::NotWordBoundary => word_before == word_after,
            Anchor::WordStart => !word_before && word_after,
            Anchor::WordEnd => word_before && !word_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CharClass, GroupRef};
    use crate::linker::Linker;
    use crate::traits::DefaultTraits;

    fn match_at(graph: &Graph, hay: &str, at: usize) -> Option<usize> {
        let traits = DefaultTraits::new();
        Backtracker::new(graph, &traits, hay).match_at(at)
    }

    #[test]
    fn test_alternation_is_ordered() {
        let mut graph = Graph::new();
        let short = graph.literal("a");
        let long = graph.literal("ab");
        let root = graph.alternate(vec![short, long]);
        graph.set_root(root);
        assert_eq!(match_at(&graph, "ab", 0), Some(1));
    }

    #[test]
    fn test_greedy_and_lazy_repetition() {
        let mut graph = Graph::new();
        let a = graph.class(CharClass::single('a'));
        let greedy = graph.repeat_with(a, 1, None, true);
        graph.set_root(greedy);
        assert_eq!(match_at(&graph, "aaab", 0), Some(3));

        let lazy = graph.repeat_with(a, 1, None, false);
        graph.set_root(lazy);
        assert_eq!(match_at(&graph, "aaab", 0), Some(1));
    }

    #[test]
    fn test_backtracks_into_repetition() {
        let mut graph = Graph::new();
        let any = graph.class(CharClass::any());
        let star = graph.repeat(any, 0, None);
        let tail = graph.literal("b");
        let root = graph.concat(vec![star, tail]);
        graph.set_root(root);
        assert_eq!(match_at(&graph, "abab", 0), Some(4));
        assert_eq!(match_at(&graph, "aaa", 0), None);
    }

    #[test]
    fn test_nullable_body_terminates() {
        let mut graph = Graph::new();
        let empty = graph.empty();
        let star = graph.repeat(empty, 0, None);
        graph.set_root(star);
        assert_eq!(match_at(&graph, "x", 0), Some(0));
    }

    #[test]
    fn test_backref_and_unset_group() {
        let mut graph = Graph::new();
        let word = graph.class(CharClass::new(vec![('a', 'z')]));
        let plus = graph.repeat(word, 1, None);
        let group = graph.group(1, None, plus);
        let dash = graph.literal("-");
        let backref = graph.backref(GroupRef::Index(1), false);
        let root = graph.concat(vec![group, dash, backref]);
        graph.set_root(root);
        Linker::new().link(&mut graph).unwrap();

        assert_eq!(match_at(&graph, "abc-abc", 0), Some(7));
        assert_eq!(match_at(&graph, "abc-abd", 0), None);

        let mut graph = Graph::new();
        let x = graph.literal("x");
        let group = graph.group(1, None, x);
        let y = graph.literal("y");
        let alt = graph.alternate(vec![group, y]);
        let backref = graph.backref(GroupRef::Index(1), false);
        let root = graph.concat(vec![alt, backref]);
        graph.set_root(root);
        Linker::new().link(&mut graph).unwrap();
        assert_eq!(match_at(&graph, "yz", 0), Some(1));
    }

    #[test]
    fn test_quantified_group_resets_each_iteration() {
        // (a|\1b)+ on "ab": in the second iteration \1 is unset again, so it
        // matches empty and "b" is consumed.
        let mut graph = Graph::new();
        let a = graph.literal("a");
        let backref = graph.backref(GroupRef::Index(1), false);
        let b = graph.literal("b");
        let again = graph.concat(vec![backref, b]);
        let alt = graph.alternate(vec![a, again]);
        let group = graph.group(1, None, alt);
        let plus = graph.repeat(group, 1, None);
        graph.set_root(plus);
        Linker::new().link(&mut graph).unwrap();

        let traits = DefaultTraits::new();
        let mut bt = Backtracker::new(&graph, &traits, "ab");
        assert_eq!(bt.match_at(0), Some(2));
        assert_eq!(bt.captures()[1], Some((1, 2)));
    }

    #[test]
    fn test_anchors() {
        let traits = DefaultTraits::new();
        let mut graph = Graph::new();
        let start = graph.assert(Anchor::StartLine);
        let x = graph.literal("x");
        let root = graph.concat(vec![start, x]);
        graph.set_root(root);
        let hay = "ax\nx";
        let mut bt = Backtracker::new(&graph, &traits, hay);
        assert_eq!(bt.match_at(1), None);
        assert_eq!(bt.match_at(3), Some(4));

        let mut graph = Graph::new();
        let boundary = graph.assert(Anchor::WordBoundary);
        let x = graph.literal("x");
        let root = graph.concat(vec![boundary, x]);
        graph.set_root(root);
        let mut bt = Backtracker::new(&graph, &traits, "ax x");
        assert_eq!(bt.match_at(1), None);
        assert_eq!(bt.match_at(3), Some(4));
    }

    #[test]
    fn test_case_insensitive_literal_on_chars() {
        let traits = DefaultTraits::new();
        let mut graph = Graph::new();
        let lit = graph.literal_nocase("Cat");
        graph.set_root(lit);
        let hay: Vec<char> = "cAT".chars().collect();
        assert_eq!(Backtracker::new(&graph, &traits, &hay[..]).match_at(0), Some(3));
    }

    #[test]
    fn test_long_input_uses_heap_stack() {
        let traits = DefaultTraits::new();
        let mut graph = Graph::new();
        let a = graph.literal("a");
        let star = graph.repeat(a, 0, None);
        let b = graph.literal("b");
        let root = graph.concat(vec![star, b]);
        graph.set_root(root);

        let mut hay = "a".repeat(1 << 20);
        let mut bt = Backtracker::new(&graph, &traits, hay.as_str());
        assert_eq!(bt.match_at(0), None);
        hay.push('b');
        let mut bt = Backtracker::new(&graph, &traits, hay.as_str());
        assert_eq!(bt.match_at(0), Some(hay.len()));
        // Reusing the backtracker starts from a clean state.
        assert_eq!(bt.match_at(hay.len() - 1), Some(hay.len()));
    }

    #[test]
    fn test_long_quantified_group_keeps_last_iteration() {
        let traits = DefaultTraits::new();
        let mut graph = Graph::new();
        let ab = graph.literal("ab");
        let group = graph.group(1, None, ab);
        let plus = graph.repeat(group, 1, None);
        graph.set_root(plus);
        Linker::new().link(&mut graph).unwrap();

        let hay = "ab".repeat(1 << 18);
        let mut bt = Backtracker::new(&graph, &traits, hay.as_str());
        assert_eq!(bt.match_at(0), Some(hay.len()));
        assert_eq!(bt.captures()[1], Some((hay.len() - 2, hay.len())));
    }
}
