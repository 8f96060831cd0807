//! Static analysis of the leading position of a pattern.
//!
//! The [`Peeker`] walks the expression graph without consuming input and
//! summarizes what a match can start with:
//!
//! * a [`PeekBitset`] of the characters that may appear first,
//! * whether every match must begin at the start of a line,
//! * the literal every match begins with, when there is exactly one.
//!
//! The summary is conservative. A character missing from the bitset can
//! never start a match, but a character in the bitset may still fail to.

use crate::graph::{CharClass, Graph, Node, NodeId, Repeat};
use crate::traits::RegexTraits;
use std::fmt;

/// Longest literal prefix produced by expanding a fixed repetition
const MAX_REPEATED_LITERAL: usize = 256;

/// A 256-slot bitmap of characters that may start a match.
///
/// Characters are mapped onto slots with [`RegexTraits::hash`], so distinct
/// characters may share a slot. The bitmap is either case-sensitive or holds
/// case-folded entries; adding an entry of the other kind gives up and marks
/// every slot.
#[derive(Clone, PartialEq, Eq)]
pub struct PeekBitset {
    icase: bool,
    bits: [u64; 4],
}

impl PeekBitset {
    /// Number of slots, the size of the alphabet as far as pruning goes
    pub const SIZE: usize = 256;

    /// Create an empty, case-sensitive bitset
    pub fn new() -> Self {
        Self {
            icase: false,
            bits: [0; 4],
        }
    }

    /// Number of slots set
    pub fn count(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Whether every slot is set, i.e. the bitset rules nothing out
    pub fn is_full(&self) -> bool {
        self.count() == Self::SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Whether entries are stored case-folded
    pub fn icase(&self) -> bool {
        self.icase
    }

    pub fn set_all(&mut self) {
        self.icase = false;
        self.bits = [!0; 4];
    }

    /// Add `ch`, folded first when `icase` is set
    pub fn set_char<T: RegexTraits + ?Sized>(&mut self, ch: char, icase: bool, traits: &T) {
        if self.prepare_for(icase) {
            let ch = if icase { traits.translate_nocase(ch) } else { ch };
            self.insert(traits.hash(ch));
        }
    }

    /// Add every character of a case-sensitive class
    pub fn set_class<T: RegexTraits + ?Sized>(&mut self, class: &CharClass, traits: &T) {
        if class.is_empty() || !self.prepare_for(false) {
            return;
        }
        for &(start, end) in class.ranges() {
            if end as u32 - start as u32 >= Self::SIZE as u32 {
                self.bits = [!0; 4];
                return;
            }
            for code in start as u32..=end as u32 {
                if let Some(ch) = char::from_u32(code) {
                    self.insert(traits.hash(ch));
                }
            }
        }
    }

    /// Union `other` into this bitset
    pub fn set_bitset(&mut self, other: &PeekBitset) {
        if other.is_empty() {
            return;
        }
        if self.prepare_for(other.icase) {
            for (word, theirs) in self.bits.iter_mut().zip(other.bits.iter()) {
                *word |= theirs;
            }
        }
    }

    /// Whether `ch` may start a match
    pub fn test<T: RegexTraits + ?Sized>(&self, ch: char, traits: &T) -> bool {
        let ch = if self.icase { traits.translate_nocase(ch) } else { ch };
        self.contains_slot(traits.hash(ch))
    }

    pub fn contains_slot(&self, slot: u8) -> bool {
        self.bits[slot as usize / 64] & (1 << (slot % 64)) != 0
    }

    /// The slots that are set, in ascending order
    pub fn slots(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |&slot| self.contains_slot(slot))
    }

    fn insert(&mut self, slot: u8) {
        self.bits[slot as usize / 64] |= 1 << (slot % 64);
    }

    // Switches to case mode `icase` ahead of an insert and reports whether
    // the insert should go ahead. An empty bitset adopts the mode, a full one
    // has nothing left to learn, and a non-empty one of the other mode fills
    // every slot.
    fn prepare_for(&mut self, icase: bool) -> bool {
        let count = self.count();
        if count == Self::SIZE {
            return false;
        }
        if count != 0 && self.icase != icase {
            self.set_all();
            return false;
        }
        self.icase = icase;
        true
    }
}

impl Default for PeekBitset {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PeekBitset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("PeekBitset");
        dbg.field("icase", &self.icase).field("count", &self.count());
        if !self.is_full() {
            let chars: Vec<char> = self.slots().map(char::from).collect();
            dbg.field("slots", &chars);
        }
        dbg.finish()
    }
}

/// A fixed literal that every match begins with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralPrefix {
    chars: Vec<char>,
    icase: bool,
}

impl LiteralPrefix {
    pub fn new(chars: Vec<char>, icase: bool) -> Self {
        Self { chars, icase }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Whether the literal is compared case-insensitively
    pub fn icase(&self) -> bool {
        self.icase
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn repeated(&self, count: usize) -> Self {
        Self {
            chars: self.chars.repeat(count),
            icase: self.icase,
        }
    }
}

impl fmt::Display for LiteralPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self.chars.iter().collect();
        if self.icase {
            write!(f, "(?i){:?}", text)
        } else {
            write!(f, "{:?}", text)
        }
    }
}

/// What the peeker learned about the leading position of a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeekResult {
    bitset: PeekBitset,
    line_start: bool,
    literal: Option<LiteralPrefix>,
}

impl PeekResult {
    /// Assemble a peek result. A literal is only kept when it is non-empty
    /// and the bitset holds exactly the one slot of its first character.
    pub fn new(bitset: PeekBitset, line_start: bool, literal: Option<LiteralPrefix>) -> Self {
        let literal = literal.filter(|lit| {
            let consistent = !lit.is_empty() && bitset.count() == 1;
            if !consistent {
                debug!("dropping literal {} inconsistent with {:?}", lit, bitset);
            }
            consistent
        });
        Self {
            bitset,
            line_start,
            literal,
        }
    }

    /// The characters that may start a match
    pub fn bitset(&self) -> &PeekBitset {
        &self.bitset
    }

    /// Whether every match must begin at the start of a line
    pub fn line_start(&self) -> bool {
        self.line_start
    }

    /// The literal every match begins with, if there is exactly one
    pub fn literal(&self) -> Option<&LiteralPrefix> {
        self.literal.as_ref()
    }
}

/// Leading-position summary of one sub-expression
#[derive(Debug, Clone)]
struct Leading {
    bitset: PeekBitset,
    /// May match without consuming input
    nullable: bool,
    /// Never consumes input
    zero_width: bool,
    /// Every match of this sub-expression begins at a line start
    line_start: bool,
    literal: Option<LiteralPrefix>,
    /// The sub-expression matches exactly `literal` and nothing else, so a
    /// literal that follows it may be appended
    exact: bool,
}

impl Leading {
    fn empty() -> Self {
        Self {
            bitset: PeekBitset::new(),
            nullable: true,
            zero_width: true,
            line_start: false,
            literal: None,
            exact: false,
        }
    }

    fn never() -> Self {
        Self {
            nullable: false,
            zero_width: false,
            ..Self::empty()
        }
    }

    fn unknown() -> Self {
        let mut bitset = PeekBitset::new();
        bitset.set_all();
        Self {
            bitset,
            zero_width: false,
            ..Self::empty()
        }
    }

    fn literal(bitset: PeekBitset, prefix: LiteralPrefix) -> Self {
        Self {
            bitset,
            nullable: false,
            zero_width: false,
            line_start: false,
            literal: Some(prefix),
            exact: true,
        }
    }
}

/// Computes the [`PeekResult`] of an expression graph
pub struct Peeker<'t, T: ?Sized> {
    traits: &'t T,
}

impl<'t, T: RegexTraits + ?Sized> Peeker<'t, T> {
    pub fn new(traits: &'t T) -> Self {
        Self { traits }
    }

    /// Peek at the leading position of the pattern rooted at `graph.root()`
    pub fn peek(&self, graph: &Graph) -> PeekResult {
        let lead = self.leading(graph, graph.root());
        let mut bitset = lead.bitset;
        let mut literal = lead.literal;

        // An empty match can happen anywhere, so no character rules a
        // position out.
        if lead.nullable {
            bitset.set_all();
            literal = None;
        }

        let result = PeekResult::new(bitset, lead.line_start, literal);
        debug!("peek result: {:?}", result);
        result
    }

    fn leading(&self, graph: &Graph, id: NodeId) -> Leading {
        match graph.node(id) {
            Node::Empty => Leading::empty(),
            Node::Literal(lit) => match lit.chars.first() {
                None => Leading::empty(),
                Some(&first) => {
                    let mut bitset = PeekBitset::new();
                    bitset.set_char(first, lit.icase, self.traits);
                    Leading::literal(bitset, LiteralPrefix::new(lit.chars.clone(), lit.icase))
                }
            },
            Node::Class(class) => {
                let mut bitset = PeekBitset::new();
                bitset.set_class(class, self.traits);
                match class.single_char() {
                    Some(ch) => Leading::literal(bitset, LiteralPrefix::new(vec![ch], false)),
                    None => Leading {
                        bitset,
                        ..Leading::never()
                    },
                }
            }
            Node::Assert(anchor) => Leading {
                line_start: anchor.implies_line_start(),
                ..Leading::empty()
            },
            Node::Concat(items) => self.concat(graph, items),
            Node::Alternate(branches) => self.alternate(graph, branches),
            Node::Repeat(rep) => self.repeat(graph, rep),
            Node::Group(group) => self.leading(graph, group.sub),
            Node::BackRef(_) => Leading::unknown(),
        }
    }

    fn concat(&self, graph: &Graph, items: &[NodeId]) -> Leading {
        let parts: Vec<Leading> = items.iter().map(|&item| self.leading(graph, item)).collect();

        let mut lead = Leading::empty();
        for part in &parts {
            lead.bitset.set_bitset(&part.bitset);
            if !part.nullable {
                break;
            }
        }
        lead.nullable = parts.iter().all(|part| part.nullable);
        lead.zero_width = parts.iter().all(|part| part.zero_width);
        lead.line_start = parts.iter().enumerate().any(|(i, part)| {
            part.line_start && parts[..i].iter().all(|before| before.zero_width)
        });

        let (literal, exact) = concat_literal(&parts);
        lead.literal = literal;
        lead.exact = exact;
        lead
    }

    fn alternate(&self, graph: &Graph, branches: &[NodeId]) -> Leading {
        let parts: Vec<Leading> = branches.iter().map(|&branch| self.leading(graph, branch)).collect();
        let first = match parts.first() {
            Some(first) => first,
            None => return Leading::never(),
        };

        let mut lead = Leading {
            bitset: PeekBitset::new(),
            nullable: false,
            zero_width: true,
            line_start: true,
            literal: None,
            exact: false,
        };
        for part in &parts {
            lead.bitset.set_bitset(&part.bitset);
            lead.nullable |= part.nullable;
            lead.zero_width &= part.zero_width;
            lead.line_start &= part.line_start;
        }

        // Every branch has to agree on one literal, otherwise two different
        // leading strings are possible.
        if first.literal.is_some() && parts.iter().all(|part| part.literal == first.literal) {
            lead.literal = first.literal.clone();
            lead.exact = parts.iter().all(|part| part.exact);
        } else if parts.iter().any(|part| part.literal.is_some()) {
            trace!("alternation of {} branches abandons literal tracking", parts.len());
        }
        lead
    }

    fn repeat(&self, graph: &Graph, rep: &Repeat) -> Leading {
        if rep.max == Some(0) {
            return Leading::empty();
        }
        let sub = self.leading(graph, rep.sub);
        if rep.min == 0 {
            return Leading {
                bitset: sub.bitset,
                nullable: true,
                zero_width: sub.zero_width,
                line_start: false,
                literal: None,
                exact: false,
            };
        }

        let fixed = rep.max == Some(rep.min);
        let (literal, exact) = match sub.literal {
            Some(lit) if sub.exact && fixed && lit.len() * rep.min as usize <= MAX_REPEATED_LITERAL => {
                (Some(lit.repeated(rep.min as usize)), true)
            }
            other => (other, false),
        };
        Leading {
            literal,
            exact,
            ..sub
        }
    }
}

/// The literal a concatenation begins with: the literal of its first
/// consuming element, extended by the literals of the elements after it for
/// as long as each element matches exactly its literal. Zero-width elements
/// consume nothing and are skipped. Also reports whether the whole
/// concatenation is covered by the literal.
fn concat_literal(parts: &[Leading]) -> (Option<LiteralPrefix>, bool) {
    let mut consuming = parts.iter().filter(|part| !part.zero_width);
    let first = match consuming.next() {
        Some(first) if !first.nullable => first,
        _ => return (None, false),
    };
    let mut prefix = match &first.literal {
        Some(lit) => lit.clone(),
        None => return (None, false),
    };

    let mut open = first.exact;
    while open {
        let next = match consuming.next() {
            Some(next) => next,
            None => return (Some(prefix), true),
        };
        match &next.literal {
            Some(lit) if lit.icase == prefix.icase => {
                prefix.chars.extend_from_slice(&lit.chars);
                open = next.exact;
            }
            _ => break,
        }
    }
    (Some(prefix), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Anchor, GroupRef};
    use crate::traits::DefaultTraits;

    fn peek(graph: &Graph) -> PeekResult {
        Peeker::new(&DefaultTraits::new()).peek(graph)
    }

    fn slots(result: &PeekResult) -> Vec<char> {
        result.bitset().slots().map(char::from).collect()
    }

    fn literal_text(result: &PeekResult) -> Option<String> {
        result.literal().map(|lit| lit.chars().iter().collect())
    }

    #[test]
    fn test_class_sets_exact_bits() {
        let mut graph = Graph::new();
        let class = graph.class(CharClass::new([('a', 'c')]));
        graph.set_root(class);

        let result = peek(&graph);
        assert_eq!(slots(&result), vec!['a', 'b', 'c']);
        assert_eq!(result.literal(), None);
        assert!(!result.line_start());
    }

    #[test]
    fn test_concat_literal() {
        let mut graph = Graph::new();
        let c = graph.literal("c");
        let a = graph.literal("a");
        let t = graph.literal("t");
        let root = graph.concat(vec![c, a, t]);
        graph.set_root(root);

        let result = peek(&graph);
        assert_eq!(literal_text(&result).as_deref(), Some("cat"));
        assert_eq!(slots(&result), vec!['c']);
    }

    #[test]
    fn test_divergent_alternation_drops_literal() {
        let mut graph = Graph::new();
        let cat = graph.literal("cat");
        let dog = graph.literal("dog");
        let root = graph.alternate(vec![cat, dog]);
        graph.set_root(root);

        let result = peek(&graph);
        assert_eq!(result.literal(), None);
        assert_eq!(slots(&result), vec!['c', 'd']);
    }

    #[test]
    fn test_agreeing_alternation_keeps_literal() {
        let mut graph = Graph::new();
        let left = graph.literal("cat");
        let right = graph.literal("cat");
        let alt = graph.alternate(vec![left, right]);
        let tail = graph.literal("s");
        let root = graph.concat(vec![alt, tail]);
        graph.set_root(root);

        assert_eq!(literal_text(&peek(&graph)).as_deref(), Some("cats"));
    }

    #[test]
    fn test_line_start_then_literal() {
        let mut graph = Graph::new();
        let bol = graph.assert(Anchor::StartLine);
        let abc = graph.literal("abc");
        let root = graph.concat(vec![bol, abc]);
        graph.set_root(root);

        let result = peek(&graph);
        assert!(result.line_start());
        assert_eq!(literal_text(&result).as_deref(), Some("abc"));
    }

    #[test]
    fn test_line_start_needs_every_branch() {
        let mut graph = Graph::new();
        let bol = graph.assert(Anchor::StartLine);
        let a = graph.literal("a");
        let anchored = graph.concat(vec![bol, a]);
        let b = graph.literal("b");
        let root = graph.alternate(vec![anchored, b]);
        graph.set_root(root);

        let result = peek(&graph);
        assert!(!result.line_start());
        assert_eq!(slots(&result), vec!['a', 'b']);
    }

    #[test]
    fn test_line_start_after_consuming_element_is_ignored() {
        let mut graph = Graph::new();
        let nl = graph.literal("\n");
        let opt = graph.repeat(nl, 0, Some(1));
        let bol = graph.assert(Anchor::StartLine);
        let b = graph.literal("b");
        let root = graph.concat(vec![opt, bol, b]);
        graph.set_root(root);

        let result = peek(&graph);
        assert!(!result.line_start());
        assert_eq!(slots(&result), vec!['\n', 'b']);
    }

    #[test]
    fn test_optional_prefix_unions_with_follower() {
        let mut graph = Graph::new();
        let x = graph.literal("x");
        let opt = graph.repeat(x, 0, Some(1));
        let abc = graph.literal("abc");
        let root = graph.concat(vec![opt, abc]);
        graph.set_root(root);

        let result = peek(&graph);
        assert_eq!(slots(&result), vec!['a', 'x']);
        assert_eq!(result.literal(), None);
    }

    #[test]
    fn test_nullable_pattern_prunes_nothing() {
        let mut graph = Graph::new();
        let a = graph.literal("a");
        let star = graph.repeat(a, 0, None);
        graph.set_root(star);

        let result = peek(&graph);
        assert!(result.bitset().is_full());
        assert_eq!(result.literal(), None);
    }

    #[test]
    fn test_case_insensitive_literal_has_one_folded_slot() {
        let mut graph = Graph::new();
        let lit = graph.literal_nocase("Cat");
        graph.set_root(lit);

        let result = peek(&graph);
        assert!(result.bitset().icase());
        assert_eq!(slots(&result), vec!['c']);
        let literal = result.literal().unwrap();
        assert!(literal.icase());
        assert!(result.bitset().test('C', &DefaultTraits::new()));
        assert!(result.bitset().test('c', &DefaultTraits::new()));
    }

    #[test]
    fn test_mixed_case_modes_fill_the_bitset() {
        let mut graph = Graph::new();
        let upper = graph.literal_nocase("a");
        let lower = graph.literal("b");
        let root = graph.alternate(vec![upper, lower]);
        graph.set_root(root);

        let result = peek(&graph);
        assert!(result.bitset().is_full());
        assert_eq!(result.literal(), None);
    }

    #[test]
    fn test_assertions_are_transparent_to_literals() {
        let mut graph = Graph::new();
        let wb = graph.assert(Anchor::WordBoundary);
        let cat = graph.literal("cat");
        let root = graph.concat(vec![wb, cat]);
        graph.set_root(root);

        assert_eq!(literal_text(&peek(&graph)).as_deref(), Some("cat"));
    }

    #[test]
    fn test_fixed_repetition_expands_literal() {
        let mut graph = Graph::new();
        let ab = graph.literal("ab");
        let rep = graph.repeat(ab, 2, Some(2));
        let c = graph.literal("c");
        let root = graph.concat(vec![rep, c]);
        graph.set_root(root);

        assert_eq!(literal_text(&peek(&graph)).as_deref(), Some("ababc"));
    }

    #[test]
    fn test_open_repetition_keeps_only_body_literal() {
        let mut graph = Graph::new();
        let ab = graph.literal("ab");
        let rep = graph.repeat(ab, 1, None);
        let c = graph.literal("c");
        let root = graph.concat(vec![rep, c]);
        graph.set_root(root);

        assert_eq!(literal_text(&peek(&graph)).as_deref(), Some("ab"));
    }

    #[test]
    fn test_never_matching_pattern_has_empty_bitset() {
        let mut graph = Graph::new();
        let class = graph.class(CharClass::any().negated());
        graph.set_root(class);

        let result = peek(&graph);
        assert!(result.bitset().is_empty());
        assert_eq!(result.literal(), None);
    }

    #[test]
    fn test_backref_prunes_nothing() {
        let mut graph = Graph::new();
        let a = graph.literal("a");
        let group = graph.group(1, None, a);
        let backref = graph.backref(GroupRef::Index(1), false);
        let root = graph.alternate(vec![backref, group]);
        graph.set_root(root);

        assert!(peek(&graph).bitset().is_full());
    }

    #[test]
    fn test_wide_class_fills_bitset() {
        let mut graph = Graph::new();
        let class = graph.class(CharClass::new([('\u{100}', '\u{2FF}')]));
        graph.set_root(class);

        assert!(peek(&graph).bitset().is_full());
    }

    #[test]
    fn test_case_mode_switch_before_insert() {
        let traits = DefaultTraits::new();
        let mut bitset = PeekBitset::new();
        bitset.set_char('Q', true, &traits);
        assert!(bitset.icase());
        assert_eq!(bitset.slots().map(char::from).collect::<Vec<_>>(), vec!['q']);

        // A case-sensitive entry can't join case-folded ones.
        bitset.set_char('z', false, &traits);
        assert!(bitset.is_full());
        assert!(!bitset.icase());

        // Once full, inserts of either mode leave it alone.
        bitset.set_char('z', true, &traits);
        assert!(bitset.is_full());
        assert!(!bitset.icase());

        // Merging into an empty bitset adopts the other side's mode.
        let mut folded = PeekBitset::new();
        folded.set_char('a', true, &traits);
        let mut merged = PeekBitset::new();
        merged.set_bitset(&folded);
        assert!(merged.icase());
        assert_eq!(merged, folded);
    }

    #[test]
    fn test_inconsistent_literal_is_dropped() {
        let mut bitset = PeekBitset::new();
        let traits = DefaultTraits::new();
        bitset.set_char('a', false, &traits);
        bitset.set_char('b', false, &traits);
        let result = PeekResult::new(bitset, false, Some(LiteralPrefix::new(vec!['a'], false)));
        assert_eq!(result.literal(), None);
    }
}
