use std::fmt;

/// A node ID in the expression graph
pub type NodeId = usize;

/// A zero-width assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Start of the haystack
    StartText,
    /// End of the haystack
    EndText,
    /// Start of the haystack or just after a line terminator
    StartLine,
    /// End of the haystack or just before a line terminator
    EndLine,
    /// Between a word and a non-word character
    WordBoundary,
    /// Not between a word and a non-word character
    NotWordBoundary,
    /// Followed by a word character and not preceded by one
    WordStart,
    /// Preceded by a word character and not followed by one
    WordEnd,
}

impl Anchor {
    /// Whether every position satisfying this assertion is a line start
    pub fn implies_line_start(self) -> bool {
        matches!(self, Anchor::StartText | Anchor::StartLine)
    }
}

/// A set of characters stored as sorted, non-overlapping, non-adjacent
/// inclusive ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    ranges: Vec<(char, char)>,
}

impl CharClass {
    /// Create a class from arbitrary ranges, normalizing them
    pub fn new<I: IntoIterator<Item = (char, char)>>(ranges: I) -> Self {
        let mut ranges: Vec<(char, char)> = ranges
            .into_iter()
            .map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
            .collect();
        ranges.sort_unstable();

        let mut merged: Vec<(char, char)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            if let Some(last) = merged.last_mut() {
                if start as u32 <= last.1 as u32 + 1 {
                    if end > last.1 {
                        last.1 = end;
                    }
                    continue;
                }
            }
            merged.push((start, end));
        }
        CharClass { ranges: merged }
    }

    /// A class holding exactly one character
    pub fn single(ch: char) -> Self {
        CharClass { ranges: vec![(ch, ch)] }
    }

    /// A class holding every character
    pub fn any() -> Self {
        CharClass { ranges: vec![('\0', char::MAX)] }
    }

    /// The complement of this class
    pub fn negated(&self) -> Self {
        let mut ranges = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = 0u32;
        for &(start, end) in &self.ranges {
            if (start as u32) > next {
                push_scalar_range(&mut ranges, next, start as u32 - 1);
            }
            next = end as u32 + 1;
        }
        if next <= char::MAX as u32 {
            push_scalar_range(&mut ranges, next, char::MAX as u32);
        }
        CharClass { ranges }
    }

    /// The normalized ranges of this class
    pub fn ranges(&self) -> &[(char, char)] {
        &self.ranges
    }

    pub fn contains(&self, ch: char) -> bool {
        self.ranges
            .binary_search_by(|&(start, end)| {
                if end < ch {
                    std::cmp::Ordering::Less
                } else if start > ch {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The only character of this class, if it holds exactly one
    pub fn single_char(&self) -> Option<char> {
        match self.ranges.as_slice() {
            [(start, end)] if start == end => Some(*start),
            _ => None,
        }
    }
}

// Adds `start..=end` while stepping over the surrogate gap, which holds no
// `char` values.
fn push_scalar_range(ranges: &mut Vec<(char, char)>, start: u32, end: u32) {
    const GAP_START: u32 = 0xD800;
    const GAP_END: u32 = 0xDFFF;
    let pieces = [
        (start, end.min(GAP_START - 1)),
        (start.max(GAP_END + 1), end),
    ];
    for (lo, hi) in pieces {
        if lo > hi {
            continue;
        }
        if let (Some(lo), Some(hi)) = (char::from_u32(lo), char::from_u32(hi)) {
            ranges.push((lo, hi));
        }
    }
}

/// How a back-reference or quantified group names its capture group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupRef {
    Index(u32),
    Name(String),
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupRef::Index(index) => write!(f, "#{}", index),
            GroupRef::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// A literal character sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub chars: Vec<char>,
    /// Compare characters after case folding
    pub icase: bool,
}

/// A bounded or unbounded repetition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repeat {
    pub sub: NodeId,
    pub min: u32,
    /// `None` means unbounded
    pub max: Option<u32>,
    pub greedy: bool,
    /// The capture group the repeated body defines, as named by the front end
    pub capture: Option<GroupRef>,
    /// The group node `capture` resolves to, filled in by the linker
    pub group: Option<NodeId>,
}

/// A capture group definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub index: u32,
    pub name: Option<String>,
    pub sub: NodeId,
}

/// A back-reference to a capture group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackRef {
    pub target: GroupRef,
    pub icase: bool,
    /// The group node `target` resolves to, filled in by the linker
    pub group: Option<NodeId>,
}

/// A node of the expression graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Matches the empty string
    Empty,
    Literal(Literal),
    Class(CharClass),
    Assert(Anchor),
    Concat(Vec<NodeId>),
    /// Ordered choice; an alternation with no branches never matches
    Alternate(Vec<NodeId>),
    Repeat(Repeat),
    Group(Group),
    BackRef(BackRef),
}

impl Node {
    /// The IDs of the nodes this node owns, in match order
    pub fn children(&self) -> &[NodeId] {
        match self {
            Node::Concat(items) | Node::Alternate(items) => items,
            Node::Repeat(rep) => std::slice::from_ref(&rep.sub),
            Node::Group(group) => std::slice::from_ref(&group.sub),
            Node::Empty | Node::Literal(_) | Node::Class(_) | Node::Assert(_) | Node::BackRef(_) => &[],
        }
    }
}

/// An expression graph: nodes live in an arena and refer to each other by
/// [`NodeId`]. Ownership edges form a tree below `root`; the links stored in
/// [`Repeat::group`] and [`BackRef::group`] are non-owning cross references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    /// All nodes in the graph
    nodes: Vec<Node>,
    /// Root node
    root: NodeId,
}

impl Graph {
    /// Create an empty graph whose root matches the empty string
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Empty],
            root: 0,
        }
    }

    /// Add a new node and return its ID
    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn empty(&mut self) -> NodeId {
        self.add(Node::Empty)
    }

    /// Create a case-sensitive literal node
    pub fn literal(&mut self, text: &str) -> NodeId {
        self.add(Node::Literal(Literal {
            chars: text.chars().collect(),
            icase: false,
        }))
    }

    /// Create a case-insensitive literal node
    pub fn literal_nocase(&mut self, text: &str) -> NodeId {
        self.add(Node::Literal(Literal {
            chars: text.chars().collect(),
            icase: true,
        }))
    }

    pub fn class(&mut self, class: CharClass) -> NodeId {
        self.add(Node::Class(class))
    }

    pub fn assert(&mut self, anchor: Anchor) -> NodeId {
        self.add(Node::Assert(anchor))
    }

    pub fn concat(&mut self, items: Vec<NodeId>) -> NodeId {
        self.add(Node::Concat(items))
    }

    pub fn alternate(&mut self, branches: Vec<NodeId>) -> NodeId {
        self.add(Node::Alternate(branches))
    }

    /// Create a greedy repetition of `sub`
    pub fn repeat(&mut self, sub: NodeId, min: u32, max: Option<u32>) -> NodeId {
        self.repeat_with(sub, min, max, true)
    }

    /// Create a repetition of `sub`. When `sub` is a capture group the
    /// repetition records which group it quantifies.
    pub fn repeat_with(&mut self, sub: NodeId, min: u32, max: Option<u32>, greedy: bool) -> NodeId {
        let capture = match self.node(sub) {
            Node::Group(group) => Some(GroupRef::Index(group.index)),
            _ => None,
        };
        self.add(Node::Repeat(Repeat {
            sub,
            min,
            max,
            greedy,
            capture,
            group: None,
        }))
    }

    pub fn group(&mut self, index: u32, name: Option<&str>, sub: NodeId) -> NodeId {
        self.add(Node::Group(Group {
            index,
            name: name.map(str::to_string),
            sub,
        }))
    }

    pub fn backref(&mut self, target: GroupRef, icase: bool) -> NodeId {
        self.add(Node::BackRef(BackRef {
            target,
            icase,
            group: None,
        }))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    /// Number of nodes in the arena, reachable or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node IDs reachable from the root through ownership edges, in
    /// depth-first pre-order
    pub fn reachable(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            if id >= self.nodes.len() || seen[id] {
                continue;
            }
            seen[id] = true;
            order.push(id);
            for &child in self.nodes[id].children().iter().rev() {
                stack.push(child);
            }
        }

        order
    }

    /// Number of capture slots needed to match this graph: one past the
    /// largest group index in use
    pub fn capture_slots(&self) -> usize {
        self.reachable()
            .into_iter()
            .filter_map(|id| match &self.nodes[id] {
                Node::Group(group) => Some(group.index as usize + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
