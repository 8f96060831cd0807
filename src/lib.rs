//! Compile-time optimization pipeline for a backtracking regex engine.
//!
//! A pattern is parsed by `regex-syntax`, lowered into an arena-backed
//! expression [`Graph`], and then run through three passes:
//!
//! 1. the [`linker`] resolves back-references and quantified capture groups
//!    to the group nodes they name,
//! 2. the [`peek`] analyzer computes what the leading position of a match can
//!    look like (a hashed character bitmap, a line-start flag and possibly a
//!    fixed literal prefix),
//! 3. the [`optimize`] pass picks a [`Finder`] from that summary.
//!
//! The result is a [`CompiledMatcher`]: the linked graph plus an optional
//! finder that reports candidate start positions much faster than trying the
//! full matcher at every offset.
//!
//! ```
//! use regex_prefilter::{CompiledMatcher, FinderKind};
//!
//! let chars: Vec<char> = "haystack needle here".chars().collect();
//! let re = CompiledMatcher::<[char]>::new("needle").unwrap();
//! assert_eq!(re.finder_kind(), FinderKind::BoyerMoore);
//! assert_eq!(re.next_candidate(&chars[..], 0..chars.len()), Some(9));
//! ```

#[macro_use]
mod macros;

pub mod backtrack;
pub mod compiler;
pub mod config;
pub mod finder;
pub mod graph;
pub mod haystack;
pub mod linker;
pub mod matcher;
pub mod optimize;
pub mod peek;
pub mod traits;

pub use compiler::Compiler;
pub use config::{Builder, Config};
pub use finder::{Finder, FinderKind};
pub use graph::{Anchor, CharClass, Graph, GroupRef, Node, NodeId};
pub use haystack::{Haystack, Indexed, RandomAccess, Traversal};
pub use matcher::{CompiledMatcher, Match};
pub use peek::{LiteralPrefix, PeekBitset, PeekResult, Peeker};
pub use traits::{DefaultTraits, RegexTraits};

/// The result of compiling a pattern into a [`CompiledMatcher`]
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors that can occur during compilation
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The pattern was rejected by the parser
    Syntax(String),
    /// The parsed pattern uses something the expression graph cannot express
    UnsupportedFeature(String),
    /// A back-reference or quantified group names a capture group that does
    /// not exist in the graph
    UnresolvedReference(GroupRef),
    /// The lowered graph has more nodes than the configured size limit
    TooComplex,
    /// Internal compilation error
    Internal(String),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Syntax(msg) => write!(f, "{}", msg),
            CompileError::UnsupportedFeature(feature) => write!(f, "unsupported feature: {}", feature),
            CompileError::UnresolvedReference(group) => {
                write!(f, "reference to undefined capture group {}", group)
            }
            CompileError::TooComplex => write!(f, "regex pattern is too complex"),
            CompileError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<regex_syntax::Error> for CompileError {
    fn from(err: regex_syntax::Error) -> Self {
        CompileError::Syntax(err.to_string())
    }
}
