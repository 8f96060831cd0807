//! Pattern compilation options and the builder that applies them.

use crate::compiler::Compiler;
use crate::haystack::Haystack;
use crate::matcher::CompiledMatcher;
use crate::optimize::compile_graph;
use crate::traits::DefaultTraits;
use crate::{CompileError, CompileResult};
use regex_syntax::ParserBuilder;

/// Options for compiling a pattern.
///
/// The parser flags are handed to `regex-syntax`; `optimize` and
/// `size_limit` govern the compile pipeline itself.
#[derive(Debug, Clone)]
pub struct Config {
    case_insensitive: bool,
    multi_line: bool,
    dot_matches_new_line: bool,
    crlf: bool,
    line_terminator: u8,
    unicode: bool,
    nest_limit: u32,
    optimize: bool,
    size_limit: usize,
}

impl Config {
    pub fn new() -> Self {
        Self {
            case_insensitive: false,
            multi_line: false,
            dot_matches_new_line: false,
            crlf: false,
            line_terminator: b'\n',
            unicode: true,
            nest_limit: 250,
            optimize: true,
            size_limit: 1 << 16,
        }
    }

    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    /// Make `^` and `$` match at line boundaries
    pub fn multi_line(mut self, yes: bool) -> Self {
        self.multi_line = yes;
        self
    }

    pub fn dot_matches_new_line(mut self, yes: bool) -> Self {
        self.dot_matches_new_line = yes;
        self
    }

    /// Treat both `\r` and `\n` as line terminators
    pub fn crlf(mut self, yes: bool) -> Self {
        self.crlf = yes;
        self
    }

    pub fn line_terminator(mut self, byte: u8) -> Self {
        self.line_terminator = byte;
        self
    }

    pub fn unicode(mut self, yes: bool) -> Self {
        self.unicode = yes;
        self
    }

    /// Maximum nesting depth the parser accepts
    pub fn nest_limit(mut self, limit: u32) -> Self {
        self.nest_limit = limit;
        self
    }

    /// Attach a finder to the compiled matcher. When disabled every position
    /// is handed to the full matcher.
    pub fn optimize(mut self, yes: bool) -> Self {
        self.optimize = yes;
        self
    }

    /// Maximum number of nodes in the lowered expression graph
    pub fn size_limit(mut self, limit: usize) -> Self {
        self.size_limit = limit;
        self
    }

    pub fn get_optimize(&self) -> bool {
        self.optimize
    }

    pub fn get_size_limit(&self) -> usize {
        self.size_limit
    }

    /// The traits matching these options
    pub fn traits(&self) -> DefaultTraits {
        DefaultTraits::new()
            .line_terminator(self.line_terminator)
            .crlf(self.crlf)
    }

    fn parser(&self) -> ParserBuilder {
        let mut parser = ParserBuilder::new();
        parser
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .crlf(self.crlf)
            .line_terminator(self.line_terminator)
            .unicode(self.unicode)
            .nest_limit(self.nest_limit);
        parser
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles pattern strings into [`CompiledMatcher`]s.
///
/// ```
/// use regex_prefilter::{Builder, Config, FinderKind};
///
/// let re = Builder::new()
///     .config(Config::new().case_insensitive(true))
///     .build::<[char]>("cat")
///     .unwrap();
/// assert_eq!(re.finder_kind(), FinderKind::BoyerMoore);
/// let hay: Vec<char> = "a CAT".chars().collect();
/// assert_eq!(re.find(&hay[..]).map(|m| m.start), Some(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Parse `pattern` and compile it for haystacks of type `H`
    pub fn build<H: Haystack + ?Sized>(&self, pattern: &str) -> CompileResult<CompiledMatcher<H>> {
        let hir = self.config.parser().build().parse(pattern)?;
        let traits = self.config.traits();
        let graph = Compiler::new(traits).compile(&hir)?;
        if graph.len() > self.config.size_limit {
            debug!("graph of {} nodes exceeds limit {}", graph.len(), self.config.size_limit);
            return Err(CompileError::TooComplex);
        }
        compile_graph(graph, traits, self.config.optimize)
    }
}
