use crate::graph::{Anchor, CharClass, Graph, NodeId};
use crate::traits::RegexTraits;
use crate::{CompileError, CompileResult};
use regex_syntax::hir::{Capture, Class, ClassUnicode, ClassUnicodeRange, Hir, HirKind, Look, Repetition};

/// Largest class that is checked for being the case-fold closure of a
/// single character
const MAX_FOLD_CLASS: usize = 4;

/// Compiler that lowers regex-syntax HIR into an expression graph
pub struct Compiler<T> {
    graph: Graph,
    traits: T,
}

impl<T: RegexTraits> Compiler<T> {
    /// Create a new compiler. `traits` decides which classes can be
    /// expressed as case-insensitive literals.
    pub fn new(traits: T) -> Self {
        Self {
            graph: Graph::new(),
            traits,
        }
    }

    /// Compile HIR into an unlinked expression graph
    pub fn compile(mut self, hir: &Hir) -> CompileResult<Graph> {
        let root = self.compile_hir(hir)?;
        self.graph.set_root(root);
        Ok(self.graph)
    }

    fn compile_hir(&mut self, hir: &Hir) -> CompileResult<NodeId> {
        match hir.kind() {
            HirKind::Empty => Ok(self.graph.empty()),
            HirKind::Literal(_) | HirKind::Class(_) => match self.literal_chars(hir)? {
                Some((chars, icase)) => Ok(self.compile_literal(chars, icase)),
                None => self.compile_class(hir),
            },
            HirKind::Look(look) => self.compile_look(*look),
            HirKind::Repetition(rep) => self.compile_repetition(rep),
            HirKind::Capture(capture) => self.compile_capture(capture),
            HirKind::Concat(concat) => self.compile_concat(concat),
            HirKind::Alternation(alternation) => {
                let branches = alternation
                    .iter()
                    .map(|branch| self.compile_hir(branch))
                    .collect::<CompileResult<Vec<_>>>()?;
                Ok(self.graph.alternate(branches))
            }
        }
    }

    fn compile_literal(&mut self, chars: Vec<char>, icase: bool) -> NodeId {
        let text: String = chars.into_iter().collect();
        if icase {
            self.graph.literal_nocase(&text)
        } else {
            self.graph.literal(&text)
        }
    }

    /// The characters a literal-like node matches and whether they are
    /// compared case-insensitively. Classes only qualify when they hold a
    /// single character or exactly the case variants of one.
    fn literal_chars(&self, hir: &Hir) -> CompileResult<Option<(Vec<char>, bool)>> {
        match hir.kind() {
            HirKind::Literal(literal) => match std::str::from_utf8(&literal.0) {
                Ok(text) => Ok(Some((text.chars().collect(), false))),
                Err(_) => Err(CompileError::UnsupportedFeature(format!(
                    "literal is not valid UTF-8: {:?}",
                    literal.0
                ))),
            },
            HirKind::Class(Class::Unicode(class)) => Ok(self.folded_char(class).map(|(ch, icase)| (vec![ch], icase))),
            _ => Ok(None),
        }
    }

    // Recognizes the class `regex-syntax` emits for a case-insensitive
    // character, e.g. [Kk\u{212A}] for (?i)k.
    fn folded_char(&self, class: &ClassUnicode) -> Option<(char, bool)> {
        let mut members = Vec::new();
        for range in class.iter() {
            for code in range.start() as u32..=range.end() as u32 {
                members.push(char::from_u32(code)?);
                if members.len() > MAX_FOLD_CLASS {
                    return None;
                }
            }
        }
        let first = *members.first()?;
        if members.len() == 1 {
            return Some((first, false));
        }

        let folded = self.traits.translate_nocase(first);
        if !members.iter().all(|&ch| self.traits.translate_nocase(ch) == folded) {
            return None;
        }
        let mut closure = ClassUnicode::new([ClassUnicodeRange::new(folded, folded)]);
        closure.try_case_fold_simple().ok()?;
        if &closure == class {
            Some((folded, true))
        } else {
            None
        }
    }

    fn joins_run(&self, run: &[char], run_icase: bool, chars: &[char], icase: bool) -> bool {
        run_icase == icase
            || (run_icase && chars.iter().all(|&ch| self.is_caseless(ch)))
            || (icase && run.iter().all(|&ch| self.is_caseless(ch)))
    }

    // A character whose case-fold closure is itself matches the same input
    // whether compared exactly or case-insensitively.
    fn is_caseless(&self, ch: char) -> bool {
        if self.traits.translate_nocase(ch) != ch {
            return false;
        }
        let single = ClassUnicodeRange::new(ch, ch);
        let mut closure = ClassUnicode::new([single]);
        closure.try_case_fold_simple().is_ok() && closure.ranges() == &[single][..]
    }

    fn compile_class(&mut self, hir: &Hir) -> CompileResult<NodeId> {
        let class = match hir.kind() {
            HirKind::Class(Class::Unicode(class)) => {
                CharClass::new(class.iter().map(|range| (range.start(), range.end())))
            }
            // Bytes are matched as the characters with the same code point.
            HirKind::Class(Class::Bytes(class)) => {
                CharClass::new(class.iter().map(|range| (char::from(range.start()), char::from(range.end()))))
            }
            _ => return Err(CompileError::Internal(format!("expected a class, found {:?}", hir))),
        };
        Ok(self.graph.class(class))
    }

    fn compile_look(&mut self, look: Look) -> CompileResult<NodeId> {
        let anchor = match look {
            Look::Start => Anchor::StartText,
            Look::End => Anchor::EndText,
            Look::StartLF | Look::StartCRLF => Anchor::StartLine,
            Look::EndLF | Look::EndCRLF => Anchor::EndLine,
            Look::WordAscii | Look::WordUnicode => Anchor::WordBoundary,
            Look::WordAsciiNegate | Look::WordUnicodeNegate => Anchor::NotWordBoundary,
            Look::WordStartAscii | Look::WordStartUnicode => Anchor::WordStart,
            Look::WordEndAscii | Look::WordEndUnicode => Anchor::WordEnd,
            other => {
                return Err(CompileError::UnsupportedFeature(format!(
                    "look-around assertion {:?}",
                    other
                )))
            }
        };
        Ok(self.graph.assert(anchor))
    }

    fn compile_repetition(&mut self, rep: &Repetition) -> CompileResult<NodeId> {
        let sub = self.compile_hir(&rep.sub)?;
        Ok(self.graph.repeat_with(sub, rep.min, rep.max, rep.greedy))
    }

    fn compile_capture(&mut self, capture: &Capture) -> CompileResult<NodeId> {
        let sub = self.compile_hir(&capture.sub)?;
        Ok(self.graph.group(capture.index, capture.name.as_deref(), sub))
    }

    /// Compile a concatenation, merging runs of literals with the same case
    /// mode into one literal node. Characters without case variants, such as
    /// digits and punctuation, join a run of either mode.
    fn compile_concat(&mut self, concat: &[Hir]) -> CompileResult<NodeId> {
        let mut items = Vec::new();
        let mut pending: Option<(Vec<char>, bool)> = None;

        for hir in concat {
            if let Some((chars, icase)) = self.literal_chars(hir)? {
                match &mut pending {
                    Some((run, run_icase)) if self.joins_run(&run[..], *run_icase, &chars, icase) => {
                        run.extend(chars);
                        *run_icase |= icase;
                    }
                    slot => {
                        if let Some((run, run_icase)) = slot.replace((chars, icase)) {
                            items.push(self.compile_literal(run, run_icase));
                        }
                    }
                }
                continue;
            }
            if let Some((run, run_icase)) = pending.take() {
                items.push(self.compile_literal(run, run_icase));
            }
            items.push(self.compile_hir(hir)?);
        }
        if let Some((run, run_icase)) = pending.take() {
            items.push(self.compile_literal(run, run_icase));
        }

        match items.len() {
            1 => Ok(items[0]),
            _ => Ok(self.graph.concat(items)),
        }
    }
}
