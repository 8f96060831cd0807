use anyhow::Context;
use clap::Parser;
use regex_prefilter::graph::Node;
use regex_prefilter::{Builder, CompiledMatcher, Config, Graph};
use regex_syntax::ParserBuilder;

#[derive(Parser, Debug)]
#[command(name = "prefilter_dump")]
#[command(about = "Print the expression graph, peek result and selected finder of regex patterns")]
struct Args {
    /// Match letters case-insensitively
    #[arg(short = 'i', long)]
    case_insensitive: bool,

    /// Make ^ and $ match at line boundaries
    #[arg(short = 'm', long)]
    multi_line: bool,

    /// Allow . to match a line terminator
    #[arg(short = 's', long)]
    dot_matches_new_line: bool,

    /// Treat both \r and \n as line terminators
    #[arg(long)]
    crlf: bool,

    /// Patterns to analyze (a built-in list when none are given)
    #[arg(value_name = "PATTERN")]
    patterns: Vec<String>,
}

impl Args {
    fn config(&self) -> Config {
        Config::new()
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .crlf(self.crlf)
    }

    fn parser(&self) -> ParserBuilder {
        let mut parser = ParserBuilder::new();
        parser
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .crlf(self.crlf);
        parser
    }

    fn patterns(&self) -> Vec<String> {
        if self.patterns.is_empty() {
            DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
        } else {
            self.patterns.clone()
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let parser = args.parser();
    let patterns = args.patterns();

    println!("Regex Prefilter - Peek Result and Finder Selection");
    println!("==================================================");

    let builder = Builder::new().config(args.config());
    for pattern in &patterns {
        println!("\n=== Pattern: '{}' ===", pattern);

        let hir = match parser.build().parse(pattern) {
            Ok(hir) => hir,
            Err(e) => {
                println!("Failed to parse pattern: {}", e);
                continue;
            }
        };
        println!("HIR: {:?}", hir);

        let chars = match builder.build::<[char]>(pattern) {
            Ok(re) => re,
            Err(e) => {
                println!("Failed to compile: {}", e);
                continue;
            }
        };
        let text: CompiledMatcher<str> = builder
            .build(pattern)
            .with_context(|| format!("pattern {:?} compiled for [char] but not for str", pattern))?;

        print_graph(chars.graph());

        let peek = chars.peek();
        let bitset = peek.bitset();
        println!("Peek:");
        println!("  leading slots: {}/256{}", bitset.count(), if bitset.icase() { " (case folded)" } else { "" });
        if !bitset.is_full() {
            let slots: String = bitset.slots().map(char::from).flat_map(char::escape_default).collect();
            println!("  slots: [{}]", slots);
        }
        println!("  line start: {}", peek.line_start());
        match peek.literal() {
            Some(literal) => println!("  literal: {}", literal),
            None => println!("  literal: none"),
        }
        println!("Finder:");
        println!("  random access ([char], [u8]): {}", chars.finder_kind());
        println!("  bidirectional (str):          {}", text.finder_kind());
    }

    Ok(())
}

fn print_graph(graph: &Graph) {
    println!("Root: {}", graph.root());
    println!("Nodes:");

    for id in graph.reachable() {
        print!("  {}: ", id);
        match graph.node(id) {
            Node::Empty => println!("EMPTY"),
            Node::Literal(lit) => {
                let text: String = lit.chars.iter().collect();
                println!("LITERAL {:?}{}", text, if lit.icase { " (?i)" } else { "" });
            }
            Node::Class(class) => {
                let ranges: Vec<String> = class
                    .ranges()
                    .iter()
                    .map(|&(start, end)| {
                        if start == end {
                            format!("{:?}", start)
                        } else {
                            format!("{:?}-{:?}", start, end)
                        }
                    })
                    .collect();
                println!("CLASS [{}]", ranges.join(" "));
            }
            Node::Assert(anchor) => println!("ASSERT {:?}", anchor),
            Node::Concat(items) => println!("CONCAT {:?}", items),
            Node::Alternate(branches) => println!("ALTERNATE {:?}", branches),
            Node::Repeat(rep) => {
                let max = rep.max.map_or_else(|| "inf".to_string(), |max| max.to_string());
                print!("REPEAT {{{},{}}}{} -> {}", rep.min, max, if rep.greedy { "" } else { "?" }, rep.sub);
                match rep.group {
                    Some(group) => println!(" (resets group node {})", group),
                    None => println!(),
                }
            }
            Node::Group(group) => match &group.name {
                Some(name) => println!("GROUP {} <{}> -> {}", group.index, name, group.sub),
                None => println!("GROUP {} -> {}", group.index, group.sub),
            },
            Node::BackRef(backref) => match backref.group {
                Some(group) => println!("BACKREF {} => node {}", backref.target, group),
                None => println!("BACKREF {} (unlinked)", backref.target),
            },
        }
    }
}

const DEFAULT_PATTERNS: &[&str] = &[
    "needle",
    "cat|dog",
    "[a-c]",
    "(?i)cat",
    "^abc",
    "(?m)^[a-z]+",
    "x{3}y",
    "(?:ab)?c",
    "a*",
    r"\bfoo\b",
    "(a|b)+c",
    "[^a]",
];
