use crate::init;
use regex_prefilter::graph::Node;
use regex_prefilter::linker::Linker;
use regex_prefilter::{CharClass, CompileError, CompiledMatcher, DefaultTraits, Graph, GroupRef, Match};

/// (?<tag>[a-z]+)=\k<tag>(?:,\1)*
fn tagged_graph() -> Graph {
    let mut graph = Graph::new();
    let letter = graph.class(CharClass::new(vec![('a', 'z')]));
    let word = graph.repeat(letter, 1, None);
    let tag = graph.group(1, Some("tag"), word);
    let eq = graph.literal("=");
    let by_name = graph.backref(GroupRef::Name("tag".to_string()), false);
    let comma = graph.literal(",");
    let by_index = graph.backref(GroupRef::Index(1), false);
    let more = graph.concat(vec![comma, by_index]);
    let tail = graph.repeat(more, 0, None);
    let root = graph.concat(vec![tag, eq, by_name, tail]);
    graph.set_root(root);
    graph
}

fn links(graph: &Graph) -> Vec<(usize, Option<usize>)> {
    graph
        .reachable()
        .into_iter()
        .filter_map(|id| match graph.node(id) {
            Node::BackRef(backref) => Some((id, backref.group)),
            Node::Repeat(rep) if rep.capture.is_some() => Some((id, rep.group)),
            _ => None,
        })
        .collect()
}

#[test]
fn resolves_names_and_indices_to_the_same_group() -> anyhow::Result<()> {
    init();
    let mut graph = tagged_graph();
    let count = Linker::new().link(&mut graph)?;
    assert_eq!(count, 2);

    let targets: Vec<_> = links(&graph).into_iter().map(|(_, group)| group).collect();
    assert_eq!(targets.len(), 2);
    assert!(targets[0].is_some());
    assert!(targets.iter().all(|&target| target == targets[0]));
    Ok(())
}

#[test]
fn linking_twice_is_a_no_op() -> anyhow::Result<()> {
    init();
    let mut once = tagged_graph();
    Linker::new().link(&mut once)?;
    let mut twice = once.clone();
    Linker::new().link(&mut twice)?;
    assert_eq!(once, twice);
    assert_eq!(links(&once), links(&twice));
    Ok(())
}

#[test]
fn unresolved_reference_fails_compilation() {
    init();
    let mut graph = Graph::new();
    let x = graph.literal("x");
    let group = graph.group(1, Some("x"), x);
    let backref = graph.backref(GroupRef::Name("y".to_string()), false);
    let root = graph.concat(vec![group, backref]);
    graph.set_root(root);

    let before = graph.clone();
    let err = Linker::new().link(&mut graph).unwrap_err();
    assert_eq!(err, CompileError::UnresolvedReference(GroupRef::Name("y".to_string())));
    assert_eq!(graph, before);

    let err = CompiledMatcher::<str, _>::from_graph(before, DefaultTraits::new()).unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedReference(_)));
}

#[test]
fn linked_backreferences_drive_matching() -> anyhow::Result<()> {
    init();
    let re = CompiledMatcher::<str, _>::from_graph(tagged_graph(), DefaultTraits::new())?;
    assert_eq!(re.find("x ab=ab,ab,ac"), Some(Match { start: 2, end: 10 }));
    assert_eq!(re.find("ab=ac"), None);
    Ok(())
}

#[test]
fn quantified_group_is_linked_to_its_definition() -> anyhow::Result<()> {
    init();
    let mut graph = Graph::new();
    let ab = graph.literal("ab");
    let group = graph.group(1, None, ab);
    let plus = graph.repeat(group, 1, None);
    graph.set_root(plus);

    Linker::new().link(&mut graph)?;
    match graph.node(graph.root()) {
        Node::Repeat(rep) => assert_eq!(rep.group, Some(group)),
        other => panic!("expected a repetition, found {:?}", other),
    }
    Ok(())
}
