//! Tests for forest construction from flat curriculum records

use rstest::rstest;

use currtree::domain::{
    build_tree, compute_expansion_path, CurriculumNode, DomainError, ExpansionState, NodeId,
    NodeType, TreeBuilder,
};

fn node(id: i64, name: &str, parent: Option<i64>) -> CurriculumNode {
    let n = CurriculumNode::new(id, name, NodeType::Topic);
    match parent {
        Some(p) => n.with_parent(p),
        None => n,
    }
}

fn ids<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<NodeId> {
    items.into_iter().map(NodeId::from).collect()
}

/// Math(1) with Algebra(2) and Geometry(3); Linear Equations(4) under Algebra.
fn math_curriculum() -> Vec<CurriculumNode> {
    vec![
        CurriculumNode::new(1, "Math", NodeType::Subject),
        CurriculumNode::new(2, "Algebra", NodeType::Unit)
            .with_parent(1)
            .with_order(1),
        CurriculumNode::new(3, "Geometry", NodeType::Unit)
            .with_parent(1)
            .with_order(2),
        CurriculumNode::new(4, "Linear Equations", NodeType::Topic).with_parent(2),
    ]
}

#[test]
fn given_math_curriculum_when_building_then_nests_units_and_topics() {
    let forest = build_tree(&math_curriculum()).unwrap();

    assert_eq!(forest.roots().len(), 1);
    let math = forest.entry(&"1".into()).unwrap();
    assert_eq!(math.child_count(), 2);

    let children: Vec<_> = math
        .children
        .iter()
        .filter_map(|&idx| forest.get(idx))
        .map(|e| e.node.name.as_str())
        .collect();
    assert_eq!(children, ["Algebra", "Geometry"]);
    assert_eq!(forest.ancestors(&"4".into()), ids(["1", "2"]));
    assert_eq!(forest.depth(), 3);
}

#[rstest]
#[case::empty(vec![])]
#[case::single(vec![node(1, "a", None)])]
#[case::chain(vec![node(1, "a", None), node(2, "b", Some(1)), node(3, "c", Some(2))])]
#[case::orphans(vec![node(1, "a", Some(99)), node(2, "b", Some(98))])]
#[case::cycle(vec![node(1, "a", Some(2)), node(2, "b", Some(1)), node(3, "c", Some(1))])]
fn given_any_input_when_building_then_every_node_appears_once(#[case] nodes: Vec<CurriculumNode>) {
    let forest = build_tree(&nodes).unwrap();

    assert_eq!(forest.len(), nodes.len());
    assert_eq!(forest.iter().count(), nodes.len());
    for n in &nodes {
        assert!(forest.contains(&n.id), "missing {}", n.id);
    }
}

#[test]
fn given_nodes_with_existing_parents_when_building_then_each_sits_under_its_parent() {
    let nodes = vec![
        node(1, "root", None),
        node(2, "a", Some(1)),
        node(3, "b", Some(1)),
        node(4, "c", Some(3)),
    ];
    let forest = build_tree(&nodes).unwrap();

    for n in nodes.iter().filter(|n| n.parent_id.is_some()) {
        let entry = forest.entry(&n.id).unwrap();
        let parent = entry.parent.and_then(|idx| forest.get(idx)).unwrap();
        assert_eq!(Some(parent.id()), n.parent_id.as_ref());
    }
}

#[test]
fn given_missing_parent_when_building_then_node_is_reported_and_becomes_root() {
    let nodes = vec![node(1, "a", None), node(2, "b", Some(42))];

    let report = TreeBuilder::new().build(&nodes).unwrap();

    assert_eq!(report.orphans, ids(["2"]));
    assert_eq!(report.forest.roots().len(), 2);
    assert!(report.cycles.is_empty());
    assert!(!report.is_clean());
}

#[test]
fn given_siblings_when_building_then_ordered_by_order_then_name() {
    let nodes = vec![
        node(1, "root", None),
        node(2, "Zeta", Some(1)),
        node(3, "Alpha", Some(1)),
        node(4, "Beta", Some(1)).with_order(2),
        node(5, "Gamma", Some(1)).with_order(1),
    ];
    let forest = build_tree(&nodes).unwrap();

    let names: Vec<_> = forest
        .iter()
        .filter(|(depth, _)| *depth == 1)
        .map(|(_, e)| e.node.name.clone())
        .collect();
    assert_eq!(names, ["Gamma", "Beta", "Alpha", "Zeta"]);
}

#[test]
fn given_two_node_cycle_when_building_then_terminates_with_one_root() {
    let nodes = vec![node(1, "X", Some(2)), node(2, "Y", Some(1))];

    let report = TreeBuilder::new().build(&nodes).unwrap();

    assert_eq!(report.forest.roots().len(), 1);
    assert_eq!(report.cycles.len(), 1);
    assert_eq!(report.cycles[0].promoted, NodeId::from("1"));
    assert_eq!(report.forest.len(), 2);
}

#[test]
fn given_duplicate_ids_when_building_then_rejects_input() {
    let nodes = vec![node(1, "a", None), node(1, "b", None)];

    let err = build_tree(&nodes).unwrap_err();

    assert_eq!(err, DomainError::DuplicateId("1".into()));
}

#[test]
fn given_blank_id_when_building_then_fails_fast() {
    let nodes = vec![node(1, "a", None), CurriculumNode::new("", "blank", NodeType::Unit)];

    let err = build_tree(&nodes).unwrap_err();

    assert_eq!(err, DomainError::MissingId { index: 1 });
}

#[test]
fn given_chain_when_computing_expansion_path_then_returns_ancestors_only() {
    let nodes = vec![node(1, "A", None), node(2, "B", Some(1)), node(3, "C", Some(2))];

    let path = compute_expansion_path(&nodes, &"3".into());

    assert_eq!(path.into_iter().collect::<Vec<_>>(), ids(["1", "2"]));
}

#[rstest]
#[case::root("1", vec![])]
#[case::unknown("77", vec![])]
#[case::dangling_parent("5", vec![])]
fn given_edge_selection_when_computing_expansion_path_then_empty(
    #[case] selected: &str,
    #[case] expected: Vec<&str>,
) {
    let nodes = vec![node(1, "A", None), node(5, "E", Some(404))];

    let path = compute_expansion_path(&nodes, &selected.into());

    assert_eq!(path.into_iter().collect::<Vec<_>>(), ids(expected));
}

#[test]
fn given_cyclic_parents_when_computing_expansion_path_then_terminates() {
    let nodes = vec![node(1, "X", Some(2)), node(2, "Y", Some(1))];

    let path = compute_expansion_path(&nodes, &"1".into());

    assert_eq!(path.into_iter().collect::<Vec<_>>(), ids(["2"]));
}

#[test]
fn given_selected_topic_when_initial_state_then_ancestors_open_and_siblings_closed() {
    let mut nodes = math_curriculum();
    nodes.push(CurriculumNode::new(5, "Triangles", NodeType::Topic).with_parent(3));
    let forest = build_tree(&nodes).unwrap();

    let state = ExpansionState::initial(&forest, Some(&"4".into()), 0);

    assert!(state.is_expanded(&"1".into()));
    assert!(state.is_expanded(&"2".into()));
    assert!(!state.is_expanded(&"3".into()));
    assert!(!state.is_expanded(&"4".into()));
}
