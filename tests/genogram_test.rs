use pretty_assertions::assert_eq;

use genogram::graph_layout::{EdgeSpec, NodeSpec, Side};
use genogram::rank::Ranker;
use genogram::types::{Gender, Person, Relationship, RelationshipKind, RelationshipPatch};
use genogram::{GraphModel, LayoutOptions, RankDir, ValidationError, compute_layout};

fn person(name: &str, gender: Gender) -> Person {
    Person::new(name, gender)
}

fn rel(from: &str, to: &str, kind: RelationshipKind) -> Relationship {
    Relationship::new(from, to, kind)
}

// =============================================================================
// Model
// =============================================================================

#[test]
fn ids_are_unique() {
    let mut model = GraphModel::new();
    let mut ids = Vec::new();
    for i in 0..50 {
        ids.push(model.add_person(person(&format!("P{i}"), Gender::Male)).unwrap());
    }
    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());
}

#[test]
fn cascade_delete() {
    let mut model = GraphModel::new();
    let ids: Vec<String> = ["A", "B", "C", "D"]
        .iter()
        .map(|n| model.add_person(person(n, Gender::Female)).unwrap())
        .collect();
    model.add_relationship(rel(&ids[0], &ids[1], RelationshipKind::Married)).unwrap();
    model.add_relationship(rel(&ids[0], &ids[2], RelationshipKind::ParentChild)).unwrap();
    model.add_relationship(rel(&ids[3], &ids[0], RelationshipKind::ParentChild)).unwrap();
    model.add_relationship(rel(&ids[2], &ids[3], RelationshipKind::Siblings)).unwrap();

    assert!(model.delete_person(&ids[0]));
    assert!(
        model
            .relationships()
            .iter()
            .all(|r| r.from != ids[0] && r.to != ids[0])
    );
    assert_eq!(model.relationships().len(), 1);
}

#[test]
fn no_self_loops() {
    let mut model = GraphModel::new();
    let a = model.add_person(person("A", Gender::Male)).unwrap();
    for kind in ["parent-child", "married", "divorced", "siblings", "godparent"] {
        let err = model
            .add_relationship(rel(&a, &a, RelationshipKind::from(kind)))
            .unwrap_err();
        assert_eq!(err.validation().map(ValidationError::reason), Some("self relationship"));
    }
    assert!(model.relationships().is_empty());
}

#[test]
fn duplicate_rejected_in_both_directions() {
    let mut model = GraphModel::new();
    let a = model.add_person(person("A", Gender::Male)).unwrap();
    let b = model.add_person(person("B", Gender::Female)).unwrap();
    model.add_relationship(rel(&a, &b, RelationshipKind::Married)).unwrap();

    for (from, to) in [(&a, &b), (&b, &a)] {
        let err = model
            .add_relationship(rel(from, to, RelationshipKind::Married))
            .unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::Duplicate));
        assert_eq!(err.to_string(), "This relationship already exists");
    }
    assert_eq!(model.relationships().len(), 1);
}

#[test]
fn update_preserves_unspecified_fields() {
    let mut model = GraphModel::new();
    let a = model.add_person(person("A", Gender::Male)).unwrap();
    let b = model.add_person(person("B", Gender::Female)).unwrap();
    let id = model
        .add_relationship(rel(&a, &b, RelationshipKind::Siblings))
        .unwrap();

    model
        .update_relationship(&id, RelationshipPatch::kind(RelationshipKind::Married))
        .unwrap();
    let updated = model.relationship(&id).unwrap();
    assert_eq!(updated.kind, RelationshipKind::Married);
    assert_eq!(updated.source_handle.as_deref(), Some("right"));
    assert_eq!(updated.target_handle.as_deref(), Some("left"));
    assert_eq!(updated.from, a);
    assert_eq!(updated.to, b);
}

#[test]
fn john_and_jane() {
    let mut model = GraphModel::new();
    let john = model.add_person(person("John", Gender::Male)).unwrap();
    let jane = model.add_person(person("Jane", Gender::Female)).unwrap();

    model
        .add_relationship(rel(&john, &jane, RelationshipKind::Married))
        .unwrap();
    assert_eq!(model.relationships().len(), 1);

    let err = model
        .add_relationship(rel(&john, &jane, RelationshipKind::Married))
        .unwrap_err();
    assert_eq!(err.validation().map(ValidationError::reason), Some("duplicate relationship"));
    assert_eq!(model.relationships().len(), 1);
}

// =============================================================================
// Import / export
// =============================================================================

const FAMILY: &str = r#"{
    "members": [
        {"id": "1", "name": "Grace", "gender": "female", "birthDate": "1931-02-03",
         "deceased": true, "deathDate": "2001-09-10", "medicalConditions": "hypertension"},
        {"id": "2", "name": "Henry", "gender": "male", "birthYear": "1929", "deceased": false},
        {"id": "3", "name": "Iris", "gender": "other", "medicalConditions": ["asthma", "migraine"]}
    ],
    "relationships": [
        {"id": "r1", "from": "1", "to": "2", "type": "married", "sourceHandle": "right", "targetHandle": "left"},
        {"id": "r2", "from": "1", "to": "3", "type": "parent-child"},
        {"id": "r3", "from": "2", "to": "3", "type": "parent-child"}
    ]
}"#;

#[test]
fn round_trip() {
    let model = GraphModel::from_json(FAMILY).unwrap();
    let exported = model.export_snapshot();

    let mut reloaded = GraphModel::new();
    reloaded.replace_all(exported.members.clone(), exported.relationships.clone());
    assert_eq!(reloaded.export_snapshot(), exported);

    let ids: Vec<&str> = exported.members.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(exported.members[0].birth_year.as_deref(), Some("1931"));
    assert_eq!(exported.members[0].death_year.as_deref(), Some("2001"));
    assert_eq!(exported.members[1].death_year, None);
    assert_eq!(exported.relationships.len(), 3);
}

#[test]
fn json_text_round_trip() {
    let model = GraphModel::from_json(FAMILY).unwrap();
    let text = model.export_json().unwrap();
    let again = GraphModel::from_json(&text).unwrap();
    assert_eq!(again.export_json().unwrap(), text);
}

#[test]
fn lenient_import() {
    let model = GraphModel::from_json(
        r#"{"members": [{"id": 1, "name": "A", "gender": null}], "relationships": "nope"}"#,
    )
    .unwrap();
    assert_eq!(model.persons()[0].id, "1");
    assert_eq!(model.persons()[0].gender, Gender::Male);
    assert!(model.relationships().is_empty());
}

#[test]
fn one_bad_entry_keeps_the_others() {
    let model = GraphModel::from_json(
        r#"{"members": [
            {"id": "1", "name": "A", "deceased": "yes"},
            42,
            {"id": "2", "name": "B", "medicalConditions": 5}
        ]}"#,
    )
    .unwrap();
    let ids: Vec<&str> = model.persons().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(!model.persons()[0].deceased);
    assert_eq!(model.compute_layout(&LayoutOptions::default()).nodes.len(), 2);

    assert!(GraphModel::from_json("{ not json").is_err());
}

// =============================================================================
// Layout
// =============================================================================

fn layout_input(model: &GraphModel) -> (Vec<NodeSpec>, Vec<EdgeSpec>) {
    (model.node_specs(&LayoutOptions::default()), model.edge_specs())
}

#[test]
fn empty_graph() {
    let layout = compute_layout(&[], &[], &LayoutOptions::default());
    assert!(layout.nodes.is_empty());
    assert!(layout.edges.is_empty());
}

#[test]
fn layout_is_deterministic() {
    let model = GraphModel::from_json(FAMILY).unwrap();
    let (nodes, edges) = layout_input(&model);
    let first = compute_layout(&nodes, &edges, &LayoutOptions::default());
    for _ in 0..3 {
        assert_eq!(compute_layout(&nodes, &edges, &LayoutOptions::default()), first);
    }
}

#[test]
fn generational_separation() {
    let model = GraphModel::from_json(FAMILY).unwrap();
    let options = LayoutOptions::default();
    let layout = model.compute_layout(&options);
    for rel in model.relationships() {
        if rel.kind != RelationshipKind::ParentChild {
            continue;
        }
        let p = layout.node(&rel.from).unwrap();
        let c = layout.node(&rel.to).unwrap();
        assert!(
            c.y - p.y >= options.rank_sep,
            "{} at {} should be a generation below {} at {}",
            rel.to,
            c.y,
            rel.from,
            p.y
        );
    }
}

#[test]
fn siblings_share_a_rank() {
    let mut model = GraphModel::new();
    let a = model.add_person(person("A", Gender::Male)).unwrap();
    let b = model.add_person(person("B", Gender::Female)).unwrap();
    let c = model.add_person(person("C", Gender::Male)).unwrap();
    model.add_relationship(rel(&a, &b, RelationshipKind::ParentChild)).unwrap();
    model.add_relationship(rel(&a, &c, RelationshipKind::ParentChild)).unwrap();

    let layout = model.compute_layout(&LayoutOptions::default());
    let (a, b, c) = (
        layout.node(&a).unwrap(),
        layout.node(&b).unwrap(),
        layout.node(&c).unwrap(),
    );
    assert!((b.y - c.y).abs() < 1e-9);
    assert_eq!(b.rank, c.rank);
    assert!(b.y > a.y);
    assert!(b.rank > a.rank);
    assert_ne!(b.x, c.x);
}

#[test]
fn spouse_sits_beside_partner() {
    let mut model = GraphModel::new();
    let p = model.add_person(person("P", Gender::Male)).unwrap();
    let a = model.add_person(person("A", Gender::Female)).unwrap();
    let s = model.add_person(person("S", Gender::Male)).unwrap();
    let b = model.add_person(person("B", Gender::Male)).unwrap();
    model.add_relationship(rel(&p, &a, RelationshipKind::ParentChild)).unwrap();
    model.add_relationship(rel(&p, &s, RelationshipKind::ParentChild)).unwrap();
    let married = model.add_relationship(rel(&a, &b, RelationshipKind::Married)).unwrap();

    let layout = model.compute_layout(&LayoutOptions::default());
    let x = |id: &str| layout.node(id).unwrap().x;
    let y = |id: &str| layout.node(id).unwrap().y;
    assert_eq!(y(&a), y(&b));
    assert_eq!(y(&a), y(&s));
    assert!(x(&a) < x(&b), "spouse right of A");
    assert!(x(&b) < x(&s), "sibling after the couple");

    let edge = layout.edge(&married).unwrap();
    assert!(edge.same_rank);
    assert_eq!((edge.source_side, edge.target_side), (Side::Right, Side::Left));
    assert_eq!(edge.style.stroke_width, 3);
    assert!(!edge.style.has_arrow());
}

#[test]
fn parent_child_edge_attaches_vertically() {
    let model = GraphModel::from_json(FAMILY).unwrap();
    let layout = model.compute_layout(&LayoutOptions::default());
    let edge = layout.edge("r2").unwrap();
    assert!(!edge.same_rank);
    assert_eq!((edge.source_side, edge.target_side), (Side::Bottom, Side::Top));
    assert!(edge.style.has_arrow());
    assert!(edge.style.animated);
}

#[test]
fn cycles_terminate() {
    let model = GraphModel::from_parts(
        vec![
            person("A", Gender::Male).with_id("a"),
            person("B", Gender::Male).with_id("b"),
            person("C", Gender::Male).with_id("c"),
        ],
        vec![
            rel("a", "b", RelationshipKind::ParentChild),
            rel("b", "c", RelationshipKind::ParentChild),
            rel("c", "a", RelationshipKind::ParentChild),
            rel("a", "c", RelationshipKind::Married),
        ],
    );
    let layout = model.compute_layout(&LayoutOptions::default());
    assert_eq!(layout.nodes.len(), 3);
    assert!(layout.nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
    assert_eq!(layout.edges.len(), 4);
}

#[test]
fn dangling_edges_dropped() {
    let model = GraphModel::from_parts(
        vec![person("A", Gender::Male).with_id("a")],
        vec![
            rel("a", "ghost", RelationshipKind::ParentChild).with_id("r1"),
            rel("nobody", "a", RelationshipKind::Married).with_id("r2"),
        ],
    );
    let layout = model.compute_layout(&LayoutOptions::default());
    assert_eq!(layout.nodes.len(), 1);
    assert!(layout.edges.is_empty());
}

#[test]
fn left_right_swaps_axes() {
    let model = GraphModel::from_json(FAMILY).unwrap();
    let tb = model.compute_layout(&LayoutOptions::default());
    let lr = model.compute_layout(&LayoutOptions {
        direction: RankDir::LeftRight,
        ..LayoutOptions::default()
    });
    for id in ["1", "2", "3"] {
        assert_eq!(tb.node(id).unwrap().rank, lr.node(id).unwrap().rank);
    }
    assert!(lr.node("3").unwrap().x > lr.node("1").unwrap().x);
    assert_eq!(lr.node("1").unwrap().x, lr.node("2").unwrap().x);
    assert_eq!(
        (lr.edge("r2").unwrap().source_side, lr.edge("r2").unwrap().target_side),
        (Side::Right, Side::Left)
    );
}

/// Small deterministic generator so the property below covers many shapes.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

#[test]
fn minimum_separation_never_violated() {
    for seed in 1..=20u64 {
        let mut rng = Lcg(seed);
        let n = 4 + rng.next(10);
        let persons: Vec<Person> = (0..n)
            .map(|i| person(&format!("P{i}"), Gender::Male).with_id(format!("p{i}")))
            .collect();
        let mut relationships = Vec::new();
        for _ in 0..n + rng.next(n) {
            let a = rng.next(n);
            let b = rng.next(n);
            if a == b {
                continue;
            }
            let (lo, hi) = (a.min(b), a.max(b));
            let kind = match rng.next(3) {
                0 => RelationshipKind::Married,
                1 => RelationshipKind::Siblings,
                _ => RelationshipKind::ParentChild,
            };
            relationships.push(rel(&format!("p{lo}"), &format!("p{hi}"), kind));
        }
        let model = GraphModel::from_parts(persons, relationships);

        for ranker in [Ranker::NetworkSimplex, Ranker::TightTree, Ranker::LongestPath] {
            let options = LayoutOptions {
                ranker,
                ..LayoutOptions::default()
            };
            let layout = model.compute_layout(&options);
            for r in model.relationships() {
                if r.kind != RelationshipKind::ParentChild {
                    continue;
                }
                let p = layout.node(&r.from).unwrap();
                let c = layout.node(&r.to).unwrap();
                assert!(
                    c.rank >= p.rank + 2,
                    "seed {seed} {ranker:?}: {} rank {} vs {} rank {}",
                    r.from,
                    p.rank,
                    r.to,
                    c.rank
                );
            }
        }
    }
}

#[test]
fn preview_names_every_member() {
    let output = genogram::render(FAMILY).unwrap();
    for name in ["Grace", "Henry", "Iris"] {
        assert!(output.contains(name), "missing {name}:\n{output}");
    }
}
