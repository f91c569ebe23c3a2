use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::edge_style::{self, EdgeStyle};
use crate::order;
use crate::rank::{self, Constraint, Ranker};
use crate::types::{Gender, Person, Relationship, RelationshipKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RankDir {
    #[default]
    #[serde(rename = "TB")]
    TopBottom,
    #[serde(rename = "BT")]
    BottomTop,
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "RL")]
    RightLeft,
}

impl RankDir {
    /// Ranks advance along x instead of y.
    pub fn is_horizontal(self) -> bool {
        matches!(self, RankDir::LeftRight | RankDir::RightLeft)
    }

    fn is_reversed(self) -> bool {
        matches!(self, RankDir::BottomTop | RankDir::RightLeft)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub direction: RankDir,
    /// Gap between neighbours within a rank.
    pub node_sep: f64,
    /// Gap between consecutive ranks.
    pub rank_sep: f64,
    pub node_width: f64,
    pub node_height: f64,
    pub ranker: Ranker,
    /// Edges whose endpoints differ by less than this along the rank axis
    /// are drawn as same-rank edges.
    pub same_rank_threshold: f64,
    pub order_sweeps: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: RankDir::TopBottom,
            node_sep: 100.0,
            rank_sep: 120.0,
            node_width: 120.0,
            node_height: 100.0,
            ranker: Ranker::NetworkSimplex,
            same_rank_threshold: 50.0,
            order_sweeps: 8,
        }
    }
}

const PARENT_CHILD_MINLEN: i32 = 2;
const PARENT_CHILD_WEIGHT: i32 = 2;
// Partners sit one slot apart within a rank, not one rank apart.
const PARTNER_MINLEN: i32 = 0;
const PARTNER_WEIGHT: i32 = 1;

/// `(minlen, weight)` of the rank constraint for a relationship kind.
pub fn rank_constraint(kind: &RelationshipKind) -> (i32, i32) {
    if kind.is_cross_rank() {
        (PARENT_CHILD_MINLEN, PARENT_CHILD_WEIGHT)
    } else {
        (PARTNER_MINLEN, PARTNER_WEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    Square,
    Circle,
    Diamond,
}

impl From<Gender> for NodeShape {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => NodeShape::Square,
            Gender::Female => NodeShape::Circle,
            Gender::Other => NodeShape::Diamond,
        }
    }
}

/// What a node shows: the member's name, years and conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub name: String,
    pub shape: NodeShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    pub deceased: bool,
}

impl NodeData {
    pub fn from_person(person: &Person) -> Self {
        Self {
            name: person.name.clone(),
            shape: NodeShape::from(person.gender),
            years: person.years_label(),
            conditions: person.conditions_summary(),
            deceased: person.deceased,
        }
    }

    pub fn label_lines(&self) -> Vec<&str> {
        let mut lines = vec![self.name.as_str()];
        lines.extend(self.years.as_deref());
        lines.extend(self.conditions.as_deref());
        lines
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub data: NodeData,
}

impl NodeSpec {
    /// A bare node labelled with its id.
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        let id = id.into();
        Self {
            data: NodeData {
                name: id.clone(),
                shape: NodeShape::Square,
                years: None,
                conditions: None,
                deceased: false,
            },
            id,
            width,
            height,
        }
    }

    pub fn from_person(person: &Person, options: &LayoutOptions) -> Self {
        Self {
            id: person.id.clone(),
            width: options.node_width,
            height: options.node_height,
            data: NodeData::from_person(person),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

impl EdgeSpec {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: RelationshipKind) -> Self {
        Self {
            id: String::new(),
            source: source.into(),
            target: target.into(),
            kind,
            source_handle: None,
            target_handle: None,
        }
    }

    /// Relationships without an id are named after their position.
    pub fn from_relationship(rel: &Relationship, index: usize) -> Self {
        let id = if rel.id.is_empty() {
            format!("edge-{index}")
        } else {
            rel.id.clone()
        };
        Self {
            id,
            source: rel.from.clone(),
            target: rel.to.clone(),
            kind: rel.kind.clone(),
            source_handle: rel.source_handle.clone(),
            target_handle: rel.target_handle.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLayout {
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub width: f64,
    pub height: f64,
    pub direction: RankDir,
}

impl GraphLayout {
    pub fn empty(direction: RankDir) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            width: 0.0,
            height: 0.0,
            direction,
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&EdgeLayout> {
        self.edges.iter().find(|e| e.id == id)
    }
}

/// A positioned node. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLayout {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub rank: usize,
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeLayout {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub same_rank: bool,
    pub source_side: Side,
    pub target_side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    pub style: EdgeStyle,
}

struct ResolvedEdge<'a> {
    spec: &'a EdgeSpec,
    source: usize,
    target: usize,
}

pub fn compute_layout(nodes: &[NodeSpec], edges: &[EdgeSpec], options: &LayoutOptions) -> GraphLayout {
    if nodes.is_empty() {
        return GraphLayout::empty(options.direction);
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        index.entry(node.id.as_str()).or_insert(i);
    }

    let resolved: Vec<ResolvedEdge> = edges
        .iter()
        .filter_map(|spec| {
            match (index.get(spec.source.as_str()), index.get(spec.target.as_str())) {
                (Some(&source), Some(&target)) => Some(ResolvedEdge {
                    spec,
                    source,
                    target,
                }),
                _ => {
                    debug!(
                        "dropping edge {} with unknown endpoint ({} -> {})",
                        spec.id, spec.source, spec.target
                    );
                    None
                }
            }
        })
        .collect();

    // Self-loops stay in the output but never constrain ranks.
    let mut constraints: Vec<Constraint> = resolved
        .iter()
        .filter(|e| e.source != e.target)
        .map(|e| {
            let (minlen, weight) = rank_constraint(&e.spec.kind);
            Constraint {
                source: e.source,
                target: e.target,
                minlen,
                weight,
            }
        })
        .collect();
    let reversed = rank::make_acyclic(nodes.len(), &mut constraints);
    let ranks = rank::assign_ranks(nodes.len(), &constraints, options.ranker);

    let links: Vec<(usize, usize)> = constraints.iter().map(|c| (c.source, c.target)).collect();
    let layers = order::order_layers(&ranks, &links, options.order_sweeps);

    let placement = place_nodes(nodes, &layers, options);
    let node_layouts: Vec<NodeLayout> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let (center_x, center_y) = placement.centers[i];
            NodeLayout {
                id: node.id.clone(),
                x: center_x - node.width / 2.0,
                y: center_y - node.height / 2.0,
                width: node.width,
                height: node.height,
                center_x,
                center_y,
                rank: ranks[i],
                data: node.data.clone(),
            }
        })
        .collect();

    let edge_layouts: Vec<EdgeLayout> = resolved
        .iter()
        .map(|e| layout_edge(e, &node_layouts, options))
        .collect();

    debug!(
        "laid out {} nodes on {} ranks, {} edges ({} reversed to break cycles)",
        node_layouts.len(),
        layers.len(),
        edge_layouts.len(),
        reversed
    );

    GraphLayout {
        nodes: node_layouts,
        edges: edge_layouts,
        width: placement.width,
        height: placement.height,
        direction: options.direction,
    }
}

struct Placement {
    centers: Vec<(f64, f64)>,
    width: f64,
    height: f64,
}

/// Each rank becomes a row (a column for LR/RL) centred on the widest one.
/// A rank is as deep as its deepest node; ranks holding only long-edge
/// dummies have depth zero but keep their separation.
fn place_nodes(nodes: &[NodeSpec], layers: &order::Layers, options: &LayoutOptions) -> Placement {
    let horizontal = options.direction.is_horizontal();
    let depth = |n: &NodeSpec| if horizontal { n.width } else { n.height };
    let breadth = |n: &NodeSpec| if horizontal { n.height } else { n.width };

    let rank_depths: Vec<f64> = layers
        .iter()
        .map(|layer| layer.iter().map(|&v| depth(&nodes[v])).fold(0.0, f64::max))
        .collect();
    let row_breadths: Vec<f64> = layers
        .iter()
        .map(|layer| {
            let total: f64 = layer.iter().map(|&v| breadth(&nodes[v])).sum();
            total + layer.len().saturating_sub(1) as f64 * options.node_sep
        })
        .collect();
    let max_breadth = row_breadths.iter().copied().fold(0.0, f64::max);

    let mut along: Vec<(f64, f64)> = vec![(0.0, 0.0); nodes.len()];
    let mut offset = 0.0;
    for (r, layer) in layers.iter().enumerate() {
        let mid = offset + rank_depths[r] / 2.0;
        let mut cursor = (max_breadth - row_breadths[r]) / 2.0;
        for &v in layer {
            let b = breadth(&nodes[v]);
            along[v] = (cursor + b / 2.0, mid);
            cursor += b + options.node_sep;
        }
        offset += rank_depths[r];
        if r + 1 < layers.len() {
            offset += options.rank_sep;
        }
    }
    let total_depth = offset;

    let centers = along
        .into_iter()
        .map(|(across, mut down)| {
            if options.direction.is_reversed() {
                down = total_depth - down;
            }
            if horizontal { (down, across) } else { (across, down) }
        })
        .collect();

    let (width, height) = if horizontal {
        (total_depth, max_breadth)
    } else {
        (max_breadth, total_depth)
    };
    Placement {
        centers,
        width,
        height,
    }
}

fn layout_edge(edge: &ResolvedEdge, nodes: &[NodeLayout], options: &LayoutOptions) -> EdgeLayout {
    let source = &nodes[edge.source];
    let target = &nodes[edge.target];
    let dx = target.center_x - source.center_x;
    let dy = target.center_y - source.center_y;
    let rank_delta = if options.direction.is_horizontal() { dx } else { dy };
    let same_rank = rank_delta.abs() < options.same_rank_threshold;
    let (source_side, target_side) = attachment_sides(options.direction, same_rank, dx, dy);

    EdgeLayout {
        id: edge.spec.id.clone(),
        source: edge.spec.source.clone(),
        target: edge.spec.target.clone(),
        kind: edge.spec.kind.clone(),
        same_rank,
        source_side,
        target_side,
        source_handle: edge.spec.source_handle.clone(),
        target_handle: edge.spec.target_handle.clone(),
        style: edge_style::resolve(&edge.spec.kind, same_rank),
    }
}

/// Same-rank edges attach across the rank (left/right in TB), the rest
/// along it (top/bottom in TB), each side facing the other node.
fn attachment_sides(direction: RankDir, same_rank: bool, dx: f64, dy: f64) -> (Side, Side) {
    let along_x = direction.is_horizontal() != same_rank;
    if along_x {
        if dx >= 0.0 {
            (Side::Right, Side::Left)
        } else {
            (Side::Left, Side::Right)
        }
    } else if dy >= 0.0 {
        (Side::Bottom, Side::Top)
    } else {
        (Side::Top, Side::Bottom)
    }
}
