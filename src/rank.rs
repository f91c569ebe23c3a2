//! Rank assignment: cycle removal, then longest-path, tight-tree or network
//! simplex ranking over each connected component.

use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};

use log::warn;

/// `rank(target) - rank(source) >= minlen`, with `weight` pulling the two
/// ranks together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraint {
    pub source: usize,
    pub target: usize,
    pub minlen: i32,
    pub weight: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ranker {
    #[default]
    NetworkSimplex,
    TightTree,
    LongestPath,
}

/// Reverse a greedy feedback arc set so the constraint graph is acyclic.
/// Self-loops must be filtered out beforehand. Returns how many constraints
/// were reversed.
pub fn make_acyclic(node_count: usize, constraints: &mut [Constraint]) -> usize {
    let position = greedy_order(node_count, constraints);
    let mut reversed = 0;
    for c in constraints.iter_mut() {
        if position[c.source] > position[c.target] {
            std::mem::swap(&mut c.source, &mut c.target);
            reversed += 1;
        }
    }
    reversed
}

/// Ranks for every node, starting at 0 in each connected component.
/// `constraints` must be acyclic (see [`make_acyclic`]).
pub fn assign_ranks(node_count: usize, constraints: &[Constraint], ranker: Ranker) -> Vec<usize> {
    let mut ranks = vec![0usize; node_count];

    for component in components(node_count, constraints) {
        let local: HashMap<usize, usize> = component
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();
        let edges = simplify(
            constraints
                .iter()
                .filter(|c| local.contains_key(&c.source))
                .map(|c| RankEdge {
                    v: local[&c.source],
                    w: local[&c.target],
                    minlen: c.minlen,
                    weight: c.weight,
                }),
        );
        let graph = RankGraph::new(component.len(), edges);

        let mut local_ranks = longest_path(&graph);
        match ranker {
            Ranker::LongestPath => {}
            Ranker::TightTree => {
                feasible_tree(&graph, &mut local_ranks);
            }
            Ranker::NetworkSimplex => network_simplex(&graph, &mut local_ranks),
        }

        let min = local_ranks.iter().copied().min().unwrap_or(0);
        for (i, &v) in component.iter().enumerate() {
            ranks[v] = (local_ranks[i] - min) as usize;
        }
    }

    ranks
}

/// Eades–Lin–Smyth: peel sinks to the right, sources to the left, otherwise
/// the node with the largest outgoing-minus-incoming weight. Ties go to the
/// lowest index.
fn greedy_order(node_count: usize, constraints: &[Constraint]) -> Vec<usize> {
    let mut state = PeelState::new(node_count, constraints);
    let mut left = Vec::with_capacity(node_count);
    let mut right = Vec::new();

    while state.remaining > 0 {
        loop {
            if let Some(v) = state.find(|s, v| s.out_deg[v] == 0) {
                right.push(v);
                state.remove(v, constraints);
            } else if let Some(v) = state.find(|s, v| s.in_deg[v] == 0) {
                left.push(v);
                state.remove(v, constraints);
            } else {
                break;
            }
        }
        let pick = (0..node_count)
            .filter(|&v| !state.removed[v])
            .max_by_key(|&v| (state.out_w[v] - state.in_w[v], Reverse(v)));
        if let Some(v) = pick {
            left.push(v);
            state.remove(v, constraints);
        }
    }

    let mut position = vec![0; node_count];
    for (i, &v) in left.iter().chain(right.iter().rev()).enumerate() {
        position[v] = i;
    }
    position
}

struct PeelState {
    out_edges: Vec<Vec<usize>>,
    in_edges: Vec<Vec<usize>>,
    out_deg: Vec<usize>,
    in_deg: Vec<usize>,
    out_w: Vec<i64>,
    in_w: Vec<i64>,
    removed: Vec<bool>,
    remaining: usize,
}

impl PeelState {
    fn new(node_count: usize, constraints: &[Constraint]) -> Self {
        let mut state = Self {
            out_edges: vec![Vec::new(); node_count],
            in_edges: vec![Vec::new(); node_count],
            out_deg: vec![0; node_count],
            in_deg: vec![0; node_count],
            out_w: vec![0; node_count],
            in_w: vec![0; node_count],
            removed: vec![false; node_count],
            remaining: node_count,
        };
        for (i, c) in constraints.iter().enumerate() {
            state.out_edges[c.source].push(i);
            state.in_edges[c.target].push(i);
            state.out_deg[c.source] += 1;
            state.in_deg[c.target] += 1;
            state.out_w[c.source] += i64::from(c.weight);
            state.in_w[c.target] += i64::from(c.weight);
        }
        state
    }

    fn find(&self, pred: impl Fn(&Self, usize) -> bool) -> Option<usize> {
        (0..self.removed.len()).find(|&v| !self.removed[v] && pred(self, v))
    }

    fn remove(&mut self, v: usize, constraints: &[Constraint]) {
        self.removed[v] = true;
        self.remaining -= 1;
        for &i in &self.out_edges[v] {
            let c = constraints[i];
            if !self.removed[c.target] {
                self.in_deg[c.target] -= 1;
                self.in_w[c.target] -= i64::from(c.weight);
            }
        }
        for &i in &self.in_edges[v] {
            let c = constraints[i];
            if !self.removed[c.source] {
                self.out_deg[c.source] -= 1;
                self.out_w[c.source] -= i64::from(c.weight);
            }
        }
    }
}

/// Weakly connected components, each sorted ascending, ordered by their
/// smallest node.
fn components(node_count: usize, constraints: &[Constraint]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..node_count).collect();

    fn find(parent: &mut [usize], mut v: usize) -> usize {
        while parent[v] != v {
            parent[v] = parent[parent[v]];
            v = parent[v];
        }
        v
    }

    for c in constraints {
        let a = find(&mut parent, c.source);
        let b = find(&mut parent, c.target);
        if a != b {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            parent[hi] = lo;
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    for v in 0..node_count {
        let root = find(&mut parent, v);
        let idx = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[idx].push(v);
    }
    groups
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RankEdge {
    v: usize,
    w: usize,
    minlen: i32,
    weight: i32,
}

/// Merge parallel edges: weights add up, the largest minlen wins.
fn simplify(edges: impl Iterator<Item = RankEdge>) -> Vec<RankEdge> {
    let mut merged: Vec<RankEdge> = Vec::new();
    let mut seen: HashMap<(usize, usize), usize> = HashMap::new();
    for e in edges {
        match seen.get(&(e.v, e.w)) {
            Some(&i) => {
                merged[i].weight += e.weight;
                merged[i].minlen = merged[i].minlen.max(e.minlen);
            }
            None => {
                seen.insert((e.v, e.w), merged.len());
                merged.push(e);
            }
        }
    }
    merged
}

struct RankGraph {
    edges: Vec<RankEdge>,
    incident: Vec<Vec<usize>>,
}

impl RankGraph {
    fn new(node_count: usize, edges: Vec<RankEdge>) -> Self {
        let mut incident = vec![Vec::new(); node_count];
        for (i, e) in edges.iter().enumerate() {
            incident[e.v].push(i);
            incident[e.w].push(i);
        }
        Self { edges, incident }
    }

    fn node_count(&self) -> usize {
        self.incident.len()
    }

    fn slack(&self, e: usize, ranks: &[i32]) -> i32 {
        let edge = self.edges[e];
        ranks[edge.w] - ranks[edge.v] - edge.minlen
    }

    fn other_end(&self, e: usize, v: usize) -> usize {
        let edge = self.edges[e];
        if edge.v == v { edge.w } else { edge.v }
    }
}

/// Sinks get rank 0, every other node sits as low as its successors allow.
fn longest_path(graph: &RankGraph) -> Vec<i32> {
    let n = graph.node_count();
    let mut in_deg = vec![0usize; n];
    for e in &graph.edges {
        in_deg[e.w] += 1;
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&v| in_deg[v] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(v) = queue.pop_front() {
        order.push(v);
        for &e in &graph.incident[v] {
            let edge = graph.edges[e];
            if edge.v == v {
                in_deg[edge.w] -= 1;
                if in_deg[edge.w] == 0 {
                    queue.push_back(edge.w);
                }
            }
        }
    }
    debug_assert_eq!(order.len(), n, "rank graph must be acyclic");

    let mut ranks = vec![0i32; n];
    for &v in order.iter().rev() {
        ranks[v] = graph.incident[v]
            .iter()
            .map(|&e| graph.edges[e])
            .filter(|edge| edge.v == v)
            .map(|edge| ranks[edge.w] - edge.minlen)
            .min()
            .unwrap_or(0);
    }
    ranks
}

/// Grow a spanning tree of tight edges from node 0, shifting the tree's ranks
/// by the smallest slack whenever it stops growing. Returns the tree edges in
/// the order they were added.
fn feasible_tree(graph: &RankGraph, ranks: &mut [i32]) -> Vec<usize> {
    let n = graph.node_count();
    let mut tree = Vec::with_capacity(n.saturating_sub(1));
    if n == 0 {
        return tree;
    }
    let mut in_tree = vec![false; n];
    in_tree[0] = true;

    loop {
        if grow_tight_tree(graph, ranks, &mut in_tree, &mut tree) >= n {
            break;
        }
        let candidate = (0..graph.edges.len())
            .filter(|&e| in_tree[graph.edges[e].v] != in_tree[graph.edges[e].w])
            .min_by_key(|&e| graph.slack(e, ranks));
        let Some(e) = candidate else {
            break;
        };
        let slack = graph.slack(e, ranks);
        let delta = if in_tree[graph.edges[e].v] { slack } else { -slack };
        for v in 0..n {
            if in_tree[v] {
                ranks[v] += delta;
            }
        }
    }
    tree
}

fn grow_tight_tree(
    graph: &RankGraph,
    ranks: &[i32],
    in_tree: &mut [bool],
    tree: &mut Vec<usize>,
) -> usize {
    let mut stack: Vec<usize> = (0..in_tree.len()).filter(|&v| in_tree[v]).rev().collect();
    while let Some(v) = stack.pop() {
        for &e in &graph.incident[v] {
            let w = graph.other_end(e, v);
            if !in_tree[w] && graph.slack(e, ranks) == 0 {
                in_tree[w] = true;
                tree.push(e);
                stack.push(w);
            }
        }
    }
    in_tree.iter().filter(|&&t| t).count()
}

fn network_simplex(graph: &RankGraph, ranks: &mut [i32]) {
    let n = graph.node_count();
    let tree_edges = feasible_tree(graph, ranks);
    if n < 2 || tree_edges.len() + 1 < n {
        return;
    }

    let mut tree = SpanningTree::new(graph, tree_edges);
    let limit = 10 * (n + graph.edges.len()) + 100;
    let mut iterations = 0;
    while let Some(leaving) = tree.leave_edge() {
        if iterations >= limit {
            warn!("network simplex stopped after {iterations} exchanges");
            break;
        }
        let Some(entering) = tree.enter_edge(graph, ranks, leaving) else {
            break;
        };
        tree.exchange(graph, ranks, leaving, entering);
        iterations += 1;
    }
}

/// Spanning tree rooted at node 0 with postorder `low`/`lim` numbering and
/// per-edge cut values.
struct SpanningTree {
    edges: Vec<usize>,
    in_tree: Vec<bool>,
    cut: Vec<i64>,
    parent_edge: Vec<Option<usize>>,
    low: Vec<usize>,
    lim: Vec<usize>,
    preorder: Vec<usize>,
    postorder: Vec<usize>,
}

impl SpanningTree {
    fn new(graph: &RankGraph, edges: Vec<usize>) -> Self {
        let n = graph.node_count();
        let mut in_tree = vec![false; graph.edges.len()];
        for &e in &edges {
            in_tree[e] = true;
        }
        let mut tree = Self {
            edges,
            in_tree,
            cut: vec![0; graph.edges.len()],
            parent_edge: vec![None; n],
            low: vec![0; n],
            lim: vec![0; n],
            preorder: Vec::with_capacity(n),
            postorder: Vec::with_capacity(n),
        };
        tree.relabel(graph);
        tree
    }

    fn relabel(&mut self, graph: &RankGraph) {
        self.init_low_lim(graph);
        self.init_cut_values(graph);
    }

    fn init_low_lim(&mut self, graph: &RankGraph) {
        let n = graph.node_count();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for &e in &self.edges {
            let edge = graph.edges[e];
            adjacency[edge.v].push(e);
            adjacency[edge.w].push(e);
        }

        let mut visited = vec![false; n];
        self.preorder.clear();
        self.postorder.clear();
        self.parent_edge[0] = None;

        let mut next_lim = 1;
        let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
        visited[0] = true;
        self.low[0] = next_lim;
        self.preorder.push(0);

        while let Some(top) = stack.last_mut() {
            let (v, i) = *top;
            if i < adjacency[v].len() {
                top.1 += 1;
                let e = adjacency[v][i];
                let w = graph.other_end(e, v);
                if !visited[w] {
                    visited[w] = true;
                    self.low[w] = next_lim;
                    self.parent_edge[w] = Some(e);
                    self.preorder.push(w);
                    stack.push((w, 0));
                }
            } else {
                self.lim[v] = next_lim;
                next_lim += 1;
                self.postorder.push(v);
                stack.pop();
            }
        }
    }

    fn init_cut_values(&mut self, graph: &RankGraph) {
        for i in 0..self.postorder.len() {
            let v = self.postorder[i];
            if let Some(e) = self.parent_edge[v] {
                self.cut[e] = self.cut_value(graph, v, e);
            }
        }
    }

    /// Cut value of the tree edge joining `child` to its parent. Children of
    /// `child` must already carry their cut values.
    fn cut_value(&self, graph: &RankGraph, child: usize, tree_edge: usize) -> i64 {
        let te = graph.edges[tree_edge];
        let child_is_tail = te.v == child;
        let parent = if child_is_tail { te.w } else { te.v };
        let mut cut = i64::from(te.weight);

        for &e in &graph.incident[child] {
            if e == tree_edge {
                continue;
            }
            let edge = graph.edges[e];
            let is_out = edge.v == child;
            let other = if is_out { edge.w } else { edge.v };
            if other == parent {
                continue;
            }
            let points_to_head = is_out == child_is_tail;
            let weight = i64::from(edge.weight);
            cut += if points_to_head { weight } else { -weight };
            if self.in_tree[e] {
                let other_cut = self.cut[e];
                cut += if points_to_head { -other_cut } else { other_cut };
            }
        }
        cut
    }

    fn leave_edge(&self) -> Option<usize> {
        self.edges.iter().copied().find(|&e| self.cut[e] < 0)
    }

    fn is_descendant(&self, v: usize, root: usize) -> bool {
        self.low[root] <= self.lim[v] && self.lim[v] <= self.lim[root]
    }

    fn enter_edge(&self, graph: &RankGraph, ranks: &[i32], leaving: usize) -> Option<usize> {
        let edge = graph.edges[leaving];
        let (tail, flip) = if self.lim[edge.v] > self.lim[edge.w] {
            (edge.w, true)
        } else {
            (edge.v, false)
        };

        (0..graph.edges.len())
            .filter(|&f| {
                let candidate = graph.edges[f];
                flip == self.is_descendant(candidate.v, tail)
                    && flip != self.is_descendant(candidate.w, tail)
            })
            .min_by_key(|&f| graph.slack(f, ranks))
    }

    fn exchange(&mut self, graph: &RankGraph, ranks: &mut [i32], leaving: usize, entering: usize) {
        if let Some(slot) = self.edges.iter_mut().find(|e| **e == leaving) {
            *slot = entering;
        }
        self.in_tree[leaving] = false;
        self.in_tree[entering] = true;
        self.relabel(graph);

        for i in 1..self.preorder.len() {
            let v = self.preorder[i];
            let Some(e) = self.parent_edge[v] else {
                continue;
            };
            let edge = graph.edges[e];
            ranks[v] = if edge.v == v {
                ranks[edge.w] - edge.minlen
            } else {
                ranks[edge.v] + edge.minlen
            };
        }
    }
}
