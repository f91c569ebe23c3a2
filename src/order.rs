//! Within-rank ordering: dummy nodes for long edges, a DFS initial order,
//! then barycenter sweeps that keep the order with the fewest crossings.

/// One row per rank, left to right, holding the real nodes only.
pub type Layers = Vec<Vec<usize>>;

/// Order the real nodes `0..ranks.len()` within their ranks.
///
/// `links` are `(source, target)` pairs with `ranks[source] <= ranks[target]`.
/// Same-rank links mark partners that should sit next to each other.
pub fn order_layers(ranks: &[usize], links: &[(usize, usize)], sweeps: usize) -> Layers {
    let real_count = ranks.len();
    if real_count == 0 {
        return Vec::new();
    }
    let graph = LayeredGraph::build(ranks, links);

    let mut layers = graph.initial_order();
    let mut positions = graph.positions(&layers);
    let mut best = layers.clone();
    let mut best_score = graph.score(&layers, &positions);

    for sweep in 0..sweeps {
        if best_score == (0, 0) {
            break;
        }
        if sweep % 2 == 0 {
            for r in 1..layers.len() {
                graph.reorder(&mut layers[r], &graph.up, &mut positions);
            }
        } else {
            for r in (0..layers.len().saturating_sub(1)).rev() {
                graph.reorder(&mut layers[r], &graph.down, &mut positions);
            }
        }
        let score = graph.score(&layers, &positions);
        if score < best_score {
            best_score = score;
            best = layers.clone();
        }
    }

    best.into_iter()
        .map(|layer| layer.into_iter().filter(|&v| v < real_count).collect())
        .collect()
}

/// Real nodes plus a chain of dummies for every link spanning more than one
/// rank, so adjacent layers are only ever joined by unit-span segments.
struct LayeredGraph {
    rank: Vec<usize>,
    real_count: usize,
    up: Vec<Vec<usize>>,
    down: Vec<Vec<usize>>,
    partners: Vec<Vec<usize>>,
    partner_pairs: Vec<(usize, usize)>,
}

impl LayeredGraph {
    fn build(ranks: &[usize], links: &[(usize, usize)]) -> Self {
        let real_count = ranks.len();
        let mut graph = Self {
            rank: ranks.to_vec(),
            real_count,
            up: vec![Vec::new(); real_count],
            down: vec![Vec::new(); real_count],
            partners: vec![Vec::new(); real_count],
            partner_pairs: Vec::new(),
        };

        for &(source, target) in links {
            let (from_rank, to_rank) = (ranks[source], ranks[target]);
            if from_rank == to_rank {
                if source != target {
                    graph.partners[source].push(target);
                    graph.partners[target].push(source);
                    graph.partner_pairs.push((source, target));
                }
                continue;
            }
            let mut prev = source;
            for r in from_rank + 1..to_rank {
                let dummy = graph.add_dummy(r);
                graph.connect(prev, dummy);
                prev = dummy;
            }
            graph.connect(prev, target);
        }
        graph
    }

    fn add_dummy(&mut self, rank: usize) -> usize {
        self.rank.push(rank);
        self.up.push(Vec::new());
        self.down.push(Vec::new());
        self.partners.push(Vec::new());
        self.rank.len() - 1
    }

    fn connect(&mut self, upper: usize, lower: usize) {
        self.down[upper].push(lower);
        self.up[lower].push(upper);
    }

    fn layer_count(&self) -> usize {
        self.rank.iter().copied().max().map_or(0, |r| r + 1)
    }

    /// Depth-first from the real nodes taken by rank, then input order.
    fn initial_order(&self) -> Vec<Vec<usize>> {
        let mut layers = vec![Vec::new(); self.layer_count()];
        let mut visited = vec![false; self.rank.len()];

        let mut starts: Vec<usize> = (0..self.real_count).collect();
        starts.sort_by_key(|&v| self.rank[v]);

        for start in starts {
            let mut stack = vec![start];
            while let Some(v) = stack.pop() {
                if visited[v] {
                    continue;
                }
                visited[v] = true;
                layers[self.rank[v]].push(v);
                stack.extend(self.down[v].iter().rev().filter(|&&w| !visited[w]));
            }
        }
        layers
    }

    fn positions(&self, layers: &[Vec<usize>]) -> Vec<usize> {
        let mut positions = vec![0; self.rank.len()];
        for layer in layers {
            for (i, &v) in layer.iter().enumerate() {
                positions[v] = i;
            }
        }
        positions
    }

    /// Stable sort of one layer by the mean position of each node's
    /// neighbours in the adjacent layer. A node without neighbours follows
    /// a same-rank partner if it has one, otherwise it keeps its index.
    fn reorder(&self, layer: &mut Vec<usize>, neighbours: &[Vec<usize>], positions: &mut [usize]) {
        let barycenters: Vec<Option<f64>> = layer
            .iter()
            .map(|&v| {
                let adjacent = &neighbours[v];
                if adjacent.is_empty() {
                    return None;
                }
                let sum: usize = adjacent.iter().map(|&w| positions[w]).sum();
                Some(sum as f64 / adjacent.len() as f64)
            })
            .collect();

        let mut keyed: Vec<(f64, usize)> = layer
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let key = barycenters[i].or_else(|| {
                    self.partners[v].iter().find_map(|p| {
                        layer
                            .iter()
                            .position(|w| w == p)
                            .and_then(|j| barycenters[j])
                    })
                });
                (key.unwrap_or(i as f64), v)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (i, (_, v)) in keyed.into_iter().enumerate() {
            layer[i] = v;
            positions[v] = i;
        }
    }

    /// `(crossings, partner gap)`, compared lexicographically.
    fn score(&self, layers: &[Vec<usize>], positions: &[usize]) -> (usize, usize) {
        let crossings = layers
            .windows(2)
            .map(|pair| self.crossings_between(&pair[0], positions))
            .sum();
        let gap = self
            .partner_pairs
            .iter()
            .map(|&(a, b)| positions[a].abs_diff(positions[b]).saturating_sub(1))
            .sum();
        (crossings, gap)
    }

    fn crossings_between(&self, upper: &[usize], positions: &[usize]) -> usize {
        let segments: Vec<(usize, usize)> = upper
            .iter()
            .flat_map(|&u| self.down[u].iter().map(move |&w| (u, w)))
            .map(|(u, w)| (positions[u], positions[w]))
            .collect();

        let mut count = 0;
        for (i, &(a1, b1)) in segments.iter().enumerate() {
            for &(a2, b2) in &segments[i + 1..] {
                if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                    count += 1;
                }
            }
        }
        count
    }
}
