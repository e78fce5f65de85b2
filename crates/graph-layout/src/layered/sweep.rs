//! Layer sweep crossing minimization
//!
//! Every sweep walks the layers downwards or upwards. The layer already
//! visited is the fixed one: its opening dummies (P when going down, Q when
//! going up) are folded into the segment containers, then the vertices of the
//! free layer are sorted by the mean slot of their fixed neighbours and merged
//! with those containers. The closing dummies of the free layer are put where
//! their segment runs. Ties are then explored, adjacent vertices transposed,
//! and the result is counted with [`bilayer_cross_count`].
//!
//! The strict phase keeps a layer, and then a whole sweep, only when it does
//! not add crossings. The dirty phase accepts everything so that the strict
//! phase can restart from a different ordering. The best ordering ever seen
//! is the one kept.

use super::alternating::{AlternatingLayer, LayerItem, SegmentContainer, Slots};
use super::compaction::CompactionGraph;
use super::crossings::{bilayer_cross_count, layer_edges, segment_conflicts};
use super::graph::{DecoratedGraph, Segment, VertexId, VertexKind};
use super::LayeredLayoutError;
use crate::cancel::CancelToken;
use petgraph::Direction;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, trace};

/// Tie groups up to this size get all their permutations tried
const EXHAUSTIVE_TIE_SIZE: usize = 4;

const TRANSPOSE_ROUNDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SweepDirection {
    Down,
    Up,
}

impl SweepDirection {
    /// Direction of the edges leading from a free vertex to the fixed layer
    pub fn towards_fixed(self) -> Direction {
        match self {
            Self::Down => Direction::Incoming,
            Self::Up => Direction::Outgoing,
        }
    }

    /// Kind of the dummies replaced by their segment in the fixed layer
    pub fn opening(self) -> VertexKind {
        match self {
            Self::Down => VertexKind::P,
            Self::Up => VertexKind::Q,
        }
    }

    /// Kind of the dummies ending a segment in the free layer
    pub fn closing(self) -> VertexKind {
        match self {
            Self::Down => VertexKind::Q,
            Self::Up => VertexKind::P,
        }
    }

    pub fn closing_vertex(self, segment: &Segment) -> VertexId {
        match self {
            Self::Down => segment.q,
            Self::Up => segment.p,
        }
    }

    fn fixed_layer(self, free: usize) -> usize {
        match self {
            Self::Down => free - 1,
            Self::Up => free + 1,
        }
    }

    fn free_layers(self, count: usize) -> Vec<usize> {
        match self {
            Self::Down => (1..count).collect(),
            Self::Up => (0..count.saturating_sub(1)).rev().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// First sweep, builds the containers and accepts every layer
    Initial,
    Strict,
    Dirty,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SweepBudget {
    pub max_permutations: usize,
    pub max_strict_rounds: usize,
    pub max_dirty_rounds: usize,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct MinimizedOrder {
    pub crossings: u64,
    pub segment_conflicts: usize,
    pub compaction: CompactionGraph,
}

/// Reorder the layers of the proper graph `dg` in place
pub(crate) fn minimize_crossings(
    dg: &mut DecoratedGraph,
    budget: SweepBudget,
    cancel: &CancelToken,
) -> Result<MinimizedOrder, LayeredLayoutError> {
    let mut minimizer = CrossingMinimizer::new(dg, budget, cancel);
    minimizer.run()?;
    let segment_conflicts = minimizer.mark_segment_conflicts();
    debug!(
        "Compaction graph holds {} left-of relations",
        minimizer.compaction.relation_count()
    );

    Ok(MinimizedOrder {
        crossings: minimizer.crossings,
        segment_conflicts,
        compaction: minimizer.compaction,
    })
}

#[derive(Debug, Clone)]
struct Snapshot {
    layers: Vec<Vec<VertexId>>,
    alternating: Vec<AlternatingLayer>,
    crossings: u64,
}

struct CrossingMinimizer<'a> {
    dg: &'a mut DecoratedGraph,
    alternating: Vec<AlternatingLayer>,
    compaction: CompactionGraph,
    crossings: u64,
    budget: SweepBudget,
    rng: StdRng,
    cancel: &'a CancelToken,
}

impl<'a> CrossingMinimizer<'a> {
    fn new(dg: &'a mut DecoratedGraph, budget: SweepBudget, cancel: &'a CancelToken) -> Self {
        let alternating = dg
            .layers
            .iter()
            .map(|layer| AlternatingLayer::from_vertices(layer))
            .collect();

        Self {
            dg,
            alternating,
            compaction: CompactionGraph::default(),
            crossings: 0,
            budget,
            rng: StdRng::seed_from_u64(budget.seed),
            cancel,
        }
    }

    fn run(&mut self) -> Result<(), LayeredLayoutError> {
        self.rebuild_compaction();
        if self.alternating.len() < 2 {
            return Ok(());
        }

        self.sweep(SweepDirection::Down, Phase::Initial)?;
        self.crossings = self.total_crossings();
        debug!("Initial sweep leaves {} crossings", self.crossings);
        let mut best = self.snapshot();

        self.strict_rounds(&mut best)?;
        let mut dirty_rounds = 0;
        while best.crossings > 0 && dirty_rounds < self.budget.max_dirty_rounds {
            let before = best.crossings;

            self.sweep(SweepDirection::Up, Phase::Dirty)?;
            self.sweep(SweepDirection::Down, Phase::Dirty)?;
            dirty_rounds += 1;
            self.crossings = self.total_crossings();
            debug!("Dirty round {dirty_rounds} leaves {} crossings", self.crossings);
            self.keep_best(&mut best);

            self.strict_rounds(&mut best)?;
            if best.crossings >= before {
                break;
            }
        }

        self.restore(best);
        debug!("Crossing minimization ends with {} crossings", self.crossings);
        Ok(())
    }

    fn strict_rounds(&mut self, best: &mut Snapshot) -> Result<(), LayeredLayoutError> {
        for round in 0..self.budget.max_strict_rounds {
            if self.crossings == 0 {
                break;
            }
            let before = self.crossings;
            self.strict_sweep(SweepDirection::Up)?;
            self.strict_sweep(SweepDirection::Down)?;
            trace!("Strict round {round}: {before} -> {} crossings", self.crossings);
            self.keep_best(best);
            if self.crossings >= before {
                break;
            }
        }
        Ok(())
    }

    /// Sweep and roll back if the drawing got worse
    fn strict_sweep(&mut self, direction: SweepDirection) -> Result<(), LayeredLayoutError> {
        let before = self.snapshot();
        self.sweep(direction, Phase::Strict)?;
        let after = self.total_crossings();
        if after > before.crossings {
            trace!("Rolling back {direction:?} sweep ({after} > {})", before.crossings);
            self.restore(before);
        } else {
            self.crossings = after;
        }
        Ok(())
    }

    fn sweep(&mut self, direction: SweepDirection, phase: Phase) -> Result<(), LayeredLayoutError> {
        for free in direction.free_layers(self.alternating.len()) {
            self.cancel.check()?;
            self.sweep_layer(free, direction, phase)?;
        }
        Ok(())
    }

    fn sweep_layer(
        &mut self,
        free: usize,
        direction: SweepDirection,
        phase: Phase,
    ) -> Result<(), LayeredLayoutError> {
        let fixed = self
            .project(&self.alternating[direction.fixed_layer(free)], direction)
            .slots();
        self.measure(free, &fixed, direction)?;
        let mut candidate = self.merge(free, &fixed, direction)?;

        let mut crossings = self.count(&fixed, &candidate, direction);
        if crossings > 0 {
            crossings = self.resolve_ties(&fixed, &mut candidate, direction, crossings)?;
        }
        if crossings > 0 {
            crossings = self.transpose(&fixed, &mut candidate, direction, crossings);
        }

        match phase {
            Phase::Initial => {}
            Phase::Strict => {
                let current = self.count(&fixed, &self.alternating[free], direction);
                if current < crossings {
                    trace!("Layer {free} keeps its order ({current} < {crossings})");
                    return Ok(());
                }
            }
            Phase::Dirty => {
                self.shuffle_ties(&mut candidate, direction);
                crossings = self.count(&fixed, &candidate, direction);
            }
        }

        trace!("Layer {free} ordered with {crossings} crossings");
        self.commit(free, candidate)
    }

    /// Copy of a fixed layer with its opening dummies replaced by their
    /// segment
    fn project(&self, layer: &AlternatingLayer, direction: SweepDirection) -> AlternatingLayer {
        let opening = direction.opening();
        let mut projected = layer.clone();
        projected.replace_vertices_by_segments(|v| {
            self.dg
                .graph
                .node_weight(v)
                .filter(|w| w.kind == opening)
                .and_then(|w| w.segment)
        });
        projected
    }

    /// Set the measured position of every free vertex to the mean slot of its
    /// fixed neighbours
    ///
    /// Vertices without such neighbours are flagged `do_not_optimize` and
    /// keep their previous measure. Closing dummies take the slot of their
    /// segment.
    fn measure(
        &mut self,
        free: usize,
        fixed: &Slots,
        direction: SweepDirection,
    ) -> Result<(), LayeredLayoutError> {
        let closing = direction.closing();
        let vertices = self.dg.layers[free].clone();

        for v in vertices {
            let vertex = self.dg.vertex(v)?;
            if vertex.kind == closing {
                let slot = vertex
                    .segment
                    .and_then(|s| fixed.segments.get(&s))
                    .copied()
                    .ok_or(LayeredLayoutError::MissingSegment("projected layer"))?;
                let vertex = self.dg.vertex_mut(v)?;
                vertex.measured_position = slot as f64;
                vertex.do_not_optimize = false;
                continue;
            }

            let slots: Vec<usize> = self
                .dg
                .graph
                .neighbors_directed(v, direction.towards_fixed())
                .filter_map(|n| fixed.vertices.get(&n).copied())
                .collect();
            let vertex = self.dg.vertex_mut(v)?;
            if slots.is_empty() {
                vertex.do_not_optimize = true;
            } else {
                vertex.do_not_optimize = false;
                vertex.measured_position = slots.iter().sum::<usize>() as f64 / slots.len() as f64;
            }
        }
        Ok(())
    }

    /// Interleave the free vertices, sorted by measure, with the containers
    /// of the fixed layer and put the closing dummies at their segment
    fn merge(
        &self,
        free: usize,
        fixed: &Slots,
        direction: SweepDirection,
    ) -> Result<AlternatingLayer, LayeredLayoutError> {
        let closing = direction.closing();
        let mut vertices = Vec::new();
        let mut closing_vertices = Vec::new();
        for &v in &self.dg.layers[free] {
            let vertex = self.dg.vertex(v)?;
            if vertex.kind == closing {
                let segment = vertex
                    .segment
                    .ok_or(LayeredLayoutError::MissingSegment("closing vertex"))?;
                closing_vertices.push((v, segment));
            } else {
                vertices.push((v, vertex.measured_position));
            }
        }
        vertices.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut layer = AlternatingLayer::default();
        let mut containers = fixed.containers.iter().cloned();
        let mut pending: Option<(usize, SegmentContainer)> = containers.next();
        let mut vertices = vertices.into_iter().peekable();
        loop {
            match (vertices.peek().copied(), pending.take()) {
                (Some((v, measure)), Some((start, container))) => {
                    let end = (start + container.len() - 1) as f64;
                    if measure <= start as f64 {
                        layer.push_vertex(v);
                        vertices.next();
                        pending = Some((start, container));
                    } else if measure >= end {
                        layer.push_container(container);
                        pending = containers.next();
                    } else {
                        let split = (measure - start as f64).ceil() as usize;
                        let mut head = container;
                        let tail = head.segments.split_off(split);
                        layer.push_container(head);
                        layer.push_vertex(v);
                        vertices.next();
                        pending = Some((start + split, SegmentContainer::new(tail)));
                    }
                }
                (Some((v, _)), None) => {
                    layer.push_vertex(v);
                    vertices.next();
                }
                (None, Some((_, container))) => {
                    layer.push_container(container);
                    pending = containers.next();
                }
                (None, None) => break,
            }
        }
        layer.normalize();

        for (v, segment) in closing_vertices {
            if !layer.place_at_segment(v, segment) {
                return Err(LayeredLayoutError::MissingSegment("merged layer"));
            }
        }
        Ok(layer)
    }

    fn count(&self, fixed: &Slots, free: &AlternatingLayer, direction: SweepDirection) -> u64 {
        bilayer_cross_count(&layer_edges(&*self.dg, fixed, free, direction))
    }

    /// Item indices of the runs of adjacent free vertices sharing a measure
    fn tie_runs(&self, layer: &AlternatingLayer, direction: SweepDirection) -> Vec<Vec<usize>> {
        let closing = direction.closing();
        let mut runs = Vec::new();
        let mut run = Vec::new();
        let mut measure = 0.0;

        for (index, item) in layer.items().iter().enumerate() {
            let vertex = match item {
                LayerItem::Container(c) if c.is_empty() => continue,
                LayerItem::Container(_) => None,
                LayerItem::Vertex(v) => self
                    .dg
                    .graph
                    .node_weight(*v)
                    .filter(|w| w.kind != closing && !w.do_not_optimize),
            };
            match vertex {
                Some(w) if !run.is_empty() && w.measured_position == measure => run.push(index),
                Some(w) => {
                    close_run(&mut runs, &mut run);
                    run.push(index);
                    measure = w.measured_position;
                }
                None => close_run(&mut runs, &mut run),
            }
        }
        close_run(&mut runs, &mut run);
        runs
    }

    /// Try other orders for every tie run, keeping the first strictly better
    /// one found
    fn resolve_ties(
        &mut self,
        fixed: &Slots,
        candidate: &mut AlternatingLayer,
        direction: SweepDirection,
        mut crossings: u64,
    ) -> Result<u64, LayeredLayoutError> {
        for run in self.tie_runs(candidate, direction) {
            let mut group: Vec<VertexId> = run
                .iter()
                .filter_map(|&i| candidate.vertex_at(i))
                .collect();
            for (index, &v) in group.iter().enumerate() {
                self.dg.vertex_mut(v)?.permutation_index = index;
            }
            let mut best = group.clone();

            if group.len() <= EXHAUSTIVE_TIE_SIZE {
                let dg = &*self.dg;
                let key = |v: &VertexId| {
                    dg.graph
                        .node_weight(*v)
                        .map_or(0, |w| w.permutation_index)
                };
                while next_permutation(&mut group, &key) {
                    for (&i, &v) in run.iter().zip(&group) {
                        candidate.set_vertex(i, v);
                    }
                    let count = bilayer_cross_count(&layer_edges(dg, fixed, candidate, direction));
                    if count < crossings {
                        crossings = count;
                        best.clone_from(&group);
                    }
                }
            } else {
                for _ in 0..self.budget.max_permutations {
                    group.shuffle(&mut self.rng);
                    for (&i, &v) in run.iter().zip(&group) {
                        candidate.set_vertex(i, v);
                    }
                    let count = self.count(fixed, candidate, direction);
                    if count < crossings {
                        crossings = count;
                        best.clone_from(&group);
                    }
                }
            }

            for (&i, &v) in run.iter().zip(&best) {
                candidate.set_vertex(i, v);
            }
        }
        Ok(crossings)
    }

    /// Greedily swap neighbouring vertices while it removes crossings
    ///
    /// Closing dummies stay where their segment runs.
    fn transpose(
        &self,
        fixed: &Slots,
        candidate: &mut AlternatingLayer,
        direction: SweepDirection,
        mut crossings: u64,
    ) -> u64 {
        let closing = direction.closing();
        let positions: Vec<usize> = candidate
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| match item {
                LayerItem::Vertex(v) => self
                    .dg
                    .graph
                    .node_weight(*v)
                    .is_some_and(|vertex| vertex.kind != closing),
                LayerItem::Container(_) => false,
            })
            .map(|(i, _)| i)
            .collect();

        for _ in 0..TRANSPOSE_ROUNDS {
            let mut improved = false;
            for pair in positions.windows(2) {
                if crossings == 0 {
                    return 0;
                }
                candidate.swap_items(pair[0], pair[1]);
                let after = self.count(fixed, candidate, direction);
                if after < crossings {
                    crossings = after;
                    improved = true;
                } else {
                    candidate.swap_items(pair[0], pair[1]);
                }
            }
            if !improved {
                break;
            }
        }
        crossings
    }

    fn shuffle_ties(&mut self, candidate: &mut AlternatingLayer, direction: SweepDirection) {
        for run in self.tie_runs(candidate, direction) {
            let mut group: Vec<VertexId> = run
                .iter()
                .filter_map(|&i| candidate.vertex_at(i))
                .collect();
            group.shuffle(&mut self.rng);
            for (&i, &v) in run.iter().zip(&group) {
                candidate.set_vertex(i, v);
            }
        }
    }

    /// Make `layer` the order of layer `free`
    fn commit(&mut self, free: usize, layer: AlternatingLayer) -> Result<(), LayeredLayoutError> {
        let order: Vec<VertexId> = layer.vertices().collect();
        for (index, &v) in order.iter().enumerate() {
            self.dg.vertex_mut(v)?.index_in_layer = index;
        }

        self.dg.layers[free] = order;
        self.compaction.set_layer(free, &layer, &*self.dg);
        self.alternating[free] = layer;
        Ok(())
    }

    fn total_crossings(&self) -> u64 {
        self.alternating
            .windows(2)
            .map(|pair| {
                let fixed = self.project(&pair[0], SweepDirection::Down).slots();
                self.count(&fixed, &pair[1], SweepDirection::Down)
            })
            .sum()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            layers: self.dg.layers.clone(),
            alternating: self.alternating.clone(),
            crossings: self.crossings,
        }
    }

    fn keep_best(&self, best: &mut Snapshot) {
        if self.crossings < best.crossings {
            *best = self.snapshot();
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.dg.layers = snapshot.layers;
        self.dg.reindex();
        self.alternating = snapshot.alternating;
        self.crossings = snapshot.crossings;
        self.rebuild_compaction();
    }

    fn rebuild_compaction(&mut self) {
        self.compaction = CompactionGraph::default();
        for (index, layer) in self.alternating.iter().enumerate() {
            self.compaction.set_layer(index, layer, &*self.dg);
        }
    }

    /// Flag the real edges crossing a segment, returns how many there are
    fn mark_segment_conflicts(&mut self) -> usize {
        let mut conflicts = Vec::new();
        for pair in self.alternating.windows(2) {
            let fixed = self.project(&pair[0], SweepDirection::Down).slots();
            conflicts.extend(segment_conflicts(&*self.dg, &fixed, &pair[1], SweepDirection::Down));
        }
        for &edge in &conflicts {
            if let Some(weight) = self.dg.graph.edge_weight_mut(edge) {
                weight.marked = true;
            }
        }

        debug!("{} edges cross a segment", conflicts.len());
        conflicts.len()
    }
}

fn close_run(runs: &mut Vec<Vec<usize>>, run: &mut Vec<usize>) {
    if run.len() > 1 {
        runs.push(std::mem::take(run));
    } else {
        run.clear();
    }
}

/// Rearrange `items` into the next permutation in the lexicographic order of
/// `key`, returns false once the last one has been reached
fn next_permutation<T, K, F>(items: &mut [T], key: F) -> bool
where
    K: Ord,
    F: Fn(&T) -> K,
{
    if items.len() < 2 {
        return false;
    }
    let mut i = items.len() - 1;
    while i > 0 && key(&items[i - 1]) >= key(&items[i]) {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = items.len() - 1;
    while key(&items[j]) <= key(&items[i - 1]) {
        j -= 1;
    }
    items.swap(i - 1, j);
    items[i..].reverse();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layered::graph::tests::decorated;
    use crate::layered::layers::assign_layers;
    use crate::layered::sparse::{insert_dummy_vertices, remove_parallel_edges};
    use test_log::test;

    fn proper(n: usize, edges: &[(u32, u32)]) -> DecoratedGraph {
        let mut dg = decorated(n, edges);
        assign_layers(&mut dg, false, &CancelToken::new()).unwrap();
        insert_dummy_vertices(&mut dg, &CancelToken::new()).unwrap();
        remove_parallel_edges(&mut dg);
        dg
    }

    fn budget() -> SweepBudget {
        SweepBudget {
            max_permutations: 50,
            max_strict_rounds: 10,
            max_dirty_rounds: 3,
            seed: 7,
        }
    }

    const TANGLED: &[(u32, u32)] = &[
        (0, 3),
        (0, 5),
        (1, 4),
        (1, 3),
        (2, 5),
        (2, 4),
        (3, 6),
        (4, 8),
        (5, 7),
        (5, 6),
        (0, 8),
        (1, 7),
        (6, 9),
        (8, 9),
        (2, 9),
    ];

    #[test]
    fn swapped_pair_is_untangled() {
        let mut dg = proper(4, &[(0, 3), (1, 2)]);
        let ids: Vec<_> = dg.graph.node_indices().collect();
        dg.layers[1].reverse();
        dg.reindex();

        let order = minimize_crossings(&mut dg, budget(), &CancelToken::new()).unwrap();
        assert_eq!(order.crossings, 0);

        let index = |i: usize| dg.graph[ids[i]].index_in_layer;
        assert_eq!(index(0) < index(1), index(3) < index(2));
    }

    #[test]
    fn complete_bipartite_keeps_its_single_crossing() {
        let mut dg = proper(4, &[(0, 2), (0, 3), (1, 2), (1, 3)]);
        let order = minimize_crossings(&mut dg, budget(), &CancelToken::new()).unwrap();
        assert_eq!(order.crossings, 1);
    }

    #[test]
    fn long_edge_runs_beside_the_chain() {
        let mut dg = proper(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (0, 4)]);
        let order = minimize_crossings(&mut dg, budget(), &CancelToken::new()).unwrap();
        assert_eq!(order.crossings, 0);
        assert_eq!(order.segment_conflicts, 0);
        assert!(order.compaction.relation_count() > 0);
        for (k, layer) in dg.layers.iter().enumerate() {
            for (i, &v) in layer.iter().enumerate() {
                assert_eq!(dg.graph[v].layer, k);
                assert_eq!(dg.graph[v].index_in_layer, i);
            }
        }
    }

    #[test]
    fn edge_across_a_segment_is_marked() {
        // 0 -> 3 becomes a segment between layers 1 and 2, and 1 -> 2 is
        // ordered to pass from its right side to its left side
        let mut dg = proper(4, &[(0, 1), (1, 2), (2, 3), (0, 3)]);
        let ids: Vec<_> = dg.graph.node_indices().collect();
        let (b, c) = (ids[1], ids[2]);
        let p = dg.layers[1].iter().copied().find(|&v| v != b).unwrap();
        let q = dg.layers[2].iter().copied().find(|&v| v != c).unwrap();
        assert_eq!(dg.graph[p].kind, VertexKind::P);
        assert_eq!(dg.graph[q].kind, VertexKind::Q);
        dg.layers[1] = vec![p, b];
        dg.layers[2] = vec![c, q];
        dg.reindex();

        let cancel = CancelToken::new();
        let conflicts =
            CrossingMinimizer::new(&mut dg, budget(), &cancel).mark_segment_conflicts();
        assert_eq!(conflicts, 1);

        let across = dg.graph.find_edge(b, c).unwrap();
        assert!(dg.graph[across].marked);
        assert_eq!(dg.graph.edge_weights().filter(|e| e.marked).count(), 1);
        let chain = dg
            .chains
            .iter()
            .find(|chain| chain.vertices == [b, c])
            .unwrap();
        assert!(dg.crosses_segment(chain));
    }

    #[test]
    fn segment_beside_its_edge_is_not_marked() {
        let mut dg = proper(4, &[(0, 1), (1, 2), (2, 3), (0, 3)]);
        let order = minimize_crossings(&mut dg, budget(), &CancelToken::new()).unwrap();
        assert_eq!(order.segment_conflicts, 0);
        assert!(dg.graph.edge_weights().all(|e| !e.marked));
    }

    #[test]
    fn never_worse_than_the_initial_sweep() {
        let mut initial = proper(10, TANGLED);
        let no_rounds = SweepBudget {
            max_strict_rounds: 0,
            max_dirty_rounds: 0,
            ..budget()
        };
        let first = minimize_crossings(&mut initial, no_rounds, &CancelToken::new()).unwrap();

        let mut dg = proper(10, TANGLED);
        let full = minimize_crossings(&mut dg, budget(), &CancelToken::new()).unwrap();
        assert!(full.crossings <= first.crossings);
    }

    #[test]
    fn same_seed_same_order() {
        let mut a = proper(10, TANGLED);
        let mut b = proper(10, TANGLED);
        let first = minimize_crossings(&mut a, budget(), &CancelToken::new()).unwrap();
        let second = minimize_crossings(&mut b, budget(), &CancelToken::new()).unwrap();
        assert_eq!(first.crossings, second.crossings);
        assert_eq!(a.layers, b.layers);
    }

    #[test]
    fn cancellation_stops_the_sweep() {
        let mut dg = proper(10, TANGLED);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = minimize_crossings(&mut dg, budget(), &cancel).unwrap_err();
        assert!(matches!(err, LayeredLayoutError::Cancelled(_)));
    }

    #[test]
    fn permutations_are_enumerated_once() {
        let mut items = vec![0, 1, 2];
        let mut seen = vec![items.clone()];
        while next_permutation(&mut items, |&x| x) {
            seen.push(items.clone());
        }
        assert_eq!(seen.len(), 6);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 6);
    }
}
