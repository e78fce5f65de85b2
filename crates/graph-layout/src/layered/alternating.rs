use super::graph::{SegmentId, VertexId};
use std::collections::HashMap;

/// Segments passing between two vertices of a layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SegmentContainer {
    pub segments: Vec<SegmentId>,
}

impl SegmentContainer {
    pub fn new(segments: Vec<SegmentId>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LayerItem {
    Vertex(VertexId),
    Container(SegmentContainer),
}

/// Order of a layer as seen by the crossing minimization: containers and
/// vertices alternate, starting and ending with a container
///
/// Containers may be empty. A normalized layer always has an odd number of
/// items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AlternatingLayer {
    items: Vec<LayerItem>,
}

impl AlternatingLayer {
    pub fn from_vertices(vertices: &[VertexId]) -> Self {
        let mut layer = Self::default();
        for &v in vertices {
            layer.push_vertex(v);
        }
        layer.normalize();
        layer
    }

    pub fn items(&self) -> &[LayerItem] {
        &self.items
    }

    pub fn push_vertex(&mut self, vertex: VertexId) {
        self.items.push(LayerItem::Vertex(vertex));
    }

    pub fn push_container(&mut self, container: SegmentContainer) {
        self.items.push(LayerItem::Container(container));
    }

    /// Merge consecutive containers and add empty ones so that containers and
    /// vertices alternate
    pub fn normalize(&mut self) {
        let mut items: Vec<LayerItem> = Vec::with_capacity(self.items.len() * 2 + 1);
        for item in self.items.drain(..) {
            match item {
                LayerItem::Container(container) => match items.last_mut() {
                    Some(LayerItem::Container(last)) => last.segments.extend(container.segments),
                    _ => items.push(LayerItem::Container(container)),
                },
                LayerItem::Vertex(v) => {
                    if !matches!(items.last(), Some(LayerItem::Container(_))) {
                        items.push(LayerItem::Container(SegmentContainer::default()));
                    }
                    items.push(LayerItem::Vertex(v));
                }
            }
        }
        if !matches!(items.last(), Some(LayerItem::Container(_))) {
            items.push(LayerItem::Container(SegmentContainer::default()));
        }
        self.items = items;
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.items.iter().filter_map(|item| match item {
            LayerItem::Vertex(v) => Some(*v),
            LayerItem::Container(_) => None,
        })
    }

    /// Replace the vertices for which `segment_of` returns a segment by a
    /// container holding that segment, merged with its neighbours
    pub fn replace_vertices_by_segments<F>(&mut self, segment_of: F)
    where
        F: Fn(VertexId) -> Option<SegmentId>,
    {
        for item in self.items.iter_mut() {
            if let LayerItem::Vertex(v) = *item {
                if let Some(segment) = segment_of(v) {
                    *item = LayerItem::Container(SegmentContainer::new(vec![segment]));
                }
            }
        }
        self.normalize();
    }

    /// Put `vertex` where `segment` currently runs, splitting its container
    ///
    /// Returns false if no container holds the segment.
    pub fn place_at_segment(&mut self, vertex: VertexId, segment: SegmentId) -> bool {
        let found = self
            .items
            .iter()
            .enumerate()
            .find_map(|(i, item)| match item {
                LayerItem::Container(c) => c
                    .segments
                    .iter()
                    .position(|&s| s == segment)
                    .map(|j| (i, j)),
                LayerItem::Vertex(_) => None,
            });
        let Some((index, position)) = found else {
            return false;
        };

        let LayerItem::Container(container) = &mut self.items[index] else {
            return false;
        };
        let after = container.segments.split_off(position + 1);
        container.segments.pop();
        self.items.splice(
            index + 1..index + 1,
            [
                LayerItem::Vertex(vertex),
                LayerItem::Container(SegmentContainer::new(after)),
            ],
        );
        true
    }

    /// Swap the vertex items at `a` and `b`
    pub fn swap_items(&mut self, a: usize, b: usize) {
        self.items.swap(a, b);
    }

    pub fn set_vertex(&mut self, index: usize, vertex: VertexId) {
        self.items[index] = LayerItem::Vertex(vertex);
    }

    pub fn vertex_at(&self, index: usize) -> Option<VertexId> {
        match self.items.get(index) {
            Some(LayerItem::Vertex(v)) => Some(*v),
            _ => None,
        }
    }

    /// Slot of every vertex and segment, containers take one slot per segment
    /// and empty containers none
    pub fn slots(&self) -> Slots {
        let mut slots = Slots::default();
        for item in &self.items {
            match item {
                LayerItem::Vertex(v) => {
                    slots.vertices.insert(*v, slots.len);
                    slots.len += 1;
                }
                LayerItem::Container(c) => {
                    if !c.is_empty() {
                        slots.containers.push((slots.len, c.clone()));
                    }
                    for &s in &c.segments {
                        slots.segments.insert(s, slots.len);
                        slots.len += 1;
                    }
                }
            }
        }
        slots
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Slots {
    pub vertices: HashMap<VertexId, usize>,
    pub segments: HashMap<SegmentId, usize>,
    /// Non-empty containers with their first slot, in layer order
    pub containers: Vec<(usize, SegmentContainer)>,
    pub len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn v(i: u32) -> VertexId {
        VertexId::new(i as usize)
    }

    fn c(segments: &[usize]) -> LayerItem {
        LayerItem::Container(SegmentContainer::new(
            segments.iter().map(|&s| SegmentId(s)).collect(),
        ))
    }

    #[test]
    fn vertices_are_wrapped_in_empty_containers() {
        let layer = AlternatingLayer::from_vertices(&[v(0), v(1)]);
        assert_eq!(
            layer.items(),
            &[c(&[]), LayerItem::Vertex(v(0)), c(&[]), LayerItem::Vertex(v(1)), c(&[])]
        );
        assert_eq!(AlternatingLayer::from_vertices(&[]).items().len(), 1);
    }

    #[test]
    fn consecutive_containers_are_merged() {
        let mut layer = AlternatingLayer::default();
        layer.push_container(SegmentContainer::new(vec![SegmentId(0)]));
        layer.push_container(SegmentContainer::new(vec![SegmentId(1)]));
        layer.push_vertex(v(3));
        layer.normalize();
        assert_eq!(layer.items(), &[c(&[0, 1]), LayerItem::Vertex(v(3)), c(&[])]);
        assert_eq!(layer.items().len() % 2, 1);
    }

    #[test]
    fn replacing_vertices_merges_their_segments() {
        let mut layer = AlternatingLayer::from_vertices(&[v(0), v(1), v(2)]);
        layer.replace_vertices_by_segments(|x| (x == v(1)).then_some(SegmentId(7)));
        assert_eq!(
            layer.items(),
            &[c(&[]), LayerItem::Vertex(v(0)), c(&[7]), LayerItem::Vertex(v(2)), c(&[])]
        );
    }

    #[test]
    fn placing_a_vertex_splits_the_container() {
        let mut layer = AlternatingLayer::default();
        layer.push_container(SegmentContainer::new(vec![SegmentId(0), SegmentId(1), SegmentId(2)]));
        layer.normalize();
        assert!(layer.place_at_segment(v(9), SegmentId(1)));
        assert_eq!(layer.items(), &[c(&[0]), LayerItem::Vertex(v(9)), c(&[2])]);
        assert!(!layer.place_at_segment(v(9), SegmentId(1)));
    }

    #[test]
    fn slots_count_segments_individually() {
        let mut layer = AlternatingLayer::default();
        layer.push_vertex(v(0));
        layer.push_container(SegmentContainer::new(vec![SegmentId(4), SegmentId(5)]));
        layer.push_vertex(v(1));
        layer.normalize();

        let slots = layer.slots();
        assert_eq!(slots.len, 4);
        assert_eq!(slots.vertices[&v(0)], 0);
        assert_eq!(slots.segments[&SegmentId(4)], 1);
        assert_eq!(slots.segments[&SegmentId(5)], 2);
        assert_eq!(slots.vertices[&v(1)], 3);
        assert_eq!(slots.containers.len(), 1);
        assert_eq!(slots.containers[0].0, 1);
    }
}
