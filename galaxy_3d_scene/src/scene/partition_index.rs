/// PartitionIndex — dynamic octree / quad-tree spatial index.
///
/// Uses single-node placement: each member is stored in exactly one
/// partition, the deepest one whose region fully contains it. Members that
/// straddle a split plane stay in the parent; members outside the root
/// region stay at the root.
///
/// Each partition has a fixed `region` (its cell) and an aggregate
/// `bounds` covering every member stored in its subtree. Queries classify
/// the aggregate bounds, not the region, so empty cells are never visited
/// and members poking out of their cell are never missed.
///
/// Leaves split lazily once they hold more than `split_threshold` members
/// and are shallower than `max_depth`. Octree and quad-tree only differ in
/// `PartitionLayout::create_child_partitions()` and the split axes.

use rustc_hash::FxHashMap;
use crate::bounds::AABB;
use crate::camera::{Frustum, Intersection};
use crate::config::Axis;
use super::node::NodeKey;
use super::spatial_index::SpatialIndex;

/// Index of the root partition in the flat partition array.
const ROOT: usize = 0;

/// How a partition splits into children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionLayout {
    /// Split X, Y and Z: 8 children
    Octree,
    /// Split the two axes other than `ignored_axis`: 4 children
    QuadTree { ignored_axis: Axis },
}

impl PartitionLayout {
    fn splits(&self, axis: usize) -> bool {
        match self {
            PartitionLayout::Octree => true,
            PartitionLayout::QuadTree { ignored_axis } => ignored_axis.index() != axis,
        }
    }

    fn split_axes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..3).filter(move |&axis| self.splits(axis))
    }

    /// Children per split partition.
    pub fn child_count(&self) -> usize {
        match self {
            PartitionLayout::Octree => 8,
            PartitionLayout::QuadTree { .. } => 4,
        }
    }

    /// Child partition factory: the child regions of `region`, in slot order.
    ///
    /// Slot bit `n` selects the low (0) or high (1) half of the `n`-th
    /// split axis.
    pub fn create_child_partitions(&self, region: &AABB) -> Vec<AABB> {
        let center = region.center();
        (0..self.child_count())
            .map(|slot| {
                let mut min = region.min;
                let mut max = region.max;
                for (bit, axis) in self.split_axes().enumerate() {
                    if slot & (1 << bit) == 0 {
                        max[axis] = center[axis];
                    } else {
                        min[axis] = center[axis];
                    }
                }
                AABB { min, max }
            })
            .collect()
    }

    /// Slot of the child of `region` that fully contains `volume`.
    ///
    /// `None` if the volume straddles a split plane. Assumes `region`
    /// contains `volume`.
    pub fn child_slot(&self, region: &AABB, volume: &AABB) -> Option<usize> {
        let center = region.center();
        let mut slot = 0;
        for (bit, axis) in self.split_axes().enumerate() {
            if volume.min[axis] >= center[axis] {
                slot |= 1 << bit;
            } else if volume.max[axis] > center[axis] {
                return None;
            }
        }
        Some(slot)
    }
}

/// A single cell of the tree.
struct Partition {
    /// Fixed cell of space this partition covers
    region: AABB,
    /// Union of every member stored in this subtree, `None` when empty
    bounds: Option<AABB>,
    depth: u32,
    parent: Option<usize>,
    /// Children are contiguous: `first_child .. first_child + child_count`
    first_child: Option<usize>,
    /// Members placed here (in arrival order)
    members: Vec<NodeKey>,
}

impl Partition {
    fn new(region: AABB, depth: u32, parent: Option<usize>) -> Self {
        Self {
            region,
            bounds: None,
            depth,
            parent,
            first_child: None,
            members: Vec::new(),
        }
    }
}

/// Hierarchical spatial index (octree or quad-tree).
pub struct PartitionIndex {
    layout: PartitionLayout,
    /// Flat array of partitions; a child always comes after its parent
    partitions: Vec<Partition>,
    max_depth: u32,
    split_threshold: usize,
    /// Reverse lookup: member key → (partition index, member bounds)
    locations: FxHashMap<NodeKey, (usize, AABB)>,
}

impl PartitionIndex {
    /// Create an empty index over `world_region`.
    ///
    /// # Arguments
    ///
    /// * `layout` - Octree or quad-tree split policy
    /// * `world_region` - Region of the root partition
    /// * `max_depth` - Maximum tree depth (root = 0)
    /// * `split_threshold` - Member count above which a leaf splits
    pub fn new(layout: PartitionLayout, world_region: AABB, max_depth: u32, split_threshold: usize) -> Self {
        Self {
            layout,
            partitions: vec![Partition::new(world_region, 0, None)],
            max_depth,
            split_threshold: split_threshold.max(1),
            locations: FxHashMap::default(),
        }
    }

    pub fn octree(world_region: AABB, max_depth: u32, split_threshold: usize) -> Self {
        Self::new(PartitionLayout::Octree, world_region, max_depth, split_threshold)
    }

    pub fn quad_tree(world_region: AABB, max_depth: u32, split_threshold: usize, ignored_axis: Axis) -> Self {
        Self::new(PartitionLayout::QuadTree { ignored_axis }, world_region, max_depth, split_threshold)
    }

    pub fn layout(&self) -> PartitionLayout {
        self.layout
    }

    /// Number of allocated partitions (root included).
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Depth of the partition a member lives in.
    pub fn member_depth(&self, key: NodeKey) -> Option<u32> {
        self.locations.get(&key).map(|&(index, _)| self.partitions[index].depth)
    }

    fn children(&self, index: usize) -> Option<std::ops::Range<usize>> {
        self.partitions[index]
            .first_child
            .map(|first| first..first + self.layout.child_count())
    }

    /// Descend from the root to the deepest partition that fully contains
    /// `volume`, widening every partition on the way, and store it there.
    fn place(&mut self, key: NodeKey, volume: &AABB) -> usize {
        let fits_root = self.partitions[ROOT].region.contains(volume);
        let mut index = ROOT;

        loop {
            widen(&mut self.partitions[index].bounds, volume);
            if !fits_root {
                break;
            }
            let Some(first) = self.partitions[index].first_child else {
                break;
            };
            match self.layout.child_slot(&self.partitions[index].region, volume) {
                Some(slot) => index = first + slot,
                None => break,
            }
        }

        self.partitions[index].members.push(key);
        self.locations.insert(key, (index, *volume));

        let partition = &self.partitions[index];
        if partition.first_child.is_none()
            && partition.members.len() > self.split_threshold
            && partition.depth < self.max_depth
        {
            self.split(index);
        }
        index
    }

    /// Create the children of a leaf and push down every member that fits.
    fn split(&mut self, index: usize) {
        let regions = self.layout.create_child_partitions(&self.partitions[index].region);
        let depth = self.partitions[index].depth + 1;
        let first = self.partitions.len();
        for region in regions {
            self.partitions.push(Partition::new(region, depth, Some(index)));
        }
        self.partitions[index].first_child = Some(first);

        let region = self.partitions[index].region;
        let members = std::mem::take(&mut self.partitions[index].members);
        let mut kept = Vec::new();
        for key in members {
            let Some(&(_, volume)) = self.locations.get(&key) else {
                continue;
            };
            let slot = if region.contains(&volume) {
                self.layout.child_slot(&region, &volume)
            } else {
                None
            };
            match slot {
                Some(slot) => {
                    let child = first + slot;
                    self.partitions[child].members.push(key);
                    widen(&mut self.partitions[child].bounds, &volume);
                    self.locations.insert(key, (child, volume));
                }
                None => kept.push(key),
            }
        }
        self.partitions[index].members = kept;
    }

    /// Recompute one partition's bounds from its members and children.
    fn recompute_partition(&mut self, index: usize) {
        let mut bounds: Option<AABB> = None;
        for key in &self.partitions[index].members {
            if let Some((_, volume)) = self.locations.get(key) {
                widen(&mut bounds, volume);
            }
        }
        if let Some(children) = self.children(index) {
            for child in children {
                if let Some(child_bounds) = self.partitions[child].bounds {
                    widen(&mut bounds, &child_bounds);
                }
            }
        }
        self.partitions[index].bounds = bounds;
    }

    /// Walk up from `index` after `volume` left it, recomputing bounds
    /// while the removed volume touched them.
    fn shrink_from(&mut self, index: usize, volume: &AABB) {
        let mut current = Some(index);
        while let Some(index) = current {
            let before = self.partitions[index].bounds;
            let touches = before.map_or(false, |bounds| volume.touches_boundary_of(&bounds));
            if !touches {
                break;
            }
            self.recompute_partition(index);
            if self.partitions[index].bounds == before {
                break;
            }
            current = self.partitions[index].parent;
        }
    }

    /// Recursively query the tree with a frustum.
    ///
    /// 3-way classification of each partition's aggregate bounds:
    /// - `Outside` → skip entire subtree
    /// - `Inside` → collect all members from subtree without further testing
    /// - `Intersect` → test members individually, recurse into children
    fn query_recursive(
        &self,
        index: usize,
        frustum: &Frustum,
        classification: Intersection,
        results: &mut Vec<(NodeKey, Intersection)>,
    ) {
        match classification {
            Intersection::Outside => {}

            Intersection::Inside => self.collect_all(index, results),

            Intersection::Intersect => {
                for key in &self.partitions[index].members {
                    if let Some((_, volume)) = self.locations.get(key) {
                        let member_class = frustum.intersect_bounds(volume);
                        if member_class != Intersection::Outside {
                            results.push((*key, member_class));
                        }
                    }
                }

                if let Some(children) = self.children(index) {
                    for child in children {
                        if let Some(child_bounds) = &self.partitions[child].bounds {
                            let child_class = frustum.intersect_bounds(child_bounds);
                            self.query_recursive(child, frustum, child_class, results);
                        }
                    }
                }
            }
        }
    }

    /// Collect all members of a subtree (no frustum test).
    fn collect_all(&self, index: usize, results: &mut Vec<(NodeKey, Intersection)>) {
        results.extend(
            self.partitions[index]
                .members
                .iter()
                .map(|&key| (key, Intersection::Inside)),
        );
        if let Some(children) = self.children(index) {
            for child in children {
                if self.partitions[child].bounds.is_some() {
                    self.collect_all(child, results);
                }
            }
        }
    }

    fn collect_keys(&self, index: usize, keys: &mut Vec<NodeKey>) {
        keys.extend_from_slice(&self.partitions[index].members);
        if let Some(children) = self.children(index) {
            for child in children {
                self.collect_keys(child, keys);
            }
        }
    }
}

fn widen(bounds: &mut Option<AABB>, volume: &AABB) {
    match bounds {
        Some(bounds) => {
            bounds.widen_to_include(volume);
        }
        None => *bounds = Some(*volume),
    }
}

// ===== SPATIAL INDEX TRAIT =====

impl SpatialIndex for PartitionIndex {
    fn insert(&mut self, key: NodeKey, bounds: &AABB) -> bool {
        if self.locations.contains_key(&key) {
            return false;
        }
        self.place(key, bounds);
        true
    }

    fn remove(&mut self, key: NodeKey) -> bool {
        let Some((index, volume)) = self.locations.remove(&key) else {
            return false;
        };
        let members = &mut self.partitions[index].members;
        if let Some(position) = members.iter().position(|&member| member == key) {
            members.remove(position);
        }
        self.shrink_from(index, &volume);
        true
    }

    fn update(&mut self, key: NodeKey, bounds: &AABB) -> bool {
        match self.locations.get(&key) {
            None => false,
            Some((_, volume)) if volume == bounds => true,
            Some(_) => {
                self.remove(key);
                self.place(key, bounds);
                true
            }
        }
    }

    fn contains(&self, key: NodeKey) -> bool {
        self.locations.contains_key(&key)
    }

    fn len(&self) -> usize {
        self.locations.len()
    }

    fn keys(&self) -> Vec<NodeKey> {
        let mut keys = Vec::with_capacity(self.locations.len());
        self.collect_keys(ROOT, &mut keys);
        keys
    }

    fn member_bounds(&self, key: NodeKey) -> Option<AABB> {
        self.locations.get(&key).map(|&(_, volume)| volume)
    }

    fn clear(&mut self) {
        self.partitions.truncate(1);
        let root = &mut self.partitions[ROOT];
        root.first_child = None;
        root.members.clear();
        root.bounds = None;
        self.locations.clear();
    }

    fn bounds(&self) -> Option<AABB> {
        self.partitions[ROOT].bounds
    }

    fn recalculate_bounds(&mut self, recursive: bool) {
        if recursive {
            // Children always follow their parent in the array
            for index in (0..self.partitions.len()).rev() {
                self.recompute_partition(index);
            }
        } else {
            self.recompute_partition(ROOT);
        }
    }

    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<(NodeKey, Intersection)>) {
        if let Some(root_bounds) = &self.partitions[ROOT].bounds {
            let root_class = frustum.intersect_bounds(root_bounds);
            self.query_recursive(ROOT, frustum, root_class, results);
        }
    }

    fn validate(&self) -> bool {
        let mut member_total = 0;

        for (index, partition) in self.partitions.iter().enumerate() {
            member_total += partition.members.len();

            for key in &partition.members {
                let Some(&(location, volume)) = self.locations.get(key) else {
                    return false;
                };
                if location != index || !partition.bounds.is_some_and(|b| b.contains(&volume)) {
                    return false;
                }
                if index != ROOT && !partition.region.contains(&volume) {
                    return false;
                }
            }

            if let Some(children) = self.children(index) {
                for child in children {
                    if let Some(child_bounds) = &self.partitions[child].bounds {
                        if !partition.bounds.is_some_and(|b| b.contains(child_bounds)) {
                            return false;
                        }
                    }
                }
            }
        }

        member_total == self.locations.len()
    }
}
