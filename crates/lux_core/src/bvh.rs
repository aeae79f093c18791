//! Flattened bounding volume hierarchy.
//!
//! The tree is built with an explicit stack and stored as an array of nodes
//! in pre-order: a node's left child is the next node, its right child is
//! `right_offset` nodes further. Leaves have `right_offset == 0` and refer
//! to a contiguous range of `ordered`, which is partitioned in place while
//! building.

use std::str::FromStr;
use std::time::Instant;

use arrayvec::ArrayVec;
use lux_math::{Aabb, Ray, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::intersection::Intersection;

/// Traversal stack depth. Subtrees that do not fit are skipped.
const STACK_SIZE: usize = 128;

/// How the split axis is chosen when SAH is off.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BvhAxisSelection {
    #[default]
    Largest,
    Random,
}

impl FromStr for BvhAxisSelection {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "largest" => Ok(BvhAxisSelection::Largest),
            "random" => Ok(BvhAxisSelection::Random),
            _ => Err(SceneError::unknown("bvh axis selection", s)),
        }
    }
}

/// Where the split plane goes when SAH is off.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BvhAxisSplit {
    #[default]
    Middle,
    Median,
    Random,
}

impl FromStr for BvhAxisSplit {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "middle" => Ok(BvhAxisSplit::Middle),
            "median" => Ok(BvhAxisSplit::Median),
            "random" => Ok(BvhAxisSplit::Random),
            _ => Err(SceneError::unknown("bvh axis split", s)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhBuildInfo {
    pub max_leaf_size: usize,
    pub use_sah: bool,
    /// Extra evenly spaced SAH candidates per axis.
    pub regular_split_count: usize,
    pub axis_selection: BvhAxisSelection,
    pub axis_split: BvhAxisSplit,
}

impl Default for BvhBuildInfo {
    fn default() -> Self {
        Self {
            max_leaf_size: 4,
            use_sah: true,
            regular_split_count: 4,
            axis_selection: BvhAxisSelection::Largest,
            axis_split: BvhAxisSplit::Middle,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlatBvhNode {
    pub aabb: Aabb,
    /// Distance to the right child; zero marks a leaf.
    pub right_offset: u32,
    pub start_offset: u32,
    pub primitive_count: u32,
}

impl FlatBvhNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.right_offset == 0
    }
}

/// Range of `ordered` waiting to become a node.
struct BuildEntry {
    start: usize,
    end: usize,
    /// Set for right children so the parent's offset can be patched.
    parent: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct FlatBvh {
    pub nodes: Vec<FlatBvhNode>,
    /// Primitive indices, permuted so every leaf is a contiguous range.
    pub ordered: Vec<usize>,
}

impl FlatBvh {
    /// Build over primitives given by their bounds. Leaf ranges index into
    /// `bounds`. `seed` drives the random split policies.
    pub fn build(bounds: &[Aabb], info: &BvhBuildInfo, seed: u64) -> Self {
        let start_time = Instant::now();
        let mut rng = StdRng::seed_from_u64(seed);
        let centers: Vec<Vec3> = bounds.iter().map(Aabb::center).collect();
        let max_leaf_size = info.max_leaf_size.max(1);

        let mut bvh = FlatBvh {
            nodes: Vec::with_capacity(bounds.len() * 2),
            ordered: (0..bounds.len()).collect(),
        };
        if bounds.is_empty() {
            return bvh;
        }

        let mut stack = vec![BuildEntry {
            start: 0,
            end: bounds.len(),
            parent: None,
        }];

        while let Some(entry) = stack.pop() {
            let node_index = bvh.nodes.len();
            if let Some(parent) = entry.parent {
                bvh.nodes[parent].right_offset = (node_index - parent) as u32;
            }

            let aabb = bvh.ordered[entry.start..entry.end]
                .iter()
                .fold(Aabb::EMPTY, |mut aabb, &i| {
                    aabb.expand(&bounds[i]);
                    aabb
                });
            let count = entry.end - entry.start;

            if count <= max_leaf_size {
                bvh.nodes.push(FlatBvhNode {
                    aabb,
                    right_offset: 0,
                    start_offset: entry.start as u32,
                    primitive_count: count as u32,
                });
                continue;
            }

            let (axis, split) = if info.use_sah {
                sah_split(&aabb, bounds, &centers, &bvh.ordered[entry.start..entry.end], info)
            } else {
                policy_split(&aabb, &centers, &bvh.ordered[entry.start..entry.end], info, &mut rng)
            };

            let mid = partition(&mut bvh.ordered, &centers, entry.start, entry.end, axis, split);

            bvh.nodes.push(FlatBvhNode {
                aabb,
                right_offset: 0,
                start_offset: entry.start as u32,
                primitive_count: 0,
            });
            stack.push(BuildEntry {
                start: mid,
                end: entry.end,
                parent: Some(node_index),
            });
            stack.push(BuildEntry {
                start: entry.start,
                end: mid,
                parent: None,
            });
        }

        log::debug!(
            "BVH: {} primitives, {} nodes, {} leaves, built in {:.2?}",
            bounds.len(),
            bvh.nodes.len(),
            bvh.leaf_count(),
            start_time.elapsed()
        );

        bvh
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    pub fn aabb(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |node| node.aabb)
    }

    /// Walk the hierarchy and call `visit` for every primitive in a leaf the
    /// ray reaches. `visit` follows the primitive intersection contract.
    pub fn intersect<F>(&self, ray: &Ray, isect: &mut Intersection, mut visit: F) -> bool
    where
        F: FnMut(usize, &Ray, &mut Intersection) -> bool,
    {
        let Some(root) = self.nodes.first() else {
            return false;
        };
        if !root.aabb.intersects(ray) {
            return false;
        }

        let mut stack = ArrayVec::<usize, STACK_SIZE>::new();
        stack.push(0);
        let mut found = false;

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];

            if node.is_leaf() {
                let start = node.start_offset as usize;
                let end = start + node.primitive_count as usize;
                for &primitive in &self.ordered[start..end] {
                    if visit(primitive, ray, isect) {
                        found = true;
                        if ray.fast_occlusion {
                            return true;
                        }
                    }
                }
                continue;
            }

            let right = index + node.right_offset as usize;
            let left = index + 1;
            for child in [right, left] {
                if self.nodes[child].aabb.intersects(ray) && stack.try_push(child).is_err() {
                    log::warn!("BVH traversal stack exhausted, skipping subtree");
                }
            }
        }

        found
    }
}

fn median(values: &mut [f32]) -> f32 {
    let mid = values.len() / 2;
    let (_, value, _) = values.select_nth_unstable_by(mid, f32::total_cmp);
    *value
}

fn axis_median(centers: &[Vec3], indices: &[usize], axis: usize) -> f32 {
    let mut values: Vec<f32> = indices.iter().map(|&i| centers[i][axis]).collect();
    median(&mut values)
}

/// Lowest SAH cost over node center, median and regular planes on all axes.
fn sah_split(
    aabb: &Aabb,
    bounds: &[Aabb],
    centers: &[Vec3],
    indices: &[usize],
    info: &BvhBuildInfo,
) -> (usize, f32) {
    let parent_area = aabb.surface_area();
    let parent_area = if parent_area > 0.0 { parent_area } else { 1.0 };
    let extent = aabb.extent();
    let center = aabb.center();

    let mut best = (aabb.largest_axis(), center[aabb.largest_axis()]);
    let mut best_cost = f32::INFINITY;

    for axis in 0..3 {
        let mut candidates = vec![center[axis], axis_median(centers, indices, axis)];
        let regions = info.regular_split_count + 1;
        candidates.extend((1..regions).map(|i| aabb.min[axis] + extent[axis] * i as f32 / regions as f32));

        for split in candidates {
            let mut left = (Aabb::EMPTY, 0usize);
            let mut right = (Aabb::EMPTY, 0usize);
            for &i in indices {
                let side = if centers[i][axis] <= split { &mut left } else { &mut right };
                side.0.expand(&bounds[i]);
                side.1 += 1;
            }

            let cost = (left.0.surface_area() / parent_area) * left.1 as f32
                + (right.0.surface_area() / parent_area) * right.1 as f32;
            if cost < best_cost {
                best_cost = cost;
                best = (axis, split);
            }
        }
    }

    best
}

fn policy_split(
    aabb: &Aabb,
    centers: &[Vec3],
    indices: &[usize],
    info: &BvhBuildInfo,
    rng: &mut StdRng,
) -> (usize, f32) {
    let axis = match info.axis_selection {
        BvhAxisSelection::Largest => aabb.largest_axis(),
        BvhAxisSelection::Random => rng.gen_range(0..3),
    };
    let split = match info.axis_split {
        BvhAxisSplit::Middle => aabb.center()[axis],
        BvhAxisSplit::Median => axis_median(centers, indices, axis),
        BvhAxisSplit::Random => aabb.min[axis] + rng.gen::<f32>() * aabb.extent()[axis],
    };
    (axis, split)
}

/// Swap primitives with `center <= split` to the front of `[start, end)`.
/// Falls back to halving the range if everything lands on one side.
fn partition(
    ordered: &mut [usize],
    centers: &[Vec3],
    start: usize,
    end: usize,
    axis: usize,
    split: f32,
) -> usize {
    let mut i = start;
    let mut j = end;
    while i < j {
        if centers[ordered[i]][axis] <= split {
            i += 1;
        } else {
            j -= 1;
            ordered.swap(i, j);
        }
    }

    if i == start || i == end {
        start + (end - start) / 2
    } else {
        i
    }
}
