//! A set of primitives intersected together, optionally through a BVH.

use lux_math::{Aabb, Ray};

use crate::bvh::{BvhBuildInfo, FlatBvh};
use crate::intersection::Intersection;
use crate::scene::Scene;

#[derive(Debug, Clone, Default)]
pub struct PrimitiveGroup {
    pub member_ids: Vec<u32>,
    pub use_bvh: bool,
    pub build_info: BvhBuildInfo,
    pub(crate) members: Vec<usize>,
    bvh: Option<FlatBvh>,
    pub(crate) bounds: Aabb,
}

impl PrimitiveGroup {
    pub fn new(member_ids: Vec<u32>) -> Self {
        Self {
            member_ids,
            bounds: Aabb::EMPTY,
            ..Self::default()
        }
    }

    /// Accelerate member lookups with a BVH built at scene initialization.
    pub fn with_bvh(mut self, build_info: BvhBuildInfo) -> Self {
        self.use_bvh = true;
        self.build_info = build_info;
        self
    }

    pub fn aabb(&self) -> Aabb {
        self.bounds
    }

    pub fn has_bvh(&self) -> bool {
        self.bvh.is_some()
    }

    /// Cache the bounds and build the BVH from the members' bounds, given in
    /// member order.
    pub(crate) fn build(&mut self, member_bounds: &[Aabb], seed: u64) {
        self.bounds = member_bounds.iter().fold(Aabb::EMPTY, |mut aabb, b| {
            aabb.expand(b);
            aabb
        });
        self.bvh = (self.use_bvh && !member_bounds.is_empty())
            .then(|| FlatBvh::build(member_bounds, &self.build_info, seed));
    }

    pub fn intersect(&self, scene: &Scene, ray: &Ray, isect: &mut Intersection) -> bool {
        match &self.bvh {
            Some(bvh) => bvh.intersect(ray, isect, |i, ray, isect| {
                scene.primitives[self.members[i]].intersect(scene, ray, isect)
            }),
            None => {
                let mut found = false;
                for &member in &self.members {
                    if scene.primitives[member].intersect(scene, ray, isect) {
                        found = true;
                        if ray.fast_occlusion {
                            break;
                        }
                    }
                }
                found
            }
        }
    }
}
