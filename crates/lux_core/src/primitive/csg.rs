//! Constructive solid geometry over two span-capable children.

use std::str::FromStr;

use arrayvec::ArrayVec;
use lux_math::{Aabb, Interval, Ray};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::intersection::{CrossingDirection, Intersection};
use crate::scene::Scene;

type Span = [Intersection; 2];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsgOperation {
    #[default]
    Union,
    Difference,
    Intersection,
}

impl FromStr for CsgOperation {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "union" => Ok(CsgOperation::Union),
            "difference" => Ok(CsgOperation::Difference),
            "intersection" => Ok(CsgOperation::Intersection),
            _ => Err(SceneError::unknown("csg operation", s)),
        }
    }
}

/// Boolean combination of two primitives, referenced by id.
#[derive(Debug, Clone)]
pub struct Csg {
    pub operation: CsgOperation,
    pub left_id: u32,
    pub right_id: u32,
    pub(crate) left: usize,
    pub(crate) right: usize,
    pub(crate) bounds: Aabb,
}

impl Csg {
    pub fn new(operation: CsgOperation, left_id: u32, right_id: u32) -> Self {
        Self {
            operation,
            left_id,
            right_id,
            left: 0,
            right: 0,
            bounds: Aabb::EMPTY,
        }
    }

    /// Cache the bounds once both children's bounds are known.
    pub(crate) fn update_bounds(&mut self, left: &Aabb, right: &Aabb) {
        self.bounds = match self.operation {
            CsgOperation::Union => Aabb::surrounding(left, right),
            CsgOperation::Difference => *left,
            CsgOperation::Intersection => {
                let overlap = Aabb::from_min_max(left.min.max(right.min), left.max.min(right.max));
                if overlap.is_empty() {
                    *left
                } else {
                    overlap
                }
            }
        };
    }

    pub fn aabb(&self) -> Aabb {
        self.bounds
    }

    pub fn intersect_span(&self, scene: &Scene, ray: &Ray) -> Option<Span> {
        let left = scene.primitives[self.left].intersect_span(scene, ray);
        let right = scene.primitives[self.right].intersect_span(scene, ray);
        combine_spans(self.operation, left, right, ray.min_distance)
    }

    pub fn intersect(&self, scene: &Scene, ray: &Ray, isect: &mut Intersection) -> bool {
        let Some([entry, exit]) = self.intersect_span(scene, ray) else {
            return false;
        };

        let hit = if entry.distance >= ray.min_distance {
            entry
        } else {
            exit
        };
        if !isect.accepts(ray, hit.distance) {
            return false;
        }

        *isect = hit;
        isect.was_found = true;
        true
    }
}

fn interval(span: &Span) -> Interval {
    Interval::new(span[0].distance, span[1].distance)
}

/// Combine the spans of two children.
///
/// Operations that can yield two disjoint pieces return the first piece
/// that still reaches `min_distance`. The result is always tagged as an
/// entry followed by an exit.
pub(crate) fn combine_spans(
    operation: CsgOperation,
    left: Option<Span>,
    right: Option<Span>,
    min_distance: f32,
) -> Option<Span> {
    let mut pieces = ArrayVec::<Span, 2>::new();

    match (left, right) {
        (None, None) => return None,
        (Some(l), None) => match operation {
            CsgOperation::Union | CsgOperation::Difference => pieces.push(l),
            CsgOperation::Intersection => return None,
        },
        (None, Some(r)) => match operation {
            CsgOperation::Union => pieces.push(r),
            CsgOperation::Difference | CsgOperation::Intersection => return None,
        },
        (Some(l), Some(r)) => {
            let (li, ri) = (interval(&l), interval(&r));
            match operation {
                CsgOperation::Union => {
                    if li.is_disjoint(&ri) {
                        let (first, second) = if l[0].distance <= r[0].distance {
                            (l, r)
                        } else {
                            (r, l)
                        };
                        pieces.push(first);
                        pieces.push(second);
                    } else {
                        let entry = if l[0].distance <= r[0].distance { l[0] } else { r[0] };
                        let exit = if l[1].distance >= r[1].distance { l[1] } else { r[1] };
                        pieces.push([entry, exit]);
                    }
                }
                CsgOperation::Difference => {
                    if ri.covers(&li) {
                        return None;
                    } else if li.is_disjoint(&ri) {
                        pieces.push(l);
                    } else if r[0].distance <= l[0].distance {
                        pieces.push([r[1], l[1]]);
                    } else if r[1].distance >= l[1].distance {
                        pieces.push([l[0], r[0]]);
                    } else {
                        pieces.push([l[0], r[0]]);
                        pieces.push([r[1], l[1]]);
                    }
                }
                CsgOperation::Intersection => {
                    if ri.covers(&li) {
                        pieces.push(l);
                    } else if li.covers(&ri) {
                        pieces.push(r);
                    } else if li.is_disjoint(&ri) {
                        return None;
                    } else {
                        let entry = if l[0].distance >= r[0].distance { l[0] } else { r[0] };
                        let exit = if l[1].distance <= r[1].distance { l[1] } else { r[1] };
                        pieces.push([entry, exit]);
                    }
                }
            }
        }
    }

    pieces
        .into_iter()
        .find(|piece| piece[1].distance >= min_distance)
        .map(|[mut entry, mut exit]| {
            entry.direction = CrossingDirection::In;
            exit.direction = CrossingDirection::Out;
            [entry, exit]
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::primitive::{Primitive, PrimitiveKind, Sphere};
    use approx::assert_abs_diff_eq;
    use lux_math::Vec3;

    fn span(entry: f32, exit: f32) -> Span {
        let mut a = Intersection::default();
        a.distance = entry;
        let mut b = Intersection::default();
        b.distance = exit;
        [a, b]
    }

    fn distances(span: Option<Span>) -> Option<(f32, f32)> {
        span.map(|[a, b]| (a.distance, b.distance))
    }

    /// Unit spheres at x = ±0.5 combined into primitive 3.
    fn scene_with(operation: CsgOperation) -> Scene {
        let mut scene = Scene::default();
        scene.materials.push(Material::new(0));
        scene.add_primitive(
            Primitive::new(1, 0, PrimitiveKind::Sphere(Sphere::new(Vec3::new(-0.5, 0.0, 0.0), 1.0))).invisible(),
        );
        scene.add_primitive(
            Primitive::new(2, 0, PrimitiveKind::Sphere(Sphere::new(Vec3::new(0.5, 0.0, 0.0), 1.0))).invisible(),
        );
        scene.add_primitive(Primitive::new(3, 0, PrimitiveKind::Csg(Csg::new(operation, 1, 2))));
        scene.initialize().expect("scene");
        scene
    }

    #[test]
    fn test_union_merges_overlap() {
        let result = combine_spans(CsgOperation::Union, Some(span(1.0, 3.0)), Some(span(2.0, 5.0)), 0.0);
        assert_eq!(distances(result), Some((1.0, 5.0)));
    }

    #[test]
    fn test_union_disjoint_picks_reachable_piece() {
        let left = Some(span(-4.0, -2.0));
        let right = Some(span(1.0, 2.0));
        let result = combine_spans(CsgOperation::Union, left, right, 0.001);
        assert_eq!(distances(result), Some((1.0, 2.0)));
    }

    #[test]
    fn test_difference_clips() {
        let result = combine_spans(CsgOperation::Difference, Some(span(1.0, 5.0)), Some(span(0.0, 2.0)), 0.0);
        assert_eq!(distances(result), Some((2.0, 5.0)));

        let result = combine_spans(CsgOperation::Difference, Some(span(1.0, 5.0)), Some(span(4.0, 8.0)), 0.0);
        assert_eq!(distances(result), Some((1.0, 4.0)));
    }

    #[test]
    fn test_difference_hole_splits_span() {
        let left = Some(span(1.0, 5.0));
        let right = Some(span(2.0, 3.0));
        assert_eq!(
            distances(combine_spans(CsgOperation::Difference, left, right, 0.0)),
            Some((1.0, 2.0))
        );
        // Origin inside the hole: the far piece is the one left
        assert_eq!(
            distances(combine_spans(CsgOperation::Difference, left, right, 2.5)),
            Some((3.0, 5.0))
        );
    }

    #[test]
    fn test_difference_identical_spans_vanish() {
        let result = combine_spans(CsgOperation::Difference, Some(span(1.0, 2.0)), Some(span(1.0, 2.0)), 0.0);
        assert!(result.is_none());
    }

    #[test]
    fn test_intersection_overlap() {
        let result = combine_spans(CsgOperation::Intersection, Some(span(1.0, 3.0)), Some(span(2.0, 5.0)), 0.0);
        assert_eq!(distances(result), Some((2.0, 3.0)));

        let result = combine_spans(CsgOperation::Intersection, Some(span(1.0, 2.0)), Some(span(3.0, 5.0)), 0.0);
        assert!(result.is_none());
    }

    #[test]
    fn test_result_is_tagged() {
        let mut left = span(1.0, 3.0);
        left[0].direction = CrossingDirection::Out;
        left[1].direction = CrossingDirection::In;
        let [entry, exit] = combine_spans(CsgOperation::Union, Some(left), None, 0.0).expect("span");
        assert_eq!(entry.direction, CrossingDirection::In);
        assert_eq!(exit.direction, CrossingDirection::Out);
    }

    #[test]
    fn test_scene_union_hits_nearest_sphere() {
        let scene = scene_with(CsgOperation::Union);
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_X);
        let mut isect = Intersection::default();

        assert!(scene.intersect(&ray, &mut isect));
        assert_abs_diff_eq!(isect.distance, 3.5, epsilon = 1e-4);
        assert_eq!(isect.primitive_id, Some(3));
    }

    #[test]
    fn test_scene_intersection_outside_lens_misses() {
        let scene = scene_with(CsgOperation::Intersection);
        let ray = Ray::new(Vec3::new(-1.2, -5.0, 0.0), Vec3::Y);
        let mut isect = Intersection::default();
        assert!(!scene.intersect(&ray, &mut isect));

        let ray = Ray::new(Vec3::new(0.0, -5.0, 0.0), Vec3::Y);
        assert!(scene.intersect(&ray, &mut isect));
    }

    #[test]
    fn test_scene_difference_removes_overlap() {
        let scene = scene_with(CsgOperation::Difference);
        let ray = Ray::new(Vec3::new(0.4, -5.0, 0.0), Vec3::Y);
        let mut isect = Intersection::default();
        assert!(!scene.intersect(&ray, &mut isect));

        // Through the part of A that B does not reach
        let ray = Ray::new(Vec3::new(-1.2, -5.0, 0.0), Vec3::Y);
        assert!(scene.intersect(&ray, &mut isect));
    }
}
