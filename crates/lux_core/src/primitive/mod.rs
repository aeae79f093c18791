//! Scene primitives.
//!
//! Every primitive lives in the scene's primitive arena. Composite kinds
//! (CSG, instances and groups) refer to other primitives by id; the ids
//! are resolved to arena indices once by `Scene::initialize`, and the
//! intersection routines receive the scene to follow those indices.

mod blinn_blob;
mod box_shape;
mod csg;
mod cylinder;
mod group;
mod instance;
mod plane;
mod sphere;
mod torus;
mod triangle;

pub use blinn_blob::{BlinnBlob, BlobPoint};
pub use box_shape::BoxShape;
pub use csg::{Csg, CsgOperation};
pub use cylinder::Cylinder;
pub use group::PrimitiveGroup;
pub use instance::Instance;
pub use plane::Plane;
pub use sphere::Sphere;
pub use torus::Torus;
pub use triangle::Triangle;

use lux_math::{scale_rotate_translate, Aabb, EulerAngle, Mat3, Mat4, Ray, Vec3};

use crate::intersection::Intersection;
use crate::scene::Scene;

/// How many masked-out hits a ray may skip on one primitive.
const MAX_MASK_SKIPS: usize = 8;

/// Scale, rotation and translation applied about a pivot point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub scale: Vec3,
    pub rotate: EulerAngle,
    pub translate: Vec3,
    pub pivot: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotate: EulerAngle::ZERO,
            translate: Vec3::ZERO,
            pivot: Vec3::ZERO,
        }
    }
}

impl Transform {
    /// Transform about the world origin.
    pub fn new(scale: Vec3, rotate: EulerAngle, translate: Vec3) -> Self {
        Self {
            scale,
            rotate,
            translate,
            pivot: Vec3::ZERO,
        }
    }

    pub fn with_pivot(mut self, pivot: Vec3) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        scale_rotate_translate(self.pivot, self.scale, self.rotate, self.translate)
    }

    /// Rotation part only.
    pub fn rotation(&self) -> Mat3 {
        Mat3::from_mat4(self.rotate.rotation_matrix())
    }
}

/// Geometry of a primitive.
#[derive(Debug, Clone)]
pub enum PrimitiveKind {
    Sphere(Sphere),
    Plane(Plane),
    Triangle(Triangle),
    Box(BoxShape),
    Cylinder(Cylinder),
    Torus(Torus),
    BlinnBlob(BlinnBlob),
    Csg(Csg),
    Instance(Instance),
    Group(PrimitiveGroup),
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Sphere(_) => "sphere",
            PrimitiveKind::Plane(_) => "plane",
            PrimitiveKind::Triangle(_) => "triangle",
            PrimitiveKind::Box(_) => "box",
            PrimitiveKind::Cylinder(_) => "cylinder",
            PrimitiveKind::Torus(_) => "torus",
            PrimitiveKind::BlinnBlob(_) => "blinn blob",
            PrimitiveKind::Csg(_) => "csg",
            PrimitiveKind::Instance(_) => "instance",
            PrimitiveKind::Group(_) => "group",
        }
    }

    /// True if the kind can report paired entry/exit crossings, which CSG
    /// children must do.
    pub fn supports_span(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Sphere(_)
                | PrimitiveKind::Box(_)
                | PrimitiveKind::Cylinder(_)
                | PrimitiveKind::Csg(_)
        )
    }

    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Csg(_) | PrimitiveKind::Instance(_) | PrimitiveKind::Group(_)
        )
    }

    pub fn intersect(&self, scene: &Scene, ray: &Ray, isect: &mut Intersection) -> bool {
        match self {
            PrimitiveKind::Sphere(sphere) => sphere.intersect(ray, isect),
            PrimitiveKind::Plane(plane) => plane.intersect(ray, isect),
            PrimitiveKind::Triangle(triangle) => triangle.intersect(ray, isect),
            PrimitiveKind::Box(shape) => shape.intersect(ray, isect),
            PrimitiveKind::Cylinder(cylinder) => cylinder.intersect(ray, isect),
            PrimitiveKind::Torus(torus) => torus.intersect(ray, isect),
            PrimitiveKind::BlinnBlob(blob) => blob.intersect(ray, isect),
            PrimitiveKind::Csg(csg) => csg.intersect(scene, ray, isect),
            PrimitiveKind::Instance(instance) => instance.intersect(scene, ray, isect),
            PrimitiveKind::Group(group) => group.intersect(scene, ray, isect),
        }
    }

    pub fn intersect_span(&self, scene: &Scene, ray: &Ray) -> Option<[Intersection; 2]> {
        match self {
            PrimitiveKind::Sphere(sphere) => sphere.intersect_span(ray),
            PrimitiveKind::Box(shape) => shape.intersect_span(ray),
            PrimitiveKind::Cylinder(cylinder) => cylinder.intersect_span(ray),
            PrimitiveKind::Csg(csg) => csg.intersect_span(scene, ray),
            _ => None,
        }
    }

    /// Bounding box used for BVH construction. Composite bounds are cached
    /// by `Scene::initialize`.
    pub fn aabb(&self) -> Aabb {
        match self {
            PrimitiveKind::Sphere(sphere) => sphere.aabb(),
            PrimitiveKind::Plane(plane) => plane.aabb(),
            PrimitiveKind::Triangle(triangle) => triangle.aabb(),
            PrimitiveKind::Box(shape) => shape.aabb(),
            PrimitiveKind::Cylinder(cylinder) => cylinder.aabb(),
            PrimitiveKind::Torus(torus) => torus.aabb(),
            PrimitiveKind::BlinnBlob(blob) => blob.aabb(),
            PrimitiveKind::Csg(csg) => csg.aabb(),
            PrimitiveKind::Instance(instance) => instance.aabb(),
            PrimitiveKind::Group(group) => group.aabb(),
        }
    }

    /// Ids of the primitives this one refers to.
    pub fn child_ids(&self) -> Vec<u32> {
        match self {
            PrimitiveKind::Csg(csg) => vec![csg.left_id, csg.right_id],
            PrimitiveKind::Instance(instance) => vec![instance.primitive_id],
            PrimitiveKind::Group(group) => group.member_ids.clone(),
            _ => Vec::new(),
        }
    }

    /// Resolved arena indices of the children. Empty before initialization.
    pub(crate) fn child_indices(&self) -> Vec<usize> {
        match self {
            PrimitiveKind::Csg(csg) => vec![csg.left, csg.right],
            PrimitiveKind::Instance(instance) => vec![instance.target],
            PrimitiveKind::Group(group) => group.members.clone(),
            _ => Vec::new(),
        }
    }

    /// Apply a transform to the kind's own geometry. Composite children are
    /// handled by `Scene::transform_primitive`.
    pub(crate) fn transform(&mut self, transform: &Transform) {
        match self {
            PrimitiveKind::Sphere(sphere) => sphere.transform(transform),
            PrimitiveKind::Plane(plane) => plane.transform(transform),
            PrimitiveKind::Triangle(triangle) => triangle.transform(transform),
            PrimitiveKind::Box(shape) => shape.transform(transform),
            PrimitiveKind::Cylinder(cylinder) => cylinder.transform(transform),
            PrimitiveKind::Torus(torus) => torus.transform(transform),
            PrimitiveKind::BlinnBlob(blob) => blob.transform(transform),
            PrimitiveKind::Instance(instance) => instance.transform(transform),
            PrimitiveKind::Csg(_) | PrimitiveKind::Group(_) => {}
        }
    }
}

/// A primitive in the scene arena.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub id: u32,
    pub material_id: u32,
    /// Invisible primitives are only reachable through composites.
    pub invisible: bool,
    pub kind: PrimitiveKind,
    /// Index into `Scene::materials`, set by `Scene::initialize`.
    pub(crate) material: usize,
    /// Copied from the material; shadow rays pass through.
    pub(crate) non_shadowing: bool,
}

impl Primitive {
    pub fn new(id: u32, material_id: u32, kind: PrimitiveKind) -> Self {
        Self {
            id,
            material_id,
            invisible: false,
            kind,
            material: 0,
            non_shadowing: false,
        }
    }

    /// Builder style helper to hide the primitive from direct ray queries.
    pub fn invisible(mut self) -> Self {
        self.invisible = true;
        self
    }

    /// Resolved material index.
    pub fn material_index(&self) -> usize {
        self.material
    }

    pub fn aabb(&self) -> Aabb {
        self.kind.aabb()
    }

    /// Intersect and, on a closer hit, update `isect`.
    ///
    /// Returns true right away when the ray only needs occlusion and a hit
    /// is already known. Hits rejected by the material's mask map let the
    /// ray continue past them.
    pub fn intersect(&self, scene: &Scene, ray: &Ray, isect: &mut Intersection) -> bool {
        if ray.fast_occlusion && isect.was_found {
            return true;
        }
        if ray.is_shadow_ray && self.non_shadowing {
            return false;
        }

        if let PrimitiveKind::Group(group) = &self.kind {
            return group.intersect(scene, ray, isect);
        }

        let material = scene.materials.get(self.material);
        let mut probe = *ray;

        for _ in 0..MAX_MASK_SKIPS {
            let mut candidate = *isect;
            if !self.kind.intersect(scene, &probe, &mut candidate) {
                return false;
            }

            if let Some(material) = material {
                if material.is_masked_out(&scene.textures, &candidate) {
                    probe.min_distance = candidate.distance + scene.general.ray_min_distance;
                    continue;
                }
            }

            candidate.material = Some(self.material);
            candidate.primitive_id = Some(self.id);
            *isect = candidate;
            return true;
        }

        false
    }

    /// Entry and exit crossings for CSG, tagged with this primitive.
    pub fn intersect_span(&self, scene: &Scene, ray: &Ray) -> Option<[Intersection; 2]> {
        let mut span = self.kind.intersect_span(scene, ray)?;
        for crossing in &mut span {
            crossing.material = Some(self.material);
            crossing.primitive_id = Some(self.id);
        }
        Some(span)
    }
}
