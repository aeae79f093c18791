//! Whitted-style recursive ray tracer.
//!
//! Each hit is shaded with local Phong lighting plus recursively traced
//! reflection and refraction rays. Recursion stops only when a ray reaches
//! `GeneralSettings::max_ray_iterations`.

use lux_core::{CrossingDirection, Intersection, Material, Scene};
use lux_math::{Color, Onb, Ray, Vec2, Vec3};
use rand::RngCore;

use crate::lighting::local_lighting;
use crate::sampler::Sampler;

/// Texture space step used to differentiate height maps.
const BUMP_DELTA: f32 = 1.0e-3;

/// Counters collected while tracing.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TraceStats {
    /// Camera, reflection and refraction rays.
    pub rays: u64,
    /// Shadow and occlusion probes.
    pub shadow_rays: u64,
    /// Largest `Ray::iteration` traced.
    pub deepest_iteration: u32,
}

impl TraceStats {
    pub fn total_rays(&self) -> u64 {
        self.rays + self.shadow_rays
    }

    pub fn merge(&mut self, other: &TraceStats) {
        self.rays += other.rays;
        self.shadow_rays += other.shadow_rays;
        self.deepest_iteration = self.deepest_iteration.max(other.deepest_iteration);
    }
}

/// Schlick's approximation of the Fresnel reflectance for light going
/// from index `n1` into `n2`. Returns 1 under total internal reflection.
pub fn schlick(cos_incident: f32, n1: f32, n2: f32) -> f32 {
    let rf0 = ((n2 - n1) / (n2 + n1)).powi(2);
    let mut cosine = cos_incident.clamp(0.0, 1.0);

    if n1 > n2 {
        let sin_t2 = (n1 / n2).powi(2) * (1.0 - cosine * cosine);
        if sin_t2 > 1.0 {
            return 1.0;
        }
        cosine = (1.0 - sin_t2).sqrt();
    }

    rf0 + (1.0 - rf0) * (1.0 - cosine).powi(5)
}

/// Refract `direction` through a surface whose `normal` faces against it,
/// with `eta = n1 / n2`. `None` under total internal reflection.
pub fn refract(direction: Vec3, normal: Vec3, eta: f32) -> Option<Vec3> {
    let cos_i = -direction.dot(normal);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    Some((direction * eta + normal * (eta * cos_i - k.sqrt())).normalize())
}

pub struct WhittedTracer<'a> {
    scene: &'a Scene,
    sampler: Sampler,
}

impl<'a> WhittedTracer<'a> {
    pub fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            sampler: Sampler::new(scene.general.secondary_sampler),
        }
    }

    pub fn scene(&self) -> &Scene {
        self.scene
    }

    /// Color seen along `ray`.
    pub fn trace(&self, ray: &Ray, rng: &mut dyn RngCore, stats: &mut TraceStats) -> Color {
        self.trace_ray(ray, rng, stats).0
    }

    /// Color and hit distance along `ray` (infinite on a miss).
    fn trace_ray(&self, ray: &Ray, rng: &mut dyn RngCore, stats: &mut TraceStats) -> (Color, f32) {
        stats.rays += 1;
        stats.deepest_iteration = stats.deepest_iteration.max(ray.iteration);

        let general = &self.scene.general;
        let mut isect = Intersection::default();
        if !self.scene.intersect(ray, &mut isect) {
            return (general.background_color, f32::INFINITY);
        }

        if general.visualize_depth {
            let depth = (isect.distance / general.visualize_depth_max_distance.max(f32::EPSILON)).clamp(0.0, 1.0);
            return (Color::gray(1.0 - depth), isect.distance);
        }

        let Some(material) = self.scene.material_for(&isect) else {
            return (general.background_color, isect.distance);
        };
        let textures = &self.scene.textures;
        let outside = isect.direction == CrossingDirection::In;

        if material.skip_lighting {
            let color = material.diffuse_at(textures, &isect);
            return (self.apply_fog(color, &isect, outside), isect.distance);
        }

        if general.enable_normal_mapping {
            apply_normal_maps(self.scene, material, &mut isect);
        }

        let (n1, n2) = if outside {
            (1.0, material.refractive_index)
        } else {
            (material.refractive_index, 1.0)
        };
        let refracted = refract(ray.direction, isect.normal, n1 / n2);

        let mut reflectance = material.reflectance;
        let mut transmittance = material.transmittance;
        if material.is_transmissive() && refracted.is_none() {
            reflectance += transmittance;
            transmittance = 0.0;
        } else if material.fresnel_reflection {
            let fresnel = schlick(-ray.direction.dot(isect.normal), n1, n2);
            reflectance *= fresnel;
            transmittance *= 1.0 - fresnel;
        }

        let mut color = Color::BLACK;
        let can_recurse = ray.iteration < general.max_ray_iterations;

        if can_recurse && reflectance > 0.0 {
            let direction = lux_math::reflect(ray.direction, isect.normal);
            let glossiness = material
                .enable_reflection_glossiness
                .then_some((material.reflection_glossiness, material.reflection_glossiness_samples));
            let (reflected, _) = self.trace_secondary(ray, &isect, direction, glossiness, rng, stats);
            color += reflected * reflectance;
        }

        if can_recurse && transmittance > 0.0 {
            if let Some(direction) = refracted {
                let glossiness = material
                    .enable_transmission_glossiness
                    .then_some((material.transmission_glossiness, material.transmission_glossiness_samples));
                let (mut transmitted, distance) = self.trace_secondary(ray, &isect, direction, glossiness, rng, stats);

                if material.attenuating && outside {
                    let amount = Color::attenuation(material.attenuation_factor, distance);
                    transmitted = Color::lerp(material.attenuation_color, transmitted, amount);
                }
                color += transmitted * transmittance;
            }
        }

        color += local_lighting(self.scene, material, &isect, ray.direction, &self.sampler, rng, stats);

        (self.apply_fog(color, &isect, outside), isect.distance)
    }

    /// Trace a reflection or refraction ray leaving the hit, averaged over
    /// a cone of `samples × samples` directions when glossy.
    fn trace_secondary(
        &self,
        parent: &Ray,
        isect: &Intersection,
        direction: Vec3,
        glossiness: Option<(f32, u32)>,
        rng: &mut dyn RngCore,
        stats: &mut TraceStats,
    ) -> (Color, f32) {
        let secondary = |direction: Vec3| {
            let mut ray = Ray::new(isect.position, direction);
            ray.min_distance = self.scene.general.ray_min_distance;
            ray.iteration = parent.iteration + 1;
            ray
        };

        let Some((spread, samples)) = glossiness else {
            return self.trace_ray(&secondary(direction), rng, stats);
        };

        let cone = Onb::from_normal(direction);
        let offsets = self.sampler.disc_samples(samples, rng);
        let mut color = Color::BLACK;
        let mut distance = 0.0;
        for offset in &offsets {
            let perturbed = direction + (cone.u * offset.x + cone.v * offset.y) * spread;
            let (c, d) = self.trace_ray(&secondary(perturbed), rng, stats);
            color += c;
            distance += d;
        }

        let count = offsets.len() as f32;
        (color / count, distance / count)
    }

    /// Fog only applies to hits seen from outside a solid.
    fn apply_fog(&self, color: Color, isect: &Intersection, outside: bool) -> Color {
        let fog = &self.scene.fog;
        if fog.enabled && outside {
            fog.apply(color, isect.distance, isect.position.y)
        } else {
            color
        }
    }
}

/// Perturb the shading normal with the material's normal and height maps.
fn apply_normal_maps(scene: &Scene, material: &Material, isect: &mut Intersection) {
    let textures = &scene.textures;
    let texcoord = material.map_texcoord(isect);

    if let Some(map) = material.normal_map(textures) {
        let local = map.normal_at(isect.position, texcoord);
        if let Some(normal) = isect.onb.to_world(local).try_normalize() {
            let tangent = isect.onb.u;
            isect.normal = normal;
            isect.set_tangent(tangent);
        }
    }

    if let Some(map) = material.height_map(textures) {
        let height = map.value_at(isect.position, texcoord);
        let du = map.value_at(isect.position, texcoord + Vec2::new(BUMP_DELTA, 0.0)) - height;
        let dv = map.value_at(isect.position, texcoord + Vec2::new(0.0, BUMP_DELTA)) - height;
        let gradient = (isect.onb.u * du + isect.onb.v * dv) * (material.height_map_strength / BUMP_DELTA);

        if let Some(normal) = (isect.normal - gradient).try_normalize() {
            let tangent = isect.onb.u;
            isect.normal = normal;
            isect.set_tangent(tangent);
        }
    }
}
