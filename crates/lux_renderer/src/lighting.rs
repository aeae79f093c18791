//! Direct illumination: Phong shading, shadows and ambient occlusion.

use lux_core::{Intersection, Material, PointLight, Scene};
use lux_math::{Color, Onb, Ray, Vec3};
use rand::RngCore;

use crate::sampler::Sampler;
use crate::tracer::TraceStats;

/// True if anything blocks the segment from `origin` along `direction`
/// for `distance` units.
pub fn is_occluded(scene: &Scene, origin: Vec3, direction: Vec3, distance: f32, stats: &mut TraceStats) -> bool {
    let offset = scene.general.ray_min_distance;
    let ray = Ray::shadow(origin, direction, offset, distance - offset);
    let mut isect = Intersection::default();
    stats.shadow_rays += 1;
    scene.intersect(&ray, &mut isect)
}

/// Hard shadow from a point light: 1.0 when `position` cannot see
/// `light_position`, 0.0 otherwise.
pub fn shadow_amount(scene: &Scene, position: Vec3, light_position: Vec3, stats: &mut TraceStats) -> f32 {
    let to_light = light_position - position;
    let distance = to_light.length();
    if distance <= 0.0 {
        return 0.0;
    }
    if is_occluded(scene, position, to_light / distance, distance, stats) {
        1.0
    } else {
        0.0
    }
}

/// Fraction of a disc shaped area light that is hidden from `position`.
pub fn soft_shadow_amount(
    scene: &Scene,
    position: Vec3,
    light: &PointLight,
    sampler: &Sampler,
    rng: &mut dyn RngCore,
    stats: &mut TraceStats,
) -> f32 {
    let Some(towards) = (position - light.position).try_normalize() else {
        return 0.0;
    };
    let disc = Onb::from_normal(towards);
    let samples = sampler.disc_samples(light.sample_count, rng);

    let blocked: f32 = samples
        .iter()
        .map(|s| {
            let point = light.position + (disc.u * s.x + disc.v * s.y) * light.radius;
            shadow_amount(scene, position, point, stats)
        })
        .sum();
    blocked / samples.len() as f32
}

/// Fraction of the hemisphere above the hit that is blocked within the
/// ambient light's occlusion distance.
pub fn ambient_occlusion(
    scene: &Scene,
    isect: &Intersection,
    sampler: &Sampler,
    rng: &mut dyn RngCore,
    stats: &mut TraceStats,
) -> f32 {
    let ambient = &scene.lights.ambient;
    let samples = sampler.hemisphere_samples(ambient.occlusion_sample_count, rng);

    let blocked = samples
        .iter()
        .filter(|local| {
            let direction = isect.onb.to_world(**local);
            is_occluded(scene, isect.position, direction, ambient.occlusion_distance, stats)
        })
        .count();
    blocked as f32 / samples.len() as f32
}

/// Diffuse and specular response to one light.
struct Phong {
    diffuse: Color,
    specular: Color,
    shininess: f32,
}

impl Phong {
    fn shade(&self, normal: Vec3, to_viewer: Vec3, to_light: Vec3, light: Color) -> Color {
        let n_dot_l = normal.dot(to_light);
        if n_dot_l <= 0.0 {
            return Color::BLACK;
        }

        let mut color = self.diffuse * light * n_dot_l;
        let reflected = lux_math::reflect(-to_light, normal);
        let r_dot_v = reflected.dot(to_viewer);
        if r_dot_v > 0.0 {
            color += self.specular * light * r_dot_v.powf(self.shininess);
        }
        color
    }
}

/// Ambient, emitted and direct light at a hit seen along `view`.
pub fn local_lighting(
    scene: &Scene,
    material: &Material,
    isect: &Intersection,
    view: Vec3,
    sampler: &Sampler,
    rng: &mut dyn RngCore,
    stats: &mut TraceStats,
) -> Color {
    let textures = &scene.textures;
    let lights = &scene.lights;
    let normal = isect.normal;
    let to_viewer = -view;

    let ambient_light = lights.ambient.color * lights.ambient.intensity;
    let mut ambient = material.ambient_at(textures, isect) * ambient_light;
    if lights.ambient.ambient_occlusion && !ambient_light.is_black() {
        ambient *= 1.0 - ambient_occlusion(scene, isect, sampler, rng, stats);
    }
    let mut color = ambient + material.emittance_at(textures, isect);

    let phong = Phong {
        diffuse: material.diffuse_at(textures, isect),
        specular: material.specular_at(textures, isect),
        shininess: material.shininess,
    };

    for light in &lights.directional {
        let Some(to_light) = (-light.direction).try_normalize() else {
            continue;
        };
        if normal.dot(to_light) <= 0.0 || is_occluded(scene, isect.position, to_light, f32::INFINITY, stats) {
            continue;
        }
        color += phong.shade(normal, to_viewer, to_light, light.color * light.intensity);
    }

    let point_lights = lights
        .point
        .iter()
        .map(|light| (light, 1.0))
        .chain(lights.spot.iter().map(|spot| {
            let towards = (isect.position - spot.light.position).normalize_or_zero();
            (&spot.light, spot.cone_falloff(towards))
        }));

    for (light, cone) in point_lights {
        let offset = light.position - isect.position;
        let distance = offset.length();
        let intensity = light.intensity * light.falloff(distance) * cone;
        if intensity <= 0.0 || distance <= 0.0 {
            continue;
        }

        let to_light = offset / distance;
        if normal.dot(to_light) <= 0.0 {
            continue;
        }

        let shadow = if light.soft_shadows {
            soft_shadow_amount(scene, isect.position, light, sampler, rng, stats)
        } else {
            shadow_amount(scene, isect.position, light.position, stats)
        };
        if shadow >= 1.0 {
            continue;
        }

        color += phong.shade(normal, to_viewer, to_light, light.color * intensity) * (1.0 - shadow);
    }

    color
}
