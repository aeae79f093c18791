//! Simple Whitted ray tracer example.
//!
//! Renders a small scene with a CSG solid, a mirror and a glass sphere
//! and saves it as PNG. The output path is the first argument.

use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use lux_core::{
    BoxShape, Camera, Csg, CsgOperation, FractalNoise, Material, Plane, PointLight, Primitive, PrimitiveKind, Scene,
    Sphere, Texture, TextureKind,
};
use lux_math::{Color, EulerAngle, Vec3};
use lux_renderer::{trace, ImageBuffer, RenderJob};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let output = std::env::args().nth(1).unwrap_or_else(|| "lux_render.png".to_string());

    let mut scene = build_scene();
    scene.initialize().context("scene setup failed")?;

    let mut image = ImageBuffer::new(WIDTH, HEIGHT);
    let interrupted = AtomicBool::new(false);
    let result = trace(&RenderJob::full_frame(&scene, WIDTH, HEIGHT), &mut image, &interrupted);
    log::info!(
        "{} pixels, {} rays",
        result.pixels_processed,
        result.rays_processed
    );

    image
        .to_rgba_image(&scene.tone_mapper)
        .context("image buffer size mismatch")?
        .save(&output)
        .with_context(|| format!("failed to write {output}"))?;
    log::info!("Saved {output}");

    Ok(())
}

fn build_scene() -> Scene {
    let mut scene = Scene::new();
    scene.general.pixel_samples = 2;
    scene.general.max_ray_iterations = 5;
    scene.general.background_color = Color::new(0.4, 0.55, 0.8);

    scene.camera = Camera::new(Vec3::new(0.0, 3.0, 9.0), EulerAngle::ZERO, 60.0);
    scene.camera.look_at(Vec3::new(0.0, 1.0, 0.0));

    scene.textures.push(Texture::new(
        1,
        TextureKind::CheckerSolid {
            color1: Color::gray(0.9),
            color2: Color::gray(0.2),
            length: 1.0,
        },
    ));
    scene.textures.push(Texture::new(
        2,
        TextureKind::Marble {
            noise: FractalNoise::default(),
            color1: Color::new(0.9, 0.85, 0.8),
            color2: Color::new(0.3, 0.2, 0.2),
            stripes: 4.0,
            turbulence: 5.0,
        },
    ));

    let mut ground = Material::new(0);
    ground.maps.diffuse = Some(1);
    ground.maps.ambient = Some(1);
    ground.specular_color = Color::BLACK;

    let mut marble = Material::new(1);
    marble.maps.diffuse = Some(2);
    marble.maps.ambient = Some(2);

    let mut mirror = Material::mirror(2);
    mirror.fresnel_reflection = false;

    let mut glass = Material::new(3);
    glass.diffuse_color = Color::BLACK;
    glass.ambient_color = Color::BLACK;
    glass.reflectance = 1.0;
    glass.transmittance = 1.0;
    glass.refractive_index = 1.5;
    glass.fresnel_reflection = true;
    glass.attenuating = true;
    glass.attenuation_factor = 0.3;
    glass.attenuation_color = Color::new(0.1, 0.4, 0.2);

    scene.materials.extend([ground, marble, mirror, glass]);

    scene.add_primitive(Primitive::new(1, 0, PrimitiveKind::Plane(Plane::new(Vec3::ZERO, Vec3::Y))));

    // Marble cube with a spherical bite taken out of it
    scene.add_primitive(Primitive::new(
        2,
        1,
        PrimitiveKind::Box(BoxShape::new(Vec3::new(-2.5, 1.0, 0.0), Vec3::splat(2.0))),
    ).invisible());
    scene.add_primitive(Primitive::new(
        3,
        1,
        PrimitiveKind::Sphere(Sphere::new(Vec3::new(-2.0, 1.6, 0.6), 1.0)),
    ).invisible());
    scene.add_primitive(Primitive::new(
        4,
        1,
        PrimitiveKind::Csg(Csg::new(CsgOperation::Difference, 2, 3)),
    ));

    scene.add_primitive(Primitive::new(
        5,
        2,
        PrimitiveKind::Sphere(Sphere::new(Vec3::new(0.0, 1.0, -1.5), 1.0)),
    ));
    scene.add_primitive(Primitive::new(
        6,
        3,
        PrimitiveKind::Sphere(Sphere::new(Vec3::new(2.5, 1.0, 0.5), 1.0)),
    ));

    let mut light = PointLight::new(Vec3::new(4.0, 8.0, 6.0), 1.0);
    light.soft_shadows = true;
    light.radius = 0.5;
    light.sample_count = 3;
    scene.lights.point.push(light);

    scene
}
