//! Lux Core - scene model for the Lux ray tracer.
//!
//! This crate provides:
//!
//! - **Primitives**: spheres, planes, triangles, boxes, cylinders, tori,
//!   blobs, CSG, instances and groups stored in one arena
//! - **Acceleration**: a flat BVH built with the surface area heuristic
//! - **Shading data**: materials, procedural and image textures, lights,
//!   camera and render settings
//!
//! # Example
//!
//! ```ignore
//! use lux_core::{Material, Primitive, PrimitiveKind, Scene, Sphere};
//!
//! let mut scene = Scene::default();
//! scene.materials.push(Material::new(0));
//! scene.add_primitive(Primitive::new(1, 0, PrimitiveKind::Sphere(Sphere::new(Vec3::ZERO, 1.0))));
//! scene.initialize()?;
//! ```

pub mod bvh;
pub mod camera;
pub mod error;
pub mod image;
pub mod intersection;
pub mod light;
pub mod material;
pub mod mesh;
pub mod primitive;
pub mod scene;
pub mod settings;
pub mod texture;

// Re-export commonly used types
pub use bvh::{BvhAxisSelection, BvhAxisSplit, BvhBuildInfo, FlatBvh};
pub use camera::{Camera, CameraProjection};
pub use error::{SceneError, SceneResult};
pub use self::image::{Image, ImageError, ImagePool};
pub use intersection::{CrossingDirection, Intersection};
pub use light::{AmbientLight, DirectionalLight, Lights, PointLight, SpotLight};
pub use material::{Material, MaterialMaps};
pub use mesh::TriangleMesh;
pub use primitive::{
    BlinnBlob, BlobPoint, BoxShape, Csg, CsgOperation, Cylinder, Instance, Plane, Primitive, PrimitiveGroup,
    PrimitiveKind, Sphere, Torus, Transform, Triangle,
};
pub use scene::Scene;
pub use settings::{BvhSettings, FilterKind, Fog, GeneralSettings, SamplerKind, ToneMapperKind, ToneMapperSettings};
pub use texture::{
    CellNoise, CellSample, ColorGradient, FractalNoise, GradientSegment, NoiseBasis, NoiseSettings, Texture, TextureKind,
};
