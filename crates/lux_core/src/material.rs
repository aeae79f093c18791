//! Surface materials for the Whitted tracer.

use lux_math::{Color, Vec2};
use serde::{Deserialize, Serialize};

use crate::intersection::Intersection;
use crate::texture::Texture;

/// Texture references of a material, by texture id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialMaps {
    pub ambient: Option<u32>,
    pub diffuse: Option<u32>,
    pub specular: Option<u32>,
    pub emittance: Option<u32>,
    /// Tangent space normal map.
    pub normal: Option<u32>,
    /// Bump map, its value gradient perturbs the normal.
    pub height: Option<u32>,
    /// Cut-out map; texels with a value below 0.5 are holes.
    pub mask: Option<u32>,
}

/// Resolved `MaterialMaps`, as indices into `Scene::textures`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct ResolvedMaps {
    pub ambient: Option<usize>,
    pub diffuse: Option<usize>,
    pub specular: Option<usize>,
    pub emittance: Option<usize>,
    pub normal: Option<usize>,
    pub height: Option<usize>,
    pub mask: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub id: u32,

    pub ambient_color: Color,
    pub diffuse_color: Color,
    pub specular_color: Color,
    pub emittance_color: Color,
    pub maps: MaterialMaps,

    /// Phong exponent.
    pub shininess: f32,
    pub reflectance: f32,
    pub transmittance: f32,
    pub refractive_index: f32,
    /// Weight reflection and transmission with Schlick's Fresnel term.
    pub fresnel_reflection: bool,

    pub enable_reflection_glossiness: bool,
    pub reflection_glossiness: f32,
    /// Reflection rays per glossy hit, squared.
    pub reflection_glossiness_samples: u32,
    pub enable_transmission_glossiness: bool,
    pub transmission_glossiness: f32,
    pub transmission_glossiness_samples: u32,

    /// Light traveling inside the material fades towards
    /// `attenuation_color` at rate `attenuation_factor`.
    pub attenuating: bool,
    pub attenuation_factor: f32,
    pub attenuation_color: Color,

    /// Shade with the surface color only.
    pub skip_lighting: bool,
    /// Invisible to shadow and occlusion rays.
    pub non_shadowing: bool,
    pub texcoord_scale: Vec2,
    pub height_map_strength: f32,

    #[serde(skip)]
    pub(crate) resolved: ResolvedMaps,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            id: 0,
            ambient_color: Color::WHITE,
            diffuse_color: Color::gray(0.5),
            specular_color: Color::WHITE,
            emittance_color: Color::BLACK,
            maps: MaterialMaps::default(),
            shininess: 64.0,
            reflectance: 0.0,
            transmittance: 0.0,
            refractive_index: 1.0,
            fresnel_reflection: false,
            enable_reflection_glossiness: false,
            reflection_glossiness: 1.0,
            reflection_glossiness_samples: 4,
            enable_transmission_glossiness: false,
            transmission_glossiness: 1.0,
            transmission_glossiness_samples: 4,
            attenuating: false,
            attenuation_factor: 1.0,
            attenuation_color: Color::BLACK,
            skip_lighting: false,
            non_shadowing: false,
            texcoord_scale: Vec2::ONE,
            height_map_strength: 1.0,
            resolved: ResolvedMaps::default(),
        }
    }
}

impl Material {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Matte material with the given diffuse color.
    pub fn diffuse(id: u32, color: Color) -> Self {
        Self {
            id,
            diffuse_color: color,
            ambient_color: color,
            specular_color: Color::BLACK,
            ..Self::default()
        }
    }

    /// Perfect mirror.
    pub fn mirror(id: u32) -> Self {
        Self {
            id,
            diffuse_color: Color::BLACK,
            ambient_color: Color::BLACK,
            specular_color: Color::BLACK,
            reflectance: 1.0,
            ..Self::default()
        }
    }

    /// Texture ids referenced by the material.
    pub fn texture_ids(&self) -> impl Iterator<Item = u32> + '_ {
        let m = &self.maps;
        [m.ambient, m.diffuse, m.specular, m.emittance, m.normal, m.height, m.mask]
            .into_iter()
            .flatten()
    }

    fn lookup<'a>(&self, textures: &'a [Texture], index: Option<usize>) -> Option<&'a Texture> {
        index.and_then(|i| textures.get(i))
    }

    fn texcoord(&self, isect: &Intersection) -> Vec2 {
        isect.texcoord * self.texcoord_scale
    }

    fn color_or_texture(&self, textures: &[Texture], index: Option<usize>, color: Color, isect: &Intersection) -> Color {
        match self.lookup(textures, index) {
            Some(texture) => texture.color_at(isect.position, self.texcoord(isect)),
            None => color,
        }
    }

    pub fn ambient_at(&self, textures: &[Texture], isect: &Intersection) -> Color {
        self.color_or_texture(textures, self.resolved.ambient, self.ambient_color, isect)
    }

    pub fn diffuse_at(&self, textures: &[Texture], isect: &Intersection) -> Color {
        self.color_or_texture(textures, self.resolved.diffuse, self.diffuse_color, isect)
    }

    pub fn specular_at(&self, textures: &[Texture], isect: &Intersection) -> Color {
        self.color_or_texture(textures, self.resolved.specular, self.specular_color, isect)
    }

    pub fn emittance_at(&self, textures: &[Texture], isect: &Intersection) -> Color {
        self.color_or_texture(textures, self.resolved.emittance, self.emittance_color, isect)
    }

    pub fn normal_map<'a>(&self, textures: &'a [Texture]) -> Option<&'a Texture> {
        self.lookup(textures, self.resolved.normal)
    }

    pub fn height_map<'a>(&self, textures: &'a [Texture]) -> Option<&'a Texture> {
        self.lookup(textures, self.resolved.height)
    }

    /// Scaled texture coordinates used for map lookups.
    pub fn map_texcoord(&self, isect: &Intersection) -> Vec2 {
        self.texcoord(isect)
    }

    /// True if the mask map makes the surface transparent at the hit.
    pub fn is_masked_out(&self, textures: &[Texture], isect: &Intersection) -> bool {
        self.lookup(textures, self.resolved.mask)
            .is_some_and(|mask| mask.value_at(isect.position, self.texcoord(isect)) < 0.5)
    }

    pub fn is_reflective(&self) -> bool {
        self.reflectance > 0.0
    }

    pub fn is_transmissive(&self) -> bool {
        self.transmittance > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureKind;
    use lux_math::Vec3;

    #[test]
    fn test_texture_overrides_color() {
        let textures = vec![Texture::color(7, Color::RED)];
        let mut material = Material::diffuse(1, Color::BLUE);
        let isect = Intersection::default();

        assert_eq!(material.diffuse_at(&textures, &isect), Color::BLUE);

        material.maps.diffuse = Some(7);
        material.resolved.diffuse = Some(0);
        assert_eq!(material.diffuse_at(&textures, &isect), Color::RED);
    }

    #[test]
    fn test_mask_map() {
        let textures = vec![Texture::new(
            2,
            TextureKind::CheckerSolid {
                color1: Color::WHITE,
                color2: Color::BLACK,
                length: 1.0,
            },
        )];
        let mut material = Material::new(1);
        material.resolved.mask = Some(0);

        let mut isect = Intersection::default();
        isect.position = Vec3::splat(0.5);
        assert!(!material.is_masked_out(&textures, &isect));

        isect.position = Vec3::new(1.5, 0.5, 0.5);
        assert!(material.is_masked_out(&textures, &isect));
    }

    #[test]
    fn test_texture_ids() {
        let mut material = Material::new(1);
        material.maps.normal = Some(3);
        material.maps.ambient = Some(1);
        assert_eq!(material.texture_ids().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let material: Material = serde_json::from_str(r#"{ "id": 4, "reflectance": 0.5 }"#).expect("material");
        assert_eq!(material.id, 4);
        assert!(material.is_reflective());
        assert!(!material.is_transmissive());
        assert_eq!(material.texcoord_scale, Vec2::ONE);
    }
}
