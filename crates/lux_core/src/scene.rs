//! The scene: settings, lights, textures, materials and the primitive arena.
//!
//! A scene is populated with plain data (ids refer to each other) and then
//! prepared once with [`Scene::initialize`], which resolves every id into
//! an arena index, computes composite bounds and builds the BVHs. After
//! that the scene is only read, so one instance is shared by all render
//! threads.

use std::collections::HashMap;
use std::time::Instant;

use lux_math::{Aabb, EulerAngle, Ray, Vec3};

use crate::bvh::FlatBvh;
use crate::camera::Camera;
use crate::error::{SceneError, SceneResult};
use crate::image::ImagePool;
use crate::intersection::Intersection;
use crate::light::Lights;
use crate::material::{Material, ResolvedMaps};
use crate::mesh::TriangleMesh;
use crate::primitive::{Primitive, PrimitiveGroup, PrimitiveKind, Transform};
use crate::settings::{BvhSettings, Fog, GeneralSettings, ToneMapperSettings};
use crate::texture::Texture;

#[derive(Debug, Default)]
pub struct Scene {
    pub general: GeneralSettings,
    pub camera: Camera,
    pub bvh: BvhSettings,
    pub fog: Fog,
    pub tone_mapper: ToneMapperSettings,
    pub lights: Lights,

    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,
    pub primitives: Vec<Primitive>,

    // Set by initialize()
    visible: Vec<usize>,
    invisible: Vec<usize>,
    root_bvh: Option<FlatBvh>,
    texture_index: HashMap<u32, usize>,
    material_index: HashMap<u32, usize>,
    primitive_index: HashMap<u32, usize>,
}

/// Traversal state of a primitive during cycle detection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

fn index_by_id<T>(items: &[T], id: impl Fn(&T) -> u32, duplicate: fn(u32) -> SceneError) -> SceneResult<HashMap<u32, usize>> {
    let mut map = HashMap::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if map.insert(id(item), index).is_some() {
            return Err(duplicate(id(item)));
        }
    }
    Ok(map)
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primitive to the arena and return its index.
    pub fn add_primitive(&mut self, primitive: Primitive) -> usize {
        self.primitives.push(primitive);
        self.primitives.len() - 1
    }

    /// Expand `mesh` into invisible triangles collected by a new group with
    /// id `group_id`. The group gets a BVH built with the scene's build
    /// settings. Triangle ids continue after the largest id in use.
    ///
    /// Returns the arena index of the group.
    pub fn add_mesh(&mut self, mesh: &TriangleMesh, group_id: u32, material_id: u32, smooth: bool) -> usize {
        let triangles = if smooth {
            let mut mesh = mesh.clone();
            mesh.ensure_normals();
            mesh.triangles(true)
        } else {
            mesh.triangles(smooth)
        };

        if triangles.is_empty() {
            log::warn!("Mesh for group {} has no valid triangles", group_id);
        }

        let mut next_id = self
            .primitives
            .iter()
            .map(|p| p.id)
            .chain(std::iter::once(group_id))
            .max()
            .map_or(0, |id| id + 1);

        let mut member_ids = Vec::with_capacity(triangles.len());
        for triangle in triangles {
            let id = next_id;
            next_id += 1;
            member_ids.push(id);
            self.add_primitive(Primitive::new(id, material_id, PrimitiveKind::Triangle(triangle)).invisible());
        }

        let group = PrimitiveGroup::new(member_ids).with_bvh(self.bvh.build_info);
        self.add_primitive(Primitive::new(group_id, material_id, PrimitiveKind::Group(group)))
    }

    /// Scale, rotate and translate the primitive at `index` about the
    /// center of its bounds.
    ///
    /// CSG children and group members are transformed along with it;
    /// instances compose the transform with their own. Children shared
    /// with other composites move for those too. Composite bounds and
    /// BVHs are refreshed by the next `initialize`.
    pub fn transform_primitive(&mut self, index: usize, scale: Vec3, rotate: EulerAngle, translate: Vec3) -> SceneResult<()> {
        let Some(primitive) = self.primitives.get(index) else {
            return Ok(());
        };

        let aabb = primitive.aabb();
        let pivot = if aabb.is_empty() { Vec3::ZERO } else { aabb.center() };
        let transform = Transform::new(scale, rotate, translate).with_pivot(pivot);

        let ids: HashMap<u32, usize> = self
            .primitives
            .iter()
            .enumerate()
            .map(|(index, primitive)| (primitive.id, index))
            .collect();

        let mut visited = vec![false; self.primitives.len()];
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            if std::mem::replace(&mut visited[current], true) {
                continue;
            }

            let primitive = &mut self.primitives[current];
            primitive.kind.transform(&transform);

            if matches!(primitive.kind, PrimitiveKind::Csg(_) | PrimitiveKind::Group(_)) {
                let owner = primitive.id;
                for child in primitive.kind.child_ids() {
                    let child_index = *ids.get(&child).ok_or(SceneError::MissingPrimitive {
                        owner,
                        primitive: child,
                    })?;
                    stack.push(child_index);
                }
            }
        }

        Ok(())
    }

    /// Prepare the scene for rendering with a fresh image pool.
    pub fn initialize(&mut self) -> SceneResult<()> {
        let mut pool = ImagePool::new();
        self.initialize_with_pool(&mut pool)
    }

    /// Resolve all id references, compute composite bounds and build the
    /// acceleration structures. Image textures are loaded through `pool`.
    pub fn initialize_with_pool(&mut self, pool: &mut ImagePool) -> SceneResult<()> {
        let start = Instant::now();

        self.texture_index = index_by_id(&self.textures, |t| t.id, SceneError::DuplicateTexture)?;
        self.material_index = index_by_id(&self.materials, |m| m.id, SceneError::DuplicateMaterial)?;
        self.primitive_index = index_by_id(&self.primitives, |p| p.id, SceneError::DuplicatePrimitive)?;

        for texture in &mut self.textures {
            texture.initialize(pool)?;
        }

        self.resolve_materials()?;
        self.resolve_primitives()?;
        let order = self.composite_order()?;
        self.update_composites(&order);

        let (visible, invisible): (Vec<usize>, Vec<usize>) =
            (0..self.primitives.len()).partition(|&i| !self.primitives[i].invisible);
        self.visible = visible;
        self.invisible = invisible;

        self.root_bvh = None;
        if self.bvh.enabled && !self.visible.is_empty() {
            let bounds: Vec<Aabb> = self.visible.iter().map(|&i| self.primitives[i].aabb()).collect();
            let bvh = FlatBvh::build(&bounds, &self.bvh.build_info, self.general.seed);
            log::info!(
                "Root BVH: {} nodes, {} leaves",
                bvh.node_count(),
                bvh.leaf_count()
            );
            self.root_bvh = Some(bvh);
        }

        self.camera.initialize();

        log::info!(
            "Scene initialized in {:.2?}: {} primitives ({} visible, {} invisible), {} materials, {} textures, {} lights",
            start.elapsed(),
            self.primitives.len(),
            self.visible.len(),
            self.invisible.len(),
            self.materials.len(),
            self.textures.len(),
            self.lights.count()
        );

        Ok(())
    }

    fn resolve_materials(&mut self) -> SceneResult<()> {
        for material in &mut self.materials {
            let lookup = |texture: Option<u32>| -> SceneResult<Option<usize>> {
                texture
                    .map(|id| {
                        self.texture_index.get(&id).copied().ok_or(SceneError::MissingTexture {
                            material: material.id,
                            texture: id,
                        })
                    })
                    .transpose()
            };

            let maps = &material.maps;
            let resolved = ResolvedMaps {
                ambient: lookup(maps.ambient)?,
                diffuse: lookup(maps.diffuse)?,
                specular: lookup(maps.specular)?,
                emittance: lookup(maps.emittance)?,
                normal: lookup(maps.normal)?,
                height: lookup(maps.height)?,
                mask: lookup(maps.mask)?,
            };
            material.resolved = resolved;
        }
        Ok(())
    }

    fn resolve_primitives(&mut self) -> SceneResult<()> {
        for index in 0..self.primitives.len() {
            let owner = self.primitives[index].id;
            let material_id = self.primitives[index].material_id;

            let material = *self.material_index.get(&material_id).ok_or(SceneError::MissingMaterial {
                primitive: owner,
                material: material_id,
            })?;

            let child_ids = self.primitives[index].kind.child_ids();
            let mut children = Vec::with_capacity(child_ids.len());
            for id in child_ids {
                let child = *self.primitive_index.get(&id).ok_or(SceneError::MissingPrimitive {
                    owner,
                    primitive: id,
                })?;

                if matches!(self.primitives[index].kind, PrimitiveKind::Csg(_))
                    && !self.primitives[child].kind.supports_span()
                {
                    return Err(SceneError::UnsupportedCsgChild { csg: owner, child: id });
                }
                children.push(child);
            }

            let non_shadowing = self.materials[material].non_shadowing;
            let primitive = &mut self.primitives[index];
            primitive.material = material;
            primitive.non_shadowing = non_shadowing;

            match &mut primitive.kind {
                PrimitiveKind::Csg(csg) => {
                    csg.left = children[0];
                    csg.right = children[1];
                }
                PrimitiveKind::Instance(instance) => instance.target = children[0],
                PrimitiveKind::Group(group) => group.members = children,
                _ => {}
            }
        }
        Ok(())
    }

    /// Post-order over the reference graph: children come before the
    /// composites that refer to them.
    fn composite_order(&self) -> SceneResult<Vec<usize>> {
        let count = self.primitives.len();
        let mut visits = vec![Visit::New; count];
        let mut order = Vec::with_capacity(count);

        for root in 0..count {
            if visits[root] != Visit::New {
                continue;
            }

            visits[root] = Visit::Active;
            let mut stack = vec![(root, self.primitives[root].kind.child_indices(), 0usize)];

            while let Some((node, children, next)) = stack.last_mut() {
                if let Some(&child) = children.get(*next) {
                    *next += 1;
                    match visits[child] {
                        Visit::Active => return Err(SceneError::CyclicReference(self.primitives[child].id)),
                        Visit::New => {
                            visits[child] = Visit::Active;
                            stack.push((child, self.primitives[child].kind.child_indices(), 0));
                        }
                        Visit::Done => {}
                    }
                } else {
                    visits[*node] = Visit::Done;
                    order.push(*node);
                    stack.pop();
                }
            }
        }

        Ok(order)
    }

    fn update_composites(&mut self, order: &[usize]) {
        let seed = self.general.seed;

        for &index in order {
            if !self.primitives[index].kind.is_composite() {
                continue;
            }

            let bounds: Vec<Aabb> = self.primitives[index]
                .kind
                .child_indices()
                .iter()
                .map(|&child| self.primitives[child].aabb())
                .collect();

            let id = self.primitives[index].id;
            match &mut self.primitives[index].kind {
                PrimitiveKind::Csg(csg) => csg.update_bounds(&bounds[0], &bounds[1]),
                PrimitiveKind::Instance(instance) => instance.update_bounds(&bounds[0]),
                PrimitiveKind::Group(group) => {
                    if bounds.is_empty() {
                        log::warn!("Group {} has no members", id);
                    }
                    group.build(&bounds, seed);
                }
                _ => {}
            }
        }
    }

    /// Nearest hit among the visible primitives.
    pub fn intersect(&self, ray: &Ray, isect: &mut Intersection) -> bool {
        match &self.root_bvh {
            Some(bvh) => bvh.intersect(ray, isect, |i, ray, isect| {
                self.primitives[self.visible[i]].intersect(self, ray, isect)
            }),
            None => {
                let mut found = false;
                for &index in &self.visible {
                    if self.primitives[index].intersect(self, ray, isect) {
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

    /// Material of a hit, if it has one.
    pub fn material_for(&self, isect: &Intersection) -> Option<&Material> {
        isect.material.and_then(|index| self.materials.get(index))
    }

    pub fn primitive_by_id(&self, id: u32) -> Option<&Primitive> {
        self.primitive_index.get(&id).map(|&index| &self.primitives[index])
    }

    pub fn material_by_id(&self, id: u32) -> Option<&Material> {
        self.material_index.get(&id).map(|&index| &self.materials[index])
    }

    pub fn texture_by_id(&self, id: u32) -> Option<&Texture> {
        self.texture_index.get(&id).map(|&index| &self.textures[index])
    }

    pub fn visible_primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.visible.iter().map(|&index| &self.primitives[index])
    }

    pub fn invisible_primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.invisible.iter().map(|&index| &self.primitives[index])
    }

    pub fn root_bvh(&self) -> Option<&FlatBvh> {
        self.root_bvh.as_ref()
    }
}
