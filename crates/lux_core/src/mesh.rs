//! Indexed triangle meshes.
//!
//! A mesh is not a primitive of its own; `Scene::add_mesh` expands it into
//! triangles collected under a group with its own BVH.

use lux_math::{Aabb, Vec2, Vec3};

use crate::primitive::Triangle;

#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
    pub positions: Vec<Vec3>,

    /// Per-vertex normals; generated by `compute_normals` when missing.
    pub normals: Option<Vec<Vec3>>,

    /// Per-vertex texture coordinates.
    pub texcoords: Option<Vec<Vec2>>,

    /// Every 3 indices form a counter-clockwise triangle.
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals: None,
            texcoords: None,
            indices,
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_texcoords(mut self, texcoords: Vec<Vec2>) -> Self {
        self.texcoords = Some(texcoords);
        self
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.positions)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Smooth vertex normals, the area weighted average of the adjacent
    /// face normals.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.valid_faces() {
            let [i0, i1, i2] = face;
            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Compute normals if they are missing or do not match the vertex count.
    pub fn ensure_normals(&mut self) {
        match &self.normals {
            None => self.compute_normals(),
            Some(normals) if normals.len() != self.positions.len() => {
                log::debug!(
                    "Normal count ({}) doesn't match vertex count ({}), computing smooth normals",
                    normals.len(),
                    self.positions.len()
                );
                self.compute_normals();
            }
            Some(_) => {}
        }
    }

    /// Triangles with in-range indices; others are skipped with a warning.
    fn valid_faces(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let vertex_count = self.positions.len();
        self.indices.chunks_exact(3).filter_map(move |chunk| {
            let face = [chunk[0] as usize, chunk[1] as usize, chunk[2] as usize];
            if face.iter().any(|&i| i >= vertex_count) {
                log::warn!(
                    "Invalid triangle indices: [{}, {}, {}], vertex count: {}",
                    face[0],
                    face[1],
                    face[2],
                    vertex_count
                );
                return None;
            }
            Some(face)
        })
    }

    /// Expand into standalone triangles.
    ///
    /// With `smooth` the vertex normals are interpolated across each face.
    pub fn triangles(&self, smooth: bool) -> Vec<Triangle> {
        let normals = self
            .normals
            .as_ref()
            .filter(|normals| normals.len() == self.positions.len());
        let texcoords = self
            .texcoords
            .as_ref()
            .filter(|texcoords| texcoords.len() == self.positions.len());

        self.valid_faces()
            .map(|face| {
                let vertices = face.map(|i| self.positions[i]);
                let uv = texcoords.map(|t| face.map(|i| t[i]));

                match normals {
                    Some(n) if smooth => Triangle::with_attributes(
                        vertices,
                        face.map(|i| n[i]),
                        uv.unwrap_or([Vec2::ZERO, Vec2::X, Vec2::Y]),
                    ),
                    _ => {
                        let mut triangle = Triangle::new(vertices[0], vertices[1], vertices[2]);
                        if let Some(uv) = uv {
                            triangle.texcoords = uv;
                            triangle.initialize();
                        }
                        triangle
                    }
                }
            })
            .collect()
    }
}
