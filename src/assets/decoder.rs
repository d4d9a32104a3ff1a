use std::path::Path;

use cgmath::{InnerSpace, Vector3};
use log::{debug, warn};

use crate::error::DecodeError;

/// Geometry of one mesh, ready to be uploaded by whichever renderer consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Flat `xyz` triples.
    pub positions: Vec<f32>,
    /// Flat `xyz` triples, one per position.
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    pub material: Option<String>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Everything decoded from one model file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroup {
    pub name: String,
    pub meshes: Vec<MeshData>,
}

impl ModelGroup {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(MeshData::vertex_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }
}

/// Turns a model file into a [`ModelGroup`].
pub trait ModelDecoder {
    fn decode(&self, path: &Path) -> Result<ModelGroup, DecodeError>;
}

/// Wavefront OBJ decoder backed by `tobj`.
///
/// Faces are triangulated and every vertex gets a single index. Materials come
/// from the `mtllib` the file names; a missing MTL file is not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjDecoder;

impl ModelDecoder for ObjDecoder {
    fn decode(&self, path: &Path) -> Result<ModelGroup, DecodeError> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| DecodeError::Obj {
            path: path.to_path_buf(),
            source,
        })?;

        let materials = materials.unwrap_or_else(|err| {
            debug!("no materials for '{}': {}", path.display(), err);
            Vec::new()
        });

        let meshes = models
            .iter()
            .map(|model| {
                let mesh = &model.mesh;
                let has_normals =
                    !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len();
                let normals = if has_normals {
                    mesh.normals.clone()
                } else {
                    calculate_face_normals(&mesh.positions, &mesh.indices)
                };
                MeshData {
                    positions: mesh.positions.clone(),
                    normals,
                    indices: mesh.indices.clone(),
                    material: mesh
                        .material_id
                        .and_then(|id| materials.get(id))
                        .map(|material| material.name.clone()),
                }
            })
            .collect();

        let name = models
            .iter()
            .map(|model| model.name.as_str())
            .find(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| model_name_from_path(path));

        Ok(ModelGroup { name, meshes })
    }
}

/// `crate` for `models/crate.obj.pr`.
fn model_name_from_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    file_name
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Averages the face normals around each vertex. Used when the file has none.
pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); vertex_count];
    let vertex =
        |i: usize| Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]);

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if i0.max(i1).max(i2) >= vertex_count {
            warn!("skipping triangle with out of range index");
            continue;
        }
        let face_normal = (vertex(i1) - vertex(i0)).cross(vertex(i2) - vertex(i0));
        for i in [i0, i1, i2] {
            sums[i] += face_normal;
        }
    }

    sums.into_iter()
        .flat_map(|sum| {
            let normal = if sum.magnitude2() > 0.0 { sum.normalize() } else { sum };
            [normal.x, normal.y, normal.z]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempDir;

    const TRIANGLE: &str = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn test_face_normals() {
        let positions = [0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0];
        let normals = calculate_face_normals(&positions, &[0, 1, 2]);

        assert_eq!(normals, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_face_normals_unused_vertex_stays_zero() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 5.0, 5.0, 5.0];
        let normals = calculate_face_normals(&positions, &[0, 1, 2]);

        assert_eq!(&normals[9..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_decode_triangle() {
        let dir = TempDir::new("decode-tri");
        let path = dir.write("tri.obj", TRIANGLE);

        let group = ObjDecoder.decode(&path).unwrap();

        assert_eq!(group.name, "tri");
        assert_eq!(group.meshes.len(), 1);
        assert_eq!(group.vertex_count(), 3);
        assert_eq!(group.triangle_count(), 1);
        assert_eq!(group.meshes[0].normals.len(), 9);
        assert_eq!(group.meshes[0].material, None);
    }

    #[test]
    fn test_decode_missing_mtl_is_not_fatal() {
        let dir = TempDir::new("decode-mtl");
        let path = dir.write("tri.obj", &format!("mtllib nowhere.mtl\n{TRIANGLE}"));

        let group = ObjDecoder.decode(&path).unwrap();
        assert_eq!(group.triangle_count(), 1);
    }

    #[test]
    fn test_decode_missing_file() {
        let err = ObjDecoder
            .decode(Path::new("/definitely/not/here.obj"))
            .unwrap_err();

        assert!(matches!(err, DecodeError::Obj { .. }));
        assert!(err.to_string().contains("/definitely/not/here.obj"));
    }

    #[test]
    fn test_model_name_from_cache_path() {
        assert_eq!(model_name_from_path(Path::new("models/crate.obj.pr")), "crate");
    }
}
