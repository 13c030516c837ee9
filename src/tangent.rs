// tangent.rs — 逐顶点切线空间 (normal / U / V) 计算
// 三角形贡献累加后归一化；累加为零时退回与法线正交的任意单位向量

use crate::error::MeshError;
use crate::mesh::SphereMesh;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Where the per-vertex normal comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalPolicy {
    /// normal = normalize(position); exact for a unit sphere at the origin.
    #[default]
    Position,
    /// Area-weighted average of adjacent face normals.
    ///
    /// Seam and pole vertices are duplicated per texture coordinate, so each
    /// copy only averages the faces on its own side and the shading shows a
    /// crease along the seam and at the poles.
    FaceWeighted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TangentOptions {
    pub normals: NormalPolicy,
    /// Gram-Schmidt U and V against the normal after normalizing.
    pub orthogonalize: bool,
}

impl Default for TangentOptions {
    fn default() -> Self {
        Self {
            normals: NormalPolicy::Position,
            orthogonalize: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    U,
    V,
}

/// A vertex whose accumulated axis was zero and got the fallback vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegenerateAxis {
    pub vertex: usize,
    pub axis: Axis,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TangentReport {
    pub degenerate: Vec<DegenerateAxis>,
}

impl TangentReport {
    pub fn is_clean(&self) -> bool {
        self.degenerate.is_empty()
    }
}

/// Per-triangle U and V axes from position and texture deltas.
///
/// Not divided by the UV determinant: only the direction matters, and the
/// sign is consistent as long as the UV winding is.
pub fn uv_axes(p1: Vec3, p2: Vec3, p3: Vec3, t1: Vec2, t2: Vec2, t3: Vec2) -> (Vec3, Vec3) {
    let (dp1, dp2) = (p2 - p1, p3 - p1);
    let (dt1, dt2) = (t2 - t1, t3 - t1);
    let u_axis = dt2.y * dp1 - dt1.y * dp2;
    let v_axis = dt1.x * dp2 - dt2.x * dp1;
    (u_axis, v_axis)
}

/// Fills `normals`, `us` and `vs` for a populated mesh.
///
/// The mesh is left untouched when validation fails.
pub fn build_tangent_space(
    mesh: &mut SphereMesh,
    options: &TangentOptions,
) -> Result<TangentReport, MeshError> {
    validate(mesh)?;

    let n = mesh.point_count();
    mesh.normals.clear();
    mesh.normals.resize(n, Vec3::ZERO);
    mesh.us.clear();
    mesh.us.resize(n, Vec3::ZERO);
    mesh.vs.clear();
    mesh.vs.resize(n, Vec3::ZERO);

    for t in &mesh.triangles {
        let [i1, i2, i3] = t.indices().map(|i| i as usize);
        let (u_axis, v_axis) = uv_axes(
            mesh.points[i1],
            mesh.points[i2],
            mesh.points[i3],
            mesh.uvs[i1],
            mesh.uvs[i2],
            mesh.uvs[i3],
        );
        for i in [i1, i2, i3] {
            mesh.us[i] += u_axis;
            mesh.vs[i] += v_axis;
        }
    }

    match options.normals {
        NormalPolicy::Position => {
            for (normal, p) in mesh.normals.iter_mut().zip(&mesh.points) {
                *normal = p.normalize_or(Vec3::Y);
            }
        }
        NormalPolicy::FaceWeighted => face_weighted_normals(mesh),
    }

    let mut report = TangentReport::default();
    for i in 0..n {
        let normal = mesh.normals[i];

        let u = match mesh.us[i].try_normalize() {
            Some(u) => u,
            None => {
                report.degenerate.push(DegenerateAxis { vertex: i, axis: Axis::U });
                normal.any_orthonormal_vector()
            }
        };
        let v = match mesh.vs[i].try_normalize() {
            Some(v) => v,
            None => {
                report.degenerate.push(DegenerateAxis { vertex: i, axis: Axis::V });
                normal.cross(u).normalize_or(normal.any_orthonormal_vector())
            }
        };

        let (u, v) = if options.orthogonalize {
            orthogonalize(normal, u, v)
        } else {
            (u, v)
        };
        mesh.us[i] = u;
        mesh.vs[i] = v;
    }

    if !report.is_clean() {
        log::debug!(
            "tangent fallback applied to {} axes over {} vertices",
            report.degenerate.len(),
            n
        );
    }

    Ok(report)
}

fn validate(mesh: &SphereMesh) -> Result<(), MeshError> {
    let len = mesh.point_count();
    if mesh.uvs.len() != len {
        return Err(MeshError::LengthMismatch {
            points: len,
            uvs: mesh.uvs.len(),
        });
    }
    for (triangle, t) in mesh.triangles.iter().enumerate() {
        if let Some(&index) = t.indices().iter().find(|&&i| i as usize >= len) {
            return Err(MeshError::IndexOutOfRange { triangle, index, len });
        }
    }
    Ok(())
}

// 面积加权：未归一化的叉积长度即为两倍面积
fn face_weighted_normals(mesh: &mut SphereMesh) {
    for normal in mesh.normals.iter_mut() {
        *normal = Vec3::ZERO;
    }
    for t in &mesh.triangles {
        let [i1, i2, i3] = t.indices().map(|i| i as usize);
        let (p1, p2, p3) = (mesh.points[i1], mesh.points[i2], mesh.points[i3]);
        let face = (p2 - p1).cross(p3 - p1);
        for i in [i1, i2, i3] {
            mesh.normals[i] += face;
        }
    }
    for (normal, p) in mesh.normals.iter_mut().zip(&mesh.points) {
        *normal = normal
            .try_normalize()
            .unwrap_or_else(|| p.normalize_or(Vec3::Y));
    }
}

/// Gram-Schmidt against `normal`; V keeps its side of the U/N plane.
fn orthogonalize(normal: Vec3, u: Vec3, v: Vec3) -> (Vec3, Vec3) {
    let u_ortho = (u - normal * normal.dot(u))
        .try_normalize()
        .unwrap_or_else(|| normal.any_orthonormal_vector());

    let v_ortho = (v - normal * normal.dot(v) - u_ortho * u_ortho.dot(v))
        .try_normalize()
        .unwrap_or_else(|| {
            let b = normal.cross(u_ortho);
            if b.dot(v) < 0.0 {
                -b
            } else {
                b
            }
        });

    (u_ortho, v_ortho)
}
