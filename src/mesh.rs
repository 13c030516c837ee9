// mesh.rs — 单位球网格生成 (经纬度网格)
// 顶点数组与切线数组平行存放，由 tangent.rs 补全 normals / us / vs

use crate::error::MeshError;
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// Smallest resolution that still closes the surface.
pub const MIN_RESOLUTION: u32 = 3;

/// Vertex indices of one face, counter-clockwise seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub i1: u32,
    pub i2: u32,
    pub i3: u32,
}

impl Triangle {
    pub fn new(i1: u32, i2: u32, i3: u32) -> Self {
        Self { i1, i2, i3 }
    }

    pub fn indices(&self) -> [u32; 3] {
        [self.i1, self.i2, self.i3]
    }
}

/// CPU-side sphere geometry. All per-vertex arrays share the same index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SphereMesh {
    pub points: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub us: Vec<Vec3>,
    pub vs: Vec<Vec3>,
    pub triangles: Vec<Triangle>,
}

/// Interleaved vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent_u: [f32; 3],
    pub tangent_v: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x3,
        4 => Float32x3,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl SphereMesh {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Flattened index list for the index buffer.
    pub fn indices(&self) -> Vec<u32> {
        self.triangles.iter().flat_map(Triangle::indices).collect()
    }

    /// Sign of the summed UV determinant: `-1.0` when the texture is
    /// mirrored relative to the face winding, as on this grid.
    pub fn uv_winding(&self) -> f32 {
        let det: f32 = self
            .triangles
            .iter()
            .filter_map(|t| {
                let [a, b, c] = t.indices().map(|i| self.uvs.get(i as usize));
                let (t1, t2, t3) = (a?, b?, c?);
                Some((*t2 - *t1).perp_dot(*t3 - *t1))
            })
            .sum();
        if det < 0.0 {
            -1.0
        } else {
            1.0
        }
    }

    /// Interleaves the parallel arrays. Attributes the tangent builder has
    /// not filled yet come out as zero.
    ///
    /// The axes are re-signed for the normal map: `tangent_u` runs toward
    /// increasing u and `tangent_v` toward the top row of the image
    /// (decreasing v).
    pub fn vertices(&self) -> Vec<MeshVertex> {
        let sign = self.uv_winding();
        (0..self.point_count())
            .map(|i| MeshVertex {
                position: self.points[i].to_array(),
                normal: self.normals.get(i).copied().unwrap_or_default().to_array(),
                uv: self.uvs.get(i).copied().unwrap_or_default().to_array(),
                tangent_u: (sign * self.us.get(i).copied().unwrap_or_default()).to_array(),
                tangent_v: (-sign * self.vs.get(i).copied().unwrap_or_default()).to_array(),
            })
            .collect()
    }
}

/// Builds a unit sphere on a latitude/longitude grid.
///
/// `resolution` is the number of longitude columns; the grid has half as many
/// latitude rows (at least two). The seam column and both pole rows are
/// duplicated so every vertex has its own texture coordinate. The collapsed
/// half of each pole cell is skipped, so no face has zero area.
pub fn build_sphere(resolution: u32) -> Result<SphereMesh, MeshError> {
    if resolution < MIN_RESOLUTION {
        return Err(MeshError::InvalidResolution {
            resolution,
            min: MIN_RESOLUTION,
        });
    }

    let lon = resolution as usize;
    let lat = (lon / 2).max(2);

    let mut points = Vec::with_capacity((lat + 1) * (lon + 1));
    let mut uvs = Vec::with_capacity((lat + 1) * (lon + 1));
    let mut triangles = Vec::with_capacity(lon * (2 * lat - 2));

    for i in 0..=lat {
        let theta = PI * (i as f32) / (lat as f32);
        let (sin_t, cos_t) = theta.sin_cos();

        for j in 0..=lon {
            let phi = TAU * (j as f32) / (lon as f32);
            let (sin_p, cos_p) = phi.sin_cos();

            // 极点直接取精确值，避免 sin(PI) 的舍入误差
            let p = if i == 0 {
                Vec3::Y
            } else if i == lat {
                Vec3::NEG_Y
            } else {
                // z 取负：从球外看 u 向东递增
                Vec3::new(cos_p * sin_t, cos_t, -sin_p * sin_t).normalize()
            };

            points.push(p);
            uvs.push(Vec2::new(
                (j as f32) / (lon as f32),
                (i as f32) / (lat as f32),
            ));
        }
    }

    for i in 0..lat {
        for j in 0..lon {
            let a = (i * (lon + 1) + j) as u32;
            let b = a + (lon + 1) as u32;

            if i != 0 {
                triangles.push(Triangle::new(a, b, a + 1));
            }
            if i != lat - 1 {
                triangles.push(Triangle::new(b, b + 1, a + 1));
            }
        }
    }

    Ok(SphereMesh {
        points,
        uvs,
        triangles,
        ..Default::default()
    })
}
