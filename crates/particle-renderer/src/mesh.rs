//! Flat `n × n` quad grid, split into triangles, for the mesh viewer

use glam::Vec3;

/// Vertices, triangles and edges of a unit grid lying in the `y = 0.5` plane
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGrid {
    pub n: u32,
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub edges: Vec<[u32; 2]>,
}

impl MeshGrid {
    /// Grid with `n` quads per side.
    ///
    /// Vertex `i * (n + 1) + j` sits at `(i / n, 0.5, 1 - j / n)`. Each quad
    /// is split along a diagonal that alternates with `(i + j)` parity.
    /// Edges are listed as row edges, then column edges, then diagonals.
    pub fn new(n: u32) -> Self {
        assert!(n > 0, "mesh grid needs at least one quad per side");
        let stride = n + 1;
        let nf = n as f32;

        let mut vertices = Vec::with_capacity((stride * stride) as usize);
        for i in 0..stride {
            for j in 0..stride {
                vertices.push(Vec3::new(i as f32 / nf, 0.5, 1.0 - j as f32 / nf));
            }
        }

        let mut triangles = Vec::with_capacity((2 * n * n) as usize);
        for i in 0..n {
            for j in 0..n {
                let v = i * stride + j;
                if (i + j) % 2 == 0 {
                    triangles.push([v, v + n + 2, v + 1]);
                    triangles.push([v, v + n + 1, v + n + 2]);
                } else {
                    triangles.push([v, v + n + 1, v + 1]);
                    triangles.push([v + 1, v + n + 1, v + n + 2]);
                }
            }
        }

        let mut edges = vec![[0u32; 2]; (2 * n * stride + n * n) as usize];
        for i in 0..stride {
            for j in 0..n {
                let v = i * stride + j;
                edges[(i * n + j) as usize] = [v, v + 1];
            }
        }
        let start = n * stride;
        for i in 0..n {
            for j in 0..stride {
                let v = i * stride + j;
                edges[(start + j * n + i) as usize] = [v, v + n + 1];
            }
        }
        let start = 2 * n * stride;
        for i in 0..n {
            for j in 0..n {
                let v = i * stride + j;
                edges[(start + i * n + j) as usize] = if (i + j) % 2 == 0 {
                    [v, v + n + 2]
                } else {
                    [v + 1, v + n + 1]
                };
            }
        }

        log::debug!(
            "MeshGrid {n}x{n}: {} vertices, {} triangles, {} edges",
            vertices.len(),
            triangles.len(),
            edges.len()
        );

        Self {
            n,
            vertices,
            triangles,
            edges,
        }
    }

    /// Triangle indices as one flat list
    pub fn triangle_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.triangles.iter().flatten().copied()
    }
}
