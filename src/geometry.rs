//! Procedural mesh generation for the two primitives this viewer draws:
//! UV spheres and circular orbit rings.

/// CPU-side mesh: positions plus an index list.
///
/// Sphere indices form a triangle list; ring indices form a line strip
/// that revisits vertex 0 to close the loop.
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

#[derive(Clone, Copy, Debug)]
pub struct SphereOptions {
    pub radius: f32,
    pub stacks: u32,
    pub slices: u32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            stacks: 100,
            slices: 100,
        }
    }
}

/// Generate a UV sphere centered on the origin.
///
/// Vertices are laid out ring by ring from pole to pole, with a seam
/// column duplicated so each ring has `slices + 1` entries. Indices are a
/// CCW triangle list.
pub fn uv_sphere(opts: SphereOptions) -> Mesh {
    let stacks = opts.stacks.max(2);
    let slices = opts.slices.max(3);

    let mut positions = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);

    for stack in 0..=stacks {
        let phi = stack as f32 / stacks as f32 * std::f32::consts::PI;
        let (sin_phi, cos_phi) = phi.sin_cos();

        for slice in 0..=slices {
            let theta = slice as f32 / slices as f32 * std::f32::consts::TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();

            positions.push([
                opts.radius * sin_phi * cos_theta,
                opts.radius * cos_phi,
                opts.radius * sin_phi * sin_theta,
            ]);
        }
    }

    let ring = slices + 1;
    let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);

    for stack in 0..stacks {
        for slice in 0..slices {
            let i0 = stack * ring + slice;
            let i1 = i0 + 1;
            let i2 = i0 + ring;
            let i3 = i2 + 1;

            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    Mesh { positions, indices }
}

/// Generate a closed orbit path: 360 vertices sampled at 1-degree
/// increments on the circle of the given radius, in the z = 0 plane.
/// The index strip wraps back to vertex 0 rather than duplicating it.
pub fn orbit_ring(radius: f32) -> Mesh {
    let mut positions = Vec::with_capacity(360);

    for deg in 0..360u32 {
        let angle = (deg as f32).to_radians();
        positions.push([radius * angle.cos(), radius * angle.sin(), 0.0]);
    }

    let mut indices: Vec<u32> = (0..360).collect();
    indices.push(0);

    Mesh { positions, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_ring_is_a_closed_circle() {
        let radius = 10.0;
        let mesh = orbit_ring(radius);

        assert_eq!(mesh.positions.len(), 360);
        assert_eq!(mesh.indices.len(), 361);
        assert_eq!(mesh.indices[0], *mesh.indices.last().unwrap());

        for p in &mesh.positions {
            let r = (p[0] * p[0] + p[1] * p[1]).sqrt();
            assert!((r - radius).abs() < 1e-3);
            assert_eq!(p[2], 0.0);
        }
    }

    #[test]
    fn test_orbit_ring_starts_on_positive_x() {
        let mesh = orbit_ring(4.0);
        assert!((mesh.positions[0][0] - 4.0).abs() < 1e-6);
        assert!(mesh.positions[0][1].abs() < 1e-6);
    }

    #[test]
    fn test_uv_sphere_counts_and_radius() {
        let opts = SphereOptions {
            radius: 2.0,
            stacks: 100,
            slices: 100,
        };
        let mesh = uv_sphere(opts);

        assert_eq!(mesh.positions.len(), 101 * 101);
        assert_eq!(mesh.indices.len(), 100 * 100 * 6);

        for p in &mesh.positions {
            let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((r - opts.radius).abs() < 1e-3);
        }
    }

    #[test]
    fn test_uv_sphere_indices_in_bounds() {
        let mesh = uv_sphere(SphereOptions::default());
        let n = mesh.positions.len() as u32;

        assert!(mesh.indices.iter().all(|&i| i < n));
    }
}
