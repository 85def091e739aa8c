use glam::{Vec2, Vec3};
use itertools::iproduct;
use thiserror::Error;

/// Largest vertex count 16-bit indices can address.
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("a triangle list needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("index count {0} is not a multiple of 3")]
    PartialTriangle(usize),
    #[error("{0} vertices cannot be addressed with 16-bit indices")]
    TooManyVertices(usize),
    #[error("index {index} is out of range for {vertices} vertices")]
    IndexOutOfRange { index: u16, vertices: usize },
    #[error("a plane needs at least one division per axis, got {0}x{1}")]
    NoDivisions(u16, u16),
}

/// Vertices plus 16-bit triangle-list indices.
///
/// Triangles are wound clockwise when seen from outside, matching the
/// back-face culling of the pipelines.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedTriangleList<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u16>,
}

impl<V> IndexedTriangleList<V> {
    pub fn new(vertices: Vec<V>, indices: Vec<u16>) -> Result<Self, GeometryError> {
        if vertices.len() < 3 {
            return Err(GeometryError::TooFewVertices(vertices.len()));
        }
        if indices.len() % 3 != 0 {
            return Err(GeometryError::PartialTriangle(indices.len()));
        }
        if vertices.len() > MAX_VERTICES {
            return Err(GeometryError::TooManyVertices(vertices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertices: vertices.len(),
            });
        }

        Ok(Self { vertices, indices })
    }

    /// Converts positions into the vertex type a drawable uploads.
    pub fn map_vertices<U>(self, f: impl FnMut(V) -> U) -> IndexedTriangleList<U> {
        IndexedTriangleList {
            vertices: self.vertices.into_iter().map(f).collect(),
            indices: self.indices,
        }
    }
}

/// Axis-aligned cube centred on the origin.
pub fn cube(half_extent: f32) -> IndexedTriangleList<Vec3> {
    let s = half_extent;
    let vertices = vec![
        Vec3::new(-s, -s, -s),
        Vec3::new(s, -s, -s),
        Vec3::new(-s, s, -s),
        Vec3::new(s, s, -s),
        Vec3::new(-s, -s, s),
        Vec3::new(s, -s, s),
        Vec3::new(-s, s, s),
        Vec3::new(s, s, s),
    ];

    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1,  2, 3, 1, // -z
        4, 5, 7,  4, 7, 6, // +z
        1, 3, 5,  3, 7, 5, // +x
        0, 4, 2,  2, 4, 6, // -x
        2, 6, 3,  3, 6, 7, // +y
        0, 1, 4,  1, 5, 4, // -y
    ];

    // Fixed topology, always in range.
    IndexedTriangleList { vertices, indices }
}

/// 2x2 plane in the XY plane facing -Z, split into
/// `divisions_x * divisions_y` cells.
pub fn plane_tessellated(
    divisions_x: u16,
    divisions_y: u16,
) -> Result<IndexedTriangleList<Vec3>, GeometryError> {
    if divisions_x == 0 || divisions_y == 0 {
        return Err(GeometryError::NoDivisions(divisions_x, divisions_y));
    }

    let columns = divisions_x as usize + 1;
    let rows = divisions_y as usize + 1;
    if columns * rows > MAX_VERTICES {
        return Err(GeometryError::TooManyVertices(columns * rows));
    }

    let cell = Vec2::new(2.0 / divisions_x as f32, 2.0 / divisions_y as f32);
    let vertices = iproduct!(0..rows, 0..columns)
        .map(|(y, x)| Vec3::new(-1.0 + x as f32 * cell.x, -1.0 + y as f32 * cell.y, 0.0))
        .collect();

    let index = |x: usize, y: usize| {
        u16::try_from(y * columns + x).map_err(|_| GeometryError::TooManyVertices(columns * rows))
    };

    let mut indices = Vec::with_capacity(divisions_x as usize * divisions_y as usize * 6);
    for (y, x) in iproduct!(0..divisions_y as usize, 0..divisions_x as usize) {
        let bottom_left = index(x, y)?;
        let bottom_right = index(x + 1, y)?;
        let top_left = index(x, y + 1)?;
        let top_right = index(x + 1, y + 1)?;
        indices.extend([
            bottom_left,
            top_left,
            bottom_right,
            bottom_right,
            top_left,
            top_right,
        ]);
    }

    IndexedTriangleList::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Outward normal of each triangle, given clockwise front faces in a
    /// left-handed space.
    fn facing(list: &IndexedTriangleList<Vec3>) -> Vec<Vec3> {
        list.indices
            .chunks(3)
            .map(|tri| {
                let [a, b, c] = [0, 1, 2].map(|i| list.vertices[tri[i] as usize]);
                (b - a).cross(c - a).normalize()
            })
            .collect()
    }

    #[test]
    fn cube_faces_point_outwards() {
        let cube = cube(1.0);
        assert_eq!(cube.vertices.len(), 8);
        assert_eq!(cube.indices.len(), 36);

        for (tri, normal) in cube.indices.chunks(3).zip(facing(&cube)) {
            let centroid = tri
                .iter()
                .map(|&i| cube.vertices[i as usize])
                .sum::<Vec3>()
                / 3.0;
            assert!(normal.dot(centroid) > 0.0, "triangle {:?} faces inwards", tri);
        }
    }

    #[test]
    fn tessellated_plane_counts() {
        let plane = plane_tessellated(3, 2).unwrap();
        assert_eq!(plane.vertices.len(), 4 * 3);
        assert_eq!(plane.indices.len(), 3 * 2 * 6);
        assert_eq!(plane.vertices.first(), Some(&Vec3::new(-1.0, -1.0, 0.0)));
        assert_eq!(plane.vertices.last(), Some(&Vec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn plane_faces_negative_z() {
        for normal in facing(&plane_tessellated(1, 1).unwrap()) {
            assert!(normal.abs_diff_eq(Vec3::NEG_Z, 1e-6));
        }
    }

    #[test]
    fn zero_divisions_are_rejected() {
        assert_eq!(
            plane_tessellated(0, 4),
            Err(GeometryError::NoDivisions(0, 4))
        );
    }

    #[test]
    fn plane_too_large_for_16_bit_indices_is_rejected() {
        assert_eq!(
            plane_tessellated(256, 256),
            Err(GeometryError::TooManyVertices(257 * 257))
        );

        // 256 * 256 vertices is exactly addressable.
        let largest = plane_tessellated(255, 255).unwrap();
        assert_eq!(largest.vertices.len(), MAX_VERTICES);
        assert_eq!(largest.indices.iter().max(), Some(&u16::MAX));
    }

    #[test]
    fn malformed_lists_are_rejected() {
        let triangle = vec![Vec3::ZERO, Vec3::X, Vec3::Y];

        assert_eq!(
            IndexedTriangleList::new(triangle[..2].to_vec(), vec![]),
            Err(GeometryError::TooFewVertices(2))
        );
        assert_eq!(
            IndexedTriangleList::new(triangle.clone(), vec![0, 1]),
            Err(GeometryError::PartialTriangle(2))
        );
        assert_eq!(
            IndexedTriangleList::new(triangle, vec![0, 1, 3]),
            Err(GeometryError::IndexOutOfRange {
                index: 3,
                vertices: 3
            })
        );
    }
}
