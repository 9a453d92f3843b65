use super::edges::nearest_neighbor_edges;
use nalgebra::{Point3, Unit, Vector3};
use once_cell::sync::Lazy;
use phf::phf_map;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const PHI: f64 = 1.618033988749895;
const PHI_SQ: f64 = 2.618033988749895;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Shape '{0}' not defined (expected one of: tetra, cube, octa, icosa, dodeca)")]
    ShapeNotDefined(String),
}

/// The five Platonic solids supported as assembly templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolyhedronKind {
    Tetrahedron,
    Cube,
    Octahedron,
    Icosahedron,
    Dodecahedron,
}

static SHAPE_NAMES: phf::Map<&'static str, PolyhedronKind> = phf_map! {
    "tetra" => PolyhedronKind::Tetrahedron,
    "tetrahedron" => PolyhedronKind::Tetrahedron,
    "cube" => PolyhedronKind::Cube,
    "hexahedron" => PolyhedronKind::Cube,
    "octa" => PolyhedronKind::Octahedron,
    "octahedron" => PolyhedronKind::Octahedron,
    "icosa" => PolyhedronKind::Icosahedron,
    "icosahedron" => PolyhedronKind::Icosahedron,
    "dodeca" => PolyhedronKind::Dodecahedron,
    "dodecahedron" => PolyhedronKind::Dodecahedron,
};

impl PolyhedronKind {
    pub const ALL: [PolyhedronKind; 5] = [
        PolyhedronKind::Tetrahedron,
        PolyhedronKind::Cube,
        PolyhedronKind::Octahedron,
        PolyhedronKind::Icosahedron,
        PolyhedronKind::Dodecahedron,
    ];

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Tetrahedron => "tetra",
            Self::Cube => "cube",
            Self::Octahedron => "octa",
            Self::Icosahedron => "icosa",
            Self::Dodecahedron => "dodeca",
        }
    }

    pub fn face_vertex_count(&self) -> usize {
        match self {
            Self::Tetrahedron | Self::Octahedron | Self::Icosahedron => 3,
            Self::Cube => 4,
            Self::Dodecahedron => 5,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl FromStr for PolyhedronKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SHAPE_NAMES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| CatalogError::ShapeNotDefined(s.to_string()))
    }
}

impl fmt::Display for PolyhedronKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Immutable geometry and topology of one solid.
///
/// Faces list their vertex indices counter-clockwise as seen from outside the solid, so
/// the Newell normal of a face points outwards. `face_edges[f]` holds the consecutive
/// vertex pairs of face `f`, closing back on its first vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyhedron {
    kind: PolyhedronKind,
    vertices: Vec<Point3<f64>>,
    faces: Vec<Vec<usize>>,
    face_edges: Vec<Vec<(usize, usize)>>,
    edges: Vec<(usize, usize)>,
    min_edge_length: f64,
}

impl Polyhedron {
    fn from_tables(kind: PolyhedronKind, vertices: &[[f64; 3]], faces: &[&[usize]]) -> Self {
        let vertices: Vec<Point3<f64>> = vertices.iter().map(|v| Point3::from(*v)).collect();
        let faces: Vec<Vec<usize>> = faces.iter().map(|f| f.to_vec()).collect();
        let face_edges = faces
            .iter()
            .map(|face| {
                (0..face.len())
                    .map(|i| (face[i], face[(i + 1) % face.len()]))
                    .collect()
            })
            .collect();
        let edges = nearest_neighbor_edges(&vertices);
        let min_edge_length = edges
            .first()
            .map_or(0.0, |&(i, j)| (vertices[i] - vertices[j]).norm());

        Self {
            kind,
            vertices,
            faces,
            face_edges,
            edges,
            min_edge_length,
        }
    }

    pub fn kind(&self) -> PolyhedronKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.short_name()
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    pub fn face_edges(&self) -> &[Vec<(usize, usize)>] {
        &self.face_edges
    }

    /// Edges of the solid as found by [`nearest_neighbor_edges`], `(i, j)` with `i < j`.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Length of the shortest vertex-vertex separation, in catalog units.
    pub fn min_edge_length(&self) -> f64 {
        self.min_edge_length
    }

    pub fn face_vertex_count(&self) -> usize {
        self.kind.face_vertex_count()
    }

    pub fn face(&self, index: usize) -> Option<&[usize]> {
        self.faces.get(index).map(Vec::as_slice)
    }

    /// Positions of the vertices of face `index`, in face order.
    pub fn face_vertices(&self, index: usize) -> Option<Vec<Point3<f64>>> {
        self.face(index)
            .map(|face| face.iter().map(|&v| self.vertices[v]).collect())
    }

    /// Midpoints of the bounding edges of face `index`, in face-edge order.
    pub fn face_edge_midpoints(&self, index: usize) -> Option<Vec<Point3<f64>>> {
        self.face_edges.get(index).map(|edges| {
            edges
                .iter()
                .map(|&(a, b)| nalgebra::center(&self.vertices[a], &self.vertices[b]))
                .collect()
        })
    }

    pub fn face_centroid(&self, index: usize) -> Option<Point3<f64>> {
        self.face_vertices(index).map(|points| centroid(&points))
    }

    /// Outward unit normal of face `index`.
    pub fn face_normal(&self, index: usize) -> Option<Unit<Vector3<f64>>> {
        self.face_vertices(index)
            .and_then(|points| Unit::try_new(newell_normal(&points), f64::EPSILON))
    }

    /// Distance of the farthest vertex from the origin, in catalog units.
    pub fn circumradius(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.coords.norm())
            .fold(0.0, f64::max)
    }

    /// `true` when the face-edge tables describe exactly the nearest-neighbour edges.
    pub fn face_edges_consistent(&self) -> bool {
        let from_faces: BTreeSet<(usize, usize)> = self
            .face_edges
            .iter()
            .flatten()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect();
        let computed: BTreeSet<(usize, usize)> = self.edges.iter().copied().collect();
        from_faces == computed
    }
}

pub(crate) fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Point3::from(sum / points.len().max(1) as f64)
}

/// Newell normal of a closed polygon (not normalised); counter-clockwise order points it
/// towards the viewer.
pub(crate) fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    (0..n).fold(Vector3::zeros(), |acc, i| {
        let current = points[i];
        let next = points[(i + 1) % n];
        acc + Vector3::new(
            (current.y - next.y) * (current.z + next.z),
            (current.z - next.z) * (current.x + next.x),
            (current.x - next.x) * (current.y + next.y),
        )
    })
}

const TETRA_VERTICES: [[f64; 3]; 4] = [
    [1.0, 1.0, 1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
];
const TETRA_FACES: [&[usize]; 4] = [&[0, 1, 2], &[0, 3, 1], &[0, 2, 3], &[1, 3, 2]];

const CUBE_VERTICES: [[f64; 3]; 8] = [
    [1.0, 1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, -1.0, -1.0],
];
const CUBE_FACES: [&[usize]; 6] = [
    &[0, 2, 3, 1],
    &[0, 1, 5, 4],
    &[0, 4, 6, 2],
    &[1, 3, 7, 5],
    &[2, 6, 7, 3],
    &[4, 5, 7, 6],
];

const OCTA_VERTICES: [[f64; 3]; 6] = [
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
];
const OCTA_FACES: [&[usize]; 8] = [
    &[0, 2, 4],
    &[0, 5, 2],
    &[0, 4, 3],
    &[0, 3, 5],
    &[1, 4, 2],
    &[1, 2, 5],
    &[1, 3, 4],
    &[1, 5, 3],
];

const ICOSA_VERTICES: [[f64; 3]; 12] = [
    [0.0, 1.0, PHI],
    [0.0, 1.0, -PHI],
    [0.0, -1.0, PHI],
    [0.0, -1.0, -PHI],
    [PHI, 0.0, 1.0],
    [PHI, 0.0, -1.0],
    [-PHI, 0.0, 1.0],
    [-PHI, 0.0, -1.0],
    [1.0, PHI, 0.0],
    [1.0, -PHI, 0.0],
    [-1.0, PHI, 0.0],
    [-1.0, -PHI, 0.0],
];
const ICOSA_FACES: [&[usize]; 20] = [
    &[0, 2, 4],
    &[0, 6, 2],
    &[0, 4, 8],
    &[0, 10, 6],
    &[0, 8, 10],
    &[1, 5, 3],
    &[1, 3, 7],
    &[1, 8, 5],
    &[1, 7, 10],
    &[1, 10, 8],
    &[2, 9, 4],
    &[2, 6, 11],
    &[2, 11, 9],
    &[3, 5, 9],
    &[3, 11, 7],
    &[3, 9, 11],
    &[4, 5, 8],
    &[4, 9, 5],
    &[6, 10, 7],
    &[6, 7, 11],
];

const DODECA_VERTICES: [[f64; 3]; 20] = [
    [1.0, 0.0, PHI_SQ],
    [1.0, 0.0, -PHI_SQ],
    [-1.0, 0.0, PHI_SQ],
    [-1.0, 0.0, -PHI_SQ],
    [PHI, PHI, PHI],
    [-PHI, -PHI, -PHI],
    [PHI, -PHI, -PHI],
    [PHI, PHI, -PHI],
    [-PHI, PHI, -PHI],
    [-PHI, PHI, PHI],
    [-PHI, -PHI, PHI],
    [PHI, -PHI, PHI],
    [0.0, PHI_SQ, 1.0],
    [0.0, PHI_SQ, -1.0],
    [0.0, -PHI_SQ, 1.0],
    [0.0, -PHI_SQ, -1.0],
    [PHI_SQ, 1.0, 0.0],
    [PHI_SQ, -1.0, 0.0],
    [-PHI_SQ, 1.0, 0.0],
    [-PHI_SQ, -1.0, 0.0],
];
const DODECA_FACES: [&[usize]; 12] = [
    &[0, 4, 12, 9, 2],
    &[2, 10, 14, 11, 0],
    &[0, 11, 17, 16, 4],
    &[1, 6, 15, 5, 3],
    &[3, 8, 13, 7, 1],
    &[1, 7, 16, 17, 6],
    &[2, 9, 18, 19, 10],
    &[3, 5, 19, 18, 8],
    &[4, 16, 7, 13, 12],
    &[5, 15, 14, 10, 19],
    &[6, 17, 11, 14, 15],
    &[8, 18, 9, 12, 13],
];

static CATALOG: Lazy<[Polyhedron; 5]> = Lazy::new(|| {
    [
        Polyhedron::from_tables(PolyhedronKind::Tetrahedron, &TETRA_VERTICES, &TETRA_FACES),
        Polyhedron::from_tables(PolyhedronKind::Cube, &CUBE_VERTICES, &CUBE_FACES),
        Polyhedron::from_tables(PolyhedronKind::Octahedron, &OCTA_VERTICES, &OCTA_FACES),
        Polyhedron::from_tables(PolyhedronKind::Icosahedron, &ICOSA_VERTICES, &ICOSA_FACES),
        Polyhedron::from_tables(PolyhedronKind::Dodecahedron, &DODECA_VERTICES, &DODECA_FACES),
    ]
});

/// Returns the catalog entry for a solid.
pub fn polyhedron(kind: PolyhedronKind) -> &'static Polyhedron {
    &CATALOG[kind.index()]
}

/// Looks up a solid by name (`tetra`, `cube`, `octa`, `icosa`, `dodeca`, or the full name).
///
/// # Errors
///
/// Returns [`CatalogError::ShapeNotDefined`] for any other name.
pub fn describe(name: &str) -> Result<&'static Polyhedron, CatalogError> {
    name.parse::<PolyhedronKind>().map(polyhedron)
}
