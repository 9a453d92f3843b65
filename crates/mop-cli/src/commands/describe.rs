use crate::cli::DescribeArgs;
use crate::error::Result;
use mopbuild::core::polyhedra::catalog::{self, Polyhedron};
use mopbuild::engine::error::EngineError;
use std::fmt::Write;

pub fn run(args: DescribeArgs) -> Result<()> {
    let polyhedron = catalog::describe(&args.shape).map_err(EngineError::from)?;
    print!("{}", render_description(polyhedron, args.vertices));
    Ok(())
}

/// Human-readable summary of a catalog solid.
pub fn render_description(polyhedron: &Polyhedron, with_vertices: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", polyhedron.name(), polyhedron.kind().short_name());
    let _ = writeln!(out, "  Vertices:         {}", polyhedron.vertices().len());
    let _ = writeln!(out, "  Edges:            {}", polyhedron.edges().len());
    let _ = writeln!(
        out,
        "  Faces:            {} ({}-gonal)",
        polyhedron.faces().len(),
        polyhedron.face_vertex_count()
    );
    let _ = writeln!(out, "  Min edge length:  {:.6}", polyhedron.min_edge_length());
    let _ = writeln!(out, "  Circumradius:     {:.6}", polyhedron.circumradius());
    let _ = writeln!(
        out,
        "  Face edges agree: {}",
        if polyhedron.face_edges_consistent() { "yes" } else { "no" }
    );

    if with_vertices {
        let _ = writeln!(out, "  Vertex coordinates:");
        for (i, v) in polyhedron.vertices().iter().enumerate() {
            let _ = writeln!(out, "    {:>2}: {:>10.6} {:>10.6} {:>10.6}", i, v.x, v.y, v.z);
        }
    }

    let _ = writeln!(out, "  Edge list:");
    for (i, (a, b)) in polyhedron.edges().iter().enumerate() {
        let _ = writeln!(out, "    {:>2}: {}-{}", i, a, b);
    }
    out
}
