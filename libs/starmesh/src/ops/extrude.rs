//! # Extrusion
//!
//! Builds new geometry from cross sections, appending into an existing
//! [`CustomMesh`]:
//!
//! - [`extrude_constant_thickness`] shifts a border by a vector, e.g. a
//!   terrain border one unit downwards;
//! - [`extrude_towards_plane`] projects it onto a plane, e.g. downwards to
//!   a fixed depth;
//! - [`extrude_along_cross_section`] sweeps one cross section along
//!   another, e.g. a profile along a border.

use glam::{DVec2, DVec3, DVec4};

use crate::cross_section::CrossSection;
use crate::diagnostics::Diagnostics;
use crate::mesh::CustomMesh;

/// Extrudes a cross section along a vector.
///
/// Each cross-section vertex becomes a pair: one on the section, one
/// shifted by `thickness`. Every segment becomes a quad between the two
/// rows. `flipped` inverts all windings.
pub fn extrude_constant_thickness(
    mesh: &mut CustomMesh,
    section: &CrossSection,
    thickness: DVec3,
    flipped: bool,
) {
    extrude_shifted(mesh, section, flipped, |position| position + thickness);
}

/// Extrudes a cross section by projecting it onto the plane
/// `dot(x, plane_normal) = plane_value`.
pub fn extrude_towards_plane(
    mesh: &mut CustomMesh,
    section: &CrossSection,
    plane_normal: DVec3,
    plane_value: f64,
    flipped: bool,
) {
    let normal = plane_normal.normalize_or_zero();
    extrude_shifted(mesh, section, flipped, |position| {
        position + normal * (plane_value - position.dot(normal))
    });
}

/// Shared two-row extrusion: the second row is `shift` of the first.
fn extrude_shifted(
    mesh: &mut CustomMesh,
    section: &CrossSection,
    flipped: bool,
    shift: impl Fn(DVec3) -> DVec3,
) {
    let mut rows: Vec<[u32; 2]> = Vec::with_capacity(section.vertices().len());
    for vertex in section.vertices() {
        let near = mesh.add_vertex(vertex.position);
        let far = mesh.add_vertex(shift(vertex.position));
        rows.push([near, far]);
    }
    for segment in section.segments() {
        let [p, q] = rows[segment.a as usize];
        let [r, s] = rows[segment.b as usize];
        mesh.add_quadrangle(p, q, s, r, flipped);
    }
}

/// Extrudes one cross section along another.
///
/// Builds the grid of `section1[i] + section2[j] - reference_point` and a
/// quad per segment pair. `reference_point` is the origin of the sweep,
/// usually the start point of `section2`.
///
/// UVs are taken from whichever UV axis each section runs along (see
/// [`CrossSection::is_rather_along_v_axis`]); each quad writes a shared
/// tangent along its local sweep direction, with `w = 1`. A warning goes to
/// `diagnostics` when the two sections carry different frames of
/// reference.
pub fn extrude_along_cross_section(
    mesh: &mut CustomMesh,
    section1: &CrossSection,
    section2: &CrossSection,
    reference_point: DVec3,
    flipped: bool,
    diagnostics: &mut dyn Diagnostics,
) {
    if section1.frame() != section2.frame() {
        diagnostics.warning("cross sections have different frames of reference");
    }

    let u1 = !section1.is_rather_along_v_axis();
    let u2 = !section2.is_rather_along_v_axis();

    let columns = section2.vertices().len();
    let mut grid: Vec<u32> = Vec::with_capacity(section1.vertices().len() * columns);
    for vertex1 in section1.vertices() {
        for vertex2 in section2.vertices() {
            let position = vertex1.position + vertex2.position - reference_point;
            let v = mesh.add_vertex(position);
            let s = if u1 { vertex1.uv.x } else { vertex1.uv.y };
            let t = if u2 { vertex2.uv.x } else { vertex2.uv.y };
            mesh.vertex_mut(v).uv = DVec2::new(s, t);
            grid.push(v);
        }
    }
    let at = |i: u32, j: u32| grid[i as usize * columns + j as usize];

    for segment1 in section1.segments() {
        for segment2 in section2.segments() {
            let a = at(segment1.a, segment2.a);
            let b = at(segment1.a, segment2.b);
            let c = at(segment1.b, segment2.a);
            let d = at(segment1.b, segment2.b);

            let direction =
                (mesh.vertex(b).position - mesh.vertex(a).position).normalize_or_zero();
            let tangent = DVec4::new(direction.x, direction.y, direction.z, 1.0);
            for v in [a, b, c, d] {
                mesh.vertex_mut(v).tangent = tangent;
            }

            mesh.add_quadrangle(a, b, d, c, flipped);
        }
    }
}
