//! # Punch Out
//!
//! Cuts polygon-shaped holes into a triangulated surface (or keeps only the
//! interiors), in three phases over an [`InterlinkedMesh`]:
//!
//! 1. **Snap** — for each polygon point, split the mesh so a vertex sits
//!    exactly under it;
//! 2. **Trace** — walk each polygon's segments through the mesh, splitting
//!    triangles so the polygon outline runs along mesh edges;
//! 3. **Cull** — remove every triangle whose centroid lies on the wrong
//!    side of the polygon.
//!
//! The whole pipeline is a resumable task: the host calls
//! [`PunchOut::step`] with a wall-clock budget and the task yields between
//! work units, keeping all cursors in the struct. One bad polygon never
//! aborts the batch; it is reported through the diagnostics sink and via
//! [`StepStatus::PolygonFailed`], and the remaining polygons still run.
//!
//! Terminology: a mesh has VERTICES and TRIANGLES, a polygon has POINTS and
//! SEGMENTS, a triangle has CORNERS and SIDES.

use std::time::{Duration, Instant};

use config::constants::{CUT_RATIO_SNAP, MAX_TRACE_STEPS, STEP_TIME_BUDGET_MS, TRACE_VERTEX_SNAP};
use glam::DVec3;

use crate::diagnostics::Diagnostics;
use crate::geometry::{cut_segment_by_line, XzPolygon};
use crate::mesh::InterlinkedMesh;

/// Outcome of one [`PunchOut::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Budget elapsed; call `step` again to continue.
    InProgress,
    /// Tracing the polygon with this index failed and was abandoned; the
    /// remaining polygons still run on further calls.
    PolygonFailed(usize),
    /// All phases finished (or the task was cancelled).
    Done,
}

/// Trace cursor for one polygon.
#[derive(Debug, Clone, Copy)]
struct TraceState {
    segment: usize,
    current: u32,
    steps: u32,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Snap { polygon: usize, point: usize },
    Trace { polygon: usize, state: Option<TraceState> },
    Cull { polygon: usize, triangle: u32 },
    Finished,
}

/// What a finished trace work unit asks the driver loop to do next.
enum TraceOutcome {
    Continue(TraceState),
    PolygonDone,
    PolygonFailed,
}

/// A resumable punch-out task over a set of polygons.
#[derive(Debug)]
pub struct PunchOut {
    polygons: Vec<XzPolygon>,
    keep_interior: bool,
    phase: Phase,
    /// Per polygon, per corner: the mesh vertex snapped under it.
    anchors: Vec<Vec<Option<u32>>>,
    failed: Vec<usize>,
    cancelled: bool,
}

impl PunchOut {
    /// Creates a task that punches all `polygons` into a mesh.
    ///
    /// With `keep_interior` false the polygon interiors become holes; with
    /// `keep_interior` true only the interiors survive.
    pub fn new(polygons: Vec<XzPolygon>, keep_interior: bool) -> Self {
        let phase = if polygons.is_empty() {
            Phase::Finished
        } else {
            Phase::Snap {
                polygon: 0,
                point: 0,
            }
        };
        let anchors = polygons
            .iter()
            .map(|polygon| vec![None; polygon.corner_count()])
            .collect();
        Self {
            polygons,
            keep_interior,
            phase,
            anchors,
            failed: Vec::new(),
            cancelled: false,
        }
    }

    /// Whether all phases have finished.
    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Whether the task was cancelled before finishing.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Indices of polygons whose tracing was abandoned.
    pub fn failed_polygons(&self) -> &[usize] {
        &self.failed
    }

    /// Abandons all remaining phases. The mesh stays in the state the last
    /// completed work unit left it in, which is always consistent.
    pub fn cancel(&mut self) {
        if !self.is_done() {
            self.cancelled = true;
            self.phase = Phase::Finished;
        }
    }

    /// Runs work units until the wall-clock budget elapses.
    ///
    /// At least one unit runs per call, so a zero budget single-steps the
    /// task. Degeneracies and lookup failures go to `diagnostics`.
    pub fn step(
        &mut self,
        mesh: &mut InterlinkedMesh,
        budget: Duration,
        diagnostics: &mut dyn Diagnostics,
    ) -> StepStatus {
        let started = Instant::now();
        let mut units = 0u32;

        loop {
            if units > 0 && started.elapsed() >= budget {
                return StepStatus::InProgress;
            }
            units += 1;

            match self.phase {
                Phase::Finished => return StepStatus::Done,
                Phase::Snap { polygon, point } => {
                    if point >= self.polygons[polygon].corner_count() {
                        self.phase = if polygon + 1 < self.polygons.len() {
                            Phase::Snap {
                                polygon: polygon + 1,
                                point: 0,
                            }
                        } else {
                            Phase::Trace {
                                polygon: 0,
                                state: None,
                            }
                        };
                        continue;
                    }
                    self.snap_point(mesh, polygon, point, diagnostics);
                    self.phase = Phase::Snap {
                        polygon,
                        point: point + 1,
                    };
                }
                Phase::Trace { polygon, state } => {
                    let state = match state {
                        Some(state) => state,
                        None => match self.anchors[polygon].first().copied().flatten() {
                            Some(current) => TraceState {
                                segment: 0,
                                current,
                                steps: 0,
                            },
                            None => {
                                diagnostics.error("no vertex under polygon point 0");
                                self.fail_polygon(polygon);
                                return StepStatus::PolygonFailed(polygon);
                            }
                        },
                    };
                    match self.trace_step(mesh, polygon, state, diagnostics) {
                        TraceOutcome::Continue(state) => {
                            self.phase = Phase::Trace {
                                polygon,
                                state: Some(state),
                            };
                        }
                        TraceOutcome::PolygonDone => self.advance_from_trace(polygon),
                        TraceOutcome::PolygonFailed => {
                            self.fail_polygon(polygon);
                            return StepStatus::PolygonFailed(polygon);
                        }
                    }
                }
                Phase::Cull { polygon, triangle } => {
                    if triangle >= mesh.triangle_count() as u32 {
                        self.phase = if polygon + 1 < self.polygons.len() {
                            Phase::Cull {
                                polygon: polygon + 1,
                                triangle: 0,
                            }
                        } else {
                            Phase::Finished
                        };
                        continue;
                    }
                    let centroid = mesh.triangle(triangle).centroid(mesh.vertices());
                    let inside = self.polygons[polygon].contains(centroid);
                    if inside != self.keep_interior {
                        // The swapped-in triangle lands on the same slot and
                        // is examined next, so the cursor stays put.
                        mesh.remove_triangle(triangle);
                        self.phase = Phase::Cull { polygon, triangle };
                    } else {
                        self.phase = Phase::Cull {
                            polygon,
                            triangle: triangle + 1,
                        };
                    }
                }
            }
        }
    }

    /// Drives [`PunchOut::step`] with the default budget until done.
    pub fn run_to_completion(
        &mut self,
        mesh: &mut InterlinkedMesh,
        diagnostics: &mut dyn Diagnostics,
    ) {
        let budget = Duration::from_millis(STEP_TIME_BUDGET_MS);
        while self.step(mesh, budget, diagnostics) != StepStatus::Done {}
    }

    fn fail_polygon(&mut self, polygon: usize) {
        self.failed.push(polygon);
        self.advance_from_trace(polygon);
    }

    fn advance_from_trace(&mut self, polygon: usize) {
        // Anchors of a traced polygon are no longer needed.
        self.anchors[polygon].clear();
        self.phase = if polygon + 1 < self.polygons.len() {
            Phase::Trace {
                polygon: polygon + 1,
                state: None,
            }
        } else {
            Phase::Cull {
                polygon: 0,
                triangle: 0,
            }
        };
    }

    // =========================================================================
    // PHASE 1 — SNAP
    // =========================================================================

    /// Makes sure a mesh vertex sits under one polygon point, splitting a
    /// triangle edge or interior when necessary, and records the anchor.
    fn snap_point(
        &mut self,
        mesh: &mut InterlinkedMesh,
        polygon: usize,
        point: usize,
        diagnostics: &mut dyn Diagnostics,
    ) {
        let points = self.polygons[polygon].points();
        let position = points[point];

        if point > 0 && (position - points[point - 1]).length() < TRACE_VERTEX_SNAP {
            diagnostics.warning("polygon has two very near points");
        }

        let mut t = 0;
        while t < mesh.triangle_count() as u32 {
            let triangle = mesh.triangle(t);
            if triangle.is_far_from_xz(position) {
                t += 1;
                continue;
            }

            // (a) The point already sits over a corner.
            if let Some(corner) = triangle
                .corners()
                .into_iter()
                .find(|&corner| mesh.vertex(corner).is_under(position))
            {
                self.anchors[polygon][point] = Some(corner);
                return;
            }

            // (b) The point sits on a side: split the edge.
            //
            //             P---------------R
            //           /  \   behind   //
            //         /     \         / /
            //       /        \     /   /
            //     / triangle  \  /    /
            //   S -_- - - - - -X     /
            //        -  _       \   /
            //              -  _  \ /
            //                   - Q
            if let Some((p, q)) = triangle.border_contains_xz(mesh.vertices(), position) {
                let anchor = split_edge(mesh, t, p, q, position);
                self.anchors[polygon][point] = Some(anchor);
                return;
            }

            // (c) The point is strictly interior: split into three.
            if triangle.contains_xz(mesh.vertices(), position) {
                match split_interior(mesh, t, position) {
                    Some(anchor) => {
                        self.anchors[polygon][point] = Some(anchor);
                        return;
                    }
                    None => {
                        diagnostics.error("degenerate triangle under polygon point");
                        t += 1;
                        continue;
                    }
                }
            }

            t += 1;
        }
        // No triangle under the point; the trace phase reports the polygon.
    }

    // =========================================================================
    // PHASE 2 — TRACE
    // =========================================================================

    /// One trace step for one polygon.
    ///
    /// ```text
    ///                            P---------------R
    ///                          /  \  triangle2 //
    ///                        /     \         / /
    ///                \     /        \     /   /
    ///                 \  / triangle1 \  /    /
    ///         current * -------------X--   /
    ///                 |\ ' -  _       \   /
    ///                 | \        -  _  \ /
    ///                                 - Q
    /// ```
    fn trace_step(
        &mut self,
        mesh: &mut InterlinkedMesh,
        polygon: usize,
        mut state: TraceState,
        diagnostics: &mut dyn Diagnostics,
    ) -> TraceOutcome {
        let points: Vec<DVec3> = self.polygons[polygon].points().to_vec();
        let corner_count = points.len() - 1;

        if state.segment >= corner_count {
            return TraceOutcome::PolygonDone;
        }
        state.steps += 1;
        if state.steps > MAX_TRACE_STEPS {
            diagnostics.error("polygon trace exceeded the step cap");
            return TraceOutcome::PolygonFailed;
        }

        let position = mesh.vertex(state.current).position;
        let mut direction = points[state.segment + 1] - position;

        // Safeguard against going back and forth between two vertices:
        // skip segments we are already past.
        while direction.dot(points[state.segment + 1] - points[state.segment]) < 0.0 {
            state.segment += 1;
            if state.segment >= corner_count {
                return TraceOutcome::PolygonDone;
            }
            direction = points[state.segment + 1] - position;
        }
        direction.y = 0.0;

        let next_anchor = self.anchors[polygon]
            .get(state.segment + 1)
            .copied()
            .flatten();

        if direction * 1.0e6 == DVec3::ZERO {
            diagnostics.error("trace direction is zero");
            match next_anchor {
                Some(anchor) => {
                    state.current = anchor;
                    state.segment += 1;
                }
                None => return TraceOutcome::PolygonFailed,
            }
        } else if let Some(anchor) =
            next_anchor.filter(|&anchor| mesh.are_neighbours(anchor, state.current))
        {
            // The vertex under the next polygon point is already a mesh
            // neighbour; proceed to it.
            state.current = anchor;
            state.segment += 1;
        } else if let Some(n) = mesh.neighbour_in_direction(state.current, direction) {
            // An edge already runs the right way; no subdivision needed.
            if mesh.vertex(n).is_under(points[state.segment + 1]) {
                state.segment += 1;
            }
            state.current = n;
        } else {
            let Some((triangle1, p, q)) =
                mesh.adjacent_triangle_in_direction(state.current, direction)
            else {
                diagnostics.error("no triangle under the polygon segment");
                return TraceOutcome::PolygonFailed;
            };
            let Some(triangle2) = mesh.triangle_behind(triangle1, p, q) else {
                diagnostics.error("no triangle behind the one under the polygon segment");
                return TraceOutcome::PolygonFailed;
            };
            let r = mesh.triangle(triangle2).third_corner(p, q);

            let cut = cut_segment_by_line(
                mesh.vertex(p).position,
                mesh.vertex(q).position,
                position,
                position + direction,
            );
            let (crossing, cut_ratio) = match cut {
                Ok(cut) => cut,
                Err(err) => {
                    diagnostics.error(&format!("polygon segment cut failed: {err}"));
                    return TraceOutcome::PolygonFailed;
                }
            };

            // A cut ratio right next to 0 or 1 means an endpoint already
            // sits on the traced line; reuse it instead of creating a
            // near-duplicate vertex.
            if cut_ratio < CUT_RATIO_SNAP {
                if mesh.vertex(p).is_under(points[state.segment + 1]) {
                    state.segment += 1;
                }
                state.current = p;
            } else if cut_ratio > 1.0 - CUT_RATIO_SNAP {
                if mesh.vertex(q).is_under(points[state.segment + 1]) {
                    state.segment += 1;
                }
                state.current = q;
            } else {
                let x = mesh.add_vertex(crossing);
                lerp_attributes(mesh, x, p, q, cut_ratio);

                // Both flanking triangles become two each. Removing the
                // first may relocate the second, so it is re-found by its
                // surviving edge afterwards.
                mesh.remove_triangle(triangle1);
                mesh.add_triangle(state.current, x, p, false);
                mesh.add_triangle(state.current, q, x, false);

                if let Some(triangle2) = mesh.find_triangle_with_edge(p, q) {
                    mesh.remove_triangle(triangle2);
                    mesh.add_triangle(x, q, r, false);
                    mesh.add_triangle(x, r, p, false);
                }

                if (position - mesh.vertex(p).position).length() < TRACE_VERTEX_SNAP {
                    state.current = p;
                } else if (position - mesh.vertex(q).position).length() < TRACE_VERTEX_SNAP {
                    state.current = q;
                } else if mesh.vertex(r).is_under(points[state.segment + 1]) {
                    state.current = r;
                    state.segment += 1;
                } else {
                    state.current = x;
                }

                while state.segment + 1 < points.len()
                    && mesh.vertex(state.current).is_under(points[state.segment + 1])
                {
                    state.segment += 1;
                }
            }
        }

        TraceOutcome::Continue(state)
    }
}

/// Interpolates UV and tangent of vertex `x` between `p` and `q`.
fn lerp_attributes(mesh: &mut InterlinkedMesh, x: u32, p: u32, q: u32, ratio: f64) {
    let uv = mesh.vertex(p).uv.lerp(mesh.vertex(q).uv, ratio);
    let tangent = mesh.vertex(p).tangent.lerp(mesh.vertex(q).tangent, ratio);
    let vertex = mesh.vertex_mut(x);
    vertex.uv = uv;
    vertex.tangent = tangent;
}

/// Splits triangle `t` (and its neighbour behind the side `p`-`q`, if any)
/// at `position` on that side. Returns the new vertex.
fn split_edge(mesh: &mut InterlinkedMesh, t: u32, p: u32, q: u32, position: DVec3) -> u32 {
    let p_pos = mesh.vertex(p).position;
    let q_pos = mesh.vertex(q).position;
    let mut pq = q_pos - p_pos;
    pq.y = 0.0;
    let mut px = position - p_pos;
    px.y = 0.0;
    let cut_ratio = px.length() / pq.length();

    let x = mesh.add_vertex(p_pos.lerp(q_pos, cut_ratio));
    lerp_attributes(mesh, x, p, q, cut_ratio);

    let s = mesh.triangle(t).third_corner(p, q);
    let s_pos = mesh.vertex(s).position;
    // The third corner behind the split edge, captured before any removal
    // relocates its triangle.
    let r = mesh
        .triangle_behind(t, p, q)
        .map(|behind| mesh.triangle(behind).third_corner(p, q));

    mesh.remove_triangle(t);
    let flip = (p_pos - s_pos).cross(q_pos - s_pos).y > 0.0;
    mesh.add_triangle(s, x, p, flip);
    mesh.add_triangle(s, q, x, flip);

    if let Some(r) = r {
        if let Some(behind) = mesh.find_triangle_with_edge(p, q) {
            mesh.remove_triangle(behind);
            mesh.add_triangle(p, x, r, flip);
            mesh.add_triangle(x, q, r, flip);
        }
    }
    x
}

/// Splits triangle `t` into three at a strictly interior point, placing the
/// new vertex at the mesh's own height under `position`.
///
/// With U = position − A, V = C − A, W = B − A, the vertex goes to
/// A + λV + μW where λ, μ solve the XZ system
///
/// ```text
///   [V.x   W.x]   ( λ )   ( U.x )
///   [V.z   W.z] * ( μ ) = ( U.z )
/// ```
///
/// UV and tangent interpolate with the same weights. Returns `None` for a
/// zero determinant (degenerate triangle).
fn split_interior(mesh: &mut InterlinkedMesh, t: u32, position: DVec3) -> Option<u32> {
    let [a, b, c] = mesh.triangle(t).corners();
    let a_pos = mesh.vertex(a).position;
    let u = position - a_pos;
    let v = mesh.vertex(c).position - a_pos;
    let w = mesh.vertex(b).position - a_pos;

    let det = v.x * w.z - v.z * w.x;
    if det == 0.0 {
        return None;
    }
    let lambda = (w.z * u.x - w.x * u.z) / det;
    let mu = (-v.z * u.x + v.x * u.z) / det;

    let x = mesh.add_vertex(a_pos + lambda * v + mu * w);
    let uv = mesh.vertex(a).uv + lambda * (mesh.vertex(c).uv - mesh.vertex(a).uv)
        + mu * (mesh.vertex(b).uv - mesh.vertex(a).uv);
    let tangent = mesh.vertex(a).tangent
        + lambda * (mesh.vertex(c).tangent - mesh.vertex(a).tangent)
        + mu * (mesh.vertex(b).tangent - mesh.vertex(a).tangent);
    let vertex = mesh.vertex_mut(x);
    vertex.uv = uv;
    vertex.tangent = tangent;

    mesh.remove_triangle(t);
    mesh.add_triangle(c, a, x, false);
    mesh.add_triangle(a, b, x, false);
    mesh.add_triangle(b, c, x, false);
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnostics;
    use approx::assert_relative_eq;

    fn triangle_area(mesh: &InterlinkedMesh, t: u32) -> f64 {
        let [a, b, c] = mesh.triangle(t).corners();
        let ab = mesh.vertex(b).position - mesh.vertex(a).position;
        let ac = mesh.vertex(c).position - mesh.vertex(a).position;
        ab.cross(ac).length() * 0.5
    }

    fn total_area(mesh: &InterlinkedMesh) -> f64 {
        (0..mesh.triangle_count() as u32)
            .map(|t| triangle_area(mesh, t))
            .sum()
    }

    fn right_triangle_mesh() -> InterlinkedMesh {
        let mut mesh = InterlinkedMesh::new();
        let a = mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(DVec3::new(0.0, 0.0, 2.0));
        let c = mesh.add_vertex(DVec3::new(2.0, 0.0, 0.0));
        mesh.add_triangle(a, b, c, false);
        mesh
    }

    #[test]
    fn test_split_interior_conserves_area() {
        let mut mesh = right_triangle_mesh();
        let before = total_area(&mesh);
        let x = split_interior(&mut mesh, 0, DVec3::new(0.5, 0.0, 0.5)).unwrap();

        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.vertex(x).position, DVec3::new(0.5, 0.0, 0.5));
        assert_relative_eq!(total_area(&mesh), before, epsilon = 1e-12);
        mesh.check_indices().unwrap();
    }

    #[test]
    fn test_split_interior_keeps_surface_height() {
        // Tilted triangle: the new vertex must land on the surface, not at
        // the probe's height.
        let mut mesh = InterlinkedMesh::new();
        let a = mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(DVec3::new(0.0, 2.0, 2.0));
        let c = mesh.add_vertex(DVec3::new(2.0, 0.0, 0.0));
        mesh.add_triangle(a, b, c, false);

        let x = split_interior(&mut mesh, 0, DVec3::new(0.5, 7.0, 0.5)).unwrap();
        assert_relative_eq!(mesh.vertex(x).position.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_split_interior_rejects_degenerate_triangle() {
        let mut mesh = InterlinkedMesh::new();
        let a = mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(DVec3::new(2.0, 0.0, 0.0));
        mesh.add_triangle(a, b, c, false);
        assert!(split_interior(&mut mesh, 0, DVec3::new(1.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_split_edge_splits_both_flanking_triangles() {
        let mut mesh = InterlinkedMesh::new();
        let a = mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(DVec3::new(0.0, 0.0, 1.0));
        let c = mesh.add_vertex(DVec3::new(1.0, 0.0, 1.0));
        let d = mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
        mesh.add_triangle(a, b, c, false);
        mesh.add_triangle(a, c, d, false);

        let before = total_area(&mesh);
        let x = split_edge(&mut mesh, 0, a, c, DVec3::new(0.5, 0.0, 0.5));

        // Two triangles became four, sharing the new vertex.
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.triangles_at(x).len(), 4);
        assert_relative_eq!(total_area(&mesh), before, epsilon = 1e-12);
        mesh.check_indices().unwrap();
    }

    #[test]
    fn test_empty_polygon_list_is_done_immediately() {
        let mut mesh = right_triangle_mesh();
        let mut task = PunchOut::new(Vec::new(), false);
        let mut diagnostics = CollectingDiagnostics::new();
        assert!(task.is_done());
        assert_eq!(
            task.step(&mut mesh, Duration::ZERO, &mut diagnostics),
            StepStatus::Done
        );
    }

    #[test]
    fn test_cancel_stops_the_task() {
        let polygon = XzPolygon::new(vec![
            DVec3::new(0.2, 0.0, 0.2),
            DVec3::new(0.2, 0.0, 0.6),
            DVec3::new(0.6, 0.0, 0.2),
        ]);
        let mut mesh = right_triangle_mesh();
        let mut task = PunchOut::new(vec![polygon], false);
        let mut diagnostics = CollectingDiagnostics::new();

        let triangles_before = mesh.triangle_count();
        assert_eq!(
            task.step(&mut mesh, Duration::ZERO, &mut diagnostics),
            StepStatus::InProgress
        );
        task.cancel();
        assert!(task.is_done());
        assert!(task.is_cancelled());
        assert_eq!(
            task.step(&mut mesh, Duration::ZERO, &mut diagnostics),
            StepStatus::Done
        );
        // The first snapped point already split the mesh; the state is
        // consistent even though the task never finished.
        assert!(mesh.triangle_count() >= triangles_before);
        mesh.check_indices().unwrap();
    }
}
