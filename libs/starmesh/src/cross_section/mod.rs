//! # Cross Section
//!
//! A polyline of [`Vertex`] objects, a kind of "2D mesh" still embedded in
//! 3D space. Cross sections are extracted from the border of an existing
//! mesh and fed into the extrusion operations to build new geometry.
//!
//! Positions are expressed in an optional frame of reference
//! (`None` means world coordinates); [`CrossSection::to_polylines`] always
//! returns world coordinates.


use config::constants::NEAR_POINT_EPSILON;
use glam::{DAffine3, DVec3};

use crate::buffers::MeshBuffers;
use crate::error::{MeshError, MeshResult};
use crate::mesh::{CustomMesh, Vertex};

/// A cross-section segment: an ordered pair of vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub a: u32,
    pub b: u32,
}

/// A polyline embedded in 3D space, with per-vertex attributes.
#[derive(Debug, Clone, Default)]
pub struct CrossSection {
    vertices: Vec<Vertex>,
    segments: Vec<Segment>,
    /// Frame the vertex coordinates are expressed in; `None` is world space.
    frame: Option<DAffine3>,
}

/// Directed edge with a signed multiplicity, used while folding parts into
/// a common border.
struct LineInfo {
    start: DVec3,
    end: DVec3,
    multiplicity: i32,
}

fn is_near(a: DVec3, b: DVec3) -> bool {
    (b - a).length() < NEAR_POINT_EPSILON
}

impl CrossSection {
    /// Creates an empty cross section in world coordinates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-copies a cross section.
    ///
    /// Each source vertex's `copy_link` is set to the index of its copy, so
    /// the caller can correlate originals with copies afterwards.
    pub fn copy_of(original: &mut CrossSection) -> Self {
        let mut copy = Self::new();
        for i in 0..original.vertices.len() {
            let v = copy.add_vertex_like(&original.vertices[i]);
            original.vertices[i].copy_link = Some(v);
        }
        for segment in &original.segments {
            // Links written above; every source vertex has one.
            if let (Some(a), Some(b)) = (
                original.vertices[segment.a as usize].copy_link,
                original.vertices[segment.b as usize].copy_link,
            ) {
                copy.add_segment(a, b, false);
            }
        }
        copy.frame = original.frame;
        copy
    }

    // =========================================================================
    // EXTRACTION
    // =========================================================================

    /// Extracts the border at one side of a mesh.
    ///
    /// `border_direction` says which side: the vertices maximizing the dot
    /// product with it, within `tolerance`, form the border. A triangle edge
    /// becomes a segment when exactly two of the triangle's corners lie on
    /// the border; three-corner triangles are degenerate or orthogonal to
    /// the direction and are skipped. `frame` is assigned as the frame the
    /// mesh coordinates are already expressed in.
    pub fn border_of_mesh(
        mesh: &CustomMesh,
        border_direction: DVec3,
        frame: Option<DAffine3>,
        tolerance: f64,
    ) -> Self {
        let mut section = Self::new();

        let mut max_dot = f64::NEG_INFINITY;
        for vertex in mesh.vertices() {
            max_dot = max_dot.max(vertex.position.dot(border_direction));
        }

        // Copy index by mesh vertex index; None for off-border vertices.
        let mut copies: Vec<Option<u32>> = vec![None; mesh.vertex_count()];
        for vertex in mesh.vertices() {
            if vertex.position.dot(border_direction) >= max_dot - tolerance {
                copies[vertex.index() as usize] = Some(section.add_vertex_like(vertex));
            }
        }

        for triangle in mesh.triangles() {
            let [a, b, c] = triangle.corners();
            section.add_border_edge(
                copies[a as usize],
                copies[b as usize],
                copies[c as usize],
            );
        }

        section.frame = frame;
        section
    }

    /// Like [`CrossSection::border_of_mesh`], but over raw geometry buffers
    /// whose coordinates are expressed in `frame`.
    ///
    /// `global_direction` is given in world space; it is re-expressed into
    /// the frame and the tolerance rescaled by the length ratio.
    pub fn border_of_buffers(
        buffers: &MeshBuffers,
        global_direction: DVec3,
        frame: Option<DAffine3>,
        tolerance: f64,
    ) -> MeshResult<Self> {
        buffers.validate()?;
        let global_length = global_direction.length();
        if global_length <= 0.0 {
            return Err(MeshError::DegenerateLine {
                x: global_direction.x,
                y: global_direction.y,
                z: global_direction.z,
            });
        }

        let local_direction = match frame {
            Some(frame) => frame.inverse().transform_vector3(global_direction),
            None => global_direction,
        };
        let tolerance = tolerance * local_direction.length() / global_length;
        let local_direction = local_direction.normalize();

        let mut section = Self::new();

        let mut max_dot = f64::NEG_INFINITY;
        for &position in &buffers.positions {
            max_dot = max_dot.max(position.dot(local_direction));
        }

        let mut copies: Vec<Option<u32>> = vec![None; buffers.positions.len()];
        for (i, &position) in buffers.positions.iter().enumerate() {
            if position.dot(local_direction) >= max_dot - tolerance {
                let v = section.add_vertex(position);
                if let Some(&uv) = buffers.uvs.get(i) {
                    section.vertices[v as usize].uv = uv;
                }
                copies[i] = Some(v);
            }
        }

        for &[a, b, c] in &buffers.indices {
            section.add_border_edge(
                copies[a as usize],
                copies[b as usize],
                copies[c as usize],
            );
        }

        section.frame = frame;
        Ok(section)
    }

    /// Adds the edge of a triangle with exactly two on-border corners.
    fn add_border_edge(&mut self, a: Option<u32>, b: Option<u32>, c: Option<u32>) {
        match (a, b, c) {
            (Some(a), Some(b), None) => {
                self.add_segment(a, b, false);
            }
            (None, Some(b), Some(c)) => {
                self.add_segment(b, c, false);
            }
            (Some(a), None, Some(c)) => {
                self.add_segment(c, a, false);
            }
            _ => {}
        }
    }

    /// Builds the common border of several mesh parts.
    ///
    /// Every part's directed edges are re-expressed into `frame` (each part
    /// comes with its own local-to-world transform) and folded into a signed
    /// multiplicity count: an edge and its reverse cancel. Whatever survives
    /// after all parts is the outer border, emitted once as segments with
    /// near-point vertex sharing.
    pub fn common_border_of(
        frame: Option<DAffine3>,
        parts: &[(&MeshBuffers, DAffine3)],
    ) -> MeshResult<Self> {
        let mut section = Self::new();
        let mut lines: Vec<LineInfo> = Vec::new();
        let into_frame = frame.map(|f| f.inverse());

        for (buffers, part_transform) in parts {
            buffers.validate()?;
            let positions: Vec<DVec3> = buffers
                .positions
                .iter()
                .map(|&p| {
                    let world = part_transform.transform_point3(p);
                    match into_frame {
                        Some(into_frame) => into_frame.transform_point3(world),
                        None => world,
                    }
                })
                .collect();

            for corners in &buffers.indices {
                for p in 0..3 {
                    let q = (p + 1) % 3;
                    let a = positions[corners[p] as usize];
                    let b = positions[corners[q] as usize];

                    let mut found = false;
                    let mut l = 0;
                    while l < lines.len() {
                        let line = &mut lines[l];
                        if is_near(line.start, a) && is_near(line.end, b) {
                            line.multiplicity += 1;
                            found = true;
                            break;
                        }
                        if is_near(line.start, b) && is_near(line.end, a) {
                            line.multiplicity -= 1;
                            if line.multiplicity == 0 {
                                lines.swap_remove(l);
                            }
                            found = true;
                            break;
                        }
                        l += 1;
                    }
                    if !found {
                        lines.push(LineInfo {
                            start: a,
                            end: b,
                            multiplicity: 1,
                        });
                    }
                }
            }
        }

        for line in &lines {
            let a = section.find_or_add_vertex(line.start);
            let b = section.find_or_add_vertex(line.end);
            section.add_segment(a, b, false);
        }

        section.frame = frame;
        Ok(section)
    }

    // =========================================================================
    // VERTICES AND SEGMENTS
    // =========================================================================

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn vertex(&self, v: u32) -> &Vertex {
        &self.vertices[v as usize]
    }

    #[inline]
    pub fn vertex_mut(&mut self, v: u32) -> &mut Vertex {
        &mut self.vertices[v as usize]
    }

    /// Adds a vertex at a position and returns its index.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex::new(position, index));
        index
    }

    /// Adds a vertex copying another vertex's attributes.
    pub fn add_vertex_like(&mut self, original: &Vertex) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex::like(original, index));
        index
    }

    /// Finds a vertex near a position, if any.
    pub fn find_vertex(&self, position: DVec3) -> Option<u32> {
        self.vertices
            .iter()
            .find(|vertex| is_near(vertex.position, position))
            .map(Vertex::index)
    }

    /// Finds a vertex near a position, adding one when none is there.
    pub fn find_or_add_vertex(&mut self, position: DVec3) -> u32 {
        match self.find_vertex(position) {
            Some(v) => v,
            None => self.add_vertex(position),
        }
    }

    /// Links two vertices by a segment; `inverted` swaps the ends.
    pub fn add_segment(&mut self, a: u32, b: u32, inverted: bool) {
        let (a, b) = if inverted { (b, a) } else { (a, b) };
        self.segments.push(Segment { a, b });
    }

    // =========================================================================
    // POLYLINES
    // =========================================================================

    /// Stitches the segments into polylines, one per connected component,
    /// in world coordinates.
    ///
    /// Closed cross sections become polylines whose end point equals their
    /// start point. Near-degenerate segments are dropped first.
    pub fn to_polylines(&self) -> Vec<Vec<DVec3>> {
        let to_world = |position: DVec3| match self.frame {
            Some(frame) => frame.transform_point3(position),
            None => position,
        };

        let mut unhandled: Vec<Segment> = self
            .segments
            .iter()
            .copied()
            .filter(|segment| {
                !is_near(
                    self.vertices[segment.a as usize].position,
                    self.vertices[segment.b as usize].position,
                )
            })
            .collect();

        let mut finished: Vec<Vec<DVec3>> = Vec::new();

        while let Some(seed) = unhandled.first().copied() {
            unhandled.remove(0);

            let mut start_point = to_world(self.vertices[seed.a as usize].position);
            let mut end_point = to_world(self.vertices[seed.b as usize].position);
            let mut polyline = vec![start_point, end_point];

            // Grow at both ends; every match restarts the scan since the new
            // end point may now match an earlier segment.
            let mut i = 0;
            while i < unhandled.len() {
                let segment = unhandled[i];
                let a = to_world(self.vertices[segment.a as usize].position);
                let b = to_world(self.vertices[segment.b as usize].position);
                if is_near(end_point, a) {
                    end_point = b;
                    polyline.push(end_point);
                    unhandled.remove(i);
                    i = 0;
                } else if is_near(b, start_point) {
                    start_point = a;
                    polyline.insert(0, start_point);
                    unhandled.remove(i);
                    i = 0;
                } else {
                    i += 1;
                }
            }

            polyline.reverse();
            finished.push(polyline);
        }

        finished
    }

    // =========================================================================
    // FRAME OF REFERENCE
    // =========================================================================

    /// The frame the vertex coordinates are expressed in; `None` is world.
    #[inline]
    pub fn frame(&self) -> Option<DAffine3> {
        self.frame
    }

    /// Assigns the frame WITHOUT touching the coordinates. Call this when
    /// the stored coordinates already correspond to the frame.
    pub fn set_frame(&mut self, frame: Option<DAffine3>) {
        self.frame = frame;
    }

    /// Re-expresses every vertex position into a new frame, via world
    /// coordinates.
    pub fn change_frame_of_reference_to(&mut self, new_frame: Option<DAffine3>) {
        let into_new = new_frame.map(|f| f.inverse());
        for vertex in &mut self.vertices {
            let world = match self.frame {
                Some(frame) => frame.transform_point3(vertex.position),
                None => vertex.position,
            };
            vertex.position = match into_new {
                Some(into_new) => into_new.transform_point3(world),
                None => world,
            };
        }
        self.frame = new_frame;
    }

    // =========================================================================
    // MISCELLANEOUS
    // =========================================================================

    /// Whether the cross section runs rather vertically than horizontally
    /// through the UV square.
    pub fn is_rather_along_v_axis(&self) -> bool {
        let mut min_u = f64::INFINITY;
        let mut max_u = f64::NEG_INFINITY;
        let mut min_v = f64::INFINITY;
        let mut max_v = f64::NEG_INFINITY;
        for vertex in &self.vertices {
            min_u = min_u.min(vertex.uv.x);
            max_u = max_u.max(vertex.uv.x);
            min_v = min_v.min(vertex.uv.y);
            max_v = max_v.max(vertex.uv.y);
        }
        (max_v - min_v) > (max_u - min_u)
    }
}
