use bevy::prelude::*;

use crate::types::{Segment, Value};

/// Line-list buffers produced from a marching squares segment list.
///
/// Every segment contributes two consecutive vertices at `z = 0`; `indices`
/// pairs them up sequentially, so `indices[2k]` and `indices[2k + 1]` form
/// segment `k`.
#[derive(Component, Clone, Debug, Default)]
pub struct GeneratedContour {
    /// World-space segments, in traversal order.
    pub segments: Vec<Segment>,

    /// Flat list of vertex positions: `[[x, y, 0.0], ...]`
    pub positions: Vec<[Value; 3]>,

    /// Line index pairs into `positions`.
    pub indices: Vec<u32>,
}

impl GeneratedContour {
    /// Builds the vertex and index buffers for `segments`.
    pub fn build(segments: Vec<Segment>) -> Self {
        let positions: Vec<[Value; 3]> = segments
            .iter()
            .flat_map(|segment| segment.iter().map(|p| [p.x, p.y, 0.0]))
            .collect();
        let indices = (0..positions.len() as u32).collect();

        Self {
            segments,
            positions,
            indices,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
