//! Vertex layouts written by the batches.
//!
//! Both layouts are part of the wire contract with the shaders, so their sizes
//! are fixed: 20 bytes per sprite vertex, 44 bytes per nine-slice vertex. The
//! packed tint is an `f32` on the CPU side and four normalized bytes on the GPU
//! side (see [`crate::pack_tint`]).

use bytemuck::{Pod, Zeroable};

/// Component layout of a single vertex attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeFormat {
    Float32x2,
    Float32x4,
    /// Four bytes normalized to `[0, 1]`.
    Unorm8x4,
}

impl AttributeFormat {
    pub const fn size(self) -> usize {
        match self {
            Self::Float32x2 => 8,
            Self::Float32x4 => 16,
            Self::Unorm8x4 => 4,
        }
    }
}

/// A named attribute inside an interleaved vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub offset: usize,
    pub format: AttributeFormat,
}

impl VertexAttribute {
    pub const fn new(name: &'static str, offset: usize, format: AttributeFormat) -> Self {
        Self {
            name,
            offset,
            format,
        }
    }
}

/// A vertex type a [`crate::QuadBatch`] can buffer.
pub trait QuadVertex: Pod {
    /// Attribute descriptors in shader location order.
    const ATTRIBUTES: &'static [VertexAttribute];

    /// Size in bytes of one vertex.
    const STRIDE: usize = std::mem::size_of::<Self>();
}

/// Sprite vertex: position, uv, packed tint.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub tint: f32,
}

impl SpriteVertex {
    pub const fn new(pos: [f32; 2], uv: [f32; 2], tint: f32) -> Self {
        Self { pos, uv, tint }
    }
}

impl QuadVertex for SpriteVertex {
    const ATTRIBUTES: &'static [VertexAttribute] = &[
        VertexAttribute::new("position", 0, AttributeFormat::Float32x2),
        VertexAttribute::new("uv", 8, AttributeFormat::Float32x2),
        VertexAttribute::new("color", 16, AttributeFormat::Unorm8x4),
    ];
}

/// Nine-slice vertex.
///
/// Every vertex of a quad carries the full source UV rectangle; `slice` marks
/// which corner of the rectangle the vertex is (0 or 1 per axis) so the fragment
/// stage can remap UVs with the border ratios.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct NineSliceVertex {
    pub pos: [f32; 2],
    /// `[u_min, v_min, u_max, v_max]`
    pub uv_rect: [f32; 4],
    pub slice: [f32; 2],
    /// Border size over target render size, per axis.
    pub dimension: [f32; 2],
    pub tint: f32,
}

impl QuadVertex for NineSliceVertex {
    const ATTRIBUTES: &'static [VertexAttribute] = &[
        VertexAttribute::new("position", 0, AttributeFormat::Float32x2),
        VertexAttribute::new("uv_rect", 8, AttributeFormat::Float32x4),
        VertexAttribute::new("slice", 24, AttributeFormat::Float32x2),
        VertexAttribute::new("dimension", 32, AttributeFormat::Float32x2),
        VertexAttribute::new("color", 40, AttributeFormat::Unorm8x4),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_packed<V: QuadVertex>() {
        let mut end = 0;
        for attr in V::ATTRIBUTES {
            assert_eq!(attr.offset, end, "attribute {} is not packed", attr.name);
            end = attr.offset + attr.format.size();
        }
        assert_eq!(end, V::STRIDE);
    }

    #[test]
    fn test_strides() {
        assert_eq!(SpriteVertex::STRIDE, 20);
        assert_eq!(NineSliceVertex::STRIDE, 44);
    }

    #[test]
    fn test_attributes_are_tightly_packed() {
        assert_packed::<SpriteVertex>();
        assert_packed::<NineSliceVertex>();
    }
}
