//! WGPU vertex buffer layouts derived from the core attribute descriptors.

use quadbatch::{AttributeFormat, NineSliceVertex, ProgramKind, QuadVertex, SpriteVertex};

fn vertex_format(format: AttributeFormat) -> wgpu::VertexFormat {
    match format {
        AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        AttributeFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
        AttributeFormat::Unorm8x4 => wgpu::VertexFormat::Unorm8x4,
    }
}

/// Shader attributes of `V`, one location per attribute in declaration order.
pub fn vertex_attributes<V: QuadVertex>() -> Vec<wgpu::VertexAttribute> {
    V::ATTRIBUTES
        .iter()
        .enumerate()
        .map(|(location, attr)| wgpu::VertexAttribute {
            offset: attr.offset as wgpu::BufferAddress,
            shader_location: location as u32,
            format: vertex_format(attr.format),
        })
        .collect()
}

/// Attributes and stride of the vertex type a program reads.
pub fn program_vertex_layout(kind: ProgramKind) -> (Vec<wgpu::VertexAttribute>, u64) {
    match kind {
        ProgramKind::Sprite => (
            vertex_attributes::<SpriteVertex>(),
            SpriteVertex::STRIDE as u64,
        ),
        ProgramKind::NineSlice => (
            vertex_attributes::<NineSliceVertex>(),
            NineSliceVertex::STRIDE as u64,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_layout() {
        let (attributes, stride) = program_vertex_layout(ProgramKind::Sprite);
        assert_eq!(stride, 20);

        let expected = wgpu::vertex_attr_array![
            0 => Float32x2,
            1 => Float32x2,
            2 => Unorm8x4,
        ];
        assert_eq!(attributes, expected.to_vec());
    }

    #[test]
    fn test_nine_slice_layout() {
        let (attributes, stride) = program_vertex_layout(ProgramKind::NineSlice);
        assert_eq!(stride, 44);

        let expected = wgpu::vertex_attr_array![
            0 => Float32x2,
            1 => Float32x4,
            2 => Float32x2,
            3 => Float32x2,
            4 => Unorm8x4,
        ];
        assert_eq!(attributes, expected.to_vec());
    }

    #[test]
    fn test_layout_fits_stride() {
        for kind in [ProgramKind::Sprite, ProgramKind::NineSlice] {
            let (attributes, stride) = program_vertex_layout(kind);
            let last = attributes.last().unwrap();
            assert_eq!(last.offset + last.format.size(), stride);
        }
    }
}
