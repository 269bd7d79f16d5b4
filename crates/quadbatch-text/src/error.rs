use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtlasError {
    #[error("character set is empty")]
    EmptyCharset,

    #[error("bitmap cell must be non-zero, got {width}x{height}")]
    EmptyCell { width: u32, height: u32 },

    #[error("characters per line must be non-zero")]
    ZeroCharsPerLine,

    #[error("{columns}x{rows} grid of {cell_width}x{cell_height} cells does not fit a {texture_width}x{texture_height} texture")]
    GridExceedsTexture {
        columns: u32,
        rows: u32,
        cell_width: u32,
        cell_height: u32,
        texture_width: u32,
        texture_height: u32,
    },

    #[error("atlas texture upload failed: {0}")]
    Texture(#[from] quadbatch::Error),
}
