use thiserror::Error;

/// Largest batch capacity addressable with `u16` indices (4 vertices per quad).
pub const MAX_BATCH_CAPACITY: usize = (u16::MAX as usize + 1) / 4;

/// Recoverable construction and resource errors.
///
/// Out-of-order `begin`/`end`/`draw` calls are not represented here: those are
/// programming errors and panic.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("batch capacity {capacity} is outside 1..={max}")]
    CapacityOutOfRange { capacity: usize, max: usize },

    #[error("texture of {width}x{height} pixels needs {expected} bytes of RGBA8 data, got {actual}")]
    TextureDataMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    EmptyTexture { width: u32, height: u32 },

    #[error("nine-slice region must be non-empty, got {width}x{height}")]
    EmptyRegion { width: f32, height: f32 },
}

/// Validate RGBA8 pixel data against a texture size.
///
/// Back-ends call this before creating a texture.
pub fn check_texture_data(width: u32, height: u32, rgba: &[u8]) -> Result<(), Error> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyTexture { width, height });
    }

    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(Error::TextureDataMismatch {
            width,
            height,
            expected,
            actual: rgba.len(),
        });
    }

    Ok(())
}
