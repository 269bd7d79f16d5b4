//! Glyph atlases and text layout for `quadbatch`.
//!
//! A [`GlyphAtlasBuilder`] packs a character set into one texture, either by
//! rasterizing a vector font through a [`GlyphRasterizer`] (the `cosmic`
//! feature provides one on `cosmic-text`) or by slicing an existing bitmap font
//! grid ([`GlyphAtlas::from_bitmap`]). [`layout_text`] turns a string into glyph
//! placements that a `SpriteBatch` can draw.

mod atlas;
mod builder;
mod error;
mod glyph;
mod kerning;
mod layout;

#[cfg(feature = "cosmic")]
pub mod cosmic;

pub use atlas::*;
pub use builder::*;
pub use error::*;
pub use glyph::*;
pub use kerning::*;
pub use layout::*;
