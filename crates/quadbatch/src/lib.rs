//! # quadbatch
//!
//! Graphics backend agnostic 2D quad batching.
//!
//! Sprites, nine-slice UI panels and text glyphs are accumulated into shared
//! vertex/index buffers and drawn with as few draw calls as the sequence of
//! textures allows. The crate never talks to a graphics API itself: every batch
//! is handed a [`GpuContext`] wrapping a [`GpuBackend`] implementation, such as
//! the one in `quadbatch-wgpu` or the headless [`RecordingBackend`].

mod backend;
mod batch;
mod color;
mod config;
mod corners;
mod error;
mod nine_slice;
mod nine_slice_batch;
mod primitives;
mod recording;
mod sprite_batch;
mod texture;
mod vertex;

pub use backend::*;
pub use batch::*;
pub use color::*;
pub use config::*;
pub use corners::*;
pub use error::*;
pub use nine_slice::*;
pub use nine_slice_batch::*;
pub use primitives::*;
pub use recording::*;
pub use sprite_batch::*;
pub use texture::*;
pub use vertex::*;

pub use glam;
