//! Arena2D - sound and sprite primitives for simple 2D games.
//!
//! The crate owns no game loop, renderer or mixer. A [`Sound`] loads a clip
//! and plays it on its own output line; a [`Sprite`] holds an image with a
//! position, size and layer and can test for overlap with another sprite.
//! Both load from a local path or an HTTP(S) URL.

pub mod assets;
pub mod audio;
pub mod config;
pub mod error;
pub mod math;
pub mod sprite;

pub use crate::assets::{AssetLoader, AssetSource};
pub use crate::audio::{
    clamp_volume, db_to_amplitude, volume_to_db, AudioBackend, AudioLine, RodioBackend, Sound,
};
pub use crate::config::AssetConfig;
pub use crate::error::{AssetError, Result};
pub use crate::math::{Rect, Vec2};
pub use crate::sprite::{DefaultImageDecoder, ImageDecoder, Sprite};
