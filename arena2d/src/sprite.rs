use image::RgbaImage;

use crate::assets::AssetLoader;
use crate::error::{AssetError, Result};
use crate::math::{Rect, Vec2};

/// Turns encoded image bytes into an RGBA8 pixel buffer.
pub trait ImageDecoder {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<RgbaImage>;
}

/// Decoder backed by the `image` crate (PNG, JPEG, GIF, BMP).
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultImageDecoder;

impl ImageDecoder for DefaultImageDecoder {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<RgbaImage> {
        let image = image::load_from_memory(bytes).map_err(|e| AssetError::decode(name, e))?;
        Ok(image.to_rgba8())
    }
}

/// An image placed in 2D space with a size and a paint layer.
///
/// Width and height are independent of the image's native resolution, so
/// a renderer may stretch the image to fit. Higher layers are meant to be
/// drawn on top of lower ones; the sprite itself only reports the value.
#[derive(Clone)]
pub struct Sprite {
    source: String,
    image: Option<RgbaImage>,
    position: Vec2,
    size: Vec2,
    layer: i32,
    load_error: Option<AssetError>,
}

impl Sprite {
    /// Create a sprite on layer 0 and load its image from `source`
    /// (file path or HTTP(S) URL).
    ///
    /// A failed load is logged and kept in [`Sprite::load_error`]; the
    /// sprite is still usable for positioning and collision.
    pub fn new(source: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::with_loader(
            source,
            x,
            y,
            width,
            height,
            &AssetLoader::default(),
            &DefaultImageDecoder,
        )
    }

    /// Like [`Sprite::new`], but with an explicit loader and decoder.
    pub fn with_loader(
        source: impl Into<String>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        loader: &AssetLoader,
        decoder: &dyn ImageDecoder,
    ) -> Self {
        let mut sprite = Self::blank(x, y, width, height);
        sprite.set_source_with(source, loader, decoder);
        sprite
    }

    /// Create a sprite around an image that is already decoded, such as a
    /// procedurally generated one. No source is loaded.
    pub fn from_image(image: RgbaImage, x: f32, y: f32, width: f32, height: f32) -> Self {
        let mut sprite = Self::blank(x, y, width, height);
        sprite.image = Some(image);
        sprite
    }

    fn blank(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            source: String::new(),
            image: None,
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
            layer: 0,
            load_error: None,
        }
    }

    /// Put the sprite on the given paint layer.
    #[must_use]
    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the source and reload the image from it.
    ///
    /// The source is stored even if loading fails; in that case the image
    /// is cleared and the failure is logged and kept in
    /// [`Sprite::load_error`].
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.set_source_with(source, &AssetLoader::default(), &DefaultImageDecoder);
    }

    /// Like [`Sprite::set_source`], but also returns the load failure.
    pub fn try_set_source(&mut self, source: impl Into<String>) -> Result<()> {
        self.set_source_with(source, &AssetLoader::default(), &DefaultImageDecoder);
        match &self.load_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn set_source_with(
        &mut self,
        source: impl Into<String>,
        loader: &AssetLoader,
        decoder: &dyn ImageDecoder,
    ) {
        self.source = source.into();
        let decoded = loader
            .load_bytes(&self.source)
            .and_then(|bytes| decoder.decode(&self.source, &bytes));

        match decoded {
            Ok(image) => {
                log::debug!(
                    "Loaded sprite image {} ({}x{})",
                    self.source,
                    image.width(),
                    image.height()
                );
                self.image = Some(image);
                self.load_error = None;
            }
            Err(err) => {
                log::warn!("Failed to load sprite image {}: {}", self.source, err);
                self.image = None;
                self.load_error = Some(err);
            }
        }
    }

    /// The decoded image, or `None` if the last load failed.
    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// Replace the image directly, bypassing any decoding. The source
    /// string is left untouched.
    pub fn set_image(&mut self, image: RgbaImage) {
        self.image = Some(image);
        self.load_error = None;
    }

    /// Native resolution of the current image.
    pub fn image_dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|image| image.dimensions())
    }

    /// The error from the most recent failed load, if the image is missing
    /// because of it.
    pub fn load_error(&self) -> Option<&AssetError> {
        self.load_error.as_ref()
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn set_x(&mut self, x: f32) {
        self.position.x = x;
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn set_y(&mut self, y: f32) {
        self.position.y = y;
    }

    pub fn width(&self) -> f32 {
        self.size.x
    }

    pub fn set_width(&mut self, width: f32) {
        self.size.x = width;
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }

    pub fn set_height(&mut self, height: f32) {
        self.size.y = height;
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    /// Top-left corner.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            position: self.position,
            size: self.size,
        }
    }

    /// Translate by `(dx, dy)`. Nothing keeps the sprite inside an arena.
    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.position += Vec2::new(dx, dy);
    }

    /// True if the two sprites' boxes overlap. Shared edges don't count.
    pub fn collides(&self, other: &Sprite) -> bool {
        self.bounds().intersects(&other.bounds())
    }
}

impl std::fmt::Debug for Sprite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sprite")
            .field("source", &self.source)
            .field("image", &self.image_dimensions())
            .field("position", &self.position)
            .field("size", &self.size)
            .field("layer", &self.layer)
            .finish()
    }
}
