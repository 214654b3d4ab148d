use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Renders text onto frames with an optional TrueType font.
///
/// When the font cannot be loaded, drawing calls are no-ops and measurements
/// fall back to a fixed-width estimate so label backgrounds still line up.
#[derive(Clone, Default)]
pub struct TextPainter {
    font: Option<Arc<Font<'static>>>,
}

impl TextPainter {
    /// Load the font at `path`, degrading to a text-less painter on failure
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read(path) {
            Ok(data) => match Font::try_from_vec(data) {
                Some(font) => {
                    debug!("Loaded overlay font from {}", path.display());
                    Self {
                        font: Some(Arc::new(font)),
                    }
                }
                None => {
                    warn!(
                        "Failed to parse font file '{}'; overlay text disabled",
                        path.display()
                    );
                    Self::disabled()
                }
            },
            Err(e) => {
                warn!(
                    "Failed to read font file '{}': {}; overlay text disabled",
                    path.display(),
                    e
                );
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Width and height of `text` at `size` pixels
    pub fn measure(&self, size: f32, text: &str) -> (u32, u32) {
        match &self.font {
            Some(font) => {
                let (w, h) = text_size(Scale::uniform(size), font, text);
                (w.max(0) as u32, h.max(0) as u32)
            }
            None => (
                (text.chars().count() as f32 * size * 0.5).ceil() as u32,
                size.ceil() as u32,
            ),
        }
    }

    /// Draw `text` with its top-left corner at (x, y)
    pub fn draw(&self, image: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, size: f32, text: &str) {
        if let Some(font) = &self.font {
            draw_text_mut(image, color, x, y, Scale::uniform(size), font, text);
        }
    }
}

impl std::fmt::Debug for TextPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextPainter")
            .field("font_loaded", &self.font.is_some())
            .finish()
    }
}
