use std::io::Cursor;
use std::sync::Arc;

use converter_core::{ConvertJob, FormatToken, Preview, TargetFormat};
use engine_logging::engine_debug;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, ImageFormat, RgbImage, RgbaImage};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("image has no pixels")]
    EmptyImage,
    #[error("cannot encode {format}: {message}")]
    Encode {
        format: TargetFormat,
        message: String,
    },
    #[error("conversion worker failed: {0}")]
    Worker(String),
}

/// The one RGBA pixel buffer every conversion is drawn through.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    canvas: RgbaImage,
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface {
    pub fn new() -> Self {
        Self {
            canvas: RgbaImage::new(0, 0),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// Decode an encoded image. The hint picks the first decoder to try; when it
    /// does not match, or is `Auto`, the codec is guessed from the content.
    pub fn load(bytes: &[u8], hint: FormatToken) -> Result<DynamicImage, SurfaceError> {
        if hint != FormatToken::Auto {
            match image::load_from_memory_with_format(bytes, codec_for(hint)) {
                Ok(decoded) => return Ok(decoded),
                Err(err) => engine_debug!("{} decoder rejected input ({}); sniffing", hint, err),
            }
        }
        image::load_from_memory(bytes).map_err(|err| SurfaceError::Decode(err.to_string()))
    }

    /// Resizing discards the previous content, like a canvas.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.canvas = RgbaImage::new(width, height);
    }

    /// Draw the bitmap at the origin with no scaling.
    pub fn paint(&mut self, bitmap: &DynamicImage) {
        imageops::replace(&mut self.canvas, &bitmap.to_rgba8(), 0, 0);
    }

    pub fn export(&self, target: TargetFormat) -> Result<Vec<u8>, SurfaceError> {
        let encode_err = |err: image::ImageError| SurfaceError::Encode {
            format: target,
            message: err.to_string(),
        };
        let mut buf = Vec::new();
        match target.quality() {
            Some(quality) => {
                let flattened = flatten_onto_black(&self.canvas);
                JpegEncoder::new_with_quality(&mut buf, quality)
                    .encode_image(&flattened)
                    .map_err(encode_err)?;
            }
            None => {
                DynamicImage::ImageRgba8(self.canvas.clone())
                    .write_to(&mut Cursor::new(&mut buf), codec_for(target.token()))
                    .map_err(encode_err)?;
            }
        }
        Ok(buf)
    }

    /// One full load, resize, paint, export cycle.
    pub fn render(
        &mut self,
        bytes: &[u8],
        hint: FormatToken,
        target: TargetFormat,
    ) -> Result<Preview, SurfaceError> {
        let bitmap = Self::load(bytes, hint)?;
        let (width, height) = (bitmap.width(), bitmap.height());
        if width == 0 || height == 0 {
            return Err(SurfaceError::EmptyImage);
        }
        self.resize(width, height);
        self.paint(&bitmap);
        let encoded = self.export(target)?;
        engine_debug!(
            "rendered {}x{} image to {} ({} bytes)",
            width,
            height,
            target,
            encoded.len()
        );
        Ok(Preview::new(target.mime(), encoded))
    }
}

/// Shared handle to the rendering surface. Holding the lock is the only way to draw.
#[derive(Debug, Clone, Default)]
pub struct SharedSurface {
    inner: Arc<Mutex<RenderSurface>>,
}

impl SharedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one job, holding the surface for the whole cycle.
    pub async fn convert(&self, job: ConvertJob) -> Result<Preview, SurfaceError> {
        let mut guard = self.inner.clone().lock_owned().await;
        tokio::task::spawn_blocking(move || {
            guard.render(&job.source.bytes, job.hint, job.target)
        })
        .await
        .map_err(|err| SurfaceError::Worker(err.to_string()))?
    }
}

fn codec_for(token: FormatToken) -> ImageFormat {
    match token {
        FormatToken::Jpg | FormatToken::Jpeg => ImageFormat::Jpeg,
        FormatToken::Webp => ImageFormat::WebP,
        FormatToken::Bmp => ImageFormat::Bmp,
        FormatToken::Gif => ImageFormat::Gif,
        FormatToken::Png | FormatToken::Auto => ImageFormat::Png,
    }
}

/// JPEG has no alpha channel; transparent pixels end up black.
fn flatten_onto_black(canvas: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let [r, g, b, a] = canvas.get_pixel(x, y).0;
        let scale = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
        image::Rgb([scale(r), scale(g), scale(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(pixel));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn render_preserves_dimensions() {
        let mut surface = RenderSurface::new();
        let bmp: TargetFormat = "bmp".parse().unwrap();
        let preview = surface
            .render(&png_bytes(7, 3, [1, 2, 3, 255]), FormatToken::Auto, bmp)
            .unwrap();
        assert_eq!(preview.mime, "image/bmp");
        assert_eq!(surface.dimensions(), (7, 3));
        let decoded = image::load_from_memory_with_format(&preview.bytes, ImageFormat::Bmp).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 3));
    }

    #[test]
    fn resize_clears_previous_content() {
        let mut surface = RenderSurface::new();
        let big = RenderSurface::load(&png_bytes(4, 4, [255, 0, 0, 255]), FormatToken::Png).unwrap();
        surface.resize(4, 4);
        surface.paint(&big);
        surface.resize(2, 2);
        let png: TargetFormat = "png".parse().unwrap();
        let out = surface.export(png).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn transparent_pixels_flatten_to_black_for_jpeg() {
        let canvas = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 0]));
        assert_eq!(flatten_onto_black(&canvas).get_pixel(0, 0).0, [0, 0, 0]);
        let opaque = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 255]));
        assert_eq!(flatten_onto_black(&opaque).get_pixel(0, 0).0, [200, 100, 50]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = RenderSurface::load(b"definitely not an image", FormatToken::Auto).unwrap_err();
        assert!(matches!(err, SurfaceError::Decode(_)));
    }

    #[test]
    fn mismatched_hint_falls_back_to_content() {
        let png = png_bytes(2, 2, [0, 0, 0, 255]);
        assert!(RenderSurface::load(&png, FormatToken::Png).is_ok());
        let decoded = RenderSurface::load(&png, FormatToken::Bmp).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));

        let mut surface = RenderSurface::new();
        let jpg: TargetFormat = "jpg".parse().unwrap();
        let jpeg = surface
            .render(&png_bytes(3, 1, [9, 9, 9, 255]), FormatToken::Auto, jpg)
            .unwrap();
        let png_target: TargetFormat = "png".parse().unwrap();
        let back = surface
            .render(&jpeg.bytes, FormatToken::Png, png_target)
            .unwrap();
        assert_eq!(back.mime, "image/png");
        assert_eq!(surface.dimensions(), (3, 1));
    }

    #[test]
    fn hint_does_not_rescue_garbage() {
        let err = RenderSurface::load(b"still not an image", FormatToken::Gif).unwrap_err();
        assert!(matches!(err, SurfaceError::Decode(_)));
    }
}
