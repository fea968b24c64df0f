// src/transform/image.rs

//! Image recompression: `oxipng` for PNG and the `image` codecs for JPEG and
//! GIF. ICO files are decoded to validate them and copied as-is.

use std::io::Cursor;

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat};
use oxipng::StripChunks;
use tracing::debug;

use crate::errors::{AssetflowError, Result};
use crate::pipeline::{AssetFile, BuildContext, Stage};

/// Quality used when re-encoding JPEG.
pub const JPEG_QUALITY: u8 = 75;

/// Optimise GIF, ICO, JPEG and PNG files.
///
/// The format is detected from the file contents. If the result is not
/// smaller than the input, the original bytes are kept.
#[derive(Debug, Clone, Default)]
pub struct OptimizeImage;

impl Stage for OptimizeImage {
    fn name(&self) -> &'static str {
        "image-optimize"
    }

    fn apply(&self, mut file: AssetFile, _ctx: &BuildContext) -> Result<Vec<AssetFile>> {
        let optimized = optimize_image(&file.contents)
            .map_err(|message| AssetflowError::parse(&file.path, message))?;

        if optimized.len() < file.contents.len() {
            debug!(
                file = %file.rel_str(),
                before = file.contents.len(),
                after = optimized.len(),
                "image optimised"
            );
            file.contents = optimized;
        }
        Ok(vec![file])
    }
}

/// Recompress an image, returning a message for unrecognised or corrupt
/// input. The result may be larger than the input; callers compare.
pub fn optimize_image(bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let format = image::guess_format(bytes).map_err(|_| "unrecognized image format".to_string())?;
    match format {
        ImageFormat::Png => optimize_png(bytes),
        ImageFormat::Jpeg => recompress_jpeg(bytes),
        ImageFormat::Gif => recompress_gif(bytes),
        ImageFormat::Ico => {
            image::load_from_memory_with_format(bytes, ImageFormat::Ico)
                .map_err(|e| format!("invalid ICO: {e}"))?;
            Ok(bytes.to_vec())
        }
        other => Err(format!("unsupported image format {other:?}")),
    }
}

fn optimize_png(bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let options = oxipng::Options {
        strip: StripChunks::Safe,
        ..oxipng::Options::from_preset(2)
    };
    oxipng::optimize_from_memory(bytes, &options).map_err(|e| format!("invalid PNG: {e}"))
}

fn recompress_jpeg(bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(|e| format!("invalid JPEG: {e}"))?;
    let img = match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    let mut out = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
        .map_err(|e| format!("encoding JPEG: {e}"))?;
    Ok(out)
}

fn recompress_gif(bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(|e| format!("invalid GIF: {e}"))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| format!("invalid GIF: {e}"))?;

    let animated = frames.len() > 1;

    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        if animated {
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| format!("encoding GIF: {e}"))?;
        }
        encoder
            .encode_frames(frames)
            .map_err(|e| format!("encoding GIF: {e}"))?;
    }
    Ok(out)
}
