//! The `image`-crate-backed responsive-image codec, per §4.16/§6's
//! `process`/`isSupported` interface. Honors jpeg/png/webp requests only —
//! AVIF encoding has no stable pure-Rust encoder in the `image` crate's
//! feature set, so AVIF requests are skipped per the trait's "skip requests
//! this codec cannot honor" contract rather than failing the batch.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat as CrateFormat};
use janos_core::image_codec::{CodecError, EncodedVariant, ImageCodec, ImageFormat, VariantRequest};
use std::io::Cursor;

/// Resizes and re-encodes source images via the `image` crate.
#[derive(Debug, Default)]
pub struct ImageCrateCodec;

fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
            img.write_with_encoder(encoder)
                .map_err(|e| CodecError(e.to_string()))?;
        }
        ImageFormat::Png => {
            img.write_to(&mut buffer, CrateFormat::Png)
                .map_err(|e| CodecError(e.to_string()))?;
        }
        ImageFormat::WebP => {
            img.write_to(&mut buffer, CrateFormat::WebP)
                .map_err(|e| CodecError(e.to_string()))?;
        }
        ImageFormat::Avif => return Err(CodecError("avif encoding not supported".to_string())),
    }
    Ok(buffer.into_inner())
}

impl ImageCodec for ImageCrateCodec {
    fn is_supported(&self, bytes: &[u8]) -> bool {
        image::guess_format(bytes).is_ok()
    }

    fn process(
        &self,
        bytes: &[u8],
        requests: &[VariantRequest],
    ) -> Result<Vec<EncodedVariant>, CodecError> {
        let source = image::load_from_memory(bytes).map_err(|e| CodecError(e.to_string()))?;

        let mut variants = Vec::with_capacity(requests.len());
        for request in requests {
            if request.format == ImageFormat::Avif {
                continue;
            }
            let ratio = request.width as f64 / source.width().max(1) as f64;
            let height = (source.height() as f64 * ratio).round().max(1.0) as u32;
            let resized = source.resize(request.width, height, FilterType::Lanczos3);

            match encode(&resized, request.format, request.quality) {
                Ok(data) => variants.push(EncodedVariant {
                    format: request.format,
                    data,
                    width: resized.width(),
                    height: resized.height(),
                }),
                    Err(_) => continue,
            }
        }
        Ok(variants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use janos_core::image_codec::ImageCodec as _;

    fn synthetic_png() -> Vec<u8> {
        let img = DynamicImage::new_rgb8(64, 32);
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, CrateFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn is_supported_recognizes_png_and_rejects_garbage() {
        let codec = ImageCrateCodec;
        assert!(codec.is_supported(&synthetic_png()));
        assert!(!codec.is_supported(b"not an image"));
    }

    #[test]
    fn process_resizes_and_preserves_aspect_ratio() {
        let codec = ImageCrateCodec;
        let requests = vec![VariantRequest {
            format: ImageFormat::WebP,
            width: 32,
            quality: 80,
        }];
        let variants = codec.process(&synthetic_png(), &requests).unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].width, 32);
        assert_eq!(variants[0].height, 16);
        assert_eq!(variants[0].format, ImageFormat::WebP);
    }

    #[test]
    fn process_skips_avif_requests() {
        let codec = ImageCrateCodec;
        let requests = vec![VariantRequest {
            format: ImageFormat::Avif,
            width: 32,
            quality: 80,
        }];
        let variants = codec.process(&synthetic_png(), &requests).unwrap();
        assert!(variants.is_empty());
    }
}
