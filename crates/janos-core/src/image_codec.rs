//! The responsive-images codec abstraction, per §4.16 and §6: given source
//! bytes and requested variants, produce encoded bytes and dimensions.
//! Implemented synchronously: the bounded fan-out across images is handled
//! by the responsive-images stage via `rayon`'s work-stealing pool, which
//! composes more simply with the pipeline's single-threaded-between-stages
//! model than an async trait would.

use std::fmt;

/// A requested output format for a responsive-image variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// AVIF, listed most-modern-first when sorting `<source>` elements.
    Avif,
    /// WebP.
    WebP,
    /// Baseline JPEG.
    Jpeg,
    /// PNG, used when the source already carries transparency.
    Png,
}

impl ImageFormat {
    /// MIME type for a `<source type="...">` attribute.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Avif => "image/avif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    /// File extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Avif => "avif",
            ImageFormat::WebP => "webp",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }

    /// Sort key for most-modern-first `<source>` ordering.
    pub fn modernity_rank(self) -> u8 {
        match self {
            ImageFormat::Avif => 0,
            ImageFormat::WebP => 1,
            ImageFormat::Jpeg => 2,
            ImageFormat::Png => 3,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One requested `(format, width, quality)` combination.
#[derive(Debug, Clone, Copy)]
pub struct VariantRequest {
    /// Target encoding.
    pub format: ImageFormat,
    /// Target width in pixels; height is derived preserving aspect ratio.
    pub width: u32,
    /// Encoder quality, 1-100.
    pub quality: u8,
}

/// One produced variant.
#[derive(Debug, Clone)]
pub struct EncodedVariant {
    /// The format actually produced (matches the request's format; codecs
    /// that cannot honor a format should omit that request's output rather
    /// than silently substitute another format).
    pub format: ImageFormat,
    /// Encoded bytes.
    pub data: Vec<u8>,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

/// A codec error, carried as a plain string since codec implementations are
/// host-supplied and their own error types vary.
#[derive(Debug, Clone)]
pub struct CodecError(pub String);

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image codec error: {}", self.0)
    }
}

impl std::error::Error for CodecError {}

/// The external image-codec collaborator, per §4.16/§6.
pub trait ImageCodec {
    /// Sniff `bytes`' magic number to decide whether this codec can decode
    /// the source image at all.
    fn is_supported(&self, bytes: &[u8]) -> bool;

    /// Produce one encoded variant per `request`, skipping requests this
    /// codec cannot honor rather than failing the whole batch.
    fn process(
        &self,
        bytes: &[u8],
        requests: &[VariantRequest],
    ) -> Result<Vec<EncodedVariant>, CodecError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modernity_rank_orders_avif_first() {
        let mut formats = vec![ImageFormat::Jpeg, ImageFormat::Avif, ImageFormat::WebP];
        formats.sort_by_key(|f| f.modernity_rank());
        assert_eq!(formats, vec![ImageFormat::Avif, ImageFormat::WebP, ImageFormat::Jpeg]);
    }
}
