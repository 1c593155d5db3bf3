use anyhow::Result;
use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::png::Png;
use img_parts::webp::WebP;
use img_parts::{Bytes, ImageEXIF};

use crate::pipeline::ImageKind;

// Some writers keep the JPEG APP1 preamble in PNG/WebP payloads
const EXIF_PREFIX: &[u8] = b"Exif\0\0";

const JPEG_APP1: u8 = 0xE1;
const JPEG_APP13: u8 = 0xED;
const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const XMP_EXTENSION_HEADER: &[u8] = b"http://ns.adobe.com/xmp/extension/\0";
const IPTC_HEADER: &[u8] = b"Photoshop 3.0\0";

const PNG_TEXT_CHUNKS: [[u8; 4]; 3] = [*b"tEXt", *b"zTXt", *b"iTXt"];
const PNG_XMP_KEYWORD: &[u8] = b"XML:com.adobe.xmp\0";
// ImageMagick/exiftool store EXIF as hex in a text chunk on older PNGs
const PNG_LEGACY_EXIF_KEYWORDS: [&[u8]; 2] = [b"Raw profile type exif\0", b"Raw profile type APP1\0"];

const WEBP_XMP: [u8; 4] = *b"XMP ";

/// A parsed image container whose metadata blocks can be edited without
/// touching the compressed pixel data.
pub(crate) enum Container {
    Jpeg(Jpeg),
    Png(Png),
    WebP(WebP),
}

impl Container {
    pub fn parse(bytes: Bytes, kind: ImageKind) -> Result<Self> {
        let container = match kind {
            ImageKind::Jpeg => Self::Jpeg(
                Jpeg::from_bytes(bytes).map_err(|e| anyhow::anyhow!("Failed to parse JPEG: {e}"))?,
            ),
            ImageKind::Png => Self::Png(
                Png::from_bytes(bytes).map_err(|e| anyhow::anyhow!("Failed to parse PNG: {e}"))?,
            ),
            ImageKind::WebP => Self::WebP(
                WebP::from_bytes(bytes).map_err(|e| anyhow::anyhow!("Failed to parse WebP: {e}"))?,
            ),
        };
        Ok(container)
    }

    /// The raw TIFF-structured EXIF payload, if the image carries one.
    pub fn exif(&self) -> Option<Bytes> {
        let payload = match self {
            Self::Jpeg(jpeg) => jpeg.exif(),
            Self::Png(png) => png.exif(),
            Self::WebP(webp) => webp.exif(),
        }?;
        let payload = if payload.starts_with(EXIF_PREFIX) {
            payload.slice(EXIF_PREFIX.len()..)
        } else {
            payload
        };
        if payload.is_empty() { None } else { Some(payload) }
    }

    /// Replace (or with `None`, drop) the EXIF payload.
    pub fn set_exif(&mut self, payload: Option<Bytes>) {
        match self {
            Self::Jpeg(jpeg) => jpeg.set_exif(payload),
            Self::Png(png) => png.set_exif(payload),
            Self::WebP(webp) => webp.set_exif(payload),
        }
    }

    /// Whether a PNG carries EXIF in a legacy "Raw profile" text chunk.
    pub fn has_legacy_exif(&self) -> bool {
        match self {
            Self::Png(png) => png.chunks().iter().any(|c| {
                PNG_TEXT_CHUNKS.contains(&c.kind())
                    && PNG_LEGACY_EXIF_KEYWORDS.iter().any(|k| c.contents().starts_with(k))
            }),
            _ => false,
        }
    }

    pub fn remove_legacy_exif(&mut self) -> bool {
        match self {
            Self::Png(png) => {
                let chunks = png.chunks_mut();
                let before = chunks.len();
                chunks.retain(|c| {
                    !(PNG_TEXT_CHUNKS.contains(&c.kind())
                        && PNG_LEGACY_EXIF_KEYWORDS.iter().any(|k| c.contents().starts_with(k)))
                });
                chunks.len() != before
            }
            _ => false,
        }
    }

    /// Drop every XMP packet. Returns `true` if anything was removed.
    pub fn remove_xmp(&mut self) -> bool {
        match self {
            Self::Jpeg(jpeg) => {
                let segments = jpeg.segments_mut();
                let before = segments.len();
                segments.retain(|s| !is_xmp_segment(s));
                segments.len() != before
            }
            Self::Png(png) => {
                let chunks = png.chunks_mut();
                let before = chunks.len();
                chunks.retain(|c| !(c.kind() == *b"iTXt" && c.contents().starts_with(PNG_XMP_KEYWORD)));
                chunks.len() != before
            }
            Self::WebP(webp) => {
                if webp.chunk_by_id(WEBP_XMP).is_some() {
                    webp.remove_chunks_by_id(WEBP_XMP);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Drop Photoshop/IPTC APP13 segments (JPEG only).
    pub fn remove_iptc(&mut self) -> bool {
        match self {
            Self::Jpeg(jpeg) => {
                let segments = jpeg.segments_mut();
                let before = segments.len();
                segments.retain(|s| !(s.marker() == JPEG_APP13 && s.contents().starts_with(IPTC_HEADER)));
                segments.len() != before
            }
            _ => false,
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Jpeg(jpeg) => jpeg.encoder().bytes(),
            Self::Png(png) => png.encoder().bytes(),
            Self::WebP(webp) => webp.encoder().bytes(),
        }
    }
}

fn is_xmp_segment(segment: &JpegSegment) -> bool {
    segment.marker() == JPEG_APP1
        && (segment.contents().starts_with(XMP_HEADER)
            || segment.contents().starts_with(XMP_EXTENSION_HEADER))
}
