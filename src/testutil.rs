//! In-memory image fixtures for unit tests.

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageFormat, RgbImage};
use img_parts::Bytes;
use img_parts::jpeg::JpegSegment;
use img_parts::png::{Png, PngChunk};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::exif::container::Container;
use crate::pipeline::ImageKind;

fn format_of(kind: ImageKind) -> ImageFormat {
    match kind {
        ImageKind::Jpeg => ImageFormat::Jpeg,
        ImageKind::Png => ImageFormat::Png,
        ImageKind::WebP => ImageFormat::WebP,
    }
}

/// A small gradient image encoded as `kind`, without any metadata.
pub fn encode(kind: ImageKind) -> Vec<u8> {
    let img = RgbImage::from_fn(16, 16, |x, y| image::Rgb([(x * 16) as u8, (y * 16) as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buf, format_of(kind)).unwrap();
    buf.into_inner()
}

/// Decoded RGB pixels of an encoded image.
pub fn pixels(bytes: &[u8]) -> Vec<u8> {
    image::load_from_memory(bytes).unwrap().to_rgb8().into_raw()
}

fn ascii(tag: Tag, s: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![s.as_bytes().to_vec()]),
    }
}

fn dms(tag: Tag, d: u32, m: u32, s_hundredths: u32) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(vec![
            Rational { num: d, denom: 1 },
            Rational { num: m, denom: 1 },
            Rational { num: s_hundredths, denom: 100 },
        ]),
    }
}

fn sample_fields() -> Vec<Field> {
    vec![
        ascii(Tag::Make, "Canon"),
        ascii(Tag::Model, "Canon EOS 5D"),
        ascii(Tag::Software, "Firmware 1.1"),
        ascii(Tag::DateTimeOriginal, "2023:06:01 12:30:00"),
        ascii(Tag::GPSLatitudeRef, "N"),
        dms(Tag::GPSLatitude, 48, 51, 3024),
        ascii(Tag::GPSLongitudeRef, "W"),
        dms(Tag::GPSLongitude, 2, 17, 4020),
    ]
}

fn serialize(fields: &[Field], thumbnail: Option<&[u8]>) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    if let Some(jpeg) = thumbnail {
        writer.set_jpeg(jpeg, In::THUMBNAIL);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false).unwrap();
    buf.into_inner()
}

/// A TIFF-structured payload with camera, time and GPS tags.
pub fn sample_exif_payload() -> Vec<u8> {
    serialize(&sample_fields(), None)
}

/// The sample payload plus an IFD1 carrying `thumbnail`.
pub fn exif_payload_with_thumbnail(thumbnail: &[u8]) -> Vec<u8> {
    let mut fields = sample_fields();
    fields.push(Field {
        tag: Tag::Compression,
        ifd_num: In::THUMBNAIL,
        value: Value::Short(vec![6]),
    });
    serialize(&fields, Some(thumbnail))
}

/// Only `Make` and `GPSLatitudeRef` in IFD0, plus an IFD1 carrying `thumbnail`.
pub fn make_and_thumbnail_payload(thumbnail: &[u8]) -> Vec<u8> {
    let fields = [
        ascii(Tag::Make, "Canon"),
        ascii(Tag::GPSLatitudeRef, "N"),
        Field {
            tag: Tag::Compression,
            ifd_num: In::THUMBNAIL,
            value: Value::Short(vec![6]),
        },
    ];
    serialize(&fields, Some(thumbnail))
}

/// A fresh image of `kind` with `payload` as its EXIF block.
pub fn with_exif(kind: ImageKind, payload: &[u8]) -> Vec<u8> {
    let mut container = Container::parse(Bytes::from(encode(kind)), kind).unwrap();
    container.set_exif(Some(Bytes::copy_from_slice(payload)));
    container.into_bytes().to_vec()
}

/// A JPEG with EXIF, an XMP packet and a Photoshop/IPTC block.
pub fn jpeg_with_xmp_and_iptc() -> Vec<u8> {
    let bytes = with_exif(ImageKind::Jpeg, &sample_exif_payload());
    let mut jpeg = img_parts::jpeg::Jpeg::from_bytes(Bytes::from(bytes)).unwrap();

    let mut xmp = b"http://ns.adobe.com/xap/1.0/\0".to_vec();
    xmp.extend_from_slice(b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"/>");
    let mut iptc = b"Photoshop 3.0\0".to_vec();
    iptc.extend_from_slice(b"8BIM\x04\x04\0\0\0\0\0\0");

    let segments = jpeg.segments_mut();
    segments.insert(1, JpegSegment::new_with_contents(0xE1, Bytes::from(xmp)));
    segments.insert(2, JpegSegment::new_with_contents(0xED, Bytes::from(iptc)));
    jpeg.encoder().bytes().to_vec()
}

/// A PNG whose EXIF sits only in an ImageMagick "Raw profile" text chunk.
pub fn png_with_legacy_exif() -> Vec<u8> {
    let mut png = Png::from_bytes(Bytes::from(encode(ImageKind::Png))).unwrap();
    let hex: String = sample_exif_payload().iter().map(|b| format!("{b:02x}")).collect();
    let text = format!("Raw profile type exif\0\nexif\n{:8}\n{hex}\n", hex.len() / 2);
    let chunks = png.chunks_mut();
    let iend = chunks.len() - 1;
    chunks.insert(iend, PngChunk::new(*b"tEXt", Bytes::from(text)));
    png.encoder().bytes().to_vec()
}

/// Write a fixture into `dir` and return its path.
pub fn write_image(dir: &Path, name: &str, kind: ImageKind, exif: bool) -> PathBuf {
    let bytes = if exif {
        with_exif(kind, &sample_exif_payload())
    } else {
        encode(kind)
    };
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
