use anyhow::{Context, Result};
use exif::experimental::Writer;
use exif::{Exif, In, Tag, Value};
use img_parts::Bytes;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::Path;

use super::container::Container;
use super::reader::parse_payload;
use super::tags;
use crate::pipeline::ImageKind;

/// What to remove from an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripMode {
    /// Drop the whole EXIF payload.
    All,
    /// Drop only the named tags and keep the rest of the payload.
    Selected(BTreeSet<String>),
}

impl StripMode {
    pub fn selected<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Selected(names.into_iter().map(Into::into).collect())
    }
}

/// Knobs that apply on top of a [`StripMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripOptions {
    /// Also drop XMP packets (only in [`StripMode::All`]).
    pub strip_xmp: bool,
    /// Also drop Photoshop/IPTC blocks (only in [`StripMode::All`]).
    pub strip_iptc: bool,
    /// Carry the embedded JPEG thumbnail over when rewriting a payload.
    pub keep_thumbnail: bool,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            strip_xmp: true,
            strip_iptc: true,
            keep_thumbnail: true,
        }
    }
}

/// What a strip actually did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StripOutcome {
    pub removed_tags: Vec<String>,
    pub xmp_removed: bool,
    pub iptc_removed: bool,
    /// Whether the output differs from the input at all.
    pub changed: bool,
}

/// Strip metadata from an in-memory image.
///
/// Only metadata blocks are touched; the compressed image data is copied
/// through as-is. When nothing had to be removed the input is returned
/// unchanged.
pub fn strip_bytes(
    bytes: &[u8],
    kind: ImageKind,
    mode: &StripMode,
    options: &StripOptions,
) -> Result<(Vec<u8>, StripOutcome)> {
    let mut container = Container::parse(Bytes::copy_from_slice(bytes), kind)?;
    let mut outcome = StripOutcome::default();

    match mode {
        StripMode::All => {
            if let Some(payload) = container.exif() {
                match parse_payload(&payload) {
                    Ok(exif) => outcome.removed_tags = field_names(&exif),
                    Err(e) => log::debug!("Removing unreadable EXIF payload: {e:#}"),
                }
                container.set_exif(None);
                outcome.changed = true;
            }
            if container.remove_legacy_exif() {
                outcome.changed = true;
            }
            if options.strip_xmp && container.remove_xmp() {
                outcome.xmp_removed = true;
                outcome.changed = true;
            }
            if options.strip_iptc && container.remove_iptc() {
                outcome.iptc_removed = true;
                outcome.changed = true;
            }
        }
        StripMode::Selected(names) => {
            if container.has_legacy_exif() {
                anyhow::bail!("EXIF stored in legacy PNG text chunk: only full removal is supported");
            }
            let Some(payload) = container.exif() else {
                return Ok((bytes.to_vec(), outcome));
            };
            let exif = parse_payload(&payload)?;
            let (rewritten, removed) = filter_payload(&exif, names, options.keep_thumbnail)?;
            if removed.is_empty() {
                return Ok((bytes.to_vec(), outcome));
            }
            outcome.removed_tags = removed;
            outcome.changed = true;
            container.set_exif(rewritten.map(Bytes::from));
        }
    }

    if !outcome.changed {
        return Ok((bytes.to_vec(), outcome));
    }
    Ok((container.into_bytes().to_vec(), outcome))
}

/// Strip metadata from `input` and write the result to `output`.
///
/// `output` may equal `input` for in-place cleaning. An unchanged in-place
/// file is not rewritten.
pub fn strip_file(
    input: &Path,
    output: &Path,
    kind: ImageKind,
    mode: &StripMode,
    options: &StripOptions,
) -> Result<StripOutcome> {
    let bytes = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let (cleaned, outcome) =
        strip_bytes(&bytes, kind, mode, options).with_context(|| format!("Failed to strip {}", input.display()))?;

    if outcome.changed || output != input {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        std::fs::write(output, &cleaned).with_context(|| format!("Failed to write {}", output.display()))?;
    }

    Ok(outcome)
}

/// Distinct tag names of the payload, structural tags excluded.
fn field_names(exif: &Exif) -> Vec<String> {
    let mut names = Vec::new();
    for field in exif.fields().filter(|f| !tags::is_structural(f.tag)) {
        let name = tags::tag_name(field.tag);
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Rebuild the payload without the named tags.
///
/// Returns the new payload (`None` when nothing is left) and the names that
/// were dropped. An empty list of dropped names means the payload should be
/// left alone.
fn filter_payload(
    exif: &Exif,
    names: &BTreeSet<String>,
    keep_thumbnail: bool,
) -> Result<(Option<Vec<u8>>, Vec<String>)> {
    let mut targets: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    for name in names {
        if let Some(companion) = tags::companion_of(name) {
            targets.insert(companion);
        }
    }

    let mut kept = Vec::new();
    let mut removed: Vec<String> = Vec::new();
    for field in exif.fields() {
        if tags::is_structural(field.tag) {
            continue;
        }
        let name = tags::tag_name(field.tag);
        if targets.contains(name.as_str()) {
            if !removed.contains(&name) {
                removed.push(name);
            }
            continue;
        }
        // The writer only knows IFD0/IFD1 and typed values.
        if field.ifd_num != In::PRIMARY && field.ifd_num != In::THUMBNAIL {
            log::debug!("Dropping {name} from IFD{}", field.ifd_num.index());
            continue;
        }
        if matches!(field.value, Value::Unknown(..)) {
            log::debug!("Dropping {name}: value type not writable");
            continue;
        }
        if field.ifd_num == In::THUMBNAIL && !keep_thumbnail {
            continue;
        }
        kept.push(field);
    }

    if removed.is_empty() {
        return Ok((None, removed));
    }

    // The writer rejects an empty IFD0, so a lone thumbnail goes with it
    if !kept.iter().any(|f| f.ifd_num == In::PRIMARY) {
        return Ok((None, removed));
    }
    let thumbnail = if keep_thumbnail { thumbnail_bytes(exif) } else { None };

    let mut writer = Writer::new();
    for field in kept {
        writer.push_field(field);
    }
    if let Some(jpeg) = thumbnail {
        writer.set_jpeg(jpeg, In::THUMBNAIL);
    }
    let mut buf = Cursor::new(Vec::new());
    writer
        .write(&mut buf, exif.little_endian())
        .context("Failed to serialize EXIF payload")?;

    Ok((Some(buf.into_inner()), removed))
}

/// The JPEG thumbnail referenced from IFD1, if it lies within the payload.
fn thumbnail_bytes(exif: &Exif) -> Option<&[u8]> {
    let offset = exif.get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?.value.get_uint(0)? as usize;
    let len = exif.get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?.value.get_uint(0)? as usize;
    exif.buf().get(offset..offset.checked_add(len)?)
}
