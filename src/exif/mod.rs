//! EXIF detection, listing and removal.
//!
//! - [`has_exif`] / [`read_exif`] inspect an image's EXIF payload
//! - [`strip_bytes`] / [`strip_file`] remove all of it, or only the tags
//!   named in a [`StripMode::Selected`] set
//!
//! Metadata is edited at the container level (JPEG segments, PNG chunks,
//! RIFF chunks), so the compressed image data passes through untouched.
//! Tag parsing and serialization are left to the `exif` codec; tag names
//! are the codec's names so a selection made from [`read_exif`] output
//! can be fed straight back into [`StripMode::Selected`].

pub(crate) mod container;
mod reader;
mod tags;
mod writer;

pub use reader::{ExifEntry, ExifInfo, has_exif, read_exif};
pub use tags::{IfdGroup, RemovableTag, TagCategory, find_removable, removable_tags, tag_name};
pub use writer::{StripMode, StripOptions, StripOutcome, strip_bytes, strip_file};
