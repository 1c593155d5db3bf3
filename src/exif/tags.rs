use exif::{Context, In, Tag};
use serde::{Deserialize, Serialize};

/// Which directory of the EXIF payload a tag was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IfdGroup {
    /// IFD0, the main image directory (Make, Model, Software, ...)
    Primary,
    /// Exif sub-IFD (DateTimeOriginal, LensModel, ...)
    Exif,
    /// GPS sub-IFD
    Gps,
    /// Interoperability sub-IFD
    Interop,
    /// IFD1, the directory describing the embedded thumbnail
    Thumbnail,
}

impl IfdGroup {
    pub(crate) fn of(tag: Tag, ifd_num: In) -> Self {
        if ifd_num == In::THUMBNAIL {
            return Self::Thumbnail;
        }
        match tag.context() {
            Context::Exif => Self::Exif,
            Context::Gps => Self::Gps,
            Context::Interop => Self::Interop,
            _ => Self::Primary,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Primary => "IFD0",
            Self::Exif => "Exif",
            Self::Gps => "GPS",
            Self::Interop => "Interop",
            Self::Thumbnail => "IFD1",
        }
    }
}

/// Tags that describe the layout of the payload rather than the photo.
/// The EXIF writer regenerates them, so they are never listed or copied.
const STRUCTURAL_TAGS: &[Tag] = &[
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
    Tag::StripOffsets,
    Tag::StripByteCounts,
    Tag(Context::Tiff, 0x0144), // TileOffsets
    Tag(Context::Tiff, 0x0145), // TileByteCounts
];

// Tags outside the Exif standard that the codec has no names for but that
// cameras and Windows Explorer write routinely.
const EXTRA_NAMES: &[(Tag, &str)] = &[
    (Tag(Context::Tiff, 0x013C), "HostComputer"),
    (Tag(Context::Tiff, 0x9C9B), "XPTitle"),
    (Tag(Context::Tiff, 0x9C9C), "XPComment"),
    (Tag(Context::Tiff, 0x9C9D), "XPAuthor"),
    (Tag(Context::Tiff, 0x9C9E), "XPKeywords"),
    (Tag(Context::Tiff, 0x9C9F), "XPSubject"),
];

pub(crate) fn is_structural(tag: Tag) -> bool {
    STRUCTURAL_TAGS.contains(&tag)
}

/// Human-facing tag name as used in tag selections.
///
/// Known tags use the codec's name table (`GPSLatitude`, `Make`, ...);
/// private or unknown tags fall back to their hex number.
pub fn tag_name(tag: Tag) -> String {
    if let Some((_, name)) = EXTRA_NAMES.iter().find(|(t, _)| *t == tag) {
        return (*name).to_string();
    }
    if tag.description().is_some() {
        tag.to_string()
    } else {
        format!("0x{:04X}", tag.number())
    }
}

/// Grouping used to lay out the removable tag checkboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCategory {
    Gps,
    Device,
    Capture,
    Personal,
}

impl TagCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gps => "Location",
            Self::Device => "Camera & device",
            Self::Capture => "Capture time",
            Self::Personal => "Author & software",
        }
    }
}

/// A privacy-relevant tag offered for selective removal.
#[derive(Debug, Clone, Copy)]
pub struct RemovableTag {
    /// Tag name as reported by [`tag_name`].
    pub name: &'static str,
    /// Short display label.
    pub label: &'static str,
    pub category: TagCategory,
}

const fn tag(name: &'static str, label: &'static str, category: TagCategory) -> RemovableTag {
    RemovableTag { name, label, category }
}

static REMOVABLE_TAGS: &[RemovableTag] = &[
    tag("GPSLatitude", "GPS latitude", TagCategory::Gps),
    tag("GPSLongitude", "GPS longitude", TagCategory::Gps),
    tag("GPSAltitude", "GPS altitude", TagCategory::Gps),
    tag("GPSDateStamp", "GPS date", TagCategory::Gps),
    tag("GPSTimeStamp", "GPS time", TagCategory::Gps),
    tag("Make", "Camera make", TagCategory::Device),
    tag("Model", "Camera model", TagCategory::Device),
    tag("CameraOwnerName", "Camera owner", TagCategory::Device),
    tag("BodySerialNumber", "Body serial number", TagCategory::Device),
    tag("LensMake", "Lens make", TagCategory::Device),
    tag("LensModel", "Lens model", TagCategory::Device),
    tag("LensSerialNumber", "Lens serial number", TagCategory::Device),
    tag("DateTimeOriginal", "Date taken", TagCategory::Capture),
    tag("DateTimeDigitized", "Date digitized", TagCategory::Capture),
    tag("Artist", "Artist", TagCategory::Personal),
    tag("Copyright", "Copyright", TagCategory::Personal),
    tag("XPAuthor", "Author (Windows)", TagCategory::Personal),
    tag("ImageDescription", "Image description", TagCategory::Personal),
    tag("UserComment", "User comment", TagCategory::Personal),
    tag("HostComputer", "Host computer", TagCategory::Personal),
    tag("Software", "Software", TagCategory::Personal),
];

/// The curated list of tags offered for selective removal.
pub fn removable_tags() -> &'static [RemovableTag] {
    REMOVABLE_TAGS
}

/// Look up a catalog entry by tag name.
pub fn find_removable(name: &str) -> Option<&'static RemovableTag> {
    REMOVABLE_TAGS.iter().find(|t| t.name == name)
}

// A coordinate without its hemisphere reference is meaningless, so
// removing one removes the other.
const COMPANIONS: &[(&str, &str)] = &[
    ("GPSLatitude", "GPSLatitudeRef"),
    ("GPSLongitude", "GPSLongitudeRef"),
    ("GPSAltitude", "GPSAltitudeRef"),
];

/// Companion tag that must go together with `name`, if any.
pub(crate) fn companion_of(name: &str) -> Option<&'static str> {
    COMPANIONS
        .iter()
        .find(|(tag, _)| *tag == name)
        .map(|(_, companion)| *companion)
}
