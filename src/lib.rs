//! # exif-cleaner
//!
//! Batch-remove EXIF metadata from JPEG, PNG and WebP images, either all of
//! it or only selected tags (GPS position, camera serial numbers, author...).
//! Metadata blocks are cut out of the container, so pixels are never
//! re-encoded.
//!
//! ## Quick Start
//!
//! The pipeline module handles the full collect → strip → report flow:
//!
//! ```rust,no_run
//! use exif_cleaner::config::Config;
//! use exif_cleaner::exif::StripMode;
//! use exif_cleaner::pipeline::{collect_images, process_batch, summarize};
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!
//!     // Collect supported image files from paths (files or directories)
//!     let images = collect_images(&[PathBuf::from("./photos")], config.input.recursive);
//!
//!     let results = process_batch(&images, &StripMode::All, &config, |pct| {
//!         println!("{pct:.0}%");
//!     });
//!     let summary = summarize(&results);
//!     println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! ```rust,no_run
//! use exif_cleaner::exif::{read_exif, strip_file, StripMode, StripOptions};
//! use exif_cleaner::pipeline::ImageKind;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let path = Path::new("photo.jpg");
//!
//!     let info = read_exif(path)?;
//!     if let Some((lat, lon)) = info.gps_coordinates() {
//!         println!("Photo reveals its location: {lat:.5}, {lon:.5}");
//!     }
//!
//!     let mode = StripMode::selected(["GPSLatitude", "GPSLongitude", "GPSAltitude"]);
//!     let outcome = strip_file(path, path, ImageKind::Jpeg, &mode, &StripOptions::default())?;
//!     println!("Removed: {}", outcome.removed_tags.join(", "));
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Formats
//!
//! | Format | EXIF | XMP | IPTC |
//! |--------|------|-----|------|
//! | JPEG (`.jpg`, `.jpeg`) | APP1 | APP1 (+ extended) | APP13 |
//! | PNG (`.png`) | `eXIf`, legacy raw-profile text | `iTXt` | - |
//! | WebP (`.webp`) | `EXIF` chunk | `XMP ` chunk | - |
//!
//! ## Modules
//!
//! - [`config`]: Configuration types and loading/saving
//! - [`exif`]: EXIF reading and stripping
//! - [`pipeline`]: Image collection, format detection and batch processing
//! - [`update`]: Release checks against GitHub
//! - [`version`]: Version descriptor and version comparison

pub mod config;
pub mod exif;
pub mod pipeline;
pub mod update;
pub mod version;

#[cfg(test)]
mod testutil;
