use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{Config, OutputConfig};
use crate::exif::{self, StripMode, StripOutcome};

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// The container format of an image file, determined by its extension.
///
/// Use [`ImageKind::from_path`] to detect the format from a file extension.
///
/// # Example
///
/// ```rust
/// use exif_cleaner::pipeline::ImageKind;
/// use std::path::Path;
///
/// let kind = ImageKind::from_path(Path::new("photo.JPEG"));
/// assert_eq!(kind, Some(ImageKind::Jpeg));
///
/// let kind = ImageKind::from_path(Path::new("scan.tiff"));
/// assert_eq!(kind, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ImageKind {
    /// JPEG: EXIF in APP1, XMP in APP1, IPTC in APP13
    Jpeg,
    /// PNG: EXIF in `eXIf` (or legacy text chunks), XMP in `iTXt`
    Png,
    /// WebP: `EXIF` and `XMP ` RIFF chunks
    WebP,
}

impl ImageKind {
    /// Determine the image kind from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::WebP => "WebP",
        }
    }
}

/// Basic facts about an image file, for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    /// Size in KiB, rounded to two decimals.
    pub size_kb: f64,
    /// Lower-case extension with its leading dot, e.g. `.jpg`.
    pub extension: String,
    /// Pixel dimensions, when the image header is readable.
    pub dimensions: Option<(u32, u32)>,
}

/// The result of cleaning a single image.
///
/// # Example
///
/// ```rust,no_run
/// # use exif_cleaner::pipeline::process_image;
/// # use exif_cleaner::exif::StripMode;
/// # use exif_cleaner::config::Config;
/// let result = process_image("photo.jpg".as_ref(), &StripMode::All, &Config::default());
///
/// if result.is_success() {
///     println!("Removed: {}", result.removed_tags.join(", "));
/// } else {
///     eprintln!("Failed: {}", result.error.unwrap_or_default());
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub path: PathBuf,
    /// Where the cleaned image was written; `None` on dry runs and failures.
    pub output_path: Option<PathBuf>,
    pub image_kind: Option<ImageKind>,
    pub removed_tags: Vec<String>,
    pub xmp_removed: bool,
    pub iptc_removed: bool,
    /// Whether the image had anything to remove.
    pub changed: bool,
    pub error: Option<String>,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            output_path: None,
            image_kind: ImageKind::from_path(path),
            removed_tags: Vec::new(),
            xmp_removed: false,
            iptc_removed: false,
            changed: false,
            error: None,
        }
    }

    fn apply(&mut self, outcome: StripOutcome) {
        self.removed_tags = outcome.removed_tags;
        self.xmp_removed = outcome.xmp_removed;
        self.iptc_removed = outcome.iptc_removed;
        self.changed = outcome.changed;
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Success/failure counts of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// (following symlinks), descending into sub-folders only when `recursive`
/// is set. Only files with supported image extensions are included, and
/// each file appears once, at its first position.
///
/// # Example
///
/// ```rust,no_run
/// use exif_cleaner::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ], true);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut images = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |p: PathBuf| {
        if seen.insert(p.clone()) {
            images.push(p);
        }
    };

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            let mut walker = WalkDir::new(path).follow_links(true).sort_by_file_name();
            if !recursive {
                walker = walker.max_depth(1);
            }
            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check that `path` is an existing file in a supported format.
pub fn validate_file(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("{} does not exist", path.display());
    }
    if !path.is_file() {
        anyhow::bail!("{} is not a file", path.display());
    }
    if !is_supported_image(path) {
        anyhow::bail!("{}: unsupported file format", path.display());
    }
    Ok(())
}

/// Check that `path` is a directory with at least one supported image
/// directly inside it.
pub fn validate_folder(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("{} does not exist", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("{} is not a directory", path.display());
    }
    let entries = std::fs::read_dir(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let has_image = entries
        .filter_map(|e| e.ok())
        .any(|e| e.path().is_file() && is_supported_image(&e.path()));
    if !has_image {
        anyhow::bail!("{} contains no supported images", path.display());
    }
    Ok(())
}

pub fn file_info(path: &Path) -> Result<FileInfo> {
    let meta = std::fs::metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
    let size_kb = (meta.len() as f64 / 1024.0 * 100.0).round() / 100.0;
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    let dimensions = match image::image_dimensions(path) {
        Ok(dims) => Some(dims),
        Err(e) => {
            log::debug!("No dimensions for {}: {e}", path.display());
            None
        }
    };

    Ok(FileInfo {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        size_kb,
        extension,
        dimensions,
    })
}

pub fn batch_file_info(paths: &[PathBuf]) -> Vec<Result<FileInfo>> {
    paths.iter().map(|p| file_info(p)).collect()
}

/// Where the cleaned version of `input` goes.
///
/// In place by default. `output_dir` moves the result into that folder
/// under the same name; `copy_suffix` renames it to `name{suffix}.ext`.
pub fn output_path_for(input: &Path, output: &OutputConfig) -> PathBuf {
    if output.in_place() {
        return input.to_path_buf();
    }

    let dir = match &output.output_dir {
        Some(dir) => dir.clone(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let file_name = match output.copy_suffix.as_deref().filter(|s| !s.is_empty()) {
        Some(suffix) => {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            match input.extension() {
                Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
                None => format!("{stem}{suffix}"),
            }
        }
        None => input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    dir.join(file_name)
}

/// Create a backup of the original file.
fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = path.with_extension(format!(
        "{}.bak",
        path.extension().unwrap_or_default().to_string_lossy()
    ));

    if !backup_path.exists() {
        std::fs::copy(path, &backup_path).context("Failed to create backup")?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}

/// Clean a single image according to `mode` and the output settings.
///
/// Never fails: any error ends up in [`ProcessResult::error`].
pub fn process_image(path: &Path, mode: &StripMode, config: &Config) -> ProcessResult {
    let mut result = ProcessResult::new(path);

    let Some(kind) = result.image_kind else {
        result.error = Some("unsupported format".to_string());
        return result;
    };
    if let Err(e) = validate_file(path) {
        result.error = Some(format!("{e:#}"));
        return result;
    }

    let options = config.strip.options();

    if config.output.dry_run {
        let outcome = std::fs::read(path)
            .context("Failed to read file")
            .and_then(|bytes| exif::strip_bytes(&bytes, kind, mode, &options));
        match outcome {
            Ok((_, outcome)) => result.apply(outcome),
            Err(e) => result.error = Some(format!("{e:#}")),
        }
        return result;
    }

    let output = output_path_for(path, &config.output);

    if config.output.backup_originals && output == path {
        if let Err(e) = backup_file(path) {
            result.error = Some(format!("{e:#}"));
            return result;
        }
    }

    match exif::strip_file(path, &output, kind, mode, &options) {
        Ok(outcome) => {
            result.apply(outcome);
            result.output_path = Some(output);
        }
        Err(e) => result.error = Some(format!("{e:#}")),
    }

    result
}

/// Clean every image in `paths`, in order.
///
/// `progress` receives the completed percentage (up to 100) after each file.
/// A failing file is recorded and the batch moves on.
pub fn process_batch<F>(paths: &[PathBuf], mode: &StripMode, config: &Config, mut progress: F) -> Vec<ProcessResult>
where
    F: FnMut(f64),
{
    let total = paths.len();
    let mut results = Vec::with_capacity(total);

    for (i, path) in paths.iter().enumerate() {
        let result = process_image(path, mode, config);
        match &result.error {
            Some(e) => log::warn!("{}: {e}", path.display()),
            None => log::debug!("{}: removed {} tag(s)", path.display(), result.removed_tags.len()),
        }
        results.push(result);
        progress((i + 1) as f64 / total as f64 * 100.0);
    }

    results
}

pub fn summarize(results: &[ProcessResult]) -> BatchSummary {
    let succeeded = results.iter().filter(|r| r.is_success()).count();
    BatchSummary {
        total: results.len(),
        succeeded,
        failed: results.len() - succeeded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use std::fs;
    use tempfile::TempDir;

    // ── ImageKind::from_path ──────────────────────────────────────────

    #[test]
    fn image_kind_jpeg() {
        assert_eq!(ImageKind::from_path(Path::new("photo.jpg")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("photo.jpeg")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("PHOTO.JPG")), Some(ImageKind::Jpeg));
    }

    #[test]
    fn image_kind_png_webp() {
        assert_eq!(ImageKind::from_path(Path::new("IMAGE.PNG")), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_path(Path::new("image.webp")), Some(ImageKind::WebP));
    }

    #[test]
    fn image_kind_unsupported() {
        assert_eq!(ImageKind::from_path(Path::new("scan.tiff")), None);
        assert_eq!(ImageKind::from_path(Path::new("photo.heic")), None);
        assert_eq!(ImageKind::from_path(Path::new("noext")), None);
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn collect_images_single_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("test.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let images = collect_images(&[jpg.clone()], true);
        assert_eq!(images, vec![jpg]);
    }

    #[test]
    fn collect_images_skips_unsupported() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("readme.txt");
        fs::write(&txt, b"hello").unwrap();

        assert!(collect_images(&[txt], true).is_empty());
    }

    #[test]
    fn collect_images_recursion_flag() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(sub.join("b.png"), b"fake").unwrap();
        fs::write(sub.join("c.txt"), b"fake").unwrap();

        assert_eq!(collect_images(&[dir.path().to_path_buf()], true).len(), 2);
        assert_eq!(
            collect_images(&[dir.path().to_path_buf()], false),
            vec![dir.path().join("a.jpg")]
        );
    }

    #[test]
    fn collect_images_deduplicates() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("photo.jpg");
        fs::write(&jpg, b"fake").unwrap();
        fs::write(dir.path().join("other.webp"), b"fake").unwrap();

        let images = collect_images(&[jpg.clone(), dir.path().to_path_buf(), jpg.clone()], true);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0], jpg);
    }

    #[test]
    fn collect_images_nonexistent_path() {
        assert!(collect_images(&[PathBuf::from("/nonexistent/path")], true).is_empty());
    }

    // ── validation & info ────────────────────────────────────────────

    #[test]
    fn validate_file_errors() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, b"x").unwrap();

        let msg = |r: Result<()>| format!("{:#}", r.unwrap_err());
        assert!(msg(validate_file(&dir.path().join("missing.jpg"))).contains("does not exist"));
        assert!(msg(validate_file(dir.path())).contains("is not a file"));
        assert!(msg(validate_file(&txt)).contains("unsupported file format"));
    }

    #[test]
    fn validate_folder_checks_direct_children() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("deep.jpg"), b"fake").unwrap();

        let err = validate_folder(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no supported images"));
        assert!(validate_folder(&sub).is_ok());
        assert!(validate_folder(&sub.join("deep.jpg")).unwrap_err().to_string().contains("is not a directory"));
    }

    #[test]
    fn file_info_reads_size_and_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = testutil::write_image(dir.path(), "Photo.PNG", ImageKind::Png, false);

        let info = file_info(&path).unwrap();
        assert_eq!(info.name, "Photo.PNG");
        assert_eq!(info.extension, ".png");
        assert_eq!(info.dimensions, Some((16, 16)));
        let expected = (fs::metadata(&path).unwrap().len() as f64 / 1024.0 * 100.0).round() / 100.0;
        assert_eq!(info.size_kb, expected);
    }

    #[test]
    fn file_info_without_readable_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.jpg");
        fs::write(&path, vec![0u8; 2048]).unwrap();

        let info = file_info(&path).unwrap();
        assert_eq!(info.size_kb, 2.0);
        assert_eq!(info.dimensions, None);

        let infos = batch_file_info(&[path, dir.path().join("gone.jpg")]);
        assert!(infos[0].is_ok());
        assert!(infos[1].is_err());
    }

    // ── output_path_for ──────────────────────────────────────────────

    #[test]
    fn output_path_variants() {
        let input = Path::new("/photos/trip/img.JPG");

        assert_eq!(output_path_for(input, &OutputConfig::default()), input);

        let suffix = OutputConfig {
            copy_suffix: Some("_clean".into()),
            ..OutputConfig::default()
        };
        assert_eq!(output_path_for(input, &suffix), Path::new("/photos/trip/img_clean.JPG"));

        let folder = OutputConfig {
            output_dir: Some("/out".into()),
            ..OutputConfig::default()
        };
        assert_eq!(output_path_for(input, &folder), Path::new("/out/img.JPG"));

        let both = OutputConfig {
            output_dir: Some("/out".into()),
            copy_suffix: Some("-x".into()),
            ..OutputConfig::default()
        };
        assert_eq!(output_path_for(input, &both), Path::new("/out/img-x.JPG"));
    }

    // ── process_image / process_batch ────────────────────────────────

    #[test]
    fn process_image_in_place_with_backup() {
        let dir = TempDir::new().unwrap();
        let path = testutil::write_image(dir.path(), "a.jpg", ImageKind::Jpeg, true);
        let original = fs::read(&path).unwrap();

        let mut config = Config::default();
        config.output.backup_originals = true;
        let result = process_image(&path, &StripMode::All, &config);

        assert!(result.is_success(), "{:?}", result.error);
        assert!(result.changed);
        assert_eq!(result.output_path.as_deref(), Some(path.as_path()));
        assert!(!exif::has_exif(&path));
        assert_eq!(fs::read(dir.path().join("a.jpg.bak")).unwrap(), original);

        // a second run keeps the first backup
        process_image(&path, &StripMode::All, &config);
        assert_eq!(fs::read(dir.path().join("a.jpg.bak")).unwrap(), original);
    }

    #[test]
    fn process_image_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = testutil::write_image(dir.path(), "a.webp", ImageKind::WebP, true);
        let original = fs::read(&path).unwrap();

        let mut config = Config::default();
        config.output.dry_run = true;
        config.output.backup_originals = true;
        let result = process_image(&path, &StripMode::selected(["Make"]), &config);

        assert!(result.is_success());
        assert_eq!(result.removed_tags, vec!["Make".to_string()]);
        assert!(result.output_path.is_none());
        assert_eq!(fs::read(&path).unwrap(), original);
        assert!(!dir.path().join("a.webp.bak").exists());
    }

    #[test]
    fn process_image_to_copy() {
        let dir = TempDir::new().unwrap();
        let path = testutil::write_image(dir.path(), "a.png", ImageKind::Png, true);

        let mut config = Config::default();
        config.output.copy_suffix = Some("_clean".into());
        let result = process_image(&path, &StripMode::All, &config);

        let copy = dir.path().join("a_clean.png");
        assert_eq!(result.output_path, Some(copy.clone()));
        assert!(!exif::has_exif(&copy));
        assert!(exif::has_exif(&path));
    }

    #[test]
    fn process_image_reports_errors() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.jpg");
        fs::write(&broken, b"not a jpeg").unwrap();

        let result = process_image(&broken, &StripMode::All, &Config::default());
        assert!(!result.is_success());

        let result = process_image(Path::new("notes.txt"), &StripMode::All, &Config::default());
        assert_eq!(result.error.as_deref(), Some("unsupported format"));
    }

    #[test]
    fn process_batch_progress_and_failures() {
        let dir = TempDir::new().unwrap();
        let good1 = testutil::write_image(dir.path(), "1.jpg", ImageKind::Jpeg, true);
        let bad = dir.path().join("2.jpg");
        fs::write(&bad, b"garbage").unwrap();
        let good2 = testutil::write_image(dir.path(), "3.png", ImageKind::Png, true);
        let missing = dir.path().join("4.webp");

        let mut ticks = Vec::new();
        let results = process_batch(
            &[good1, bad, good2, missing],
            &StripMode::All,
            &Config::default(),
            |p| ticks.push(p),
        );

        assert_eq!(ticks, vec![25.0, 50.0, 75.0, 100.0]);
        assert_eq!(
            summarize(&results),
            BatchSummary { total: 4, succeeded: 2, failed: 2 }
        );
    }

    #[test]
    fn process_batch_empty() {
        let mut called = false;
        let results = process_batch(&[], &StripMode::All, &Config::default(), |_| called = true);
        assert!(results.is_empty());
        assert!(!called);
        assert_eq!(summarize(&results), BatchSummary::default());
    }
}
