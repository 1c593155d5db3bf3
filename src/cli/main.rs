use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use exif_cleaner::exif::{self, IfdGroup, StripMode, TagCategory};
use exif_cleaner::update::UpdateChecker;
use exif_cleaner::version::VersionInfo;
use exif_cleaner::{config, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "exif-cleaner",
    version,
    about = "Batch-remove EXIF metadata from JPEG, PNG and WebP images, fully or tag by tag"
)]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Remove only these tags (comma-separated, e.g. GPSLatitude,Make)
    #[arg(long, value_name = "TAG", value_delimiter = ',', conflicts_with = "default_tags")]
    remove: Vec<String>,

    /// Remove only the tags listed in the config's strip.default_tags
    #[arg(long = "default-tags")]
    default_tags: bool,

    /// Display all EXIF metadata and exit
    #[arg(long = "show-exif")]
    show_exif: bool,

    /// List the tags offered for selective removal and exit
    #[arg(long = "list-tags")]
    list_tags: bool,

    /// Check GitHub for a newer release and exit
    #[arg(long = "check-update")]
    check_update: bool,

    /// Preview what would be removed without writing to files
    #[arg(long)]
    dry_run: bool,

    /// Keep a .bak copy of each image cleaned in place
    #[arg(long)]
    backup: bool,

    /// Write cleaned images into this directory instead of in place
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Write cleaned images as NAME{SUFFIX}.EXT instead of in place
    #[arg(long, value_name = "SUFFIX")]
    suffix: Option<String>,

    /// Only look at the top level of given directories
    #[arg(long)]
    no_recursive: bool,

    /// Leave XMP packets in place on a full strip
    #[arg(long)]
    no_xmp: bool,

    /// Leave IPTC blocks in place on a full strip
    #[arg(long)]
    no_iptc: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.list_tags {
        print_removable_tags();
        return Ok(());
    }

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;
    apply_overrides(&cli, &mut config);

    if cli.check_update {
        return check_update(&config).await;
    }

    // Validate inputs
    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    let images = pipeline::collect_images(&cli.paths, config.input.recursive);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    // Handle --show-exif
    if cli.show_exif {
        return show_exif(&images, cli.json);
    }

    let mode = if !cli.remove.is_empty() {
        for name in &cli.remove {
            if exif::find_removable(name).is_none() {
                log::warn!("{name} is not in the removable tag list; matching it by name anyway");
            }
        }
        StripMode::selected(cli.remove.iter().map(|s| s.trim().to_string()))
    } else if cli.default_tags {
        config.strip.default_mode()
    } else {
        StripMode::All
    };

    log::info!("Found {} image(s) to process", images.len());
    match &mode {
        StripMode::All => log::info!("Removing all EXIF metadata"),
        StripMode::Selected(names) => {
            log::info!("Removing: {}", names.iter().cloned().collect::<Vec<_>>().join(", "))
        }
    }
    if config.output.dry_run {
        log::info!("DRY RUN: no files will be modified");
    }

    let bar = if cli.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(images.len() as u64)
    };
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    let total = images.len() as f64;
    let results = pipeline::process_batch(&images, &mode, &config, |pct| {
        bar.set_position((pct / 100.0 * total).round() as u64);
    });
    bar.finish_and_clear();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            print_result(result, config.output.dry_run);
        }
    }

    let summary = pipeline::summarize(&results);
    log::info!(
        "Done: {} succeeded, {} failed out of {} images",
        summary.succeeded,
        summary.failed,
        summary.total
    );

    if summary.failed > 0 {
        anyhow::bail!("{} image(s) could not be processed", summary.failed);
    }
    Ok(())
}

fn apply_overrides(cli: &Cli, config: &mut config::Config) {
    if cli.dry_run {
        config.output.dry_run = true;
    }
    if cli.backup {
        config.output.backup_originals = true;
    }
    if cli.output_dir.is_some() {
        config.output.output_dir = cli.output_dir.clone();
    }
    if cli.suffix.is_some() {
        config.output.copy_suffix = cli.suffix.clone();
    }
    if cli.no_recursive {
        config.input.recursive = false;
    }
    if cli.no_xmp {
        config.strip.strip_xmp = false;
    }
    if cli.no_iptc {
        config.strip.strip_iptc = false;
    }
}

async fn check_update(config: &config::Config) -> Result<()> {
    let version = VersionInfo::load(config.update.version_file.as_deref());
    println!("{} v{}", version.app_name, version.version);

    let checker = UpdateChecker::new(version, Duration::from_secs(config.update.timeout_secs));
    let info = checker.check_for_updates().await;
    if let Some(err) = info.error {
        anyhow::bail!(err);
    }
    if info.update_available {
        println!("{GREEN}New version available: {}{RESET}", info.latest_version);
        println!("  {}", info.release_url);
        if !info.release_notes.is_empty() {
            println!();
            for line in info.release_notes.lines() {
                println!("  {DIM}{line}{RESET}");
            }
        }
    } else {
        println!("You are running the latest version.");
    }
    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

fn print_result(result: &pipeline::ProcessResult, dry_run: bool) {
    let path = result.path.display();
    if let Some(ref err) = result.error {
        println!("{RED}✗{RESET} {path}: {err}");
        return;
    }
    if !result.changed {
        println!("{DIM}-{RESET} {path}: no metadata to remove");
        return;
    }

    let verb = if dry_run { "would remove" } else { "removed" };
    let mut parts = Vec::new();
    if !result.removed_tags.is_empty() {
        parts.push(format!("{} tag(s)", result.removed_tags.len()));
    }
    if result.xmp_removed {
        parts.push("XMP".to_string());
    }
    if result.iptc_removed {
        parts.push("IPTC".to_string());
    }
    if parts.is_empty() {
        parts.push("EXIF".to_string());
    }
    println!("{GREEN}✓{RESET} {path}: {verb} {}", parts.join(", "));

    if let Some(ref out) = result.output_path {
        if out != &result.path {
            println!("  {DIM}→ {}{RESET}", out.display());
        }
    }
}

fn print_removable_tags() {
    let categories = [
        TagCategory::Gps,
        TagCategory::Device,
        TagCategory::Capture,
        TagCategory::Personal,
    ];
    for category in categories {
        println!("{BOLD}{}{RESET}", category.label());
        for tag in exif::removable_tags().iter().filter(|t| t.category == category) {
            println!("  {:<22} {DIM}{}{RESET}", tag.name, tag.label);
        }
        println!();
    }
}

fn show_exif(images: &[PathBuf], json: bool) -> Result<()> {
    if json {
        let mut out = serde_json::Map::new();
        for path in images {
            let value = match exif::read_exif(path) {
                Ok(info) => serde_json::to_value(&info)?,
                Err(e) => serde_json::json!({ "error": format!("{e:#}") }),
            };
            out.insert(path.display().to_string(), value);
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for path in images {
        if let Err(e) = print_full_exif(path) {
            log::error!("{}: {e:#}", path.display());
        }
    }
    Ok(())
}

/// Print every EXIF tag of a file, organized by directory.
fn print_full_exif(path: &Path) -> Result<()> {
    let info = exif::read_exif(path)?;

    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    if info.is_empty() {
        println!("  {DIM}(no EXIF metadata found){RESET}");
        println!();
        return Ok(());
    }

    let groups = [
        (IfdGroup::Primary, "Image"),
        (IfdGroup::Exif, "Capture"),
        (IfdGroup::Gps, "GPS"),
        (IfdGroup::Interop, "Interoperability"),
        (IfdGroup::Thumbnail, "Thumbnail"),
    ];
    for (group, title) in groups {
        let entries: Vec<_> = info.entries.iter().filter(|e| e.group == group).collect();
        if entries.is_empty() {
            continue;
        }
        println!("  {BOLD}{title}{RESET} {DIM}({}){RESET}", group.label());
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        for entry in entries {
            let removable = exif::find_removable(&entry.name).is_some();
            print_row(&entry.name, &entry.value, removable);
        }
        println!();
    }

    if let Some((lat, lon)) = info.gps_coordinates() {
        println!("  {YELLOW}⚠ This image reveals where it was taken: {lat:.6}, {lon:.6}{RESET}");
        println!();
    }

    Ok(())
}

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print a single row in the EXIF display table; privacy-relevant tags in yellow.
fn print_row(tag: &str, val: &str, highlight: bool) {
    let tag_col = format!("{:<22}", tag);
    let (start, end) = if highlight { (YELLOW, RESET) } else { ("", "") };
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {start}{tag_col}{end} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_text_breaks_on_words() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn remove_flag_splits_on_commas() {
        let cli = Cli::parse_from(["exif-cleaner", "--remove", "Make,GPSLatitude", "a.jpg"]);
        assert_eq!(cli.remove, vec!["Make".to_string(), "GPSLatitude".to_string()]);
        assert_eq!(cli.paths, vec![PathBuf::from("a.jpg")]);
    }

    #[test]
    fn overrides_apply_to_config() {
        let cli = Cli::parse_from(["exif-cleaner", "--dry-run", "--suffix", "_c", "--no-xmp", "--no-recursive", "x"]);
        let mut config = config::Config::default();
        apply_overrides(&cli, &mut config);
        assert!(config.output.dry_run);
        assert_eq!(config.output.copy_suffix.as_deref(), Some("_c"));
        assert!(!config.strip.strip_xmp);
        assert!(config.strip.strip_iptc);
        assert!(!config.input.recursive);
    }
}
