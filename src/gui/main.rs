#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use eframe::egui;
use egui_extras::{Column, TableBuilder};
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use exif_cleaner::config::{Config, OutputConfig};
use exif_cleaner::exif::{self, ExifInfo, StripMode, removable_tags};
use exif_cleaner::pipeline::{self, FileInfo, ProcessResult, collect_images, file_info};
use exif_cleaner::update::{UpdateChecker, UpdateInfo};
use exif_cleaner::version::VersionInfo;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let config = match Config::load(None) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e:#}");
            Config::default()
        }
    };
    let version = VersionInfo::load(config.update.version_file.as_deref());
    let title = format!("{} v{}", version.app_name, version.version);

    let viewport = egui::ViewportBuilder::default()
        .with_title(&title)
        .with_inner_size([1100.0, 720.0])
        .with_min_inner_size([800.0, 500.0])
        .with_drag_and_drop(true);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(App::new(config, version)))),
    )
}

// ── Messages sent from background threads to the UI ─────────────────

enum BgMessage {
    /// Batch progress in percent.
    Progress(f64),
    /// One image finished.
    FileDone(ProcessResult),
    /// All images in the batch are done.
    BatchDone,
    UpdateChecked(UpdateInfo),
}

// ── Per-image state shown in the UI ─────────────────────────────────

struct FileEntry {
    info: FileInfo,
    result: Option<ProcessResult>,
}

#[derive(PartialEq, Clone, Copy)]
enum Tab {
    Process,
    Options,
}

#[derive(PartialEq, Clone, Copy)]
enum OutputMode {
    InPlace,
    Copy,
    Folder,
}

// ── Main application state ──────────────────────────────────────────

struct App {
    config: Config,
    config_path: Option<PathBuf>,
    version: VersionInfo,
    files: Vec<FileEntry>,
    selected: Option<usize>,
    /// EXIF of the selected file, or the error reading it.
    selected_exif: Option<Result<ExifInfo, String>>,
    texture: Option<egui::TextureHandle>,
    /// One flag per entry of the removable tag catalog.
    tag_checks: Vec<bool>,
    tab: Tab,
    output_mode: OutputMode,
    suffix: String,
    processing: bool,
    progress: f64,
    status: String,
    show_about: bool,
    /// Whether the running update check was started by the user.
    update_requested: bool,
    updater: Arc<UpdateChecker>,
    rx: mpsc::Receiver<BgMessage>,
    tx: mpsc::Sender<BgMessage>,
    /// Tokio runtime for async tasks.
    rt: tokio::runtime::Runtime,
}

impl App {
    fn new(config: Config, version: VersionInfo) -> Self {
        let (tx, rx) = mpsc::channel();
        let tag_checks = default_checks(&config);
        let output_mode = output_mode_of(&config);
        let suffix = config.output.copy_suffix.clone().unwrap_or_else(|| "_clean".into());
        let updater = Arc::new(UpdateChecker::new(
            version.clone(),
            Duration::from_secs(config.update.timeout_secs),
        ));

        let mut app = Self {
            config,
            config_path: None,
            version,
            files: Vec::new(),
            selected: None,
            selected_exif: None,
            texture: None,
            tag_checks,
            tab: Tab::Process,
            output_mode,
            suffix,
            processing: false,
            progress: 0.0,
            status: "Ready: drop images or click Open".into(),
            show_about: false,
            update_requested: false,
            updater,
            rx,
            tx,
            rt: tokio::runtime::Runtime::new().expect("Failed to create tokio runtime"),
        };
        if app.config.update.check_on_startup {
            app.check_updates(false);
        }
        app
    }

    fn add_paths(&mut self, paths: Vec<PathBuf>) {
        let was_empty = self.files.is_empty();
        let collected = collect_images(&paths, self.config.input.recursive);
        for path in collected {
            if self.files.iter().any(|e| e.info.path == path) {
                continue;
            }
            match file_info(&path) {
                Ok(info) => self.files.push(FileEntry { info, result: None }),
                Err(e) => log::warn!("{e:#}"),
            }
        }
        if was_empty && !self.files.is_empty() {
            self.select(0);
        }
        self.status = format!("{} image(s) loaded", self.files.len());
    }

    fn select(&mut self, idx: usize) {
        let Some(entry) = self.files.get(idx) else {
            return;
        };
        self.selected = Some(idx);
        self.selected_exif = Some(exif::read_exif(&entry.info.path).map_err(|e| format!("{e:#}")));
        self.texture = None;
    }

    fn clear(&mut self) {
        self.files.clear();
        self.selected = None;
        self.selected_exif = None;
        self.texture = None;
        self.progress = 0.0;
        self.status = "Ready: drop images or click Open".into();
    }

    fn open_files(&mut self) {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Images", &["jpg", "jpeg", "png", "webp"])
            .pick_files()
        {
            self.add_paths(paths);
        }
    }

    fn open_folder(&mut self) {
        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            let before = self.files.len();
            self.add_paths(vec![dir.clone()]);
            if self.files.len() == before {
                warn_dialog(&format!("No supported images found in {}", dir.display()));
            }
        }
    }

    fn checked_tags(&self) -> BTreeSet<String> {
        removable_tags()
            .iter()
            .zip(&self.tag_checks)
            .filter(|(_, checked)| **checked)
            .map(|(t, _)| t.name.to_string())
            .collect()
    }

    /// Warn and return false when the output options would fall back to
    /// overwriting the originals.
    fn output_ready(&mut self) -> bool {
        self.sync_output_config();
        match output_problem(self.output_mode, &self.config.output) {
            Some(msg) => {
                warn_dialog(msg);
                false
            }
            None => true,
        }
    }

    fn remove_all(&mut self) {
        if self.files.is_empty() {
            warn_dialog("Please add image files first.");
            return;
        }
        if !self.output_ready() {
            return;
        }
        let question = format!("Remove all EXIF information from {} file(s)?", self.files.len());
        if confirm_dialog(&question) {
            self.start_batch(StripMode::All);
        }
    }

    fn remove_selected(&mut self) {
        if self.files.is_empty() {
            warn_dialog("Please add image files first.");
            return;
        }
        let tags = self.checked_tags();
        if tags.is_empty() {
            warn_dialog("Please select at least one EXIF tag to remove.");
            return;
        }
        if !self.output_ready() {
            return;
        }
        let question = format!(
            "Remove {} selected EXIF tag(s) from {} file(s)?",
            tags.len(),
            self.files.len()
        );
        if confirm_dialog(&question) {
            self.start_batch(StripMode::Selected(tags));
        }
    }

    fn start_batch(&mut self, mode: StripMode) {
        if self.files.is_empty() || self.processing {
            return;
        }
        self.processing = true;
        self.progress = 0.0;
        self.status = "Processing... 0%".into();

        // Clear previous results
        for entry in &mut self.files {
            entry.result = None;
        }

        let paths: Vec<PathBuf> = self.files.iter().map(|e| e.info.path.clone()).collect();
        let config = self.config.clone();
        let tx = self.tx.clone();

        std::thread::spawn(move || {
            let progress_tx = tx.clone();
            let results = pipeline::process_batch(&paths, &mode, &config, |pct| {
                let _ = progress_tx.send(BgMessage::Progress(pct));
            });
            for result in results {
                let _ = tx.send(BgMessage::FileDone(result));
            }
            let _ = tx.send(BgMessage::BatchDone);
        });
    }

    fn check_updates(&mut self, requested: bool) {
        self.update_requested = requested;
        if requested {
            self.status = "Checking for updates...".into();
        }
        let updater = self.updater.clone();
        let tx = self.tx.clone();
        self.rt.spawn(async move {
            let info = updater.check_for_updates().await;
            let _ = tx.send(BgMessage::UpdateChecked(info));
        });
    }

    fn poll_messages(&mut self, ctx: &egui::Context) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                BgMessage::Progress(pct) => {
                    self.progress = pct;
                    self.status = format!("Processing... {pct:.0}%");
                }
                BgMessage::FileDone(result) => {
                    if let Some(entry) = self.files.iter_mut().find(|e| e.info.path == result.path) {
                        if let Ok(info) = file_info(&entry.info.path) {
                            entry.info = info;
                        }
                        entry.result = Some(result);
                    }
                }
                BgMessage::BatchDone => {
                    self.processing = false;
                    let results: Vec<ProcessResult> =
                        self.files.iter().filter_map(|e| e.result.clone()).collect();
                    let summary = pipeline::summarize(&results);
                    self.status = format!("Done: {} succeeded, {} failed", summary.succeeded, summary.failed);
                    if let Some(idx) = self.selected {
                        self.select(idx);
                    }
                    MessageDialog::new()
                        .set_level(MessageLevel::Info)
                        .set_title("Finished")
                        .set_description(&self.status)
                        .show();
                }
                BgMessage::UpdateChecked(info) => self.on_update_checked(ctx, info),
            }
        }
    }

    fn on_update_checked(&mut self, ctx: &egui::Context, info: UpdateInfo) {
        let requested = std::mem::take(&mut self.update_requested);
        if let Some(err) = info.error {
            if requested {
                self.status = "Update check failed".into();
                MessageDialog::new()
                    .set_level(MessageLevel::Error)
                    .set_title("Check for Updates")
                    .set_description(format!("Could not check for updates:\n{err}"))
                    .show();
            }
            return;
        }

        if info.update_available {
            self.status = format!("Version {} is available", info.latest_version);
            let mut text = format!(
                "A new version is available: {} (you have {}).",
                info.latest_version, info.current_version
            );
            if !info.release_notes.is_empty() {
                text.push_str("\n\n");
                text.push_str(&info.release_notes);
            }
            text.push_str("\n\nOpen the release page?");
            let answer = MessageDialog::new()
                .set_level(MessageLevel::Info)
                .set_title("Update Available")
                .set_description(text)
                .set_buttons(MessageButtons::YesNo)
                .show();
            if answer == MessageDialogResult::Yes && !info.release_url.is_empty() {
                ctx.open_url(egui::OpenUrl::new_tab(&info.release_url));
            }
        } else if requested {
            self.status = "Up to date".into();
            MessageDialog::new()
                .set_level(MessageLevel::Info)
                .set_title("Check for Updates")
                .set_description(format!("You are running the latest version ({}).", info.current_version))
                .show();
        }
    }
}

fn default_checks(config: &Config) -> Vec<bool> {
    removable_tags()
        .iter()
        .map(|t| config.strip.default_tags.iter().any(|d| d == t.name))
        .collect()
}

fn output_mode_of(config: &Config) -> OutputMode {
    if config.output.output_dir.is_some() {
        OutputMode::Folder
    } else if config.output.in_place() {
        OutputMode::InPlace
    } else {
        OutputMode::Copy
    }
}

/// A copy or folder mode that `output` cannot honor, since it would write over
/// the originals instead.
fn output_problem(mode: OutputMode, output: &OutputConfig) -> Option<&'static str> {
    if mode == OutputMode::InPlace || !output.in_place() {
        return None;
    }
    match mode {
        OutputMode::Folder => Some("Please choose an output folder first."),
        _ => Some("Please enter a suffix for the cleaned copies."),
    }
}

fn warn_dialog(text: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Warning")
        .set_description(text)
        .show();
}

fn confirm_dialog(text: &str) -> bool {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Confirm")
        .set_description(text)
        .set_buttons(MessageButtons::YesNo)
        .show()
        == MessageDialogResult::Yes
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_messages(ctx);

        // Request repaint while processing so we pick up messages
        if self.processing {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        // Handle dropped files
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw.dropped_files.iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if !dropped.is_empty() && !self.processing {
            self.add_paths(dropped);
        }

        // ── Top bar ──────────────────────────────────────
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(&self.version.app_name);
                ui.separator();

                if ui.selectable_label(self.tab == Tab::Process, "🖼 Images").clicked() {
                    self.tab = Tab::Process;
                }
                if ui.selectable_label(self.tab == Tab::Options, "⚙ Options").clicked() {
                    self.tab = Tab::Options;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("About").clicked() {
                        self.show_about = true;
                    }
                    if ui.button("Check for Updates").clicked() {
                        self.check_updates(true);
                    }
                    ui.separator();
                    if self.processing {
                        ui.spinner();
                    }
                    ui.label(&self.status);
                });
            });
        });

        match self.tab {
            Tab::Process => self.show_process_tab(ctx),
            Tab::Options => self.show_options_tab(ctx),
        }

        self.show_about_window(ctx);
    }
}

// ── Images tab ──────────────────────────────────────────────────────

impl App {
    fn show_process_tab(&mut self, ctx: &egui::Context) {
        let idle = !self.processing;

        // ── Bottom toolbar ───────────────────────────────────────────
        egui::TopBottomPanel::bottom("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            if self.processing || self.progress > 0.0 {
                ui.add(egui::ProgressBar::new((self.progress / 100.0) as f32).show_percentage());
                ui.add_space(4.0);
            }
            ui.horizontal(|ui| {
                if ui.add_enabled(idle, egui::Button::new("📂 Open Files")).clicked() {
                    self.open_files();
                }
                if ui.add_enabled(idle, egui::Button::new("📁 Open Folder")).clicked() {
                    self.open_folder();
                }
                if ui.add_enabled(idle && !self.files.is_empty(), egui::Button::new("🗑 Clear List")).clicked() {
                    self.clear();
                }
                ui.separator();

                if ui.add_enabled(idle, egui::Button::new("Remove All EXIF")).clicked() {
                    self.remove_all();
                }
                if ui.add_enabled(idle, egui::Button::new("Remove Selected EXIF")).clicked() {
                    self.remove_selected();
                }
            });
            ui.add_space(4.0);
        });

        // ── Left panel: file table ─────────────────────────────────
        egui::SidePanel::left("file_list")
            .default_width(420.0)
            .min_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Files");
                ui.separator();

                if self.files.is_empty() {
                    ui.centered_and_justified(|ui| {
                        ui.label(egui::RichText::new("Drop images or folders here\nor click Open")
                            .size(16.0)
                            .color(egui::Color32::GRAY));
                    });
                    return;
                }

                let mut clicked = None;
                let selected = self.selected;
                TableBuilder::new(ui)
                    .striped(true)
                    .sense(egui::Sense::click())
                    .column(Column::initial(160.0).at_least(80.0).clip(true))
                    .column(Column::auto().at_least(70.0))
                    .column(Column::remainder().clip(true))
                    .header(20.0, |mut header| {
                        header.col(|ui| { ui.strong("Name"); });
                        header.col(|ui| { ui.strong("Size (KB)"); });
                        header.col(|ui| { ui.strong("Path"); });
                    })
                    .body(|mut body| {
                        for (i, entry) in self.files.iter().enumerate() {
                            body.row(20.0, |mut row| {
                                row.set_selected(selected == Some(i));
                                row.col(|ui| {
                                    let icon = match &entry.result {
                                        Some(r) if r.is_success() => "✅ ",
                                        Some(_) => "❌ ",
                                        None => "",
                                    };
                                    ui.label(format!("{icon}{}", entry.info.name));
                                });
                                row.col(|ui| {
                                    ui.label(format!("{:.2}", entry.info.size_kb));
                                });
                                row.col(|ui| {
                                    ui.label(entry.info.path.display().to_string());
                                });
                                if row.response().clicked() {
                                    clicked = Some(i);
                                }
                            });
                        }
                    });
                if let Some(i) = clicked {
                    self.select(i);
                }
            });

        // ── Central panel: tag selection + details ─────────────────
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.show_tag_grid(ui);
                    ui.add_space(12.0);
                    ui.separator();
                    self.show_details(ctx, ui);
                });
        });
    }

    fn show_tag_grid(&mut self, ui: &mut egui::Ui) {
        let present: BTreeSet<String> = match &self.selected_exif {
            Some(Ok(info)) => info.tag_names().into_iter().map(String::from).collect(),
            _ => BTreeSet::new(),
        };

        ui.horizontal(|ui| {
            ui.heading("Tags to remove");
            if ui.button("Select All").clicked() {
                self.tag_checks.iter_mut().for_each(|c| *c = true);
            }
            if ui.button("Deselect All").clicked() {
                self.tag_checks.iter_mut().for_each(|c| *c = false);
            }
        });
        ui.add_space(4.0);

        egui::Grid::new("tag_grid")
            .num_columns(4)
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                for (i, tag) in removable_tags().iter().enumerate() {
                    let mut text = egui::RichText::new(tag.label);
                    if present.contains(tag.name) {
                        text = text.strong().color(egui::Color32::from_rgb(230, 160, 40));
                    }
                    ui.checkbox(&mut self.tag_checks[i], text)
                        .on_hover_text(format!("{} ({})", tag.name, tag.category.label()));
                    if i % 4 == 3 {
                        ui.end_row();
                    }
                }
            });

        ui.add_space(6.0);
        ui.label(egui::RichText::new(
            "• Remove All EXIF drops every tag, plus XMP and IPTC when enabled in Options.\n\
             • Remove Selected EXIF drops only the checked tags and keeps the rest.\n\
             • Highlighted tags are present in the selected image. Pixels are never re-encoded.",
        ).small().color(egui::Color32::GRAY));
    }

    fn show_details(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let Some(entry) = self.selected.and_then(|i| self.files.get(i)) else {
            ui.label(egui::RichText::new("Select an image to see its EXIF data")
                .color(egui::Color32::GRAY));
            return;
        };

        if self.texture.is_none() {
            self.texture = load_texture(ctx, &entry.info.path);
        }

        ui.horizontal(|ui| {
            if let Some(ref tex) = self.texture {
                let size = tex.size_vec2();
                let scale = (200.0 / size.y).min(1.0);
                ui.image(egui::load::SizedTexture::new(tex.id(), size * scale));
            }
            ui.vertical(|ui| {
                ui.heading(&entry.info.name);
                ui.label(format!("Path: {}", entry.info.path.display()));
                ui.label(format!("Size: {:.2} KB", entry.info.size_kb));
                if let Some((w, h)) = entry.info.dimensions {
                    ui.label(format!("Dimensions: {w} × {h}"));
                }
                if let Some(ref result) = entry.result {
                    match &result.error {
                        Some(err) => {
                            ui.colored_label(egui::Color32::from_rgb(220, 50, 50), format!("Error: {err}"));
                        }
                        None if result.changed => {
                            ui.colored_label(
                                egui::Color32::from_rgb(50, 180, 50),
                                format!("✓ Removed {} tag(s)", result.removed_tags.len()),
                            );
                        }
                        None => {
                            ui.label("No metadata to remove");
                        }
                    }
                }
            });
        });
        ui.add_space(8.0);

        match &self.selected_exif {
            Some(Ok(info)) if info.is_empty() => {
                ui.label("No EXIF data found.");
            }
            Some(Ok(info)) => {
                if let Some((lat, lon)) = info.gps_coordinates() {
                    ui.colored_label(
                        egui::Color32::from_rgb(230, 160, 40),
                        format!("⚠ This image contains GPS coordinates ({lat:.6}, {lon:.6})"),
                    );
                    ui.add_space(4.0);
                }
                egui::CollapsingHeader::new(egui::RichText::new(format!("EXIF ({} tags)", info.entries.len())).strong())
                    .default_open(true)
                    .show(ui, |ui| {
                        egui::Grid::new("exif_grid")
                            .num_columns(3)
                            .striped(true)
                            .spacing([12.0, 4.0])
                            .show(ui, |ui| {
                                for entry in &info.entries {
                                    ui.label(egui::RichText::new(entry.group.label()).small().color(egui::Color32::GRAY));
                                    ui.label(egui::RichText::new(&entry.name).strong());
                                    ui.label(&entry.value);
                                    ui.end_row();
                                }
                            });
                    });
            }
            Some(Err(err)) => {
                ui.colored_label(egui::Color32::from_rgb(220, 50, 50), format!("Could not read EXIF: {err}"));
            }
            None => {}
        }
    }

    fn show_about_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_about;
        egui::Window::new(format!("About {}", self.version.app_name))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading(&self.version.app_name);
                ui.label(format!("Version {}", self.version.version));
                ui.add_space(6.0);
                ui.label(&self.version.description);
                ui.add_space(6.0);
                egui::Grid::new("about_grid").num_columns(2).show(ui, |ui| {
                    ui.strong("Author");
                    ui.label(env!("CARGO_PKG_AUTHORS"));
                    ui.end_row();
                    ui.strong("License");
                    ui.label(env!("CARGO_PKG_LICENSE"));
                    ui.end_row();
                    ui.strong("Formats");
                    ui.label("JPEG, PNG, WebP");
                    ui.end_row();
                    ui.strong("Built with");
                    ui.label("Rust, egui, kamadak-exif, img-parts");
                    ui.end_row();
                });
                ui.add_space(6.0);
                if !self.version.repository.is_empty() {
                    ui.hyperlink(&self.version.repository);
                }
            });
        self.show_about = open;
    }
}

fn load_texture(ctx: &egui::Context, path: &std::path::Path) -> Option<egui::TextureHandle> {
    let bytes = std::fs::read(path).ok()?;
    let img = image::load_from_memory(&bytes).ok()?.thumbnail(400, 400);
    let size = [img.width() as usize, img.height() as usize];
    let rgba = img.to_rgba8();
    let pixels = rgba.as_flat_samples();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
    Some(ctx.load_texture(path.to_string_lossy(), color_image, egui::TextureOptions::LINEAR))
}

// ── Options tab ─────────────────────────────────────────────────────

impl App {
    fn show_options_tab(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Options");
                ui.add_space(8.0);

                // Config file path
                ui.horizontal(|ui| {
                    ui.label("Config file:");
                    if let Some(ref path) = self.config_path {
                        ui.label(path.display().to_string());
                    } else {
                        ui.label("(default)");
                    }
                    if ui.button("Load...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .pick_file()
                        {
                            match Config::load(Some(&path)) {
                                Ok(c) => {
                                    self.apply_config(c);
                                    self.config_path = Some(path);
                                    self.status = "Config loaded".into();
                                }
                                Err(e) => {
                                    self.status = format!("Failed to load config: {e:#}");
                                }
                            }
                        }
                    }
                    if ui.button("Save Config").clicked() {
                        self.sync_output_config();
                        self.config.strip.default_tags = self.checked_tags().into_iter().collect();
                        let path = self.config_path.as_deref();
                        match self.config.save(path) {
                            Ok(()) => self.status = "Config saved".into(),
                            Err(e) => self.status = format!("Failed to save config: {e:#}"),
                        }
                    }
                });

                ui.add_space(16.0);
                ui.separator();

                // ── Output ───────────────────────────────────────
                ui.add_space(8.0);
                ui.heading("Output");
                ui.add_space(4.0);

                let mut changed = false;
                changed |= ui.radio_value(&mut self.output_mode, OutputMode::InPlace, "Overwrite originals").changed();
                ui.horizontal(|ui| {
                    changed |= ui.radio_value(&mut self.output_mode, OutputMode::Copy, "Save a copy with suffix").changed();
                    changed |= ui.text_edit_singleline(&mut self.suffix).changed();
                });
                ui.horizontal(|ui| {
                    changed |= ui.radio_value(&mut self.output_mode, OutputMode::Folder, "Save into folder").changed();
                    let label = self
                        .config
                        .output
                        .output_dir
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(none)".into());
                    ui.label(label);
                    if ui.button("Choose...").clicked() {
                        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                            self.config.output.output_dir = Some(dir);
                            self.output_mode = OutputMode::Folder;
                            changed = true;
                        }
                    }
                });
                if changed {
                    self.sync_output_config();
                }

                ui.add_space(4.0);
                ui.checkbox(&mut self.config.output.backup_originals, "Backup originals (.bak) when overwriting");
                ui.checkbox(&mut self.config.output.dry_run, "Dry run (report only, write nothing)");

                ui.add_space(16.0);
                ui.separator();

                // ── Stripping ────────────────────────────────────
                ui.add_space(8.0);
                ui.heading("Stripping");
                ui.add_space(4.0);

                ui.checkbox(&mut self.config.strip.strip_xmp, "Also remove XMP on Remove All");
                ui.checkbox(&mut self.config.strip.strip_iptc, "Also remove IPTC on Remove All");
                ui.checkbox(&mut self.config.strip.keep_thumbnail, "Keep embedded thumbnail on selective removal");
                ui.checkbox(&mut self.config.input.recursive, "Include sub-folders when opening a folder");

                ui.add_space(16.0);
                ui.separator();

                // ── Updates ──────────────────────────────────────
                ui.add_space(8.0);
                ui.heading("Updates");
                ui.add_space(4.0);
                ui.checkbox(&mut self.config.update.check_on_startup, "Check for updates on startup");
            });
        });
    }

    fn sync_output_config(&mut self) {
        match self.output_mode {
            OutputMode::InPlace => {
                self.config.output.output_dir = None;
                self.config.output.copy_suffix = None;
            }
            OutputMode::Copy => {
                self.config.output.output_dir = None;
                self.config.output.copy_suffix = Some(self.suffix.clone());
            }
            OutputMode::Folder => {
                self.config.output.copy_suffix = None;
            }
        }
    }

    /// Replace the config and the UI state derived from it.
    fn apply_config(&mut self, config: Config) {
        self.tag_checks = default_checks(&config);
        self.output_mode = output_mode_of(&config);
        if let Some(ref suffix) = config.output.copy_suffix {
            self.suffix = suffix.clone();
        }
        self.config = config;
    }
}
