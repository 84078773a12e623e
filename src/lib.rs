//! Boxlabel: bounding-box annotation core.
//!
//! Boxlabel holds everything an image annotation editor needs apart from
//! the window: a typed coordinate model, an annotation store that keeps at
//! most one box per class on each image, an interaction state machine for
//! drawing, moving and resizing boxes, a renderer that produces a display
//! list, and YOLO / Pascal VOC codecs with export packaging.
//!
//! # Modules
//!
//! - [`ir`]: coordinates, boxes, annotations, classes and the format codecs
//! - [`view`]: the image-to-viewport transform
//! - [`store`]: the annotation store
//! - [`interaction`]: the editing session and its state machine
//! - [`render`]: frame composition and the raster surface
//! - [`import`] / [`export`]: VOC import batches, export bundles and crops
//! - [`script`]: scripted replay of editor input
//! - [`error`]: error types for boxlabel operations

pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod interaction;
pub mod ir;
pub mod render;
pub mod report;
pub mod script;
pub mod source;
pub mod store;
pub mod view;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

pub use error::BoxlabelError;

use config::EditorConfig;
use export::{CropFormat, Destination, ANNOTATIONS_ARCHIVE};
use interaction::Session;
use ir::{ImageSize, KnownClasses, ViewportSize};
use render::PixmapSurface;
use report::Report;
use source::{DirectorySource, ImageSource};
use store::AnnotationStore;

/// The boxlabel CLI application.
#[derive(Parser)]
#[command(name = "boxlabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Editor configuration file (JSON).
    #[arg(long, global = true, env = "BOXLABEL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Export YOLO and Pascal VOC annotations for an image directory.
    Export(ExportArgs),
    /// Crop every box of one image into separate image files.
    Crops(CropsArgs),
    /// Render one image with its boxes to a PNG.
    ///
    /// Label tags are drawn as plain rectangles; the PNG carries no label text.
    Render(RenderArgs),
    /// Replay a scripted editing session.
    Replay(ReplayArgs),
    /// List the boxes found for each image.
    Inspect(InspectArgs),
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Directory containing the images.
    #[arg(long)]
    images: PathBuf,

    /// VOC XML files or directories to import first.
    #[arg(long)]
    annotations: Vec<PathBuf>,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Write individual files instead of a zip archive.
    #[arg(long)]
    no_archive: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(clap::Args)]
struct CropsArgs {
    /// Image to crop.
    #[arg(long)]
    image: PathBuf,

    /// VOC XML files or directories describing the boxes.
    #[arg(long, required = true)]
    annotations: Vec<PathBuf>,

    /// Crop format ('png', 'jpeg', 'webp', 'gif' or 'bmp').
    #[arg(long, default_value = "png")]
    format: String,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Write individual files instead of a zip archive.
    #[arg(long)]
    no_archive: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Image to render.
    #[arg(long)]
    image: PathBuf,

    /// VOC XML files or directories describing the boxes.
    #[arg(long)]
    annotations: Vec<PathBuf>,

    /// Viewport width in CSS pixels.
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Viewport height in CSS pixels.
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Device pixel ratio of the output.
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,

    /// Index of a box to draw as selected.
    #[arg(long)]
    select: Option<usize>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(clap::Args)]
struct ReplayArgs {
    /// Directory containing the images.
    #[arg(long)]
    images: PathBuf,

    /// Event script (JSON).
    #[arg(long)]
    script: PathBuf,

    /// VOC XML files or directories to import before replaying.
    #[arg(long)]
    annotations: Vec<PathBuf>,

    /// Export the resulting annotations to this directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write individual files instead of a zip archive.
    #[arg(long)]
    no_archive: bool,

    /// Render the final frame to this PNG (label tags carry no text).
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Output format for the replay log ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(clap::Args)]
struct InspectArgs {
    /// Directory containing the images.
    #[arg(long)]
    images: PathBuf,

    /// VOC XML files or directories to import.
    #[arg(long, required = true)]
    annotations: Vec<PathBuf>,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(raw: &str) -> Result<Self, BoxlabelError> {
        match raw {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(BoxlabelError::UnsupportedFormat(format!(
                "output '{other}' (supported: text, json)"
            ))),
        }
    }
}

/// Run the boxlabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), BoxlabelError> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Some(Commands::Export(args)) => run_export(&config, args),
        Some(Commands::Crops(args)) => run_crops(&config, args),
        Some(Commands::Render(args)) => run_render(config, args),
        Some(Commands::Replay(args)) => run_replay(config, args),
        Some(Commands::Inspect(args)) => run_inspect(&config, args),
        None => {
            println!("boxlabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Bounding-box annotation core with YOLO and Pascal VOC export.");
            println!();
            println!("Run 'boxlabel --help' for usage information.");
            Ok(())
        }
    }
}

/// Store for `images` with every image's dimensions read from disk.
fn load_store(
    config: &EditorConfig,
    source: &mut DirectorySource,
    images: &[String],
    annotations: &[PathBuf],
) -> (AnnotationStore, Report) {
    let mut store = AnnotationStore::new(KnownClasses::with_vocabulary(&config.classes));
    for image in images {
        match source.dimensions(image) {
            Ok(size) => store.set_dimensions(image, size),
            Err(err) => log::warn!("{err}"),
        }
    }
    let report = import::import_voc_files(&mut store, images, annotations);
    (store, report)
}

fn image_file_name(path: &Path) -> Result<String, BoxlabelError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| BoxlabelError::DecodeFailure {
            path: path.to_path_buf(),
            message: "path has no usable file name".to_string(),
        })
}

fn open_rgba(path: &Path) -> Result<image::RgbaImage, BoxlabelError> {
    let image = image::open(path).map_err(|source| BoxlabelError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

fn print_reports(format: OutputFormat, reports: &[&Report]) -> Result<(), BoxlabelError> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(reports).map_err(std::io::Error::other)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for report in reports {
                print!("{report}");
            }
        }
    }
    Ok(())
}

fn run_export(config: &EditorConfig, args: ExportArgs) -> Result<(), BoxlabelError> {
    let format = OutputFormat::parse(&args.output)?;
    let mut source = DirectorySource::new(&args.images);
    let images = source.list()?;
    let (store, import_report) = load_store(config, &mut source, &images, &args.annotations);

    let (bundle, export_report) = export::export_annotations(&store)?;
    let destination = Destination::choose(&args.out, ANNOTATIONS_ARCHIVE, !args.no_archive);
    let written = destination.write(&bundle)?;

    print_reports(format, &[&import_report, &export_report])?;
    if format == OutputFormat::Text {
        println!("Annotations saved to {}", written.display());
    }
    Ok(())
}

fn run_crops(config: &EditorConfig, args: CropsArgs) -> Result<(), BoxlabelError> {
    let format = OutputFormat::parse(&args.output)?;
    let crop_format: CropFormat = args.format.parse()?;
    let name = image_file_name(&args.image)?;
    let image = open_rgba(&args.image)?;

    let mut store = AnnotationStore::new(KnownClasses::with_vocabulary(&config.classes));
    store.set_dimensions(&name, ImageSize::new(image.width(), image.height()));
    let images = [name.clone()];
    let import_report = import::import_voc_files(&mut store, &images, &args.annotations);

    let (bundle, crop_report) =
        export::export_crops(&name, &image, store.boxes(&name), crop_format)?;
    let archive = export::crops_archive_name(&name);
    let destination = Destination::choose(&args.out, &archive, !args.no_archive);
    let written = destination.write(&bundle)?;

    print_reports(format, &[&import_report, &crop_report])?;
    if format == OutputFormat::Text {
        println!("Crops saved to {}", written.display());
    }
    Ok(())
}

fn run_render(config: EditorConfig, args: RenderArgs) -> Result<(), BoxlabelError> {
    let name = image_file_name(&args.image)?;
    let image = open_rgba(&args.image)?;
    let viewport = ViewportSize::new(args.width, args.height);
    if !viewport.is_usable() {
        return Err(BoxlabelError::ConfigInvalid(format!(
            "viewport {}x{} must be positive",
            args.width, args.height
        )));
    }

    let mut session = Session::new(config);
    session.set_viewport(viewport);
    if let Some(ticket) = session.open_images([name.as_str()]) {
        session.complete_load(&ticket, ImageSize::new(image.width(), image.height()));
    }
    if !args.annotations.is_empty() {
        let report = session.import_annotations(&args.annotations);
        log::info!("{report}");
    }
    if let Some(index) = args.select {
        session.select_box(index)?;
    }

    let mut surface = PixmapSurface::new(viewport, args.dpr, Some(&image))?;
    session.frame().paint(&mut surface);
    save_png(surface, &args.out)?;
    println!("Rendered {name} to {}", args.out.display());
    Ok(())
}

fn save_png(surface: PixmapSurface, path: &Path) -> Result<(), BoxlabelError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    surface
        .into_image()
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| BoxlabelError::ImageEncode {
            name: path.display().to_string(),
            source,
        })
}

fn run_replay(config: EditorConfig, args: ReplayArgs) -> Result<(), BoxlabelError> {
    let format = OutputFormat::parse(&args.output)?;
    let script = script::Script::load(&args.script)?;
    let mut source = DirectorySource::new(&args.images);
    let images = source.list()?;

    let mut session = Session::new(config);
    session.open_images(images.iter().map(String::as_str));
    for image in &images {
        if let Ok(size) = source.dimensions(image) {
            session.record_dimensions(image, size);
        }
    }
    script::fulfil_pending(&mut session, &mut source);
    if !args.annotations.is_empty() {
        let report = session.import_annotations(&args.annotations);
        log::info!("{report}");
    }

    let base_dir = args
        .script
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let replay_log = script::replay(&mut session, &script, &mut source, &base_dir);

    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ReplayOutput<'a> {
                log: &'a script::ReplayLog,
                annotations: Vec<String>,
            }
            let output = ReplayOutput {
                log: &replay_log,
                annotations: session.annotation_list(),
            };
            let json = serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            println!("Replayed {} step(s), {} error(s)", replay_log.steps, replay_log.errors);
            println!("Status: {}", session.status().message);
            for line in session.annotation_list() {
                println!("  {line}");
            }
        }
    }

    if let Some(out) = &args.out {
        let (bundle, report) = export::export_annotations(session.store())?;
        let destination = Destination::choose(out, ANNOTATIONS_ARCHIVE, !args.no_archive);
        let written = destination.write(&bundle)?;
        if format == OutputFormat::Text {
            print!("{report}");
            println!("Annotations saved to {}", written.display());
        }
    }

    if let Some(snapshot) = &args.snapshot {
        let current = session
            .current_image()
            .map(|name| source.path_of(name))
            .map(|path| open_rgba(&path))
            .transpose()?;
        let mut surface = PixmapSurface::new(session.viewport(), 1.0, current.as_ref())?;
        session.frame().paint(&mut surface);
        save_png(surface, snapshot)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct InspectImage<'a> {
    name: &'a str,
    size: Option<ImageSize>,
    boxes: &'a [ir::Annotation],
}

fn run_inspect(config: &EditorConfig, args: InspectArgs) -> Result<(), BoxlabelError> {
    let format = OutputFormat::parse(&args.output)?;
    let mut source = DirectorySource::new(&args.images);
    let images = source.list()?;
    let (store, report) = load_store(config, &mut source, &images, &args.annotations);

    let listing: Vec<InspectImage<'_>> = images
        .iter()
        .map(|name| InspectImage {
            name,
            size: store.dimensions(name),
            boxes: store.boxes(name),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct InspectOutput<'a> {
                images: &'a [InspectImage<'a>],
                classes: Vec<String>,
                report: &'a Report,
            }
            let output = InspectOutput {
                images: &listing,
                classes: store.classes().sorted(),
                report: &report,
            };
            let json = serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for entry in &listing {
                let size = entry
                    .size
                    .map(|s| format!("{}x{}", s.width, s.height))
                    .unwrap_or_else(|| "?x?".to_string());
                println!("{} ({size}): {} box(es)", entry.name, entry.boxes.len());
                for (index, annotation) in entry.boxes.iter().enumerate() {
                    println!("  {index}: {}", annotation.summary());
                }
            }
            print!("{report}");
        }
    }
    Ok(())
}
