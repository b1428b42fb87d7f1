use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::ImageFormat;
use pixel_atlas_core::image_data::{ImageBuffer, Layout};
use pixel_atlas_core::{
    size_to_json, write_json_layout, AtlasConfig, Endian, PixelAtlasError, PixelFormat,
    TextureAtlas, TextureFilter,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "pixel-atlas",
    about = "Convert images between pixel formats and pack them into texture atlases",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every pixel format with its channel/byte layout
    Formats,
    /// Convert one image to a pixel format and write the raw bytes plus a JSON sidecar
    Convert(ConvertArgs),
    /// Pack a folder of images into atlas pages
    Pack(PackArgs),
}

#[derive(Parser, Debug, Clone)]
struct ConvertArgs {
    /// Input image
    input: PathBuf,
    /// Target pixel format, e.g. RGBA_F16
    #[arg(short, long, default_value = "RGBA_U8")]
    format: String,
    /// Row alignment in bytes (1, 2, 4, 8)
    #[arg(long, default_value_t = 1)]
    alignment: u8,
    /// Byte order of the written samples: msb | lsb (default: native)
    #[arg(long)]
    endian: Option<String>,
    /// Output file for the raw bytes; `<out>.json` receives the image info
    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png/.json)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (present keys override the CLI values)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Atlas
    /// Number of pages
    #[arg(long, default_value_t = 1, help_heading = "Atlas")]
    pages: u8,
    /// Page edge length in pixels
    #[arg(long, default_value_t = 2048, help_heading = "Atlas")]
    size: u16,
    /// Page pixel format
    #[arg(long, default_value = "RGBA_U8", help_heading = "Atlas")]
    format: String,
    /// Sampling filter recorded in the layout: linear | nearest
    #[arg(long, default_value = "linear", help_heading = "Atlas")]
    filter: String,
    /// Extruded border around each tile
    #[arg(long, default_value_t = 1, help_heading = "Atlas")]
    border: u8,

    // Export
    /// Print the merged configuration (after CLI/YAML) in the given format and exit
    #[arg(long, value_enum, help_heading = "Export")]
    print_config: Option<ConfigFormat>,
    /// Dry run: pack and report but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    fn render(self, cfg: &AtlasConfig) -> anyhow::Result<String> {
        Ok(match self {
            ConfigFormat::Json => serde_json::to_string_pretty(cfg)?,
            ConfigFormat::Yaml => serde_yaml::to_string(cfg)?,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Formats => run_formats(),
        Commands::Convert(args) => run_convert(args),
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
    }
}

fn run_formats() -> anyhow::Result<()> {
    println!(
        "{:<10} {:>8} {:>5} {:>6} {:>10} {:>10}",
        "format", "channels", "bits", "bytes", "gl_format", "gl_type"
    );
    for f in PixelFormat::ALL.iter().filter(|f| !f.is_none()) {
        println!(
            "{:<10} {:>8} {:>5} {:>6} {:>#10x} {:>#10x}",
            f.name(),
            f.channel_count(),
            f.bit_depth(),
            f.byte_count(),
            f.gl_format(),
            f.gl_type()
        );
    }
    Ok(())
}

fn run_convert(args: &ConvertArgs) -> anyhow::Result<()> {
    let format: PixelFormat = args.format.parse()?;
    let endian = match &args.endian {
        Some(e) => e.parse::<Endian>()?,
        None => Endian::native(),
    };

    let t0 = Instant::now();
    let src = ImageBuffer::open(&args.input)
        .with_context(|| format!("decode {}", args.input.display()))?;
    let layout = Layout::default()
        .with_alignment(args.alignment)
        .with_endian(endian);
    let out = src.convert_with_layout(format, layout)?;

    fs::write(&args.out, out.data()).with_context(|| format!("write {}", args.out.display()))?;
    let sidecar_path = sidecar_path(&args.out);
    let sidecar = json!({
        "info": out.info(),
        "size": size_to_json(&out.size()),
        "source_format": src.format(),
        "plugin_name": src.plugin_name(),
        "tags": out.tags(),
        "gl_format": out.gl_format(),
        "gl_type": out.gl_type(),
        "pixel_byte_count": out.pixel_byte_count(),
        "scanline_byte_count": out.scanline_byte_count(),
        "data_byte_count": out.data_byte_count(),
    });
    fs::write(&sidecar_path, serde_json::to_string_pretty(&sidecar)?)
        .with_context(|| format!("write {}", sidecar_path.display()))?;
    info!(
        from = %src.format(),
        to = %format,
        bytes = out.data_byte_count(),
        elapsed = ?t0.elapsed(),
        "converted image"
    );
    Ok(())
}

fn sidecar_path(out: &Path) -> PathBuf {
    let mut s = out.as_os_str().to_owned();
    s.push(".json");
    PathBuf::from(s)
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = AtlasConfig::builder()
        .texture_count(cli.pages)
        .texture_size(cli.size)
        .format(cli.format.parse()?)
        .filter(cli.filter.parse()?)
        .border(cli.border)
        .build();

    // Config file keys override CLI values
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        cfg = y.into_atlas_config(cfg);
    }
    cfg.validate()?;

    if let Some(fmt) = cli.print_config {
        println!("{}", fmt.render(&cfg)?);
        return Ok(());
    }

    let filter = PathFilter::new(&cli.include, &cli.exclude)?;
    let paths = filter.collect(&cli.input);
    debug!(count = paths.len(), root = %cli.input.display(), "collected input paths");
    let mut tiles = load_images_with_progress(&cli.input, &paths, show_progress)?;
    info!(count = tiles.len(), "loaded input images");

    // Large tiles first leaves smaller leftovers for the rest
    tiles.sort_by(|a, b| {
        b.size()
            .area()
            .cmp(&a.size().area())
            .then_with(|| a.info().name.cmp(&b.info().name))
    });

    let t0 = Instant::now();
    let mut atlas = TextureAtlas::new(cfg)?;
    let mut skipped = 0usize;
    for tile in &tiles {
        match atlas.add_item(tile) {
            Ok(_) => {}
            Err(PixelAtlasError::AtlasFull { width, height }) => {
                warn!(name = %tile.info().name, width, height, "tile does not fit; skipped");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    let pack_time = t0.elapsed();

    let layout = atlas.layout();
    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
        let used_pages: Vec<u8> = (0..atlas.texture_count())
            .filter(|&i| !atlas.is_page_empty(i))
            .collect();
        for &i in &used_pages {
            let png_path = if atlas.texture_count() == 1 {
                cli.out_dir.join(format!("{}.png", cli.name))
            } else {
                cli.out_dir.join(format!("{}_{}.png", cli.name, i))
            };
            if let Some(page) = atlas.page(i) {
                page.to_rgba_image()?
                    .save(&png_path)
                    .with_context(|| format!("write {}", png_path.display()))?;
            }
        }
        let json_path = cli.out_dir.join(format!("{}.json", cli.name));
        write_json_layout(&json_path, &layout)
            .with_context(|| format!("write {}", json_path.display()))?;
        info!(?json_path, pages = used_pages.len(), "atlas written");
    }

    let stats = atlas.stats();
    info!(
        placed = stats.items,
        skipped,
        elapsed = ?pack_time,
        "{}",
        stats.summary()
    );
    println!(
        "placed {} of {} tiles, {:.2}% used",
        stats.items,
        tiles.len(),
        atlas.percentage_used() * 100.0
    );
    Ok(())
}

/// Include/exclude glob matching over forward-slash paths.
#[derive(Debug, Default)]
struct PathFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl PathFilter {
    fn new(include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            include: build_globset(include)?,
            exclude: build_globset(exclude)?,
        })
    }

    fn accepts(&self, p: &Path) -> bool {
        let s = p.to_string_lossy().replace('\\', "/");
        let excluded = self.exclude.as_ref().is_some_and(|g| g.is_match(&s));
        let included = self.include.as_ref().is_none_or(|g| g.is_match(&s));
        included && !excluded
    }

    /// Image files under `root` (or `root` itself), in file-name order.
    fn collect(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|p| is_image(p) && self.accepts(p))
            .collect()
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {pat:?}"))?);
    }
    Ok(Some(b.build()?))
}

fn is_image(p: &Path) -> bool {
    ImageFormat::from_path(p).is_ok_and(|f| f.reading_enabled())
}

/// Layout key for a tile: its path relative to the input root.
fn tile_name(root: &Path, p: &Path) -> String {
    let rel = p.strip_prefix(root).ok().filter(|r| !r.as_os_str().is_empty());
    rel.unwrap_or(p).to_string_lossy().replace('\\', "/")
}

fn load_images_with_progress(
    root: &Path,
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<Vec<ImageBuffer>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match ImageBuffer::open(p) {
            Ok(mut buf) => {
                buf.set_name(tile_name(root, p));
                list.push(buf);
            }
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

/// `RUST_LOG` wins over the -q/-v flags when set.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    texture_count: Option<u8>,
    texture_size: Option<u16>,
    format: Option<PixelFormat>,
    filter: Option<TextureFilter>,
    border: Option<u8>,
    merge_on_release: Option<bool>,
}

impl YamlConfig {
    fn into_atlas_config(self, mut cfg: AtlasConfig) -> AtlasConfig {
        if let Some(v) = self.texture_count {
            cfg.texture_count = v;
        }
        if let Some(v) = self.texture_size {
            cfg.texture_size = v;
        }
        if let Some(v) = self.format {
            cfg.format = v;
        }
        if let Some(v) = self.filter {
            cfg.filter = v;
        }
        if let Some(v) = self.border {
            cfg.border = v;
        }
        if let Some(v) = self.merge_on_release {
            cfg.merge_on_release = v;
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_keys_override_cli_values() {
        let cli = AtlasConfig::builder().texture_size(512).border(2).build();
        let y: YamlConfig = serde_yaml::from_str("texture_size: 1024\nformat: RGBA_F16\n").unwrap();
        let cfg = y.into_atlas_config(cli);
        assert_eq!(cfg.texture_size, 1024);
        assert_eq!(cfg.format, PixelFormat::RgbaF16);
        assert_eq!(cfg.border, 2);
    }

    #[test]
    fn sidecar_appends_json_extension() {
        assert_eq!(sidecar_path(Path::new("out/img.raw")), PathBuf::from("out/img.raw.json"));
    }

    #[test]
    fn path_filter_applies_include_then_exclude() {
        let all = PathFilter::new(&[], &[]).unwrap();
        assert!(all.accepts(Path::new("a/b.png")));

        let f = PathFilter::new(&["**/*.png".into()], &["**/skip/**".into()]).unwrap();
        assert!(f.accepts(Path::new("a/b.png")));
        assert!(!f.accepts(Path::new("a/b.jpg")));
        assert!(!f.accepts(Path::new("a/skip/b.png")));
        assert!(PathFilter::new(&["[".into()], &[]).is_err());
    }

    #[test]
    fn collect_walks_sorted_and_accepts_single_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.png", "notes.txt", "sub/c.jpg"] {
            let p = dir.path().join(name);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(&p, b"").unwrap();
        }
        let f = PathFilter::default();
        let names: Vec<String> = f
            .collect(dir.path())
            .iter()
            .map(|p| tile_name(dir.path(), p))
            .collect();
        assert_eq!(names, ["a.png", "b.png", "sub/c.jpg"]);

        let single = dir.path().join("a.png");
        assert_eq!(f.collect(&single), vec![single.clone()]);
        assert_eq!(tile_name(&single, &single), single.to_string_lossy().replace('\\', "/"));
    }

    #[test]
    fn print_config_takes_a_format() {
        let cli = Cli::try_parse_from(["pixel-atlas", "pack", "dir", "--print-config", "yaml"]).unwrap();
        let Commands::Pack(args) = cli.command else {
            panic!("expected pack");
        };
        assert_eq!(args.print_config, Some(ConfigFormat::Yaml));

        let cli = Cli::try_parse_from(["pixel-atlas", "pack", "dir"]).unwrap();
        let Commands::Pack(args) = cli.command else {
            panic!("expected pack");
        };
        assert_eq!(args.print_config, None);

        assert!(Cli::try_parse_from(["pixel-atlas", "pack", "dir", "--print-config", "toml"]).is_err());
        assert!(Cli::try_parse_from(["pixel-atlas", "pack", "dir", "--print-config"]).is_err());

        let cfg = AtlasConfig::builder().texture_size(512).build();
        let yaml = ConfigFormat::Yaml.render(&cfg).unwrap();
        assert!(yaml.contains("texture_size: 512"));
        let json: serde_json::Value = serde_json::from_str(&ConfigFormat::Json.render(&cfg).unwrap()).unwrap();
        assert_eq!(json["texture_size"], 512);
    }
}
