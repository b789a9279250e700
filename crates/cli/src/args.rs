//! Command-line interface definitions.

use clap::Parser;
use std::path::PathBuf;

use tracery_core::{
    ColorMode, ConversionRequest, CurveMode, Hierarchy, OutputFormat, ParameterOverrides,
};

/// Convert a raster image to SVG vector graphics
#[derive(Parser, Debug, Clone)]
#[command(name = "tracery-convert", version, about, long_about = None)]
#[command(after_help = "Examples:\n  \
    tracery-convert image.png                     # writes image.svg\n  \
    tracery-convert logo.png --preset logo -o out.svg\n  \
    tracery-convert photo.jpg --color-precision 8 --filter-speckle 2\n  \
    tracery-convert icon.png --format png")]
pub struct Cli {
    /// Input image file (PNG, JPEG, WebP)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output file path (default: input name with the output extension)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Preset (default, logo, photo, line-art, sketch, minimal)
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Color mode: color or binary
    #[arg(long, value_parser = parse_color_mode)]
    pub colormode: Option<ColorMode>,

    /// How overlapping shapes are layered: stacked or cutout
    #[arg(long, value_parser = parse_hierarchy)]
    pub hierarchical: Option<Hierarchy>,

    /// Curve fitting mode: spline, polygon or none
    #[arg(long, value_parser = parse_curve_mode)]
    pub mode: Option<CurveMode>,

    /// Discard patches smaller than this many pixels
    #[arg(long)]
    pub filter_speckle: Option<u32>,

    /// Significant bits per RGB channel (1-8)
    #[arg(long)]
    pub color_precision: Option<u8>,

    /// Color difference between gradient layers
    #[arg(long)]
    pub layer_difference: Option<u32>,

    /// Minimum angle in degrees to be considered a corner (0-180)
    #[arg(long)]
    pub corner_threshold: Option<u32>,

    /// Minimum segment length
    #[arg(long)]
    pub length_threshold: Option<f64>,

    /// Maximum curve fitting iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Minimum angle displacement in degrees to splice a spline (0-180)
    #[arg(long)]
    pub splice_threshold: Option<u32>,

    /// Decimal places in path coordinates
    #[arg(long)]
    pub path_precision: Option<u32>,

    /// Output format: svg or png
    #[arg(short, long, default_value = "svg", value_parser = parse_format)]
    pub format: OutputFormat,

    /// Skip SVG optimization
    #[arg(long)]
    pub no_optimize: bool,

    /// Config file path (default: defaults plus TRACERY_* environment)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn overrides(&self) -> ParameterOverrides {
        ParameterOverrides {
            color_mode: self.colormode,
            hierarchical: self.hierarchical,
            curve_mode: self.mode,
            filter_speckle: self.filter_speckle,
            color_precision: self.color_precision,
            layer_difference: self.layer_difference,
            corner_threshold: self.corner_threshold,
            length_threshold: self.length_threshold,
            max_iterations: self.max_iterations,
            splice_threshold: self.splice_threshold,
            path_precision: self.path_precision,
        }
    }

    /// Builds the single conversion request for `bytes` read from the input.
    pub fn to_request(&self, bytes: Vec<u8>) -> ConversionRequest {
        let name = self
            .input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        let mut request = ConversionRequest::upload(name, bytes)
            .with_overrides(self.overrides())
            .with_format(self.format);
        if let Some(preset) = &self.preset {
            request = request.with_preset(preset.as_str());
        }
        if self.no_optimize {
            request = request.with_optimize(false);
        }
        request
    }

    /// Explicit `-o`, else the input path with the format's extension.
    /// A derived path never overwrites the input.
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let extension = self.format.as_str();
        let derived = self.input.with_extension(extension);
        if derived != self.input {
            return derived;
        }
        let stem = self
            .input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.input
            .with_file_name(format!("{}-traced.{}", stem, extension))
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn parse_color_mode(s: &str) -> Result<ColorMode, String> {
    ColorMode::parse(s).ok_or_else(|| "expected color or binary".to_string())
}

fn parse_hierarchy(s: &str) -> Result<Hierarchy, String> {
    Hierarchy::parse(s).ok_or_else(|| "expected stacked or cutout".to_string())
}

fn parse_curve_mode(s: &str) -> Result<CurveMode, String> {
    CurveMode::parse(s).ok_or_else(|| "expected spline, polygon or none".to_string())
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(s).ok_or_else(|| "expected svg or png".to_string())
}
