use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use photo_impose::{
    Gap, ImpositionOptions, LengthUnit, Margins, MoveDirection, Orientation, PaperSize,
    RasterFormat,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "phimp", about = "Photo sheet imposition", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Export queue directory (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub queue_dir: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the slot grid and paper usage for a configuration
    Layout {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Number of photos to plan sheets for
        #[arg(long, default_value = "0")]
        images: usize,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Place photos on sheets and write a PDF
    Impose {
        /// Input images (PNG or JPEG)
        #[arg(required = true, num_args = 1..)]
        images: Vec<PathBuf>,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Also append the result to the export queue
        #[arg(long)]
        enqueue: bool,

        /// Queue entry name (defaults to the output file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Manage the export queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum QueueAction {
    /// List queued jobs in print order
    List,
    /// Append an existing PDF
    Add {
        input: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove a job by id
    Remove { id: String },
    /// Move a job one position up or down
    Move {
        id: String,
        #[arg(value_enum)]
        direction: DirectionArg,
    },
    /// Remove every job
    Clear,
    /// Merge every job into one PDF
    Export {
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Layout settings shared by `layout` and `impose`.
///
/// Values start from `--config` (or the defaults) and any flag given here
/// overrides them. Lengths are read in `--unit`.
#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Options file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective options to this file
    #[arg(long)]
    pub save_config: Option<PathBuf>,

    /// Unit for every length flag
    #[arg(long, default_value = "mm", value_enum)]
    pub unit: UnitArg,

    /// Paper preset
    #[arg(long, value_enum)]
    pub paper: Option<PaperArg>,

    /// Paper orientation (with --paper)
    #[arg(long, default_value = "landscape", value_enum)]
    pub orientation: OrientationArg,

    #[arg(long)]
    pub paper_width: Option<f32>,

    #[arg(long)]
    pub paper_height: Option<f32>,

    /// Paper margin (uniform on all sides)
    #[arg(long)]
    pub margin: Option<f32>,

    /// Gap between slots (both directions)
    #[arg(long)]
    pub gap: Option<f32>,

    #[arg(long)]
    pub slot_width: Option<f32>,

    #[arg(long)]
    pub slot_height: Option<f32>,

    /// Inset between a slot's cut line and its image
    #[arg(long)]
    pub slot_margin: Option<f32>,

    /// Working raster resolution
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Encode working rasters as JPEG at this quality instead of PNG
    #[arg(long)]
    pub jpeg_quality: Option<u8>,

    /// Leave out the cut marks
    #[arg(long)]
    pub no_marks: bool,

    #[arg(long)]
    pub customer: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Footer date (defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    /// Leave out the footer line
    #[arg(long)]
    pub no_footer: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum UnitArg {
    Mm,
    Cm,
    In,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OrientationArg {
    Portrait,
    Landscape,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DirectionArg {
    Up,
    Down,
}

impl From<UnitArg> for LengthUnit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Mm => Self::Millimeters,
            UnitArg::Cm => Self::Centimeters,
            UnitArg::In => Self::Inches,
        }
    }
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => Self::A3,
            PaperArg::A4 => Self::A4,
            PaperArg::A5 => Self::A5,
            PaperArg::Letter => Self::Letter,
            PaperArg::Legal => Self::Legal,
            PaperArg::Tabloid => Self::Tabloid,
        }
    }
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
        }
    }
}

impl From<DirectionArg> for MoveDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Up => Self::Up,
            DirectionArg::Down => Self::Down,
        }
    }
}

impl LayoutArgs {
    /// Apply the flags on top of `options`
    pub fn apply(&self, mut options: ImpositionOptions) -> ImpositionOptions {
        let unit = LengthUnit::from(self.unit);
        let mm = |value: f32| unit.to_mm(value);

        if let Some(paper) = self.paper {
            let (w, h) = PaperSize::from(paper).dimensions_with_orientation(self.orientation.into());
            options.paper.width_mm = w;
            options.paper.height_mm = h;
        }
        if let Some(w) = self.paper_width {
            options.paper.width_mm = mm(w);
        }
        if let Some(h) = self.paper_height {
            options.paper.height_mm = mm(h);
        }
        if let Some(margin) = self.margin {
            options.paper.margins = Margins::uniform(mm(margin));
        }
        if let Some(gap) = self.gap {
            options.paper.gap = Gap::uniform(mm(gap));
        }

        if let Some(w) = self.slot_width {
            options.slot.width_mm = mm(w);
        }
        if let Some(h) = self.slot_height {
            options.slot.height_mm = mm(h);
        }
        if let Some(margin) = self.slot_margin {
            options.slot.margins = Margins::uniform(mm(margin));
        }

        if let Some(dpi) = self.dpi {
            options.dpi = dpi;
        }
        if let Some(quality) = self.jpeg_quality {
            options.raster_format = RasterFormat::Jpeg { quality };
        }
        if self.no_marks {
            options.marks.enabled = false;
        }

        if let Some(customer) = &self.customer {
            options.meta.customer_name = customer.clone();
        }
        if let Some(description) = &self.description {
            options.meta.description = description.clone();
        }
        if let Some(date) = &self.date {
            options.meta.date = date.clone();
        }
        if self.no_footer {
            options.display_meta = false;
        }

        options
    }

    /// Load, override, validate and optionally save the options
    pub async fn resolve(&self) -> Result<ImpositionOptions> {
        let base = match &self.config {
            Some(path) => ImpositionOptions::load(path)
                .await
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ImpositionOptions::default(),
        };

        let options = self.apply(base);
        options.validate()?;

        if let Some(path) = &self.save_config {
            options
                .save(path)
                .await
                .with_context(|| format!("Failed to save config {}", path.display()))?;
            log::info!("Saved options to {}", path.display());
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_args(extra: &[&str]) -> LayoutArgs {
        let mut argv = vec!["phimp", "layout"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Layout { layout, .. } => layout,
            _ => panic!("Expected Layout command"),
        }
    }

    #[test]
    fn test_parse_impose() {
        let cli = Cli::try_parse_from([
            "phimp", "-vv", "impose", "a.jpg", "b.png", "-o", "out.pdf", "--enqueue",
            "--slot-width", "35",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        if let Commands::Impose {
            images,
            output,
            enqueue,
            layout,
            ..
        } = cli.command
        {
            assert_eq!(images.len(), 2);
            assert_eq!(output, PathBuf::from("out.pdf"));
            assert!(enqueue);
            assert_eq!(layout.slot_width, Some(35.0));
        } else {
            panic!("Expected Impose command");
        }
    }

    #[test]
    fn test_impose_requires_images() {
        assert!(Cli::try_parse_from(["phimp", "impose", "-o", "out.pdf"]).is_err());
    }

    #[test]
    fn test_parse_queue_move() {
        let cli =
            Cli::try_parse_from(["phimp", "queue", "move", "abc", "down", "--queue-dir", "/tmp/q"])
                .unwrap();
        assert_eq!(cli.queue_dir, Some(PathBuf::from("/tmp/q")));
        match cli.command {
            Commands::Queue {
                action: QueueAction::Move { id, direction },
            } => {
                assert_eq!(id, "abc");
                assert!(matches!(direction, DirectionArg::Down));
            }
            _ => panic!("Expected queue move"),
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let options = layout_args(&["--unit", "cm", "--slot-width", "3.5", "--margin", "1"])
            .apply(ImpositionOptions::default());
        assert_eq!(options.slot.width_mm, 35.0);
        assert_eq!(options.slot.height_mm, 40.0);
        assert_eq!(options.paper.margins, Margins::uniform(10.0));
    }

    #[test]
    fn test_paper_preset_with_orientation() {
        let options = layout_args(&["--paper", "a4", "--orientation", "portrait"])
            .apply(ImpositionOptions::default());
        assert_eq!((options.paper.width_mm, options.paper.height_mm), (210.0, 297.0));
    }

    #[test]
    fn test_jpeg_and_footer_flags() {
        let options = layout_args(&["--jpeg-quality", "80", "--no-footer", "--no-marks"])
            .apply(ImpositionOptions::default());
        assert_eq!(options.raster_format, RasterFormat::Jpeg { quality: 80 });
        assert!(!options.display_meta);
        assert!(!options.marks.enabled);
    }
}
