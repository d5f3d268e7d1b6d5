//! Attendance book splitter
//!
//! Reads an attendance-book PDF, shows the per-worker preview and writes one
//! PDF per worker into a ZIP archive.

use anyhow::{Context, Result};
use attendance_core::{
    write_archive, NameCaseStyle, PageSource, PdfDocument, SegmentationMode, SplitPlan,
    Splitter, SplitterConfig, DEFAULT_ARCHIVE_NAME,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod report;

#[derive(Parser, Debug)]
#[command(name = "attendance-split")]
#[command(version, about = "Split attendance-book PDFs into one named file per worker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract fields and print the preview listing without writing files
    Preview {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Extract fields and write the ZIP archive
    Split {
        #[command(flatten)]
        common: CommonArgs,

        /// Output archive path
        #[arg(short, long, default_value = DEFAULT_ARCHIVE_NAME)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input PDF
    input: PathBuf,

    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Page grouping: paired or single-stride
    #[arg(long)]
    mode: Option<SegmentationMode>,

    /// First page (0-indexed) used by single-stride mode
    #[arg(long)]
    stride_offset: Option<usize>,

    /// Identification code to ignore (e.g. the employer's); repeatable
    #[arg(long = "exclude-id")]
    exclude_ids: Vec<String>,

    /// Skip records whose identification code cannot be found
    #[arg(long)]
    strict: bool,

    /// Name case in filenames: upper or title
    #[arg(long)]
    name_case: Option<NameCaseStyle>,

    /// Print the listing as JSON
    #[arg(long)]
    json: bool,
}

impl CommonArgs {
    fn load_config(&self) -> Result<SplitterConfig> {
        let mut config = match &self.config {
            Some(path) => SplitterConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SplitterConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.segmentation_mode = mode;
        }
        if let Some(offset) = self.stride_offset {
            config.stride_offset = offset;
        }
        config
            .employer_id_exclusion_list
            .extend(self.exclude_ids.iter().cloned());
        if self.strict {
            config.strict_mode = true;
        }
        if let Some(style) = self.name_case {
            config.name_case_style = style;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the listing; logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Preview { common } => {
            let (_, _, plan) = plan_document(&common)?;
            report::print(&plan, common.json)?;
        }
        Command::Split { common, output } => {
            let (splitter, document, plan) = plan_document(&common)?;
            let archive = splitter.build_archive(&document, &plan)?;
            write_archive(&archive, &output)
                .with_context(|| format!("writing {}", output.display()))?;

            report::print(&plan, common.json)?;
            tracing::info!(
                "Wrote {} files to {}",
                plan.records.len(),
                output.display()
            );
        }
    }

    Ok(())
}

fn plan_document(common: &CommonArgs) -> Result<(Splitter, PdfDocument, SplitPlan)> {
    let config = common.load_config()?;
    let splitter = Splitter::new(config)?;
    let document = load_document(&common.input)?;

    tracing::info!(
        "{} has {} pages",
        common.input.display(),
        document.page_count()
    );

    let plan = splitter.plan(&document);
    Ok((splitter, document, plan))
}

fn load_document(path: &Path) -> Result<PdfDocument> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let document =
        PdfDocument::load(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    Ok(document)
}
