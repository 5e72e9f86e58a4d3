use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tissuemask_core::channels::ChannelImage;
use tissuemask_core::config::MaskConfig;
use tissuemask_core::io::{
    list_image_sources, load_channel_stack, save_mask, save_mask_metadata, save_qc,
    write_id_mapping,
};
use tissuemask_core::process::{generate_mask, MaskOptions, RunStats};
use tissuemask_core::threshold::{ThresholdMethod, ThresholdRecord};
use tracing::{info, warn};

use crate::summary::{print_run_stats, print_run_summary};

/// Run configuration: the mask transform plus where to read and write.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    /// Folder holding one sub-directory of channel planes per image.
    pub input_folder: PathBuf,
    pub mask_folder: PathBuf,
    pub metadata_folder: Option<PathBuf>,
    pub qc_folder: Option<PathBuf>,
    /// CSV mapping `wsi_<i>` ids to source paths. Without it, directory
    /// names are used as ids.
    pub id_mapping_file: Option<PathBuf>,
    #[serde(flatten)]
    pub mask: MaskConfig,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&contents).context("Invalid run config")?;
        config.mask.validate()?;
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ThresholdMethodArg {
    Otsu,
    Gmm,
}

impl From<ThresholdMethodArg> for ThresholdMethod {
    fn from(arg: ThresholdMethodArg) -> Self {
        match arg {
            ThresholdMethodArg::Otsu => ThresholdMethod::Otsu,
            ThresholdMethodArg::Gmm => ThresholdMethod::Gmm,
        }
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// Run config file (TOML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Override the configured threshold method
    #[arg(long, value_enum)]
    pub threshold_method: Option<ThresholdMethodArg>,

    /// Keep small foreground objects
    #[arg(long)]
    pub keep_small_objects: bool,

    /// Leave small holes unfilled
    #[arg(long)]
    pub keep_small_holes: bool,

    /// Threshold raw intensities without preprocessing
    #[arg(long)]
    pub no_preprocess: bool,

    /// Do not write per-image metadata CSVs
    #[arg(long)]
    pub no_metadata: bool,

    /// Do not render QC figures
    #[arg(long)]
    pub no_qc: bool,
}

/// Output locations resolved for this run.
struct Outputs<'a> {
    masks: &'a Path,
    metadata: Option<&'a Path>,
    qc: Option<&'a Path>,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = RunConfig::load(&args.config)?;

    let mut options = MaskOptions::for_config(&config.mask);
    if let Some(method) = args.threshold_method {
        options.method = method.into();
    }
    options.preprocess = !args.no_preprocess;
    options.remove_small_objects = !args.keep_small_objects;
    options.fill_small_holes = !args.keep_small_holes;

    let sources = list_image_sources(&config.input_folder).with_context(|| {
        format!("Failed to list input folder {}", config.input_folder.display())
    })?;
    if sources.is_empty() {
        anyhow::bail!("No image directories found in {}", config.input_folder.display());
    }

    let jobs: Vec<(String, PathBuf)> = match config.id_mapping_file {
        Some(ref mapping) => write_id_mapping(&sources, mapping)
            .with_context(|| format!("Failed to write id mapping {}", mapping.display()))?,
        None => sources
            .iter()
            .map(|p| (dir_name(p), p.clone()))
            .collect(),
    };

    let want_qc = !args.no_qc && !config.mask.tissue_mask.rgb_markers.is_empty();
    if !args.no_qc && !want_qc {
        warn!("tissue_mask.rgb_markers not set, skipping QC figures");
    }
    let outputs = Outputs {
        masks: &config.mask_folder,
        metadata: config.metadata_folder.as_deref().filter(|_| !args.no_metadata),
        qc: config.qc_folder.as_deref().filter(|_| want_qc),
    };
    for dir in [Some(outputs.masks), outputs.metadata, outputs.qc]
        .into_iter()
        .flatten()
    {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    print_run_summary(&config, &options, jobs.len());

    let pb = ProgressBar::new(jobs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:12} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Masking");

    let stats = jobs
        .par_iter()
        .map(|(id, source)| {
            let result = process_image(id, source, &config, &options, &outputs);
            if let Err(ref e) = result {
                warn!(image = %id, source = %source.display(), "Mask generation failed: {e:#}");
            }
            pb.inc(1);
            result.ok()
        })
        .fold(RunStats::default, |stats, record| stats.accumulate(record.as_ref()))
        .reduce(RunStats::default, RunStats::merge);

    pb.finish_with_message("Done");
    print_run_stats(&stats);

    if stats.succeeded == 0 {
        anyhow::bail!("No masks were generated");
    }
    Ok(())
}

fn process_image(
    id: &str,
    source: &Path,
    config: &RunConfig,
    options: &MaskOptions,
    outputs: &Outputs<'_>,
) -> Result<ThresholdRecord> {
    let image = load_channel_stack(source)
        .with_context(|| format!("Failed to load {}", source.display()))?;
    write_outputs(id, &image, config, options, outputs)
}

/// Mask one image and write its outputs. The QC figure is rendered before
/// anything touches disk.
fn write_outputs(
    id: &str,
    image: &ChannelImage,
    config: &RunConfig,
    options: &MaskOptions,
    outputs: &Outputs<'_>,
) -> Result<ThresholdRecord> {
    let outcome = generate_mask(image, &config.mask, options)?;
    let figure = match outputs.qc {
        Some(_) => Some(outcome.render_qc(&config.mask.tissue_mask.rgb_markers, id)?),
        None => None,
    };

    let mask_path = outputs.masks.join(format!("{id}_mask.tiff"));
    save_mask(&outcome.mask, &mask_path)
        .with_context(|| format!("Failed to write {}", mask_path.display()))?;

    if let Some(dir) = outputs.metadata {
        let path = dir.join(format!("{id}_metadata.csv"));
        save_mask_metadata(&outcome.record(), &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if let (Some(dir), Some(figure)) = (outputs.qc, figure) {
        let path = dir.join(format!("{id}_qc.png"));
        save_qc(&figure, &path).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(image = %id, caption = %figure.caption.join(" | "), "{}", figure.title);
    }

    Ok(outcome.threshold)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
