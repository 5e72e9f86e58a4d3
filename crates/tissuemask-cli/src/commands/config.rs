use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tissuemask_core::config::MaskConfig;

use super::run::RunConfig;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save a full default RunConfig as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let config = RunConfig {
        input_folder: PathBuf::from("images"),
        mask_folder: PathBuf::from("output/masks"),
        metadata_folder: Some(PathBuf::from("output/metadata")),
        qc_folder: Some(PathBuf::from("output/qc")),
        id_mapping_file: Some(PathBuf::from("output/id_mapping.csv")),
        mask: MaskConfig::default(),
    };
    let toml_str = toml::to_string_pretty(&config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
