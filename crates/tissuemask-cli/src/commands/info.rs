use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tissuemask_core::io::load_channel_stack;

#[derive(Args)]
pub struct InfoArgs {
    /// Image directory (one plane file per channel)
    pub dir: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let image = load_channel_stack(&args.dir)
        .with_context(|| format!("Failed to load {}", args.dir.display()))?;

    println!("Image:       {}", args.dir.display());
    println!("Channels:    {}", image.channel_count());
    println!("Dimensions:  {}x{}", image.width(), image.height());
    println!();
    println!("  {:<16}{:>12}{:>12}{:>12}", "Channel", "Min", "Max", "Mean");

    for (label, plane) in image.channels().iter().zip(image.planes()) {
        let (min, max, sum) = plane.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY, 0.0f64),
            |(lo, hi, s), &v| (lo.min(v), hi.max(v), s + v as f64),
        );
        let mean = sum / plane.len().max(1) as f64;
        println!("  {:<16}{:>12.3}{:>12.3}{:>12.3}", label, min, max, mean);
    }

    Ok(())
}
