use console::Style;
use tissuemask_core::preprocess::PreprocessingPipeline;
use tissuemask_core::process::{MaskOptions, RunStats};

use crate::commands::run::RunConfig;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub fn print_run_summary(config: &RunConfig, options: &MaskOptions, image_count: usize) {
    let s = Styles::new();
    let mask = &config.mask.tissue_mask;

    println!();
    println!("  {}", s.title.apply_to("Tissue Mask Run"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(15)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input_folder.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Masks"),
        s.path.apply_to(config.mask_folder.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Images"),
        s.value.apply_to(image_count)
    );
    println!();

    // Preprocessing
    if !options.preprocess {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Preprocessing"),
            s.disabled.apply_to("disabled")
        );
    } else {
        println!("  {}", s.header.apply_to("Preprocessing"));
        match PreprocessingPipeline::from_config(&config.mask.preprocessing) {
            Ok(pipeline) => {
                for (i, step) in pipeline.steps().iter().enumerate() {
                    if step.enabled {
                        println!(
                            "    {}. {}",
                            s.label.apply_to(i + 1),
                            s.value.apply_to(&step.stage)
                        );
                    } else {
                        println!(
                            "    {}. {}",
                            s.label.apply_to(i + 1),
                            s.disabled.apply_to(format!("{} (off)", step.stage))
                        );
                    }
                }
            }
            Err(e) => println!("    {}", s.disabled.apply_to(e)),
        }
    }
    println!();

    // Thresholding
    println!("  {}", s.header.apply_to("Threshold"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(options.method)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Floor"),
        s.value.apply_to(mask.min_tissue_threshold)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Seed"),
        s.value.apply_to(config.mask.seed)
    );
    println!();

    // Cleanup
    println!("  {}", s.header.apply_to("Cleanup"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Objects"),
        s.value.apply_to(format!(
            "{} (< {} px)",
            on_off(options.remove_small_objects),
            mask.small_object_threshold
        ))
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Holes"),
        s.value.apply_to(format!(
            "{} (< {} px)",
            on_off(options.fill_small_holes),
            mask.small_hole_threshold
        ))
    );
    println!();
}

pub fn print_run_stats(stats: &RunStats) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Summary"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Attempted"),
        s.value.apply_to(stats.attempted)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Succeeded"),
        s.method.apply_to(stats.succeeded)
    );
    if stats.failed > 0 {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Failed"),
            s.disabled.apply_to(stats.failed)
        );
    }
    if stats.gmm_fallbacks > 0 {
        println!(
            "    {:<14}{}",
            s.label.apply_to("GMM fallback"),
            s.disabled.apply_to(stats.gmm_fallbacks)
        );
    }
    println!();
}
