use anyhow::{anyhow, Context, Result};
use clap::Parser;
use console::style;
use std::time::Instant;

use textoverlay_processor::cli::Args;
use textoverlay_processor::pipeline::{OverlayConfig, OverlayEngine};
use textoverlay_processor::style::validate_color;
use textoverlay_processor::utils::{create_progress_bar, error_println, format_duration};
use textoverlay_processor::{LayoutPolicy, ScoringWeights};

fn main() -> Result<()> {
    let start_time = Instant::now();
    let args = Args::parse();

    if args.text.trim().is_empty() {
        return Err(anyhow!("--text must not be empty"));
    }
    if let Some(opacity) = args.opacity {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(anyhow!("--opacity must be between 0.0 and 1.0, got {}", opacity));
        }
    }

    let preferred_position = args.parse_position().map_err(|e| anyhow!(e))?;
    let custom_box = args.parse_custom_box().map_err(|e| anyhow!(e))?;
    let behind_subject = args.parse_behind_subject().map_err(|e| anyhow!(e))?;
    let text_color = match &args.color {
        Some(name) => Some(validate_color(name)?),
        None => None,
    };
    let overrides = args.style_overrides(text_color).map_err(|e| anyhow!(e))?;

    let config = OverlayConfig {
        text: args.text.clone(),
        font_spec: args.font.clone(),
        preferred_position,
        custom_box,
        saliency_map: args.saliency_map.clone(),
        weights: ScoringWeights::default(),
        policy: LayoutPolicy::default(),
        base_font_size: args.font_size,
        behind_subject,
        style_file: args.style_file.clone(),
        overrides,
        json_only: args.json,
        extensions: args.parse_extensions(),
        parallel_jobs: args.jobs,
        verbose: args.verbose,
    };

    if config.verbose {
        println!("{}", style("Configuration:").bold());
        println!("  Text: {:?}", config.text);
        println!("  Preferred position: {:?}", preferred_position);
        println!("  Custom box: {:?}", custom_box);
        println!("  Behind subject: {:?}", config.behind_subject);
        println!("  Parallel jobs: {}", config.parallel_jobs);
        println!("  Extensions: {:?}", config.extensions);
        println!(
            "  Mode: {}",
            if config.json_only { "analysis (JSON)" } else { "render" }
        );
        println!();
    }

    std::fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let engine = OverlayEngine::new(config)?;

    let image_files = engine.discover_images(&args.input_paths)?;
    if image_files.is_empty() {
        println!(
            "{}",
            style("No images found with specified extensions").red()
        );
        return Ok(());
    }
    println!(
        "{}",
        style(format!("Found {} image(s)", image_files.len())).cyan()
    );

    let progress = create_progress_bar(image_files.len() as u64);
    progress.set_message("Processing images");

    let results = engine.process_batch(&image_files, &args.output_dir, |count| {
        progress.set_position(count as u64);
    });

    progress.finish_with_message("done");
    println!();

    let successful = results.iter().filter(|r| r.is_ok()).count();
    let failed = results.len() - successful;

    println!("{}", style("Results Summary:").bold().green());
    println!("  Successfully processed: {}", style(successful).green());
    if failed > 0 {
        println!("  Failed: {}", style(failed).red());
    }
    println!("  Total time: {}", format_duration(start_time.elapsed()));

    for result in &results {
        match result {
            Ok(outcome) => {
                if args.verbose {
                    println!(
                        "  {} -> {} ({}@{}, {:?}, score {:.3})",
                        outcome.input_path.display(),
                        outcome.output_path.display(),
                        outcome.position,
                        outcome.font_size,
                        outcome.orientation,
                        outcome.score,
                    );
                }
            }
            Err(e) => error_println(&format!("{:#}", e)),
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} image(s) failed", failed));
    }
    Ok(())
}
