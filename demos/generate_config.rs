//! Generate the default cropping configuration file
//!
//! Creates a JSON config with all default parameters, ready for tuning

use slab_crop::CropConfig;
use std::{env, path::Path, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <output_config.json>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} tuning/default.json", args[0]);
        process::exit(1);
    }

    let output_path = Path::new(&args[1]);

    // Create parent directory if needed
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            process::exit(1);
        }
    }

    let config = CropConfig::default();

    match config.to_json_file(output_path) {
        Ok(()) => {
            eprintln!("Configuration saved to {}", output_path.display());
            eprintln!();
            eprintln!("Config summary:");
            eprintln!(
                "  Candidates: aspect {:.4} ± {:.2}, area {:.0}%-{:.0}%, {}-{} vertices",
                config.candidates.card_aspect_ratio,
                config.candidates.aspect_ratio_tolerance,
                config.candidates.min_area_ratio * 100.0,
                config.candidates.max_area_ratio * 100.0,
                config.candidates.min_vertices,
                config.candidates.max_vertices
            );
            eprintln!(
                "  Segmentation: dark below luminance {:.0}, blur {}px",
                config.segmentation.dark_mean_luminance, config.segmentation.blur_kernel_size
            );
            eprintln!(
                "  Extraction: margin {:.0}%, label strip {:.0}%",
                config.extraction.margin_inset_percent * 100.0,
                config.orientation.strip_fraction * 100.0
            );
            eprintln!(
                "  Service: max upload {}MB, timeout {}s",
                config.service.max_image_size_mb, config.service.crop_timeout_seconds
            );
        }
        Err(e) => {
            eprintln!("Error saving config: {}", e);
            process::exit(1);
        }
    }
}
