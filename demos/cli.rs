//! Command-line interface for slab_crop
//!
//! Crops one photo, writes the PNG next to it (or to `--output`) and prints
//! the JSON response without the image payload.

use slab_crop::{CardCropper, CropConfig, CropResult};
use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config_path = None;
    let mut output_path = None;
    let mut image_path_arg = None;

    // Parse arguments
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "--output" | "-o" if i + 1 >= args.len() => {
                eprintln!("Error: {} needs a value", args[i]);
                process::exit(1);
            }
            "--config" => {
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--output" | "-o" => {
                output_path = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--help" | "-h" => {
                print_help(&args[0]);
                process::exit(0);
            }
            arg if !arg.starts_with("--") => {
                if image_path_arg.is_none() {
                    image_path_arg = Some(PathBuf::from(arg));
                } else {
                    eprintln!("Error: Multiple image paths provided");
                    process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                eprintln!("Use --help for usage information");
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(image_path) = image_path_arg else {
        print_help(&args[0]);
        process::exit(1);
    };

    let config = match config_path {
        Some(path) => match CropConfig::from_json_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config file: {}", e);
                process::exit(1);
            }
        },
        None => CropConfig::default(),
    };
    let cropper = match CardCropper::with_config(config) {
        Ok(cropper) => cropper,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let bytes = match fs::read(&image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", image_path.display(), e);
            process::exit(1);
        }
    };

    let result = cropper.crop_card_within(&bytes, cropper.config().service.timeout());
    print_result(&result);

    if !result.success {
        process::exit(1);
    }

    let output = output_path.unwrap_or_else(|| default_output(&image_path));
    if let Some(image) = &result.image {
        match fs::write(&output, &image.bytes) {
            Ok(()) => eprintln!("Saved crop to {}", output.display()),
            Err(e) => {
                eprintln!("Error writing {}: {}", output.display(), e);
                process::exit(1);
            }
        }
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("card");
    input.with_file_name(format!("{}_cropped.png", stem))
}

fn print_help(program_name: &str) {
    eprintln!("Usage: {} [OPTIONS] <image_path>", program_name);
    eprintln!();
    eprintln!("Detect and crop a trading card or graded slab from a photo.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config FILE    Load tuning from a JSON config (see generate_config)");
    eprintln!("  --output, -o     Where to write the PNG (default: <image>_cropped.png)");
    eprintln!("  --help, -h       Show this help message");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG=debug   Show per-candidate scoring");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} slab.jpg", program_name);
    eprintln!("  {} --config tuned.json -o out.png slab.jpg", program_name);
}

fn print_result(result: &CropResult) {
    // JSON to stdout for programmatic use, without the base64 payload
    let mut response = result.to_response();
    response.cropped_image = None;
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing result: {}", e),
    }

    // Summary to stderr for human reading
    eprintln!();
    eprintln!("Crop Summary:");
    eprintln!("  {}", result.message);
    if let Some(detection) = &result.detection {
        eprintln!("  Background: {:?}", detection.scene);
        eprintln!("  Screenshot: {}", detection.is_screenshot);
        eprintln!(
            "  Box: x={}, y={}, {}x{}",
            detection.bbox.x, detection.bbox.y, detection.bbox.width, detection.bbox.height
        );
    }
    if let Some(confidence) = result.confidence {
        eprintln!("  Confidence: {:.1}%", confidence * 100.0);
        if result.success && confidence < 0.7 {
            eprintln!("  Warning: Low confidence result. Check the crop before using it.");
        }
    }
    if let Some((w, h)) = result.cropped_size {
        eprintln!("  Cropped size: {}x{}", w, h);
    }
}
