//! Batch CLI for slab_crop with JSON configuration
//!
//! Crops every image in a directory and optionally stores the results with
//! the local-directory uploader.

use slab_crop::{CardCropper, CropConfig, LocalDirUploader, StorageUploader};
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

    if args.len() < 3 {
        print_help(&args[0]);
        process::exit(1);
    }

    let input_path = Path::new(&args[1]);
    let output_path = PathBuf::from(&args[2]);

    // Load configuration
    let config = match args.get(3) {
        Some(path) => match CropConfig::from_json_file(Path::new(path)) {
            Ok(cfg) => {
                eprintln!("Loaded configuration from {}", path);
                cfg
            }
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

    let uploader = LocalDirUploader::new(&output_path);
    if !uploader.check_connection() {
        eprintln!("Error: output directory {} is not writable", output_path.display());
        process::exit(1);
    }

    // Find all image files in input directory
    let image_files = match find_image_files(input_path) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error finding image files: {}", e);
            process::exit(1);
        }
    };

    if image_files.is_empty() {
        eprintln!("No image files found in {}", input_path.display());
        process::exit(1);
    }

    eprintln!("Found {} image files to process", image_files.len());
    eprintln!();

    let user = env::var("SLAB_CROP_USER").ok();
    let mut success_count = 0;

    for (i, image_path) in image_files.iter().enumerate() {
        let filename = image_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");

        eprint!("[{}/{}] Processing {}... ", i + 1, image_files.len(), filename);

        let bytes = match fs::read(image_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("✗ {}", e);
                continue;
            }
        };

        let result = cropper.crop_and_store(&bytes, &uploader, user.as_deref(), None);
        if result.success {
            success_count += 1;
            match (&result.upload, &result.upload_error) {
                (Some(receipt), _) => eprintln!("✓ {}", receipt.object_path),
                (None, Some(err)) => eprintln!("✓ (not stored: {})", err),
                (None, None) => eprintln!("✓"),
            }
        } else {
            eprintln!("✗ {}", result.message);
        }

        if env::var("VERBOSE").is_ok() {
            eprintln!(
                "  → Confidence: {:.1}%, size {:?} → {:?}",
                result.confidence.unwrap_or(0.0) * 100.0,
                result.original_size,
                result.cropped_size
            );
        }
    }

    eprintln!();
    eprintln!("{}/{} images successfully cropped", success_count, image_files.len());
    eprintln!("Crops saved to: {}", output_path.display());

    if success_count < image_files.len() {
        process::exit(1);
    }
}

fn print_help(program_name: &str) {
    eprintln!("Usage: {} <input_dir> <output_dir> [config.json]", program_name);
    eprintln!();
    eprintln!("Batch crop cards and slabs from every image in a directory.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  input_dir      Directory (or single file) of JPEG/PNG photos");
    eprintln!("  output_dir     Crops are stored below user/YYYY-MM-DD/");
    eprintln!("  config.json    Optional tuning (see generate_config)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  VERBOSE=1          Print detailed results for each image");
    eprintln!("  SLAB_CROP_USER=id  User folder for stored crops (default: admin)");
    eprintln!("  RUST_LOG=info      Pipeline logging");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} photos/ crops/", program_name);
    eprintln!("  VERBOSE=1 {} photos/ crops/ tuned.json", program_name);
}

fn find_image_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    if dir.is_file() {
        return Ok(vec![dir.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png"))
            .unwrap_or(false);
        if path.is_file() && is_image {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
