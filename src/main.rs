use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use docnorm::config::AppConfig;
use docnorm::document::{DocumentProcessor, PrecomputedText};
use docnorm::error_correction::DocumentProfile;
use docnorm::errors::error_logging;
use docnorm::observability;
use tracing::info;

/// Clean a scanned page for OCR and optionally correct its recognized text
#[derive(Parser, Debug)]
#[command(name = "docnorm")]
#[command(version, about, long_about = None)]
struct CliArgs {
    /// Page image to clean (any format the image codec reads)
    input: PathBuf,

    /// Where to write the cleaned PNG (default: <input>.clean.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Raw OCR text for this page; corrected text goes to <text>.corrected.txt
    #[arg(short, long)]
    text: Option<PathBuf>,

    /// Document profile: general, official, academic or news
    #[arg(short, long)]
    profile: Option<DocumentProfile>,

    /// Run every stage on the calling thread
    #[arg(long)]
    sequential: bool,
}

/// `page.jpg` -> `page.clean.png`
fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("clean.png")
}

/// `raw.txt` -> `raw.corrected.txt`
fn corrected_text_path(raw: &Path) -> PathBuf {
    raw.with_extension("corrected.txt")
}

fn read_logged(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        error_logging::log_filesystem_error(&e, "read", path.to_str());
        anyhow::anyhow!("Failed to read {}: {}", path.display(), e)
    })
}

fn write_logged(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|e| {
        error_logging::log_filesystem_error(&e, "write", path.to_str());
        anyhow::anyhow!("Failed to write {}: {}", path.display(), e)
    })
}

fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(profile) = args.profile {
        config.correction.profile = profile;
    }
    if args.sequential {
        config.pipeline.parallel = false;
        config.correction.parallel = false;
    }
    config.logging.validate()?;

    observability::init_tracing(&config.logging)?;
    if let Err(e) = config.validate() {
        error_logging::log_config_error(&e, "correction", "validate");
        return Err(e.into());
    }
    info!("{}", config.summary());

    let bytes = read_logged(&args.input)?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    let progress = |label: &str| info!(phase = label, "Processing");

    let processor = DocumentProcessor::from_config(&config);

    let cleaned = match &args.text {
        Some(raw_path) => {
            let raw_text = String::from_utf8(read_logged(raw_path)?)
                .with_context(|| format!("{} is not UTF-8 text", raw_path.display()))?;
            let recognizer = PrecomputedText::new(raw_text);
            let output = processor.process(&bytes, &recognizer, progress)?;

            let corrected_path = corrected_text_path(raw_path);
            write_logged(&corrected_path, output.corrected_text.as_bytes())?;

            let correction = &output.report.correction;
            println!(
                "Corrected text written to {} ({} glyph fixes, {} word corrections, {} consistency fixes)",
                corrected_path.display(),
                correction.normalized_glyphs,
                correction.contextual_changes + correction.merged_changes,
                correction.consistency_changes
            );
            for replacement in &correction.replacements {
                println!("  {:?}: {} -> {}", replacement.stage, replacement.from, replacement.to);
            }
            output.cleaned
        }
        None => processor.pipeline().process_bytes(&bytes, progress)?,
    };

    cleaned.to_dynamic().save(&output_path).map_err(|e| {
        error_logging::log_filesystem_error(&e, "save_image", output_path.to_str());
        anyhow::anyhow!("Failed to write {}: {}", output_path.display(), e)
    })?;
    println!(
        "Cleaned page written to {} ({}x{})",
        output_path.display(),
        cleaned.width(),
        cleaned.height()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let parsed = CliArgs::try_parse_from([
            "docnorm",
            "scan.jpg",
            "--output",
            "out.png",
            "--text",
            "raw.txt",
            "--profile",
            "official",
            "--sequential",
        ])
        .unwrap();

        assert_eq!(parsed.input, PathBuf::from("scan.jpg"));
        assert_eq!(parsed.output, Some(PathBuf::from("out.png")));
        assert_eq!(parsed.text, Some(PathBuf::from("raw.txt")));
        assert_eq!(parsed.profile, Some(DocumentProfile::Official));
        assert!(parsed.sequential);
    }

    #[test]
    fn test_short_flags_and_defaults() {
        let parsed = CliArgs::try_parse_from(["docnorm", "page.png", "-p", "News"]).unwrap();
        assert_eq!(parsed.profile, Some(DocumentProfile::News));
        assert_eq!(parsed.output, None);
        assert_eq!(parsed.text, None);
        assert!(!parsed.sequential);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(CliArgs::try_parse_from(["docnorm"]).is_err());
        assert!(CliArgs::try_parse_from(["docnorm", "a.png", "--profile", "legal"]).is_err());
        assert!(CliArgs::try_parse_from(["docnorm", "a.png", "--bogus"]).is_err());
        assert!(CliArgs::try_parse_from(["docnorm", "a.png", "b.png"]).is_err());
        assert!(CliArgs::try_parse_from(["docnorm", "a.png", "--output"]).is_err());
    }

    #[test]
    fn test_derived_paths() {
        assert_eq!(default_output_path(Path::new("dir/page.jpg")), PathBuf::from("dir/page.clean.png"));
        assert_eq!(corrected_text_path(Path::new("raw.txt")), PathBuf::from("raw.corrected.txt"));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
