use anyhow::{Context, Result};
use clap::Parser;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::rect::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

const PAGE_WIDTH: u32 = 800;
const PAGE_HEIGHT: u32 = 600;
const PAPER: u8 = 200;
const INK: u8 = 30;

/// Render a skewed, noisy page of fake text lines for exercising the cleanup pipeline
#[derive(Parser, Debug)]
#[command(name = "generate_synthetic_page")]
#[command(version, about, long_about = None)]
struct Settings {
    /// PNG file to write
    #[arg(default_value = "synthetic_page.png")]
    output: PathBuf,

    /// Seed for the layout and noise generator
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Page rotation in degrees
    #[arg(long = "angle", default_value_t = 4.0, allow_negative_numbers = true)]
    angle_degrees: f32,

    /// Share of pixels turned into salt-and-pepper specks (0 to 1)
    #[arg(long = "specks", default_value_t = 0.01, value_parser = parse_ratio)]
    speck_ratio: f64,
}

fn parse_ratio(value: &str) -> Result<f64, String> {
    let ratio: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(format!("{} is not between 0 and 1", ratio))
    }
}

/// Draws rows of word-sized ink bars, the rough texture of printed text.
fn draw_text_lines(page: &mut GrayImage, rng: &mut StdRng) {
    let margin = 80;
    let mut y = margin;
    while y + 16 < PAGE_HEIGHT as i32 - margin {
        let mut x = margin;
        while x < PAGE_WIDTH as i32 - margin {
            let word_width = rng.random_range(18..70);
            let width = word_width.min(PAGE_WIDTH as i32 - margin - x) as u32;
            if width > 0 {
                draw_filled_rect_mut(page, Rect::at(x, y).of_size(width, 12), Luma([INK]));
            }
            x += word_width + rng.random_range(8..16);
        }
        y += rng.random_range(26..34);
    }
}

/// Paper grain plus salt-and-pepper specks.
fn add_noise(page: &mut GrayImage, rng: &mut StdRng, speck_ratio: f64) {
    for pixel in page.pixels_mut() {
        if rng.random_bool(speck_ratio) {
            pixel[0] = if rng.random_bool(0.5) { 0 } else { 255 };
        } else {
            let grain: i16 = rng.random_range(-18..=18);
            pixel[0] = (pixel[0] as i16 + grain).clamp(0, 255) as u8;
        }
    }
}

fn main() -> Result<()> {
    let settings = Settings::parse();
    let mut rng = StdRng::seed_from_u64(settings.seed);

    let mut page = GrayImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Luma([PAPER]));
    draw_text_lines(&mut page, &mut rng);

    let mut page = rotate_about_center(
        &page,
        settings.angle_degrees.to_radians(),
        Interpolation::Bilinear,
        Luma([PAPER]),
    );
    add_noise(&mut page, &mut rng, settings.speck_ratio);

    page.save(&settings.output)
        .with_context(|| format!("Failed to write {}", settings.output.display()))?;

    println!(
        "Synthetic page written to {} ({}x{}, seed={}, angle={:.1}°, specks={:.1}%)",
        settings.output.display(),
        PAGE_WIDTH,
        PAGE_HEIGHT,
        settings.seed,
        settings.angle_degrees,
        settings.speck_ratio * 100.0
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["generate_synthetic_page"]).unwrap();
        assert_eq!(settings.output, PathBuf::from("synthetic_page.png"));
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.angle_degrees, 4.0);
        assert_eq!(settings.speck_ratio, 0.01);
    }

    #[test]
    fn test_all_options() {
        let settings = Settings::try_parse_from([
            "generate_synthetic_page",
            "page.png",
            "--seed",
            "7",
            "--angle",
            "-2.5",
            "--specks",
            "0.2",
        ])
        .unwrap();
        assert_eq!(settings.output, PathBuf::from("page.png"));
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.angle_degrees, -2.5);
        assert_eq!(settings.speck_ratio, 0.2);
    }

    #[test]
    fn test_speck_ratio_range_checked() {
        assert!(Settings::try_parse_from(["generate_synthetic_page", "--specks", "1.5"]).is_err());
        assert!(Settings::try_parse_from(["generate_synthetic_page", "--specks", "many"]).is_err());
        assert!(Settings::try_parse_from(["generate_synthetic_page", "--seed", "-1"]).is_err());
    }

    #[test]
    fn test_generated_page_is_deterministic() {
        let render = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut page = GrayImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Luma([PAPER]));
            draw_text_lines(&mut page, &mut rng);
            add_noise(&mut page, &mut rng, 0.01);
            page
        };
        assert_eq!(render(3), render(3));
        assert!(render(3).pixels().any(|p| p[0] < 100));
    }
}
