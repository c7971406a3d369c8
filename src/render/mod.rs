//! Summary image rendering
//!
//! Draws a fixed 800x420 PNG with:
//! - a title band
//! - the total country count and the refresh timestamp
//! - the top countries by estimated GDP, or a placeholder line

mod text;

pub use text::{draw_text, glyph, truncate};

use chrono::{DateTime, Utc};
use image::{ImageFormat, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::model::CountryRecord;
use text::{fill_rect, text_width, GLYPH_SIZE};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 420;

const MARGIN: u32 = 32;
const TITLE_BAND: u32 = 72;
const TITLE_SCALE: u32 = 3;
const BODY_SCALE: u32 = 2;
const LINE_HEIGHT: u32 = 30;

const BACKGROUND: Rgb<u8> = Rgb([248, 249, 251]);
const BAND: Rgb<u8> = Rgb([31, 52, 89]);
const TITLE: Rgb<u8> = Rgb([255, 255, 255]);
const BODY: Rgb<u8> = Rgb([33, 37, 41]);
const MUTED: Rgb<u8> = Rgb([108, 117, 125]);

pub const PLACEHOLDER: &str = "No GDP data available";

/// One ranked line of the summary
#[derive(Debug, Clone, PartialEq)]
pub struct TopEntry {
    pub name: String,
    pub estimated_gdp: f64,
}

/// Everything the image shows
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_countries: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub top: Vec<TopEntry>,
}

impl Summary {
    /// Keep the records that carry an estimate, in the order given
    pub fn new(
        total_countries: u64,
        last_refreshed_at: Option<DateTime<Utc>>,
        top: &[CountryRecord],
    ) -> Self {
        Self {
            total_countries,
            last_refreshed_at,
            top: top
                .iter()
                .filter_map(|r| {
                    r.estimated_gdp.map(|gdp| TopEntry {
                        name: r.name.clone(),
                        estimated_gdp: gdp,
                    })
                })
                .collect(),
        }
    }

    /// Text lines below the title, in drawing order
    pub fn lines(&self) -> Vec<String> {
        let refreshed = self
            .last_refreshed_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string());

        let mut lines = vec![
            format!("Total countries: {}", self.total_countries),
            format!("Last refreshed: {}", refreshed),
            String::new(),
            "Top 5 countries by estimated GDP:".to_string(),
        ];

        if self.top.is_empty() {
            lines.push(PLACEHOLDER.to_string());
        } else {
            let max_chars = ((WIDTH - 2 * MARGIN) / (GLYPH_SIZE * BODY_SCALE)) as usize;
            for (rank, entry) in self.top.iter().take(5).enumerate() {
                let line = format!(
                    "{}. {} - {}",
                    rank + 1,
                    entry.name,
                    format_amount(entry.estimated_gdp)
                );
                lines.push(truncate(&line, max_chars));
            }
        }

        lines
    }
}

/// Render the summary into a new image
pub fn render_summary(summary: &Summary) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    fill_rect(&mut img, 0, 0, WIDTH, TITLE_BAND, BAND);
    let title = "Country Summary";
    let title_x = (WIDTH - text_width(title, TITLE_SCALE)) / 2;
    let title_y = (TITLE_BAND - GLYPH_SIZE * TITLE_SCALE) / 2;
    draw_text(&mut img, title_x, title_y, title, TITLE_SCALE, TITLE);

    let mut y = TITLE_BAND + MARGIN;
    for line in summary.lines() {
        let color = if line == PLACEHOLDER { MUTED } else { BODY };
        draw_text(&mut img, MARGIN, y, &line, BODY_SCALE, color);
        y += LINE_HEIGHT;
    }

    img
}

/// Render and replace the image at `path`. The PNG is written to a sibling
/// temp file first so readers never see a partial file.
pub fn write_summary(path: &Path, summary: &Summary) -> Result<()> {
    stage_summary(path, summary)?.publish()
}

/// Render into the sibling temp file without touching `path`. The staged
/// file is removed if it is dropped unpublished.
pub fn stage_summary(path: &Path, summary: &Summary) -> Result<StagedImage> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staged = StagedImage {
        tmp: path.with_extension("png.tmp"),
        target: path.to_path_buf(),
        entries: summary.top.len(),
        published: false,
    };
    render_summary(summary).save_with_format(&staged.tmp, ImageFormat::Png)?;

    Ok(staged)
}

/// A rendered summary waiting to be moved over its target
#[derive(Debug)]
pub struct StagedImage {
    tmp: PathBuf,
    target: PathBuf,
    entries: usize,
    published: bool,
}

impl StagedImage {
    pub fn publish(mut self) -> Result<()> {
        fs::rename(&self.tmp, &self.target)?;
        self.published = true;

        info!(path = ?self.target, entries = self.entries, "summary image written");
        Ok(())
    }
}

impl Drop for StagedImage {
    fn drop(&mut self) {
        if !self.published {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// Two decimals with thousands separators
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary(top: Vec<TopEntry>) -> Summary {
        Summary {
            total_countries: 250,
            last_refreshed_at: Some(Utc.with_ymd_and_hms(2025, 10, 22, 18, 0, 0).unwrap()),
            top,
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-1000.0), "-1,000.00");
    }

    #[test]
    fn test_lines_with_entries() {
        let lines = summary(vec![
            TopEntry {
                name: "United States of America".into(),
                estimated_gdp: 25_000_000_000.0,
            },
            TopEntry {
                name: "China".into(),
                estimated_gdp: 18_000_000_000.0,
            },
        ])
        .lines();

        assert_eq!(lines[0], "Total countries: 250");
        assert_eq!(lines[1], "Last refreshed: 2025-10-22 18:00:00 UTC");
        assert_eq!(lines[4], "1. United States of America - 25,000,000,000.00");
        assert_eq!(lines[5], "2. China - 18,000,000,000.00");
        assert!(!lines.iter().any(|l| l == PLACEHOLDER));
    }

    #[test]
    fn test_lines_placeholder_when_empty() {
        let lines = Summary {
            total_countries: 0,
            last_refreshed_at: None,
            top: vec![],
        }
        .lines();

        assert_eq!(lines[1], "Last refreshed: never");
        assert_eq!(lines.last().map(String::as_str), Some(PLACEHOLDER));
    }

    #[test]
    fn test_render_has_fixed_size() {
        let img = render_summary(&summary(vec![]));
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
        assert_eq!(*img.get_pixel(0, 0), BAND);
        assert_eq!(*img.get_pixel(WIDTH - 1, HEIGHT - 1), BACKGROUND);
    }

    #[test]
    fn test_write_summary_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("summary.png");

        write_summary(&path, &summary(vec![])).unwrap();
        let first = fs::read(&path).unwrap();
        assert_eq!(&first[..8], b"\x89PNG\r\n\x1a\n");

        write_summary(
            &path,
            &summary(vec![TopEntry {
                name: "Chad".into(),
                estimated_gdp: 1.0,
            }]),
        )
        .unwrap();
        assert_ne!(fs::read(&path).unwrap(), first);
        assert!(!path.with_extension("png.tmp").exists());
    }

    #[test]
    fn test_unpublished_stage_leaves_target_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.png");
        write_summary(&path, &summary(vec![])).unwrap();
        let before = fs::read(&path).unwrap();

        let staged = stage_summary(
            &path,
            &summary(vec![TopEntry {
                name: "Chad".into(),
                estimated_gdp: 1.0,
            }]),
        )
        .unwrap();
        assert!(path.with_extension("png.tmp").exists());
        drop(staged);

        assert!(!path.with_extension("png.tmp").exists());
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_summary_drops_records_without_estimate() {
        let record = |name: &str, gdp: Option<f64>| CountryRecord {
            id: 1,
            name: name.into(),
            name_lower: name.to_lowercase(),
            capital: None,
            region: None,
            population: None,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: gdp,
            flag_url: None,
            last_refreshed_at: Utc::now(),
        };
        let s = Summary::new(2, None, &[record("A", Some(5.0)), record("B", None)]);
        assert_eq!(s.top.len(), 1);
        assert_eq!(s.top[0].name, "A");
    }
}
