//! Remote art fetching and luminance rasterization.
//!
//! `ascii <url>` pulls a remote resource and shows it in the transcript.
//! Plain-text resources are displayed as-is; ASCII portable graymaps (`P2`)
//! are rasterized through the luminance ramp. Binary image formats would
//! need a pixel decoder and are reported as a conversion failure rather
//! than half-rendered.

use std::fmt;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ART_BYTES: usize = 64 * 1024;

/// Dark-to-light glyph ramp used when rasterizing a luminance grid.
const LUMA_RAMP: &[u8] = b"@%#*+=-:. ";

#[derive(Debug)]
pub enum ArtError {
    Network(String),
    Conversion(String),
    TooLarge(usize),
}

impl fmt::Display for ArtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtError::Network(msg) => write!(f, "fetch failed: {msg}"),
            ArtError::Conversion(msg) => write!(f, "conversion failed: {msg}"),
            ArtError::TooLarge(size) => write!(f, "resource too large ({size} bytes)"),
        }
    }
}

impl std::error::Error for ArtError {}

fn looks_like_image_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    [".png", ".jpg", ".jpeg", ".gif", ".webp", ".bmp"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

/// Fetch a remote resource as displayable text art.
pub async fn fetch_text_art(client: &reqwest::Client, url: &str) -> Result<String, ArtError> {
    if looks_like_image_url(url) {
        return Err(ArtError::Conversion(
            "image sources cannot be rasterized here; link a plain-text art file".into(),
        ));
    }

    let response = client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| ArtError::Network(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ArtError::Network(format!("HTTP {}", response.status())));
    }
    let body = response
        .text()
        .await
        .map_err(|e| ArtError::Conversion(e.to_string()))?;
    if body.len() > MAX_ART_BYTES {
        return Err(ArtError::TooLarge(body.len()));
    }
    if let Some(fields) = body.strip_prefix("P2") {
        if fields.starts_with(|c: char| c.is_ascii_whitespace()) {
            return rasterize_graymap(fields);
        }
    }
    Ok(body.trim_end().to_string())
}

/// Rasterize an ASCII portable graymap; the `P2` magic has already been
/// consumed. `#` starts a comment anywhere on a line.
fn rasterize_graymap(fields: &str) -> Result<String, ArtError> {
    let mut numbers = fields
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace)
        .map(str::parse::<usize>);
    let mut read = |what: &str| -> Result<usize, ArtError> {
        numbers
            .next()
            .ok_or_else(|| ArtError::Conversion(format!("graymap is missing its {what}")))?
            .map_err(|_| ArtError::Conversion(format!("graymap {what} is not a number")))
    };

    let cols = read("width")?;
    let rows = read("height")?;
    let maxval = read("maxval")?;
    if maxval == 0 || maxval > 65_535 {
        return Err(ArtError::Conversion(format!(
            "graymap maxval {maxval} out of range"
        )));
    }
    let samples = cols
        .checked_mul(rows)
        .filter(|&n| n <= MAX_ART_BYTES)
        .ok_or_else(|| ArtError::Conversion(format!("graymap {cols}x{rows} is too large")))?;

    let mut luma = Vec::with_capacity(samples);
    for _ in 0..samples {
        let sample = read("sample")?;
        luma.push((sample.min(maxval) * 255 / maxval) as u8);
    }
    render_luma_grid(cols, rows, &luma)
}

/// Map a row-major grayscale grid (0 = black, 255 = white) to glyph lines.
pub fn render_luma_grid(cols: usize, rows: usize, luma: &[u8]) -> Result<String, ArtError> {
    if cols == 0 || rows == 0 || luma.len() != cols * rows {
        return Err(ArtError::Conversion(format!(
            "grid shape mismatch: {cols}x{rows} with {} samples",
            luma.len()
        )));
    }
    let mut out = String::with_capacity((cols + 1) * rows);
    for row in 0..rows {
        for &sample in &luma[row * cols..(row + 1) * cols] {
            let idx = sample as usize * (LUMA_RAMP.len() - 1) / 255;
            out.push(LUMA_RAMP[idx] as char);
        }
        if row + 1 < rows {
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extensions_are_detected_with_query_strings() {
        assert!(looks_like_image_url("https://x.test/a.PNG"));
        assert!(looks_like_image_url("https://x.test/a.jpg?size=big"));
        assert!(!looks_like_image_url("https://x.test/banner.txt"));
    }

    #[test]
    fn luma_grid_maps_dark_to_dense_glyphs() {
        let art = render_luma_grid(2, 2, &[0, 255, 128, 64]).unwrap();
        let lines: Vec<&str> = art.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].as_bytes()[0], b'@');
        assert_eq!(lines[0].as_bytes()[1], b' ');
    }

    #[test]
    fn luma_grid_rejects_shape_mismatch() {
        assert!(render_luma_grid(3, 2, &[0; 5]).is_err());
        assert!(render_luma_grid(0, 2, &[]).is_err());
    }

    #[test]
    fn graymaps_rasterize_through_the_ramp() {
        let art = rasterize_graymap("\n# test card\n2 2\n255\n0 255\n128 64\n").unwrap();
        let lines: Vec<&str> = art.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "@ ");
    }

    #[test]
    fn graymaps_scale_against_their_maxval() {
        // maxval 15: a full-scale sample maps to the lightest glyph.
        let art = rasterize_graymap("\n1 2\n15\n0\n15\n").unwrap();
        assert_eq!(art, "@\n ");
    }

    #[test]
    fn malformed_graymaps_are_conversion_errors() {
        assert!(matches!(
            rasterize_graymap("\n2 2\n255\n0 1 2\n"),
            Err(ArtError::Conversion(_))
        ));
        assert!(matches!(
            rasterize_graymap("\n2 2\n0\n"),
            Err(ArtError::Conversion(_))
        ));
        assert!(matches!(
            rasterize_graymap("\nwide 2\n255\n"),
            Err(ArtError::Conversion(_))
        ));
    }
}
