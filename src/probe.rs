use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, trace};
use turbojpeg::{DecompressHeader, ScalingFactor, Subsamp};

use crate::geometry::{padded_pitch, subsamp_name};
use crate::scaling::{self, ratio_cmp, FactorTable};

/// Bytes per pixel of the RGB buffers the probe decodes into.
const RGB_PIXEL_SIZE: usize = 3;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("'{path}' is not a JPEG file (missing FF D8 FF start marker)")]
    NotJpeg { path: PathBuf },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeOptions {
    /// Minimum size the shorter side must keep after scaling
    pub target: Option<usize>,
    /// Decode at the chosen factor to confirm the library accepts it
    pub decode: bool,
}

/// Output size of an image decoded at one scaling factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledSize {
    pub factor: ScalingFactor,
    pub width: usize,
    pub height: usize,
    /// Row length of the 4-byte aligned RGB buffer a decode at this factor writes into
    pub pitch: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub width: usize,
    pub height: usize,
    pub subsampling: Subsamp,
    pub sizes: Vec<ScaledSize>,
    pub chosen: ScalingFactor,
    pub decoded: Option<(u32, u32)>,
}

impl ProbeReport {
    /// Human-readable summary, one entry per output line.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.sizes.len() + 4);
        lines.push(format!("Image is {}x{}", self.width, self.height));
        if self.subsampling == Subsamp::Unknown {
            lines.push("Subsampling unknown".to_string());
        } else {
            let (mcu_width, mcu_height) = self.subsampling.mcu_size();
            lines.push(format!(
                "Subsampling {} (MCU {}x{})",
                subsamp_name(self.subsampling),
                mcu_width,
                mcu_height
            ));
        }
        for size in &self.sizes {
            lines.push(format!(
                "At {} the output is {}x{} (pitch {})",
                size.factor, size.width, size.height, size.pitch
            ));
        }
        if self.chosen == ScalingFactor::ONE {
            lines.push(format!("Chosen factor {} (full size)", self.chosen));
        } else {
            lines.push(format!("Chosen factor {}", self.chosen));
        }
        if let Some((w, h)) = self.decoded {
            lines.push(format!("Decoded {}x{}", w, h));
        }
        lines
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 3 && data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF
}

/// Output sizes for every factor, in the order given.
pub fn scaled_sizes(factors: &[ScalingFactor], header: &DecompressHeader) -> Vec<ScaledSize> {
    factors
        .iter()
        .map(|&factor| {
            let scaled = header.scaled(factor);
            ScaledSize {
                factor,
                width: scaled.width,
                height: scaled.height,
                pitch: padded_pitch(scaled.width, RGB_PIXEL_SIZE),
            }
        })
        .collect()
}

/// Smallest factor whose output keeps the shorter side at or above `target`.
/// Falls back to 1/1 when there is no target or nothing qualifies.
pub fn choose_factor(
    factors: &[ScalingFactor],
    width: usize,
    height: usize,
    target: Option<usize>,
) -> ScalingFactor {
    let Some(target) = target.filter(|&t| t > 0) else {
        return ScalingFactor::ONE;
    };

    factors
        .iter()
        .filter(|f| std::cmp::min(f.scale(width), f.scale(height)) >= target)
        .min_by(|a, b| ratio_cmp(a, b))
        .copied()
        .unwrap_or(ScalingFactor::ONE)
}

/// Decodes at `size.factor` into a padded RGB buffer and repacks it as an `RgbImage`.
fn decode_scaled(
    decompressor: &mut turbojpeg::Decompressor,
    data: &[u8],
    size: &ScaledSize,
) -> Result<image::RgbImage> {
    decompressor
        .set_scaling_factor(size.factor)
        .with_context(|| format!("libjpeg-turbo rejected scaling factor {}", size.factor))?;

    let mut pixels = vec![0u8; size.pitch * size.height];
    let turbo_image = turbojpeg::Image {
        pixels: pixels.as_mut_slice(),
        width: size.width,
        height: size.height,
        format: turbojpeg::PixelFormat::RGB,
        pitch: size.pitch,
    };
    decompressor
        .decompress(data, turbo_image)
        .with_context(|| format!("Failed to decompress at {}", size.factor))?;

    let row_len = size.width * RGB_PIXEL_SIZE;
    let packed: Vec<u8> = pixels
        .chunks_exact(size.pitch)
        .flat_map(|row| &row[..row_len])
        .copied()
        .collect();

    image::RgbImage::from_raw(size.width as u32, size.height as u32, packed)
        .context("Decoded buffer does not match the scaled size")
}

/// Probes an in-memory JPEG against the factors in `table`.
pub fn probe_bytes(
    data: &[u8],
    table: &impl FactorTable,
    options: ProbeOptions,
) -> Result<ProbeReport> {
    let mut decompressor =
        turbojpeg::Decompressor::new().context("Failed to create turbojpeg decompressor")?;
    let header = decompressor
        .read_header(data)
        .context("Failed to read JPEG header")?;
    trace!("Header: {}x{}", header.width, header.height);

    let factors = scaling::supported(table);
    let sizes = scaled_sizes(&factors, &header);
    let chosen = choose_factor(&factors, header.width, header.height, options.target);
    debug!(
        "Chose scaling factor {} for target {:?}",
        chosen, options.target
    );

    let decoded = if options.decode {
        let size = scaled_sizes(&[chosen], &header)[0];
        Some(decode_scaled(&mut decompressor, data, &size)?.dimensions())
    } else {
        None
    };

    Ok(ProbeReport {
        width: header.width,
        height: header.height,
        subsampling: header.subsamp,
        sizes,
        chosen,
        decoded,
    })
}

/// Probes the JPEG file at `path`.
pub fn probe(path: &Path, table: &impl FactorTable, options: ProbeOptions) -> Result<ProbeReport> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if !is_jpeg(&data) {
        return Err(ProbeError::NotJpeg {
            path: path.to_path_buf(),
        }
        .into());
    }

    let report = probe_bytes(&data, table, options)
        .with_context(|| format!("Failed to probe {}", path.display()))?;
    info!(
        "Probed {} ({}x{}), chosen factor {}",
        path.display(),
        report.width,
        report.height,
        report.chosen
    );
    Ok(report)
}
