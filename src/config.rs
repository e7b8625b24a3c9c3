//! Configuration for the repeater audio core.
//!
//! Every section has a `Default` matching the deployed controller, so a TOML
//! file only needs the values it changes:
//!
//! ```toml
//! [ctcss]
//! decode_hz = 88.5
//! encode_enabled = true
//!
//! [filters]
//! ctcss_rejection = "wideband_notch"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{CONTROL_RATE_HZ, MAIN_RATE_HZ, RATE_FACTOR};
use crate::error::{DspError, Result};
use crate::filter_design::{EquirippleSpec, HalfBandSpec, IirSpec, NotchSpec};

/// Top-level controller configuration
///
/// # Example
/// ```
/// use repeater_dsp::config::ControllerConfig;
///
/// let config = ControllerConfig::from_toml_str("[ctcss]\ndecode_hz = 88.5\n").unwrap();
/// assert_eq!(config.ctcss.decode_hz, 88.5);
/// assert_eq!(config.audio.block_size, 256);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub audio: AudioConfig,
    pub filters: FilterConfig,
    pub ctcss: CtcssConfig,
}

/// Block layout of the receive and transmit paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Samples per receive block at the main (32 kHz) rate, a multiple of 4
    pub block_size: usize,
    /// Delay applied to the cross audio, in milliseconds
    pub cross_delay_ms: u32,
    /// Which interpolator implementation the transmit path uses
    pub interpolation: InterpolationMode,
    /// Cutoff of a first-order DC-blocking high-pass on the receive input
    pub dc_block_hz: Option<f64>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            block_size: 256,
            cross_delay_ms: 0,
            interpolation: InterpolationMode::Polyphase,
            dc_block_hz: None,
        }
    }
}

impl AudioConfig {
    pub fn dc_block_spec(&self) -> Result<Option<IirSpec>> {
        self.dc_block_hz
            .map(|fc| IirSpec::high_pass(MAIN_RATE_HZ as f64, fc, 1))
            .transpose()
    }

    /// Samples per block at the control (8 kHz) rate
    pub fn control_block_size(&self) -> usize {
        self.block_size / RATE_FACTOR
    }

    /// Cross audio delay in control-rate samples
    pub fn cross_delay_samples(&self) -> usize {
        (CONTROL_RATE_HZ as u64 * self.cross_delay_ms as u64 / 1000) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Convolution over the zero-stuffed stream
    Direct,
    /// Four sub-filters, one per output phase
    Polyphase,
}

/// How CTCSS is removed from the cross audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CtcssRejection {
    /// Equiripple FIR high-pass (`filters.ctcss_highpass`)
    Equiripple,
    /// Single biquad notch (`filters.notch`)
    Notch,
    /// Notch cascaded with the same notch designed at twice the rate
    WidebandNotch,
}

/// Equiripple high-pass edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighPassConfig {
    pub num_taps: usize,
    pub stop_edge_hz: f64,
    pub pass_edge_hz: f64,
}

/// Equiripple low-pass edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowPassConfig {
    pub num_taps: usize,
    pub pass_edge_hz: f64,
    pub stop_edge_hz: f64,
}

/// Equiripple band-pass edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandPassConfig {
    pub num_taps: usize,
    pub stop_low_hz: f64,
    pub pass_low_hz: f64,
    pub pass_high_hz: f64,
    pub stop_high_hz: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotchConfig {
    pub center_hz: f64,
    /// -3 dB bandwidth
    pub bandwidth_hz: f64,
}

/// The standard filter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Half-band taps for each decimate-by-2 stage, N = 1 (mod 4)
    pub half_band_taps: usize,
    /// Noise measurement high-pass at the main rate
    pub noise_highpass: HighPassConfig,
    /// CTCSS rejection high-pass at the control rate
    pub ctcss_highpass: HighPassConfig,
    /// Tone energy band-pass at the control rate
    pub ctcss_bandpass: BandPassConfig,
    /// Transmit interpolation low-pass at the main rate
    pub interpolation_lowpass: LowPassConfig,
    pub notch: NotchConfig,
    pub ctcss_rejection: CtcssRejection,
    /// Optional second-order voice low-pass ahead of interpolation
    pub tx_lowpass_hz: Option<f64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            half_band_taps: 41,
            noise_highpass: HighPassConfig {
                num_taps: 41,
                stop_edge_hz: 4000.0,
                pass_edge_hz: 6000.0,
            },
            ctcss_highpass: HighPassConfig {
                num_taps: 127,
                stop_edge_hz: 100.0,
                pass_edge_hz: 225.0,
            },
            ctcss_bandpass: BandPassConfig {
                num_taps: 127,
                stop_low_hz: 10.0,
                pass_low_hz: 65.0,
                pass_high_hz: 260.0,
                stop_high_hz: 330.0,
            },
            interpolation_lowpass: LowPassConfig {
                num_taps: 124,
                pass_edge_hz: 3000.0,
                stop_edge_hz: 3600.0,
            },
            notch: NotchConfig {
                center_hz: 123.0,
                bandwidth_hz: 110.0,
            },
            ctcss_rejection: CtcssRejection::Equiripple,
            tx_lowpass_hz: None,
        }
    }
}

impl FilterConfig {
    pub fn half_band_spec(&self) -> Result<HalfBandSpec> {
        HalfBandSpec::new(MAIN_RATE_HZ as f64, self.half_band_taps)
    }

    pub fn noise_highpass_spec(&self) -> Result<EquirippleSpec> {
        let c = &self.noise_highpass;
        EquirippleSpec::high_pass(MAIN_RATE_HZ as f64, c.num_taps, c.stop_edge_hz, c.pass_edge_hz)
    }

    pub fn ctcss_highpass_spec(&self) -> Result<EquirippleSpec> {
        let c = &self.ctcss_highpass;
        EquirippleSpec::high_pass(CONTROL_RATE_HZ as f64, c.num_taps, c.stop_edge_hz, c.pass_edge_hz)
    }

    pub fn ctcss_bandpass_spec(&self) -> Result<EquirippleSpec> {
        let c = &self.ctcss_bandpass;
        EquirippleSpec::band_pass(
            CONTROL_RATE_HZ as f64,
            c.num_taps,
            c.stop_low_hz,
            c.pass_low_hz,
            c.pass_high_hz,
            c.stop_high_hz,
        )
    }

    pub fn interpolation_lowpass_spec(&self) -> Result<EquirippleSpec> {
        let c = &self.interpolation_lowpass;
        EquirippleSpec::low_pass(MAIN_RATE_HZ as f64, c.num_taps, c.pass_edge_hz, c.stop_edge_hz)
    }

    pub fn notch_spec(&self) -> Result<NotchSpec> {
        NotchSpec::new(
            CONTROL_RATE_HZ as f64,
            self.notch.center_hz,
            self.notch.bandwidth_hz,
        )
    }

    pub fn tx_lowpass_spec(&self) -> Result<Option<IirSpec>> {
        self.tx_lowpass_hz
            .map(|fc| IirSpec::low_pass(CONTROL_RATE_HZ as f64, fc, 2))
            .transpose()
    }
}

/// CTCSS decoder and encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtcssConfig {
    /// Tone the decoder listens for
    pub decode_hz: f64,
    /// Control-rate samples per receive block
    pub block_len: usize,
    /// Blocks accumulated per decoder estimate
    pub blocks: usize,
    /// Decoded level (dB, relative to full scale peak) treated as tone present
    pub detect_level_db: f32,
    pub encode_hz: f64,
    /// Encoder peak level in dB relative to full scale
    pub encode_level_db: f32,
    pub encode_enabled: bool,
}

impl Default for CtcssConfig {
    fn default() -> Self {
        Self {
            decode_hz: 123.0,
            block_len: 64,
            blocks: 8,
            detect_level_db: -40.0,
            encode_hz: 123.0,
            encode_level_db: -26.0,
            encode_enabled: false,
        }
    }
}

impl CtcssConfig {
    /// Samples per decoder estimate
    pub fn window_len(&self) -> usize {
        self.block_len * self.blocks
    }
}

impl ControllerConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| DspError::Config(format!("TOML parse: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DspError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DspError::Config(format!("TOML encode: {}", e)))
    }

    /// Check the parts of the configuration the filter specs do not cover
    pub fn validate(&self) -> Result<()> {
        if self.audio.block_size == 0 || self.audio.block_size % RATE_FACTOR != 0 {
            return Err(DspError::Config(format!(
                "audio.block_size must be a positive multiple of {}, got {}",
                RATE_FACTOR, self.audio.block_size
            )));
        }
        if self.ctcss.block_len == 0 || self.ctcss.blocks == 0 {
            return Err(DspError::Config(
                "ctcss.block_len and ctcss.blocks must be positive".to_string(),
            ));
        }
        if self.audio.interpolation == InterpolationMode::Polyphase
            && self.filters.interpolation_lowpass.num_taps % RATE_FACTOR != 0
        {
            return Err(DspError::Config(format!(
                "polyphase interpolation needs interpolation_lowpass.num_taps to be a multiple of {}",
                RATE_FACTOR
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = ControllerConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = ControllerConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let text = r#"
            [audio]
            cross_delay_ms = 20
            interpolation = "direct"
            dc_block_hz = 10.0

            [filters]
            ctcss_rejection = "wideband_notch"
            tx_lowpass_hz = 2300.0
        "#;
        let config = ControllerConfig::from_toml_str(text).unwrap();
        assert_eq!(config.audio.cross_delay_ms, 20);
        assert_eq!(config.audio.cross_delay_samples(), 160);
        assert_eq!(config.audio.block_size, 256);
        assert_eq!(config.audio.control_block_size(), 64);
        assert_eq!(config.audio.interpolation, InterpolationMode::Direct);
        assert!(config.audio.dc_block_spec().unwrap().is_some());
        assert_eq!(config.filters.ctcss_rejection, CtcssRejection::WidebandNotch);
        assert_eq!(config.filters.half_band_taps, 41);
        assert!(config.filters.tx_lowpass_spec().unwrap().is_some());
        assert_eq!(config.ctcss.window_len(), 512);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ControllerConfig::from_toml_str("[audio]\nblock_size = 250\n"),
            Err(DspError::Config(_))
        ));
        assert!(matches!(
            ControllerConfig::from_toml_str("[ctcss]\nblocks = 0\n"),
            Err(DspError::Config(_))
        ));
        assert!(matches!(
            ControllerConfig::from_toml_str("[filters.interpolation_lowpass]\nnum_taps = 125\npass_edge_hz = 3000.0\nstop_edge_hz = 3600.0\n"),
            Err(DspError::Config(_))
        ));
        assert!(matches!(
            ControllerConfig::from_toml_str("[audio\n"),
            Err(DspError::Config(_))
        ));
    }

    #[test]
    fn test_default_specs_are_valid() {
        let filters = FilterConfig::default();
        assert_eq!(filters.half_band_spec().unwrap().num_taps(), 41);
        assert_eq!(filters.noise_highpass_spec().unwrap().num_taps(), 41);
        assert_eq!(filters.ctcss_highpass_spec().unwrap().num_taps(), 127);
        assert_eq!(filters.ctcss_bandpass_spec().unwrap().num_taps(), 127);
        assert_eq!(filters.interpolation_lowpass_spec().unwrap().num_taps(), 124);
        assert_eq!(filters.notch_spec().unwrap().q(), 123.0 / 110.0);
        assert_eq!(filters.tx_lowpass_spec().unwrap(), None);
    }
}
