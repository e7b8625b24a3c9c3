//! Per-session receive and transmit paths of one repeater port.

use std::collections::VecDeque;

use crate::config::{ControllerConfig, CtcssRejection, InterpolationMode};
use crate::constants::{CONTROL_RATE_HZ, MAIN_RATE_HZ, RATE_FACTOR};
use crate::error::{DspError, Result};
use crate::filter_design::{design_equiripple, design_iir, design_notch, design_wideband_notch};
use crate::signal_processing::{
    BiquadCascade, BiquadSection, BlockGoertzel, DecimationChain, DirectInterpolator,
    Filter, FirFilterCore, Interpolator, PolyphaseInterpolator, SampleBuffer, ToneGenerator,
    linear_to_db, ratio_db, rms,
};

/// Levels measured by the most recent receive block
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RxMetrics {
    /// RMS of the main-rate input above the voice band
    pub noise_rms: f32,
    /// RMS of the decimated control-rate signal
    pub signal_rms: f32,
    /// Peak magnitude of the decimated signal
    pub signal_peak: f32,
    /// RMS of the control-rate signal inside the CTCSS band
    pub ctcss_band_rms: f32,
    /// Peak amplitude of the decode tone from the last complete window
    pub ctcss_level: f32,
    /// Signal to noise ratio in dB, floored at -60 dB
    pub snr_db: f32,
}

impl RxMetrics {
    pub fn ctcss_level_db(&self) -> f32 {
        linear_to_db(self.ctcss_level)
    }
}

/// Receive and transmit audio processing for one port
///
/// Receive: main-rate input, noise high-pass and RMS, decimation by 4,
/// signal RMS, CTCSS decode and CTCSS removal. The filtered control-rate
/// output is the "cross" audio sent to other ports.
///
/// Transmit: cross audio plus the CTCSS encoder tone, interpolated by 4
/// back to the main rate.
///
/// All filter state lives in this object; two sessions never share it.
pub struct AudioCore {
    dc_blocker: Option<BiquadSection>,
    noise_filter: FirFilterCore,
    decimator: DecimationChain,
    ctcss_rejection: Box<dyn Filter + Send>,
    ctcss_bandpass: FirFilterCore,
    ctcss_decoder: BlockGoertzel,
    cross_delay: VecDeque<f32>,
    encoder: ToneGenerator,
    tx_lowpass: Option<BiquadSection>,
    interpolator: Box<dyn Interpolator>,
    detect_level_db: f32,
    metrics: RxMetrics,
}

impl AudioCore {
    /// Design every filter in `config` and build a session
    ///
    /// # Errors
    /// Returns whatever error a filter design or the configuration check
    /// reports.
    pub fn new(config: &ControllerConfig) -> Result<Self> {
        config.validate()?;
        let filters = &config.filters;

        let dc_blocker = config
            .audio
            .dc_block_spec()?
            .map(|spec| design_iir(&spec).map(BiquadSection::new))
            .transpose()?;

        let noise_taps = design_equiripple(&filters.noise_highpass_spec()?)?;
        // 32 kHz -> 16 kHz -> 8 kHz
        let decimator = DecimationChain::half_band(MAIN_RATE_HZ, filters.half_band_taps, 2)?;

        let ctcss_rejection: Box<dyn Filter + Send> = match filters.ctcss_rejection {
            CtcssRejection::Equiripple => Box::new(FirFilterCore::new(
                design_equiripple(&filters.ctcss_highpass_spec()?)?.into_taps(),
            )),
            CtcssRejection::Notch => {
                Box::new(BiquadSection::new(design_notch(&filters.notch_spec()?)?))
            }
            CtcssRejection::WidebandNotch => Box::new(BiquadCascade::new(&design_wideband_notch(
                &filters.notch_spec()?,
            )?)),
        };

        let bandpass_taps = design_equiripple(&filters.ctcss_bandpass_spec()?)?;
        let ctcss_decoder = BlockGoertzel::new(
            config.ctcss.decode_hz,
            CONTROL_RATE_HZ as f64,
            config.ctcss.window_len(),
        )?;

        let mut encoder = ToneGenerator::new(
            config.ctcss.encode_hz,
            CONTROL_RATE_HZ as f64,
            config.ctcss.encode_level_db,
        )?;
        encoder.set_enabled(config.ctcss.encode_enabled);

        let tx_lowpass = filters
            .tx_lowpass_spec()?
            .map(|spec| design_iir(&spec).map(BiquadSection::new))
            .transpose()?;

        let lpf = design_equiripple(&filters.interpolation_lowpass_spec()?)?;
        let interpolator: Box<dyn Interpolator> = match config.audio.interpolation {
            InterpolationMode::Direct => {
                Box::new(DirectInterpolator::new(&lpf, RATE_FACTOR, CONTROL_RATE_HZ)?)
            }
            InterpolationMode::Polyphase => Box::new(PolyphaseInterpolator::new(
                &lpf,
                RATE_FACTOR,
                CONTROL_RATE_HZ,
            )?),
        };

        let delay = config.audio.cross_delay_samples();
        log::info!(
            "Audio core: {:?} CTCSS rejection, decode {} Hz over {} samples, {:?} interpolation, cross delay {} samples",
            filters.ctcss_rejection,
            config.ctcss.decode_hz,
            config.ctcss.window_len(),
            config.audio.interpolation,
            delay
        );

        Ok(Self {
            dc_blocker,
            noise_filter: FirFilterCore::new(noise_taps.into_taps()),
            decimator,
            ctcss_rejection,
            ctcss_bandpass: FirFilterCore::new(bandpass_taps.into_taps()),
            ctcss_decoder,
            cross_delay: std::iter::repeat_n(0.0, delay).collect(),
            encoder,
            tx_lowpass,
            interpolator,
            detect_level_db: config.ctcss.detect_level_db,
            metrics: RxMetrics::default(),
        })
    }

    /// Run one receive block, returning the cross audio
    ///
    /// # Errors
    /// `DspError::SampleRateMismatch` unless the input is at the main rate,
    /// `DspError::InvalidInput` if its length is zero or not a multiple of 4.
    pub fn process_rx(&mut self, input: SampleBuffer) -> Result<SampleBuffer> {
        input.expect_rate(MAIN_RATE_HZ)?;
        if input.is_empty() || !input.len().is_multiple_of(RATE_FACTOR) {
            return Err(DspError::InvalidInput(format!(
                "receive block must be a positive multiple of {} samples, got {}",
                RATE_FACTOR,
                input.len()
            )));
        }

        let mut samples = input.into_samples();
        if let Some(dc) = self.dc_blocker.as_mut() {
            dc.process_buffer(&mut samples);
        }

        let mut noise = samples.clone();
        self.noise_filter.process_buffer(&mut noise);

        let decimated = self.decimator.process(&samples);

        let mut band = decimated.clone();
        self.ctcss_bandpass.process_buffer(&mut band);

        if let Some(level) = self.ctcss_decoder.process_block(&decimated) {
            log::trace!(
                "CTCSS {} Hz level {:.1} dB",
                self.ctcss_decoder.target_hz(),
                linear_to_db(level)
            );
        }

        let mut cross = decimated.clone();
        self.ctcss_rejection.process_buffer(&mut cross);
        for sample in cross.iter_mut() {
            if let Some(delayed) = self.cross_delay.pop_front() {
                self.cross_delay.push_back(*sample);
                *sample = delayed;
            }
        }

        let noise_rms = rms(&noise);
        let signal_rms = rms(&decimated);
        self.metrics = RxMetrics {
            noise_rms,
            signal_rms,
            signal_peak: decimated.iter().fold(0.0f32, |m, s| m.max(s.abs())),
            ctcss_band_rms: rms(&band),
            ctcss_level: self.ctcss_decoder.magnitude(),
            snr_db: ratio_db(signal_rms, noise_rms),
        };

        SampleBuffer::new(cross, CONTROL_RATE_HZ)
    }

    /// Mix the encoder tone into control-rate audio and interpolate to the
    /// main rate
    pub fn process_tx(&mut self, cross: SampleBuffer) -> Result<SampleBuffer> {
        cross.expect_rate(CONTROL_RATE_HZ)?;
        let mut mix = cross.into_samples();
        self.encoder.mix_into(&mut mix);
        if let Some(lpf) = self.tx_lowpass.as_mut() {
            lpf.process_buffer(&mut mix);
        }
        let output = self.interpolator.interpolate(&mix);
        SampleBuffer::new(output, MAIN_RATE_HZ)
    }

    pub fn metrics(&self) -> &RxMetrics {
        &self.metrics
    }

    pub fn snr_db(&self) -> f32 {
        self.metrics.snr_db
    }

    /// True when the last decoder window held the tone above the detect level
    pub fn is_ctcss_detected(&self) -> bool {
        self.metrics.ctcss_level_db() >= self.detect_level_db
    }

    pub fn set_ctcss_decode_hz(&mut self, hz: f64) -> Result<()> {
        self.ctcss_decoder.retune(hz)?;
        self.metrics.ctcss_level = 0.0;
        Ok(())
    }

    pub fn set_ctcss_encode_hz(&mut self, hz: f64) -> Result<()> {
        self.encoder.set_frequency(hz)
    }

    pub fn set_ctcss_encode_level_db(&mut self, db: f32) {
        self.encoder.set_level_db(db);
    }

    pub fn set_ctcss_encode_enabled(&mut self, enabled: bool) {
        self.encoder.set_enabled(enabled);
    }

    /// Clear all filter history and measurements
    pub fn reset(&mut self) {
        if let Some(dc) = self.dc_blocker.as_mut() {
            dc.reset();
        }
        self.noise_filter.reset();
        self.decimator.reset();
        self.ctcss_rejection.reset();
        self.ctcss_bandpass.reset();
        self.ctcss_decoder.reset();
        self.cross_delay.iter_mut().for_each(|s| *s = 0.0);
        if let Some(lpf) = self.tx_lowpass.as_mut() {
            lpf.reset();
        }
        self.interpolator.reset();
        self.metrics = RxMetrics::default();
    }
}
