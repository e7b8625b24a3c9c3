use repeater_dsp::AudioCore;
use repeater_dsp::constants::{CONTROL_RATE_HZ, MAIN_RATE_HZ};
use repeater_dsp::signal_processing::{SampleBuffer, goertzel};
use repeater_dsp::simulation::{NoiseConfig, ToneComponent, apply_noise, generate_repeater_signal};

/// Main-rate receive audio: a CTCSS tone under a voice tone
pub fn repeater_input(
    ctcss_hz: f32,
    ctcss_amplitude: f32,
    voice_hz: f32,
    voice_amplitude: f32,
    duration_secs: f32,
) -> Vec<f32> {
    generate_repeater_signal(
        ToneComponent::new(ctcss_hz, ctcss_amplitude),
        ToneComponent::new(voice_hz, voice_amplitude),
        MAIN_RATE_HZ,
        duration_secs,
    )
}

/// `repeater_input` with seeded white Gaussian noise at `snr_db`
pub fn noisy_repeater_input(
    ctcss_hz: f32,
    ctcss_amplitude: f32,
    voice_hz: f32,
    voice_amplitude: f32,
    duration_secs: f32,
    snr_db: f32,
    seed: u64,
) -> Vec<f32> {
    let clean = repeater_input(ctcss_hz, ctcss_amplitude, voice_hz, voice_amplitude, duration_secs);
    let noise = NoiseConfig::default().with_seed(seed).with_awgn(snr_db);
    apply_noise(&clean, &noise, MAIN_RATE_HZ as f32)
}

/// Feed `input` through `core` in blocks of `block_size`, returning the
/// concatenated control-rate cross audio. A trailing partial block is dropped.
pub fn run_rx(core: &mut AudioCore, input: &[f32], block_size: usize) -> Vec<f32> {
    let mut cross = Vec::with_capacity(input.len() / 4);
    for block in input.chunks_exact(block_size) {
        let buffer = SampleBuffer::new(block.to_vec(), MAIN_RATE_HZ).unwrap();
        let out = core.process_rx(buffer).unwrap();
        assert_eq!(out.sample_rate(), CONTROL_RATE_HZ);
        cross.extend(out.into_samples());
    }
    cross
}

/// Peak amplitude of the component at `freq_hz`, from a Goertzel bin over
/// the whole slice
pub fn tone_amplitude(samples: &[f32], freq_hz: f64, sample_rate: u32) -> f64 {
    goertzel(samples, freq_hz, sample_rate as f64)
        .unwrap()
        .normalized_magnitude(samples.len())
}
