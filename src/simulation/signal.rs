use std::f64::consts::TAU;

/// One sinusoidal component of a synthetic signal
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct ToneComponent {
    pub frequency_hz: f32,
    /// Peak amplitude
    pub amplitude: f32,
    /// Starting phase in radians (0 gives a cosine)
    #[serde(default)]
    pub phase: f32,
}

impl ToneComponent {
    pub fn new(frequency_hz: f32, amplitude: f32) -> Self {
        Self {
            frequency_hz,
            amplitude,
            phase: 0.0,
        }
    }

    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }
}

/// Sum of cosines, `num_samples` long
pub fn generate_tones(components: &[ToneComponent], sample_rate: u32, num_samples: usize) -> Vec<f32> {
    let fs = sample_rate as f64;
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / fs;
            components
                .iter()
                .map(|c| {
                    c.amplitude as f64 * (TAU * c.frequency_hz as f64 * t + c.phase as f64).cos()
                })
                .sum::<f64>() as f32
        })
        .collect()
}

/// Single cosine tone lasting `duration_secs`
pub fn generate_tone(frequency_hz: f32, amplitude: f32, sample_rate: u32, duration_secs: f32) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    generate_tones(&[ToneComponent::new(frequency_hz, amplitude)], sample_rate, num_samples)
}

/// Receive audio as a repeater hears it: a CTCSS tone under a voice-band tone
pub fn generate_repeater_signal(
    ctcss: ToneComponent,
    voice: ToneComponent,
    sample_rate: u32,
    duration_secs: f32,
) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    generate_tones(&[ctcss, voice], sample_rate, num_samples)
}
