mod noise;
mod signal;

pub use noise::{
    AdditiveNoiseConfig, ImpulseNoiseConfig, NoiseConfig, WhiteNoiseConfig, apply_noise,
    signal_power,
};
pub use signal::{ToneComponent, generate_repeater_signal, generate_tone, generate_tones};
