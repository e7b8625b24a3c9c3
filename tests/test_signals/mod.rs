#![allow(dead_code)]

pub mod generate;

pub use generate::{noisy_repeater_input, repeater_input, run_rx, tone_amplitude};
pub use repeater_dsp::simulation::{NoiseConfig, ToneComponent, apply_noise, generate_tone};
