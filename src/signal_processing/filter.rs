/// Common trait for streaming sample filters
///
/// Implemented by the biquad engine, the FIR stages, and anything else that
/// maps one input sample to one output sample with internal state.
pub trait Filter {
    /// Process a single sample through the filter
    fn process(&mut self, sample: f32) -> f32;

    /// Clear internal state, keeping coefficients
    fn reset(&mut self);

    /// Process a buffer of samples in-place
    fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}
