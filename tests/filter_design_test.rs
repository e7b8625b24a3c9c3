use approx::assert_abs_diff_eq;
use iir_filters::filter::{DirectForm2Transposed, Filter};
use iir_filters::filter_design::{FilterType, butter};
use iir_filters::sos::zpk2sos;

use repeater_dsp::DspError;
use repeater_dsp::config::FilterConfig;
use repeater_dsp::filter_design::response::fir_magnitude_db_grid;
use repeater_dsp::filter_design::{
    EquirippleSpec, FilterDesign, FilterSpec, IirSpec, design_equiripple, design_iir,
    fir_response, magnitude_db,
};
use repeater_dsp::signal_processing::BiquadSection;

fn fir_db(taps: &[f64], freq_hz: f64, fs: f64) -> f64 {
    magnitude_db(fir_response(taps, freq_hz, fs))
}

#[test]
fn test_ctcss_highpass_127_taps() {
    let spec = FilterConfig::default().ctcss_highpass_spec().unwrap();
    let taps = design_equiripple(&spec).unwrap();

    assert_eq!(taps.len(), 127);
    assert!(taps.is_symmetric(1e-12));
    let deviation = taps.deviation().unwrap();
    assert!(deviation > 0.0 && deviation < 0.05, "deviation {}", deviation);

    let t = taps.taps();
    // Stop band edge and below
    for f in [0.0, 67.0, 100.0] {
        assert!(fir_db(t, f, 8000.0) < -25.0, "{} Hz: {} dB", f, fir_db(t, f, 8000.0));
    }
    // Voice band
    for f in [300.0, 1000.0, 3000.0] {
        assert_abs_diff_eq!(fir_db(t, f, 8000.0), 0.0, epsilon = 0.5);
    }
}

#[test]
fn test_ctcss_bandpass_isolates_sub_audible_band() {
    let spec = FilterConfig::default().ctcss_bandpass_spec().unwrap();
    let taps = design_equiripple(&spec).unwrap();
    let t = taps.taps();

    // The 55 Hz lower transition limits the achievable ripple
    assert_abs_diff_eq!(fir_db(t, 123.0, 8000.0), 0.0, epsilon = 2.0);
    assert!(fir_db(t, 1000.0, 8000.0) < -12.0);
}

#[test]
fn test_equiripple_ripple_is_bounded_by_deviation() {
    let spec = EquirippleSpec::low_pass(32000.0, 61, 3000.0, 5000.0).unwrap();
    let taps = design_equiripple(&spec).unwrap();
    let delta = taps.deviation().unwrap();

    for (f, db) in fir_magnitude_db_grid(taps.taps(), 32000.0, 512) {
        let gain = 10f64.powf(db / 20.0);
        if f <= 3000.0 {
            assert!((gain - 1.0).abs() <= delta * 1.05 + 1e-9, "{} Hz gain {}", f, gain);
        } else if f >= 5000.0 {
            assert!(gain <= delta * 1.05 + 1e-9, "{} Hz gain {}", f, gain);
        }
    }
}

#[test]
fn test_tap_count_limits() {
    assert!(matches!(
        EquirippleSpec::low_pass(8000.0, 128, 1000.0, 1500.0),
        Err(DspError::InvalidSpec(_))
    ));
    assert!(matches!(
        EquirippleSpec::low_pass(8000.0, 2, 1000.0, 1500.0),
        Err(DspError::InvalidSpec(_))
    ));
    // Even length forces a zero at Nyquist: fine for low-pass, not high-pass
    assert!(EquirippleSpec::low_pass(8000.0, 124, 1000.0, 1500.0).is_ok());
    assert!(matches!(
        EquirippleSpec::high_pass(8000.0, 126, 100.0, 225.0),
        Err(DspError::InvalidSpec(_))
    ));
}

#[test]
fn test_impossible_transition_reports_non_convergence() {
    let spec = EquirippleSpec::high_pass(8000.0, 15, 100.0, 110.0).unwrap();
    assert!(matches!(
        design_equiripple(&spec),
        Err(DspError::DesignDidNotConverge(_))
    ));
}

#[test]
fn test_butterworth_matches_iir_filters() {
    let cases: [(IirSpec, FilterType); 3] = [
        (IirSpec::low_pass(8000.0, 300.0, 2).unwrap(), FilterType::LowPass(300.0)),
        (IirSpec::high_pass(8000.0, 300.0, 2).unwrap(), FilterType::HighPass(300.0)),
        (IirSpec::high_pass(32000.0, 2120.0, 1).unwrap(), FilterType::HighPass(2120.0)),
    ];

    for (spec, filter_type) in cases {
        let order = match spec.order() {
            repeater_dsp::filter_design::IirOrder::First => 1,
            repeater_dsp::filter_design::IirOrder::Second => 2,
        };
        let zpk = butter(order, filter_type, spec.sample_rate()).unwrap();
        let sos = zpk2sos(&zpk, None).unwrap();
        let mut reference = DirectForm2Transposed::new(&sos);
        let mut ours = BiquadSection::new(design_iir(&spec).unwrap());

        for n in 0..200 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            let expected = reference.filter(x);
            let got = ours.process(x as f32) as f64;
            assert_abs_diff_eq!(got, expected, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_every_default_filter_designs() {
    let filters = FilterConfig::default();
    let specs: Vec<FilterSpec> = vec![
        filters.half_band_spec().unwrap().into(),
        filters.noise_highpass_spec().unwrap().into(),
        filters.ctcss_highpass_spec().unwrap().into(),
        filters.ctcss_bandpass_spec().unwrap().into(),
        filters.interpolation_lowpass_spec().unwrap().into(),
        filters.notch_spec().unwrap().into(),
    ];

    for spec in specs {
        match spec.design().unwrap() {
            FilterDesign::Fir(taps) => {
                assert!(taps.is_symmetric(1e-9), "{:?} not linear phase", spec.kind());
                assert_eq!(taps.reversed().reversed(), taps);
            }
            FilterDesign::Iir(sections) => {
                assert!(sections.iter().all(|s| s.is_stable()));
            }
        }
    }
}

#[test]
fn test_noise_highpass_rejects_voice() {
    let taps = design_equiripple(&FilterConfig::default().noise_highpass_spec().unwrap()).unwrap();
    let t = taps.taps();
    assert!(fir_db(t, 1000.0, 32000.0) < -30.0);
    assert!(fir_db(t, 3000.0, 32000.0) < -30.0);
    assert_abs_diff_eq!(fir_db(t, 10000.0, 32000.0), 0.0, epsilon = 1.0);
}
