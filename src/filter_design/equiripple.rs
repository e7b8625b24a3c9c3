use pm_remez::{BandSetting, constant, pm_parameters, pm_remez};

use crate::constants::MAX_EQUIRIPPLE_DEVIATION;
use crate::error::{DspError, Result};

use super::FirCoefficients;
use super::spec::EquirippleSpec;

/// Design a linear-phase FIR with the Parks-McClellan (Remez) exchange
///
/// Uses the Parks-McClellan algorithm to find the optimal equiripple filter
/// for the spec's bands. The achieved weighted deviation is kept with the
/// taps.
///
/// # Errors
/// Returns `DspError::InvalidSpec` if `pm-remez` rejects the band layout, and
/// `DspError::DesignDidNotConverge` if the exchange fails, produces
/// non-finite taps, or finishes with a deviation no usable filter would have
/// (typically a transition band too narrow for the tap count).
pub fn design_equiripple(spec: &EquirippleSpec) -> Result<FirCoefficients> {
    let bands = spec
        .bands()
        .iter()
        .enumerate()
        .map(|(i, band)| {
            BandSetting::with_weight(
                band.start(),
                band.end(),
                constant(band.gain()),
                constant(band.weight()),
            )
            .map_err(|e| DspError::InvalidSpec(format!("Band {}: {:?}", i, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let params = pm_parameters(spec.num_taps(), &bands)
        .map_err(|e| DspError::InvalidSpec(format!("PM parameters: {:?}", e)))?;

    let design = pm_remez(&params)
        .map_err(|e| DspError::DesignDidNotConverge(format!("PM Remez: {:?}", e)))?;

    if design.impulse_response.len() != spec.num_taps()
        || design.impulse_response.iter().any(|t| !t.is_finite())
    {
        return Err(DspError::DesignDidNotConverge(format!(
            "PM Remez returned {} taps with non-finite values for a {}-tap design",
            design.impulse_response.len(),
            spec.num_taps()
        )));
    }

    let min_weight = spec
        .bands()
        .iter()
        .map(|b| b.weight())
        .fold(f64::INFINITY, f64::min);
    let deviation = design.weighted_error.abs() / min_weight;
    if !deviation.is_finite() || deviation > MAX_EQUIRIPPLE_DEVIATION {
        return Err(DspError::DesignDidNotConverge(format!(
            "deviation {:.4} exceeds {} for {} taps; widen the transition bands",
            deviation,
            MAX_EQUIRIPPLE_DEVIATION,
            spec.num_taps()
        )));
    }

    log::debug!(
        "{:?} equiripple: {} taps, deviation {:.5} ({:.1} dB), {} iterations",
        spec.kind(),
        spec.num_taps(),
        deviation,
        20.0 * deviation.log10(),
        design.num_iterations
    );

    Ok(FirCoefficients::with_deviation(
        design.impulse_response,
        deviation,
    ))
}
