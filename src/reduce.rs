//! Numeric reductions from raw readings to derived metrics.
//!
//! Every function here is pure and deterministic: no instrument access, no
//! mutation of inputs. Reductions that are undefined for part of their input
//! range (efficiency with zero DC power, THD with a vanished fundamental)
//! return a [`BenchError::Domain`] naming the reduction instead of producing
//! a NaN that would silently poison downstream tables.

use crate::error::{BenchError, BenchResult};
use crate::measure::HarmonicSpectrum;

/// DC power from a voltage/current pair, in watts.
pub fn power(volts: f64, amps: f64) -> f64 {
    volts * amps
}

/// RF power delivered into a resistive load from an RMS voltage reading.
pub fn rf_output_power(vrms: f64, load_ohms: f64) -> f64 {
    vrms * vrms / load_ohms
}

/// Converts an amplitude in dBV to a linear voltage.
pub fn dbv_to_linear(dbv: f64) -> f64 {
    10f64.powf(dbv / 20.0)
}

/// Power in watts expressed in dBW.
pub fn power_dbw(watts: f64) -> f64 {
    10.0 * watts.log10()
}

/// Per-harmonic power spectrum in watts, index 0 = fundamental.
pub fn harmonic_power_spectrum(spectrum: &HarmonicSpectrum, load_ohms: f64) -> [f64; 5] {
    spectrum
        .as_dbv()
        .map(|dbv| rf_output_power(dbv_to_linear(dbv), load_ohms))
}

/// DC-to-RF conversion efficiency as a ratio.
pub fn efficiency(rf_watts: f64, dc_watts: f64) -> BenchResult<f64> {
    if dc_watts == 0.0 {
        return Err(BenchError::domain(
            "efficiency",
            "dc power is zero, ratio undefined",
        ));
    }
    Ok(rf_watts / dc_watts)
}

/// Total harmonic distortion: combined harmonic amplitude over the
/// fundamental amplitude, as a ratio.
pub fn thd(spectrum: &HarmonicSpectrum) -> BenchResult<f64> {
    let linear = spectrum.as_dbv().map(dbv_to_linear);
    let fundamental = linear[0];
    if fundamental == 0.0 {
        return Err(BenchError::domain(
            "thd",
            "fundamental amplitude is zero, ratio undefined",
        ));
    }
    let harmonics: f64 = linear[1..].iter().map(|a| a * a).sum();
    Ok(harmonics.sqrt() / fundamental)
}

/// Magnitude response in dB relative to a reference value.
pub fn magnitude_db(values: &[f64], reference: f64) -> BenchResult<Vec<f64>> {
    if reference == 0.0 {
        return Err(BenchError::domain(
            "magnitude_db",
            "reference value is zero, ratio undefined",
        ));
    }
    Ok(values
        .iter()
        .map(|v| 20.0 * (v.abs() / reference.abs()).log10())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn spectrum(dbv: [f64; 5]) -> HarmonicSpectrum {
        HarmonicSpectrum {
            fundamental: dbv[0],
            h2: dbv[1],
            h3: dbv[2],
            h4: dbv[3],
            h5: dbv[4],
        }
    }

    #[test]
    fn test_power() {
        assert_eq!(power(12.0, 0.3), 3.6);
    }

    #[test]
    fn test_rf_output_power_into_50_ohms() {
        assert!((rf_output_power(10.0, 50.0) - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_dbv_to_linear() {
        assert!((dbv_to_linear(0.0) - 1.0).abs() < TOLERANCE);
        assert!((dbv_to_linear(-20.0) - 0.1).abs() < TOLERANCE);
        assert!((dbv_to_linear(20.0) - 10.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_power_dbw() {
        assert!((power_dbw(1.0)).abs() < TOLERANCE);
        assert!((power_dbw(10.0) - 10.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_efficiency_identities() {
        assert!((efficiency(3.0, 3.0).unwrap() - 1.0).abs() < TOLERANCE);
        assert_eq!(efficiency(0.0, 5.0).unwrap(), 0.0);
    }

    #[test]
    fn test_efficiency_zero_dc_power_is_domain_error() {
        let err = efficiency(1.0, 0.0).unwrap_err();
        assert!(err.to_string().contains("efficiency"));
    }

    #[test]
    fn test_thd_reference_scenario() {
        // [0, -20, -30, -40, -50] dBV -> linear [1, 0.1, 0.0316.., 0.01, 0.00316..]
        let value = thd(&spectrum([0.0, -20.0, -30.0, -40.0, -50.0])).unwrap();
        assert!((value - 0.10536).abs() < 1e-4, "thd was {value}");
    }

    #[test]
    fn test_thd_invariant_under_uniform_db_offset() {
        let base = [0.0, -20.0, -30.0, -40.0, -50.0];
        let reference = thd(&spectrum(base)).unwrap();
        for offset in [-40.0, -6.0, 3.0, 17.0] {
            let shifted = spectrum(base.map(|a| a + offset));
            assert!((thd(&shifted).unwrap() - reference).abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_thd_zero_fundamental_is_domain_error() {
        let mut dbv = spectrum([0.0, -20.0, -30.0, -40.0, -50.0]);
        dbv.fundamental = f64::NEG_INFINITY; // linear amplitude 0
        let err = thd(&dbv).unwrap_err();
        assert!(err.to_string().contains("thd"));
    }

    #[test]
    fn test_rf_output_power_monotone_in_amplitude() {
        let mut previous = 0.0;
        for vrms in [0.1, 0.5, 1.0, 2.0, 7.0] {
            let p = rf_output_power(vrms, 50.0);
            assert!(p > previous);
            previous = p;
        }
    }

    #[test]
    fn test_harmonic_power_spectrum_monotone_elementwise() {
        let low = harmonic_power_spectrum(&spectrum([-10.0, -30.0, -40.0, -50.0, -60.0]), 50.0);
        let high = harmonic_power_spectrum(&spectrum([-5.0, -25.0, -35.0, -45.0, -55.0]), 50.0);
        for (lo, hi) in low.iter().zip(high.iter()) {
            assert!(hi > lo);
        }
    }

    #[test]
    fn test_harmonic_power_spectrum_values() {
        let watts = harmonic_power_spectrum(&spectrum([0.0, -20.0, -30.0, -40.0, -50.0]), 50.0);
        assert!((watts[0] - 0.02).abs() < TOLERANCE); // 1 V^2 / 50
        assert!((watts[1] - 0.0002).abs() < TOLERANCE); // 0.1 V^2 / 50
    }

    #[test]
    fn test_magnitude_db() {
        let db = magnitude_db(&[0.05, 0.5, 5.0], 0.05).unwrap();
        assert!(db[0].abs() < TOLERANCE);
        assert!((db[1] - 20.0).abs() < TOLERANCE);
        assert!((db[2] - 40.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_magnitude_db_zero_reference_is_domain_error() {
        assert!(magnitude_db(&[1.0], 0.0).is_err());
    }
}
