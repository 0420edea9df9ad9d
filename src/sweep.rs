//! Generic sweep engine: configure a parameter, wait for the device to
//! settle, take one measurement, record the pair.
//!
//! The same loop drives the frequency sweep, the bode sweep, and the DC
//! operating-point sweep; only the setpoint domain and the step
//! implementation differ. Ordering is strict: setpoints are visited exactly
//! in the order given, one measurement each, no skipping and no parallelism.
//! The settle delay is a true wait, applied once per setpoint after
//! configuration and before measurement, because physical settling governs
//! measurement validity.

use crate::error::{BenchError, BenchResult};
use crate::measure::{Sample, SweepPoint};
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

/// One step of a sweep: how to apply a setpoint and how to read back the
/// resulting measurement.
#[async_trait]
pub trait SweepStep: Send + Sync {
    /// Applies the setpoint to the instrument.
    async fn configure(&self, setpoint: f64) -> BenchResult<()>;

    /// Takes the single measurement for this setpoint.
    async fn measure(&self, setpoint: f64) -> BenchResult<Sample>;

    /// Runs after the measurement, before the next setpoint. The DC sweep
    /// uses this to pulse the supply output off between points.
    async fn after_measure(&self, _setpoint: f64) -> BenchResult<()> {
        Ok(())
    }
}

/// Runs a sweep over `setpoints`, returning one [`SweepPoint`] per setpoint
/// in iteration order.
pub async fn run_sweep<S: SweepStep + ?Sized>(
    step: &S,
    setpoints: &[f64],
    settle: Duration,
) -> BenchResult<Vec<SweepPoint>> {
    if setpoints.is_empty() {
        return Err(BenchError::domain("run_sweep", "empty setpoint domain"));
    }

    let mut points = Vec::with_capacity(setpoints.len());
    for &setpoint in setpoints {
        step.configure(setpoint).await?;
        tokio::time::sleep(settle).await;
        let sample = step.measure(setpoint).await?;
        debug!("sweep point {:.6e} -> {:.6e} {}", setpoint, sample.value, sample.unit);
        step.after_measure(setpoint).await?;
        points.push(SweepPoint { setpoint, sample });
    }
    Ok(points)
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|k| start + (stop - start) * k as f64 / (n - 1) as f64)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Unit;
    use std::sync::Mutex;

    /// Stub step that reports the setpoint scaled to MHz and logs call order.
    struct MegahertzStub {
        calls: Mutex<Vec<(String, f64)>>,
    }

    impl MegahertzStub {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn log(&self, what: &str, setpoint: f64) {
            self.calls
                .lock()
                .expect("call log poisoned")
                .push((what.to_string(), setpoint));
        }
    }

    #[async_trait]
    impl SweepStep for MegahertzStub {
        async fn configure(&self, setpoint: f64) -> BenchResult<()> {
            self.log("configure", setpoint);
            Ok(())
        }

        async fn measure(&self, setpoint: f64) -> BenchResult<Sample> {
            self.log("measure", setpoint);
            Ok(Sample::new(setpoint / 1.0e6, Unit::Volt))
        }

        async fn after_measure(&self, setpoint: f64) -> BenchResult<()> {
            self.log("after", setpoint);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sweep_reference_scenario() {
        let stub = MegahertzStub::new();
        let setpoints = [4.0e6, 8.0e6, 12.0e6];
        let points = run_sweep(&stub, &setpoints, Duration::ZERO).await.unwrap();

        assert_eq!(points.len(), 3);
        let observed: Vec<(f64, f64)> = points
            .iter()
            .map(|p| (p.setpoint, p.sample.value))
            .collect();
        assert_eq!(observed, vec![(4.0e6, 4.0), (8.0e6, 8.0), (12.0e6, 12.0)]);
    }

    #[tokio::test]
    async fn test_sweep_preserves_setpoint_order() {
        let stub = MegahertzStub::new();
        let setpoints: Vec<f64> = (0..17).map(|k| 1.0e6 * (17 - k) as f64).collect();
        let points = run_sweep(&stub, &setpoints, Duration::ZERO).await.unwrap();

        assert_eq!(points.len(), setpoints.len());
        for (point, expected) in points.iter().zip(setpoints.iter()) {
            assert_eq!(point.setpoint, *expected);
        }
    }

    #[tokio::test]
    async fn test_sweep_step_order_per_setpoint() {
        let stub = MegahertzStub::new();
        run_sweep(&stub, &[1.0, 2.0], Duration::ZERO).await.unwrap();

        let calls = stub.calls.lock().expect("call log poisoned");
        let order: Vec<&str> = calls.iter().map(|(what, _)| what.as_str()).collect();
        assert_eq!(
            order,
            vec!["configure", "measure", "after", "configure", "measure", "after"]
        );
    }

    #[tokio::test]
    async fn test_empty_domain_is_domain_error() {
        let stub = MegahertzStub::new();
        let err = run_sweep(&stub, &[], Duration::ZERO).await.unwrap_err();
        assert!(err.to_string().contains("run_sweep"));
    }

    #[test]
    fn test_linspace_endpoints_and_spacing() {
        let points = linspace(4.0e6, 18.0e6, 41);
        assert_eq!(points.len(), 41);
        assert_eq!(points[0], 4.0e6);
        assert_eq!(points[40], 18.0e6);
        assert!((points[1] - points[0] - 0.35e6).abs() < 1.0);
    }

    #[test]
    fn test_linspace_degenerate_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(5.0, 9.0, 1), vec![5.0]);
    }
}
