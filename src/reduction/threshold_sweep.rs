//! The threshold search: calibration descent followed by the upward sweep.
//!
//! Both loops are bounded iterations with explicit state, driven against a
//! [`TrialEvaluator`] so the control flow is testable without any chemistry behind it.

use crate::chem::Model;
use crate::error::{ReductionError, THRESHOLD_FLOOR};
use log::{debug, info};
use std::collections::BTreeSet;

/// The outcome of one reduction attempt at a fixed threshold.
#[derive(Debug, Clone)]
pub struct Trial {
    pub threshold: f64,
    /// Measured ignition-delay error in percent (100 when the candidate failed).
    pub error: f64,
    /// Names of the retained species.
    pub retained: BTreeSet<String>,
    /// The trimmed candidate model.
    pub model: Model,
}

/// Evaluates one pruning threshold: prune, trim, re-simulate, measure.
///
/// Implementations are expected to absorb recoverable simulation failures into a
/// trial error of 100 and to reuse the previous result when a threshold selects the
/// identical retained-species set.
pub trait TrialEvaluator {
    fn evaluate(&mut self, threshold: f64) -> Result<Trial, ReductionError>;
}

impl<F> TrialEvaluator for F
where
    F: FnMut(f64) -> Result<Trial, ReductionError>,
{
    fn evaluate(&mut self, threshold: f64) -> Result<Trial, ReductionError> {
        self(threshold)
    }
}

/// Explicit state of the threshold search.
pub struct ThresholdSweep {
    threshold: f64,
    increment: f64,
    tolerance: f64,
    starting_error: f64,
}

impl ThresholdSweep {
    /// Start at threshold 0.1 with increment 0.1.
    pub fn new(tolerance: f64, starting_error: f64) -> ThresholdSweep {
        ThresholdSweep {
            threshold: 0.1,
            increment: 0.1,
            tolerance,
            starting_error,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Find a viable starting threshold by dividing threshold and increment by 10
    /// until a trial reaches the viable-start error, failing with
    /// [`ReductionError::ThresholdUnderflow`] below the threshold floor.
    pub fn calibrate<E: TrialEvaluator>(
        &mut self,
        evaluator: &mut E,
    ) -> Result<Trial, ReductionError> {
        let mut trial = evaluator.evaluate(self.threshold)?;
        while trial.error > self.tolerance {
            self.threshold /= 10.0;
            self.increment /= 10.0;
            if self.threshold < THRESHOLD_FLOOR {
                return Err(ReductionError::ThresholdUnderflow);
            }
            debug!(
                "Calibration: error {:.2}% > tolerance, retrying at threshold {:.0e}.",
                trial.error, self.threshold
            );
            trial = evaluator.evaluate(self.threshold)?;
            if trial.error <= self.starting_error {
                break;
            }
        }
        info!(
            "Calibrated starting threshold {:.0e} (error {:.2}%).",
            self.threshold, trial.error
        );
        Ok(trial)
    }

    /// Sweep the threshold upward from a calibrated first trial.
    ///
    /// Every trial within tolerance whose retained set differs from the previous
    /// iteration is recorded (and reported through `on_record`); the sweep stops when
    /// the error exceeds the tolerance or nothing beyond `protected` is left to
    /// eliminate. Returns the last recorded trial.
    pub fn sweep<E: TrialEvaluator>(
        &mut self,
        evaluator: &mut E,
        first: Trial,
        protected: &BTreeSet<String>,
        mut on_record: impl FnMut(&Trial) -> Result<(), ReductionError>,
    ) -> Result<Option<Trial>, ReductionError> {
        let mut best: Option<Trial> = None;
        let mut previous_retained: Option<BTreeSet<String>> = None;
        let mut current = first;

        loop {
            if current.error > self.tolerance {
                debug!(
                    "Sweep stops: error {:.2}% above tolerance at threshold {:.4e}.",
                    current.error, current.threshold
                );
                break;
            }
            if previous_retained.as_ref() != Some(&current.retained) {
                info!(
                    "[threshold {:.4e}] accepted {} species (error {:.2}%).",
                    current.threshold,
                    current.retained.len(),
                    current.error
                );
                on_record(&current)?;
                best = Some(current.clone());
            }
            let exhausted = current.retained.iter().all(|s| protected.contains(s));
            previous_retained = Some(current.retained.clone());
            if exhausted {
                debug!("Sweep stops: only protected species remain.");
                break;
            }

            self.threshold += self.increment;
            current = evaluator.evaluate(self.threshold)?;
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReductionError;
    use crate::test_utils::init_logger;
    use std::collections::BTreeSet;

    /// A scripted evaluator: maps a threshold to (error, retained-set size), recording
    /// every threshold it is asked about. Retained sets shrink as thresholds grow.
    struct Scripted {
        evaluated: Vec<f64>,
        error_of: Box<dyn Fn(f64) -> f64>,
        retained_of: Box<dyn Fn(f64) -> usize>,
    }

    impl Scripted {
        fn new(
            error_of: impl Fn(f64) -> f64 + 'static,
            retained_of: impl Fn(f64) -> usize + 'static,
        ) -> Scripted {
            Scripted {
                evaluated: Vec::new(),
                error_of: Box::new(error_of),
                retained_of: Box::new(retained_of),
            }
        }
    }

    impl TrialEvaluator for Scripted {
        fn evaluate(&mut self, threshold: f64) -> Result<Trial, ReductionError> {
            self.evaluated.push(threshold);
            let retained: BTreeSet<String> = (0..(self.retained_of)(threshold))
                .map(|i| format!("S{}", i))
                .collect();
            Ok(Trial {
                threshold,
                error: (self.error_of)(threshold),
                retained,
                model: empty_model(),
            })
        }
    }

    fn empty_model() -> crate::chem::Model {
        crate::chem::Model {
            name: String::new(),
            species: Vec::new(),
            reactions: Vec::new(),
        }
    }

    /// An evaluator that over-reduces at every threshold forces the calibration all
    /// the way below the floor.
    #[test]
    fn hopeless_calibration_underflows() {
        init_logger();
        let mut evaluator = Scripted::new(|_| 100.0, |_| 2);
        let mut sweep = ThresholdSweep::new(5.0, 0.02);

        let result = sweep.calibrate(&mut evaluator);
        assert!(matches!(result, Err(ReductionError::ThresholdUnderflow)));
        // 0.1 down to 1e-5: evaluated at 0.1, 0.01, 1e-3, 1e-4, 1e-5.
        assert_eq!(evaluator.evaluated.len(), 5);
    }

    /// Calibration divides by 10 until the viable-start error is reached, and the
    /// increment follows the threshold down.
    #[test]
    fn calibration_descends_to_viable_start() {
        init_logger();
        let mut evaluator = Scripted::new(|t| if t > 5e-3 { 80.0 } else { 0.01 }, |_| 5);
        let mut sweep = ThresholdSweep::new(5.0, 0.02);

        let first = sweep.calibrate(&mut evaluator).unwrap();
        assert!((first.threshold - 1e-3).abs() < 1e-12);
        assert!((sweep.threshold() - 1e-3).abs() < 1e-12);
        assert!((sweep.increment() - 1e-3).abs() < 1e-12);
        let expected = [0.1, 0.01, 1e-3];
        assert_eq!(evaluator.evaluated.len(), expected.len());
        for (got, want) in evaluator.evaluated.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    /// A first trial already within tolerance needs no descent.
    #[test]
    fn viable_first_trial_skips_descent() {
        init_logger();
        let mut evaluator = Scripted::new(|_| 1.0, |_| 5);
        let mut sweep = ThresholdSweep::new(5.0, 0.02);

        let first = sweep.calibrate(&mut evaluator).unwrap();
        assert_eq!(first.threshold, 0.1);
        assert_eq!(evaluator.evaluated, vec![0.1]);
    }

    /// The sweep records improving trials and returns the last accepted one.
    #[test]
    fn sweep_returns_last_accepted_trial() {
        init_logger();
        // Retained species shrink with the threshold; the error jumps over tolerance
        // beyond 0.35.
        let mut evaluator = Scripted::new(
            |t| if t > 0.35 { 40.0 } else { t * 10.0 },
            |t| (10.0 - t * 10.0).ceil() as usize,
        );
        let mut sweep = ThresholdSweep::new(5.0, 0.02);
        let first = sweep.calibrate(&mut evaluator).unwrap();

        let mut recorded = Vec::new();
        let best = sweep
            .sweep(&mut evaluator, first, &BTreeSet::new(), |trial| {
                recorded.push(trial.threshold);
                Ok(())
            })
            .unwrap()
            .expect("at least the calibrated trial is accepted");

        assert!((best.threshold - 0.3).abs() < 1e-12);
        assert_eq!(best.retained.len(), 7);
        let expected = [0.1, 0.2, 0.3];
        assert_eq!(recorded.len(), expected.len());
        for (got, want) in recorded.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    /// Identical retained sets between consecutive thresholds are not re-recorded.
    #[test]
    fn unchanged_retained_set_is_not_recorded_twice() {
        init_logger();
        let mut evaluator = Scripted::new(|_| 1.0, |t| if t < 0.45 { 6 } else { 3 });
        let mut sweep = ThresholdSweep::new(5.0, 0.02);
        let first = sweep.calibrate(&mut evaluator).unwrap();

        let mut recorded = Vec::new();
        // Protect the three species that always survive, so the sweep terminates once
        // everything else is eliminated.
        let protected: BTreeSet<String> = (0..3).map(|i| format!("S{}", i)).collect();
        let best = sweep
            .sweep(&mut evaluator, first, &protected, |trial| {
                recorded.push(trial.threshold);
                Ok(())
            })
            .unwrap()
            .unwrap();

        // Recorded once for the 6-species set and once for the 3-species set.
        assert_eq!(recorded.len(), 2);
        assert_eq!(best.retained.len(), 3);
    }

    /// The sweep terminates once only protected species remain, even while the error
    /// stays within tolerance.
    #[test]
    fn sweep_terminates_on_protected_floor() {
        init_logger();
        let mut evaluator = Scripted::new(|_| 0.5, |_| 2);
        let mut sweep = ThresholdSweep::new(5.0, 0.02);
        let first = sweep.calibrate(&mut evaluator).unwrap();

        let protected: BTreeSet<String> = (0..2).map(|i| format!("S{}", i)).collect();
        let best = sweep
            .sweep(&mut evaluator, first, &protected, |_| Ok(()))
            .unwrap()
            .unwrap();
        assert_eq!(best.retained.len(), 2);
        // One evaluation for calibration; the sweep itself stops immediately.
        assert_eq!(evaluator.evaluated, vec![0.1]);
    }
}
