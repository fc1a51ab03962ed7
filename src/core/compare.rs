use std::collections::BTreeMap;

use crate::config::tolerance::{AdditionalOutput, ToleranceConfig};
use crate::core::stats;
use crate::domain::model::{
    Direction, GroupStatistics, IndividualComparison, Method, MethodSummary, PairedResult,
    VerificationSummary,
};

/// Statistical comparison of candidate displacements against the reference
/// set, plus the group acceptance checks.
pub struct ComparisonEngine {
    tolerances: ToleranceConfig,
}

impl ComparisonEngine {
    pub fn new(tolerances: ToleranceConfig) -> Self {
        Self { tolerances }
    }

    pub fn tolerances(&self) -> &ToleranceConfig {
        &self.tolerances
    }

    /// Compare one displacement value against its reference.
    pub fn compare_individual(
        &self,
        test_id: String,
        method: Method,
        direction: Direction,
        reference_cm: f64,
        candidate_cm: f64,
    ) -> IndividualComparison {
        let absolute_error = (candidate_cm - reference_cm).abs();

        let (relative_error, percent_difference) = if reference_cm != 0.0 {
            (
                absolute_error / reference_cm.abs(),
                (candidate_cm - reference_cm) / reference_cm * 100.0,
            )
        } else {
            // Zero reference: any deviation is an infinite relative error.
            (
                if absolute_error > 0.0 { f64::INFINITY } else { 0.0 },
                if candidate_cm != 0.0 { f64::INFINITY } else { 0.0 },
            )
        };

        let tolerance = self.tolerances.tolerance_for(method, Some(reference_cm));

        let passes_absolute = absolute_error <= tolerance.absolute;
        let passes_relative = relative_error <= tolerance.relative;

        // Below the small-displacement threshold the relative error is
        // meaningless, so only the absolute bound applies.
        let passes = if reference_cm <= self.tolerances.small_displacement_threshold() {
            passes_absolute
        } else {
            passes_absolute && passes_relative
        };

        IndividualComparison {
            test_id,
            method,
            direction,
            absolute_error,
            relative_error,
            percent_difference,
            passes,
            tolerance,
            reference_cm,
            candidate_cm,
        }
    }

    /// Compare both directions of one paired record.
    pub fn compare_pair(&self, pair: &PairedResult) -> Vec<IndividualComparison> {
        let method = pair.reference.analysis.method;
        let mut results = Vec::with_capacity(2);

        for direction in [Direction::Normal, Direction::Inverse] {
            results.push(self.compare_individual(
                format!("{}_{}", pair.reference.analysis_id, direction),
                method,
                direction,
                pair.reference.results.displacement_cm(direction),
                pair.candidate.displacement_cm(direction),
            ));
        }

        self.check_additional_outputs(pair);

        results
    }

    /// Secondary outputs (kmax, final vs, final damping) are advisory: a
    /// deviation is logged but does not fail the displacement comparison.
    fn check_additional_outputs(&self, pair: &PairedResult) {
        let checks = [
            (
                AdditionalOutput::Kmax,
                "kmax",
                pair.reference.results.kmax,
                pair.candidate.kmax,
            ),
            (
                AdditionalOutput::Vs,
                "vs_final_mps",
                pair.reference.results.vs_final_mps,
                pair.candidate.vs_final_mps,
            ),
            (
                AdditionalOutput::Damping,
                "damping_final",
                pair.reference.results.damping_final,
                pair.candidate.damping_final,
            ),
        ];

        for (output, name, reference, candidate) in checks {
            let (Some(reference), Some(candidate)) = (reference, candidate) else {
                continue;
            };
            if reference == 0.0 {
                continue;
            }

            let relative_error = (candidate - reference).abs() / reference.abs();
            let limit = self.tolerances.additional_output_tolerance(output);
            if relative_error > limit {
                tracing::warn!(
                    "⚠️ {}: {} deviates {:.1}% from reference (limit {:.1}%)",
                    pair.reference.analysis_id,
                    name,
                    relative_error * 100.0,
                    limit * 100.0
                );
            }
        }
    }

    /// Group statistics for one (method, direction) slice; `direction = None`
    /// pools both directions.
    pub fn analyze_group(
        &self,
        individual: &[IndividualComparison],
        method: Method,
        direction: Option<Direction>,
    ) -> GroupStatistics {
        let filtered: Vec<&IndividualComparison> = individual
            .iter()
            .filter(|r| r.method == method && direction.map_or(true, |d| r.direction == d))
            .collect();

        if filtered.is_empty() {
            return GroupStatistics {
                method,
                direction,
                samples: 0,
                pass_rate: 0.0,
                slope: 0.0,
                intercept: 0.0,
                r_squared: 0.0,
                passes: false,
                mean_relative_error: 0.0,
                std_relative_error: 0.0,
                max_absolute_error: 0.0,
            };
        }

        let samples = filtered.len();
        let passing = filtered.iter().filter(|r| r.passes).count();
        let pass_rate = passing as f64 / samples as f64 * 100.0;

        let reference: Vec<f64> = filtered.iter().map(|r| r.reference_cm).collect();
        let candidate: Vec<f64> = filtered.iter().map(|r| r.candidate_cm).collect();
        let fit = stats::linear_regression(&reference, &candidate);

        let finite_relative: Vec<f64> = filtered
            .iter()
            .map(|r| r.relative_error)
            .filter(|e| e.is_finite())
            .collect();
        let mean_relative_error = stats::mean(&finite_relative);
        let std_relative_error = stats::population_std(&finite_relative);
        let max_absolute_error = filtered
            .iter()
            .map(|r| r.absolute_error)
            .fold(0.0_f64, f64::max);

        let (slope_min, slope_max) = self.tolerances.slope_bounds();
        let (intercept_min, intercept_max) = self.tolerances.intercept_bounds();

        let passes = pass_rate >= self.tolerances.pass_rate_threshold()
            && (slope_min..=slope_max).contains(&fit.slope)
            && (intercept_min..=intercept_max).contains(&fit.intercept)
            && fit.r_squared >= self.tolerances.r_squared_min();

        GroupStatistics {
            method,
            direction,
            samples,
            pass_rate,
            slope: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
            passes,
            mean_relative_error,
            std_relative_error,
            max_absolute_error,
        }
    }

    /// Roll all individual comparisons up into the full summary.
    pub fn summarize(&self, individual: Vec<IndividualComparison>) -> VerificationSummary {
        let total_tests = individual.len();
        let passing_tests = individual.iter().filter(|r| r.passes).count();
        let failing_tests = total_tests - passing_tests;
        let overall_pass_rate = if total_tests > 0 {
            passing_tests as f64 / total_tests as f64 * 100.0
        } else {
            0.0
        };

        let mut groups = Vec::new();
        for method in Method::ALL {
            for direction in [Some(Direction::Normal), Some(Direction::Inverse), None] {
                let group = self.analyze_group(&individual, method, direction);
                if group.samples > 0 {
                    groups.push(group);
                }
            }
        }

        let mut methods = BTreeMap::new();
        for method in Method::ALL {
            let method_results: Vec<&IndividualComparison> =
                individual.iter().filter(|r| r.method == method).collect();
            if method_results.is_empty() {
                continue;
            }

            let passing = method_results.iter().filter(|r| r.passes).count();
            let absolute: Vec<f64> = method_results.iter().map(|r| r.absolute_error).collect();
            let relative: Vec<f64> = method_results
                .iter()
                .map(|r| r.relative_error)
                .filter(|e| e.is_finite())
                .collect();

            methods.insert(
                method,
                MethodSummary {
                    total_tests: method_results.len(),
                    passing_tests: passing,
                    pass_rate: passing as f64 / method_results.len() as f64 * 100.0,
                    mean_absolute_error: stats::mean(&absolute),
                    mean_relative_error: stats::mean(&relative),
                },
            );
        }

        VerificationSummary {
            total_tests,
            passing_tests,
            failing_tests,
            overall_pass_rate,
            individual,
            groups,
            methods,
        }
    }

    /// Human-readable reasons the run is rejected; empty means accepted.
    pub fn failure_lines(&self, summary: &VerificationSummary) -> Vec<String> {
        let mut failures = Vec::new();

        if summary.total_tests == 0 {
            failures.push("No comparisons were performed".to_string());
            return failures;
        }

        let (slope_min, slope_max) = self.tolerances.slope_bounds();
        let (intercept_min, intercept_max) = self.tolerances.intercept_bounds();

        for group in &summary.groups {
            if group.passes {
                continue;
            }

            let label = match group.direction {
                Some(direction) => format!("{} {}", group.method.label(), direction),
                None => format!("{} combined", group.method.label()),
            };

            if group.pass_rate < self.tolerances.pass_rate_threshold() {
                failures.push(format!(
                    "{}: individual pass rate {:.1}% below {:.1}%",
                    label,
                    group.pass_rate,
                    self.tolerances.pass_rate_threshold()
                ));
            }
            if !(slope_min..=slope_max).contains(&group.slope) {
                failures.push(format!(
                    "{}: regression slope {:.6} outside [{}, {}]",
                    label, group.slope, slope_min, slope_max
                ));
            }
            if !(intercept_min..=intercept_max).contains(&group.intercept) {
                failures.push(format!(
                    "{}: regression intercept {:.3} cm outside [{}, {}]",
                    label, group.intercept, intercept_min, intercept_max
                ));
            }
            if group.r_squared < self.tolerances.r_squared_min() {
                failures.push(format!(
                    "{}: R² {:.6} below {}",
                    label,
                    group.r_squared,
                    self.tolerances.r_squared_min()
                ));
            }
        }

        failures
    }
}
