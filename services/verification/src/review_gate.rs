//! Review gate
//!
//! Pure policy function over the aggregated verification state. One
//! policy governs both automatic completion and human-assisted
//! completion: the gate is re-evaluated after every resolution pass
//! and again after any human correction.

use crestline_models::{CheckResult, CheckStatus, VerificationReport};
use crestline_utils::config::VerificationConfig;

/// Gate decision with the checks that keep the deal from proceeding
#[derive(Debug)]
pub struct GateDecision<'a> {
    pub can_proceed: bool,
    /// Non-passing checks a reviewer needs to see; empty when the deal
    /// proceeds
    pub offending_checks: Vec<&'a CheckResult>,
}

/// Evaluate the gate. The report's overall status is the sole signal;
/// warnings are tolerated up to the configured acceptance threshold.
pub fn evaluate<'a>(
    report: &'a VerificationReport,
    config: &VerificationConfig,
) -> GateDecision<'a> {
    let warning_count = report
        .math_checks
        .iter()
        .chain(report.cross_document_checks.iter())
        .chain(report.ocr_comparisons.iter())
        .filter(|c| c.status == CheckStatus::Warning)
        .count();

    let can_proceed = report.overall_status != CheckStatus::Fail
        && warning_count <= config.max_accepted_warnings;

    let offending_checks =
        if can_proceed { Vec::new() } else { report.failing_checks().collect() };

    GateDecision { can_proceed, offending_checks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crestline_models::{CheckKind, CheckStatus};
    use uuid::Uuid;

    fn config() -> VerificationConfig {
        crestline_utils::AppConfig::default().verification
    }

    fn check(kind: CheckKind, status: CheckStatus) -> CheckResult {
        CheckResult::pass("test_check", kind, "some.path").with_status(status)
    }

    fn report(
        math: Vec<CheckResult>,
        cross: Vec<CheckResult>,
        ocr: Vec<CheckResult>,
        overall: CheckStatus,
    ) -> VerificationReport {
        VerificationReport {
            deal_id: Uuid::new_v4(),
            math_checks: math,
            cross_document_checks: cross,
            ocr_comparisons: ocr,
            overall_status: overall,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pass_proceeds() {
        let report = report(
            vec![check(CheckKind::Math, CheckStatus::Pass)],
            vec![],
            vec![],
            CheckStatus::Pass,
        );
        let decision = evaluate(&report, &config());
        assert!(decision.can_proceed);
        assert!(decision.offending_checks.is_empty());
    }

    #[test]
    fn test_math_failure_blocks() {
        let report = report(
            vec![check(CheckKind::Math, CheckStatus::Fail)],
            vec![],
            vec![],
            CheckStatus::Fail,
        );
        let decision = evaluate(&report, &config());
        assert!(!decision.can_proceed);
        assert_eq!(decision.offending_checks.len(), 1);
    }

    #[test]
    fn test_warnings_within_threshold_proceed() {
        let report = report(
            vec![],
            vec![check(CheckKind::CrossDocument, CheckStatus::Warning)],
            vec![check(CheckKind::OcrComparison, CheckStatus::Warning)],
            CheckStatus::Warning,
        );
        let decision = evaluate(&report, &config());
        assert!(decision.can_proceed);
    }

    #[test]
    fn test_warnings_beyond_threshold_block() {
        let warnings: Vec<CheckResult> = (0..5)
            .map(|_| check(CheckKind::CrossDocument, CheckStatus::Warning))
            .collect();
        let report = report(vec![], warnings, vec![], CheckStatus::Warning);
        let decision = evaluate(&report, &config());
        assert!(!decision.can_proceed);
        assert_eq!(decision.offending_checks.len(), 5);
    }

    #[test]
    fn test_gate_is_deterministic() {
        let report = report(
            vec![check(CheckKind::Math, CheckStatus::Fail)],
            vec![],
            vec![],
            CheckStatus::Fail,
        );
        let first = evaluate(&report, &config()).can_proceed;
        let second = evaluate(&report, &config()).can_proceed;
        assert_eq!(first, second);
    }
}
