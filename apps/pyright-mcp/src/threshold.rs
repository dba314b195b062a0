//! Severity threshold evaluation.

use crate::models::{Diagnostic, FailOn, Severity};

/// Compute the verdict for `diags` under `threshold`.
///
/// Returns `(ok, reason)`; `reason` is set only when the threshold is breached.
pub fn evaluate(diags: &[Diagnostic], threshold: FailOn) -> (bool, Option<String>) {
    let Some(floor) = threshold.threshold_level() else {
        return (true, None);
    };
    let mut max = 0u8;
    for d in diags {
        max = max.max(d.severity_level());
        if max >= Severity::Error.level() {
            break;
        }
    }
    if max > 0 && max >= floor {
        let reason = format!(
            "fail_on_severity '{}' breached (max_severity_level={}).",
            threshold, max
        );
        return (false, Some(reason));
    }
    (true, None)
}
