/// Classification of validator output into a pass/fail verdict.
use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::defs::VALIDATION_FAILURE_MARKER;

/// Outcome of one validation run, with the raw report kept for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub passed: bool,
    pub report: String,
}

lazy_static! {
    static ref ERROR_TOKEN: Regex = Regex::new(r"ERROR:(\w+)").unwrap();
}

/// Scans a validator report for disqualifying error tokens.
///
/// An empty report passes vacuously. A missing ignore set means no token is
/// ignorable, so any detected error fails. The generic failure marker
/// anywhere in the text fails immediately regardless of the ignore set.
pub fn classify(report: &str, ignore: Option<&HashSet<String>>) -> ValidationVerdict {
    let verdict = |passed| ValidationVerdict {
        passed,
        report: report.to_string(),
    };

    if report.is_empty() {
        return verdict(true);
    }

    if report.contains(VALIDATION_FAILURE_MARKER) {
        return verdict(false);
    }

    for line in report.lines() {
        if let Some(caps) = ERROR_TOKEN.captures(line) {
            let token = &caps[1];
            let ignored = ignore.is_some_and(|set| set.contains(token));
            if !ignored {
                return verdict(false);
            }
        }
    }

    verdict(true)
}
