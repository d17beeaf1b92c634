//! Check combinators: statuses, located errors and report merging. The
//! classifiers in [`super::rules`] are built entirely out of these.

use crate::domain::model::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Critical,
}

impl CheckStatus {
    /// AND semantics: the worst status wins.
    pub fn and(self, other: CheckStatus) -> CheckStatus {
        use CheckStatus::*;
        match (self, other) {
            (Critical, _) | (_, Critical) => Critical,
            (Warning, _) | (_, Warning) => Warning,
            _ => Ok,
        }
    }

    /// OR semantics: the best status wins.
    pub fn or(self, other: CheckStatus) -> CheckStatus {
        use CheckStatus::*;
        match (self, other) {
            (Ok, _) | (_, Ok) => Ok,
            (Warning, _) | (_, Warning) => Warning,
            _ => Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckError {
    pub message: String,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub status: CheckStatus,
    pub errors: Vec<CheckError>,
    pub checks_run: usize,
}

impl CheckReport {
    /// Neutral element for [`all_of`].
    pub fn empty() -> Self {
        Self {
            status: CheckStatus::Ok,
            errors: Vec::new(),
            checks_run: 0,
        }
    }

    /// A single passing check.
    pub fn passed() -> Self {
        Self {
            status: CheckStatus::Ok,
            errors: Vec::new(),
            checks_run: 1,
        }
    }

    /// A single failing check.
    pub fn failed(status: CheckStatus, message: String, location: Option<Location>) -> Self {
        Self {
            status,
            errors: vec![CheckError { message, location }],
            checks_run: 1,
        }
    }

    pub fn from_predicate(
        ok: bool,
        status: CheckStatus,
        message: impl FnOnce() -> String,
        location: Option<Location>,
    ) -> Self {
        if ok {
            Self::passed()
        } else {
            Self::failed(status, message(), location)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == CheckStatus::Ok
    }

    pub fn and(mut self, other: CheckReport) -> CheckReport {
        self.status = self.status.and(other.status);
        self.errors.extend(other.errors);
        self.checks_run += other.checks_run;
        self
    }

    /// Prepends an aggregate error when the report failed; used when a group
    /// of item checks rolls up to its owning entity.
    pub fn labelled(
        mut self,
        message: impl FnOnce() -> String,
        location: Option<Location>,
    ) -> CheckReport {
        if !self.is_ok() {
            self.errors.insert(
                0,
                CheckError {
                    message: message(),
                    location,
                },
            );
        }
        self
    }

    pub fn fail_rate(&self) -> f64 {
        if self.checks_run == 0 {
            0.0
        } else {
            self.errors.len() as f64 / self.checks_run as f64
        }
    }
}

pub fn all_of(reports: impl IntoIterator<Item = CheckReport>) -> CheckReport {
    reports
        .into_iter()
        .fold(CheckReport::empty(), CheckReport::and)
}

/// AND with short-circuit: stops after the first non-passing check, which is
/// still included in the result.
pub fn all_of_short_circuit<I, F>(checks: I) -> CheckReport
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> CheckReport,
{
    let mut acc = CheckReport::empty();
    for check in checks {
        let report = check();
        let failed = !report.is_ok();
        acc = acc.and(report);
        if failed {
            break;
        }
    }
    acc
}

/// OR: the first passing report wins outright; otherwise every error is
/// accumulated. With no reports at all the result is critical.
pub fn one_of(reports: impl IntoIterator<Item = CheckReport>) -> CheckReport {
    let mut errors = Vec::new();
    let mut checks_run = 0;
    let mut status = CheckStatus::Critical;
    for report in reports {
        if report.is_ok() {
            return CheckReport {
                status: CheckStatus::Ok,
                errors: Vec::new(),
                checks_run: report.checks_run,
            };
        }
        errors.extend(report.errors);
        checks_run += report.checks_run;
        status = status.or(report.status);
    }
    CheckReport {
        status,
        errors,
        checks_run,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warn(msg: &str) -> CheckReport {
        CheckReport::failed(CheckStatus::Warning, msg.to_string(), None)
    }

    fn critical(msg: &str) -> CheckReport {
        CheckReport::failed(CheckStatus::Critical, msg.to_string(), None)
    }

    #[test]
    fn and_takes_the_worst_status() {
        let report = all_of([CheckReport::passed(), warn("w"), critical("c")]);
        assert_eq!(report.status, CheckStatus::Critical);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.checks_run, 3);
    }

    #[test]
    fn or_takes_the_first_passing_report() {
        let report = one_of([critical("c"), CheckReport::passed(), warn("w")]);
        assert!(report.is_ok());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn or_accumulates_when_nothing_passes() {
        let report = one_of([critical("c"), warn("w")]);
        assert_eq!(report.status, CheckStatus::Warning);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.checks_run, 2);
    }

    #[test]
    fn short_circuit_stops_after_first_failure() {
        let mut ran = false;
        let checks: Vec<Box<dyn FnOnce() -> CheckReport + '_>> = vec![
            Box::new(CheckReport::passed),
            Box::new(|| warn("stop here")),
            Box::new(|| {
                ran = true;
                CheckReport::passed()
            }),
        ];
        let report = all_of_short_circuit(checks);
        assert_eq!(report.status, CheckStatus::Warning);
        assert_eq!(report.checks_run, 2);
        assert!(!ran);
    }

    #[test]
    fn fail_rate_is_errors_over_checks() {
        let report = all_of([CheckReport::passed(), CheckReport::passed(), warn("w")]);
        assert!((report.fail_rate() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(CheckReport::empty().fail_rate(), 0.0);
    }

    #[test]
    fn labelled_prepends_an_aggregate_error_only_on_failure() {
        let ok = CheckReport::passed().labelled(|| "unused".to_string(), None);
        assert!(ok.errors.is_empty());

        let bad = warn("inner").labelled(|| "outer".to_string(), None);
        assert_eq!(bad.errors[0].message, "outer");
        assert_eq!(bad.errors[1].message, "inner");
    }
}
