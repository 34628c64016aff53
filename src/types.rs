//! Public types shared between the coordinator and the search driver.

/// Correlation tag embedded in each outbound configuration. Strictly
/// increasing within a run, starting at 1; never reused while pending.
pub type DispatchId = u64;

/// Driver-owned tag identifying which search request an evaluation belongs
/// to. The coordinator holds it read-only until the matching result arrives
/// and hands it back unchanged in the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestHandle(pub u64);

impl std::fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one evaluated configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrialOutcome {
    /// Evaluator measured the configuration in this many milliseconds.
    Time(f64),
    /// Evaluator reported a negative time: the configuration itself
    /// misbehaved or crashed. A normal outcome, not a transport error.
    Failed,
    /// The run wound down before a result arrived for this request.
    Aborted,
}

impl TrialOutcome {
    /// Time-based score for comparing trials; failures and aborts rank
    /// behind every measured time.
    pub fn score(&self) -> f64 {
        match self {
            TrialOutcome::Time(millis) => *millis,
            TrialOutcome::Failed | TrialOutcome::Aborted => f64::INFINITY,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, TrialOutcome::Time(_))
    }
}

/// One completed (or aborted) evaluation, delivered to the driver's sink in
/// evaluator completion order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialReport {
    pub handle: RequestHandle,
    pub outcome: TrialOutcome,
}

/// Where the coordinator delivers completed trials. Implemented for a
/// crossbeam sender so a single-threaded driver can queue reports and drain
/// them between coordinator calls.
pub trait ResultSink {
    fn report(&mut self, report: TrialReport);
}

impl ResultSink for crossbeam_channel::Sender<TrialReport> {
    fn report(&mut self, report: TrialReport) {
        // A dropped receiver means the driver stopped listening; nothing
        // useful to do with the report at this point.
        let _ = self.send(report);
    }
}

impl ResultSink for Vec<TrialReport> {
    fn report(&mut self, report: TrialReport) {
        self.push(report);
    }
}
