use tracing::{error, info, warn};

use crate::config::FailurePolicy;
use crate::error::{BootstrapError, Result};

/// What a stage reports when it does not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult {
    Done,
    /// Nothing to do; the reason is logged and recorded.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Done,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: &'static str,
    pub status: StageStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub outcomes: Vec<StageOutcome>,
}

impl PipelineReport {
    pub fn stages(&self) -> Vec<&'static str> {
        self.outcomes.iter().map(|outcome| outcome.stage).collect()
    }

    pub fn status_of(&self, stage: &str) -> Option<&StageStatus> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.stage == stage)
            .map(|outcome| &outcome.status)
    }
}

type StageFn<'a> = Box<dyn FnOnce() -> Result<StageResult> + 'a>;

/// Ordered list of dependent stages run under a [`FailurePolicy`].
pub struct Pipeline<'a> {
    name: &'static str,
    policy: FailurePolicy,
    stages: Vec<(&'static str, StageFn<'a>)>,
}

impl<'a> Pipeline<'a> {
    pub fn new(name: &'static str, policy: FailurePolicy) -> Self {
        Self {
            name,
            policy,
            stages: Vec::new(),
        }
    }

    #[must_use]
    pub fn stage(
        mut self,
        stage: &'static str,
        run: impl FnOnce() -> Result<StageResult> + 'a,
    ) -> Self {
        self.stages.push((stage, Box::new(run)));
        self
    }

    /// Run the stages in order.
    ///
    /// With [`FailurePolicy::FailFast`] the first error is returned as-is and
    /// later stages never run. With [`FailurePolicy::KeepGoing`] every stage
    /// runs and all errors come back as [`BootstrapError::Multiple`].
    pub fn run(self) -> Result<PipelineReport> {
        let total = self.stages.len();
        let mut report = PipelineReport::default();
        let mut failures = Vec::new();

        for (index, (stage, run)) in self.stages.into_iter().enumerate() {
            info!(pipeline = self.name, stage, step = index + 1, total, "running stage");
            let status = match run() {
                Ok(StageResult::Done) => StageStatus::Done,
                Ok(StageResult::Skipped(reason)) => {
                    warn!(pipeline = self.name, stage, %reason, "stage skipped");
                    StageStatus::Skipped(reason)
                }
                Err(err) => {
                    error!(pipeline = self.name, stage, error = %err, "stage failed");
                    if self.policy == FailurePolicy::FailFast {
                        return Err(err);
                    }
                    let message = err.to_string();
                    failures.push(err);
                    StageStatus::Failed(message)
                }
            };
            report.outcomes.push(StageOutcome { stage, status });
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(BootstrapError::Multiple { total, failures })
        }
    }
}
