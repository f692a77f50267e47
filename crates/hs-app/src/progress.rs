use hs_jobs::JobStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum RunStage {
    Submitting,
    Polling,
    FetchingResults,
    Completed,
    InvalidResult,
    Failed,
    TimedOut,
    Cancelled,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::Submitting => "submitting",
            RunStage::Polling => "polling",
            RunStage::FetchingResults => "fetching results",
            RunStage::Completed => "completed",
            RunStage::InvalidResult => "invalid result",
            RunStage::Failed => "failed",
            RunStage::TimedOut => "timed out",
            RunStage::Cancelled => "cancelled",
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(
            self,
            RunStage::Submitting | RunStage::Polling | RunStage::FetchingResults
        )
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub generation: u64,
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub job_status: Option<JobStatus>,
    pub message: Option<String>,
}

impl RunProgressEvent {
    pub fn stage(
        generation: u64,
        stage: RunStage,
        elapsed_wall_s: f64,
        message: Option<String>,
    ) -> Self {
        Self {
            generation,
            stage,
            elapsed_wall_s,
            job_status: None,
            message,
        }
    }
}
