/// What the pipeline does when one archive fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// First failure stops the whole run
    #[default]
    Abort,
    /// Failed archives are reported; the remaining ones still complete
    Collect,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Collect => write!(f, "collect"),
        }
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "collect" => Ok(FailurePolicy::Collect),
            _ => Err(format!("Invalid failure policy: {}", s)),
        }
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of parallel archive workers
    pub workers: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl PipelineConfig {
    pub fn new(workers: usize, failure_policy: FailurePolicy) -> Self {
        Self {
            workers,
            failure_policy,
        }
    }

    /// Never spawn more workers than there are archives
    pub fn effective_workers(&self, job_count: usize) -> usize {
        self.workers.max(1).min(job_count.max(1))
    }
}
