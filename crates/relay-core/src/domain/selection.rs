use crate::config::BackendConfig;

/// How a backend came to be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// Operator assignment for the model; estimation and probing were skipped.
    ExplicitAssignment,
    /// Lowest priority among backends that fit the model and answered the probe.
    Ranked,
    /// No backend qualified; the first enabled local backend was used.
    DegradedFallback,
}

impl SelectionReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExplicitAssignment => "explicit_assignment",
            Self::Ranked => "ranked",
            Self::DegradedFallback => "degraded_fallback",
        }
    }
}

impl std::fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The backend chosen for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedBackend {
    pub backend: BackendConfig,
    /// Estimated memory used to filter candidates. `None` when estimation
    /// was skipped.
    pub required_memory_gb: Option<f64>,
    pub reason: SelectionReason,
}

impl SelectedBackend {
    pub fn name(&self) -> &str {
        &self.backend.name
    }
}
