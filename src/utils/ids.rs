use uuid::Uuid;

/// Generates identifiers for runs and streams.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// A short, log-friendly run identifier.
    #[must_use]
    pub fn generate_run_id(&self) -> String {
        format!("run-{}", Uuid::new_v4().simple())
    }
}
