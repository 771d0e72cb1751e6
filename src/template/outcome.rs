use crate::error::PipelineError;

/// Append-only error record of a pipeline run.
///
/// Process errors cover everything up to and including mapping; create
/// errors cover instantiation. Entries are never removed.
#[derive(Debug, Default)]
pub struct Outcome {
    process_errors: Vec<PipelineError>,
    create_errors: Vec<PipelineError>,
}

impl Outcome {
    pub fn record_process(&mut self, error: PipelineError) {
        self.process_errors.push(error);
    }

    pub fn extend_process(&mut self, errors: impl IntoIterator<Item = PipelineError>) {
        self.process_errors.extend(errors);
    }

    pub fn record_create(&mut self, error: PipelineError) {
        self.create_errors.push(error);
    }

    pub fn process_errors(&self) -> &[PipelineError] {
        &self.process_errors
    }

    pub fn create_errors(&self) -> &[PipelineError] {
        &self.create_errors
    }

    /// Process errors followed by create errors.
    pub fn errors(&self) -> impl Iterator<Item = &PipelineError> {
        self.process_errors.iter().chain(self.create_errors.iter())
    }

    pub fn len(&self) -> usize {
        self.process_errors.len() + self.create_errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
