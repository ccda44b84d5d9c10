/// Runs the steps of a pipeline
mod step_runner;
pub use step_runner::StepRunner;

/// Progress polling on a second thread
mod poller;

/// Collecting failures across steps
mod errors;
pub use errors::Errors;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Step '{0}' has no output named '{1}'")]
    UnknownOutput(String, String),
    #[error("Unable to save outputs of step '{0}': {1}")]
    SaveFailed(String, String),
    #[error("{0} failed due to {1} errors")]
    AggregatedErrors(String, usize),
}
