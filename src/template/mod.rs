mod cancel;
mod mapping;
mod outcome;
mod parameters;
mod pipeline;
mod scheme;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::CancelSignal;
pub use parameters::parse_assignment;
pub use pipeline::{PipelineTemplate, RunState};
pub use scheme::Scheme;
