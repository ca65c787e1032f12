mod barrier;
mod builder;
mod orchestrator;

pub use builder::NetBuilder;
pub use orchestrator::Net;

use barrier::CompletionBarrier;
