//! Research plans and the corpora built from them.

pub mod corpus;
pub mod plan;

pub use corpus::{CorpusManager, CorpusOutcome};
pub use plan::{PlanStore, ResearchPlanConfig};
