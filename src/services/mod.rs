pub mod assembler;
pub mod enrichment;
pub mod neighbors;
pub mod providers;
pub mod recommendations;
pub mod similarity;

pub use enrichment::{EnrichmentFanout, EnrichmentOutcome};
pub use providers::{EnrichmentError, EnrichmentSource};
