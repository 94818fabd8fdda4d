//! Routing pipeline: classification, quality checks and the escalating router.

pub mod classifier;
pub mod quality;
pub mod result;
pub mod router;

pub use classifier::{ClassificationRule, ClassificationTrace, QueryClassifier};
pub use quality::{QualityPolicy, Verdict};
pub use result::{AttemptOutcome, AttemptRecord, RouteOutcome, RoutingResult};
pub use router::QueryRouter;
