//! Request, response and record types, plus the collaborator traits.
//!
//! Everything here is serde-serializable so a transport layer can speak
//! JSON without extra mapping.

mod collaborators;
mod record;
mod request;
mod response;

pub use collaborators::{DemandForecast, MemorySink, RunSink};
pub use record::{PhaseTiming, RunRecord};
pub use request::{
    AlgorithmMode, BusInput, ConstraintInput, ExplainMode, ExplainRequest, OptimizationRequest,
    RiderSource, StopInput, WindowInput,
};
pub use response::{OptimizationResponse, RunMetrics};
