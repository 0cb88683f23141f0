pub mod detector;
pub mod filters;
pub mod qualifier;
pub mod ring;
pub mod rr;

pub use detector::{QrsDetector, SampleResult};
pub use filters::FilterChain;
pub use qualifier::{PeakQualifier, Qualification, SignalView};
pub use ring::SignalRing;
pub use rr::{RhythmAssessment, RrTracker};
