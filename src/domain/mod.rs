// Domain data shapes shared across layers

pub mod event;
pub mod policy;

pub use event::{EventType, RawEventCandidate, SourceKind, WeatherEvent};
pub use policy::{PolicyDetails, SearchRequest, NOT_FOUND};
