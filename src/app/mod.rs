pub mod ports;
pub mod analyze_use_case;
pub mod search_use_case;

pub use analyze_use_case::AnalyzePolicyUseCase;
pub use search_use_case::SearchWeatherEventsUseCase;
