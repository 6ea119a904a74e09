// Concrete collaborators: NOAA historical records and OpenAI chat models

pub mod llm_json;
pub mod noaa;
pub mod openai;
pub mod prompts;
