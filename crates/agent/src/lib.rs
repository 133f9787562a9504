pub mod format;
pub mod llm;
pub mod skills;

pub use llm::{analyze_food_request, FoodIntent, LlmClient, OpenAiCompatClient};
pub use skills::{DetailParams, RecommendParams, SearchParams, SkillError, SkillRouter, SKILL_IDS};
