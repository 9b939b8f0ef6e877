pub mod citations;
pub mod llm;
pub mod prompt;
pub mod render;
pub mod retrieve;
pub mod synthesize;
