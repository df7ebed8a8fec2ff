pub mod azure_openai_llm;
pub mod completion_interface;

pub use azure_openai_llm::*;
pub use completion_interface::*;
