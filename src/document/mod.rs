pub mod azure_translator;
pub mod docx;
pub mod interface;
pub mod translator;

pub use azure_translator::AzureDocumentTranslator;
pub use interface::DocumentTranslationInterface;
pub use translator::DocumentTranslator;
