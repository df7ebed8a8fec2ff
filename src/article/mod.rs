pub mod extractor;
pub mod fetcher;
pub mod prompt;
pub mod translator;

pub use fetcher::PageFetcher;
pub use translator::ArticleTranslator;
