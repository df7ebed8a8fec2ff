pub mod interface;
pub mod language;

pub use interface::*;
pub use language::Language;
