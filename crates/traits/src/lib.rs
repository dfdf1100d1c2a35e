pub mod font;

pub use font::{FontDescriptor, FontError, FontProvider, FontQuery, InMemoryFontProvider, SharedFontData};
