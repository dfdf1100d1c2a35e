pub mod border;
pub mod dimension;
pub mod font;
pub mod registry;
pub mod text;

pub use border::{Border, BorderStyle};
pub use dimension::{Margins, PageSize};
pub use font::{FontStyle, FontWeight};
pub use registry::{ResolvedStyle, StyleAttributes, StyleError, StyleId, StyleRegistry};
pub use text::TextAlign;
