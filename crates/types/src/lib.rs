pub mod color;
pub mod units;

pub use color::Color;
pub use units::{cm, inch, mm};
