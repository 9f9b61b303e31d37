pub mod core;
pub mod objects;
pub mod parse;
pub mod prelude;
#[cfg(feature = "ratatui")]
pub mod render;
