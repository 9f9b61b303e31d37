pub use crate::core::{viewport_centered, MapGrid, MapRead, MapSize, TileKind};
pub use crate::objects::{
    parse_object_sections, split_level_text, ObjectSheet, RawMapObject, RawProperty,
};
pub use crate::parse::{parse_char_grid, Legend, LegendBuilder, ParseError, ParseOptions, TrimMode};

#[cfg(feature = "ratatui")]
pub use crate::render::{
    adjust_color, cell_seed, tile_seed, Camera, MapRenderResult, MapRenderer, MapRendererBuilder,
    RenderConfig, TextureVariant, TilePaint, TilePalette, TileTheme, TileThemeBuilder,
};
