//! Text extents measured from the font file `drawtext` will render with.

use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use parley::fontique::Blob;
use parley::style::{FontStack, StyleProperty};
use parley::{FontContext, LayoutContext};

use crate::error::{BurninError, Result};

/// A font file registered in its own collection, so families never collide
struct LoadedFont {
    font_ctx: FontContext,
    family_name: String,
}

/// Shapes single-line text with Parley, loading each font file once
pub struct TextMeasurer {
    layout_ctx: LayoutContext<[u8; 4]>,
    fonts: HashMap<PathBuf, LoadedFont>,
}

impl Default for TextMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextMeasurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextMeasurer")
            .field("fonts", &self.fonts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TextMeasurer {
    pub fn new() -> Self {
        Self {
            layout_ctx: LayoutContext::new(),
            fonts: HashMap::new(),
        }
    }

    /// Advance width of `text` in whole pixels, set in `font` at `font_size`
    pub fn text_width(&mut self, font: &Path, text: &str, font_size: u32) -> Result<u32> {
        if font_size == 0 {
            return Err(BurninError::Config("font_size must be greater than 0".to_string()));
        }
        if text.is_empty() {
            return Ok(0);
        }

        let loaded = match self.fonts.entry(font.to_path_buf()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(load_font(font)?),
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut loaded.font_ctx, text, 1.0, true);
        builder.push_default(StyleProperty::FontStack(FontStack::Source(Cow::Owned(
            loaded.family_name.clone(),
        ))));
        builder.push_default(StyleProperty::FontSize(font_size as f32));

        let mut layout = builder.build(text);
        layout.break_all_lines(None);

        Ok(layout.width().ceil() as u32)
    }
}

fn load_font(path: &Path) -> Result<LoadedFont> {
    let bytes = std::fs::read(path)
        .map_err(|e| BurninError::Font(format!("Failed to read {}: {}", path.display(), e)))?;

    let mut font_ctx = FontContext::default();
    let families = font_ctx.collection.register_fonts(Blob::from(bytes), None);
    let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
        BurninError::Font(format!("No font family found in {}", path.display()))
    })?;

    let family_name = font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| BurninError::Font(format!("Font family in {} has no name", path.display())))?
        .to_string();

    Ok(LoadedFont {
        font_ctx,
        family_name,
    })
}
