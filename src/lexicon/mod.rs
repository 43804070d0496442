pub mod builtin;
pub mod types;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::CONFIG;

pub use types::{DesignLanguage, Energy, Piece, UnknownOption};

/// Lexicon loaded once at startup from the built-in tables plus any overrides.
pub static LEXICON: Lazy<StyleLexicon> =
    Lazy::new(|| StyleLexicon::load(&CONFIG.lexicon_config_path));

#[derive(Debug, Clone, Default)]
pub struct PhraseTable {
    pub energy: HashMap<String, String>,
    pub design_language: HashMap<String, String>,
    pub piece: HashMap<String, String>,
}

impl PhraseTable {
    fn apply(&mut self, overrides: PhraseTableFile) -> usize {
        let mut applied = 0;
        for (target, entries) in [
            (&mut self.energy, overrides.energy),
            (&mut self.design_language, overrides.design_language),
            (&mut self.piece, overrides.piece),
        ] {
            for (key, phrase) in entries {
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                target.insert(key.to_string(), phrase.trim().to_string());
                applied += 1;
            }
        }
        applied
    }
}

/// The phrases prompts are built from: `image` feeds the artwork prompt,
/// `voice` feeds the curator note.
#[derive(Debug, Clone)]
pub struct StyleLexicon {
    pub image: PhraseTable,
    pub voice: PhraseTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhraseTableFile {
    #[serde(default)]
    energy: HashMap<String, String>,
    #[serde(default)]
    design_language: HashMap<String, String>,
    #[serde(default)]
    piece: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct LexiconFile {
    #[serde(default)]
    image: PhraseTableFile,
    #[serde(default)]
    voice: PhraseTableFile,
}

fn lookup<'a>(table: &'a HashMap<String, String>, key: &str) -> &'a str {
    table.get(key.trim()).map(String::as_str).unwrap_or("")
}

impl Default for StyleLexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StyleLexicon {
    pub fn builtin() -> Self {
        let image = PhraseTable {
            energy: Energy::ALL
                .iter()
                .map(|e| (e.label().to_string(), builtin::energy_mood(*e).to_string()))
                .collect(),
            design_language: DesignLanguage::ALL
                .iter()
                .map(|d| (d.label().to_string(), builtin::language_composition(*d).to_string()))
                .collect(),
            piece: Piece::ALL
                .iter()
                .map(|p| (p.label().to_string(), builtin::piece_material(*p).to_string()))
                .collect(),
        };
        let voice = PhraseTable {
            energy: Energy::ALL
                .iter()
                .map(|e| (e.label().to_string(), builtin::energy_voice(*e).to_string()))
                .collect(),
            design_language: DesignLanguage::ALL
                .iter()
                .map(|d| (d.label().to_string(), builtin::language_voice(*d).to_string()))
                .collect(),
            piece: Piece::ALL
                .iter()
                .map(|p| (p.label().to_string(), builtin::piece_voice(*p).to_string()))
                .collect(),
        };
        StyleLexicon { image, voice }
    }

    /// Built-in tables with overrides from `path` applied. A missing or broken
    /// file leaves the built-in tables untouched.
    pub fn load(path: &Path) -> Self {
        let mut lexicon = Self::builtin();
        if !path.exists() {
            info!("Lexicon override file not found at {}", path.display());
            return lexicon;
        }

        let raw = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!("Failed to read lexicon overrides at {}: {}", path.display(), err);
                return lexicon;
            }
        };

        match lexicon.apply_overrides(&raw) {
            Ok(applied) => info!(
                "Applied {} lexicon override(s) from {}",
                applied,
                path.display()
            ),
            Err(err) => warn!(
                "Failed to parse lexicon overrides at {}: {}",
                path.display(),
                err
            ),
        }
        lexicon
    }

    pub fn apply_overrides(&mut self, raw: &str) -> serde_json::Result<usize> {
        let parsed: LexiconFile = serde_json::from_str(raw)?;
        Ok(self.image.apply(parsed.image) + self.voice.apply(parsed.voice))
    }

    pub fn energy_mood(&self, energy: &str) -> &str {
        lookup(&self.image.energy, energy)
    }

    pub fn language_composition(&self, language: &str) -> &str {
        lookup(&self.image.design_language, language)
    }

    pub fn piece_material(&self, piece: &str) -> &str {
        lookup(&self.image.piece, piece)
    }

    pub fn energy_voice(&self, energy: &str) -> &str {
        lookup(&self.voice.energy, energy)
    }

    pub fn language_voice(&self, language: &str) -> &str {
        lookup(&self.voice.design_language, language)
    }

    pub fn piece_voice(&self, piece: &str) -> &str {
        lookup(&self.voice.piece, piece)
    }
}
