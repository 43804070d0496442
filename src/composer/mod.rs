pub mod prompts;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::Config;
use crate::lexicon::{StyleLexicon, LEXICON};
use crate::llm::GeminiClient;

use prompts::{
    build_image_prompt, build_note_prompt, fallback_note_for, COMPOSE_FALLBACK_NOTE, NOTE_FALLBACK,
};
pub use types::{GenerationResult, Selection};

static LEADING_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^["']"#).expect("valid regex"));
static TRAILING_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)["']$"#).expect("valid regex"));

/// Trims the model's note and drops one quote character from the start and
/// end of every line. Returns `None` when nothing usable is left.
pub fn clean_note_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim().replace("\r\n", "\n");
    let without_leading = LEADING_QUOTE.replace_all(&trimmed, "");
    let cleaned = TRAILING_QUOTE.replace_all(&without_leading, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Turns a selection into artwork and a curator note. Never fails: every
/// upstream problem degrades into an empty image or a fallback note.
#[derive(Debug, Clone)]
pub struct Composer {
    gemini: GeminiClient,
    lexicon: Arc<StyleLexicon>,
    deadline: Duration,
}

impl Composer {
    pub fn new(gemini: GeminiClient, lexicon: Arc<StyleLexicon>, deadline: Duration) -> Self {
        Composer {
            gemini,
            lexicon,
            deadline,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            GeminiClient::from_config(config),
            Arc::new(LEXICON.clone()),
            Duration::from_secs(config.compose_timeout_seconds),
        )
    }

    pub fn lexicon(&self) -> &StyleLexicon {
        &self.lexicon
    }

    /// Artwork and note run side by side, each under its own deadline, so a
    /// stalled image path never costs the card a note that already arrived.
    pub async fn compose(&self, selection: &Selection) -> GenerationResult {
        let image_prompt = build_image_prompt(&self.lexicon, selection);
        let note_prompt = build_note_prompt(&self.lexicon, selection);

        let (image, note) = tokio::join!(
            self.artwork_within_deadline(&image_prompt, selection),
            self.note_within_deadline(&note_prompt, selection)
        );

        info!(
            "Composed card for {}: image={}, note_chars={}",
            selection,
            !image.is_empty(),
            note.chars().count()
        );
        GenerationResult { image, note }
    }

    async fn artwork_within_deadline(&self, prompt: &str, selection: &Selection) -> String {
        match timeout(self.deadline, self.generate_artwork(prompt)).await {
            Ok(image) => image,
            Err(_) => {
                warn!(
                    "Artwork for {} exceeded {:?}; continuing without an image",
                    selection, self.deadline
                );
                String::new()
            }
        }
    }

    async fn note_within_deadline(&self, prompt: &str, selection: &Selection) -> String {
        match timeout(self.deadline, self.generate_note(prompt)).await {
            Ok(note) => note,
            Err(_) => {
                warn!(
                    "Note for {} exceeded {:?}; using the selection fallback",
                    selection, self.deadline
                );
                fallback_note_for(&self.lexicon, selection)
            }
        }
    }

    /// Result used when the compose task itself is lost. A known selection
    /// gets its own deterministic note.
    pub fn fallback_result(&self, selection: Option<&Selection>) -> GenerationResult {
        let note = match selection {
            Some(selection) => fallback_note_for(&self.lexicon, selection),
            None => COMPOSE_FALLBACK_NOTE.to_string(),
        };
        GenerationResult {
            image: String::new(),
            note,
        }
    }

    /// Primary image model first, then the alternate. Empty string when
    /// neither returns an inline image.
    pub async fn generate_artwork(&self, prompt: &str) -> String {
        let settings = self.gemini.settings();
        let models = [
            settings.image_model.as_str(),
            settings.image_fallback_model.as_str(),
        ];

        for (index, model) in models.iter().enumerate() {
            match self.gemini.generate_image(model, prompt).await {
                Ok(Some(image)) => return image,
                Ok(None) => {
                    warn!("Image model {} returned no inline image", model);
                }
                Err(err) => {
                    warn!("Image model {} failed: {}", model, err);
                }
            }
            if index + 1 < models.len() {
                info!("Retrying artwork with alternate model {}", models[index + 1]);
            }
        }

        String::new()
    }

    pub async fn generate_note(&self, prompt: &str) -> String {
        match self.gemini.generate_text(prompt).await {
            Ok(Some(text)) => clean_note_text(&text).unwrap_or_else(|| NOTE_FALLBACK.to_string()),
            Ok(None) => {
                warn!("Text model returned no text part; using fallback note");
                NOTE_FALLBACK.to_string()
            }
            Err(err) => {
                warn!("Note generation failed: {}; using fallback note", err);
                NOTE_FALLBACK.to_string()
            }
        }
    }
}
