use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::composer::types::Selection;
use crate::lexicon::StyleLexicon;

pub const IMAGE_PROMPT_TEMPLATE: &str = r#"Create a single abstract, editorial fine-art still-life image.

Subject: Abstract interpretation of jewelry forms: {piece_style}

Mood and lighting: {energy_style}

Composition: {language_style}

ABSOLUTE RULES:
- NO humans, NO faces, NO hands, NO body parts whatsoever
- NO text, NO words, NO letters, NO numbers, NO logos, NO watermarks
- NO literal product photography, this is an ABSTRACT ARTISTIC INTERPRETATION
- NO hearts or Valentine symbols
- Semi-abstract editorial fine-art tone
- Think: high-end gallery print, museum-quality, collectible art piece
- Rich material textures: polished metal, light refraction, shadow play
- Intentional, restrained color palette of warm metals, stone neutrals and at most one accent color
- Square 1:1 format
- Single cohesive composition"#;

pub const NOTE_PROMPT_TEMPLATE: &str = r#"Write a short curatorial note for a limited art edition card, in the voice of a gallery placard.

The artwork was shaped by three choices:
- Energy: {energy}, {energy_voice}
- Design language: {design_language}, {language_voice}
- Piece: {piece_voice}

STRICT FORMAT:
- 3 to 4 sentences of continuous prose in a single paragraph
- Present tense throughout
- No title, no heading, no greeting, no sign-off
- No quotation marks of any kind

STRICT TONE RULES:
- Never write the word "Valentine" or name the holiday in any form
- Never use the word "love", and avoid romance clichés ("sweetheart", "darling", "roses")
- At most ONE oblique seasonal reference (late-winter light, a February afternoon)
- No exclamation points
- No humor, no selling, no marketing or brand language
- No mention of AI, algorithms, generation, or technology
- Composed, intentional, slightly elevated: a thoughtful curator, not a greeting card

Write ONLY the note."#;

/// Returned by the note path when the text model gives nothing back.
pub const NOTE_FALLBACK: &str = "Warmth finds its form in the interplay of light and material. The composition settles into something unhurried, precise where it needs to be and soft where it can afford to be. A February gesture, held in gold and shadow.";

/// Returned when the request itself could not be read.
pub const COMPOSE_FALLBACK_NOTE: &str = "A small gesture, for the timing.\nYour selections shaped something deliberate.\nStructure meeting expression, as intended.\nLooking forward to what comes next.";

const SELECTION_FALLBACK_TEMPLATE: &str = "This edition begins with {energy_voice}. It is read through {language_voice}, and it settles on {piece_voice}. Light and material carry the rest, held still in late-winter light.";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid placeholder regex"));

/// Fills every `{name}` in one pass, so substituted text is never scanned for
/// placeholders again. Unknown names are left as written.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub fn build_image_prompt(lexicon: &StyleLexicon, selection: &Selection) -> String {
    fill_template(
        IMAGE_PROMPT_TEMPLATE,
        &[
            ("piece_style", lexicon.piece_material(&selection.piece)),
            ("energy_style", lexicon.energy_mood(&selection.energy)),
            (
                "language_style",
                lexicon.language_composition(&selection.design_language),
            ),
        ],
    )
}

pub fn build_note_prompt(lexicon: &StyleLexicon, selection: &Selection) -> String {
    fill_template(
        NOTE_PROMPT_TEMPLATE,
        &[
            ("energy", selection.energy.trim()),
            ("energy_voice", lexicon.energy_voice(&selection.energy)),
            ("design_language", selection.design_language.trim()),
            (
                "language_voice",
                lexicon.language_voice(&selection.design_language),
            ),
            ("piece_voice", lexicon.piece_voice(&selection.piece)),
        ],
    )
}

/// Deterministic note for a known selection when its note path runs out of
/// time or the compose task is lost. Falls back to the fixed literal if any
/// voice phrase is missing.
pub fn fallback_note_for(lexicon: &StyleLexicon, selection: &Selection) -> String {
    let energy_voice = lexicon.energy_voice(&selection.energy);
    let language_voice = lexicon.language_voice(&selection.design_language);
    let piece_voice = lexicon.piece_voice(&selection.piece);
    if energy_voice.is_empty() || language_voice.is_empty() || piece_voice.is_empty() {
        return COMPOSE_FALLBACK_NOTE.to_string();
    }
    fill_template(
        SELECTION_FALLBACK_TEMPLATE,
        &[
            ("energy_voice", energy_voice),
            ("language_voice", language_voice),
            ("piece_voice", piece_voice),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{builtin, DesignLanguage, Energy, Piece};

    fn devoted_sparkle_hoop() -> Selection {
        Selection::new(Energy::Devoted, DesignLanguage::Sparkle, Piece::GeometricHoop)
    }

    #[test]
    fn image_prompt_orders_subject_mood_composition() {
        let prompt = build_image_prompt(&StyleLexicon::builtin(), &devoted_sparkle_hoop());
        let subject = builtin::piece_material(Piece::GeometricHoop);
        let mood = builtin::energy_mood(Energy::Devoted);
        let composition = builtin::language_composition(DesignLanguage::Sparkle);

        let subject_at = prompt.find(subject).expect("piece phrase");
        let mood_at = prompt.find(mood).expect("energy phrase");
        let composition_at = prompt.find(composition).expect("language phrase");
        assert!(subject_at < mood_at && mood_at < composition_at);
        assert!(prompt.contains(&format!("Subject: Abstract interpretation of jewelry forms: {subject}")));
    }

    #[test]
    fn image_prompt_keeps_the_constraint_block() {
        let prompt = build_image_prompt(&StyleLexicon::builtin(), &devoted_sparkle_hoop());
        assert!(prompt.contains("NO humans"));
        assert!(prompt.contains("NO logos"));
        assert!(prompt.contains("NO literal product photography"));
        assert!(prompt.contains("Square 1:1 format"));
        assert!(prompt.contains("Single cohesive composition"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn unknown_values_leave_empty_phrases() {
        let selection = Selection {
            energy: "Sleepy".to_string(),
            design_language: "Sparkle".to_string(),
            piece: "Tiara".to_string(),
        };
        let prompt = build_image_prompt(&StyleLexicon::builtin(), &selection);
        assert!(prompt.contains("Mood and lighting: \n"));
        assert!(prompt.contains("Subject: Abstract interpretation of jewelry forms: \n"));
    }

    #[test]
    fn note_prompt_uses_voice_lexicon_and_tone_rules() {
        let prompt = build_note_prompt(&StyleLexicon::builtin(), &devoted_sparkle_hoop());
        assert!(prompt.contains(builtin::energy_voice(Energy::Devoted)));
        assert!(prompt.contains(builtin::language_voice(DesignLanguage::Sparkle)));
        assert!(prompt.contains(builtin::piece_voice(Piece::GeometricHoop)));
        assert!(prompt.contains("Energy: Devoted,"));
        assert!(prompt.contains("Present tense"));
        assert!(prompt.contains("No exclamation points"));
        assert!(prompt.contains("3 to 4 sentences"));
        assert!(!prompt.contains(builtin::energy_mood(Energy::Devoted)));
    }

    #[test]
    fn selection_fallback_is_deterministic() {
        let lexicon = StyleLexicon::builtin();
        let first = fallback_note_for(&lexicon, &devoted_sparkle_hoop());
        let second = fallback_note_for(&lexicon, &devoted_sparkle_hoop());
        assert_eq!(first, second);
        assert!(first.contains(builtin::piece_voice(Piece::GeometricHoop)));
        assert_ne!(first, NOTE_FALLBACK);
    }

    #[test]
    fn selection_fallback_for_unknown_values_is_the_literal() {
        let selection = Selection {
            energy: "Sleepy".to_string(),
            design_language: "Details".to_string(),
            piece: "Geometric Hoop".to_string(),
        };
        assert_eq!(
            fallback_note_for(&StyleLexicon::builtin(), &selection),
            COMPOSE_FALLBACK_NOTE
        );
    }

    #[test]
    fn inbound_labels_are_not_rescanned_for_placeholders() {
        let selection = Selection {
            energy: "{design_language}".to_string(),
            design_language: "Sparkle".to_string(),
            piece: "Geometric Hoop".to_string(),
        };
        let prompt = build_note_prompt(&StyleLexicon::builtin(), &selection);
        assert!(prompt.contains("- Energy: {design_language}, \n"));
        assert!(prompt.contains("- Design language: Sparkle,"));
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        assert_eq!(
            fill_template("{known} and {other}", &[("known", "gold")]),
            "gold and {other}"
        );
    }
}
