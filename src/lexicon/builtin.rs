//! Built-in phrase tables. Entries here can be overridden at startup from the
//! lexicon JSON file without a rebuild.

use super::types::{DesignLanguage, Energy, Piece};

pub fn energy_mood(energy: Energy) -> &'static str {
    match energy {
        Energy::Devoted => {
            "warm golden ambient light, soft luminous focus, deep amber and honey tones, intimate radiating warmth"
        }
        Energy::Mysterious => {
            "dark moody atmospheric lighting, deep violet and midnight blue tones, dramatic layered shadows, veiled ethereal depth"
        }
        Energy::Playful => {
            "bright scattered prismatic light, soft pastel accents with unexpected color pops, dynamic asymmetric energy"
        }
        Energy::Dramatic => {
            "high contrast chiaroscuro lighting, bold crimson and deep black tones, theatrical intensity, cinematic shadow play"
        }
        Energy::Minimalist => {
            "vast clean white space, precise singular lines, restrained monochrome palette with one subtle metallic accent"
        }
        Energy::OldSchoolRomantic => {
            "soft diffused film-like grain, rose and ivory cream tones, classical symmetrical balance, nostalgic warmth"
        }
        Energy::Modernist => {
            "geometric precision lighting, cool chrome and steel blue tones, sharp angular edges, contemporary clarity"
        }
        Energy::QuietlyObsessed => {
            "intimate extreme macro perspective, warm muted earth tones, hypnotic singular focus, meditative stillness"
        }
    }
}

pub fn language_composition(language: DesignLanguage) -> &'static str {
    match language {
        DesignLanguage::Details => {
            "intricate macro-level perspective revealing fine surface textures, layered depth of material detail, every facet visible"
        }
        DesignLanguage::BoldGestures => {
            "large dominant scale with expansive negative space, singular powerful focal point, commanding presence"
        }
        DesignLanguage::Patience => {
            "gradual layered depth with soft transitional zones, contemplative breathing room, unhurried visual rhythm"
        }
        DesignLanguage::Sparkle => {
            "prismatic refracted light scattering across surfaces, crystalline faceted highlights, scattered luminous points of brilliance"
        }
        DesignLanguage::Precision => {
            "mathematical grid alignment, exact bilateral symmetry, clean geometric edges, ruler-straight compositional lines"
        }
        DesignLanguage::Surprise => {
            "unexpected oblique viewing angle, bold asymmetric layout creating dynamic tension, unconventional crop"
        }
        DesignLanguage::Craft => {
            "visible material grain and hand-finished texture quality, warm artisanal surface detail, evidence of making"
        }
        DesignLanguage::Timing => {
            "implied subtle motion, temporal flow suggestion, sequential visual rhythm, frozen decisive moment"
        }
    }
}

pub fn piece_material(piece: Piece) -> &'static str {
    match piece {
        Piece::SculpturalGoldCuff => {
            "solid polished gold metallic arc forms, bold sculptural curves, architectural bangle silhouette, warm reflective gold surfaces"
        }
        Piece::DiamondLineNecklace => {
            "linear cascade of brilliant diamond-like light points, flowing delicate chain line, crystalline sequential sparkle along a path"
        }
        Piece::GeometricHoop => {
            "perfect circular metallic geometry, clean modern hoop forms, smooth reflective gold surface, bold round silhouettes"
        }
        Piece::DelicateChainBracelet => {
            "fine interlocking gold chain links, gossamer metallic connections, delicate woven light-catching threads, subtle linear grace"
        }
        Piece::ArchitecturalRing => {
            "structured angular metallic setting, bold geometric faceted form, architectural statement piece, angular planes catching light"
        }
    }
}

pub fn energy_voice(energy: Energy) -> &'static str {
    match energy {
        Energy::Devoted => "a steady, close warmth that does not waver",
        Energy::Mysterious => "a layered reserve that reveals itself slowly",
        Energy::Playful => "a light, quick brightness that refuses to sit still",
        Energy::Dramatic => "a heightened contrast that commits fully to the moment",
        Energy::Minimalist => "a clarity that keeps only what is essential",
        Energy::OldSchoolRomantic => "a classic softness that trusts familiar forms",
        Energy::Modernist => "a clean geometric confidence that belongs to the present",
        Energy::QuietlyObsessed => "an attentive focus that returns to the same point again and again",
    }
}

pub fn language_voice(language: DesignLanguage) -> &'static str {
    match language {
        DesignLanguage::Details => "an attention to what reveals itself only up close",
        DesignLanguage::BoldGestures => "a preference for scale and a single decisive statement",
        DesignLanguage::Patience => "a willingness to let an impression build over time",
        DesignLanguage::Sparkle => "an instinct for the moment light catches an edge",
        DesignLanguage::Precision => "a belief that every line should be exactly where it is",
        DesignLanguage::Surprise => "an eye for the angle no one anticipated",
        DesignLanguage::Craft => "a regard for the evidence of the hand that made it",
        DesignLanguage::Timing => "a sense that the right moment matters as much as the form",
    }
}

pub fn piece_voice(piece: Piece) -> &'static str {
    match piece {
        Piece::SculpturalGoldCuff => "a sculptural gold cuff, curved and architectural",
        Piece::DiamondLineNecklace => "a diamond line necklace, brilliance set point by point",
        Piece::GeometricHoop => "a geometric hoop, a perfect circle in modern metal",
        Piece::DelicateChainBracelet => "a delicate chain bracelet, fine links in quiet connection",
        Piece::ArchitecturalRing => "an architectural ring, structured geometry held in a single form",
    }
}
