use crate::composer::{GenerationResult, Selection};
use crate::lexicon::Energy;

pub const EDITION_YEAR: &str = "2026";
pub const CARD_TITLE: &str = "Valentine Card 2026";

pub type Rgb = [u8; 3];

/// Three-stop diagonal gradient (top-left to bottom-right) drawn in place of
/// missing artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gradient {
    pub from: Rgb,
    pub via: Rgb,
    pub to: Rgb,
}

impl Gradient {
    const fn new(from: Rgb, via: Rgb, to: Rgb) -> Self {
        Gradient { from, via, to }
    }

    /// Color at `t` in `0.0..=1.0` along the gradient.
    pub fn sample(&self, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let (start, end, local) = if t < 0.5 {
            (self.from, self.via, t * 2.0)
        } else {
            (self.via, self.to, (t - 0.5) * 2.0)
        };
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * local).round() as u8;
        [
            mix(start[0], end[0]),
            mix(start[1], end[1]),
            mix(start[2], end[2]),
        ]
    }
}

const STONE_200: Rgb = [231, 229, 228];
const STONE_100: Rgb = [245, 245, 244];

pub const NEUTRAL_GRADIENT: Gradient = Gradient::new(STONE_200, [238, 237, 236], STONE_100);

pub fn energy_gradient(energy: Energy) -> Gradient {
    match energy {
        Energy::Devoted => Gradient::new([253, 230, 138], [255, 237, 213], [254, 252, 232]),
        Energy::Mysterious => Gradient::new([49, 46, 129], [107, 33, 168], [15, 23, 42]),
        Energy::Playful => Gradient::new([254, 205, 211], [224, 242, 254], [254, 243, 199]),
        Energy::Dramatic => Gradient::new([127, 29, 29], [28, 25, 23], [0, 0, 0]),
        Energy::Minimalist => Gradient::new(STONE_100, [255, 255, 255], [250, 250, 249]),
        Energy::OldSchoolRomantic => Gradient::new([255, 228, 230], [253, 242, 248], [255, 253, 240]),
        Energy::Modernist => Gradient::new([203, 213, 225], [228, 228, 231], STONE_100),
        Energy::QuietlyObsessed => Gradient::new([168, 162, 158], [253, 230, 138], [214, 211, 209]),
    }
}

/// One finished card: the selection it came from and what the composer
/// returned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub selection: Selection,
    pub result: GenerationResult,
}

impl Card {
    pub fn new(selection: Selection, result: GenerationResult) -> Self {
        Card { selection, result }
    }

    pub fn title(&self) -> &'static str {
        CARD_TITLE
    }

    pub fn energy(&self) -> Option<Energy> {
        self.selection.energy.parse().ok()
    }

    /// Note lines with blank lines dropped; prose notes come back as one line.
    pub fn note_lines(&self) -> Vec<&str> {
        self.result
            .note
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    pub fn placeholder_gradient(&self) -> Gradient {
        self.energy()
            .map(energy_gradient)
            .unwrap_or(NEUTRAL_GRADIENT)
    }
}
