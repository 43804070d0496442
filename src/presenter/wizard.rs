use std::fmt;
use std::time::Duration;

use tracing::{error, info};

use crate::composer::{GenerationResult, Selection};
use crate::lexicon::{DesignLanguage, Energy, Piece};
use crate::presenter::card::Card;
use crate::presenter::export::{
    CardExporter, Downloader, ExportError, ExportOutcome, SharePlatform,
};
use crate::presenter::render::Rasterizer;
use crate::presenter::source::{with_client_fallbacks, CardSource};

/// Pause between a choice and the next step appearing.
pub const STEP_TRANSITION: Duration = Duration::from_millis(300);
pub const FINAL_STEP: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Landing,
    Selecting,
    Generating,
    Result,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Landing => "landing",
            Phase::Selecting => "selecting",
            Phase::Generating => "generating",
            Phase::Result => "result",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("'{action}' is not available while {phase}")]
    InvalidAction { action: &'static str, phase: Phase },
    #[error("step {actual} is showing, not step {expected}")]
    WrongStep { expected: u8, actual: u8 },
    #[error("all three selections are needed before generating")]
    IncompleteSelection,
    #[error("the card is already being saved")]
    ExportInProgress,
}

/// What the view should do after a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Show the next step once the delay has passed.
    AdvanceAfter(Duration),
    /// Last step: show the summary with the generate action.
    RevealConfirmation,
}

/// Landing, three selection steps, generating, result. `reset` returns to
/// landing from anywhere.
#[derive(Debug, Clone)]
pub struct Wizard {
    phase: Phase,
    step: u8,
    pending_step: Option<u8>,
    energy: Option<Energy>,
    design_language: Option<DesignLanguage>,
    piece: Option<Piece>,
    confirmation_visible: bool,
    card: Option<Card>,
    saving: bool,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Wizard {
            phase: Phase::Landing,
            step: 1,
            pending_step: None,
            energy: None,
            design_language: None,
            piece: None,
            confirmation_visible: false,
            card: None,
            saving: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn energy(&self) -> Option<Energy> {
        self.energy
    }

    pub fn design_language(&self) -> Option<DesignLanguage> {
        self.design_language
    }

    pub fn piece(&self) -> Option<Piece> {
        self.piece
    }

    pub fn confirmation_visible(&self) -> bool {
        self.confirmation_visible
    }

    pub fn card(&self) -> Option<&Card> {
        self.card.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    fn require(&self, phase: Phase, action: &'static str) -> Result<(), WizardError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(WizardError::InvalidAction {
                action,
                phase: self.phase,
            })
        }
    }

    fn require_step(&self, expected: u8, action: &'static str) -> Result<(), WizardError> {
        self.require(Phase::Selecting, action)?;
        if self.step != expected {
            return Err(WizardError::WrongStep {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), WizardError> {
        self.require(Phase::Landing, "start")?;
        self.phase = Phase::Selecting;
        self.step = 1;
        Ok(())
    }

    pub fn choose_energy(&mut self, energy: Energy) -> Result<Transition, WizardError> {
        self.require_step(1, "choose energy")?;
        self.energy = Some(energy);
        self.pending_step = Some(2);
        Ok(Transition::AdvanceAfter(STEP_TRANSITION))
    }

    pub fn choose_design_language(
        &mut self,
        design_language: DesignLanguage,
    ) -> Result<Transition, WizardError> {
        self.require_step(2, "choose design language")?;
        self.design_language = Some(design_language);
        self.pending_step = Some(FINAL_STEP);
        Ok(Transition::AdvanceAfter(STEP_TRANSITION))
    }

    pub fn choose_piece(&mut self, piece: Piece) -> Result<Transition, WizardError> {
        self.require_step(FINAL_STEP, "choose piece")?;
        self.piece = Some(piece);
        self.confirmation_visible = true;
        Ok(Transition::RevealConfirmation)
    }

    /// Applies a scheduled step change. Returns false when none was pending,
    /// e.g. after a reset during the delay.
    pub fn complete_transition(&mut self) -> bool {
        if self.phase != Phase::Selecting {
            self.pending_step = None;
            return false;
        }
        match self.pending_step.take() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    /// Waits out the transition delay, then applies it.
    pub async fn settle(&mut self, transition: Transition) {
        if let Transition::AdvanceAfter(delay) = transition {
            tokio::time::sleep(delay).await;
            self.complete_transition();
        }
    }

    pub fn selection(&self) -> Option<Selection> {
        Some(Selection::new(self.energy?, self.design_language?, self.piece?))
    }

    pub fn can_generate(&self) -> bool {
        self.phase == Phase::Selecting && self.step == FINAL_STEP && self.selection().is_some()
    }

    /// Moves into `Generating` and hands back the selection to send.
    pub fn begin_generation(&mut self) -> Result<Selection, WizardError> {
        self.require(Phase::Selecting, "generate")?;
        if self.step != FINAL_STEP {
            return Err(WizardError::WrongStep {
                expected: FINAL_STEP,
                actual: self.step,
            });
        }
        let selection = self.selection().ok_or(WizardError::IncompleteSelection)?;
        self.phase = Phase::Generating;
        Ok(selection)
    }

    /// Always lands in `Result`, whatever came back.
    pub fn finish_generation(&mut self, result: GenerationResult) -> Result<&Card, WizardError> {
        self.require(Phase::Generating, "finish generation")?;
        let selection = self.selection().ok_or(WizardError::IncompleteSelection)?;
        let result = with_client_fallbacks(Some(result.image), Some(result.note));
        self.phase = Phase::Result;
        self.saving = false;
        Ok(&*self.card.insert(Card::new(selection, result)))
    }

    /// One request to `source`, then the result screen.
    pub async fn generate<S: CardSource>(&mut self, source: &S) -> Result<&Card, WizardError> {
        let selection = self.begin_generation()?;
        info!("Generating card for {}", selection);
        let result = source.fetch(&selection).await;
        self.finish_generation(result)
    }

    /// Marks the card as saving and hands it to the caller's export run. A
    /// second export is refused until `finish_export` clears the flag.
    pub fn begin_export(&mut self) -> Result<Card, WizardError> {
        self.require(Phase::Result, "export")?;
        if self.saving {
            return Err(WizardError::ExportInProgress);
        }
        let card = self.card.clone().ok_or(WizardError::InvalidAction {
            action: "export",
            phase: self.phase,
        })?;
        self.saving = true;
        Ok(card)
    }

    /// Clears the saving flag. Failures are logged and reported as `None`;
    /// a cancelled share is silent. The card itself is never touched.
    pub fn finish_export(
        &mut self,
        outcome: Result<ExportOutcome, ExportError>,
    ) -> Option<ExportOutcome> {
        self.saving = false;
        match outcome {
            Ok(ExportOutcome::Cancelled) => Some(ExportOutcome::Cancelled),
            Ok(outcome) => {
                info!("Card export finished: {:?}", outcome);
                Some(outcome)
            }
            Err(err) => {
                error!("Save failed: {}", err);
                None
            }
        }
    }

    /// Runs the whole export pipeline on the current card.
    pub fn export<R, S, D>(
        &mut self,
        exporter: &CardExporter<R, S, D>,
    ) -> Result<Option<ExportOutcome>, WizardError>
    where
        R: Rasterizer,
        S: SharePlatform,
        D: Downloader,
    {
        let card = self.begin_export()?;
        let outcome = exporter.export(&card);
        Ok(self.finish_export(outcome))
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::prompts::NOTE_FALLBACK;
    use crate::presenter::export::tests::{
        CountingRasterizer, FakeShare, RecordingDownloader,
    };
    use crate::presenter::export::{NoSharePlatform, ShareError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSource {
        calls: AtomicUsize,
        result: GenerationResult,
    }

    impl StubSource {
        fn new(image: &str, note: &str) -> Self {
            StubSource {
                calls: AtomicUsize::new(0),
                result: GenerationResult {
                    image: image.to_string(),
                    note: note.to_string(),
                },
            }
        }
    }

    impl CardSource for StubSource {
        async fn fetch(&self, _selection: &Selection) -> GenerationResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn at_final_step() -> Wizard {
        let mut wizard = Wizard::new();
        wizard.start().unwrap();
        wizard.choose_energy(Energy::OldSchoolRomantic).unwrap();
        assert!(wizard.complete_transition());
        wizard.choose_design_language(DesignLanguage::Craft).unwrap();
        assert!(wizard.complete_transition());
        wizard
    }

    #[test]
    fn landing_only_accepts_start() {
        let mut wizard = Wizard::new();
        let landing = WizardError::InvalidAction {
            action: "choose energy",
            phase: Phase::Landing,
        };
        assert_eq!(wizard.choose_energy(Energy::Devoted), Err(landing));
        assert!(wizard.begin_generation().is_err());
        assert!(!wizard.can_generate());
        wizard.start().unwrap();
        assert_eq!(wizard.phase(), Phase::Selecting);
        assert_eq!(wizard.step(), 1);
        assert!(wizard.start().is_err());
    }

    #[test]
    fn choices_advance_only_after_transition() {
        let mut wizard = Wizard::new();
        wizard.start().unwrap();
        assert_eq!(
            wizard.choose_energy(Energy::Playful),
            Ok(Transition::AdvanceAfter(STEP_TRANSITION))
        );
        assert_eq!(wizard.step(), 1);
        assert_eq!(
            wizard.choose_design_language(DesignLanguage::Details),
            Err(WizardError::WrongStep {
                expected: 2,
                actual: 1
            })
        );
        wizard.complete_transition();
        assert_eq!(wizard.step(), 2);
        assert!(!wizard.complete_transition());
    }

    #[test]
    fn final_step_reveals_confirmation_instead_of_advancing() {
        let mut wizard = at_final_step();
        assert!(!wizard.can_generate());
        assert_eq!(
            wizard.begin_generation(),
            Err(WizardError::IncompleteSelection)
        );
        assert_eq!(
            wizard.choose_piece(Piece::GeometricHoop),
            Ok(Transition::RevealConfirmation)
        );
        assert!(wizard.confirmation_visible());
        assert_eq!(wizard.step(), FINAL_STEP);
        assert!(wizard.can_generate());
    }

    #[tokio::test]
    async fn settle_waits_before_advancing() {
        tokio::time::pause();
        let mut wizard = Wizard::new();
        wizard.start().unwrap();
        let transition = wizard.choose_energy(Energy::Devoted).unwrap();
        let started = tokio::time::Instant::now();
        wizard.settle(transition).await;
        assert!(started.elapsed() >= STEP_TRANSITION);
        assert_eq!(wizard.step(), 2);
    }

    #[tokio::test]
    async fn generate_calls_source_once_and_shows_result() {
        let mut wizard = at_final_step();
        wizard.choose_piece(Piece::SculpturalGoldCuff).unwrap();
        let source = StubSource::new("data:image/png;base64,QUJD", "A note.");

        let card = wizard.generate(&source).await.unwrap().clone();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(wizard.phase(), Phase::Result);
        assert_eq!(card.selection.piece, "Sculptural Gold Cuff");
        assert_eq!(card.result.note, "A note.");

        assert!(wizard.generate(&source).await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_result_still_reaches_result_with_fallback_note() {
        let mut wizard = at_final_step();
        wizard.choose_piece(Piece::GeometricHoop).unwrap();
        let card = wizard.generate(&StubSource::new("", "  ")).await.unwrap();
        assert!(card.result.image.is_empty());
        assert_eq!(card.result.note, NOTE_FALLBACK);
    }

    #[tokio::test]
    async fn reset_clears_everything_from_any_phase() {
        let mut selecting = at_final_step();
        selecting.reset();
        assert_eq!(selecting.phase(), Phase::Landing);
        assert!(selecting.energy().is_none() && selecting.design_language().is_none());

        let mut wizard = at_final_step();
        wizard.choose_piece(Piece::ArchitecturalRing).unwrap();
        wizard.generate(&StubSource::new("", "A note.")).await.unwrap();
        wizard.reset();
        assert_eq!(wizard.phase(), Phase::Landing);
        assert_eq!(wizard.step(), 1);
        assert!(wizard.piece().is_none());
        assert!(wizard.card().is_none());
        assert!(!wizard.confirmation_visible());
        assert!(!wizard.is_saving());
    }

    #[test]
    fn reset_during_transition_drops_pending_step() {
        let mut wizard = Wizard::new();
        wizard.start().unwrap();
        wizard.choose_energy(Energy::Dramatic).unwrap();
        wizard.reset();
        assert!(!wizard.complete_transition());
        assert_eq!(wizard.phase(), Phase::Landing);
    }

    #[tokio::test]
    async fn export_downloads_and_clears_saving_flag() {
        let mut wizard = at_final_step();
        wizard.choose_piece(Piece::GeometricHoop).unwrap();
        wizard
            .generate(&StubSource::new("data:image/png;base64,QUJD", "A note."))
            .await
            .unwrap();

        let downloader = RecordingDownloader::default();
        let exporter = CardExporter::new(CountingRasterizer::default(), NoSharePlatform, &downloader);
        let outcome = wizard.export(&exporter).unwrap();
        assert_eq!(
            outcome,
            Some(ExportOutcome::Downloaded {
                filename: "valentine-card-2026-old-school-romantic.png".to_string()
            })
        );
        assert!(!wizard.is_saving());
        assert_eq!(downloader.files.borrow().len(), 1);
    }

    #[tokio::test]
    async fn failed_export_leaves_card_untouched() {
        let mut wizard = at_final_step();
        wizard.choose_piece(Piece::GeometricHoop).unwrap();
        wizard.generate(&StubSource::new("", "A note.")).await.unwrap();
        let before = wizard.card().cloned();

        let share = FakeShare::new(true, || Err(ShareError::Failed("denied".to_string())));
        let exporter = CardExporter::new(
            CountingRasterizer::default(),
            &share,
            RecordingDownloader::default(),
        );
        assert_eq!(wizard.export(&exporter), Ok(None));
        assert!(!wizard.is_saving());
        assert_eq!(wizard.phase(), Phase::Result);
        assert_eq!(wizard.card().cloned(), before);

        let cancelling = FakeShare::new(true, || Err(ShareError::Cancelled));
        let exporter = CardExporter::new(
            CountingRasterizer::default(),
            &cancelling,
            RecordingDownloader::default(),
        );
        assert_eq!(wizard.export(&exporter), Ok(Some(ExportOutcome::Cancelled)));
    }

    #[test]
    fn export_outside_result_is_rejected() {
        let mut wizard = Wizard::new();
        let exporter = CardExporter::new(
            CountingRasterizer::default(),
            NoSharePlatform,
            RecordingDownloader::default(),
        );
        assert!(wizard.export(&exporter).is_err());
    }

    #[tokio::test]
    async fn saving_flag_spans_the_export_run() {
        let mut wizard = at_final_step();
        wizard.choose_piece(Piece::GeometricHoop).unwrap();
        wizard.generate(&StubSource::new("", "A note.")).await.unwrap();

        let card = wizard.begin_export().unwrap();
        assert!(wizard.is_saving());
        assert_eq!(wizard.begin_export(), Err(WizardError::ExportInProgress));

        let exporter = CardExporter::new(
            CountingRasterizer::default(),
            NoSharePlatform,
            RecordingDownloader::default(),
        );
        let outcome = wizard.finish_export(exporter.export(&card));
        assert!(matches!(outcome, Some(ExportOutcome::Downloaded { .. })));
        assert!(!wizard.is_saving());
        assert!(wizard.begin_export().is_ok());
    }

    #[tokio::test]
    async fn failed_export_run_clears_saving_flag() {
        let mut wizard = at_final_step();
        wizard.choose_piece(Piece::GeometricHoop).unwrap();
        wizard.generate(&StubSource::new("", "A note.")).await.unwrap();

        wizard.begin_export().unwrap();
        let failure = Err(ExportError::Share(ShareError::Failed("denied".to_string())));
        assert_eq!(wizard.finish_export(failure), None);
        assert!(!wizard.is_saving());
        assert_eq!(wizard.phase(), Phase::Result);
    }
}
