pub mod card;
pub mod export;
pub mod render;
pub mod source;
pub mod wizard;

pub use card::Card;
pub use export::{CardExporter, DirectoryDownloader, ExportOutcome, NoSharePlatform};
pub use render::CardRasterizer;
pub use source::{CardSource, HttpCardSource};
pub use wizard::Wizard;
