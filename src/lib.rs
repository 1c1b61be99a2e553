pub mod assets;
pub mod challenge;
pub mod color;
pub mod config;
pub mod error;
pub mod map;
pub mod region;
pub mod round;
pub mod score;
pub mod session;

pub use assets::{AssetSource, DataDir, FlagRef, MemoryAssets};
pub use challenge::{Challenge, ChallengeQueue, GameMode};
pub use color::Color;
pub use config::GameConfig;
pub use error::{QuizError, Result};
pub use map::{ColorIndex, MapIndex, MapSurface, PixelIndex};
pub use region::{Region, RegionCatalogue, RegionPath, RegionType, WorldCatalogue};
pub use round::{ClickOutcome, GameRound, RoundEngine, RoundState, SharedRound};
pub use score::{FileScoreStore, MemoryScoreStore, ScoreRecord, ScoreStore};
pub use session::{HoverInfo, Session};
