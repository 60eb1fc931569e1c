pub mod codec;
pub mod cursor;
pub mod dashboard;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod filter;
pub mod moves;
pub mod session;
pub mod types;

pub use cursor::{MoveCursor, Step};
pub use dashboard::{Command, Dashboard, ExportSettings, Reply};
pub use dataset::{CompressionMode, Dataset};
pub use engine::{PositionEngine, StandardEngine};
pub use error::{
    CodecError, DatasetError, ErrorAccumulator, ImportError, MoveError, TimelineError,
};
pub use filter::{NameMatcher, OpeningFilter, Summary};
pub use session::{ImportKey, ImportOutcome, InteractiveBoard, OpeningPlayer, Session};
pub use types::{GameTags, OpeningRecord};
