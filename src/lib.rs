// Library surface for the terminal host, headless tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod consent;
pub mod error;
pub mod evaluator;
pub mod game;
pub mod generator;
pub mod history;
pub mod metrics;
pub mod runtime;
pub mod score_store;
pub mod session;
pub mod stimulus;
pub mod storage;
pub mod time_series;
pub mod timers;
pub mod ui;
pub mod util;

pub use app::{App, AppState};
pub use error::{SessionError, StorageError};
pub use game::GameKind;
pub use session::{Session, SessionState};
