// persona-chat/src/lib.rs

pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod credentials;
pub mod error;
pub mod metrics;
pub mod persona;
pub mod profile_store;
pub mod server;
pub mod session;
pub mod shared_state;
pub mod sheets;
pub mod survey;
pub mod telemetry;
pub mod view;

// Public API exports
pub use app::App;
pub use chat::{ChatMessage, Role};
pub use config::Config;
pub use error::AppError;
pub use persona::Persona;
pub use profile_store::{Profile, ProfileStore};
pub use server::{build_router, run_server};
pub use sheets::{InMemorySheets, SheetsBackend, SpreadsheetGateway};
pub use survey::{Ratings, TraitScores};
pub use view::View;
