//! HTTP control surface for Namu.
//!
//! Exposes ingestion control, progress, document statistics, and both search
//! modes as a small JSON API.
//!
//! | Method | Path            | Handler                       |
//! |--------|-----------------|-------------------------------|
//! | POST   | `/api/ingest`   | [`handlers::ingest::start`]   |
//! | GET    | `/api/progress` | [`handlers::ingest::progress`]|
//! | GET    | `/api/stats`    | [`handlers::stats::stats`]    |
//! | GET    | `/api/search`   | [`handlers::search::vector`]  |
//! | GET    | `/api/hybrid`   | [`handlers::search::hybrid`]  |

pub mod error;
pub mod handlers;
pub mod routing;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routing::create_router;
pub use server::serve;
pub use state::AppState;
