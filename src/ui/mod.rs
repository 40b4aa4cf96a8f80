//! Ratatui front-end for the Student Registry. One screen hosts everything
//! the spec's single window requires: a connection status header, the detail
//! form, the record table, and a footer for per-action feedback, with modal
//! popups for search input and delete confirmation.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
