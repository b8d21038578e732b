//! The two views the user interacts with. Each holds its own state and
//! talks to the backend directly.

pub mod auth_panel;
pub mod event_board;

pub use auth_panel::{AuthMode, AuthOutcome, AuthPanel};
pub use event_board::{Confirmation, EventBoard, EventForm, FormMode, Outcome};
