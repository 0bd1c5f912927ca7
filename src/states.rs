pub mod history;
pub mod session;

pub use history::{History, HistoryEvent, HistoryEventKind};
pub use session::{Session, Tool};
