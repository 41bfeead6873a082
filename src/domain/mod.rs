pub mod ledger;
pub mod level;
pub mod progress;
pub mod subject;
pub mod tier;
pub mod window;

pub use ledger::{resolve_day_index, DayIndex, Ledger};
pub use level::{evaluate, Transition};
pub use progress::{normalize, StoredSubject, SubjectProgress, UserProgress};
pub use subject::Subject;
pub use tier::Tier;
pub use window::RecentWindow;
