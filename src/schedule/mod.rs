pub mod color;
pub mod entry;
pub mod layout;
pub mod normalize;
pub mod store;
pub mod time;

pub use color::{ChartPalette, ColorAssigner};
pub use entry::{EntryDraft, EntryId, ScheduleEntry};
pub use layout::ClockLayout;
pub use normalize::normalize;
pub use store::{ScheduleStore, StoreError, TableBackend, TomlTableFile};
pub use time::{TimeValue, HOURS_PER_DAY};
