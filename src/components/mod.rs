pub mod clock_view;
pub mod entry_form;
pub mod entry_list;
pub mod status_bar;

pub use clock_view::ClockView;
pub use entry_form::EntryForm;
pub use entry_list::EntryList;
pub use status_bar::StatusBar;
