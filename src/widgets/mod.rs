mod jobs;
mod login;
mod misc;
mod scrollbar;
mod table;

pub use jobs::{Column, JobTable, JobTableState};
pub use login::{Field, LoginDialog, LoginForm};
pub use misc::status_color;
pub use scrollbar::RightScrollbar;
pub use table::SortOrder;
