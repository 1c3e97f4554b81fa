pub mod attendance;
pub mod role;
pub mod task;
pub mod user;

pub use attendance::AttendanceLog;
pub use role::Role;
pub use task::{Task, TaskStatus};
pub use user::{Employee, User, UserRef};
