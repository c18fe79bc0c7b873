pub mod attendance;
pub mod credentials;
pub mod session;
pub mod week;
pub mod workout_log;

pub use attendance::AttendanceRecord;
pub use credentials::{AuthenticatedSession, Credentials};
pub use session::SessionDescriptor;
pub use week::WeekWindow;
pub use workout_log::WorkoutLog;
