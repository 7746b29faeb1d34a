pub mod attendance;
pub mod geofence;
pub mod holiday;
pub mod leave;
pub mod ports;
pub mod timesheet;

pub use attendance::AttendanceService;
pub use geofence::GeofenceService;
pub use holiday::HolidayService;
pub use leave::LeaveService;
pub use ports::{EmployeeDirectory, NoopNotifier, Notifier};
pub use timesheet::TimesheetService;
