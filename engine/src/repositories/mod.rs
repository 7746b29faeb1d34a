pub mod attendance;
pub mod geofence;
pub mod holiday;
pub mod leave_balance;
pub mod leave_request;
pub mod timesheet;
pub mod transaction;

pub use attendance::{AttendanceRepository, AttendanceRepositoryTrait};
pub use geofence::{GeofenceRepository, GeofenceRepositoryTrait};
pub use holiday::{HolidayRepository, HolidayRepositoryTrait};
pub use leave_balance::{LeaveBalanceRepository, LeaveBalanceRepositoryTrait};
pub use leave_request::{LeaveRequestRepository, LeaveRequestRepositoryTrait};
pub use timesheet::{TimesheetRepository, TimesheetRepositoryTrait};
pub use transaction::*;
