pub mod achievement;
pub mod announcement;
pub mod class;
pub mod comment;
pub mod coupon;
pub mod schedule;
pub mod social_event;
pub mod user;

pub use achievement::Achievement;
pub use announcement::Announcement;
pub use class::{Attendance, AttendanceStatus, Class, StudentInClass};
pub use comment::EventComment;
pub use coupon::{Coupon, CouponRedemption};
pub use schedule::{ScheduleItem, ScheduleKind};
pub use social_event::{EventRegistration, SocialEvent};
pub use user::User;
