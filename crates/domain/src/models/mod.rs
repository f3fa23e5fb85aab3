//! Domain models for the practice site.

pub mod availability;
pub mod blog_post;
pub mod booking;
pub mod contact;
pub mod dashboard;
pub mod message;
pub mod session_type;
pub mod testimonial;
pub mod user;

pub use availability::{AvailabilityWindow, BlockedDate, TimeSlot};
pub use blog_post::BlogPost;
pub use booking::{Booking, BookingStatus, BookingTransitionError};
pub use contact::{ContactStatus, ContactSubmission};
pub use dashboard::DashboardSummary;
pub use message::{ConversationMessage, MessageDirection};
pub use session_type::SessionType;
pub use testimonial::Testimonial;
pub use user::User;
