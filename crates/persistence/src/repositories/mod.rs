//! Repository implementations for database operations.

pub mod availability;
pub mod blog_post;
pub mod booking;
pub mod contact;
pub mod dashboard;
pub mod message;
pub mod testimonial;
pub mod user;

pub use availability::{AvailabilityRepository, BlockedDateRepository, WindowInput};
pub use blog_post::{BlogPostChanges, BlogPostRepository, NewBlogPost};
pub use booking::{
    violates_constraint, BookingFilter, BookingRepository, NewBooking, BOOKING_OVERLAP_CONSTRAINT,
    BOOKING_REFERENCE_CONSTRAINT,
};
pub use contact::{ContactRepository, NewContactSubmission};
pub use dashboard::DashboardRepository;
pub use message::MessageRepository;
pub use testimonial::{NewTestimonial, TestimonialChanges, TestimonialRepository};
pub use user::UserRepository;
