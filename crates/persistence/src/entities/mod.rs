//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod availability;
pub mod blog_post;
pub mod booking;
pub mod contact;
pub mod message;
pub mod testimonial;
pub mod user;

pub use availability::{AvailabilityWindowEntity, BlockedDateEntity};
pub use blog_post::BlogPostEntity;
pub use booking::{BookingEntity, BookingStatusDb};
pub use contact::{ContactStatusDb, ContactSubmissionEntity};
pub use message::{ConversationMessageEntity, MessageDirectionDb};
pub use testimonial::TestimonialEntity;
pub use user::{UserEntity, UserSessionEntity};
