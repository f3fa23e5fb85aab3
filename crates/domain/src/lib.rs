//! Domain layer for the practice backend.
//!
//! This crate contains:
//! - Domain models (Booking, BlogPost, Testimonial, ContactSubmission,
//!   AvailabilityWindow, BlockedDate, User, ConversationMessage)
//! - Request and response payloads with their validation rules
//! - Pure business logic: slot computation, reply matching, calendar invites

pub mod models;
pub mod services;
