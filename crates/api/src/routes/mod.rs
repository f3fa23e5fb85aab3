//! HTTP route handlers.

pub mod admin_availability;
pub mod admin_blog;
pub mod admin_bookings;
pub mod admin_contacts;
pub mod admin_testimonials;
pub mod auth;
pub mod availability;
pub mod blog;
pub mod bookings;
pub mod captcha;
pub mod contact;
pub mod cron;
pub mod dashboard;
pub mod health;
pub mod services;
pub mod testimonials;
