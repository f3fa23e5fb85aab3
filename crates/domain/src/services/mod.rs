//! Pure domain services: slot computation, reply matching and calendar files.

pub mod availability;
pub mod calendar_invite;
pub mod reply_matching;

pub use availability::{compute_open_slots, open_days, BookedInterval, SlotParams};
pub use calendar_invite::{booking_cancellation, booking_invite, InviteDetails};
pub use reply_matching::{
    classify, is_auto_reply, extract_reference, normalize_subject, strip_quoted_reply,
    AutoReplyReason, ConversationRef, InboundEmail, MatchDecision,
};
