//! Shared utilities and common types for the practice backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (hashing, token and reference generation)
//! - Password hashing with Argon2id
//! - JWT session tokens for the admin panel
//! - Stateless arithmetic captcha
//! - Offset pagination and common validation logic

pub mod captcha;
pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
