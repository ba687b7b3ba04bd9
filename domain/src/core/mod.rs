//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`string::truncate_title`]: title shortening for chat lists

pub mod error;
pub mod string;
