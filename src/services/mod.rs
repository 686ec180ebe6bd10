//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the claims rules, token signing and provider calls so
//! route handlers can stay focused on cookies, redirects and status codes.

pub mod auth;
pub mod claims;
pub mod session;
pub mod token;
