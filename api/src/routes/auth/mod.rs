//! Authentication route handlers
//!
//! - Sign-in with email and password
//! - Token refresh
//! - Logout
//! - The authenticated principal (`me`)

pub mod logout;
pub mod me;
pub mod refresh;
pub mod signin;
