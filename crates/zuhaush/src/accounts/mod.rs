//! The three account kinds: marketplace users, builders (with their team members) and
//! console admins.

pub mod admins;
pub mod builders;
pub mod requests;
pub mod users;
