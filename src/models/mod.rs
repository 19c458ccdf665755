//! Domain model module declarations.

pub mod course;
pub mod launch;
pub mod user;
