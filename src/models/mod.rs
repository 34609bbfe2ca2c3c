// src/models/mod.rs

pub mod assessment;
pub mod course;
pub mod feedback;
pub mod history;
pub mod transaction;
pub mod user;
