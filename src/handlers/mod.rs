// src/handlers/mod.rs

pub mod admin;
pub mod assessments;
pub mod auth;
pub mod courses;
pub mod feedback;
pub mod session;
