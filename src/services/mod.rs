// src/services/mod.rs

pub mod auth;
pub mod courses;
pub mod import;
pub mod payment;
pub mod scoring;
pub mod self_assessment;
pub mod session;
pub mod stats;
pub mod timer;
