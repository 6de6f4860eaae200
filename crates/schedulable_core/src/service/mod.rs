//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, clock, and lifecycle calls into use-case APIs.
//! - Keep CLI layers decoupled from storage details.

pub mod schedule_service;
