//! Frontdesk - a conversational front door for a psychology clinic assistant.

// ============================================================================
// Core Infrastructure
// ============================================================================

pub mod build_info;
pub mod bundle;
pub mod config;

// ============================================================================
// Server & HTTP
// ============================================================================

pub mod api;
pub mod handlers;
pub mod server;

// ============================================================================
// Domain
// ============================================================================

pub mod classify;
pub mod llm;
pub mod router;
pub mod session;
