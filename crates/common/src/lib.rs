//! Shared session and credential core for the SMarket API client.
//!
//! This crate owns everything about the authenticated session except the
//! generic request surface: credential wire types, pluggable token storage,
//! the HTTP client for the auth endpoints, and the [`auth::SessionManager`]
//! that coordinates token refresh across concurrent callers.

pub mod auth;
