//! Client-side session core for the Skoola school-management system.
//!
//! The Skoola admin UI can hold several signed-in staff accounts at once and
//! hop between them without re-entering credentials. This crate is the piece
//! that makes that work on the client: a multi-account session store with a
//! single active identity, durable across restarts, plus the guards and
//! predicates the authenticated surfaces consult and an API client that
//! attaches the active credential to every request.
//!
//! Screens, routing tables, and the Skoola backend itself live elsewhere —
//! this crate only manages who is signed in locally and which of them speaks.

pub mod api;
pub mod config;
pub mod rbac;
pub mod session;
