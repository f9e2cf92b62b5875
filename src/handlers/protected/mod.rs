// handlers/protected/mod.rs - Identity-aware handlers under /api
//
// Route Prefix: /api/*
// Middleware: identity_middleware injects the caller's AuthContext; the
// service operation behind each handler applies its own authorization gate.

pub mod achievements;
pub mod announcements;
pub mod classes;
pub mod comments;
pub mod coupons;
pub mod events;
pub mod schedule;
pub mod users;
