//! Argus ground station.
//!
//! Robots publish telemetry over NATS; the ground station keeps the latest
//! snapshot per robot, runs heuristic and proximity analysis, optionally
//! escalates alerts to an AI reasoning provider, and turns operator-approved
//! suggestions into commands published back to the robots.

// AI reasoning providers
pub mod ai;

// Heuristic analysis, escalation worker and proximity scanner
pub mod analysis;

// HTTP and WebSocket APIs
pub mod api;

// Command lifecycle and dispatch
pub mod command;

// Configuration loading
pub mod config;

// Geodesy helpers shared with the simulator
pub mod geo;

// NATS client integration
pub mod nats;

// Dashboard notification fan-out
pub mod notify;

// Wire messages and subject layout
pub mod protocol;

// Robot snapshots and registry
pub mod robot;

// Suggestion model and store
pub mod suggestion;
