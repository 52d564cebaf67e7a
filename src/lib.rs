//! # Sprint Tracker
//!
//! A personal focus-time tracker: run countdown or stopwatch timers
//! against projects, persist the finished intervals as sprints, and
//! report on where the time went.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (users, projects, sprints, sign-in tokens)
//! - **timer**: The countdown/stopwatch state machine and its persistence bridge
//! - **analytics**: Period filtering, summary metrics, chart bucketing
//! - **storage**: JSONL-backed store
//! - **events**: In-process change notifications
//! - **auth**: Emailed one-time codes and JWT sessions
//! - **email**: Outbound mail backends
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod analytics;
pub mod api;
pub mod auth;
pub mod config;
pub mod email;
pub mod events;
pub mod models;
pub mod storage;
pub mod timer;
