//! Nearest-destination route engine.
//!
//! Pick a station, and every destination attached to it gets a travel
//! distance and duration from an external routing service, computed one
//! paced request at a time and listed nearest first as results arrive.

pub mod cache;
pub mod calculator;
pub mod config;
pub mod domain;
pub mod presenter;
pub mod routing;
pub mod session;
pub mod stations;
pub mod web;
