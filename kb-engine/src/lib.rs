//! KB Engine - knowledge-base recommendation backend with REST API
//!
//! This crate provides the backend server for the support knowledge engine:
//! a TF-IDF recommendation core, an actor-owned durable usage store, and
//! reporting views over both.

pub mod actors;
pub mod api;
pub mod app_state;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod error;
pub mod gateway;
pub mod index;
pub mod notifier;
pub mod report;
pub mod scorer;
pub mod tagger;
