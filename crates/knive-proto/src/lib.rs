//! Shared types for talking to a knive backend: the show model, the pipeline
//! configuration tree, the REST client and console configuration.

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod platform;
