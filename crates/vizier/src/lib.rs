//! Vizier - one-shot chart generation and data insight pipeline.
//!
//! Reads a single JSON request describing a dataset and an intent,
//! produces a persisted chart (PNG or self-contained HTML) plus a
//! ranked set of statistical insights, and can later revise a stored
//! chart by annotating a selection of those insights onto it.

pub mod dataset;
pub mod error;
pub mod generator;
pub mod insight;
pub mod pipeline;
pub mod render;
pub mod request;
pub mod serializer;
pub mod spec;
pub mod store;
pub mod update;

pub use error::{Error, Result};
pub use request::{VisualizationRequest, VisualizationResponse};
