//! Docdrop — upload-queue client for a PDF extraction service.
//!
//! The queue controller accepts selections of PDF files, submits them one
//! at a time to the extraction endpoint, and exposes display-ready view
//! models (file list rows and a detail pane) for the embedding front end
//! to render.

pub mod config;
pub mod export;
pub mod models;
pub mod queue;
pub mod submit;
pub mod view;
