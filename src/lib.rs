//! Client for asynchronous grant-search jobs.
//!
//! Submits a natural-language query to the backend, polls for status and
//! incremental result pages, accumulates results append-only, drives a
//! simulated progress estimate, and supports resuming an existing job via a
//! `queryId` carried in a shareable URL.

pub mod backend;
pub mod cli;
pub mod controller;
pub mod engine;
pub mod model;
pub mod share;
pub mod summary;
pub mod view;
