//! Configuration parsing for pipeline files

pub mod pipeline;
