// src/lib.rs

//! resale-feed library
//!
//! Turns scraped flea-market listings into marketplace inventory files:
//! keyword and seller based eligibility, text sanitizing for the legacy
//! encoding, and contract-driven TSV/XLSM serialization.

pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
