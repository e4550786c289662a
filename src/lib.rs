//! # Wagelens
//!
//! A price-to-work-hours annotation engine. Wagelens scans an HTML document
//! for currency-denominated prices, converts each to the hours of work it
//! represents at a configured hourly wage, and annotates the document — either
//! with a small badge next to the price or by replacing the price text in
//! place. Annotation is idempotent and fully reversible across repeated
//! passes over a mutating document.
//!
//! ## Overview
//!
//! The engine separates detection from presentation:
//!
//! - **Classification**: Gate on the page address before doing any work.
//! - **Extraction**: Structural selector scan plus a currency-anchored
//!   textual fallback, filtered against timers, deal chrome and hidden
//!   elements.
//! - **Conversion**: Pure price → hours mapping with half-hour bucketing and
//!   tier classification against user thresholds.
//! - **Presentation**: Stateful, revertible DOM reconciliation with tracked
//!   badges and snapshots.
//!
//! ## Architecture
//!
//! The crate is organized into several layers:
//!
//! ### Document Layer
//! An arena-backed document model with stable handles; every read and write
//! re-validates that the node is still attached, because the host page may
//! detach any subtree at any time.
//!
//! ### Detection Layer
//! Selector list, element-level filter, time-value heuristic and price
//! parsing feeding the extractor's deduplicated candidate set.
//!
//! ### Conversion Layer
//! Wage math, display formatting and tier colors.
//!
//! ### Presentation & Session Layer
//! The per-document session owns presentation state and the pass lifecycle;
//! a single-slot debouncer collapses mutation bursts into one pass.

// Document Model
/// Arena-backed mutable document tree with stable node handles
pub mod dom;

// Detection Layer
/// Shopping-site gate for page addresses
pub mod site;
/// Structural scan selectors, generic to site-specific
pub mod selectors;
/// Time-value heuristic and currency patterns
pub mod heuristics;
/// Element-level filtering of price candidates
pub mod element_filter;
/// Price text parsing with separator normalization
pub mod price_parser;
/// Candidate extraction over both scan strategies
pub mod extractor;

// Conversion Layer
/// Price-to-hours conversion and display formatting
pub mod converter;
/// Green/yellow/red tier classification
pub mod tiers;

// Presentation & Session
/// Annotation attribute contract
pub mod annotations;
/// Badge injection and in-place replacement state machine
pub mod presentation;
/// Per-document session and pass lifecycle
pub mod session;
/// Single-slot debounce timer for mutation-triggered reprocessing
pub mod debounce;
/// Inbound control messages
pub mod messages;

// Infrastructure
/// Persisted user preferences behind an async store trait
pub mod storage;
/// Counters and observability hooks
pub mod metrics;
/// Static configuration
pub mod settings;

// Re-exports for convenience
pub use dom::Document;
pub use extractor::{PriceCandidate, PriceExtractor};
pub use presentation::{DisplayMode, PresentationController};
pub use session::DocumentSession;
pub use settings::Settings;
pub use storage::{MemoryStore, SettingsStore};
