//! # Configuration Module - Runtime Behavior Settings
//!
//! This module provides configuration options for the viewing tracker: how often
//! speculative statistics are computed while the media plays, and how reports are printed.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use reprise::config::Configuration;
//!
//! // Use default configuration
//! let config = Configuration::default();
//! assert_eq!(config.peek_interval, Duration::from_secs(5));
//!
//! // Custom configuration
//! let config = Configuration {
//!     peek_interval: Duration::from_secs(1), // Estimate every second
//!     ..Configuration::default()
//! };
//! ```
//!
//! ## Performance Considerations
//!
//! - **Peek Interval**: Every peek rebuilds a scratch tally from the whole entry table,
//!   which costs O(n²) in the number of pause/resume segments. Shorter intervals give
//!   fresher estimates at a proportional CPU cost.

use web_time::Duration;

/// Runtime configuration for viewing statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Interval between speculative statistics while playback runs
    ///
    /// **Default**: 5 seconds
    /// **Impact**: Lower = fresher estimates, more recomputation
    pub peek_interval: Duration,

    /// Number of decimals printed for seconds and percentages
    ///
    /// **Default**: 2
    pub seconds_precision: usize,

    /// Print the entry table before each summary
    ///
    /// **Default**: true
    pub include_entry_table: bool,
}

impl Default for Configuration {
    /// # Default Values
    ///
    /// - `peek_interval`: 5 seconds
    /// - `seconds_precision`: 2
    /// - `include_entry_table`: true
    fn default() -> Self {
        Self {
            peek_interval: Duration::from_secs(5),
            seconds_precision: 2,
            include_entry_table: true,
        }
    }
}
