//! Latch Metrics - Object churn tracking for pools
//!
//! Provides zero-cost abstractions for metrics collection that completely
//! vanish in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use latch_metrics::{ChurnCounter, ChurnEvent};
//!
//! let mut churn = ChurnCounter::new();
//! churn.record("bullet", ChurnEvent::Acquired);
//! println!("bullets acquired: {}", churn.get("bullet").acquired);
//! ```
//!
//! In production builds (without `metrics` feature), all instrumentation
//! is compiled out to zero overhead.

#[cfg(feature = "metrics")]
mod churn;

#[cfg(feature = "metrics")]
pub use churn::ChurnCounter;

/// Lifecycle event of a pooled object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChurnEvent {
    Created,
    Acquired,
    Released,
    Destroyed,
}

/// Accumulated lifecycle events for one pool alias.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Churn {
    pub created: u64,
    pub acquired: u64,
    pub released: u64,
    pub destroyed: u64,
}

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub struct ChurnCounter;

#[cfg(not(feature = "metrics"))]
impl ChurnCounter {
    pub fn new() -> Self { Self }
    pub fn record(&mut self, _alias: &str, _event: ChurnEvent) {}
    pub fn get(&self, _alias: &str) -> Churn { Churn::default() }
    pub fn total(&self) -> Churn { Churn::default() }
    pub fn reset(&mut self, _alias: &str) {}
    pub fn reset_all(&mut self) {}
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Churn)> { std::iter::empty() }
}

#[cfg(not(feature = "metrics"))]
impl Default for ChurnCounter {
    fn default() -> Self { Self }
}
