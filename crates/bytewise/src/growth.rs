// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::num::NonZero;
use std::sync::Arc;

use crate::{Error, Result};

type GrowFn = dyn Fn(usize, usize) -> usize + Send + Sync + 'static;

/// Decides how large a byte buffer becomes when it must grow.
///
/// A strategy maps `(current_size, additional_requested)` to a new size. Whatever the strategy
/// computes, [`new_size()`][Self::new_size] never returns less than
/// `current_size + additional_requested`, so a custom strategy cannot shrink a buffer below what
/// was requested.
///
/// Strategies are only consulted when the existing capacity is insufficient.
///
/// # Example
///
/// ```
/// use bytewise::GrowthStrategy;
///
/// let strategy = GrowthStrategy::Doubling;
/// assert_eq!(strategy.new_size(100, 10).unwrap(), 200);
///
/// // A custom strategy that under-allocates is clamped up to what was requested.
/// let stingy = GrowthStrategy::custom(|current, _| current);
/// assert_eq!(stingy.new_size(100, 10).unwrap(), 110);
/// ```
#[derive(Clone, Default)]
pub enum GrowthStrategy {
    /// Grows to exactly the requested size.
    Exact,

    /// Doubles the current size, or grows to the requested size if doubling is not enough.
    #[default]
    Doubling,

    /// Grows in multiples of a fixed step.
    Chunked(NonZero<usize>),

    /// Delegates to a user-supplied function.
    Custom(Arc<GrowFn>),
}

impl GrowthStrategy {
    /// Creates a strategy that delegates to `grow_fn`.
    pub fn custom<F>(grow_fn: F) -> Self
    where
        F: Fn(usize, usize) -> usize + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(grow_fn))
    }

    /// Calculates the size a buffer of `current` bytes grows to when `additional` more bytes are needed.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] if
    /// `current + additional` overflows `usize`.
    pub fn new_size(&self, current: usize, additional: usize) -> Result<usize> {
        let required = current.checked_add(additional).ok_or_else(|| {
            Error::invalid_argument(format!("growing {current} bytes by {additional} bytes overflows"))
        })?;

        let proposed = match self {
            Self::Exact => required,
            Self::Doubling => current.saturating_mul(2),
            Self::Chunked(step) => {
                let step = step.get();
                required.div_ceil(step).saturating_mul(step)
            }
            Self::Custom(grow_fn) => grow_fn(current, additional),
        };

        Ok(proposed.max(required))
    }
}

impl fmt::Debug for GrowthStrategy {
    #[cfg_attr(test, mutants::skip)] // We have no API contract here.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("Exact"),
            Self::Doubling => f.write_str("Doubling"),
            Self::Chunked(step) => f.debug_tuple("Chunked").field(step).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
