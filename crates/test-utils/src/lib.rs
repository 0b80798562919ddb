//! Shared test utilities for the OData client workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Sample domain objects (customers, orders, addresses)
//! - Literal Atom and JSON payloads for both service versions
//! - Geometry generators covering every concrete shape
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, generators::all_geo_values};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use odata_common::ODataError;

/// Assert that two floating point values are approximately equal.
///
/// # Usage
///
/// ```
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0, 1.0001, 0.001);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert that an expression fails with the given `ODataError` variant.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_odata_err;
///
/// assert_odata_err!(gml::parse(&tree, kind), NotInstantiableType);
/// ```
#[macro_export]
macro_rules! assert_odata_err {
    ($result:expr, $variant:ident) => {{
        match $result {
            Err($crate::ODataError::$variant { .. }) => {}
            other => panic!(
                "expected ODataError::{} but got {:?}",
                stringify!($variant),
                other
            ),
        }
    }};
}
