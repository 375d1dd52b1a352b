//! sf-spatial: decoder for `SpatialReport_*.bin` files.
//!
//! A spatial report holds one scalar channel as a table of per-node,
//! per-timestep `f32` values. [`SpatialBinary`] decodes the wire format and
//! derives timeseries and aggregate statistics from it.
//!
//! # Example
//!
//! ```
//! use sf_spatial::{DecodeOptions, SpatialBinary, encode};
//!
//! let bytes = encode(&[10, 20], &[vec![1.0_f32, 2.0], vec![3.0, 4.0]]);
//! let report = SpatialBinary::decode("demo", &bytes, &DecodeOptions::default()).unwrap();
//!
//! assert_eq!(report.timeseries_for_node(20), &[2.0, 4.0]);
//! assert_eq!(report.sum_at(1), 7.0);
//! ```

pub mod codec;
pub mod error;
pub mod report;

pub use codec::{Header, encode, read_header};
pub use error::{SpatialError, SpatialResult};
pub use report::{DecodeOptions, SpatialBinary, channel_name};
