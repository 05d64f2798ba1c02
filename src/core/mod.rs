//! Core data types for error-tolerant read identification.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`ReferenceEntry`](reference::ReferenceEntry): A raw reference sequence with its label
//! - [`ReferenceSet`](reference::ReferenceSet): All entries of one reference table
//! - [`Classification`](types::Classification): How a dictionary variant relates to its reference
//! - [`Orientation`](types::Orientation), [`Channel`](types::Channel): Run layout types
//!
//! ## Reference layout
//!
//! Every raw reference sequence carries one flank base on each side of the
//! region that is matched against reads:
//!
//! | Raw       | Core    | Core + trailing flank |
//! |-----------|---------|-----------------------|
//! | `GACGTC`  | `ACGT`  | `ACGTC`               |
//!
//! The trailing flank supplies the base a read pulls in after a deletion.

pub mod reference;
pub mod sequence;
pub mod types;
