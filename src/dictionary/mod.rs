//! Error-tolerant lookup dictionaries.
//!
//! A dictionary maps every sequence a reference could plausibly be read as to
//! the reference it came from. Keys are generated ahead of time so that
//! classifying a read is a single hash lookup.
//!
//! ## Variant types
//!
//! For a reference core `ACGT` with trailing flank `C`:
//!
//! | Classification  | Example | Origin                                   |
//! |-----------------|---------|------------------------------------------|
//! | `ExactMatch`    | `ACGT`  | the core itself                          |
//! | `Mismatch`      | `ACGA`  | substitution within the edit budget      |
//! | `BaseDeletion`  | `ACTC`  | `G` deleted, flank `C` pulled in         |
//! | `BaseInsertion` | `TACG`  | `T` inserted, last base pushed out       |
//! | `Undetermined`  | `ACGC`  | more than one of the above               |
//!
//! ## Example
//!
//! ```rust
//! use amplicount::core::reference::ReferenceSet;
//! use amplicount::dictionary::builder::{BuildConfig, DictionaryBuilder};
//!
//! let references = ReferenceSet::from_pairs("plate.csv", [("GACGTC", "A1"), ("GTTTTC", "A2")]);
//! let dictionary = DictionaryBuilder::new(BuildConfig::default())
//!     .build(&references)
//!     .unwrap();
//!
//! assert_eq!(dictionary.get("ACGA").unwrap().label, "A1");
//! ```

pub mod builder;
pub mod store;
pub mod variants;
