#![allow(clippy::len_without_is_empty)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::todo)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::unwrap_used)]

//! Persistent storage for the vidsweep duplicate finder.
//!
//! Fingerprinting a video costs seconds of decoding; looking one up here
//! costs a stat call. [`FingerprintCache`] keeps fingerprints across runs
//! and returns a cached entry only while the file's size and modification
//! time both still match exactly. [`IgnoreList`] records duplicate groups
//! the operator has dismissed, keyed by content so the dismissal survives
//! renames and cache resets.
//!
//! Both stores treat a corrupt or truncated file on disk as absent: a
//! warning is logged and the store starts empty rather than aborting the
//! run. Saves are atomic (write to a temp file, fsync, rename).

mod base_fs_cache;
mod errors;
mod fingerprint_cache;
mod ignore_list;

pub use errors::CacheError;
pub use fingerprint_cache::FingerprintCache;
pub use ignore_list::IgnoreList;

type CacheResult<T> = Result<T, CacheError>;
