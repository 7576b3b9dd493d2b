//! Fuzz target for diagnostic bundle reading.
//!
//! Bundles may arrive from untrusted sources: parsing arbitrary input must
//! return an error, never panic, and never accept an unsafe entry path.

#![no_main]

use fdb_bundle::BundleReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(reader) = BundleReader::from_bytes(data) {
        for path in reader.entry_paths() {
            assert!(!path.starts_with('/'));
            assert!(!path.split('/').any(|part| part == ".." || part.is_empty()));
        }
        let _ = reader.verify_all();
    }
});
