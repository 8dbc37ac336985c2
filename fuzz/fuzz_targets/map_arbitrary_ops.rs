#![no_main]

use dense_handle_map_fuzz::select;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on both maps; see `select` for the
// input layout.
fuzz_target!(|data: &[u8]| {
    if let Some((_, run, ops)) = select(data) {
        run(ops);
    }
});
