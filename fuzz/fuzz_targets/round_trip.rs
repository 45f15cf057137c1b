#![no_main]
use libfuzzer_sys::fuzz_target;
use static_arith::{compress, decompress, Error};

fuzz_target!(|data: Vec<u8>| {
    let compressed = match compress(&data) {
        Ok(compressed) => compressed,
        Err(Error::AlphabetFull) => return,
        Err(e) => panic!("unexpected compress error: {e}"),
    };
    assert_eq!(decompress(&compressed.bytes).unwrap(), data);
});
