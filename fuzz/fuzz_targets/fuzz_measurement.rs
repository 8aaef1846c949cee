//! Fuzz target: `decode_measurement`
//!
//! Arbitrary notification payloads must never panic, and a successful
//! decode only ever reports optional fields its flags byte announced.
//!
//! cargo fuzz run fuzz_measurement

#![no_main]

use bpmon::codec::decode_measurement;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(m) = decode_measurement(data) else {
        return;
    };
    let flags = data[0];
    assert_eq!(m.timestamp.is_some(), flags & 0x02 != 0);
    assert_eq!(m.pulse_rate.is_some(), flags & 0x04 != 0);
    assert_eq!(m.user_id.is_some(), flags & 0x08 != 0);
    assert_eq!(m.status.is_some(), flags & 0x10 != 0);
});
