//! Fuzz target: `split_record_frame` and `decode_racp_response`
//!
//! Both decoders see the same bytes. The record payload must always be
//! the exact tail after the five-byte header.
//!
//! cargo fuzz run fuzz_record_frame

#![no_main]

use bpmon::codec::record::RECORD_HEADER_LEN;
use bpmon::codec::{decode_racp_response, split_record_frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((header, payload)) = split_record_frame(data) {
        assert_eq!(payload, &data[RECORD_HEADER_LEN..]);
        assert_eq!(header.payload_length, payload.len());
        assert!(header.segment_counter < 64);
    }
    let _ = decode_racp_response(data);
});
