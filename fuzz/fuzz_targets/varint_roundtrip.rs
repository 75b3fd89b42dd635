#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: varint encode->decode roundtrip.
//
// Takes 8 bytes of fuzz input, interprets as a u64, encodes it as a
// LEB128 varint, then decodes it and asserts the value matches.
fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }
    let value = u64::from_le_bytes(data[..8].try_into().unwrap());

    let mut buf = Vec::new();
    let encoded_len = bdc_wire::varint::encode_varint(value, &mut buf);
    assert_eq!(encoded_len, buf.len());

    let (decoded, decoded_len) = bdc_wire::varint::decode_varint(&buf).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(decoded_len, encoded_len);
});
