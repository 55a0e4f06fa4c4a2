use bytes::{BufMut, BytesMut};

// ASN.1 BER tag constants
pub const INTEGER_TAG: u8 = 0x02;
pub const OCTET_STRING_TAG: u8 = 0x04;
pub const NULL_TAG: u8 = 0x05;
pub const OBJECT_IDENTIFIER_TAG: u8 = 0x06;
pub const SEQUENCE_TAG: u8 = 0x30;

// SNMP application types (RFC 2578)
pub const IP_ADDRESS_TAG: u8 = 0x40;
pub const COUNTER32_TAG: u8 = 0x41;
pub const GAUGE32_TAG: u8 = 0x42;
pub const TIMETICKS_TAG: u8 = 0x43;
pub const COUNTER64_TAG: u8 = 0x46;

// v2c varbind exceptions
pub const NO_SUCH_OBJECT_TAG: u8 = 0x80;
pub const NO_SUCH_INSTANCE_TAG: u8 = 0x81;
pub const END_OF_MIB_VIEW_TAG: u8 = 0x82;

pub const GET_REQUEST_TAG: u8 = 0xA0;
pub const GET_NEXT_REQUEST_TAG: u8 = 0xA1;
pub const GET_RESPONSE_TAG: u8 = 0xA2;
pub const SET_REQUEST_TAG: u8 = 0xA3;

// use Definite Form
pub fn encode_length(len: usize, buf: &mut BytesMut) {
    if len < 0x80 {
        //short form - one byte
        buf.put_u8(len as u8);
    } else {
        //long form - mutiple bytes
        let mut bytes = Vec::new();
        let mut temp_len = len;

        while temp_len > 0 {
            bytes.push((temp_len & 0xFF) as u8);
            temp_len >>= 8;
        }

        buf.put_u8(0x80 | bytes.len() as u8);

        for i in bytes.iter().rev() {
            buf.put_u8(*i);
        }
    }
}

/// Encodes an ASN.1 INTEGER into the buffer
pub fn encode_integer(value: i32, buf: &mut BytesMut) {
    buf.put_u8(INTEGER_TAG);

    let mut temp = value;
    let mut len = 1;

    while (temp > 127) || (temp < -128) {
        temp >>= 8;
        len += 1;
    }

    encode_length(len, buf);

    for i in (0..len).rev() {
        let shift = i * 8;
        buf.put_u8(((value >> shift) & 0xFF) as u8);
    }
}

/// Encodes an unsigned application value (Counter32, Gauge32, TimeTicks,
/// Counter64) with the given tag.
///
/// The content is the shortest big-endian form whose high bit is clear, so a
/// leading zero byte is added when the top bit of the value is set.
pub fn encode_unsigned(value: u64, tag: u8, buf: &mut BytesMut) {
    buf.put_u8(tag);

    let bytes = value.to_be_bytes();
    let start = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len() - 1);
    let content = &bytes[start..];

    if content[0] & 0x80 != 0 {
        encode_length(content.len() + 1, buf);
        buf.put_u8(0x00);
    } else {
        encode_length(content.len(), buf);
    }
    buf.put_slice(content);
}

pub fn encode_octet_string(data: &[u8], buf: &mut BytesMut) {
    buf.put_u8(OCTET_STRING_TAG);
    encode_length(data.len(), buf);
    buf.put_slice(data);
}

pub fn encode_ip_address(addr: [u8; 4], buf: &mut BytesMut) {
    buf.put_u8(IP_ADDRESS_TAG);
    encode_length(addr.len(), buf);
    buf.put_slice(&addr);
}

pub fn encode_null(buf: &mut BytesMut) {
    encode_empty(NULL_TAG, buf);
}

/// Writes a zero-length value, as used by NULL and the v2c exceptions.
pub fn encode_empty(tag: u8, buf: &mut BytesMut) {
    buf.put_u8(tag);
    buf.put_u8(0x00);
}

/// Encodes content as an ASN.1 sequence with the given tag.
///
/// This function writes a tag byte, encodes the length of the content,
/// and then appends the content itself to the buffer. PDUs are constructed
/// types too, so the same function wraps them with their context tag.
///
/// # Arguments
///
/// * `content` - A slice of bytes representing the content to be encoded.
/// * `tag` - The ASN.1 tag to be used for the sequence.
/// * `buf` - A mutable reference to a `BytesMut` buffer where the encoded
///   sequence will be written.
pub fn encode_sequence(content: &[u8], tag: u8, buf: &mut BytesMut) {
    buf.put_u8(tag);
    encode_length(content.len(), buf);
    buf.put_slice(content);
}

/// Encodes an OBJECT IDENTIFIER. The first two arcs share one
/// sub-identifier (`40 * first + second`), computed in 64 bits; callers
/// guarantee at least two arcs (see `snmp::validate_oid`).
pub fn encode_oid(oid: &[u32], buf: &mut BytesMut) {
    buf.put_u8(OBJECT_IDENTIFIER_TAG);

    let mut oid_buf = BytesMut::new();

    if oid.len() >= 2 {
        let first = (oid[0] as u64)
            .saturating_mul(40)
            .saturating_add(oid[1] as u64);
        put_subidentifier(first, &mut oid_buf);
    }

    for &num in oid.iter().skip(2) {
        put_subidentifier(num as u64, &mut oid_buf);
    }

    encode_length(oid_buf.len(), buf);
    buf.put_slice(&oid_buf);
}

// base-128, high bit set on every byte but the last
fn put_subidentifier(num: u64, buf: &mut BytesMut) {
    if num < 128 {
        buf.put_u8(num as u8);
        return;
    }

    let mut bytes = Vec::new();
    let mut temp = num;
    bytes.push((temp & 0x7F) as u8);
    temp >>= 7;

    while temp > 0 {
        bytes.push(((temp & 0x7F) | 0x80) as u8);
        temp >>= 7;
    }

    for b in bytes.iter().rev() {
        buf.put_u8(*b);
    }
}
