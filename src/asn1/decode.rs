use crate::asn1::encode;
use bytes::{Buf, Bytes};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Asn1Error {
    #[error("expected {expected} tag 0x{expected_tag:02x}, got 0x{actual:02x}")]
    UnexpectedTag {
        expected: &'static str,
        expected_tag: u8,
        actual: u8,
    },
    #[error("unsupported value tag 0x{0:02x}")]
    UnsupportedTag(u8),
    #[error("invalid length: {0}")]
    InvalidLength(String),
    #[error("unexpected end of data while decoding {0}")]
    UnexpectedEndOfData(&'static str),
    #[error("{0} does not fit in {1} bytes")]
    ValueTooLarge(&'static str, usize),
    #[error("empty OBJECT IDENTIFIER")]
    EmptyOid,
    #[error("unsupported SNMP version {0}")]
    UnsupportedVersion(i32),
}

pub type Result<T> = std::result::Result<T, Asn1Error>;

pub fn peek_tag(buf: &Bytes) -> Result<u8> {
    if buf.remaining() < 1 {
        return Err(Asn1Error::UnexpectedEndOfData("tag"));
    }
    Ok(buf[0])
}

pub fn decode_tag(buf: &mut Bytes) -> Result<u8> {
    if buf.remaining() < 1 {
        return Err(Asn1Error::UnexpectedEndOfData("tag"));
    }
    Ok(buf.get_u8())
}

pub fn decode_length(buf: &mut Bytes) -> Result<usize> {
    if buf.remaining() < 1 {
        return Err(Asn1Error::UnexpectedEndOfData("length"));
    }

    let first_byte = buf.get_u8();
    if first_byte < 0x80 {
        // Short form
        return Ok(first_byte as usize);
    }

    // Long form
    let num_bytes = (first_byte & 0x7F) as usize;
    if num_bytes == 0 {
        return Err(Asn1Error::InvalidLength(
            "indefinite form is not allowed".to_string(),
        ));
    }
    if num_bytes > 4 {
        return Err(Asn1Error::InvalidLength(format!(
            "length encoding too large: {num_bytes} bytes"
        )));
    }
    if buf.remaining() < num_bytes {
        return Err(Asn1Error::UnexpectedEndOfData("long form length"));
    }

    let mut length: usize = 0;
    for _ in 0..num_bytes {
        length = (length << 8) | (buf.get_u8() as usize);
    }

    Ok(length)
}

/// Reads a tag and length, checks the tag, and splits off the content.
fn decode_header(buf: &mut Bytes, tag: u8, what: &'static str) -> Result<Bytes> {
    let actual = decode_tag(buf)?;
    if actual != tag {
        return Err(Asn1Error::UnexpectedTag {
            expected: what,
            expected_tag: tag,
            actual,
        });
    }

    let length = decode_length(buf)?;
    if buf.remaining() < length {
        return Err(Asn1Error::UnexpectedEndOfData(what));
    }

    Ok(buf.split_to(length))
}

/// Decodes a constructed value carrying `tag`: a universal SEQUENCE or
/// one of the PDU context tags.
pub fn decode_sequence(buf: &mut Bytes, tag: u8) -> Result<Bytes> {
    decode_header(buf, tag, "SEQUENCE")
}

pub fn decode_integer(buf: &mut Bytes) -> Result<i32> {
    let mut content = decode_header(buf, encode::INTEGER_TAG, "INTEGER")?;
    let length = content.remaining();

    if length == 0 {
        return Err(Asn1Error::InvalidLength("empty INTEGER".to_string()));
    }
    if length > 4 {
        return Err(Asn1Error::ValueTooLarge("INTEGER", 4));
    }

    let first_byte = content.get_u8();

    // Handle sign bit
    let mut value: i32 = if (first_byte & 0x80) != 0 { -1 } else { 0 };
    value = (value << 8) | (first_byte as i32);

    // Process remaining bytes
    for _ in 1..length {
        value = (value << 8) | (content.get_u8() as i32);
    }

    Ok(value)
}

/// Decodes one of the unsigned application types carrying `tag`.
/// `width` is the size of the target type in bytes; one extra leading zero
/// byte is accepted.
pub fn decode_unsigned(buf: &mut Bytes, tag: u8, width: usize) -> Result<u64> {
    let mut content = decode_header(buf, tag, "unsigned integer")?;

    if content.remaining() == 0 {
        return Err(Asn1Error::InvalidLength(
            "empty unsigned integer".to_string(),
        ));
    }
    while content.remaining() > width && content[0] == 0 {
        content.advance(1);
    }
    if content.remaining() > width {
        return Err(Asn1Error::ValueTooLarge("unsigned integer", width));
    }

    let mut value: u64 = 0;
    while content.remaining() > 0 {
        value = (value << 8) | content.get_u8() as u64;
    }

    Ok(value)
}

pub fn decode_octet_string(buf: &mut Bytes) -> Result<Vec<u8>> {
    let content = decode_header(buf, encode::OCTET_STRING_TAG, "OCTET STRING")?;
    Ok(content.to_vec())
}

pub fn decode_ip_address(buf: &mut Bytes) -> Result<[u8; 4]> {
    let content = decode_header(buf, encode::IP_ADDRESS_TAG, "IpAddress")?;
    let addr: [u8; 4] = content.as_ref().try_into().map_err(|_| {
        Asn1Error::InvalidLength(format!("IpAddress of {} bytes", content.len()))
    })?;
    Ok(addr)
}

/// Decodes a zero-length value with the given tag (NULL or a v2c exception).
pub fn decode_empty(buf: &mut Bytes, tag: u8) -> Result<()> {
    let content = decode_header(buf, tag, "NULL")?;
    if !content.is_empty() {
        return Err(Asn1Error::InvalidLength(format!(
            "NULL should have zero length, got {}",
            content.len()
        )));
    }
    Ok(())
}

pub fn decode_null(buf: &mut Bytes) -> Result<()> {
    decode_empty(buf, encode::NULL_TAG)
}

// Decode an OBJECT IDENTIFIER
pub fn decode_oid(buf: &mut Bytes) -> Result<Vec<u32>> {
    let mut oid_bytes = decode_header(buf, encode::OBJECT_IDENTIFIER_TAG, "OBJECT IDENTIFIER")?;

    if oid_bytes.remaining() == 0 {
        return Err(Asn1Error::EmptyOid);
    }

    // First sub-identifier encodes the first two components
    let first = next_subidentifier(&mut oid_bytes)?;
    let mut result = match first {
        0..=39 => vec![0, first],
        40..=79 => vec![1, first - 40],
        _ => vec![2, first - 80],
    };

    while oid_bytes.remaining() > 0 {
        result.push(next_subidentifier(&mut oid_bytes)?);
    }

    Ok(result)
}

// Each component can span multiple bytes; the last one has its high bit clear
fn next_subidentifier(buf: &mut Bytes) -> Result<u32> {
    let mut value: u32 = 0;
    loop {
        if buf.remaining() == 0 {
            return Err(Asn1Error::UnexpectedEndOfData("OID sub-identifier"));
        }
        let byte = buf.get_u8();
        if value > (u32::MAX >> 7) {
            return Err(Asn1Error::ValueTooLarge("OID sub-identifier", 4));
        }
        value = (value << 7) | (byte & 0x7F) as u32;
        if (byte & 0x80) == 0 {
            return Ok(value);
        }
    }
}
