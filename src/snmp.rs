use crate::asn1::{Asn1Error, decode, encode};
use crate::error::SnmpError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;
use std::str::FromStr;

/// Well-known OID for sysDescr.0.
pub const SYS_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 1, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V1,
    V2c,
}

impl Version {
    pub fn to_wire(self) -> i32 {
        match self {
            Version::V1 => 0,
            Version::V2c => 1,
        }
    }

    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Version::V1),
            1 => Some(Version::V2c),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::V1 => write!(f, "1"),
            Version::V2c => write!(f, "2c"),
        }
    }
}

impl FromStr for Version {
    type Err = SnmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" | "v1" => Ok(Version::V1),
            "2c" | "v2c" => Ok(Version::V2c),
            other => Err(SnmpError::InvalidConfig(format!(
                "unsupported SNMP version {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduType {
    GetRequest,
    GetNextRequest,
    GetResponse,
    SetRequest,
}

impl PduType {
    pub fn to_tag(self) -> u8 {
        match self {
            PduType::GetRequest => encode::GET_REQUEST_TAG,
            PduType::GetNextRequest => encode::GET_NEXT_REQUEST_TAG,
            PduType::GetResponse => encode::GET_RESPONSE_TAG,
            PduType::SetRequest => encode::SET_REQUEST_TAG,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            encode::GET_REQUEST_TAG => Some(PduType::GetRequest),
            encode::GET_NEXT_REQUEST_TAG => Some(PduType::GetNextRequest),
            encode::GET_RESPONSE_TAG => Some(PduType::GetResponse),
            encode::SET_REQUEST_TAG => Some(PduType::SetRequest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i32),
    OctetString(Vec<u8>),
    Null,
    ObjectIdentifier(Vec<u32>),
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varbind {
    pub oid: Vec<u32>,
    pub value: SnmpValue,
}

impl Varbind {
    /// A varbind as sent in a GetRequest: the OID with a NULL value.
    pub fn null(oid: &[u32]) -> Self {
        Self {
            oid: oid.to_vec(),
            value: SnmpValue::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpPdu {
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: i32,
    pub error_index: i32,
    pub varbinds: Vec<Varbind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpMessage {
    pub version: Version,
    pub community: Vec<u8>,
    pub pdu: SnmpPdu,
}

impl SnmpMessage {
    pub fn get_request(
        version: Version,
        community: &str,
        request_id: i32,
        oids: &[&[u32]],
    ) -> Self {
        Self {
            version,
            community: community.as_bytes().to_vec(),
            pdu: SnmpPdu {
                pdu_type: PduType::GetRequest,
                request_id,
                error_status: 0,
                error_index: 0,
                varbinds: oids.iter().map(|oid| Varbind::null(oid)).collect(),
            },
        }
    }

    /// Builds the GetResponse an agent sends back for `self`, echoing the
    /// version, community and request id.
    pub fn response(&self, varbinds: Vec<Varbind>, error_status: i32, error_index: i32) -> Self {
        Self {
            version: self.version,
            community: self.community.clone(),
            pdu: SnmpPdu {
                pdu_type: PduType::GetResponse,
                request_id: self.pdu.request_id,
                error_status,
                error_index,
                varbinds,
            },
        }
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        build_snmp_msg(self, &mut buf);
        buf
    }
}

/// Parses dotted OID notation such as `1.3.6.1.2.1.1.1.0`. A leading dot is
/// accepted; at least two arcs are required.
pub fn parse_oid(text: &str) -> Result<Vec<u32>, SnmpError> {
    let trimmed = text.trim().trim_start_matches('.');
    let oid = trimmed
        .split('.')
        .map(|arc| arc.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| SnmpError::InvalidOid(text.to_string()))?;

    validate_oid(&oid).map_err(|_| SnmpError::InvalidOid(text.to_string()))?;
    Ok(oid)
}

/// Checks that `oid` can be BER encoded: at least two arcs, a first arc of
/// 0, 1 or 2, a second arc below 40 under 0 and 1, and a combined first
/// sub-identifier that fits in 32 bits under 2.
pub fn validate_oid(oid: &[u32]) -> Result<(), SnmpError> {
    let valid = match oid {
        [0 | 1, second, ..] => *second < 40,
        [2, second, ..] => second.checked_add(80).is_some(),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SnmpError::InvalidOid(format_oid(oid)))
    }
}

pub fn format_oid(oid: &[u32]) -> String {
    oid.iter()
        .map(|arc| arc.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

pub fn build_varbind(varbind: &Varbind, buf: &mut BytesMut) {
    let mut varbind_buf = BytesMut::new();

    encode::encode_oid(&varbind.oid, &mut varbind_buf);

    match &varbind.value {
        SnmpValue::Integer(val) => encode::encode_integer(*val, &mut varbind_buf),
        SnmpValue::OctetString(val) => encode::encode_octet_string(val, &mut varbind_buf),
        SnmpValue::Null => encode::encode_null(&mut varbind_buf),
        SnmpValue::ObjectIdentifier(val) => encode::encode_oid(val, &mut varbind_buf),
        SnmpValue::IpAddress(addr) => encode::encode_ip_address(*addr, &mut varbind_buf),
        SnmpValue::Counter32(val) => {
            encode::encode_unsigned(*val as u64, encode::COUNTER32_TAG, &mut varbind_buf)
        }
        SnmpValue::Gauge32(val) => {
            encode::encode_unsigned(*val as u64, encode::GAUGE32_TAG, &mut varbind_buf)
        }
        SnmpValue::TimeTicks(val) => {
            encode::encode_unsigned(*val as u64, encode::TIMETICKS_TAG, &mut varbind_buf)
        }
        SnmpValue::Counter64(val) => {
            encode::encode_unsigned(*val, encode::COUNTER64_TAG, &mut varbind_buf)
        }
        SnmpValue::NoSuchObject => {
            encode::encode_empty(encode::NO_SUCH_OBJECT_TAG, &mut varbind_buf)
        }
        SnmpValue::NoSuchInstance => {
            encode::encode_empty(encode::NO_SUCH_INSTANCE_TAG, &mut varbind_buf)
        }
        SnmpValue::EndOfMibView => {
            encode::encode_empty(encode::END_OF_MIB_VIEW_TAG, &mut varbind_buf)
        }
    }

    encode::encode_sequence(&varbind_buf, encode::SEQUENCE_TAG, buf);
}

pub fn build_varbind_list(varbinds: &[Varbind], buf: &mut BytesMut) {
    let mut varbind_list_buf = BytesMut::new();
    for varbind in varbinds {
        build_varbind(varbind, &mut varbind_list_buf);
    }

    encode::encode_sequence(&varbind_list_buf, encode::SEQUENCE_TAG, buf);
}

pub fn build_pdu(pdu: &SnmpPdu, buf: &mut BytesMut) {
    let mut pdu_buf = BytesMut::new();

    encode::encode_integer(pdu.request_id, &mut pdu_buf);
    encode::encode_integer(pdu.error_status, &mut pdu_buf);
    encode::encode_integer(pdu.error_index, &mut pdu_buf);

    let mut varbind_list_buf = BytesMut::new();
    build_varbind_list(&pdu.varbinds, &mut varbind_list_buf);
    pdu_buf.put_slice(&varbind_list_buf);

    encode::encode_sequence(&pdu_buf, pdu.pdu_type.to_tag(), buf);
}

pub fn build_snmp_msg(message: &SnmpMessage, buf: &mut BytesMut) {
    let mut msg_buf = BytesMut::new();

    encode::encode_integer(message.version.to_wire(), &mut msg_buf);
    encode::encode_octet_string(&message.community, &mut msg_buf);

    let mut pdu_buf = BytesMut::new();
    build_pdu(&message.pdu, &mut pdu_buf);
    msg_buf.put_slice(&pdu_buf);

    encode::encode_sequence(&msg_buf, encode::SEQUENCE_TAG, buf);
}

fn decode_value(buf: &mut Bytes) -> Result<SnmpValue, Asn1Error> {
    let tag = decode::peek_tag(buf)?;
    let value = match tag {
        encode::INTEGER_TAG => SnmpValue::Integer(decode::decode_integer(buf)?),
        encode::OCTET_STRING_TAG => SnmpValue::OctetString(decode::decode_octet_string(buf)?),
        encode::NULL_TAG => {
            decode::decode_null(buf)?;
            SnmpValue::Null
        }
        encode::OBJECT_IDENTIFIER_TAG => SnmpValue::ObjectIdentifier(decode::decode_oid(buf)?),
        encode::IP_ADDRESS_TAG => SnmpValue::IpAddress(decode::decode_ip_address(buf)?),
        encode::COUNTER32_TAG => {
            SnmpValue::Counter32(decode::decode_unsigned(buf, tag, 4)? as u32)
        }
        encode::GAUGE32_TAG => SnmpValue::Gauge32(decode::decode_unsigned(buf, tag, 4)? as u32),
        encode::TIMETICKS_TAG => {
            SnmpValue::TimeTicks(decode::decode_unsigned(buf, tag, 4)? as u32)
        }
        encode::COUNTER64_TAG => SnmpValue::Counter64(decode::decode_unsigned(buf, tag, 8)?),
        encode::NO_SUCH_OBJECT_TAG => {
            decode::decode_empty(buf, tag)?;
            SnmpValue::NoSuchObject
        }
        encode::NO_SUCH_INSTANCE_TAG => {
            decode::decode_empty(buf, tag)?;
            SnmpValue::NoSuchInstance
        }
        encode::END_OF_MIB_VIEW_TAG => {
            decode::decode_empty(buf, tag)?;
            SnmpValue::EndOfMibView
        }
        _ => return Err(Asn1Error::UnsupportedTag(tag)),
    };
    Ok(value)
}

pub fn decode_varbind(buf: &mut Bytes) -> Result<Varbind, Asn1Error> {
    let mut seq_data = decode::decode_sequence(buf, encode::SEQUENCE_TAG)?;
    let oid = decode::decode_oid(&mut seq_data)?;
    let value = decode_value(&mut seq_data)?;

    Ok(Varbind { oid, value })
}

pub fn decode_varbind_list(buf: &mut Bytes) -> Result<Vec<Varbind>, Asn1Error> {
    let mut seq_data = decode::decode_sequence(buf, encode::SEQUENCE_TAG)?;

    let mut varbinds = Vec::new();
    while seq_data.remaining() > 0 {
        varbinds.push(decode_varbind(&mut seq_data)?);
    }

    Ok(varbinds)
}

pub fn decode_pdu(buf: &mut Bytes) -> Result<SnmpPdu, Asn1Error> {
    let tag = decode::peek_tag(buf)?;
    let pdu_type = PduType::from_tag(tag).ok_or(Asn1Error::UnsupportedTag(tag))?;

    let mut pdu_data = decode::decode_sequence(buf, tag)?;

    let request_id = decode::decode_integer(&mut pdu_data)?;
    let error_status = decode::decode_integer(&mut pdu_data)?;
    let error_index = decode::decode_integer(&mut pdu_data)?;
    let varbinds = decode_varbind_list(&mut pdu_data)?;

    Ok(SnmpPdu {
        pdu_type,
        request_id,
        error_status,
        error_index,
        varbinds,
    })
}

pub fn decode_snmp_message(data: &[u8]) -> Result<SnmpMessage, Asn1Error> {
    let mut buf = Bytes::copy_from_slice(data);
    let mut msg_data = decode::decode_sequence(&mut buf, encode::SEQUENCE_TAG)?;

    let wire_version = decode::decode_integer(&mut msg_data)?;
    let version =
        Version::from_wire(wire_version).ok_or(Asn1Error::UnsupportedVersion(wire_version))?;

    let community = decode::decode_octet_string(&mut msg_data)?;
    let pdu = decode_pdu(&mut msg_data)?;

    Ok(SnmpMessage {
        version,
        community,
        pdu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_request_matches_net_snmp_encoding() {
        // snmpget -v2c -c public <host> 1.3.6.1.2.1.1.1.0 with request id 1
        let expected: Vec<u8> = vec![
            0x30, 0x26, 0x02, 0x01, 0x01, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', 0xA0,
            0x19, 0x02, 0x01, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0E, 0x30, 0x0C,
            0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, 0x05, 0x00,
        ];
        let message = SnmpMessage::get_request(Version::V2c, "public", 1, &[SYS_DESCR]);
        assert_eq!(message.encode().to_vec(), expected);
    }

    #[test]
    fn response_decodes_application_types() {
        let request = SnmpMessage::get_request(Version::V2c, "public", 77, &[SYS_DESCR]);
        let response = request.response(
            vec![
                Varbind {
                    oid: vec![1, 3, 6, 1, 2, 1, 1, 3, 0],
                    value: SnmpValue::TimeTicks(123_456),
                },
                Varbind {
                    oid: vec![1, 3, 6, 1, 2, 1, 4, 20, 1, 1, 10, 0, 0, 1],
                    value: SnmpValue::IpAddress([10, 0, 0, 1]),
                },
                Varbind {
                    oid: vec![1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6, 1],
                    value: SnmpValue::Counter64(u64::MAX),
                },
                Varbind {
                    oid: vec![1, 3, 6, 1, 2, 1, 1, 9, 9],
                    value: SnmpValue::NoSuchInstance,
                },
            ],
            0,
            0,
        );

        let decoded = decode_snmp_message(&response.encode()).unwrap();
        assert_eq!(decoded, response);
        assert_eq!(decoded.pdu.pdu_type, PduType::GetResponse);
        assert_eq!(decoded.pdu.request_id, 77);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut message = SnmpMessage::get_request(Version::V1, "public", 1, &[SYS_DESCR]).encode();
        // version INTEGER content byte
        message[4] = 3;
        assert_eq!(
            decode_snmp_message(&message),
            Err(Asn1Error::UnsupportedVersion(3))
        );
    }

    #[test]
    fn trailing_garbage_inside_varbind_list_fails() {
        let mut buf = BytesMut::new();
        encode::encode_sequence(&[0x02, 0x01], encode::SEQUENCE_TAG, &mut buf);
        let mut bytes = buf.freeze();
        assert!(decode_varbind_list(&mut bytes).is_err());
    }

    #[test]
    fn parse_oid_accepts_leading_dot() {
        assert_eq!(parse_oid(".1.3.6.1.2.1.1.1.0").unwrap(), SYS_DESCR.to_vec());
        assert_eq!(format_oid(SYS_DESCR), "1.3.6.1.2.1.1.1.0");
    }

    #[test]
    fn parse_oid_rejects_bad_input() {
        for text in ["", "1", "1..3", "a.b", "3.1", "1.40"] {
            assert!(
                matches!(parse_oid(text), Err(SnmpError::InvalidOid(_))),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn validate_oid_checks_the_first_two_arcs() {
        assert!(validate_oid(SYS_DESCR).is_ok());
        assert!(validate_oid(&[2, u32::MAX - 80]).is_ok());
        let rejected: [&[u32]; 6] = [
            &[1],
            &[3, 1],
            &[1, 40],
            &[7, 3, 6],
            &[1, u32::MAX],
            &[2, u32::MAX],
        ];
        for oid in rejected {
            assert!(
                matches!(validate_oid(oid), Err(SnmpError::InvalidOid(_))),
                "{oid:?} should be rejected"
            );
        }
    }

    #[test]
    fn version_parses_cli_spellings() {
        assert_eq!("2c".parse::<Version>().unwrap(), Version::V2c);
        assert_eq!("v1".parse::<Version>().unwrap(), Version::V1);
        assert!("3".parse::<Version>().is_err());
    }
}
