//! BER encoding rules for the subset of ASN.1 that SNMP uses.

pub mod decode;
pub mod encode;

pub use decode::Asn1Error;
