use std::io;

use thiserror::Error;

use crate::asn1::Asn1Error;

#[derive(Debug, Error)]
pub enum SnmpError {
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("error establishing connection to host {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    #[error("oid count ({count}) is greater than max_oids ({max})")]
    TooManyOids { count: usize, max: usize },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid OID {0:?}")]
    InvalidOid(String),

    #[error("failed to decode SNMP message: {0}")]
    Decode(#[from] Asn1Error),
}
