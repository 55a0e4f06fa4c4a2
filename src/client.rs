use std::io::{self, Read, Write};
use std::net::{
    Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket,
};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::asn1::Asn1Error;
use crate::config::{SessionConfig, Transport};
use crate::error::SnmpError;
use crate::snmp::{self, PduType, SnmpMessage, SnmpPdu};

/// Largest datagram we accept; the UDP payload limit.
const RX_BUF_SIZE: usize = 65535;

enum Conn {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

/// An open session with one agent.
///
/// Obtained from [`SnmpClient::connect`]; released by [`SnmpClient::close`]
/// or by dropping it.
pub struct SnmpClient {
    conn: Conn,
    config: SessionConfig,
    peer: SocketAddr,
    request_id: i32,
}

impl SnmpClient {
    /// Validates `config`, resolves the target and opens the transport.
    ///
    /// For UDP this binds a local socket and connects it to the agent, which
    /// sends nothing on the wire. For TCP the handshake is made with the
    /// configured timeout. `local_addr` only applies to UDP.
    pub fn connect(config: &SessionConfig) -> Result<Self, SnmpError> {
        config.validate()?;

        let address = config.address();
        let addrs: Vec<SocketAddr> = address
            .to_socket_addrs()
            .map_err(|source| SnmpError::Resolve {
                target: address.clone(),
                source,
            })?
            .collect();

        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no addresses resolved");
        if addrs.is_empty() {
            return Err(SnmpError::Resolve {
                target: address,
                source: last_err,
            });
        }

        for addr in addrs {
            match open(config, addr) {
                Ok(conn) => {
                    debug!(peer = %addr, transport = %config.transport, "session established");
                    return Ok(Self {
                        conn,
                        config: config.clone(),
                        peer: addr,
                        request_id: (rand::random::<u32>() & 0x7fff_ffff) as i32,
                    });
                }
                Err(e) => {
                    debug!(peer = %addr, error = %e, "connect attempt failed");
                    last_err = e;
                }
            }
        }

        Err(SnmpError::Connect {
            target: address,
            source: last_err,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SnmpError> {
        let addr = match &self.conn {
            Conn::Udp(socket) => socket.local_addr()?,
            Conn::Tcp(stream) => stream.local_addr()?,
        };
        Ok(addr)
    }

    /// Sends one GetRequest for `oids` and waits for the matching response.
    ///
    /// Every attempt carries a fresh request id. Responses with a different
    /// id are skipped. A non-zero error status in the response is returned
    /// as data, not as an error.
    pub fn get(&mut self, oids: &[&[u32]]) -> Result<SnmpPdu, SnmpError> {
        if oids.is_empty() {
            return Err(SnmpError::InvalidRequest("no OIDs given".to_string()));
        }
        if oids.len() > self.config.max_oids {
            return Err(SnmpError::TooManyOids {
                count: oids.len(),
                max: self.config.max_oids,
            });
        }
        for oid in oids {
            snmp::validate_oid(oid)?;
        }

        let attempts = self.config.retries.saturating_add(1);
        for attempt in 0..attempts {
            let request_id = self.next_request_id();
            let request = SnmpMessage::get_request(
                self.config.version,
                &self.config.community,
                request_id,
                oids,
            )
            .encode();
            let timeout = self.config.attempt_timeout(attempt);

            debug!(peer = %self.peer, request_id, attempt, ?timeout, "sending GetRequest");
            self.send(&request)?;

            if let Some(pdu) = self.receive(request_id, timeout)? {
                return Ok(pdu);
            }
            debug!(peer = %self.peer, request_id, attempt, "request timed out");
        }

        Err(SnmpError::Timeout { attempts })
    }

    /// Releases the connection.
    pub fn close(self) -> Result<(), SnmpError> {
        match self.conn {
            Conn::Tcp(stream) => match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
                Err(e) => return Err(e.into()),
            },
            Conn::Udp(socket) => drop(socket),
        }
        debug!(peer = %self.peer, "session closed");
        Ok(())
    }

    fn next_request_id(&mut self) -> i32 {
        self.request_id = self.request_id.wrapping_add(1) & 0x7fff_ffff;
        self.request_id
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), SnmpError> {
        match &mut self.conn {
            Conn::Udp(socket) => {
                socket.send(payload)?;
            }
            Conn::Tcp(stream) => {
                stream.write_all(payload)?;
                stream.flush()?;
            }
        }
        Ok(())
    }

    // Ok(None) means the deadline passed without a matching response.
    fn receive(
        &mut self,
        request_id: i32,
        timeout: Duration,
    ) -> Result<Option<SnmpPdu>, SnmpError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            let frame = match self.read_frame(remaining) {
                Ok(frame) => frame,
                Err(e) if is_timeout(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            let message = match snmp::decode_snmp_message(&frame) {
                Ok(message) => message,
                Err(e) => match self.conn {
                    Conn::Udp(_) => {
                        warn!(peer = %self.peer, error = %e, "discarding undecodable datagram");
                        continue;
                    }
                    Conn::Tcp(_) => return Err(e.into()),
                },
            };

            if message.pdu.pdu_type != PduType::GetResponse {
                warn!(
                    peer = %self.peer,
                    pdu_type = ?message.pdu.pdu_type,
                    "ignoring unexpected PDU"
                );
                continue;
            }
            if message.pdu.request_id != request_id {
                warn!(
                    peer = %self.peer,
                    expected = request_id,
                    got = message.pdu.request_id,
                    "ignoring response with mismatched request id"
                );
                continue;
            }

            return Ok(Some(message.pdu));
        }
    }

    fn read_frame(&mut self, timeout: Duration) -> io::Result<Vec<u8>> {
        match &mut self.conn {
            Conn::Udp(socket) => {
                socket.set_read_timeout(Some(timeout))?;
                let mut buf = vec![0u8; RX_BUF_SIZE];
                let len = socket.recv(&mut buf)?;
                buf.truncate(len);
                Ok(buf)
            }
            Conn::Tcp(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                read_tcp_frame(stream)
            }
        }
    }
}

fn open(config: &SessionConfig, addr: SocketAddr) -> io::Result<Conn> {
    match config.transport {
        Transport::Udp => {
            let bind_addr = config.local_addr.unwrap_or_else(|| {
                if addr.is_ipv4() {
                    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
                } else {
                    SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
                }
            });
            let socket = UdpSocket::bind(bind_addr)?;
            socket.connect(addr)?;
            Ok(Conn::Udp(socket))
        }
        Transport::Tcp => {
            let stream = TcpStream::connect_timeout(&addr, config.timeout)?;
            stream.set_nodelay(true)?;
            Ok(Conn::Tcp(stream))
        }
    }
}

/// Reads one BER-framed message: the outer SEQUENCE header tells how many
/// content bytes follow.
pub fn read_tcp_frame<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut frame = BytesMut::new();

    let mut header = [0u8; 2];
    reader.read_exact(&mut header)?;
    frame.extend_from_slice(&header);

    let length = if header[1] & 0x80 == 0 {
        header[1] as usize
    } else {
        let num_bytes = (header[1] & 0x7F) as usize;
        if num_bytes == 0 || num_bytes > 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                Asn1Error::InvalidLength(format!("{num_bytes} length bytes in frame header")),
            ));
        }
        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes[..num_bytes])?;
        frame.extend_from_slice(&len_bytes[..num_bytes]);
        len_bytes[..num_bytes]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize)
    };

    if length > RX_BUF_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {length} bytes exceeds {RX_BUF_SIZE}"),
        ));
    }

    let start = frame.len();
    frame.resize(start + length, 0);
    reader.read_exact(&mut frame[start..])?;
    Ok(frame.to_vec())
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn tcp_frame_reads_exactly_one_message() {
        let message =
            SnmpMessage::get_request(snmp::Version::V2c, "public", 5, &[snmp::SYS_DESCR])
                .encode()
                .to_vec();
        let mut stream = message.clone();
        stream.extend_from_slice(&[0x30, 0x00]);

        let mut cursor = Cursor::new(stream);
        assert_eq!(read_tcp_frame(&mut cursor).unwrap(), message);
        assert_eq!(read_tcp_frame(&mut cursor).unwrap(), vec![0x30, 0x00]);
    }

    #[test]
    fn tcp_frame_with_long_form_length() {
        let mut stream = vec![0x30, 0x81, 0x80];
        stream.extend(std::iter::repeat_n(0u8, 0x80));
        let frame = read_tcp_frame(&mut Cursor::new(stream.clone())).unwrap();
        assert_eq!(frame, stream);
    }

    #[test]
    fn truncated_tcp_frame_is_an_error() {
        let err = read_tcp_frame(&mut Cursor::new(vec![0x30, 0x05, 0x02])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
