#![allow(dead_code)]

use std::io::Write;
use std::net::{SocketAddr, TcpListener, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use snmp_session::client::read_tcp_frame;
use snmp_session::snmp::{self, SnmpMessage, SnmpValue, Varbind};

pub const SYS_DESCR_TEXT: &str = "Rust SNMP Agent v1.0";

/// Answers every GetRequest with sysDescr-style text values.
pub fn answer_with_text(request: &SnmpMessage) -> Vec<Vec<u8>> {
    let varbinds = request
        .pdu
        .varbinds
        .iter()
        .map(|vb| Varbind {
            oid: vb.oid.clone(),
            value: SnmpValue::OctetString(SYS_DESCR_TEXT.as_bytes().to_vec()),
        })
        .collect();
    vec![request.response(varbinds, 0, 0).encode().to_vec()]
}

/// Spawns a UDP agent on localhost that handles `expected` requests, sending
/// back whatever datagrams `handler` returns, and then yields every request
/// it saw.
pub fn spawn_udp_agent<F>(
    expected: usize,
    mut handler: F,
) -> (SocketAddr, JoinHandle<Vec<SnmpMessage>>)
where
    F: FnMut(&SnmpMessage) -> Vec<Vec<u8>> + Send + 'static,
{
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let addr = socket.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        let mut buf = [0u8; 65535];
        for _ in 0..expected {
            let (len, src) = socket.recv_from(&mut buf).expect("agent recv");
            let request = snmp::decode_snmp_message(&buf[..len]).expect("agent decode");
            for reply in handler(&request) {
                socket.send_to(&reply, src).unwrap();
            }
            seen.push(request);
        }
        seen
    });

    (addr, handle)
}

/// TCP flavour of [`spawn_udp_agent`] serving a single connection.
pub fn spawn_tcp_agent<F>(
    expected: usize,
    mut handler: F,
) -> (SocketAddr, JoinHandle<Vec<SnmpMessage>>)
where
    F: FnMut(&SnmpMessage) -> Vec<Vec<u8>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("agent accept");
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut seen = Vec::new();
        for _ in 0..expected {
            let frame = read_tcp_frame(&mut stream).expect("agent read");
            let request = snmp::decode_snmp_message(&frame).expect("agent decode");
            for reply in handler(&request) {
                stream.write_all(&reply).unwrap();
            }
            seen.push(request);
        }
        seen
    });

    (addr, handle)
}

/// A localhost port with nothing listening on it.
pub fn closed_tcp_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
