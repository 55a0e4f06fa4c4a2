//! Opens a session to one target and closes it again.

use std::io::Write;

use tracing::debug;

use crate::client::SnmpClient;
use crate::config::SessionConfig;
use crate::error::SnmpError;

pub const GREETING: &str = "Hello world";

/// Address the `bootstrap` binary connects to.
pub const DEFAULT_TARGET: &str = "192.168.1.10";

pub fn default_config() -> SessionConfig {
    SessionConfig::default().with_target(DEFAULT_TARGET)
}

/// Writes the greeting to `out`, then connects with `config` and closes the
/// session. The greeting always precedes any network activity.
pub fn run<W: Write>(config: &SessionConfig, out: &mut W) -> Result<(), SnmpError> {
    writeln!(out, "{GREETING}")?;
    out.flush()?;

    debug!(address = %config.address(), transport = %config.transport, "connecting");
    let client = SnmpClient::connect(config)?;
    debug!(peer = %client.peer_addr(), "connected");

    client.close()
}

/// The single diagnostic line reported when [`run`] fails. Only failures to
/// open the session are labelled as connect failures.
pub fn failure_message(err: &SnmpError) -> String {
    match err {
        SnmpError::InvalidConfig(_) | SnmpError::Resolve { .. } | SnmpError::Connect { .. } => {
            format!("connect failed: {err}")
        }
        _ => format!("bootstrap failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn connect_errors_are_labelled_as_such() {
        let err = SnmpError::Connect {
            target: "192.168.1.10:161".to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert!(failure_message(&err).starts_with(
            "connect failed: error establishing connection to host 192.168.1.10:161: "
        ));
    }

    #[test]
    fn greeting_write_errors_are_not_connect_failures() {
        let err = SnmpError::Io(io::Error::from(io::ErrorKind::BrokenPipe));
        let message = failure_message(&err);
        assert!(message.starts_with("bootstrap failed: I/O error: "));
        assert!(!message.contains("connect failed"));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failing_greeting_stops_before_connecting() {
        let err = run(&default_config(), &mut ClosedPipe).unwrap_err();
        assert!(matches!(&err, SnmpError::Io(e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert!(failure_message(&err).starts_with("bootstrap failed:"));
    }
}
