use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use snmp_session::snmp::{self, SnmpValue, Version};
use snmp_session::{SessionConfig, SnmpClient, Transport, logging};

/// Send one SNMP GET to an agent and print the varbinds it returns.
#[derive(Parser, Debug)]
#[command(name = "client", version)]
struct Args {
    /// Agent host name or IP address
    target: String,

    /// OIDs to fetch (defaults to sysDescr.0)
    oids: Vec<String>,

    #[arg(short, long, default_value_t = 161)]
    port: u16,

    #[arg(short, long, default_value = "public")]
    community: String,

    /// SNMP version: 1 or 2c
    #[arg(short = 'v', long = "snmp-version", default_value = "2c")]
    snmp_version: Version,

    /// Use TCP instead of UDP
    #[arg(long)]
    tcp: bool,

    #[arg(short, long, default_value_t = 2000)]
    timeout_ms: u64,

    #[arg(short, long, default_value_t = 3)]
    retries: u32,
}

fn main() -> Result<()> {
    logging::init_tracing();
    let args = Args::parse();

    let oids = if args.oids.is_empty() {
        vec![snmp::SYS_DESCR.to_vec()]
    } else {
        args.oids
            .iter()
            .map(|text| snmp::parse_oid(text))
            .collect::<Result<Vec<_>, _>>()?
    };

    let transport = if args.tcp { Transport::Tcp } else { Transport::Udp };
    let config = SessionConfig::default()
        .with_target(&args.target)
        .with_port(args.port)
        .with_community(&args.community)
        .with_version(args.snmp_version)
        .with_transport(transport)
        .with_timeout(Duration::from_millis(args.timeout_ms))
        .with_retries(args.retries);

    println!(
        "Sending SNMP GET request to {} for {} OID(s)...",
        config.address(),
        oids.len()
    );

    let mut client = SnmpClient::connect(&config)?;
    let oid_refs: Vec<&[u32]> = oids.iter().map(Vec::as_slice).collect();
    let response = client
        .get(&oid_refs)
        .with_context(|| format!("GET to {} failed", config.address()))?;
    client.close()?;

    if response.error_status != 0 {
        println!(
            "Agent returned error status {} at index {}",
            response.error_status, response.error_index
        );
    }
    for varbind in &response.varbinds {
        println!(
            "{} = {}",
            snmp::format_oid(&varbind.oid),
            format_snmp_value(&varbind.value)
        );
    }

    Ok(())
}

// Function to get a human-readable string representation of SnmpValue
fn format_snmp_value(value: &SnmpValue) -> String {
    match value {
        SnmpValue::Integer(val) => format!("{} (Integer)", val),
        SnmpValue::OctetString(val) => {
            // Try to display as string if it's printable ASCII
            if val.iter().all(|&b| (32..=126).contains(&b)) {
                format!("\"{}\" (OctetString)", String::from_utf8_lossy(val))
            } else {
                format!(
                    "0x{} (OctetString)",
                    val.iter().map(|b| format!("{:02x}", b)).collect::<String>()
                )
            }
        }
        SnmpValue::Null => "NULL".to_string(),
        SnmpValue::ObjectIdentifier(val) => format!("{} (OID)", snmp::format_oid(val)),
        SnmpValue::IpAddress([a, b, c, d]) => format!("{a}.{b}.{c}.{d} (IpAddress)"),
        SnmpValue::Counter32(val) => format!("{} (Counter32)", val),
        SnmpValue::Gauge32(val) => format!("{} (Gauge32)", val),
        SnmpValue::TimeTicks(val) => format!("{} (TimeTicks)", val),
        SnmpValue::Counter64(val) => format!("{} (Counter64)", val),
        SnmpValue::NoSuchObject => "No Such Object".to_string(),
        SnmpValue::NoSuchInstance => "No Such Instance".to_string(),
        SnmpValue::EndOfMibView => "End of MIB View".to_string(),
    }
}
