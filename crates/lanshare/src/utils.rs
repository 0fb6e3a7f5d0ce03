//! Utility functions for formatting, parsing and address discovery

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

/// Human-readable size: whole bytes below 1 KB, two decimals above
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    // Step down while at least 1024 of the next unit remain
    let mut scaled = bytes;
    let mut unit = 0;
    while scaled >= 1024 * 1024 && unit < UNITS.len() - 1 {
        scaled /= 1024;
        unit += 1;
    }
    format!("{:.2} {}", scaled as f64 / 1024.0, UNITS[unit])
}

/// Split a command line into arguments
///
/// Whitespace separates arguments; double quotes group words so paths with
/// spaces can be passed. Quotes are stripped.
pub fn parse_args(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in text.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        args.push(current);
    }

    args
}

/// Best-effort LAN address of this machine
///
/// Connecting a UDP socket sends nothing; it only makes the OS pick the
/// outbound interface, whose address is then read back.
pub fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

/// URL receivers should open for a listener bound to `addr`
///
/// A wildcard bind is replaced by `lan_ip`, or loopback when unknown.
pub fn share_url(addr: SocketAddr, lan_ip: Option<IpAddr>) -> String {
    let ip = if addr.ip().is_unspecified() {
        lan_ip.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
    } else {
        addr.ip()
    };
    format!("http://{}/", SocketAddr::new(ip, addr.port()))
}
