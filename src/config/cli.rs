//! Command-line argument parsing

use clap::Parser;

use crate::core::error::TransportError;

#[derive(Parser, Debug, Clone)]
#[clap(name = "mobile-access-bridge", version, author)]
#[clap(about = "Mobile access SDK bridge over a JSON-RPC Unix socket")]
pub struct CliArgs {
    /// Path for Unix socket (ignored when a socket is passed by the service manager)
    #[clap(long, default_value = "/run/mobile-access-bridge.sock")]
    pub socket_path: String,

    /// Socket file permissions (octal, e.g., 660)
    #[clap(long, default_value = "660", value_parser = parse_socket_mode)]
    pub socket_mode: u32,

    /// Seconds a registration may wait for its second-factor decision
    #[clap(long, default_value_t = 300)]
    pub continuation_ttl_secs: u64,

    /// Events buffered per client before the oldest are dropped
    #[clap(long, default_value_t = 256)]
    pub event_capacity: usize,

    /// Make simulated registrations ask for a second factor
    #[clap(long)]
    pub simulate_second_factor: bool,
}

/// Parse an octal file mode such as `660` or `0o600`
pub fn parse_socket_mode(mode: &str) -> Result<u32, TransportError> {
    let digits = mode.strip_prefix("0o").unwrap_or(mode);
    match u32::from_str_radix(digits, 8) {
        Ok(bits) if bits <= 0o777 => Ok(bits),
        _ => Err(TransportError::InvalidSocketMode(mode.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["mobile-access-bridge"]);
        assert_eq!(args.socket_path, "/run/mobile-access-bridge.sock");
        assert_eq!(args.socket_mode, 0o660);
        assert_eq!(args.continuation_ttl_secs, 300);
        assert!(!args.simulate_second_factor);
    }

    #[test]
    fn test_socket_mode_is_octal() {
        assert_eq!(parse_socket_mode("600").unwrap(), 0o600);
        assert_eq!(parse_socket_mode("0o640").unwrap(), 0o640);
        assert!(matches!(
            parse_socket_mode("999"),
            Err(TransportError::InvalidSocketMode(_))
        ));
        assert!(parse_socket_mode("7777").is_err());
    }

    #[test]
    fn test_invalid_socket_mode_is_rejected() {
        let result =
            CliArgs::try_parse_from(["mobile-access-bridge", "--socket-mode", "rw-rw----"]);
        assert!(result.is_err());
    }
}
