//! Fuzz target for client address handling.
//!
//! Whitelist entries come from operator configuration and client addresses
//! come from request headers, so both parsers see untrusted text. Neither may
//! panic.
//!
//! # Running
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_client_addr -- -max_total_time=60
//! ```
//!
//! # What This Tests
//!
//! - `CidrRange::parse`: whitelist entry parsing
//! - `peer_host`: host extraction from `ip:port` peer strings
//! - `Whitelist::is_whitelisted`: matching arbitrary header values

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use maintenance_gate::middleware::{CidrRange, Whitelist, peer_host};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    cidr: &'a str,
    client: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    if let Ok(range) = CidrRange::parse(input.cidr) {
        // Display output must parse back to the same range
        let reparsed = CidrRange::parse(&range.to_string());
        assert!(reparsed.is_ok(), "display of {range} did not reparse");
    }

    let _ = peer_host(input.client);

    if let Ok(whitelist) = Whitelist::from_cidrs(&[input.cidr, "10.0.0.0/8"]) {
        let _ = whitelist.is_whitelisted(input.client);
        let _ = whitelist.is_whitelisted(&peer_host(input.client));
    }
});
