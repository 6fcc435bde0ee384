//! Addresses a resolver must never hand out unless it was built for testing.
use ipnetwork::{Ipv4Network, Ipv6Network};
use lazy_static::lazy_static;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

lazy_static! {
    static ref PRIVATE_V4_NETWORKS: Vec<Ipv4Network> = [
        "10.0.0.0/8",         // RFC 1918
        "172.16.0.0/12",      // RFC 1918
        "192.168.0.0/16",     // RFC 1918
        "127.0.0.0/8",        // RFC 5735
        "0.0.0.0/8",          // RFC 1122 Section 3.2.1.3
        "169.254.0.0/16",     // RFC 3927
        "192.0.0.0/24",       // RFC 5736
        "192.0.2.0/24",       // RFC 5737
        "198.51.100.0/24",    // RFC 5737
        "203.0.113.0/24",     // RFC 5737
        "192.88.99.0/24",     // RFC 3068
        "198.18.0.0/15",      // RFC 2544
        "224.0.0.0/4",        // RFC 3171
        "240.0.0.0/4",        // RFC 1112
        "255.255.255.255/32", // RFC 919 Section 7
        "100.64.0.0/10",      // RFC 6598
    ]
    .iter()
    .map(|n| Ipv4Network::from_str(n).unwrap())
    .collect();

    static ref PRIVATE_V6_NETWORKS: Vec<Ipv6Network> = [
        "::/127",        // RFC 4291 unspecified and loopback
        "::ffff:0:0/96", // RFC 4291 IPv4-mapped
        "100::/64",      // RFC 6666 discard prefix
        "2001::/23",     // RFC 2928 IETF protocol assignments
        "2001:2::/48",   // RFC 5180 benchmarking
        "2001:db8::/32", // RFC 3849 documentation
        "2001:10::/28",  // RFC 4843 ORCHID
        "fc00::/7",      // RFC 4193 unique local
        "fe80::/10",     // RFC 4291 link local
        "ff00::/8",      // RFC 4291 multicast
        "2002::/16",     // RFC 7526 6to4 anycast
    ]
    .iter()
    .map(|n| Ipv6Network::from_str(n).unwrap())
    .collect();
}

#[must_use]
pub fn is_private_v4(ip: Ipv4Addr) -> bool {
    PRIVATE_V4_NETWORKS.iter().any(|net| net.contains(ip))
}

#[must_use]
pub fn is_private_v6(ip: Ipv6Addr) -> bool {
    PRIVATE_V6_NETWORKS.iter().any(|net| net.contains(ip))
}
