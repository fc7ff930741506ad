//! Parsers for Brocade (FastIron) command output.
//!
//! Lines that match no known pattern are skipped: an attribute the parser
//! cannot read is reported as absent rather than as an error.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use indexmap::IndexMap;
use ipnetwork::Ipv4Network;
use regex::{Captures, Regex};

use crate::model::{Direction, Interface, Vlan, VlanIp, VrrpGroup};

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("invalid static regex")
}

static VLAN_HEADER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^vlan (\d+)(?: name (\S+))?"));
static ROUTER_INTERFACE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^ router-interface ve (\d+)"));
static PORT_MEMBERS: LazyLock<Regex> = LazyLock::new(|| pattern(r"^ (untagged|tagged) (.+)$"));

static VE_HEADER: LazyLock<Regex> = LazyLock::new(|| pattern(r"^interface ve (\d+)"));
static IP_ADDRESS: LazyLock<Regex> = LazyLock::new(|| pattern(r"^ ip address (\S+)"));
static ACCESS_GROUP: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^ ip access-group (\S+) (in|out)"));
static VRF_FORWARDING: LazyLock<Regex> = LazyLock::new(|| pattern(r"^ vrf forwarding (\S+)"));
static VRRP_VRID: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^ ipv?6? vrrp-extended vrid (\d+)"));
static VRRP_IP: LazyLock<Regex> = LazyLock::new(|| pattern(r"^  ip-address (\S+)"));
static VRRP_PRIORITY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^  backup priority (\d+) track-priority (\d+)"));
static VRRP_HELLO: LazyLock<Regex> = LazyLock::new(|| pattern(r"^  hello-interval (\d+)"));
static VRRP_DEAD: LazyLock<Regex> = LazyLock::new(|| pattern(r"^  dead-interval (\d+)"));
static VRRP_TRACK: LazyLock<Regex> = LazyLock::new(|| pattern(r"^  track-port (.+)$"));
static HELPER_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^ ip helper-address (\S+)"));

static SHOW_VLAN_NAME: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"PORT-VLAN \d+, Name ([^,]+),"));
static SHOW_VLAN_VIF: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Associated Virtual Interface Id: (\S+)"));
static SHOW_VLAN_PORTS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?:Untagged|Statically tagged) Ports\s*:\s*(.*)$"));

static INTERFACE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^\w*Ethernet(\S+) is (\w+)"));
static PORT_NAME: LazyLock<Regex> = LazyLock::new(|| pattern(r"Port name is (.*)$"));

static INTERFACE_VLAN: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"VLAN: (\d+)\s+(Untagged|Tagged)"));

/// Reply to `vrf forwarding X` when X is not defined.
pub static UNKNOWN_VRF: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Error - VRF\(.*\) does not exist"));

/// Captures of `re` against `line`, if it matches.
fn captures<'t>(re: &Regex, line: &'t str) -> Option<Captures<'t>> {
    re.captures(line)
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

/// Split output into blocks separated by `!` lines.
pub fn split_on_bang(lines: &[String]) -> Vec<&[String]> {
    lines
        .split(|line| line.trim() == "!")
        .filter(|block| block.iter().any(|line| !line.trim().is_empty()))
        .collect()
}

/// Split output into blocks, each starting at a non-indented line.
pub fn split_on_dedent(lines: &[String]) -> Vec<&[String]> {
    let mut blocks = Vec::new();
    let mut start = None;

    for (index, line) in lines.iter().enumerate() {
        if !line.is_empty() && !line.starts_with(char::is_whitespace) {
            if let Some(begin) = start {
                blocks.push(&lines[begin..index]);
            }
            start = Some(index);
        }
    }
    if let Some(begin) = start {
        blocks.push(&lines[begin..]);
    }
    blocks
}

/// Device-side VLAN names that mean "no name" or the default VLAN.
fn vlan_name(raw: &str) -> Option<String> {
    match raw.trim() {
        "" | "[None]" => None,
        "DEFAULT-VLAN" => Some("default".to_string()),
        name => Some(name.to_string()),
    }
}

/// A VLAN from `show running-config vlan` with its port memberships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanBlock {
    pub vlan: Vlan,
    pub untagged: Vec<String>,
    pub tagged: Vec<String>,
}

/// Parse `show running-config vlan`, keyed by VLAN number in device order.
pub fn parse_vlan_blocks(lines: &[String]) -> IndexMap<u16, VlanBlock> {
    let mut vlans = IndexMap::new();

    for block in split_on_bang(lines) {
        let Some((header, body)) = block.split_first() else {
            continue;
        };
        let Some(caps) = captures(&VLAN_HEADER, header) else {
            continue;
        };
        let Ok(number) = group(&caps, 1).parse::<u16>() else {
            continue;
        };

        let mut vlan = Vlan::new(number);
        vlan.name = caps.get(2).and_then(|m| vlan_name(m.as_str()));

        let mut parsed = VlanBlock {
            vlan,
            untagged: Vec::new(),
            tagged: Vec::new(),
        };

        for line in body {
            if let Some(caps) = captures(&ROUTER_INTERFACE, line) {
                parsed.vlan.vlan_interface_name = Some(group(&caps, 1).to_string());
            } else if let Some(caps) = captures(&PORT_MEMBERS, line) {
                let names = to_real_names(parse_if_ranges(group(&caps, 2)));
                match group(&caps, 1) {
                    "untagged" => parsed.untagged.extend(names),
                    _ => parsed.tagged.extend(names),
                }
            }
        }

        vlans.insert(number, parsed);
    }
    vlans
}

/// Split `show running-config interface` into routed-interface blocks keyed
/// by ve id.
pub fn parse_ve_blocks(lines: &[String]) -> Vec<(String, &[String])> {
    split_on_bang(lines)
        .into_iter()
        .filter_map(|block| {
            let caps = captures(&VE_HEADER, block.first()?)?;
            Some((group(&caps, 1).to_string(), block))
        })
        .collect()
}

/// Apply the body of an `interface ve N` block to `vlan`.
///
/// A VRRP group opens at its `vrid` line and closes at `activate` or at the
/// next interface-level line. IPv4 and IPv6 groups share ids; the block
/// parsed last wins and IPv6 addresses are not kept.
pub fn apply_ve_config(lines: &[String], vlan: &mut Vlan) {
    let mut current: Option<u8> = None;

    for line in lines {
        if current.is_some() && !line.starts_with("  ") {
            current = None;
        }

        if let Some(caps) = captures(&IP_ADDRESS, line) {
            if let Ok(network) = group(&caps, 1).parse::<Ipv4Network>() {
                let ip = if line.trim_end().ends_with("secondary") {
                    VlanIp::secondary(network)
                } else {
                    VlanIp::primary(network)
                };
                vlan.ips.push(ip);
            }
        } else if let Some(caps) = captures(&ACCESS_GROUP, line) {
            if let Some(direction) = Direction::from_keyword(group(&caps, 2)) {
                vlan.access_groups
                    .set(direction, Some(group(&caps, 1).to_string()));
            }
        } else if let Some(caps) = captures(&VRF_FORWARDING, line) {
            vlan.vrf_forwarding = Some(group(&caps, 1).to_string());
        } else if let Some(caps) = captures(&VRRP_VRID, line) {
            current = group(&caps, 1).parse::<u8>().ok();
            if let Some(id) = current {
                vlan.vrrp_group_mut(id);
            }
        } else if let Some(caps) = captures(&HELPER_ADDRESS, line) {
            if let Ok(address) = group(&caps, 1).parse::<Ipv4Addr>() {
                vlan.dhcp_relay_servers.push(address);
            }
        } else if line.starts_with(" no ip redirect") {
            vlan.icmp_redirects = false;
        } else if let Some(id) = current {
            if line.starts_with("  activate") {
                current = None;
            } else {
                apply_vrrp_line(line, vlan.vrrp_group_mut(id));
            }
        }
    }
}

fn apply_vrrp_line(line: &str, group_config: &mut VrrpGroup) {
    if let Some(caps) = captures(&VRRP_IP, line) {
        if let Ok(address) = group(&caps, 1).parse::<Ipv4Addr>() {
            group_config.ips.push(address);
        }
    } else if let Some(caps) = captures(&VRRP_PRIORITY, line) {
        group_config.priority = group(&caps, 1).parse().ok();
        group_config.track_decrement = group(&caps, 2).parse().ok();
    } else if let Some(caps) = captures(&VRRP_HELLO, line) {
        group_config.hello_interval = group(&caps, 1).parse().ok();
    } else if let Some(caps) = captures(&VRRP_DEAD, line) {
        group_config.dead_interval = group(&caps, 1).parse().ok();
    } else if let Some(caps) = captures(&VRRP_TRACK, line) {
        group_config.track_id = Some(group(&caps, 1).trim().to_string());
    }
}

/// Name and routed-interface id from `show vlan N`.
pub fn parse_show_vlan(number: u16, lines: &[String]) -> Vlan {
    let mut vlan = Vlan::new(number);

    for line in lines {
        if let Some(caps) = captures(&SHOW_VLAN_NAME, line) {
            vlan.name = vlan_name(group(&caps, 1));
        } else if let Some(caps) = captures(&SHOW_VLAN_VIF, line) {
            vlan.vlan_interface_name = match group(&caps, 1) {
                "NONE" => None,
                id => Some(id.to_string()),
            };
        }
    }
    vlan
}

/// Member ports listed by `show vlan N`.
pub fn parse_show_vlan_ports(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| captures(&SHOW_VLAN_PORTS, line))
        .map(|caps| group(&caps, 1).trim().to_string())
        .filter(|ports| !ports.is_empty() && ports != "None")
        .flat_map(|ports| to_real_names(parse_if_ranges(&ports)))
        .collect()
}

/// Whether a `show vlan N` reply says the VLAN is not configured.
///
/// An empty reply counts as not configured.
pub fn is_unknown_vlan(lines: &[String]) -> bool {
    lines.iter().all(|line| line.trim().is_empty())
        || lines.first().is_some_and(|line| line.starts_with("Error"))
        || lines.iter().any(|line| line.contains("is not configured"))
}

/// Whether a reply's first line reports an invalid or unknown interface.
pub fn is_invalid_interface(lines: &[String]) -> bool {
    lines
        .first()
        .is_some_and(|line| line.contains("Invalid input") || line.contains("Error"))
}

/// Expand a port list such as `ethe 1/1 to 1/3 ethe 1/5`.
///
/// A range shares everything but the trailing index of its bounds. Pairs of
/// tokens are kept as one name and a lone trailing token is returned as is.
pub fn parse_if_ranges(ports: &str) -> Vec<String> {
    let tokens: Vec<&str> = ports.split_whitespace().collect();
    let mut names = Vec::new();
    let mut index = 0;

    while index < tokens.len() {
        match tokens.get(index..index + 4) {
            Some([kind, low, "to", high]) => {
                names.extend(expand_range(kind, low, high));
                index += 4;
            }
            _ => match tokens.get(index..index + 2) {
                Some([kind, port]) => {
                    names.push(format!("{kind} {port}"));
                    index += 2;
                }
                _ => {
                    names.push(tokens[index].to_string());
                    index += 1;
                }
            },
        }
    }
    names
}

fn expand_range(kind: &str, low: &str, high: &str) -> Vec<String> {
    let (prefix, first) = match low.rsplit_once('/') {
        Some((prefix, first)) => (Some(prefix), first),
        None => (None, low),
    };
    let last = high.rsplit_once('/').map_or(high, |(_, last)| last);

    match (first.parse::<u32>(), last.parse::<u32>()) {
        (Ok(first), Ok(last)) => (first..=last)
            .map(|port| match prefix {
                Some(prefix) => format!("{kind} {prefix}/{port}"),
                None => format!("{kind} {port}"),
            })
            .collect(),
        _ => vec![format!("{kind} {low} to {high}")],
    }
}

/// Replace abbreviated media types with the full interface names.
pub fn to_real_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| match name.strip_prefix("ethe ") {
            Some(port) => format!("ethernet {port}"),
            None => name,
        })
        .collect()
}

/// Parse `show interfaces` into physical interfaces.
pub fn parse_interfaces(lines: &[String]) -> Vec<Interface> {
    split_on_dedent(lines)
        .into_iter()
        .filter_map(parse_interface_block)
        .collect()
}

fn parse_interface_block(block: &[String]) -> Option<Interface> {
    let caps = captures(&INTERFACE_HEADER, block.first()?)?;

    let mut interface = Interface::new(format!("ethernet {}", group(&caps, 1)));
    interface.shutdown = group(&caps, 2) == "disabled";
    interface.description = block
        .iter()
        .find_map(|line| captures(&PORT_NAME, line))
        .map(|caps| group(&caps, 1).trim().to_string());

    Some(interface)
}

/// Attach untagged/tagged memberships from running-config VLAN blocks.
pub fn apply_vlan_memberships(interface: &mut Interface, vlans: &IndexMap<u16, VlanBlock>) {
    let untagged = vlans
        .values()
        .find(|block| block.untagged.contains(&interface.name))
        .map(|block| block.vlan.number);
    let tagged = vlans
        .values()
        .filter(|block| block.tagged.contains(&interface.name))
        .map(|block| block.vlan.number)
        .collect();

    interface.apply_memberships(untagged, tagged);
}

/// How a port belongs to a VLAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tagging {
    Untagged,
    Tagged,
}

impl Tagging {
    pub fn keyword(self) -> &'static str {
        match self {
            Tagging::Untagged => "untagged",
            Tagging::Tagged => "tagged",
        }
    }
}

/// VLAN memberships of one port, from `show vlan <interface>`.
pub fn parse_interface_vlans(lines: &[String]) -> Vec<(u16, Tagging)> {
    lines
        .iter()
        .filter_map(|line| captures(&INTERFACE_VLAN, line))
        .filter_map(|caps| {
            let number = group(&caps, 1).parse().ok()?;
            let tagging = match group(&caps, 2) {
                "Untagged" => Tagging::Untagged,
                _ => Tagging::Tagged,
            };
            Some((number, tagging))
        })
        .collect()
}
