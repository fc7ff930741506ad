//! VLAN inventory example: list VLANs and ports, optionally add a VLAN
//!
//! # Usage
//!
//! ```bash
//! cargo run --example vlan_inventory -- --host 192.168.1.10 --user admin --password secret
//! ```
//!
//! Add a VLAN before listing (committed with `write memory`):
//! ```bash
//! cargo run --example vlan_inventory -- --host 192.168.1.10 --user admin --password secret --add-vlan 300 --name servers
//! ```

use std::env;
use std::time::Duration;

use netswitch::{HostKeyVerification, Switch, SwitchBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for mode transitions, trace for raw traffic)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Connecting to {}:{} as {}...", args.host, args.port, args.model);

    let mut switch = SwitchBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .password(&args.password)
        .model(&args.model)
        .timeout(Duration::from_secs(args.timeout))
        .host_key_verification(HostKeyVerification::AcceptNew)
        .lock_timeout(Duration::from_secs(args.timeout))
        .build()?;

    switch.connect().await?;
    println!("Connected!");

    if let Some(number) = args.add_vlan {
        println!("\nAdding VLAN {number}...");
        match switch.add_vlan(number, args.name.as_deref()).await {
            Ok(()) => println!("VLAN {number} added"),
            Err(e) => eprintln!("Could not add VLAN {number} ({:?}): {e}", e.kind()),
        }
    }

    println!("\n{:<6} {:<20} {:<8} IPs", "VLAN", "Name", "VE");
    println!("{}", "-".repeat(60));
    for vlan in switch.get_vlans().await? {
        let ips: Vec<String> = vlan.ips.iter().map(|ip| ip.network.to_string()).collect();
        println!(
            "{:<6} {:<20} {:<8} {}",
            vlan.number,
            vlan.name.as_deref().unwrap_or("-"),
            vlan.vlan_interface_name.as_deref().unwrap_or("-"),
            ips.join(", ")
        );
    }

    println!("\n{:<16} {:<8} {:<8} VLANs", "Interface", "Mode", "State");
    println!("{}", "-".repeat(60));
    for interface in switch.get_interfaces().await? {
        let vlans = match (interface.access_vlan, interface.trunk_native_vlan) {
            (Some(access), _) => access.to_string(),
            (None, native) => {
                let tagged: Vec<String> =
                    interface.trunk_vlans.iter().map(u16::to_string).collect();
                match native {
                    Some(native) => format!("native {native}, tagged {}", tagged.join(",")),
                    None => format!("tagged {}", tagged.join(",")),
                }
            }
        };
        println!(
            "{:<16} {:<8} {:<8} {}",
            interface.name,
            format!("{:?}", interface.port_mode),
            if interface.shutdown { "down" } else { "up" },
            vlans
        );
    }

    switch.disconnect().await?;
    println!("\nDone!");

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: String,
    model: String,
    timeout: u64,
    add_vlan: Option<u16>,
    name: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            host: "localhost".to_string(),
            port: 22,
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: String::new(),
            model: "brocade".to_string(),
            timeout: 30,
            add_vlan: None,
            name: None,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => parsed.host = value.unwrap_or(parsed.host),
                "--port" | "-p" => {
                    parsed.port = value.and_then(|v| v.parse().ok()).unwrap_or(22)
                }
                "--user" | "-u" => parsed.user = value.unwrap_or(parsed.user),
                "--password" | "-P" => parsed.password = value.unwrap_or_default(),
                "--model" | "-m" => parsed.model = value.unwrap_or(parsed.model),
                "--timeout" | "-t" => {
                    parsed.timeout = value.and_then(|v| v.parse().ok()).unwrap_or(30)
                }
                "--add-vlan" => parsed.add_vlan = value.and_then(|v| v.parse().ok()),
                "--name" => parsed.name = value,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        parsed
    }

    fn print_help() {
        println!(
            r#"netswitch vlan_inventory example

USAGE:
    cargo run --example vlan_inventory -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>        Switch address [default: localhost]
    -p, --port <PORT>        SSH port [default: 22]
    -u, --user <USER>        Username [default: $USER]
    -P, --password <PASS>    Password, also used for enable
    -m, --model <MODEL>      Model tag [default: brocade]
    -t, --timeout <SECS>     Command and lock timeout [default: 30]
    --add-vlan <NUMBER>      Create this VLAN before listing
    --name <NAME>            Name for --add-vlan
    --help                   Print this help message
"#
        );
    }
}
