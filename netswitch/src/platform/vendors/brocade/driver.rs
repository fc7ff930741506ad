//! [`Switch`] implementation for the Brocade dialect.

use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use ipnetwork::Ipv4Network;
use log::{debug, info, warn};
use secrecy::ExposeSecret;

use super::parse::{
    self, Tagging, apply_ve_config, apply_vlan_memberships, is_invalid_interface, is_unknown_vlan,
    parse_interface_vlans, parse_interfaces, parse_show_vlan, parse_show_vlan_ports,
    parse_ve_blocks, parse_vlan_blocks,
};
use crate::channel::{Shell, ShellConnector};
use crate::driver::{Capability, Classifier, Matcher, Mode, ModeStack, Switch};
use crate::error::{DriverError, Error, Result, SwitchError};
use crate::model::{
    Direction, Interface, MAX_VLAN, MIN_VLAN, SwitchDescriptor, Vlan, VlanIp, VrrpGroup,
};

const CAPABILITIES: &[Capability] = &[
    Capability::Vlans,
    Capability::Interfaces,
    Capability::VlanRouting,
    Capability::Vrrp,
    Capability::DhcpRelay,
];

/// VLAN every port belongs to untagged until moved elsewhere.
const DEFAULT_VLAN: u16 = 1;

/// Driver for Brocade FastIron-style switches.
///
/// Changes apply as soon as each command is accepted, so rollback does
/// nothing and commit saves the running configuration.
pub struct Brocade {
    descriptor: SwitchDescriptor,
    connector: Arc<dyn ShellConnector>,
    shell: Option<Box<dyn Shell>>,
}

impl Brocade {
    pub fn new(descriptor: SwitchDescriptor, connector: Arc<dyn ShellConnector>) -> Self {
        Self {
            descriptor,
            connector,
            shell: None,
        }
    }

    fn shell(&mut self) -> Result<&mut dyn Shell> {
        match self.shell.as_deref_mut() {
            Some(shell) => Ok(shell),
            None => Err(DriverError::NotConnected.into()),
        }
    }

    /// `show vlan {number}`, or `None` when the VLAN is not configured.
    async fn show_vlan(&mut self, number: u16) -> Result<Option<Vec<String>>> {
        let output = self.shell()?.execute(&format!("show vlan {number}")).await?;
        if output.iter().all(|line| line.trim().is_empty()) {
            debug!(
                "empty reply to 'show vlan {number}' on {}, treating vlan as missing",
                self.descriptor.hostname
            );
        }
        if is_unknown_vlan(&output) {
            return Ok(None);
        }
        Ok(Some(output))
    }

    /// VLAN name and routed-interface id, without the routed-interface state.
    async fn find_vlan(&mut self, number: u16) -> Result<Vlan> {
        match self.show_vlan(number).await? {
            Some(output) => Ok(parse_show_vlan(number, &output)),
            None => Err(SwitchError::UnknownVlan { vlan: number }.into()),
        }
    }

    /// VLAN memberships of a port, failing on unknown ports.
    async fn interface_vlans(&mut self, interface: &str) -> Result<Vec<(u16, Tagging)>> {
        let output = self
            .shell()?
            .execute(&format!("show vlan {interface}"))
            .await?;
        if is_invalid_interface(&output) {
            return Err(unknown_interface_error(interface));
        }
        Ok(parse_interface_vlans(&output))
    }

    /// Run `command` inside `interface {interface}`.
    async fn configure_interface(
        &mut self,
        interface: &str,
        command: &str,
        classifier: Classifier,
    ) -> Result<()> {
        let mut modes = ModeStack::new(self.shell()?);
        let outcome: Result<()> = async {
            modes.enter(configure_terminal()).await?;
            modes.enter(interface_mode(interface)).await?;
            modes.set(command, classifier).await?;
            Ok(())
        }
        .await;
        modes.finish(outcome).await
    }

    /// Run `command` inside `vlan {number}`.
    async fn configure_vlan(
        &mut self,
        number: u16,
        command: &str,
        classifier: Classifier,
    ) -> Result<()> {
        let mut modes = ModeStack::new(self.shell()?);
        let outcome: Result<()> = async {
            modes.enter(configure_terminal()).await?;
            modes.enter(vlan_mode(number)).await?;
            modes.set(command, classifier).await?;
            Ok(())
        }
        .await;
        modes.finish(outcome).await
    }

    /// Run `commands` inside the VLAN's routed interface, creating it first
    /// when the VLAN has none.
    async fn configure_ve(&mut self, vlan: &Vlan, commands: Vec<(String, Classifier)>) -> Result<()> {
        let mut modes = ModeStack::new(self.shell()?);
        let outcome: Result<()> = async {
            modes.enter(configure_terminal()).await?;
            enter_ve(&mut modes, vlan).await?;
            for (command, classifier) in commands {
                modes.set(&command, classifier).await?;
            }
            Ok(())
        }
        .await;
        modes.finish(outcome).await
    }

    /// Remove `interface` from each listed VLAN.
    async fn remove_memberships(
        &mut self,
        interface: &str,
        memberships: &[(u16, Tagging)],
    ) -> Result<()> {
        if memberships.is_empty() {
            return Ok(());
        }

        let mut modes = ModeStack::new(self.shell()?);
        let outcome: Result<()> = async {
            modes.enter(configure_terminal()).await?;
            for (number, tagging) in memberships {
                modes.enter(vlan_mode(*number)).await?;
                let command = format!("no {} {interface}", tagging.keyword());
                modes
                    .set(&command, Classifier::unexpected_output(command.clone()))
                    .await?;
                modes.leave().await?;
            }
            Ok(())
        }
        .await;
        modes.finish(outcome).await
    }

    /// Make `vlan` the untagged VLAN of `interface`, dropping it from any
    /// other untagged VLAN first.
    async fn set_untagged_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        self.find_vlan(vlan).await?;
        let previous: Vec<(u16, Tagging)> = self
            .interface_vlans(interface)
            .await?
            .into_iter()
            .filter(|(number, tagging)| {
                *tagging == Tagging::Untagged && *number != vlan && *number != DEFAULT_VLAN
            })
            .collect();
        self.remove_memberships(interface, &previous).await?;

        self.configure_vlan(
            vlan,
            &format!("untagged {interface}"),
            Classifier::new().expect(Matcher::prefix("Added"), interface_failure(interface)),
        )
        .await
    }

    /// Drop the untagged VLAN of `interface`, failing with `not_set` when
    /// there is none.
    async fn unset_untagged_vlan(&mut self, interface: &str, not_set: Error) -> Result<()> {
        let current = self
            .interface_vlans(interface)
            .await?
            .into_iter()
            .find(|(number, tagging)| *tagging == Tagging::Untagged && *number != DEFAULT_VLAN);

        match current {
            Some(membership) => self.remove_memberships(interface, &[membership]).await,
            None => Err(not_set),
        }
    }
}

#[async_trait]
impl Switch for Brocade {
    fn descriptor(&self) -> &SwitchDescriptor {
        &self.descriptor
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    fn is_connected(&self) -> bool {
        self.shell.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        if self.shell.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let mut shell = self.connector.connect(&self.descriptor).await?;
        if let Err(e) = prepare_shell(&mut *shell, &self.descriptor).await {
            if let Err(exit) = shell.terminate("exit").await {
                warn!(
                    "failed to close shell on {}: {exit}",
                    self.descriptor.hostname
                );
            }
            return Err(e);
        }

        self.shell = Some(shell);
        info!("brocade session open on {}", self.descriptor.hostname);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let Some(mut shell) = self.shell.take() else {
            return Err(DriverError::NotConnected.into());
        };
        shell.terminate("exit").await?;
        info!("brocade session closed on {}", self.descriptor.hostname);
        Ok(())
    }

    async fn start_transaction(&mut self) -> Result<()> {
        Ok(())
    }

    async fn end_transaction(&mut self) -> Result<()> {
        Ok(())
    }

    async fn commit_transaction(&mut self) -> Result<()> {
        self.shell()?.execute("write memory").await?;
        Ok(())
    }

    async fn rollback_transaction(&mut self) -> Result<()> {
        Ok(())
    }

    async fn get_vlans(&mut self) -> Result<Vec<Vlan>> {
        let shell = self.shell()?;
        let config = shell.execute("show running-config vlan").await?;
        let mut vlans: Vec<Vlan> = parse_vlan_blocks(&config)
            .into_values()
            .map(|block| block.vlan)
            .collect();

        let interfaces = shell.execute("show running-config interface").await?;
        for (ve, block) in parse_ve_blocks(&interfaces) {
            if let Some(vlan) = vlans
                .iter_mut()
                .find(|v| v.vlan_interface_name.as_deref() == Some(ve.as_str()))
            {
                apply_ve_config(block, vlan);
            }
        }
        Ok(vlans)
    }

    async fn get_vlan(&mut self, number: u16) -> Result<Vlan> {
        let mut vlan = self.find_vlan(number).await?;

        if let Some(ve) = vlan.vlan_interface_name.clone() {
            let config = self
                .shell()?
                .execute(&format!("show running-config interface ve {ve}"))
                .await?;
            apply_ve_config(&config, &mut vlan);
        }
        Ok(vlan)
    }

    async fn add_vlan(&mut self, number: u16, name: Option<&str>) -> Result<()> {
        if !(MIN_VLAN..=MAX_VLAN).contains(&number) {
            return Err(SwitchError::BadVlanNumber { number }.into());
        }

        if self.show_vlan(number).await?.is_some() {
            return Err(SwitchError::VlanAlreadyExists { vlan: number }.into());
        }

        let command = match name {
            Some(name) => format!("vlan {number} name {name}"),
            None => format!("vlan {number}"),
        };
        let bad_name = name.unwrap_or_default().to_string();
        let validator = Classifier::new()
            .on_result_matching(Matcher::prefix("Error:"), move |_| {
                SwitchError::BadVlanNumber { number }.into()
            })
            .on_any_result(move |_| SwitchError::BadVlanName { name: bad_name }.into());

        let mut modes = ModeStack::new(self.shell()?);
        let outcome: Result<()> = async {
            modes.enter(configure_terminal()).await?;
            modes
                .enter(Mode::new(command).validated_by(validator))
                .await?;
            Ok(())
        }
        .await;
        modes.finish(outcome).await
    }

    async fn remove_vlan(&mut self, number: u16) -> Result<()> {
        let vlan = self.find_vlan(number).await?;

        let mut modes = ModeStack::new(self.shell()?);
        let outcome: Result<()> = async {
            modes.enter(configure_terminal()).await?;
            let command = format!("no vlan {number}");
            modes
                .set(&command, Classifier::unexpected_output(command.clone()))
                .await?;
            if let Some(ve) = &vlan.vlan_interface_name {
                let command = format!("no interface ve {ve}");
                modes
                    .set(&command, Classifier::unexpected_output(command.clone()))
                    .await?;
            }
            Ok(())
        }
        .await;
        modes.finish(outcome).await
    }

    async fn get_vlan_interfaces(&mut self, number: u16) -> Result<Vec<String>> {
        match self.show_vlan(number).await? {
            Some(output) => Ok(parse_show_vlan_ports(&output)),
            None => Err(SwitchError::UnknownVlan { vlan: number }.into()),
        }
    }

    async fn get_interfaces(&mut self) -> Result<Vec<Interface>> {
        let shell = self.shell()?;
        let mut interfaces = parse_interfaces(&shell.execute("show interfaces").await?);
        let vlans = parse_vlan_blocks(&shell.execute("show running-config vlan").await?);

        for interface in &mut interfaces {
            apply_vlan_memberships(interface, &vlans);
        }
        Ok(interfaces)
    }

    async fn get_interface(&mut self, interface: &str) -> Result<Interface> {
        let shell = self.shell()?;
        let output = shell.execute(&format!("show interfaces {interface}")).await?;
        if is_invalid_interface(&output) {
            return Err(unknown_interface_error(interface));
        }
        let Some(mut found) = parse_interfaces(&output).into_iter().next() else {
            return Err(unknown_interface_error(interface));
        };

        let vlans = parse_vlan_blocks(&shell.execute("show running-config vlan").await?);
        apply_vlan_memberships(&mut found, &vlans);
        Ok(found)
    }

    async fn set_access_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        self.set_untagged_vlan(interface, vlan).await
    }

    async fn unset_interface_access_vlan(&mut self, interface: &str) -> Result<()> {
        let not_set = SwitchError::AccessVlanNotSet {
            interface: interface.to_string(),
        };
        self.unset_untagged_vlan(interface, not_set.into()).await
    }

    async fn set_access_mode(&mut self, interface: &str) -> Result<()> {
        let tagged: Vec<(u16, Tagging)> = self
            .interface_vlans(interface)
            .await?
            .into_iter()
            .filter(|(_, tagging)| *tagging == Tagging::Tagged)
            .collect();
        self.remove_memberships(interface, &tagged).await
    }

    async fn set_trunk_mode(&mut self, interface: &str) -> Result<()> {
        // Ports carry tagged and untagged VLANs side by side, only validate
        self.interface_vlans(interface).await?;
        Ok(())
    }

    async fn add_trunk_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        self.find_vlan(vlan).await?;
        self.configure_vlan(
            vlan,
            &format!("tagged {interface}"),
            Classifier::new().expect(Matcher::prefix("Added"), interface_failure(interface)),
        )
        .await
    }

    async fn remove_trunk_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        self.find_vlan(vlan).await?;
        let not_set = interface.to_string();
        self.configure_vlan(
            vlan,
            &format!("no tagged {interface}"),
            Classifier::new()
                .on_result_matching(Matcher::prefix("Invalid input"), interface_failure(interface))
                .on_any_result(move |_| {
                    SwitchError::TrunkVlanNotSet { interface: not_set }.into()
                }),
        )
        .await
    }

    async fn set_interface_native_vlan(&mut self, interface: &str, vlan: u16) -> Result<()> {
        self.set_untagged_vlan(interface, vlan).await
    }

    async fn unset_interface_native_vlan(&mut self, interface: &str) -> Result<()> {
        let not_set = SwitchError::NativeVlanNotSet {
            interface: interface.to_string(),
        };
        self.unset_untagged_vlan(interface, not_set.into()).await
    }

    async fn set_interface_description(&mut self, interface: &str, description: &str) -> Result<()> {
        let bad = description.to_string();
        self.configure_interface(
            interface,
            &format!("port-name {description}"),
            Classifier::new().on_any_result(move |_| {
                SwitchError::BadInterfaceDescription { description: bad }.into()
            }),
        )
        .await
    }

    async fn unset_interface_description(&mut self, interface: &str) -> Result<()> {
        self.configure_interface(
            interface,
            "no port-name",
            Classifier::unexpected_output("no port-name"),
        )
        .await
    }

    async fn set_interface_state(&mut self, interface: &str, shutdown: bool) -> Result<()> {
        let command = if shutdown { "disable" } else { "enable" };
        self.configure_interface(interface, command, Classifier::unexpected_output(command))
            .await
    }

    async fn reset_interface(&mut self, interface: &str) -> Result<()> {
        let memberships: Vec<(u16, Tagging)> = self
            .interface_vlans(interface)
            .await?
            .into_iter()
            .filter(|(number, _)| *number != DEFAULT_VLAN)
            .collect();

        let mut modes = ModeStack::new(self.shell()?);
        let outcome: Result<()> = async {
            modes.enter(configure_terminal()).await?;
            for (number, tagging) in &memberships {
                modes.enter(vlan_mode(*number)).await?;
                modes
                    .execute(&format!("no {} {interface}", tagging.keyword()))
                    .await?;
                modes.leave().await?;
            }
            modes.execute(&format!("no interface {interface}")).await?;
            Ok(())
        }
        .await;
        modes.finish(outcome).await
    }

    async fn add_ip_to_vlan(&mut self, vlan: u16, network: Ipv4Network) -> Result<()> {
        let target = self.get_vlan(vlan).await?;
        if target.ips.iter().any(|ip| ip.network.ip() == network.ip()) {
            return Err(SwitchError::IpAlreadySet { ip: network }.into());
        }

        let secondary = target.ips.iter().any(|ip| ip.contains(network.ip()));
        let command = if secondary {
            format!("ip address {network} secondary")
        } else {
            format!("ip address {network}")
        };
        let rejected = ip_not_available(network.to_string());

        self.configure_ve(&target, vec![(command, Classifier::new().on_any_result(rejected))])
            .await
    }

    async fn remove_ip_from_vlan(&mut self, vlan: u16, network: Ipv4Network) -> Result<()> {
        let target = self.get_vlan(vlan).await?;
        let Some(existing) = target
            .ips
            .iter()
            .find(|ip| ip.network == network)
            .copied()
        else {
            return Err(SwitchError::UnknownIp { ip: network }.into());
        };

        // Secondaries cannot outlive their primary: drop them, then promote
        // the first one and re-add the others.
        let on_hold: Vec<VlanIp> = if existing.is_secondary {
            Vec::new()
        } else {
            target
                .ips
                .iter()
                .filter(|ip| ip.is_secondary && existing.contains(ip.network.ip()))
                .copied()
                .collect()
        };

        let mut commands: Vec<String> = on_hold
            .iter()
            .map(|ip| format!("no ip address {}", ip.network))
            .collect();
        commands.push(format!("no ip address {}", existing.network));
        for (index, ip) in on_hold.iter().enumerate() {
            if index == 0 {
                commands.push(format!("ip address {}", ip.network));
            } else {
                commands.push(format!("ip address {} secondary", ip.network));
            }
        }

        let steps = commands
            .into_iter()
            .map(|command| {
                let classifier = Classifier::unexpected_output(command.clone());
                (command, classifier)
            })
            .collect();
        self.configure_ve(&target, steps).await
    }

    async fn set_vlan_access_group(
        &mut self,
        vlan: u16,
        direction: Direction,
        name: &str,
    ) -> Result<()> {
        let target = self.get_vlan(vlan).await?;
        let keyword = direction.keyword();

        let mut steps = Vec::new();
        if let Some(current) = target.access_groups.get(direction) {
            let command = format!("no ip access-group {current} {keyword}");
            steps.push((command.clone(), Classifier::unexpected_output(command)));
        }

        let invalid = name.to_string();
        steps.push((
            format!("ip access-group {name} {keyword}"),
            Classifier::new()
                .accept(Matcher::prefix("Warning:"))
                .on_any_result(move |_| {
                    SwitchError::InvalidAccessGroupName { name: invalid }.into()
                }),
        ));

        self.configure_ve(&target, steps).await
    }

    async fn unset_vlan_access_group(&mut self, vlan: u16, direction: Direction) -> Result<()> {
        let target = self.get_vlan(vlan).await?;
        let Some(current) = target.access_groups.get(direction) else {
            return Err(SwitchError::UnknownAccessGroup { direction }.into());
        };

        let command = format!("no ip access-group {current} {}", direction.keyword());
        let classifier = Classifier::new()
            .on_result_matching(Matcher::prefix("Error"), move |_| {
                SwitchError::UnknownAccessGroup { direction }.into()
            })
            .on_any_result({
                let command = command.clone();
                move |lines| {
                    DriverError::CommandFailed {
                        command,
                        output: lines.join("\n"),
                    }
                    .into()
                }
            });

        self.configure_ve(&target, vec![(command, classifier)]).await
    }

    async fn set_vlan_vrf(&mut self, vlan: u16, vrf: &str) -> Result<()> {
        let target = self.get_vlan(vlan).await?;

        let command = format!("vrf forwarding {vrf}");
        let unknown = vrf.to_string();
        let invalid = vrf.to_string();
        let classifier = Classifier::new()
            .on_result_matching(Matcher::regex(&parse::UNKNOWN_VRF), move |_| {
                SwitchError::UnknownVrf { name: unknown }.into()
            })
            .accept(Matcher::prefix("Warning:"))
            .on_any_result(move |_| SwitchError::InvalidVrfName { name: invalid }.into());

        self.configure_ve(&target, vec![(command, classifier)]).await
    }

    async fn unset_vlan_vrf(&mut self, vlan: u16) -> Result<()> {
        let target = self.get_vlan(vlan).await?;
        let Some(vrf) = target.vrf_forwarding.clone() else {
            return Err(SwitchError::VlanVrfNotSet { vlan }.into());
        };

        let command = format!("no vrf forwarding {vrf}");
        let classifier = Classifier::new()
            .accept(Matcher::prefix("Warning:"))
            .on_any_result({
                let command = command.clone();
                move |lines| {
                    DriverError::CommandFailed {
                        command,
                        output: lines.join("\n"),
                    }
                    .into()
                }
            });
        self.configure_ve(&target, vec![(command, classifier)]).await
    }

    async fn set_vlan_icmp_redirects_state(&mut self, vlan: u16, enabled: bool) -> Result<()> {
        let target = self.get_vlan(vlan).await?;
        let command = if enabled { "ip redirect" } else { "no ip redirect" };
        self.configure_ve(
            &target,
            vec![(command.to_string(), Classifier::unexpected_output(command))],
        )
        .await
    }

    async fn add_vrrp_group(&mut self, vlan: u16, group: &VrrpGroup) -> Result<()> {
        let target = self.get_vlan(vlan).await?;
        if target.vrrp_group(group.id).is_some() {
            return Err(SwitchError::VrrpAlreadyExists {
                vlan,
                group: group.id,
            }
            .into());
        }
        let first_group = target.vrrp_groups.is_empty();

        let mut modes = ModeStack::new(self.shell()?);
        let outcome: Result<()> = async {
            modes.enter(configure_terminal()).await?;
            enter_ve(&mut modes, &target).await?;

            if first_group {
                let command = "ip vrrp-extended auth-type simple-text-auth ********";
                modes
                    .set(
                        command,
                        Classifier::new()
                            .on_result_matching(
                                Matcher::contains("IP Address not configured"),
                                move |_| SwitchError::NoIpOnVlanForVrrp { vlan }.into(),
                            )
                            .on_any_result(move |lines| {
                                DriverError::CommandFailed {
                                    command: command.to_string(),
                                    output: lines.join("\n"),
                                }
                                .into()
                            }),
                    )
                    .await?;
            }

            modes
                .enter(
                    Mode::new(format!("ip vrrp-extended vrid {}", group.id)).validated_by(
                        Classifier::new().on_any_result(|_| {
                            SwitchError::BadVrrpGroupNumber { min: 1, max: 255 }.into()
                        }),
                    ),
                )
                .await?;

            modes
                .set(
                    &backup_command(group),
                    Classifier::new().on_any_result(|_| {
                        SwitchError::BadVrrpPriorityNumber { min: 1, max: 255 }.into()
                    }),
                )
                .await?;

            for ip in &group.ips {
                modes
                    .set(
                        &format!("ip-address {ip}"),
                        Classifier::new().on_any_result(ip_not_available(ip.to_string())),
                    )
                    .await?;
            }

            if let Some(hello) = group.hello_interval {
                modes
                    .set(&format!("hello-interval {hello}"), bad_timers())
                    .await?;
            }
            if let Some(dead) = group.dead_interval {
                modes
                    .set(&format!("dead-interval {dead}"), bad_timers())
                    .await?;
            }

            modes.execute("advertise backup").await?;

            if let Some(track) = &group.track_id {
                modes
                    .set(
                        &format!("track-port {track}"),
                        Classifier::new()
                            .on_any_result(|_| SwitchError::BadVrrpTracking.into()),
                    )
                    .await?;
            }

            modes.leave_with("activate").await?;
            Ok(())
        }
        .await;
        modes.finish(outcome).await
    }

    async fn remove_vrrp_group(&mut self, vlan: u16, group_id: u8) -> Result<()> {
        let target = self.get_vlan(vlan).await?;
        let missing = SwitchError::UnknownVrrpGroup {
            vlan,
            group: group_id,
        };
        if target.vrrp_group(group_id).is_none() {
            return Err(missing.into());
        }

        let mut steps = vec![(
            format!("no ip vrrp-extended vrid {group_id}"),
            Classifier::new().on_any_result(move |_| missing.into()),
        )];
        if target.vrrp_groups.len() == 1 {
            let command = "ip vrrp-extended auth-type no-auth";
            steps.push((command.to_string(), Classifier::unexpected_output(command)));
        }

        self.configure_ve(&target, steps).await
    }

    async fn add_dhcp_relay_server(&mut self, vlan: u16, address: Ipv4Addr) -> Result<()> {
        let target = self.get_vlan(vlan).await?;
        if target.dhcp_relay_servers.contains(&address) {
            return Err(SwitchError::DhcpRelayServerAlreadyExists { vlan, address }.into());
        }

        let command = format!("ip helper-address {address}");
        let classifier = Classifier::unexpected_output(command.clone());
        self.configure_ve(&target, vec![(command, classifier)]).await
    }

    async fn remove_dhcp_relay_server(&mut self, vlan: u16, address: Ipv4Addr) -> Result<()> {
        let target = self.get_vlan(vlan).await?;
        if !target.dhcp_relay_servers.contains(&address) {
            return Err(SwitchError::UnknownDhcpRelayServer { vlan, address }.into());
        }

        let command = format!("no ip helper-address {address}");
        let classifier = Classifier::unexpected_output(command.clone());
        self.configure_ve(&target, vec![(command, classifier)]).await
    }
}

/// Leave user mode when the login prompt asks for it and turn paging off.
async fn prepare_shell(shell: &mut dyn Shell, descriptor: &SwitchDescriptor) -> Result<()> {
    if shell.current_prompt().trim_end().ends_with('>') {
        debug!("escalating to privileged mode on {}", descriptor.hostname);
        shell.execute_until("enable", "[Pp]assword:").await?;
        let reply = shell
            .send_secret(descriptor.password.expose_secret())
            .await?;
        if shell.current_prompt().trim_end().ends_with('>') {
            return Err(DriverError::CommandFailed {
                command: "enable".to_string(),
                output: reply.join("\n"),
            }
            .into());
        }
    }
    shell.execute("skip-page-display").await?;
    Ok(())
}

fn configure_terminal() -> Mode {
    Mode::new("configure terminal")
}

fn vlan_mode(number: u16) -> Mode {
    Mode::new(format!("vlan {number}"))
}

/// `interface {name}`; the device only answers when the port is unknown.
fn interface_mode(interface: &str) -> Mode {
    Mode::new(format!("interface {interface}"))
        .validated_by(Classifier::new().on_any_result(interface_failure(interface)))
}

/// Enter the VLAN's routed interface, attaching one first if needed.
async fn enter_ve(modes: &mut ModeStack<'_>, vlan: &Vlan) -> Result<()> {
    let ve = match &vlan.vlan_interface_name {
        Some(ve) => ve.clone(),
        None => {
            let ve = vlan.number.to_string();
            debug!("vlan {} has no routed interface, creating ve {ve}", vlan.number);
            modes.enter(vlan_mode(vlan.number)).await?;
            let command = format!("router-interface ve {ve}");
            modes
                .set(&command, Classifier::unexpected_output(command.clone()))
                .await?;
            modes.leave().await?;
            ve
        }
    };
    modes.enter(Mode::new(format!("interface ve {ve}"))).await
}

fn backup_command(group: &VrrpGroup) -> String {
    let mut command = "backup".to_string();
    if let Some(priority) = group.priority {
        command.push_str(&format!(" priority {priority}"));
    }
    if let Some(decrement) = group.track_decrement {
        command.push_str(&format!(" track-priority {decrement}"));
    }
    command
}

fn bad_timers() -> Classifier {
    Classifier::new().on_any_result(|_| SwitchError::BadVrrpTimers.into())
}

fn unknown_interface_error(interface: &str) -> Error {
    SwitchError::UnknownInterface {
        interface: interface.to_string(),
    }
    .into()
}

fn interface_failure(interface: &str) -> impl FnOnce(&[String]) -> Error + Send + 'static {
    let interface = interface.to_string();
    move |_: &[String]| SwitchError::UnknownInterface { interface }.into()
}

fn ip_not_available(ip: String) -> impl FnOnce(&[String]) -> Error + Send + 'static {
    move |lines: &[String]| {
        SwitchError::IpNotAvailable {
            ip,
            reason: lines.join("; "),
        }
        .into()
    }
}
