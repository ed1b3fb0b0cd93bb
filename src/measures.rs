/*!

Module encapsulating the statistics of the simulation and the parameter maps handed to the
external power/area estimator.

The values written into a `Result` object by `Simulation::get_simulation_results` are:
* `cycle` is the last simulated cycle.
* `injected_flits` / `ejected_flits` and `injected_packets` / `ejected_packets` count the
traffic that entered and left the network during the sampled period.
* `average_packet_delay` is the average of cycles from packet creation to tail ejection.
* `buffer_writes`, `buffer_reads`, `sw_inport_arbs`, `sw_outport_arbs`, and
`crossbar_traversals` aggregate the router activity counters.
* `link_traversals` aggregates the flit links.

*/

use crate::config::ConfigurationValue;
use crate::error::Error;
use crate::event::Time;
use crate::network::Network;
use crate::source_location;

///Statistics local to a network interface.
#[derive(Clone,Debug,Default)]
pub struct InterfaceStatistics
{
	pub created_flits: usize,
	pub created_packets: usize,
	pub consumed_flits: usize,
	pub consumed_packets: usize,
	///Sum of creation-to-ejection delays of consumed packets.
	pub total_packet_delay: Time,
	pub credits_received: usize,
	pub free_signals_received: usize,
	///`(cycle, packet)` of every consumed packet, in consumption order.
	pub ejection_log: Vec<(Time,u64)>,
}

impl InterfaceStatistics
{
	pub fn new() -> InterfaceStatistics
	{
		InterfaceStatistics::default()
	}
	pub fn reset(&mut self)
	{
		*self=InterfaceStatistics::default();
	}
}

///The entity a parameter map describes.
#[derive(Clone,Copy,Debug)]
pub enum PowerEntity
{
	Router(usize),
	FlitLink(usize),
	CreditLink(usize),
}

///The parameter map the estimator expects for one router.
pub fn router_power_parameters(network:&Network, router_index:usize, cycle:Time) -> Vec<(String,ConfigurationValue)>
{
	let parameters=&network.parameters;
	let router=&network.routers[router_index];
	vec![
		(String::from("Frequency"),ConfigurationValue::Number(parameters.frequency)),
		(String::from("NumberBitsPerFlit"),ConfigurationValue::Number(parameters.bits_per_flit as f64)),
		(String::from("NumberInputPorts"),ConfigurationValue::Number(router.input_units.len() as f64)),
		(String::from("NumberOutputPorts"),ConfigurationValue::Number(router.output_units.len() as f64)),
		(String::from("NumberVirtualNetworks"),ConfigurationValue::Number(parameters.virt_nets as f64)),
		(String::from("NumberVirtualChannelsPerVirtualNetwork"),ConfigurationValue::Number(parameters.vcs_per_vnet as f64)),
		(String::from("NumberBuffersPerVirtualChannel"),ConfigurationValue::Number(parameters.buffers_per_data_vc as f64)),
		(String::from("NumCycles"),ConfigurationValue::Number(cycle as f64)),
		(String::from("NumBufferWrites"),ConfigurationValue::Number(router.buffer_writes() as f64)),
		(String::from("NumBufferReads"),ConfigurationValue::Number(router.buffer_reads() as f64)),
		(String::from("NumSwInportArbs"),ConfigurationValue::Number(router.sw_inport_arbs() as f64)),
		(String::from("NumSwOutportArbs"),ConfigurationValue::Number(router.sw_outport_arbs() as f64)),
		(String::from("NumCrossbarTraversals"),ConfigurationValue::Number(router.crossbar_traversals() as f64)),
	]
}

///The parameter map the estimator expects for one link.
pub fn link_power_parameters(network:&Network, entity:PowerEntity, cycle:Time) -> Vec<(String,ConfigurationValue)>
{
	let parameters=&network.parameters;
	let (latency,traversals)=match entity
	{
		PowerEntity::FlitLink(index) => (network.flit_links[index].latency,network.flit_links[index].link_traversals()),
		PowerEntity::CreditLink(index) => (network.credit_links[index].latency,network.credit_links[index].link_traversals()),
		PowerEntity::Router(_) => panic!("a router is not a link"),
	};
	vec![
		(String::from("Frequency"),ConfigurationValue::Number(parameters.frequency)),
		(String::from("NumberBits"),ConfigurationValue::Number(parameters.bits_per_flit as f64)),
		(String::from("WireLength"),ConfigurationValue::Number(parameters.wire_length)),
		(String::from("Delay"),ConfigurationValue::Number(latency as f64)),
		(String::from("NumCycles"),ConfigurationValue::Number(cycle as f64)),
		(String::from("NumLinkTraversals"),ConfigurationValue::Number(traversals as f64)),
	]
}

///Invokes the host estimator once per router and once per link, after the run. A failure
///of the estimator is reported upward; the network is only read, never modified.
pub fn invoke_power_estimator<F>(network:&Network, cycle:Time, mut estimator:F) -> Result<(),Error>
where F: FnMut(PowerEntity,&[(String,ConfigurationValue)]) -> Result<(),String>
{
	for router_index in 0..network.routers.len()
	{
		let entity=PowerEntity::Router(router_index);
		let parameters=router_power_parameters(network,router_index,cycle);
		estimator(entity,&parameters).map_err(|description|Error::power_estimator_failed(source_location!(),description))?;
	}
	for index in 0..network.flit_links.len()
	{
		let entity=PowerEntity::FlitLink(index);
		let parameters=link_power_parameters(network,entity,cycle);
		estimator(entity,&parameters).map_err(|description|Error::power_estimator_failed(source_location!(),description))?;
	}
	for index in 0..network.credit_links.len()
	{
		let entity=PowerEntity::CreditLink(index);
		let parameters=link_power_parameters(network,entity,cycle);
		estimator(entity,&parameters).map_err(|description|Error::power_estimator_failed(source_location!(),description))?;
	}
	Ok(())
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::config::ConfigurationValue;
	use crate::network::{Network,NetworkParameters};

	fn small_network() -> Network
	{
		let cv=ConfigurationValue::Object("Mesh".to_string(),vec![
			("num_rows".to_string(),ConfigurationValue::Number(1.0)),
			("num_cols".to_string(),ConfigurationValue::Number(2.0)),
			("virt_nets".to_string(),ConfigurationValue::Number(1.0)),
			("vcs_per_vnet".to_string(),ConfigurationValue::Number(2.0)),
			("routing_algorithm".to_string(),ConfigurationValue::Literal("XY".to_string())),
		]);
		Network::new(NetworkParameters::new(&cv))
	}

	#[test]
	fn router_map_carries_every_key()
	{
		let network=small_network();
		let map=router_power_parameters(&network,0,100);
		let keys:Vec<&str>=map.iter().map(|(key,_)|key.as_str()).collect();
		for expected in ["Frequency","NumberBitsPerFlit","NumberInputPorts","NumberOutputPorts",
			"NumberVirtualNetworks","NumberVirtualChannelsPerVirtualNetwork",
			"NumberBuffersPerVirtualChannel","NumCycles","NumBufferWrites","NumBufferReads",
			"NumSwInportArbs","NumSwOutportArbs","NumCrossbarTraversals"].iter()
		{
			assert!( keys.contains(expected) , "missing key {}",expected );
		}
	}
	#[test]
	fn estimator_failures_bubble()
	{
		let network=small_network();
		let result=invoke_power_estimator(&network,100,|entity,_parameters|
		{
			match entity
			{
				PowerEntity::Router(1) => Err("router 1 exploded".to_string()),
				_ => Ok(()),
			}
		});
		assert!( result.is_err() );
		//And a working estimator sees every entity.
		let mut count=0;
		invoke_power_estimator(&network,100,|_entity,_parameters|{count+=1;Ok(())}).unwrap();
		assert_eq!( count , network.routers.len()+network.flit_links.len()+network.credit_links.len() );
	}
}
