/*!
cruce
=====

This crate provides a cycle-accurate simulator of virtual-channel wormhole routers with
credit-based flow control, connected as a mesh by unidirectional flit and credit links.

# Usage

Build a `ConfigurationValue` tree describing the simulation, create a `Simulation` from it,
queue packets at the interfaces, and run:

```ignore
let configuration = ConfigurationValue::Object("Configuration".to_string(),vec![
	("random_seed".to_string(),ConfigurationValue::Number(42.0)),
	("cycles".to_string(),ConfigurationValue::Number(200.0)),
	("network".to_string(),ConfigurationValue::Object("Mesh".to_string(),vec![
		("num_rows".to_string(),ConfigurationValue::Number(2.0)),
		("num_cols".to_string(),ConfigurationValue::Number(2.0)),
		("virt_nets".to_string(),ConfigurationValue::Number(1.0)),
		("vcs_per_vnet".to_string(),ConfigurationValue::Number(4.0)),
		("buffers_per_data_vc".to_string(),ConfigurationValue::Number(4.0)),
		("routing_algorithm".to_string(),ConfigurationValue::Literal("XY".to_string())),
	])),
]);
let mut simulation = Simulation::new(&configuration);
simulation.inject_packet(0,3,0,3);//origin interface, destination interface, vnet, flits
simulation.run();
let results = simulation.get_simulation_results();
```

The recognized network options are `num_rows`, `num_cols`, `virt_nets`, `vcs_per_vnet`,
`buffers_per_ctrl_vc`, `buffers_per_data_vc`, `routing_algorithm` (one of `TABLE`, `XY`,
`RANDOM`, `TURN_MODEL`, `CUSTOM`), `link_latency`, `interfaces_per_router`,
`ordered_vnets`, `pipeline` (`OneCycle` or `Staged`), and the power-interface values
`frequency`, `bits_per_flit`, and `wire_length`. The last virtual channel of each vnet is
the escape channel of the adaptive routing algorithms.

# Per-cycle operation

Within a cycle: flit and credit arrivals are consumed first, switch allocation runs at the
end, the interfaces stage their injection traffic, and every link moves at most one item
from its source queue. The host discrete-event kernel is expected to call `advance` once
per cycle; `run` does so up to the configured horizon.

*/

pub mod config;
pub mod error;
pub mod event;
pub mod quantify;
pub mod link;
pub mod routing;
pub mod router;
pub mod network;
pub mod interface;
pub mod measures;

use ::rand::{SeedableRng,rngs::StdRng};

use config::ConfigurationValue;
use event::{EventQueue,Time};
use network::{Network,NetworkParameters};
use quantify::Quantifiable;
use routing::NetDest;

///The kinds of flit a packet is serialized into.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum FlitType
{
	Head,
	Body,
	Tail,
	///A single-flit packet.
	HeadTail,
}

///The pipeline stages a flit goes through, paired with a scheduled cycle.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum FlitStage
{
	Injection,
	///Unused by the one-cycle pipeline, where the virtual channel is assigned during
	///switch allocation.
	#[allow(dead_code)]
	VcAllocation,
	SwitchAllocation,
	SwitchTraversal,
	LinkTraversal,
}

///The destination descriptor of a packet. Immutable after creation.
#[derive(Clone,Debug)]
pub struct RouteInfo
{
	///Destination bitmask, for table-based routing.
	pub net_dest: NetDest,
	///Destination for topology-specific routing.
	pub dest_interface: usize,
	pub dest_router: usize,
}

///The minimal unit of flow control.
#[derive(Clone,Debug)]
pub struct Flit
{
	///The packet this flit belongs to.
	pub packet: u64,
	///Position inside the packet.
	pub index: usize,
	pub flit_type: FlitType,
	///The virtual channel the flit travels in; rewritten at each switch allocation.
	pub vc: usize,
	pub route: RouteInfo,
	///The outport of the current router, copied from the virtual channel.
	pub outport: Option<usize>,
	pub stage: FlitStage,
	///The cycle at which the current stage is scheduled.
	pub time: Time,
	///The cycle the packet was created, for delay statistics.
	pub enqueue_time: Time,
}

impl Flit
{
	pub fn advance_stage(&mut self, stage:FlitStage, time:Time)
	{
		self.stage=stage;
		self.time=time;
	}
}

///The acknowledgment returned to the upstream emitter: one buffer slot was freed.
///The free signal additionally reports that the virtual channel went back to idle.
#[derive(Clone,Copy,Debug)]
pub struct Credit
{
	pub vc: usize,
	pub is_free_signal: bool,
	///Departure or delivery cycle, depending on the queue holding it.
	pub time: Time,
}

///The object representing the whole simulation.
pub struct Simulation
{
	///The whole parsed configuration.
	#[allow(dead_code)]
	pub configuration: ConfigurationValue,
	///The seed of the random number generator.
	#[allow(dead_code)]
	pub seed: u64,
	///The random number generator itself, with its current state.
	pub rng: StdRng,
	///The instantiated network, with all its routers, links, and interfaces.
	pub network: Network,
	///The queue of wakeups guiding the simulation.
	pub event_queue: EventQueue,
	///The current cycle, i.e., the current discrete time.
	pub cycle: Time,
	///The configured horizon for `run`.
	pub cycles: Time,
	next_packet: u64,
}

impl Simulation
{
	pub fn new(cv:&ConfigurationValue) -> Simulation
	{
		let mut seed=None;
		let mut cycles=None;
		let mut network_cv=None;
		crate::match_object_panic!(cv,"Configuration",value,
			"random_seed" => seed=Some(value.as_f64().expect("bad value for random_seed") as u64),
			"cycles" => cycles=Some(value.as_time().expect("bad value for cycles")),
			"network" => network_cv=Some(value),
		);
		let seed=seed.expect("There were no random_seed");
		let cycles=cycles.expect("There were no cycles");
		let network_cv=network_cv.expect("There were no network");
		let parameters=NetworkParameters::new(network_cv);
		let wheel_size=(parameters.link_latency as usize+2).max(8);
		let network=Network::new(parameters);
		Simulation{
			configuration: cv.clone(),
			seed,
			rng: StdRng::seed_from_u64(seed),
			network,
			event_queue: EventQueue::new(wheel_size),
			cycle: 0,
			cycles,
			next_packet: 0,
		}
	}

	///Hands a packet of `size` flits to the origin interface, to enter the network as soon
	///as flow control allows. Returns the packet identifier.
	pub fn inject_packet(&mut self, origin_interface:usize, dest_interface:usize, vnet:usize, size:usize) -> u64
	{
		assert!( dest_interface<self.network.parameters.num_interfaces() , "destination outside the network" );
		assert!( vnet<self.network.parameters.virt_nets , "vnet {} does not exist",vnet );
		let id=self.next_packet;
		self.next_packet+=1;
		let dest_router=self.network.parameters.router_of_interface(dest_interface);
		self.network.interfaces[origin_interface].queue_packet(id,dest_interface,dest_router,vnet,size,self.cycle);
		id
	}

	///Execute a single cycle of the simulation.
	pub fn advance(&mut self)
	{
		let mut ievent=0;
		loop
		{
			let consumer=match self.event_queue.access_begin(ievent)
			{
				Some(consumer) => consumer,
				None => break,
			};
			self.network.process_consumer(consumer,self.cycle,&mut self.rng,&mut self.event_queue);
			ievent+=1;
		}
		ievent=0;
		loop
		{
			let consumer=match self.event_queue.access_end(ievent)
			{
				Some(consumer) => consumer,
				None => break,
			};
			self.network.process_consumer(consumer,self.cycle,&mut self.rng,&mut self.event_queue);
			ievent+=1;
		}
		self.network.interface_phase(self.cycle);
		self.network.link_phase(self.cycle,&mut self.event_queue);
		self.event_queue.advance();
		self.cycle+=1;
	}

	///Run the simulation until the configured horizon.
	pub fn run(&mut self)
	{
		while self.cycle<self.cycles
		{
			self.advance();
		}
	}

	///Advance until nothing remains in flight or the cycle limit is hit. Returns whether
	///the network drained.
	pub fn run_until_quiescent(&mut self, limit:Time) -> bool
	{
		while self.cycle<limit
		{
			self.advance();
			if self.network.is_quiescent()
			{
				return true;
			}
		}
		self.network.is_quiescent()
	}

	///Write the result of the simulation as a configuration object.
	pub fn get_simulation_results(&self) -> ConfigurationValue
	{
		let consumed_packets=self.network.total_ejected_packets();
		let total_delay:Time=self.network.interfaces.iter().map(|interface|interface.statistics.total_packet_delay).sum();
		let average_packet_delay=if consumed_packets>0
		{
			total_delay as f64/consumed_packets as f64
		}
		else
		{
			0f64
		};
		let buffer_writes:usize=self.network.routers.iter().map(|router|router.buffer_writes()).sum();
		let buffer_reads:usize=self.network.routers.iter().map(|router|router.buffer_reads()).sum();
		let sw_inport_arbs:usize=self.network.routers.iter().map(|router|router.sw_inport_arbs()).sum();
		let sw_outport_arbs:usize=self.network.routers.iter().map(|router|router.sw_outport_arbs()).sum();
		let crossbar_traversals:usize=self.network.routers.iter().map(|router|router.crossbar_traversals()).sum();
		let link_traversals:usize=self.network.flit_links.iter().map(|link|link.link_traversals()).sum();
		ConfigurationValue::Object(String::from("Result"),vec![
			(String::from("cycle"),ConfigurationValue::Number(self.cycle as f64)),
			(String::from("injected_flits"),ConfigurationValue::Number(self.network.total_injected_flits() as f64)),
			(String::from("ejected_flits"),ConfigurationValue::Number(self.network.total_ejected_flits() as f64)),
			(String::from("injected_packets"),ConfigurationValue::Number(self.network.total_injected_packets() as f64)),
			(String::from("ejected_packets"),ConfigurationValue::Number(consumed_packets as f64)),
			(String::from("average_packet_delay"),ConfigurationValue::Number(average_packet_delay)),
			(String::from("buffer_writes"),ConfigurationValue::Number(buffer_writes as f64)),
			(String::from("buffer_reads"),ConfigurationValue::Number(buffer_reads as f64)),
			(String::from("sw_inport_arbs"),ConfigurationValue::Number(sw_inport_arbs as f64)),
			(String::from("sw_outport_arbs"),ConfigurationValue::Number(sw_outport_arbs as f64)),
			(String::from("crossbar_traversals"),ConfigurationValue::Number(crossbar_traversals as f64)),
			(String::from("link_traversals"),ConfigurationValue::Number(link_traversals as f64)),
		])
	}

	pub fn print_memory_breakdown(&self)
	{
		self.network.print_memory_breakdown();
	}
	///Clears all the collected statistics, e.g. after a warmup period.
	pub fn reset_statistics(&mut self)
	{
		self.network.reset_statistics();
	}
}
