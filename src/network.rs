/*!

The instantiated mesh: an arena owning every router, link, credit link, and interface by
index. Components refer to each other through these indices and through the `Consumer`
variants of the event module; there are no owning back-pointers.

Construction wires, for every router, its local ports first and then the West/South/East/
North neighbour ports that exist at its position, each flit link paired with a reverse
credit link. The routing table of a direction port holds the interfaces whose
dimension-ordered route leaves that way, with the usual weights (1 on X links, 2 on Y
links), so that TABLE routing reproduces dimension order and local ejection always resolves
through an L port.

*/

use ::rand::rngs::StdRng;
use itertools::iproduct;

use crate::config::ConfigurationValue;
use crate::event::{Consumer,EventQueue,Time};
use crate::interface::NetworkInterface;
use crate::link::{CreditLink,CreditSource,FlitSource,NetworkLink};
use crate::match_object_panic;
use crate::quantify::Quantifiable;
use crate::router::Router;
use crate::router::VcState;
use crate::routing::{NetDest,PortDirection,RoutingAlgorithm};

///Whether the switch is traversed in the grant cycle or in the next one.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum PipelineVariant
{
	OneCycle,
	Staged,
}

///The static description of the network, validated at startup.
pub struct NetworkParameters
{
	pub num_rows: usize,
	pub num_cols: usize,
	pub virt_nets: usize,
	pub vcs_per_vnet: usize,
	pub buffers_per_ctrl_vc: usize,
	pub buffers_per_data_vc: usize,
	pub routing_algorithm: RoutingAlgorithm,
	pub link_latency: Time,
	pub interfaces_per_router: usize,
	///The vnets that must preserve per-outport FIFO order.
	pub ordered_vnets: Vec<usize>,
	pub pipeline: PipelineVariant,
	//Parameters only reported to the power interface.
	pub frequency: f64,
	pub bits_per_flit: usize,
	pub wire_length: f64,
}

impl NetworkParameters
{
	pub fn new(cv:&ConfigurationValue) -> NetworkParameters
	{
		let mut num_rows=None;
		let mut num_cols=None;
		let mut virt_nets=None;
		let mut vcs_per_vnet=None;
		let mut buffers_per_ctrl_vc=1;
		let mut buffers_per_data_vc=4;
		let mut routing_algorithm=None;
		let mut link_latency=1;
		let mut interfaces_per_router=1;
		let mut ordered_vnets=vec![];
		let mut pipeline=PipelineVariant::OneCycle;
		let mut frequency=1e9;
		let mut bits_per_flit=128;
		let mut wire_length=1.0;
		match_object_panic!(cv,"Mesh",value,
			"num_rows" => num_rows=Some(value.as_usize().expect("bad value for num_rows")),
			"num_cols" => num_cols=Some(value.as_usize().expect("bad value for num_cols")),
			"virt_nets" => virt_nets=Some(value.as_usize().expect("bad value for virt_nets")),
			"vcs_per_vnet" => vcs_per_vnet=Some(value.as_usize().expect("bad value for vcs_per_vnet")),
			"buffers_per_ctrl_vc" => buffers_per_ctrl_vc=value.as_usize().expect("bad value for buffers_per_ctrl_vc"),
			"buffers_per_data_vc" => buffers_per_data_vc=value.as_usize().expect("bad value for buffers_per_data_vc"),
			"routing_algorithm" => routing_algorithm=Some(RoutingAlgorithm::from_literal(value.as_str().expect("bad value for routing_algorithm"))),
			"link_latency" => link_latency=value.as_time().expect("bad value for link_latency"),
			"interfaces_per_router" => interfaces_per_router=value.as_usize().expect("bad value for interfaces_per_router"),
			"ordered_vnets" => ordered_vnets=value.as_array().expect("bad value for ordered_vnets").iter()
				.map(|v|v.as_usize().expect("bad value in ordered_vnets")).collect(),
			"pipeline" => pipeline=match value.as_str().expect("bad value for pipeline")
			{
				"OneCycle" => PipelineVariant::OneCycle,
				"Staged" => PipelineVariant::Staged,
				name => panic!("Unknown pipeline variant {}",name),
			},
			"frequency" => frequency=value.as_f64().expect("bad value for frequency"),
			"bits_per_flit" => bits_per_flit=value.as_usize().expect("bad value for bits_per_flit"),
			"wire_length" => wire_length=value.as_f64().expect("bad value for wire_length"),
		);
		let num_rows=num_rows.expect("There were no num_rows");
		let num_cols=num_cols.expect("There were no num_cols");
		let virt_nets=virt_nets.expect("There were no virt_nets");
		let vcs_per_vnet=vcs_per_vnet.expect("There were no vcs_per_vnet");
		let routing_algorithm=routing_algorithm.expect("There were no routing_algorithm");
		if num_rows==0 || num_cols==0
		{
			panic!("The mesh needs num_rows and num_cols of at least 1");
		}
		if virt_nets==0 || vcs_per_vnet==0
		{
			panic!("The network needs at least one vnet with at least one virtual channel");
		}
		if buffers_per_ctrl_vc==0 || buffers_per_data_vc==0
		{
			panic!("Every virtual channel needs at least one buffer");
		}
		if link_latency==0
		{
			panic!("Links need at least a cycle of latency");
		}
		if interfaces_per_router==0
		{
			panic!("Routers need at least one interface");
		}
		for &vnet in ordered_vnets.iter()
		{
			if vnet>=virt_nets
			{
				panic!("Ordered vnet {} does not exist, there are {} vnets",vnet,virt_nets);
			}
		}
		NetworkParameters{
			num_rows,
			num_cols,
			virt_nets,
			vcs_per_vnet,
			buffers_per_ctrl_vc,
			buffers_per_data_vc,
			routing_algorithm,
			link_latency,
			interfaces_per_router,
			ordered_vnets,
			pipeline,
			frequency,
			bits_per_flit,
			wire_length,
		}
	}
	pub fn num_routers(&self) -> usize
	{
		self.num_rows*self.num_cols
	}
	pub fn num_interfaces(&self) -> usize
	{
		self.num_routers()*self.interfaces_per_router
	}
	pub fn num_vcs(&self) -> usize
	{
		self.virt_nets*self.vcs_per_vnet
	}
	pub fn vnet_of(&self, vc:usize) -> usize
	{
		let vnet=vc/self.vcs_per_vnet;
		assert!(vnet<self.virt_nets);
		vnet
	}
	///The escape channel of a vnet is its last virtual channel.
	pub fn escape_vc(&self, vnet:usize) -> usize
	{
		vnet*self.vcs_per_vnet + self.vcs_per_vnet - 1
	}
	///The last vnet carries data and uses the data depth; the others the control depth.
	pub fn buffers_for_vc(&self, vc:usize) -> usize
	{
		if self.vnet_of(vc)==self.virt_nets-1
		{
			self.buffers_per_data_vc
		}
		else
		{
			self.buffers_per_ctrl_vc
		}
	}
	pub fn is_vnet_ordered(&self, vnet:usize) -> bool
	{
		self.ordered_vnets.contains(&vnet)
	}
	pub fn router_of_interface(&self, interface:usize) -> usize
	{
		interface/self.interfaces_per_router
	}
	///The direction of the first hop of the dimension-ordered route between two routers.
	pub fn xy_first_hop(&self, from:usize, to:usize) -> PortDirection
	{
		assert!(from!=to);
		let my_x=from%self.num_cols;
		let my_y=from/self.num_cols;
		let dest_x=to%self.num_cols;
		let dest_y=to/self.num_cols;
		if dest_x>my_x
		{
			PortDirection::East
		}
		else if dest_x<my_x
		{
			PortDirection::West
		}
		else if dest_y>my_y
		{
			PortDirection::North
		}
		else
		{
			PortDirection::South
		}
	}
	///The neighbour router by the given direction, if the position has one.
	pub fn neighbour_router(&self, router_index:usize, direction:PortDirection) -> Option<usize>
	{
		let x=router_index%self.num_cols;
		let y=router_index/self.num_cols;
		match direction
		{
			PortDirection::West => if x>0 { Some(router_index-1) } else { None },
			PortDirection::East => if x<self.num_cols-1 { Some(router_index+1) } else { None },
			PortDirection::South => if y>0 { Some(router_index-self.num_cols) } else { None },
			PortDirection::North => if y<self.num_rows-1 { Some(router_index+self.num_cols) } else { None },
			_ => None,
		}
	}
}

fn opposite(direction:PortDirection) -> PortDirection
{
	match direction
	{
		PortDirection::West => PortDirection::East,
		PortDirection::East => PortDirection::West,
		PortDirection::North => PortDirection::South,
		PortDirection::South => PortDirection::North,
		other => panic!("{} has no opposite direction",other.name()),
	}
}

pub struct Network
{
	pub parameters: NetworkParameters,
	pub routers: Vec<Router>,
	pub flit_links: Vec<NetworkLink>,
	pub credit_links: Vec<CreditLink>,
	pub interfaces: Vec<NetworkInterface>,
}

impl Network
{
	pub fn new(parameters:NetworkParameters) -> Network
	{
		let num_routers=parameters.num_routers();
		let num_interfaces=parameters.num_interfaces();
		let latency=parameters.link_latency;
		let mut routers:Vec<Router>=(0..num_routers).map(|index|Router::new(index,&parameters)).collect();
		let mut flit_links:Vec<NetworkLink>=vec![];
		let mut credit_links:Vec<CreditLink>=vec![];
		let mut interfaces:Vec<NetworkInterface>=vec![];

		//Local ports first.
		for router_index in 0..num_routers
		{
			for k in 0..parameters.interfaces_per_router
			{
				let ni=router_index*parameters.interfaces_per_router+k;
				//Injection: interface to router, with its credit return.
				let in_link=flit_links.len();
				let inport=routers[router_index].input_units.len();
				flit_links.push(NetworkLink::new(latency,FlitSource::Interface(ni),Consumer::Input{router:router_index,port:inport}));
				let credit_in=credit_links.len();
				credit_links.push(CreditLink::new(latency,CreditSource::RouterInput{router:router_index,inport},Consumer::InjectionCredit{interface:ni}));
				routers[router_index].add_in_port(PortDirection::Local,in_link,credit_in,&parameters);
				//Ejection: router to interface, with its credit return.
				let out_link=flit_links.len();
				let outport=routers[router_index].output_units.len();
				flit_links.push(NetworkLink::new(latency,FlitSource::RouterOutput{router:router_index,outport},Consumer::Ejection{interface:ni}));
				let credit_out=credit_links.len();
				credit_links.push(CreditLink::new(latency,CreditSource::Interface(ni),Consumer::Output{router:router_index,port:outport}));
				let entry=NetDest::of_interface(ni,num_interfaces);
				routers[router_index].add_out_port(PortDirection::Local,out_link,entry,1,credit_out,&parameters);
				interfaces.push(NetworkInterface::new(ni,in_link,out_link,credit_out,credit_in,&parameters));
			}
		}

		//Neighbour ports. Every router contributes its outbound links; the inbound ones
		//appear when the neighbour takes its turn.
		for (y,x) in iproduct!(0..parameters.num_rows,0..parameters.num_cols)
		{
			let router_index=y*parameters.num_cols+x;
			for &direction in [PortDirection::West,PortDirection::South,PortDirection::East,PortDirection::North].iter()
			{
				if let Some(neighbour)=parameters.neighbour_router(router_index,direction)
				{
					let out_link=flit_links.len();
					let outport=routers[router_index].output_units.len();
					let inport=routers[neighbour].input_units.len();
					flit_links.push(NetworkLink::new(latency,FlitSource::RouterOutput{router:router_index,outport},Consumer::Input{router:neighbour,port:inport}));
					let credit=credit_links.len();
					credit_links.push(CreditLink::new(latency,CreditSource::RouterInput{router:neighbour,inport},Consumer::Output{router:router_index,port:outport}));
					let entry=Network::reachable_through(&parameters,router_index,direction);
					let weight=match direction
					{
						PortDirection::East | PortDirection::West => 1,
						_ => 2,
					};
					routers[router_index].add_out_port(direction,out_link,entry,weight,credit,&parameters);
					routers[neighbour].add_in_port(opposite(direction),out_link,credit,&parameters);
				}
			}
		}

		for router in routers.iter_mut()
		{
			router.init(&parameters);
		}
		Network{
			parameters,
			routers,
			flit_links,
			credit_links,
			interfaces,
		}
	}

	///The interfaces whose dimension-ordered route from `router_index` leaves by `direction`.
	fn reachable_through(parameters:&NetworkParameters, router_index:usize, direction:PortDirection) -> NetDest
	{
		let mut entry=NetDest::new(parameters.num_interfaces());
		for dest_router in 0..parameters.num_routers()
		{
			if dest_router==router_index
			{
				continue;
			}
			if parameters.xy_first_hop(router_index,dest_router)==direction
			{
				for k in 0..parameters.interfaces_per_router
				{
					entry.add(dest_router*parameters.interfaces_per_router+k);
				}
			}
		}
		entry
	}

	///Dispatch of an event-queue wakeup to the owning component.
	pub fn process_consumer(&mut self, consumer:Consumer, now:Time, rng:&mut StdRng, queue:&mut EventQueue)
	{
		match consumer
		{
			Consumer::Input{router,port} =>
			{
				let link=self.routers[router].input_units[port].in_link();
				let Network{ref mut routers, ref mut flit_links, ref parameters, ..}=*self;
				routers[router].input_wakeup(port,now,&mut flit_links[link],parameters,rng,queue);
			},
			Consumer::Output{router,port} =>
			{
				let link=self.routers[router].output_units[port].credit_link();
				let Network{ref mut routers, ref mut credit_links, ..}=*self;
				routers[router].output_credit_wakeup(port,now,&mut credit_links[link]);
			},
			Consumer::Allocator{router} =>
			{
				let Network{ref mut routers, ref parameters, ..}=*self;
				routers[router].swalloc_wakeup(now,parameters,queue);
			},
			Consumer::Crossbar{router} =>
			{
				self.routers[router].switch_traversal(now);
			},
			Consumer::Ejection{interface} =>
			{
				let link=self.interfaces[interface].eject_link();
				let Network{ref mut interfaces, ref mut flit_links, ..}=*self;
				interfaces[interface].eject_wakeup(now,&mut flit_links[link]);
			},
			Consumer::InjectionCredit{interface} =>
			{
				let link=self.interfaces[interface].credit_in_link();
				let Network{ref mut interfaces, ref mut credit_links, ..}=*self;
				interfaces[interface].credit_wakeup(now,&mut credit_links[link]);
			},
		}
	}

	///Every interface stages its injection traffic for this cycle.
	pub fn interface_phase(&mut self, now:Time)
	{
		let Network{ref mut interfaces, ref parameters, ..}=*self;
		for interface in interfaces.iter_mut()
		{
			interface.injection_phase(now,parameters);
		}
	}

	///Every link moves at most one item from its source queue onto the wire and schedules
	///the consumer at the delivery cycle.
	pub fn link_phase(&mut self, now:Time, queue:&mut EventQueue)
	{
		let Network{ref mut routers, ref mut interfaces, ref mut flit_links, ref mut credit_links, ..}=*self;
		for link in flit_links.iter_mut()
		{
			let staged=match link.source
			{
				FlitSource::RouterOutput{router,outport} => routers[router].output_units[outport].take_ready_flit(now),
				FlitSource::Interface(interface) => interfaces[interface].take_ready_flit(now),
			};
			if let Some(flit)=staged
			{
				link.transmit(flit,now);
				queue.enqueue_begin(link.consumer,link.latency);
			}
		}
		for link in credit_links.iter_mut()
		{
			let staged=match link.source
			{
				CreditSource::RouterInput{router,inport} => routers[router].input_units[inport].credit_queue.pop_ready(now),
				CreditSource::Interface(interface) => interfaces[interface].credit_queue.pop_ready(now),
			};
			if let Some(credit)=staged
			{
				link.transmit(credit,now);
				queue.enqueue_begin(link.consumer,link.latency);
			}
		}
	}

	///Whether no packet, flit, or credit remains anywhere in the network.
	pub fn is_quiescent(&self) -> bool
	{
		self.interfaces.iter().all(|interface|
			!interface.pending_work() && interface.staged_total()==0 && interface.credit_queue.len()==0)
			&& self.flit_links.iter().all(|link|link.in_flight_total()==0)
			&& self.credit_links.iter().all(|link|link.in_flight_total()==0)
			&& self.routers.iter().all(|router|
				router.input_units.iter().all(|unit|
					unit.credit_queue.len()==0
					&& (0..unit.num_vcs()).all(|vc|unit.virtual_channel(vc).is_empty()))
				&& router.output_units.iter().all(|unit|unit.buffered_total()==0)
				&& !router.crossbar.has_winners())
	}

	///For every emitter and virtual channel, the credits held plus every flit and credit in
	///flight must account for exactly the downstream buffer capacity.
	pub fn check_credit_conservation(&self)
	{
		let num_vcs=self.parameters.num_vcs();
		for link in self.flit_links.iter()
		{
			for vc in 0..num_vcs
			{
				let mut slots;
				let credit_link;
				match link.source
				{
					FlitSource::RouterOutput{router,outport} =>
					{
						let output_unit=&self.routers[router].output_units[outport];
						slots=output_unit.vc_state(vc).credit_count();
						slots+=output_unit.buffered_flits(vc);
						slots+=self.routers[router].crossbar.registered_flits(outport,vc);
						credit_link=&self.credit_links[output_unit.credit_link()];
					},
					FlitSource::Interface(interface) =>
					{
						let ni=&self.interfaces[interface];
						slots=ni.vc_state(vc).credit_count();
						slots+=ni.staged_flits(vc);
						credit_link=&self.credit_links[ni.credit_in_link()];
					},
				}
				slots+=link.in_flight(vc);
				slots+=credit_link.in_flight(vc);
				match link.consumer
				{
					Consumer::Input{router,port} =>
					{
						let input_unit=&self.routers[router].input_units[port];
						slots+=input_unit.virtual_channel(vc).len();
						slots+=input_unit.credit_queue.iter().filter(|credit|credit.vc==vc).count();
					},
					Consumer::Ejection{interface} =>
					{
						slots+=self.interfaces[interface].credit_queue.iter().filter(|credit|credit.vc==vc).count();
					},
					_ => panic!("a flit link must feed an input unit or an interface"),
				}
				assert_eq!( slots , self.parameters.buffers_for_vc(vc),
					"credit conservation broken on link {:?} vc {}",link.source,vc );
			}
		}
	}

	///Structural checks over the virtual-channel states: an idle input VC holds no flits
	///and an idle output VC holds all its credits.
	pub fn check_vc_state_coherence(&self)
	{
		let num_vcs=self.parameters.num_vcs();
		for router in self.routers.iter()
		{
			for unit in router.input_units.iter()
			{
				for vc in 0..num_vcs
				{
					let channel=unit.virtual_channel(vc);
					if channel.state()==VcState::Idle
					{
						assert!( channel.is_empty() , "idle input VC {} with buffered flits at router {}",vc,router.index );
					}
				}
			}
			for unit in router.output_units.iter()
			{
				for vc in 0..num_vcs
				{
					let state=unit.vc_state(vc);
					if state.state()==VcState::Idle
					{
						assert_eq!( state.credit_count() , self.parameters.buffers_for_vc(vc),
							"idle output VC {} missing credits at router {}",vc,router.index );
					}
				}
			}
		}
	}

	//--- network-wide statistic aggregates.

	pub fn total_injected_flits(&self) -> usize
	{
		self.interfaces.iter().map(|interface|interface.statistics.created_flits).sum()
	}
	pub fn total_ejected_flits(&self) -> usize
	{
		self.interfaces.iter().map(|interface|interface.statistics.consumed_flits).sum()
	}
	pub fn total_injected_packets(&self) -> usize
	{
		self.interfaces.iter().map(|interface|interface.statistics.created_packets).sum()
	}
	pub fn total_ejected_packets(&self) -> usize
	{
		self.interfaces.iter().map(|interface|interface.statistics.consumed_packets).sum()
	}
	pub fn reset_statistics(&mut self)
	{
		for router in self.routers.iter_mut()
		{
			router.reset_statistics();
		}
		for link in self.flit_links.iter_mut()
		{
			link.reset_statistics();
		}
		for link in self.credit_links.iter_mut()
		{
			link.reset_statistics();
		}
		for interface in self.interfaces.iter_mut()
		{
			interface.statistics.reset();
		}
	}
}

impl Quantifiable for Network
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<Network>()
			+ self.routers.iter().map(|router|router.total_memory()).sum::<usize>()
			+ self.flit_links.iter().map(|link|link.total_memory()).sum::<usize>()
			+ self.credit_links.iter().map(|link|link.total_memory()).sum::<usize>()
			+ self.interfaces.iter().map(|interface|interface.total_memory()).sum::<usize>()
	}
	fn print_memory_breakdown(&self)
	{
		println!("network: {} bytes in {} routers, {} links, {} interfaces",
			self.total_memory(),self.routers.len(),self.flit_links.len()+self.credit_links.len(),self.interfaces.len());
	}
	fn forecast_total_memory(&self) -> usize
	{
		self.total_memory()
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::config::ConfigurationValue;

	fn mesh_cv(rows:usize, cols:usize) -> ConfigurationValue
	{
		ConfigurationValue::Object("Mesh".to_string(),vec![
			("num_rows".to_string(),ConfigurationValue::Number(rows as f64)),
			("num_cols".to_string(),ConfigurationValue::Number(cols as f64)),
			("virt_nets".to_string(),ConfigurationValue::Number(1.0)),
			("vcs_per_vnet".to_string(),ConfigurationValue::Number(4.0)),
			("routing_algorithm".to_string(),ConfigurationValue::Literal("XY".to_string())),
		])
	}

	#[test]
	fn mesh_wiring()
	{
		let network=Network::new(NetworkParameters::new(&mesh_cv(2,2)));
		assert_eq!( network.routers.len() , 4 );
		assert_eq!( network.interfaces.len() , 4 );
		//Each corner router of a 2x2 mesh has one local port and two neighbours.
		for router in network.routers.iter()
		{
			assert_eq!( router.input_units.len() , 3 );
			assert_eq!( router.output_units.len() , 3 );
		}
		//Flit and credit links are paired one to one.
		assert_eq!( network.flit_links.len() , network.credit_links.len() );
		//4 inject + 4 eject + 8 inter-router.
		assert_eq!( network.flit_links.len() , 16 );
	}
	#[test]
	fn first_hops_follow_dimension_order()
	{
		let params=NetworkParameters::new(&mesh_cv(4,4));
		//From router 5 (x=1,y=1): east to 6, 7; west to 4; north only once aligned.
		assert_eq!( params.xy_first_hop(5,7) , PortDirection::East );
		assert_eq!( params.xy_first_hop(5,4) , PortDirection::West );
		assert_eq!( params.xy_first_hop(5,13) , PortDirection::North );
		assert_eq!( params.xy_first_hop(5,1) , PortDirection::South );
		assert_eq!( params.xy_first_hop(5,15) , PortDirection::East );
	}
	#[test]
	#[should_panic]
	fn empty_vc_configuration_is_fatal()
	{
		let cv=ConfigurationValue::Object("Mesh".to_string(),vec![
			("num_rows".to_string(),ConfigurationValue::Number(2.0)),
			("num_cols".to_string(),ConfigurationValue::Number(2.0)),
			("virt_nets".to_string(),ConfigurationValue::Number(1.0)),
			("vcs_per_vnet".to_string(),ConfigurationValue::Number(0.0)),
			("routing_algorithm".to_string(),ConfigurationValue::Literal("XY".to_string())),
		]);
		NetworkParameters::new(&cv);
	}
}
