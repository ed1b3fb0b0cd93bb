/*!

Outport computation. A `RoutingUnit` belongs to a single router and knows the routing table,
the link weights, and the maps between symbolic port directions and physical port indices.

The available algorithms are TABLE (weighted table lookup), XY (dimension order), RANDOM
(uniform among the minimal quadrant directions) and TURN_MODEL (west-first). CUSTOM is kept
as a configuration value and falls back to the table until an algorithm is plugged in.

When the configured algorithm is one of the adaptive pair (RANDOM, TURN_MODEL) the last
virtual channel of each vnet acts as escape channel: traffic on it is restricted to the
west-first turn set, everything else routes fully adaptively. Packets for the local router
always eject through the table, which is the only mechanism distinguishing several
L-direction ports.

*/

use std::collections::BTreeMap;

use ::rand::{Rng,rngs::StdRng};

use crate::event::Time;
use crate::network::NetworkParameters;
use crate::quantify::Quantifiable;
use crate::RouteInfo;

///Weight greater than any entry of a weight table.
const INFINITE: i32 = 10000;

///The symbolic direction of a router port in the mesh.
#[derive(Clone,Copy,Debug,PartialEq,Eq,PartialOrd,Ord)]
pub enum PortDirection
{
	Local,
	West,
	South,
	East,
	North,
	Unknown,
}

impl PortDirection
{
	pub fn name(self) -> &'static str
	{
		match self
		{
			PortDirection::Local => "Local",
			PortDirection::West => "West",
			PortDirection::South => "South",
			PortDirection::East => "East",
			PortDirection::North => "North",
			PortDirection::Unknown => "Unknown",
		}
	}
}

///The routing policy of the network.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum RoutingAlgorithm
{
	Table,
	Xy,
	Random,
	TurnModel,
	Custom,
}

impl RoutingAlgorithm
{
	pub fn from_literal(name:&str) -> RoutingAlgorithm
	{
		match name
		{
			"TABLE" => RoutingAlgorithm::Table,
			"XY" => RoutingAlgorithm::Xy,
			"RANDOM" => RoutingAlgorithm::Random,
			"TURN_MODEL" => RoutingAlgorithm::TurnModel,
			"CUSTOM" => RoutingAlgorithm::Custom,
			_ => panic!("Unknown routing algorithm {}",name),
		}
	}
}

///A set of destination interfaces, kept as a bitmask.
///Routing tables intersect these against the destination of a packet.
#[derive(Clone,Debug,Default)]
pub struct NetDest
{
	bits: Vec<u64>,
}

impl NetDest
{
	pub fn new(size:usize) -> NetDest
	{
		NetDest{
			bits: vec![0; (size+63)/64 ],
		}
	}
	pub fn add(&mut self, interface:usize)
	{
		self.bits[interface/64] |= 1u64<<(interface%64);
	}
	pub fn contains(&self, interface:usize) -> bool
	{
		match self.bits.get(interface/64)
		{
			Some(word) => word & (1u64<<(interface%64)) != 0,
			None => false,
		}
	}
	pub fn intersection_is_not_empty(&self, other:&NetDest) -> bool
	{
		self.bits.iter().zip(other.bits.iter()).any(|(a,b)| a&b != 0 )
	}
	pub fn is_empty(&self) -> bool
	{
		self.bits.iter().all(|&word|word==0)
	}
	///The NetDest holding exactly the given interface.
	pub fn of_interface(interface:usize, size:usize) -> NetDest
	{
		let mut r=NetDest::new(size);
		r.add(interface);
		r
	}
}

impl Quantifiable for NetDest
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<NetDest>() + self.bits.total_memory()
	}
	fn print_memory_breakdown(&self)
	{
		unimplemented!();
	}
	fn forecast_total_memory(&self) -> usize
	{
		self.total_memory()
	}
}

///The routing state of one router.
pub struct RoutingUnit
{
	router_index: usize,
	///`routing_table[outport]` is the set of interfaces reachable through that outport.
	routing_table: Vec<NetDest>,
	///`weight_table[outport]`, lower is preferred on table lookups.
	weight_table: Vec<i32>,
	inports_dirn2idx: BTreeMap<PortDirection,usize>,
	inports_idx2dirn: BTreeMap<usize,PortDirection>,
	outports_dirn2idx: BTreeMap<PortDirection,usize>,
	outports_idx2dirn: BTreeMap<usize,PortDirection>,
}

impl RoutingUnit
{
	pub fn new(router_index:usize) -> RoutingUnit
	{
		RoutingUnit{
			router_index,
			routing_table: vec![],
			weight_table: vec![],
			inports_dirn2idx: BTreeMap::new(),
			inports_idx2dirn: BTreeMap::new(),
			outports_dirn2idx: BTreeMap::new(),
			outports_idx2dirn: BTreeMap::new(),
		}
	}
	pub fn add_route(&mut self, routing_table_entry:NetDest)
	{
		self.routing_table.push(routing_table_entry);
	}
	pub fn add_weight(&mut self, link_weight:i32)
	{
		self.weight_table.push(link_weight);
	}
	pub fn add_in_direction(&mut self, inport_dirn:PortDirection, inport_idx:usize)
	{
		self.inports_dirn2idx.insert(inport_dirn,inport_idx);
		self.inports_idx2dirn.insert(inport_idx,inport_dirn);
	}
	pub fn add_out_direction(&mut self, outport_dirn:PortDirection, outport_idx:usize)
	{
		self.outports_dirn2idx.insert(outport_dirn,outport_idx);
		self.outports_idx2dirn.insert(outport_idx,outport_dirn);
	}
	pub fn inport_direction(&self, inport:usize) -> PortDirection
	{
		*self.inports_idx2dirn.get(&inport).unwrap_or(&PortDirection::Unknown)
	}
	pub fn outport_direction(&self, outport:usize) -> PortDirection
	{
		*self.outports_idx2dirn.get(&outport).unwrap_or(&PortDirection::Unknown)
	}
	fn outport_of_direction(&self, dirn:PortDirection, now:Time) -> usize
	{
		match self.outports_dirn2idx.get(&dirn)
		{
			Some(&idx) => idx,
			None => panic!("Router {} has no {} outport, cycle {}",self.router_index,dirn.name(),now),
		}
	}

	///The table lookup: among the outports whose entry intersects the destination, the one
	///with the lowest weight; ties to the lowest index. A miss is fatal.
	pub fn lookup_routing_table(&self, msg_destination:&NetDest, now:Time) -> usize
	{
		let mut output_link = None;
		let mut min_weight = INFINITE;
		for link in 0..self.routing_table.len()
		{
			if msg_destination.intersection_is_not_empty(&self.routing_table[link])
			{
				if self.weight_table[link] >= min_weight
				{
					continue;
				}
				output_link = Some(link);
				min_weight = self.weight_table[link];
			}
		}
		match output_link
		{
			Some(link) => link,
			None => panic!("No route exists from router {} towards {:?}, cycle {}",self.router_index,msg_destination,now),
		}
	}

	///Computes the outport for a packet head. `escape_vc` is the index of the escape
	///channel of the vnet the packet travels in.
	pub fn outport_compute(&self, route:&RouteInfo, inport:usize, inport_dirn:PortDirection, invc:usize, escape_vc:usize, now:Time, params:&NetworkParameters, rng:&mut StdRng) -> usize
	{
		if route.dest_router == self.router_index
		{
			//Multiple interfaces may be connected to this router, all with direction Local.
			//Get the exact outport from the table.
			return self.lookup_routing_table(&route.net_dest,now);
		}
		let algorithm = match params.routing_algorithm
		{
			//The escape discipline of the adaptive algorithms: the last virtual channel of
			//each vnet is restricted to the west-first turn set.
			RoutingAlgorithm::Random | RoutingAlgorithm::TurnModel =>
			{
				if invc >= escape_vc
				{
					RoutingAlgorithm::TurnModel
				}
				else
				{
					RoutingAlgorithm::Random
				}
			},
			configured => configured,
		};
		let outport = match algorithm
		{
			RoutingAlgorithm::Table => self.lookup_routing_table(&route.net_dest,now),
			RoutingAlgorithm::Xy => self.outport_compute_xy(route,inport,inport_dirn,now,params),
			RoutingAlgorithm::Random => self.outport_compute_random(route,inport,inport_dirn,now,params,rng),
			RoutingAlgorithm::TurnModel => self.outport_compute_turn_model(route,inport,inport_dirn,now,params,rng),
			RoutingAlgorithm::Custom => self.lookup_routing_table(&route.net_dest,now),
		};
		outport
	}

	///Dimension-ordered routing, X before Y.
	fn outport_compute_xy(&self, route:&RouteInfo, inport:usize, inport_dirn:PortDirection, now:Time, params:&NetworkParameters) -> usize
	{
		let num_cols=params.num_cols;
		assert!(params.num_rows>0 && num_cols>0);

		let my_x=(self.router_index%num_cols) as i32;
		let my_y=(self.router_index/num_cols) as i32;
		let dest_x=(route.dest_router%num_cols) as i32;
		let dest_y=(route.dest_router/num_cols) as i32;

		let x_hops=(dest_x-my_x).abs();
		let y_hops=(dest_y-my_y).abs();
		let x_dirn=dest_x>=my_x;
		let y_dirn=dest_y>=my_y;

		//already checked in outport_compute
		assert!( !(x_hops==0 && y_hops==0) );

		let outport_dirn = if x_hops>0
		{
			if x_dirn
			{
				if !(inport_dirn==PortDirection::Local || inport_dirn==PortDirection::West)
				{
					panic!("Illegal {} inport {} for an East hop at router {}, cycle {}",inport_dirn.name(),inport,self.router_index,now);
				}
				PortDirection::East
			}
			else
			{
				if !(inport_dirn==PortDirection::Local || inport_dirn==PortDirection::East)
				{
					panic!("Illegal {} inport {} for a West hop at router {}, cycle {}",inport_dirn.name(),inport,self.router_index,now);
				}
				PortDirection::West
			}
		}
		else
		{
			if y_dirn
			{
				if inport_dirn==PortDirection::North
				{
					panic!("Illegal North inport {} for a North hop at router {}, cycle {}",inport,self.router_index,now);
				}
				PortDirection::North
			}
			else
			{
				if inport_dirn==PortDirection::South
				{
					panic!("Illegal South inport {} for a South hop at router {}, cycle {}",inport,self.router_index,now);
				}
				PortDirection::South
			}
		};
		self.outport_of_direction(outport_dirn,now)
	}

	///Deterministic as XY when a single dimension remains; otherwise a uniform pick between
	///the two minimal directions of the quadrant.
	fn outport_compute_random(&self, route:&RouteInfo, _inport:usize, _inport_dirn:PortDirection, now:Time, params:&NetworkParameters, rng:&mut StdRng) -> usize
	{
		let num_cols=params.num_cols;
		assert!(params.num_rows>0 && num_cols>0);

		let my_x=(self.router_index%num_cols) as i32;
		let my_y=(self.router_index/num_cols) as i32;
		let dest_x=(route.dest_router%num_cols) as i32;
		let dest_y=(route.dest_router/num_cols) as i32;

		let x_hops=(dest_x-my_x).abs();
		let y_hops=(dest_y-my_y).abs();
		let x_dirn=dest_x>=my_x;
		let y_dirn=dest_y>=my_y;

		assert!( !(x_hops==0 && y_hops==0) );

		let outport_dirn = if x_hops==0
		{
			if y_dirn { PortDirection::North } else { PortDirection::South }
		}
		else if y_hops==0
		{
			if x_dirn { PortDirection::East } else { PortDirection::West }
		}
		else
		{
			let toss = rng.gen_range(0..2)==1;
			match (x_dirn,y_dirn)
			{
				(true,true) => if toss { PortDirection::East } else { PortDirection::North },//Quadrant I
				(false,true) => if toss { PortDirection::West } else { PortDirection::North },//Quadrant II
				(false,false) => if toss { PortDirection::West } else { PortDirection::South },//Quadrant III
				(true,false) => if toss { PortDirection::East } else { PortDirection::South },//Quadrant IV
			}
		};
		self.outport_of_direction(outport_dirn,now)
	}

	///As the random routing but west-first: quadrants II and III are forced to West, which
	///removes the turns into West and breaks the cyclic turn set.
	fn outport_compute_turn_model(&self, route:&RouteInfo, _inport:usize, _inport_dirn:PortDirection, now:Time, params:&NetworkParameters, rng:&mut StdRng) -> usize
	{
		let num_cols=params.num_cols;
		assert!(params.num_rows>0 && num_cols>0);

		let my_x=(self.router_index%num_cols) as i32;
		let my_y=(self.router_index/num_cols) as i32;
		let dest_x=(route.dest_router%num_cols) as i32;
		let dest_y=(route.dest_router/num_cols) as i32;

		let x_hops=(dest_x-my_x).abs();
		let y_hops=(dest_y-my_y).abs();
		let x_dirn=dest_x>=my_x;
		let y_dirn=dest_y>=my_y;

		assert!( !(x_hops==0 && y_hops==0) );

		let outport_dirn = if x_hops==0
		{
			if y_dirn { PortDirection::North } else { PortDirection::South }
		}
		else if y_hops==0
		{
			if x_dirn { PortDirection::East } else { PortDirection::West }
		}
		else
		{
			let toss = rng.gen_range(0..2)==1;
			match (x_dirn,y_dirn)
			{
				(true,true) => if toss { PortDirection::East } else { PortDirection::North },//Quadrant I
				(false,true) => PortDirection::West,//Quadrant II
				(false,false) => PortDirection::West,//Quadrant III
				(true,false) => if toss { PortDirection::East } else { PortDirection::South },//Quadrant IV
			}
		};
		self.outport_of_direction(outport_dirn,now)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	#[test]
	fn net_dest_bits()
	{
		let mut a=NetDest::new(130);
		assert!( a.is_empty() );
		a.add(0);
		a.add(127);
		assert!( a.contains(0) && a.contains(127) && !a.contains(64) );
		let b=NetDest::of_interface(127,130);
		assert!( a.intersection_is_not_empty(&b) );
		let c=NetDest::of_interface(64,130);
		assert!( !c.intersection_is_not_empty(&b) );
	}
	#[test]
	fn table_prefers_lowest_weight_then_lowest_index()
	{
		let mut unit=RoutingUnit::new(0);
		let dest=NetDest::of_interface(3,8);
		unit.add_route(dest.clone());
		unit.add_weight(2);
		unit.add_route(dest.clone());
		unit.add_weight(1);
		unit.add_route(dest.clone());
		unit.add_weight(1);
		assert_eq!( unit.lookup_routing_table(&dest,0) , 1 );
	}
	#[test]
	#[should_panic]
	fn table_miss_is_fatal()
	{
		let mut unit=RoutingUnit::new(0);
		unit.add_route(NetDest::new(8));
		unit.add_weight(1);
		unit.lookup_routing_table(&NetDest::of_interface(3,8),0);
	}
}
