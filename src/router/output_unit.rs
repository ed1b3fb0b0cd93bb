/*!

The output side of a router port: the credit view of the downstream input buffers, the
assignment of free virtual channels, and the buffer feeding the outbound link.

The last virtual channel of each vnet is the escape channel. Traffic already on the escape
channel may only continue on it; other traffic may use any channel of its vnet, except that
the escape channel is off limits while the packet still has X hops pending and the requested
hop is vertical, so that everything stored in escape buffers obeys dimension order.

*/

use super::VcState;
use super::flit_buffer::FlitBuffer;
use crate::Flit;
use crate::event::Time;
use crate::link::CreditLink;
use crate::network::NetworkParameters;
use crate::quantify::Quantifiable;
use crate::routing::PortDirection;
use crate::RouteInfo;

///The state of a virtual channel of the downstream input port, as seen from this router.
pub struct OutVcState
{
	state: VcState,
	///First cycle at which the current state is observable.
	state_time: Time,
	credit_count: usize,
	max_credits: usize,
	///The local input port bound to this channel, while active.
	in_port: Option<usize>,
	in_vc: Option<usize>,
}

impl OutVcState
{
	pub(crate) fn new(max_credits:usize) -> OutVcState
	{
		OutVcState{
			state: VcState::Idle,
			state_time: 0,
			credit_count: max_credits,
			max_credits,
			in_port: None,
			in_vc: None,
		}
	}
	pub fn is_in_state(&self, state:VcState, now:Time) -> bool
	{
		self.state==state && now>=self.state_time
	}
	pub fn state(&self) -> VcState
	{
		self.state
	}
	pub(crate) fn set_state(&mut self, state:VcState, now:Time)
	{
		self.state=state;
		self.state_time=now+1;
	}
	///Returns one buffer slot to the counter. For use by the emitters themselves; the
	///output unit wraps it with its own diagnostics.
	pub(crate) fn increment(&mut self)
	{
		assert!( self.credit_count<self.max_credits , "more credits than downstream buffers" );
		self.credit_count+=1;
	}
	pub(crate) fn decrement(&mut self)
	{
		assert!( self.credit_count>0 , "credit underflow" );
		self.credit_count-=1;
	}
	pub fn has_credit(&self) -> bool
	{
		self.credit_count>0
	}
	pub fn credit_count(&self) -> usize
	{
		self.credit_count
	}
	pub fn owner(&self) -> Option<(usize,usize)>
	{
		match (self.in_port,self.in_vc)
		{
			(Some(port),Some(vc)) => Some((port,vc)),
			_ => None,
		}
	}
}

///An output port of a router.
pub struct OutputUnit
{
	id: usize,
	direction: PortDirection,
	out_vc_states: Vec<OutVcState>,
	///Flits that crossed the switch, waiting for the outbound link.
	out_buffer: FlitBuffer,
	///Index of the outbound flit link in the network arena.
	out_link: usize,
	///Index of the inbound credit link in the network arena.
	credit_link: usize,
}

impl OutputUnit
{
	pub fn new(id:usize, direction:PortDirection, out_link:usize, credit_link:usize, params:&NetworkParameters) -> OutputUnit
	{
		let num_vcs=params.num_vcs();
		let out_vc_states=(0..num_vcs).map(|vc|OutVcState::new(params.buffers_for_vc(vc))).collect();
		OutputUnit{
			id,
			direction,
			out_vc_states,
			out_buffer: FlitBuffer::new(),
			out_link,
			credit_link,
		}
	}

	pub fn has_credit(&self, outvc:usize, now:Time) -> bool
	{
		assert!( self.out_vc_states[outvc].is_in_state(VcState::Active,now) );
		self.out_vc_states[outvc].has_credit()
	}
	pub fn decrement_credit(&mut self, outvc:usize, router_index:usize, now:Time)
	{
		let state=&mut self.out_vc_states[outvc];
		if state.credit_count==0
		{
			panic!("Credit underflow at router {} outport {} outvc {}, cycle {}",router_index,self.id,outvc,now);
		}
		state.credit_count-=1;
	}
	pub fn increment_credit(&mut self, outvc:usize)
	{
		let state=&mut self.out_vc_states[outvc];
		assert!( state.credit_count<state.max_credits , "more credits than downstream buffers" );
		state.credit_count+=1;
	}
	pub fn is_vc_idle(&self, vc:usize, now:Time) -> bool
	{
		self.out_vc_states[vc].is_in_state(VcState::Idle,now)
	}

	///Whether the escape channel may not be taken for this hop: a vertical move with X hops
	///still pending is not dimension-ordered, so the drain path may not store it.
	fn is_set_not_allowed_xy(&self, route:&RouteInfo, outport_dirn:PortDirection, router_index:usize, params:&NetworkParameters) -> bool
	{
		let num_cols=params.num_cols;
		assert!(params.num_rows>0 && num_cols>0);
		let my_x=(router_index%num_cols) as i32;
		let my_y=(router_index/num_cols) as i32;
		let dest_x=(route.dest_router%num_cols) as i32;
		let dest_y=(route.dest_router/num_cols) as i32;
		let x_hops=(dest_x-my_x).abs();
		let y_hops=(dest_y-my_y).abs();
		if x_hops==0 || y_hops==0
		{
			false
		}
		else
		{
			outport_dirn==PortDirection::North || outport_dirn==PortDirection::South
		}
	}

	///Whether some virtual channel of the vnet could be assigned to the requesting packet.
	pub fn has_free_vc(&self, vnet:usize, _inport_dirn:PortDirection, outport_dirn:PortDirection, invc:usize, route:&RouteInfo, now:Time, router_index:usize, params:&NetworkParameters) -> bool
	{
		let vc_base=vnet*params.vcs_per_vnet;
		let escape_vc=vc_base+params.vcs_per_vnet-1;
		if invc==escape_vc
		{
			if self.is_vc_idle(escape_vc,now)
			{
				return true;
			}
		}
		else
		{
			let escape_barred=self.is_set_not_allowed_xy(route,outport_dirn,router_index,params);
			for vc in vc_base..vc_base+params.vcs_per_vnet
			{
				if escape_barred && vc==escape_vc
				{
					continue;
				}
				if self.is_vc_idle(vc,now)
				{
					return true;
				}
			}
		}
		false
	}

	///Assigns a free virtual channel of the vnet to the packet, marking it active.
	///The selection mirrors `has_free_vc` exactly.
	pub fn select_free_vc(&mut self, vnet:usize, _inport_dirn:PortDirection, outport_dirn:PortDirection, invc:usize, route:&RouteInfo, now:Time, router_index:usize, params:&NetworkParameters) -> Option<usize>
	{
		let vc_base=vnet*params.vcs_per_vnet;
		let escape_vc=vc_base+params.vcs_per_vnet-1;
		if invc==escape_vc
		{
			if self.is_vc_idle(escape_vc,now)
			{
				self.out_vc_states[escape_vc].set_state(VcState::Active,now);
				return Some(escape_vc);
			}
		}
		else
		{
			let escape_barred=self.is_set_not_allowed_xy(route,outport_dirn,router_index,params);
			for vc in vc_base..vc_base+params.vcs_per_vnet
			{
				if escape_barred && vc==escape_vc
				{
					continue;
				}
				if self.is_vc_idle(vc,now)
				{
					self.out_vc_states[vc].set_state(VcState::Active,now);
					return Some(vc);
				}
			}
		}
		None
	}
	pub fn set_owner(&mut self, outvc:usize, in_port:usize, in_vc:usize)
	{
		self.out_vc_states[outvc].in_port=Some(in_port);
		self.out_vc_states[outvc].in_vc=Some(in_vc);
	}

	///Consume one credit from the inbound credit link: one downstream buffer slot was
	///freed; the free signal reports the downstream VC went back to idle.
	pub fn wakeup(&mut self, now:Time, credit_link:&mut CreditLink)
	{
		if let Some(credit)=credit_link.consume(now)
		{
			self.increment_credit(credit.vc);
			if credit.is_free_signal
			{
				self.out_vc_states[credit.vc].set_state(VcState::Idle,now);
				self.out_vc_states[credit.vc].in_port=None;
				self.out_vc_states[credit.vc].in_vc=None;
			}
		}
	}

	pub fn insert_flit(&mut self, flit:Flit)
	{
		self.out_buffer.insert(flit);
	}
	///Extracts a flit ready to traverse the outbound link, if any.
	pub fn take_ready_flit(&mut self, now:Time) -> Option<Flit>
	{
		self.out_buffer.pop_ready(now)
	}
	pub fn direction(&self) -> PortDirection
	{
		self.direction
	}
	pub fn out_link(&self) -> usize
	{
		self.out_link
	}
	pub fn credit_link(&self) -> usize
	{
		self.credit_link
	}
	pub fn vc_state(&self, outvc:usize) -> &OutVcState
	{
		&self.out_vc_states[outvc]
	}
	pub fn buffered_flits(&self, vc:usize) -> usize
	{
		self.out_buffer.iter().filter(|flit|flit.vc==vc).count()
	}
	pub fn buffered_total(&self) -> usize
	{
		self.out_buffer.len()
	}
}

impl Quantifiable for OutputUnit
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<OutputUnit>() + self.out_buffer.total_memory() + self.out_vc_states.len()*std::mem::size_of::<OutVcState>()
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

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::config::ConfigurationValue;
	use crate::routing::NetDest;

	fn mesh_parameters(rows:usize, cols:usize, vcs:usize) -> NetworkParameters
	{
		let cv=ConfigurationValue::Object("Mesh".to_string(),vec![
			("num_rows".to_string(),ConfigurationValue::Number(rows as f64)),
			("num_cols".to_string(),ConfigurationValue::Number(cols as f64)),
			("virt_nets".to_string(),ConfigurationValue::Number(1.0)),
			("vcs_per_vnet".to_string(),ConfigurationValue::Number(vcs as f64)),
			("buffers_per_data_vc".to_string(),ConfigurationValue::Number(4.0)),
			("routing_algorithm".to_string(),ConfigurationValue::Literal("RANDOM".to_string())),
		]);
		NetworkParameters::new(&cv)
	}

	#[test]
	fn escape_channel_is_barred_on_nonordered_turns()
	{
		let params=mesh_parameters(4,4,4);
		let unit=OutputUnit::new(0,PortDirection::North,0,0,&params);
		//From router 0 to router 15 both dimensions are pending.
		let route=RouteInfo{net_dest:NetDest::of_interface(15,16),dest_interface:15,dest_router:15};
		assert!( unit.is_set_not_allowed_xy(&route,PortDirection::North,0,&params) );
		assert!( unit.is_set_not_allowed_xy(&route,PortDirection::South,0,&params) );
		assert!( !unit.is_set_not_allowed_xy(&route,PortDirection::East,0,&params) );
		//Aligned in X, a vertical hop is dimension-ordered.
		let aligned=RouteInfo{net_dest:NetDest::of_interface(12,16),dest_interface:12,dest_router:12};
		assert!( !unit.is_set_not_allowed_xy(&aligned,PortDirection::North,0,&params) );
	}
	#[test]
	fn escape_traffic_only_gets_the_escape_channel()
	{
		let params=mesh_parameters(4,4,4);
		let mut unit=OutputUnit::new(0,PortDirection::West,0,0,&params);
		let route=RouteInfo{net_dest:NetDest::of_interface(0,16),dest_interface:0,dest_router:0};
		//invc 3 is the escape channel of vnet 0.
		let selected=unit.select_free_vc(0,PortDirection::Local,PortDirection::West,3,&route,0,5,&params);
		assert_eq!( selected , Some(3) );
		unit.set_owner(3,0,3);
		assert_eq!( unit.vc_state(3).owner() , Some((0,3)) );
		//Once taken it is no longer available to further escape traffic.
		assert!( !unit.has_free_vc(0,PortDirection::Local,PortDirection::West,3,&route,1,5,&params) );
		//Adaptive traffic still finds the remaining channels.
		assert!( unit.has_free_vc(0,PortDirection::Local,PortDirection::West,0,&route,1,5,&params) );
	}
}
