/*!

The two-stage separable switch allocator.

Stage 1 arbitrates among the virtual channels of each input port independently: starting
from a per-inport round-robin pointer, the first VC whose top flit requires switch
allocation this cycle and passes `send_allowed` raises a request towards its outport.
Stage 2 arbitrates among the requesting inports of each output port independently, again
round robin, and performs the grant: virtual-channel assignment if the packet has none yet,
flit extraction, credit decrement, crossbar registration, and the credit return towards the
upstream emitter.

Both round-robin pointers advance exactly once per port per cycle, regardless of outcome,
which bounds starvation to the port count under continuous requests.

*/

use super::crossbar::CrossbarSwitch;
use super::input_unit::InputUnit;
use super::output_unit::OutputUnit;
use crate::FlitStage;
use crate::FlitType;
use crate::event::Time;
use crate::network::NetworkParameters;

pub struct SwitchAllocator
{
	num_inports: usize,
	num_outports: usize,
	num_vcs: usize,
	vcs_per_vnet: usize,
	///`round_robin_inport[outport]`: where stage 2 starts scanning.
	round_robin_inport: Vec<usize>,
	///`round_robin_invc[inport]`: where stage 1 starts scanning.
	round_robin_invc: Vec<usize>,
	///`port_requests[outport][inport]`
	port_requests: Vec<Vec<bool>>,
	///`vc_winners[outport][inport]`: the stage-1 winning VC behind a raised request.
	vc_winners: Vec<Vec<usize>>,
	input_arbiter_activity: usize,
	output_arbiter_activity: usize,
}

impl SwitchAllocator
{
	pub fn new(num_inports:usize, num_outports:usize, params:&NetworkParameters) -> SwitchAllocator
	{
		SwitchAllocator{
			num_inports,
			num_outports,
			num_vcs: params.num_vcs(),
			vcs_per_vnet: params.vcs_per_vnet,
			round_robin_inport: vec![0;num_outports],
			round_robin_invc: vec![0;num_inports],
			port_requests: vec![ vec![false;num_inports] ; num_outports ],
			vc_winners: vec![ vec![0;num_inports] ; num_outports ],
			input_arbiter_activity: 0,
			output_arbiter_activity: 0,
		}
	}

	pub fn wakeup(&mut self, now:Time, router_index:usize, input_units:&mut [InputUnit], output_units:&mut [OutputUnit], crossbar:&mut CrossbarSwitch, params:&NetworkParameters)
	{
		self.arbitrate_inports(now,router_index,input_units,output_units,params);
		self.arbitrate_outports(now,router_index,input_units,output_units,crossbar,params);
		self.clear_request_vector();
	}

	///Stage 1: select one candidate VC per input port.
	fn arbitrate_inports(&mut self, now:Time, router_index:usize, input_units:&[InputUnit], output_units:&[OutputUnit], params:&NetworkParameters)
	{
		for inport in 0..self.num_inports
		{
			let mut invc=self.round_robin_invc[inport];
			//The pointer moves every cycle, whether or not a winner is found.
			self.round_robin_invc[inport]=(invc+1)%self.num_vcs;
			for _invc_iter in 0..self.num_vcs
			{
				if input_units[inport].need_stage(invc,FlitStage::SwitchAllocation,now)
				{
					let outport=input_units[inport].get_outport(invc).expect("a VC in switch allocation must have a routed outport");
					let outvc=input_units[inport].get_outvc(invc);
					if self.send_allowed(now,router_index,inport,invc,outport,outvc,input_units,output_units,params)
					{
						self.input_arbiter_activity+=1;
						self.port_requests[outport][inport]=true;
						self.vc_winners[outport][inport]=invc;
						break;//got one vc winner for this port
					}
				}
				invc=(invc+1)%self.num_vcs;
			}
		}
	}

	///Stage 2: grant one requesting inport per output port.
	fn arbitrate_outports(&mut self, now:Time, router_index:usize, input_units:&mut [InputUnit], output_units:&mut [OutputUnit], crossbar:&mut CrossbarSwitch, params:&NetworkParameters)
	{
		for outport in 0..self.num_outports
		{
			let mut inport=self.round_robin_inport[outport];
			self.round_robin_inport[outport]=(inport+1)%self.num_inports;
			for _inport_iter in 0..self.num_inports
			{
				if self.port_requests[outport][inport]
				{
					let invc=self.vc_winners[outport][inport];
					let outvc=match input_units[inport].get_outvc(invc)
					{
						Some(outvc) => outvc,
						//VC allocation: select any free VC from the outport.
						None => self.vc_allocate(now,router_index,outport,inport,invc,input_units,output_units,params),
					};
					//The flit is ready for switch traversal; the outport was already
					//copied into it by the input unit after route computation.
					let mut flit=input_units[inport].get_top_flit(invc);
					flit.advance_stage(FlitStage::SwitchTraversal,now);
					flit.outport=Some(outport);
					//The outvc is the invc of the next hop.
					flit.vc=outvc;
					let flit_type=flit.flit_type;
					output_units[outport].decrement_credit(outvc,router_index,now);
					crossbar.update_sw_winner(inport,flit);
					self.output_arbiter_activity+=1;

					if flit_type==FlitType::Tail || flit_type==FlitType::HeadTail
					{
						//This input VC should now be empty.
						if !input_units[inport].virtual_channel(invc).is_empty()
						{
							panic!("Tail granted but VC {} not empty at router {} inport {}, cycle {}",invc,router_index,inport,now);
						}
						input_units[inport].set_vc_idle(invc,now);
						//Send a credit back along with the information that this VC is now idle.
						input_units[inport].increment_credit(invc,true,now);
					}
					else
					{
						//Send a credit back but do not indicate that the VC is idle.
						input_units[inport].increment_credit(invc,false,now);
					}
					self.port_requests[outport][inport]=false;
					break;//got an input winner for this outport
				}
				inport=(inport+1)%self.num_inports;
			}
		}
	}

	///Whether the (inport,invc) request towards (outport,outvc) satisfies all flow-control
	///criteria this cycle.
	fn send_allowed(&self, now:Time, router_index:usize, inport:usize, invc:usize, outport:usize, outvc:Option<usize>, input_units:&[InputUnit], output_units:&[OutputUnit], params:&NetworkParameters) -> bool
	{
		let inport_dirn=input_units[inport].direction();
		let outport_dirn=output_units[outport].direction();
		let vnet=invc/self.vcs_per_vnet;

		let allowed=match outvc
		{
			//Needs an outvc. A free VC guarantees a buffer slot, since each VC has at
			//least one buffer; no additional credit check is required.
			None =>
			{
				let route=&input_units[inport].peek_top_flit(invc).route;
				output_units[outport].has_free_vc(vnet,inport_dirn,outport_dirn,invc,route,now,router_index,params)
			},
			Some(outvc) => output_units[outport].has_credit(outvc,now),
		};
		if !allowed
		{
			return false;
		}

		//protocol ordering check: within an ordered vnet, strict per-outport FIFO.
		if params.is_vnet_ordered(vnet)
		{
			let t_enqueue_time=input_units[inport].get_enqueue_time(invc);
			let vc_base=vnet*self.vcs_per_vnet;
			for vc_offset in 0..self.vcs_per_vnet
			{
				let temp_vc=vc_base+vc_offset;
				if input_units[inport].need_stage(temp_vc,FlitStage::SwitchAllocation,now)
					&& input_units[inport].get_outport(temp_vc)==Some(outport)
					&& input_units[inport].get_enqueue_time(temp_vc)<t_enqueue_time
				{
					return false;
				}
			}
		}
		true
	}

	///Selects a free VC at the outport for a packet without one.
	fn vc_allocate(&self, now:Time, router_index:usize, outport:usize, inport:usize, invc:usize, input_units:&mut [InputUnit], output_units:&mut [OutputUnit], params:&NetworkParameters) -> usize
	{
		let inport_dirn=input_units[inport].direction();
		let outport_dirn=output_units[outport].direction();
		let vnet=invc/self.vcs_per_vnet;
		let route=input_units[inport].peek_top_flit(invc).route.clone();
		let outvc=output_units[outport].select_free_vc(vnet,inport_dirn,outport_dirn,invc,&route,now,router_index,params);
		//It has to get a valid VC, since send_allowed verified availability in stage 1.
		let outvc=outvc.unwrap_or_else(||panic!("No free VC at router {} outport {} after stage-1 approval, cycle {}",router_index,outport,now));
		output_units[outport].set_owner(outvc,inport,invc);
		input_units[inport].grant_outvc(invc,outvc);
		outvc
	}

	///Whether some VC will require switch allocation next cycle, so that the allocator must
	///be awakened again.
	pub fn check_for_wakeup(&self, now:Time, input_units:&[InputUnit]) -> bool
	{
		let next_cycle=now+1;
		for inport in 0..self.num_inports
		{
			for vc in 0..self.num_vcs
			{
				if input_units[inport].need_stage(vc,FlitStage::SwitchAllocation,next_cycle)
				{
					return true;
				}
			}
		}
		false
	}

	fn clear_request_vector(&mut self)
	{
		for outport_requests in self.port_requests.iter_mut()
		{
			for request in outport_requests.iter_mut()
			{
				*request=false;
			}
		}
	}

	pub fn input_arbiter_activity(&self) -> usize
	{
		self.input_arbiter_activity
	}
	pub fn output_arbiter_activity(&self) -> usize
	{
		self.output_arbiter_activity
	}
	pub fn reset_statistics(&mut self)
	{
		self.input_arbiter_activity=0;
		self.output_arbiter_activity=0;
	}
}
