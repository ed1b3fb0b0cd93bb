/*!

The input side of a router port: the virtual channel array, their buffers, and the queue of
credits travelling back to the upstream emitter.

*/

use ::rand::rngs::StdRng;

use super::VcState;
use super::flit_buffer::{CreditQueue,FlitBuffer};
use crate::{Credit,Flit,FlitStage,FlitType};
use crate::event::{Consumer,EventQueue,Time};
use crate::link::NetworkLink;
use crate::network::NetworkParameters;
use crate::quantify::Quantifiable;
use crate::routing::{PortDirection,RoutingUnit};

///The state of one virtual channel of an input port.
///A state recorded at cycle T is observable at state reads from cycle T+1 on; grants within
///the same cycle's pipeline act on the recorded value directly.
pub struct VirtualChannel
{
	state: VcState,
	///First cycle at which the current state is observable.
	state_time: Time,
	///Outport latched by the head flit. All flits of the packet follow it.
	outport: Option<usize>,
	///Virtual channel granted at the downstream router, assigned during switch allocation.
	outvc: Option<usize>,
	input_buffer: FlitBuffer,
	///Cycle at which the current packet head was buffered. `Time::MAX` while idle.
	enqueue_time: Time,
}

impl VirtualChannel
{
	fn new(buffers:usize) -> VirtualChannel
	{
		VirtualChannel{
			state: VcState::Idle,
			state_time: 0,
			outport: None,
			outvc: None,
			input_buffer: FlitBuffer::bounded(buffers),
			enqueue_time: Time::MAX,
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
	fn set_active(&mut self, now:Time)
	{
		self.state=VcState::Active;
		self.state_time=now+1;
		self.enqueue_time=now;
	}
	fn set_idle(&mut self, now:Time)
	{
		self.state=VcState::Idle;
		self.state_time=now+1;
		self.outport=None;
		self.outvc=None;
		self.enqueue_time=Time::MAX;
	}
	pub fn need_stage(&self, stage:FlitStage, now:Time) -> bool
	{
		match self.input_buffer.peek()
		{
			Some(flit) => flit.stage==stage && flit.time<=now,
			None => false,
		}
	}
	pub fn is_empty(&self) -> bool
	{
		self.input_buffer.is_empty()
	}
	pub fn len(&self) -> usize
	{
		self.input_buffer.len()
	}
}

///An input port of a router.
pub struct InputUnit
{
	id: usize,
	direction: PortDirection,
	vcs: Vec<VirtualChannel>,
	///Credits waiting to depart towards the upstream emitter.
	pub credit_queue: CreditQueue,
	///Index of the inbound flit link in the network arena.
	in_link: usize,
	///Index of the outbound credit link in the network arena.
	credit_link: usize,
	//number of writes same as reads: any flit that is written will be read exactly once
	num_buffer_writes: Vec<usize>,
	num_buffer_reads: Vec<usize>,
}

impl InputUnit
{
	pub fn new(id:usize, direction:PortDirection, in_link:usize, credit_link:usize, params:&NetworkParameters) -> InputUnit
	{
		let num_vcs=params.num_vcs();
		let vcs=(0..num_vcs).map(|vc|VirtualChannel::new(params.buffers_for_vc(vc))).collect();
		InputUnit{
			id,
			direction,
			vcs,
			credit_queue: CreditQueue::new(),
			in_link,
			credit_link,
			num_buffer_writes: vec![0;params.virt_nets],
			num_buffer_reads: vec![0;params.virt_nets],
		}
	}

	///Consume one flit from the inbound link, route it if it heads a packet, buffer it, and
	///request switch allocation for the next cycle.
	pub fn wakeup(&mut self, now:Time, link:&mut NetworkLink, routing_unit:&RoutingUnit, router_index:usize, params:&NetworkParameters, rng:&mut StdRng, queue:&mut EventQueue)
	{
		if let Some(mut flit)=link.consume(now)
		{
			let vc=flit.vc;
			match flit.flit_type
			{
				FlitType::Head | FlitType::HeadTail =>
				{
					if !self.vcs[vc].is_in_state(VcState::Idle,now)
					{
						panic!("Head flit into non-idle VC {} at router {} inport {}, cycle {}",vc,router_index,self.id,now);
					}
					self.vcs[vc].set_active(now);
					//Route computation for this vc. All flits of the packet will use the
					//latched outport; for simplicity it is also copied into the flit.
					let vnet=vc/params.vcs_per_vnet;
					let escape_vc=params.escape_vc(vnet);
					let outport=routing_unit.outport_compute(&flit.route,self.id,self.direction,vc,escape_vc,now,params,rng);
					self.vcs[vc].outport=Some(outport);
					flit.outport=Some(outport);
				},
				FlitType::Body | FlitType::Tail =>
				{
					if !self.vcs[vc].is_in_state(VcState::Active,now)
					{
						panic!("{:?} flit into idle VC {} at router {} inport {}, cycle {}",flit.flit_type,vc,router_index,self.id,now);
					}
					flit.outport=self.vcs[vc].outport;
				},
			}
			let vnet=vc/params.vcs_per_vnet;
			self.num_buffer_writes[vnet]+=1;
			self.num_buffer_reads[vnet]+=1;
			//Switch allocation request for the next cycle. The VC of the next router is
			//allocated during SA.
			flit.advance_stage(FlitStage::SwitchAllocation,now+1);
			self.vcs[vc].input_buffer.insert(flit);
			queue.enqueue_end(Consumer::Allocator{router:router_index},1);
		}
	}

	///Whether the top flit of the VC requires the given stage at the given cycle.
	pub fn need_stage(&self, invc:usize, stage:FlitStage, now:Time) -> bool
	{
		self.vcs[invc].need_stage(stage,now)
	}
	pub fn get_outport(&self, invc:usize) -> Option<usize>
	{
		self.vcs[invc].outport
	}
	pub fn get_outvc(&self, invc:usize) -> Option<usize>
	{
		self.vcs[invc].outvc
	}
	pub fn grant_outvc(&mut self, invc:usize, outvc:usize)
	{
		self.vcs[invc].outvc=Some(outvc);
	}
	pub fn get_enqueue_time(&self, invc:usize) -> Time
	{
		self.vcs[invc].enqueue_time
	}
	///Extracts the top flit of the VC.
	pub fn get_top_flit(&mut self, invc:usize) -> Flit
	{
		self.vcs[invc].input_buffer.pop().unwrap_or_else(||panic!("Popping from empty VC {} at inport {}",invc,self.id))
	}
	pub fn peek_top_flit(&self, invc:usize) -> &Flit
	{
		self.vcs[invc].input_buffer.peek().unwrap_or_else(||panic!("Peeking into empty VC {} at inport {}",invc,self.id))
	}
	pub fn set_vc_idle(&mut self, invc:usize, now:Time)
	{
		self.vcs[invc].set_idle(now);
	}
	pub fn set_vc_active(&mut self, invc:usize, now:Time)
	{
		self.vcs[invc].set_active(now);
	}
	///Emit a credit towards the upstream emitter, tagged as free signal when the VC just
	///returned to idle. The credit departs the cycle after the grant.
	pub fn increment_credit(&mut self, invc:usize, is_free_signal:bool, now:Time)
	{
		self.credit_queue.insert(Credit{vc:invc,is_free_signal,time:now+1});
	}
	pub fn direction(&self) -> PortDirection
	{
		self.direction
	}
	pub fn in_link(&self) -> usize
	{
		self.in_link
	}
	pub fn credit_link(&self) -> usize
	{
		self.credit_link
	}
	pub fn virtual_channel(&self, invc:usize) -> &VirtualChannel
	{
		&self.vcs[invc]
	}
	pub fn num_vcs(&self) -> usize
	{
		self.vcs.len()
	}
	pub fn buffer_writes(&self, vnet:usize) -> usize
	{
		self.num_buffer_writes[vnet]
	}
	pub fn buffer_reads(&self, vnet:usize) -> usize
	{
		self.num_buffer_reads[vnet]
	}
	pub fn reset_statistics(&mut self)
	{
		for x in self.num_buffer_writes.iter_mut()
		{
			*x=0;
		}
		for x in self.num_buffer_reads.iter_mut()
		{
			*x=0;
		}
	}
}

impl Quantifiable for InputUnit
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<InputUnit>() + self.vcs.iter().map(|vc|vc.input_buffer.total_memory()).sum::<usize>()
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
