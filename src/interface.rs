/*!

The network interfaces: the objects injecting and ejecting traffic at the edge of the mesh.

An interface keeps a credit view of the virtual channels of the router input port it feeds,
stages at most one flit per cycle onto its injection link, and on ejection returns one
credit per consumed flit, flagging the one after the tail as free signal. Messages above
the flit level are the concern of the host; the interface receives already-sized packets.

*/

use std::collections::VecDeque;

use crate::{Credit,Flit,FlitStage,FlitType,RouteInfo};
use crate::event::Time;
use crate::link::{CreditLink,NetworkLink};
use crate::measures::InterfaceStatistics;
use crate::network::NetworkParameters;
use crate::quantify::Quantifiable;
use crate::router::VcState;
use crate::router::flit_buffer::{CreditQueue,FlitBuffer};
use crate::router::output_unit::OutVcState;
use crate::routing::NetDest;

///A packet waiting to enter the network.
struct PendingPacket
{
	id: u64,
	dest_interface: usize,
	dest_router: usize,
	vnet: usize,
	size: usize,
	///Cycle at which the packet was handed to the interface.
	creation: Time,
}

///The packet currently being serialized into flits.
struct CurrentPacket
{
	id: u64,
	dest_interface: usize,
	dest_router: usize,
	size: usize,
	vc: usize,
	sent: usize,
	creation: Time,
}

pub struct NetworkInterface
{
	pub index: usize,
	///Index of the flit link towards the router.
	inject_link: usize,
	///Index of the flit link delivering traffic to this interface.
	eject_link: usize,
	///Index of the credit link returning ejection credits to the router.
	#[allow(dead_code)]
	credit_out_link: usize,
	///Index of the credit link bringing back injection credits.
	credit_in_link: usize,
	///Credit view of the router input port this interface feeds.
	out_vc_states: Vec<OutVcState>,
	///Flits staged for the injection link.
	source_queue: FlitBuffer,
	///Credits waiting to depart towards the router output port.
	pub credit_queue: CreditQueue,
	pending_packets: VecDeque<PendingPacket>,
	current_packet: Option<CurrentPacket>,
	pub statistics: InterfaceStatistics,
}

impl NetworkInterface
{
	pub fn new(index:usize, inject_link:usize, eject_link:usize, credit_out_link:usize, credit_in_link:usize, params:&NetworkParameters) -> NetworkInterface
	{
		let num_vcs=params.num_vcs();
		let out_vc_states=(0..num_vcs).map(|vc|OutVcState::new(params.buffers_for_vc(vc))).collect();
		NetworkInterface{
			index,
			inject_link,
			eject_link,
			credit_out_link,
			credit_in_link,
			out_vc_states,
			source_queue: FlitBuffer::new(),
			credit_queue: CreditQueue::new(),
			pending_packets: VecDeque::new(),
			current_packet: None,
			statistics: InterfaceStatistics::new(),
		}
	}

	///Hands a packet of `size` flits to the interface, to be injected as soon as a virtual
	///channel and credits allow.
	pub fn queue_packet(&mut self, id:u64, dest_interface:usize, dest_router:usize, vnet:usize, size:usize, now:Time)
	{
		assert!(size>=1,"packets have at least one flit");
		self.pending_packets.push_back(PendingPacket{id,dest_interface,dest_router,vnet,size,creation:now});
	}
	pub fn pending_work(&self) -> bool
	{
		self.current_packet.is_some() || !self.pending_packets.is_empty()
	}

	///Called every cycle: binds the next pending packet to a free virtual channel and
	///stages one flit when a credit is available.
	pub fn injection_phase(&mut self, now:Time, params:&NetworkParameters)
	{
		if self.current_packet.is_none()
		{
			if let Some(pending)=self.pending_packets.front()
			{
				let vc_base=pending.vnet*params.vcs_per_vnet;
				let selected=(vc_base..vc_base+params.vcs_per_vnet)
					.find(|&vc|self.out_vc_states[vc].is_in_state(VcState::Idle,now));
				if let Some(vc)=selected
				{
					self.out_vc_states[vc].set_state(VcState::Active,now);
					let pending=self.pending_packets.pop_front().expect("there was a pending packet");
					self.current_packet=Some(CurrentPacket{
						id: pending.id,
						dest_interface: pending.dest_interface,
						dest_router: pending.dest_router,
						size: pending.size,
						vc,
						sent: 0,
						creation: pending.creation,
					});
				}
				//Otherwise every channel of the vnet is busy; retry next cycle.
			}
		}
		let mut finished=false;
		if let Some(ref mut current)=self.current_packet
		{
			if self.out_vc_states[current.vc].has_credit()
			{
				let flit_type=match (current.sent,current.size)
				{
					(0,1) => FlitType::HeadTail,
					(0,_) => FlitType::Head,
					(sent,size) if sent+1==size => FlitType::Tail,
					_ => FlitType::Body,
				};
				let flit=Flit{
					packet: current.id,
					index: current.sent,
					flit_type,
					vc: current.vc,
					route: RouteInfo{
						net_dest: NetDest::of_interface(current.dest_interface,params.num_interfaces()),
						dest_interface: current.dest_interface,
						dest_router: current.dest_router,
					},
					outport: None,
					stage: FlitStage::Injection,
					time: now,
					enqueue_time: current.creation,
				};
				self.out_vc_states[current.vc].decrement();
				self.source_queue.insert(flit);
				self.statistics.created_flits+=1;
				current.sent+=1;
				if current.sent==current.size
				{
					self.statistics.created_packets+=1;
					finished=true;
				}
			}
		}
		if finished
		{
			//The VC stays active until its free signal comes back.
			self.current_packet=None;
		}
	}

	///Extracts a flit ready for the injection link.
	pub fn take_ready_flit(&mut self, now:Time) -> Option<Flit>
	{
		self.source_queue.pop_ready(now)
	}

	///Consumes one delivered flit, returning a credit to the router. The tail's credit
	///carries the free signal.
	pub fn eject_wakeup(&mut self, now:Time, link:&mut NetworkLink)
	{
		if let Some(flit)=link.consume(now)
		{
			if flit.route.dest_interface!=self.index
			{
				panic!("Flit of packet {} reached interface {} instead of {}",flit.packet,self.index,flit.route.dest_interface);
			}
			let is_tail=flit.flit_type==FlitType::Tail || flit.flit_type==FlitType::HeadTail;
			self.credit_queue.insert(Credit{vc:flit.vc,is_free_signal:is_tail,time:now+1});
			self.statistics.consumed_flits+=1;
			if is_tail
			{
				self.statistics.consumed_packets+=1;
				self.statistics.total_packet_delay+=now-flit.enqueue_time;
				self.statistics.ejection_log.push((now,flit.packet));
			}
		}
	}

	///Consumes one credit returned by the router input port.
	pub fn credit_wakeup(&mut self, now:Time, credit_link:&mut CreditLink)
	{
		if let Some(credit)=credit_link.consume(now)
		{
			self.out_vc_states[credit.vc].increment();
			self.statistics.credits_received+=1;
			if credit.is_free_signal
			{
				self.out_vc_states[credit.vc].set_state(VcState::Idle,now);
				self.statistics.free_signals_received+=1;
			}
		}
	}

	pub fn eject_link(&self) -> usize
	{
		self.eject_link
	}
	pub fn inject_link(&self) -> usize
	{
		self.inject_link
	}
	pub fn credit_in_link(&self) -> usize
	{
		self.credit_in_link
	}
	pub fn vc_state(&self, vc:usize) -> &OutVcState
	{
		&self.out_vc_states[vc]
	}
	///Flits staged but not yet on the wire, for the given channel.
	pub fn staged_flits(&self, vc:usize) -> usize
	{
		self.source_queue.iter().filter(|flit|flit.vc==vc).count()
	}
	pub fn staged_total(&self) -> usize
	{
		self.source_queue.len()
	}
}

impl Quantifiable for NetworkInterface
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<NetworkInterface>()
			+ self.source_queue.total_memory()
			+ self.pending_packets.len()*std::mem::size_of::<PendingPacket>()
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
