/*!

The router: a composition of input units, output units, a routing unit, the two-stage
switch allocator, and the crossbar.

Per-cycle operation: flits arriving on the inbound links are buffered by the input units,
which request switch allocation for the next cycle. The allocator arbitrates and grants
flits into the crossbar. In the one-cycle pipeline the crossbar drains into the output
buffers within the same cycle; the staged pipeline defers it to the next cycle. Credits
depart at grant cycle + 1 in both variants.

*/

pub mod flit_buffer;
pub mod input_unit;
pub mod output_unit;
pub mod switch_allocator;
pub mod crossbar;

use ::rand::rngs::StdRng;

use crate::event::{Consumer,EventQueue,Time};
use crate::link::{CreditLink,NetworkLink};
use crate::network::{NetworkParameters,PipelineVariant};
use crate::quantify::Quantifiable;
use crate::routing::{NetDest,PortDirection,RoutingUnit};
use crate::RouteInfo;
use self::crossbar::CrossbarSwitch;
use self::input_unit::InputUnit;
use self::output_unit::OutputUnit;
use self::switch_allocator::SwitchAllocator;

///The states a virtual channel can be in, on either side of a link.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum VcState
{
	Idle,
	///Waiting for a virtual channel of the next router. Unused by the one-cycle pipeline,
	///where allocation happens within switch arbitration.
	#[allow(dead_code)]
	VcAb,
	Active,
}

pub struct Router
{
	pub index: usize,
	pub input_units: Vec<InputUnit>,
	pub output_units: Vec<OutputUnit>,
	pub routing_unit: RoutingUnit,
	pub switch_allocator: SwitchAllocator,
	pub crossbar: CrossbarSwitch,
	pipeline: PipelineVariant,
	virt_nets: usize,
}

impl Router
{
	pub fn new(index:usize, params:&NetworkParameters) -> Router
	{
		Router{
			index,
			input_units: vec![],
			output_units: vec![],
			routing_unit: RoutingUnit::new(index),
			//Resized by init once the ports are known.
			switch_allocator: SwitchAllocator::new(0,0,params),
			crossbar: CrossbarSwitch::new(0),
			pipeline: params.pipeline,
			virt_nets: params.virt_nets,
		}
	}

	///Registers an input port fed by `in_link`, with `credit_link` carrying its credits
	///back to the upstream emitter.
	pub fn add_in_port(&mut self, direction:PortDirection, in_link:usize, credit_link:usize, params:&NetworkParameters) -> usize
	{
		let port_num=self.input_units.len();
		self.input_units.push(InputUnit::new(port_num,direction,in_link,credit_link,params));
		self.routing_unit.add_in_direction(direction,port_num);
		port_num
	}

	///Registers an output port towards `out_link`, reachable per `routing_table_entry`,
	///receiving credits on `credit_link`.
	pub fn add_out_port(&mut self, direction:PortDirection, out_link:usize, routing_table_entry:NetDest, link_weight:i32, credit_link:usize, params:&NetworkParameters) -> usize
	{
		let port_num=self.output_units.len();
		self.output_units.push(OutputUnit::new(port_num,direction,out_link,credit_link,params));
		self.routing_unit.add_route(routing_table_entry);
		self.routing_unit.add_weight(link_weight);
		self.routing_unit.add_out_direction(direction,port_num);
		port_num
	}

	///To be called after all the ports have been added.
	pub fn init(&mut self, params:&NetworkParameters)
	{
		self.switch_allocator=SwitchAllocator::new(self.input_units.len(),self.output_units.len(),params);
		self.crossbar=CrossbarSwitch::new(self.input_units.len());
	}

	///Delegates the outport computation to the routing unit.
	pub fn route_compute(&self, route:&RouteInfo, inport:usize, inport_dirn:PortDirection, invc:usize, escape_vc:usize, now:Time, params:&NetworkParameters, rng:&mut StdRng) -> usize
	{
		self.routing_unit.outport_compute(route,inport,inport_dirn,invc,escape_vc,now,params,rng)
	}

	///An inbound flit link signalled readiness at the current cycle.
	pub fn input_wakeup(&mut self, inport:usize, now:Time, link:&mut NetworkLink, params:&NetworkParameters, rng:&mut StdRng, queue:&mut EventQueue)
	{
		let Router{ref mut input_units, ref routing_unit, index, ..}=*self;
		input_units[inport].wakeup(now,link,routing_unit,index,params,rng,queue);
	}

	///An inbound credit link signalled readiness at the current cycle.
	pub fn output_credit_wakeup(&mut self, outport:usize, now:Time, credit_link:&mut CreditLink)
	{
		self.output_units[outport].wakeup(now,credit_link);
	}

	///Runs both allocation stages, then the switch traversal (immediately or scheduled,
	///per the pipeline variant), then re-requests allocation if work remains.
	pub fn swalloc_wakeup(&mut self, now:Time, params:&NetworkParameters, queue:&mut EventQueue)
	{
		{
			let Router{ref mut switch_allocator, ref mut input_units, ref mut output_units, ref mut crossbar, index, ..}=*self;
			switch_allocator.wakeup(now,index,input_units,output_units,crossbar,params);
		}
		match self.pipeline
		{
			PipelineVariant::OneCycle => self.switch_traversal(now),
			PipelineVariant::Staged =>
			{
				if self.crossbar.has_winners()
				{
					queue.enqueue_begin(Consumer::Crossbar{router:self.index},1);
				}
			},
		}
		if self.switch_allocator.check_for_wakeup(now,&self.input_units)
		{
			queue.enqueue_end(Consumer::Allocator{router:self.index},1);
		}
	}

	///Drains the crossbar winners into the output buffers, scheduled at the current cycle.
	pub fn switch_traversal(&mut self, now:Time)
	{
		let Router{ref mut crossbar, ref mut output_units, ..}=*self;
		for inport in 0..crossbar.num_inports()
		{
			if let Some(mut flit)=crossbar.take_winner(inport)
			{
				let outport=flit.outport.expect("a granted flit carries its outport");
				flit.advance_stage(crate::FlitStage::LinkTraversal,now);
				output_units[outport].insert_flit(flit);
			}
		}
	}

	//--- statistics, in the shape the power interface consumes.

	pub fn buffer_writes(&self) -> usize
	{
		self.input_units.iter().map(|unit|(0..self.virt_nets).map(|vnet|unit.buffer_writes(vnet)).sum::<usize>()).sum()
	}
	pub fn buffer_reads(&self) -> usize
	{
		self.input_units.iter().map(|unit|(0..self.virt_nets).map(|vnet|unit.buffer_reads(vnet)).sum::<usize>()).sum()
	}
	pub fn sw_inport_arbs(&self) -> usize
	{
		self.switch_allocator.input_arbiter_activity()
	}
	pub fn sw_outport_arbs(&self) -> usize
	{
		self.switch_allocator.output_arbiter_activity()
	}
	pub fn crossbar_traversals(&self) -> usize
	{
		self.crossbar.crossbar_activity()
	}
	pub fn reset_statistics(&mut self)
	{
		for unit in self.input_units.iter_mut()
		{
			unit.reset_statistics();
		}
		self.switch_allocator.reset_statistics();
		self.crossbar.reset_statistics();
	}
}

impl Quantifiable for Router
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<Router>()
			+ self.input_units.iter().map(|unit|unit.total_memory()).sum::<usize>()
			+ self.output_units.iter().map(|unit|unit.total_memory()).sum::<usize>()
			+ self.crossbar.total_memory()
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
