/*!

The unidirectional pipes connecting routers and interfaces.

A `NetworkLink` moves flits, a `CreditLink` moves credits; both transfer at most one item
per cycle and deliver it `latency` cycles later. Each link knows where its source queue
lives and which consumer to awaken on delivery; the endpoints refer to each other only
through these descriptors, never through pointers.

*/

use crate::{Credit,Flit};
use crate::event::{Consumer,Time};
use crate::quantify::Quantifiable;
use crate::router::flit_buffer::{CreditQueue,FlitBuffer};

///Where a flit link takes its traffic from.
#[derive(Clone,Copy,Debug)]
pub enum FlitSource
{
	RouterOutput{
		router: usize,
		outport: usize,
	},
	Interface(usize),
}

///Where a credit link takes its traffic from.
#[derive(Clone,Copy,Debug)]
pub enum CreditSource
{
	RouterInput{
		router: usize,
		inport: usize,
	},
	Interface(usize),
}

pub struct NetworkLink
{
	pub latency: Time,
	pub source: FlitSource,
	pub consumer: Consumer,
	///Flits in flight.
	buffer: FlitBuffer,
	link_traversals: usize,
}

impl NetworkLink
{
	pub fn new(latency:Time, source:FlitSource, consumer:Consumer) -> NetworkLink
	{
		assert!(latency>=1,"links must have at least a cycle of latency");
		NetworkLink{
			latency,
			source,
			consumer,
			buffer: FlitBuffer::new(),
			link_traversals: 0,
		}
	}
	///Puts a flit on the wire at the current cycle; it becomes consumable after the link latency.
	pub fn transmit(&mut self, mut flit:Flit, now:Time)
	{
		flit.time=now+self.latency;
		self.buffer.insert(flit);
		self.link_traversals+=1;
	}
	pub fn is_ready(&self, now:Time) -> bool
	{
		self.buffer.is_ready(now)
	}
	pub fn consume(&mut self, now:Time) -> Option<Flit>
	{
		self.buffer.pop_ready(now)
	}
	///Flits in flight bound to the given virtual channel.
	pub fn in_flight(&self, vc:usize) -> usize
	{
		self.buffer.iter().filter(|flit|flit.vc==vc).count()
	}
	pub fn in_flight_total(&self) -> usize
	{
		self.buffer.len()
	}
	pub fn link_traversals(&self) -> usize
	{
		self.link_traversals
	}
	pub fn reset_statistics(&mut self)
	{
		self.link_traversals=0;
	}
}

impl Quantifiable for NetworkLink
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<NetworkLink>() + self.buffer.total_memory()
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

pub struct CreditLink
{
	pub latency: Time,
	pub source: CreditSource,
	pub consumer: Consumer,
	///Credits in flight. Transmission times are monotone, so a FIFO keeps the order.
	buffer: CreditQueue,
	link_traversals: usize,
}

impl CreditLink
{
	pub fn new(latency:Time, source:CreditSource, consumer:Consumer) -> CreditLink
	{
		assert!(latency>=1,"links must have at least a cycle of latency");
		CreditLink{
			latency,
			source,
			consumer,
			buffer: CreditQueue::new(),
			link_traversals: 0,
		}
	}
	pub fn transmit(&mut self, mut credit:Credit, now:Time)
	{
		credit.time=now+self.latency;
		self.buffer.insert(credit);
		self.link_traversals+=1;
	}
	pub fn is_ready(&self, now:Time) -> bool
	{
		self.buffer.is_ready(now)
	}
	pub fn consume(&mut self, now:Time) -> Option<Credit>
	{
		self.buffer.pop_ready(now)
	}
	///Credits in flight for the given virtual channel.
	pub fn in_flight(&self, vc:usize) -> usize
	{
		self.buffer.iter().filter(|credit|credit.vc==vc).count()
	}
	pub fn in_flight_total(&self) -> usize
	{
		self.buffer.len()
	}
	pub fn link_traversals(&self) -> usize
	{
		self.link_traversals
	}
	pub fn reset_statistics(&mut self)
	{
		self.link_traversals=0;
	}
}

impl Quantifiable for CreditLink
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<CreditLink>() + self.buffer.len()*std::mem::size_of::<Credit>()
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
