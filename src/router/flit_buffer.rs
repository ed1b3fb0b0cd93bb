/*!

Buffers ordering flits by their scheduled cycle.

*/

use std::cmp::Ordering;
use std::collections::{BinaryHeap,VecDeque};

use crate::{Credit,Flit};
use crate::event::Time;
use crate::quantify::Quantifiable;

struct Entry
{
	time: Time,
	///Insertion order, to break ties deterministically.
	seq: u64,
	flit: Flit,
}

impl PartialEq for Entry
{
	fn eq(&self, other:&Entry) -> bool
	{
		self.time==other.time && self.seq==other.seq
	}
}
impl Eq for Entry {}
impl PartialOrd for Entry
{
	fn partial_cmp(&self, other:&Entry) -> Option<Ordering>
	{
		Some(self.cmp(other))
	}
}
impl Ord for Entry
{
	fn cmp(&self, other:&Entry) -> Ordering
	{
		//Inverted comparison, so that the standard max-heap pops the earliest entry.
		(other.time,other.seq).cmp( &(self.time,self.seq) )
	}
}

///A queue of flits ordered by scheduled cycle; ties are broken by insertion order.
///With `max_size` set it refuses insertions beyond the given capacity.
pub struct FlitBuffer
{
	buffer: BinaryHeap<Entry>,
	next_seq: u64,
	max_size: Option<usize>,
}

impl FlitBuffer
{
	pub fn new() -> FlitBuffer
	{
		FlitBuffer{
			buffer: BinaryHeap::new(),
			next_seq: 0,
			max_size: None,
		}
	}
	pub fn bounded(max_size:usize) -> FlitBuffer
	{
		FlitBuffer{
			buffer: BinaryHeap::new(),
			next_seq: 0,
			max_size: Some(max_size),
		}
	}
	pub fn insert(&mut self, flit:Flit)
	{
		if self.is_full()
		{
			panic!("Inserting into a full flit buffer");
		}
		let seq=self.next_seq;
		self.next_seq+=1;
		self.buffer.push(Entry{time:flit.time,seq,flit});
	}
	///The earliest-scheduled flit, if any.
	pub fn peek(&self) -> Option<&Flit>
	{
		self.buffer.peek().map(|entry|&entry.flit)
	}
	///Extracts the earliest-scheduled flit.
	pub fn pop(&mut self) -> Option<Flit>
	{
		self.buffer.pop().map(|entry|entry.flit)
	}
	///Extracts the earliest-scheduled flit only if its cycle has been reached.
	pub fn pop_ready(&mut self, now:Time) -> Option<Flit>
	{
		if self.is_ready(now)
		{
			self.pop()
		}
		else
		{
			None
		}
	}
	///Whether some flit has its scheduled cycle at or before `now`.
	pub fn is_ready(&self, now:Time) -> bool
	{
		match self.buffer.peek()
		{
			Some(entry) => entry.time<=now,
			None => false,
		}
	}
	pub fn is_empty(&self) -> bool
	{
		self.buffer.is_empty()
	}
	pub fn is_full(&self) -> bool
	{
		match self.max_size
		{
			Some(max) => self.buffer.len()>=max,
			None => false,
		}
	}
	pub fn len(&self) -> usize
	{
		self.buffer.len()
	}
	///Iterate over the stored flits in no particular order.
	pub fn iter(&self) -> impl Iterator<Item=&Flit>
	{
		self.buffer.iter().map(|entry|&entry.flit)
	}
}

impl Quantifiable for FlitBuffer
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<FlitBuffer>() + self.buffer.len()*std::mem::size_of::<Entry>()
	}
	fn print_memory_breakdown(&self)
	{
		println!("flit buffer with {} flits",self.buffer.len());
	}
	fn forecast_total_memory(&self) -> usize
	{
		self.total_memory()
	}
}

///The queue of credits waiting to depart by a credit link.
///Credits are enqueued with non-decreasing departure cycles, so a plain FIFO keeps the order.
pub struct CreditQueue
{
	queue: VecDeque<Credit>,
}

impl CreditQueue
{
	pub fn new() -> CreditQueue
	{
		CreditQueue{
			queue: VecDeque::new(),
		}
	}
	pub fn insert(&mut self, credit:Credit)
	{
		if let Some(last)=self.queue.back()
		{
			debug_assert!(last.time<=credit.time,"credits must be enqueued in order");
		}
		self.queue.push_back(credit);
	}
	pub fn is_ready(&self, now:Time) -> bool
	{
		match self.queue.front()
		{
			Some(credit) => credit.time<=now,
			None => false,
		}
	}
	pub fn pop_ready(&mut self, now:Time) -> Option<Credit>
	{
		if self.is_ready(now)
		{
			self.queue.pop_front()
		}
		else
		{
			None
		}
	}
	pub fn len(&self) -> usize
	{
		self.queue.len()
	}
	pub fn iter(&self) -> impl Iterator<Item=&Credit>
	{
		self.queue.iter()
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::{FlitType,RouteInfo};
	use crate::routing::NetDest;

	fn flit_at(time:Time) -> Flit
	{
		Flit{
			packet: 0,
			index: 0,
			flit_type: FlitType::HeadTail,
			vc: 0,
			route: RouteInfo{net_dest:NetDest::new(1),dest_interface:0,dest_router:0},
			outport: None,
			stage: crate::FlitStage::Injection,
			time,
			enqueue_time: time,
		}
	}

	#[test]
	fn ordering_is_by_time_then_insertion()
	{
		let mut buffer=FlitBuffer::new();
		let mut a=flit_at(5); a.packet=1;
		let mut b=flit_at(3); b.packet=2;
		let mut c=flit_at(5); c.packet=3;
		buffer.insert(a);
		buffer.insert(b);
		buffer.insert(c);
		assert!( !buffer.is_ready(2) );
		assert!( buffer.is_ready(3) );
		assert_eq!( buffer.pop().unwrap().packet , 2 );
		//Among equal times, the first inserted leaves first.
		assert_eq!( buffer.pop().unwrap().packet , 1 );
		assert_eq!( buffer.pop().unwrap().packet , 3 );
		assert!( buffer.pop().is_none() );
	}
	#[test]
	#[should_panic]
	fn bounded_refuses_when_full()
	{
		let mut buffer=FlitBuffer::bounded(1);
		buffer.insert(flit_at(0));
		buffer.insert(flit_at(1));
	}
	#[test]
	fn credits_are_fifo()
	{
		let mut queue=CreditQueue::new();
		queue.insert(Credit{vc:0,is_free_signal:false,time:2});
		queue.insert(Credit{vc:1,is_free_signal:true,time:2});
		assert!( !queue.is_ready(1) );
		assert_eq!( queue.pop_ready(2).unwrap().vc , 0 );
		assert_eq!( queue.pop_ready(2).unwrap().vc , 1 );
		assert!( queue.pop_ready(2).is_none() );
	}
}
