/*!

The event scheduling of the simulation.

There are no threads nor locks; many routers advance in parallel in simulated time but
execute serially in a defined order. Deferred work is expressed by scheduling a `Consumer`
wakeup at a future cycle. Multiple requests for the same consumer at the same cycle and
position collapse to a single invocation.

*/

/// An amount of cycles.
pub type Time = u64;

///The components that can be awakened by the event queue. The queue dispatches on the
///variant; no component keeps a pointer to another.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Consumer
{
	///An input unit, consuming from its inbound flit link.
	Input{
		router: usize,
		port: usize,
	},
	///An output unit, consuming from its inbound credit link.
	Output{
		router: usize,
		port: usize,
	},
	///The switch allocator of a router.
	Allocator{
		router: usize,
	},
	///The crossbar of a router. Only scheduled by the staged pipeline.
	Crossbar{
		router: usize,
	},
	///A network interface consuming flits delivered by its ejection link.
	Ejection{
		interface: usize,
	},
	///A network interface consuming credits returned by the attached router.
	InjectionCredit{
		interface: usize,
	},
}

///This is used to sort the processing of the events inside a cycle.
///If some event occurs at Begin then its result will be visible for events at End.
///Specifically, we ensure that all the flits have arrived before arbitrating.
///Currently at Begin: flit and credit arrivals. At End: switch allocation.
pub enum CyclePosition
{
	Begin,
	End,
}

///The event queue structure managing the insertion and extraction of wakeups.
///A circular calendar with a slot per cycle; `size` must exceed any scheduled delay.
pub struct EventQueue
{
	event_begin_circle: Vec<Vec<Consumer>>,
	event_end_circle: Vec<Vec<Consumer>>,
	//offset currently being accessed.
	current: usize,
}

impl EventQueue
{
	///Creates a new EventQueue. `size` should be greater than any possible delay.
	pub fn new (size:usize) -> EventQueue
	{
		EventQueue{
			event_begin_circle: vec![ vec![] ; size ],
			event_end_circle: vec![ vec![] ; size ],
			current:0,
		}
	}
	///Advances the queue by a cycle. This drops the events in the finished cycle.
	pub fn advance(&mut self)
	{
		self.event_begin_circle[self.current]=Vec::new();
		self.event_end_circle[self.current]=Vec::new();
		self.current=(self.current+1)%self.event_begin_circle.len();
	}
	///Access to the consumer in the `ievent` index of the events to be executed at the begin of the cycle.
	pub fn access_begin(&self, ievent:usize) -> Option<Consumer>
	{
		let v=&self.event_begin_circle[self.current];
		if ievent<v.len()
		{
			Some(v[ievent])
		}
		else
		{
			None
		}
	}
	///Access to the consumer in the `ievent` index of the events to be executed at the end of the cycle.
	pub fn access_end(&self, ievent:usize) -> Option<Consumer>
	{
		let v=&self.event_end_circle[self.current];
		if ievent<v.len()
		{
			Some(v[ievent])
		}
		else
		{
			None
		}
	}
	///Adds a wakeup to the list of events to be executed at the begin of the cycle `current_cycle + delay`.
	pub fn enqueue_begin(&mut self, consumer:Consumer, delay: Time)
	{
		let delay = delay as usize;
		if delay>=self.event_begin_circle.len()
		{
			panic!("Delay too long");
		}
		let position=(self.current+delay) % self.event_begin_circle.len();
		if !self.event_begin_circle[position].contains(&consumer)
		{
			self.event_begin_circle[position].push(consumer);
		}
	}
	///Adds a wakeup to the list of events to be executed at the end of the cycle `current_cycle + delay`.
	pub fn enqueue_end(&mut self, consumer:Consumer, delay: Time)
	{
		let delay = delay as usize;
		if delay>=self.event_end_circle.len()
		{
			panic!("Delay too long");
		}
		let position=(self.current+delay) % self.event_end_circle.len();
		if !self.event_end_circle[position].contains(&consumer)
		{
			self.event_end_circle[position].push(consumer);
		}
	}
	///Adds a wakeup as it requests.
	pub fn enqueue(&mut self, consumer:Consumer, position:CyclePosition, delay:Time)
	{
		match position
		{
			CyclePosition::Begin => self.enqueue_begin(consumer,delay),
			CyclePosition::End => self.enqueue_end(consumer,delay),
		};
	}
}
