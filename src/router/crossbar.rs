/*!

The crossbar of a router: one winner register per input port, drained into the output
buffers during switch traversal.

*/

use crate::Flit;
use crate::quantify::Quantifiable;

pub struct CrossbarSwitch
{
	///`winners[inport]` holds the flit granted to that input this cycle, if any.
	winners: Vec<Option<Flit>>,
	crossbar_activity: usize,
}

impl CrossbarSwitch
{
	pub fn new(num_inports:usize) -> CrossbarSwitch
	{
		CrossbarSwitch{
			winners: (0..num_inports).map(|_|None).collect(),
			crossbar_activity: 0,
		}
	}
	///Registers the winner of an input port for this cycle.
	pub fn update_sw_winner(&mut self, inport:usize, flit:Flit)
	{
		assert!( self.winners[inport].is_none() , "the crossbar winner of inport {} was not drained",inport );
		self.winners[inport]=Some(flit);
	}
	///Extracts the registered winner of an input port, counting the traversal.
	pub fn take_winner(&mut self, inport:usize) -> Option<Flit>
	{
		let winner=self.winners[inport].take();
		if winner.is_some()
		{
			self.crossbar_activity+=1;
		}
		winner
	}
	pub fn num_inports(&self) -> usize
	{
		self.winners.len()
	}
	pub fn has_winners(&self) -> bool
	{
		self.winners.iter().any(|winner|winner.is_some())
	}
	///Flits currently inside the crossbar bound to the given outport and channel.
	pub fn registered_flits(&self, outport:usize, vc:usize) -> usize
	{
		self.winners.iter().filter(|winner|match winner
		{
			Some(flit) => flit.outport==Some(outport) && flit.vc==vc,
			None => false,
		}).count()
	}
	pub fn crossbar_activity(&self) -> usize
	{
		self.crossbar_activity
	}
	pub fn reset_statistics(&mut self)
	{
		self.crossbar_activity=0;
	}
}

impl Quantifiable for CrossbarSwitch
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<CrossbarSwitch>() + self.winners.len()*std::mem::size_of::<Option<Flit>>()
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
