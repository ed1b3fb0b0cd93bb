/*!

This module is for managing errors on the fallible surfaces of the crate. Cases that should
never happen during a correct simulation are kept as `panic!` with a diagnostic naming the
router, port, and cycle involved.

Instead of `expect` or `unwrap_or_else` try
* `map_err` like in `.map_err(|e|Error::power_estimator_failed(source_location!(),e))?;`
* `ok_or_else` like in `.ok_or_else( ||Error::bad_argument(source_location!()) )?;`

To include arbitrary messages use the `with_message` method, as in
`Error::undetermined(source_location!()).with_message(format!("text like in a panic: {}",thing))`.

*/

use std::fmt::{Display,Formatter};

use crate::config::ConfigurationValue;

/// The main Error class to be used in each `Result(Whatever,Error)`.
/// It contains the code source of the error and its kind.
/// An arbitrary `String` message can be optionally attached.
#[derive(Debug)]
pub struct Error
{
	pub source_location: SourceLocation,
	pub kind: ErrorKind,
	pub message: Option<String>,
}

/// A source code location where an error occurred.
/// Contains the values of the macros `std::{file,line,column}`.
#[derive(Debug)]
pub struct SourceLocation
{
	pub file: &'static str,
	pub line: u32,
	pub column: u32,
}

#[derive(Debug)]
pub enum ErrorKind
{
	/// A configuration value that could not be interpreted.
	IllFormedConfiguration{
		value: ConfigurationValue,
	},
	/// Some method received a bad argument. There should be an attached message with further explanation.
	BadArgument,
	/// The external power/area estimator reported a failure. The simulation state stays valid.
	PowerEstimatorFailed{
		description: String,
	},
	/// Any other error. Better to add new types than to use this thing.
	Undetermined,
}

// source_location!()
#[macro_export]
macro_rules! source_location{
	() => {
		$crate::error::SourceLocation{
			file: file!(),
			line: line!(),
			column: column!(),
		}
	}
}
#[macro_export]
macro_rules! error{
	($kind:ident,$($args:tt)*) => {{
		$crate::error::Error::$kind( $crate::source_location!(), $($args)* )
	}};
	($kind:ident) => {{
		$crate::error::Error::$kind( $crate::source_location!() )
	}};
}

use ErrorKind::*;

impl Error
{
	pub fn new(source_location:SourceLocation, kind:ErrorKind) -> Error
	{
		Error{
			source_location,
			kind,
			message:None,
		}
	}
	pub fn with_message(mut self,message:String) -> Error
	{
		match self.message
		{
			Some(ref mut text) => *text += &message,
			None => self.message=Some(message),
		}
		self
	}
	pub fn ill_formed_configuration(source_location:SourceLocation,value:ConfigurationValue)->Error
	{
		Error{
			source_location,
			kind: IllFormedConfiguration{
				value,
			},
			message:None,
		}
	}
	pub fn bad_argument(source_location:SourceLocation)->Error
	{
		Error{
			source_location,
			kind: BadArgument,
			message:None,
		}
	}
	pub fn power_estimator_failed(source_location:SourceLocation,description:String)->Error
	{
		Error{
			source_location,
			kind: PowerEstimatorFailed{
				description,
			},
			message:None,
		}
	}
	pub fn undetermined(source_location:SourceLocation)->Error
	{
		Error{
			source_location,
			kind: Undetermined,
			message:None,
		}
	}
}

impl Display for Error
{
	fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), std::fmt::Error>
	{
		let Error{source_location:location,kind,message} = self;
		writeln!(formatter,"Error at file {} at line {} column {}.",location.file,location.line,location.column)?;
		if let Some(text) = message
		{
			writeln!(formatter,"{}",text)?;
		}
		kind.fmt(formatter)?;
		Ok(())
	}
}

impl Display for ErrorKind
{
	fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), std::fmt::Error>
	{
		match self
		{
			IllFormedConfiguration{value} =>
			{
				writeln!(formatter,"IllFormedConfiguration error: The following configuration value could not be interpreted:\n{}",value)?;
			},
			BadArgument =>
			{
				writeln!(formatter,"BadArgument: Bad arguments given to a function.")?;
			},
			PowerEstimatorFailed{description} =>
			{
				writeln!(formatter,"PowerEstimatorFailed: The external estimator reported: {}",description)?;
			},
			Undetermined =>
			{
				writeln!(formatter,"Undetermined error: A generic error. The concrete error should be more specified.")?;
			},
		}
		Ok(())
	}
}
