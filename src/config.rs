/*!

Module for the configuration trees from which every component is built.

A simulation is described by a `ConfigurationValue` tree. The host loader is in charge of
producing such a tree, whether from a file or otherwise; tests and embedding programs may
build it directly. Builders receive a `ConfigurationValue::Object` and dispatch on its
fields with the `match_object_panic!` macro.

*/

use std::fmt::{Display,Formatter};

use crate::error::Error;
use crate::event::Time;
use crate::source_location;

///The values in a configuration tree.
///An `Object` is typed `Name { key1 : value1, key2 : value2, [...] }`.
#[derive(Clone,Debug,PartialEq)]
pub enum ConfigurationValue
{
	Literal(String),
	Number(f64),
	Object(String,Vec<(String,ConfigurationValue)>),
	Array(Vec<ConfigurationValue>),
	True,
	False,
}

impl ConfigurationValue
{
	pub fn as_bool(&self) -> Result<bool,Error>
	{
		match self
		{
			&ConfigurationValue::True => Ok(true),
			&ConfigurationValue::False => Ok(false),
			_ => Err(Error::ill_formed_configuration(source_location!(),self.clone())),
		}
	}
	pub fn as_f64(&self) -> Result<f64,Error>
	{
		match self
		{
			&ConfigurationValue::Number(f) => Ok(f),
			_ => Err(Error::ill_formed_configuration(source_location!(),self.clone())),
		}
	}
	pub fn as_usize(&self) -> Result<usize,Error>
	{
		self.as_f64().map(|f|f as usize)
	}
	pub fn as_time(&self) -> Result<Time,Error>
	{
		self.as_f64().map(|f|f as Time)
	}
	pub fn as_str(&self) -> Result<&str,Error>
	{
		match self
		{
			&ConfigurationValue::Literal(ref s) => Ok(s),
			_ => Err(Error::ill_formed_configuration(source_location!(),self.clone())),
		}
	}
	pub fn as_array(&self) -> Result<&Vec<ConfigurationValue>,Error>
	{
		match self
		{
			&ConfigurationValue::Array(ref a) => Ok(a),
			_ => Err(Error::ill_formed_configuration(source_location!(),self.clone())),
		}
	}
	///Change the name of an Object. Panics for other variants.
	pub fn rename(&mut self, new_name:String)
	{
		match self
		{
			ConfigurationValue::Object(ref mut name,ref _pairs) => *name=new_name,
			_ => panic!("Cannot rename a non-Object"),
		}
	}
}

impl Display for ConfigurationValue
{
	fn fmt(&self, formatter:&mut Formatter<'_>) -> Result<(),std::fmt::Error>
	{
		match self
		{
			ConfigurationValue::Literal(s) => write!(formatter,"\"{}\"",s)?,
			ConfigurationValue::Number(f) => write!(formatter,"{}",f)?,
			ConfigurationValue::Object(name,pairs) =>
			{
				write!(formatter,"{}{{",name)?;
				for (key,value) in pairs.iter()
				{
					write!(formatter," {}: {},",key,value)?;
				}
				write!(formatter,"}}")?;
			},
			ConfigurationValue::Array(a) =>
			{
				write!(formatter,"[")?;
				for value in a.iter()
				{
					write!(formatter,"{}, ",value)?;
				}
				write!(formatter,"]")?;
			},
			ConfigurationValue::True => write!(formatter,"true")?,
			ConfigurationValue::False => write!(formatter,"false")?,
		}
		Ok(())
	}
}

/**
Matches over the fields of a `ConfigurationValue::Object`, panicking on unknown fields.
The `legend_name` field is always accepted, so that trees written for output tooling keep working.

```ignore
match_object_panic!(cv,"Mesh",value,
	"num_rows" => num_rows=Some(value.as_usize().expect("bad value for num_rows")),
	"num_cols" => num_cols=Some(value.as_usize().expect("bad value for num_cols")),
);
```
**/
#[macro_export]
macro_rules! match_object_panic{
	($cv:expr, $name:literal, $valueid:ident ) => {{
		match_object_panic!($cv,[$name],$valueid,)
	}};
	($cv:expr, $name:literal, $valueid:ident, $($arm:tt)* ) => {{
		match_object_panic!($cv,[$name],$valueid,$($arm)*)
	}};
	($cv:expr, $names:expr, $valueid:ident, $($arm:tt)* ) => {{
		if let &$crate::config::ConfigurationValue::Object(ref cv_name, ref cv_pairs) = $cv
		{
			if !$names.iter().any(|&x|x==cv_name)
			{
				if $names.len()==1 {
					panic!("A {} must be created from a `{}` object not `{}`",$names[0],$names[0],cv_name);
				} else {
					panic!("Trying to create either of `{:?}` object from `{}`",$names,cv_name);
				}
			}
			for &(ref name,ref $valueid) in cv_pairs
			{
				match AsRef::<str>::as_ref(&name)
				{
					$( $arm )*
					"legend_name" => (),
					_ => panic!("Nothing to do with field {} in {}",name,$names[0]),
				}
			}
		}
		else
		{
			panic!("Trying to create a {} from a non-Object",$names[0]);
		}
	}};
}
