//! Inputs and the containers that group them
//!
//! - [`Input`]: one named value with a filter chain and a validator chain
//! - [`ArrayInput`]: an input whose value is a list, judged per element
//! - [`InputFilter`]: named inputs and nested input filters
//! - [`CollectionInputFilter`]: one template input filter applied to a list of data maps

pub mod array_input;
pub mod collection;
pub mod input;
pub mod input_filter;

pub use array_input::ArrayInput;
pub use collection::CollectionInputFilter;
pub use input::{ERROR_MESSAGE_KEY, Input, InputInterface};
pub use input_filter::{Entry, GroupItem, InputFilter, InputFilterInterface};
