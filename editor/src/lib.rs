#[macro_use]
extern crate log;

pub mod application;
pub mod consts;
pub mod dispatcher;
pub mod error;
pub mod messages;
pub mod utility_traits;

#[cfg(test)]
pub mod test_utils;

#[doc(inline)]
pub use application::Editor;
#[doc(inline)]
pub use dispatcher::EditorBackends;
#[doc(inline)]
pub use error::StackError;
