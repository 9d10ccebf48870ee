pub mod bind;
pub mod dispatcher;
pub mod error;
