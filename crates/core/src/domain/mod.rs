pub mod form;
pub mod role;
