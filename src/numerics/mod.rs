pub mod assembly;
pub mod dual;
pub mod timing;
pub mod transient;
