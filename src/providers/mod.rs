pub mod upbit;
pub mod yahoo;
