mod filter;
pub use filter::{Cond, Filter, Op};

mod request;
pub use request::Request;

mod sort;
pub use sort::{Direction, Sort};
