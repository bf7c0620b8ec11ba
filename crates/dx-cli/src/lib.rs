pub mod evaluate;
pub mod input;
pub mod train;
pub mod util;
