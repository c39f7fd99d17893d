mod reader;

pub use reader::read;
pub use reader::read_all;
pub use reader::read_partial;
