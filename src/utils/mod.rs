pub mod fs;
pub mod paths;
pub mod system;
pub mod text;
