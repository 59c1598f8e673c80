pub mod db;
pub mod geom;
pub mod grid;
pub mod util;
