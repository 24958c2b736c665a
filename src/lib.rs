pub mod commands;
pub mod db;
pub mod pathfinder;
pub mod util;
