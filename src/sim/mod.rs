pub mod capture;
pub mod damage;
pub mod faint_handler;
pub mod moves;
pub mod pokemon;
pub mod stats;
pub mod status;
pub mod turn;
