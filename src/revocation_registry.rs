mod definition;
mod delta;
mod state;
mod status_list;
mod tails;

pub use definition::*;
pub use delta::*;
pub use state::*;
pub use status_list::{RevocationStatusList, RevocationStatusListUpdate};
pub use tails::*;
