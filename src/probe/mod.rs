pub mod checksum;
pub mod classify;
pub mod icmp;
pub mod socket;
pub mod transport;

pub use checksum::*;
pub use classify::*;
pub use icmp::*;
pub use socket::*;
pub use transport::*;
