pub mod external;
pub mod position;
pub mod referral;
pub mod registry;
pub mod stream;
pub mod vault;

pub use position::*;
pub use referral::*;
pub use registry::*;
pub use stream::*;
pub use vault::*;
