pub mod features;
pub mod observation;
pub mod signals;
pub mod training;
pub mod weights;

pub use features::*;
pub use observation::*;
pub use signals::*;
pub use training::*;
pub use weights::*;
