mod common;
mod lmeds;
mod promeds;
mod prosac;
mod ransac;

pub use lmeds::LMedSEstimator;
pub use promeds::PROMedSEstimator;
pub use prosac::ProsacEstimator;
pub use ransac::RansacEstimator;
