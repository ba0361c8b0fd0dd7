//! Neural Network Layers
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

pub mod conv;
pub mod dropout;
pub mod linear;
pub mod merge;
pub mod norm;
pub mod pooling;
pub mod upsample;

pub use conv::{Conv2d, Padding};
pub use dropout::Dropout;
pub use linear::Linear;
pub use merge::Concatenate;
pub use norm::BatchNorm2d;
pub use pooling::{GlobalAvgPool2d, MaxPool2d};
pub use upsample::UpSampling2d;
