//! Hierarchical Classifiers - Architecture Factories
//!
//! Two families share a convolutional trunk and differ in how the heads are
//! fed:
//!
//! - **U-Net** ([`unet`]): upsampling branches concatenate deeper maps with
//!   skip maps before the middle and fine heads.
//! - **Bottleneck** ([`bottleneck`]): no skip connections; heads tap the
//!   trunk at increasing depth.
//!
//! Layer names are fixed per family so that weights trained at one stage
//! load by name into the next.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

pub mod blocks;
pub mod bottleneck;
pub mod unet;

use std::fmt;
use std::str::FromStr;

use hiernet_tensor::{Error, Result};
use serde::{Deserialize, Serialize};

pub use bottleneck::{coarse_bottleneck, fine_bottleneck, fine_bottleneck_single, middle_bottleneck};
pub use unet::{coarse_unet, fine_unet, fine_unet_single, middle_unet};

// =============================================================================
// InputShape
// =============================================================================

/// Image input shape in Keras order: height, width, channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InputShape {
    /// Image height in pixels.
    pub height: usize,
    /// Image width in pixels.
    pub width: usize,
    /// Number of channels.
    pub channels: usize,
}

impl InputShape {
    /// Creates an input shape.
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// The 32x32 RGB shape of CIFAR-10 images.
    pub const fn cifar10() -> Self {
        Self::new(32, 32, 3)
    }

    /// Per-sample NCHW shape without the batch dimension.
    pub fn per_sample(&self) -> [usize; 3] {
        [self.channels, self.height, self.width]
    }

    /// Full NCHW shape for a batch.
    pub fn batch(&self, n: usize) -> [usize; 4] {
        [n, self.channels, self.height, self.width]
    }

    /// Fails if any dimension is zero.
    pub fn check_non_zero(&self) -> Result<()> {
        if self.height == 0 || self.width == 0 || self.channels == 0 {
            return Err(Error::invalid_argument(format!(
                "input shape {self} has a zero dimension"
            )));
        }
        Ok(())
    }
}

impl Default for InputShape {
    fn default() -> Self {
        Self::cifar10()
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

impl FromStr for InputShape {
    type Err = Error;

    /// Parses `HxWxC`, e.g. `32x32x3`.
    fn from_str(s: &str) -> Result<Self> {
        let dims: Vec<&str> = s.trim().split(['x', 'X']).collect();
        let parse = |d: &str| {
            d.trim().parse::<usize>().map_err(|_| {
                Error::invalid_argument(format!("invalid input shape {s:?}, expected HxWxC"))
            })
        };
        match dims.as_slice() {
            [h, w, c] => Ok(Self::new(parse(h)?, parse(w)?, parse(c)?)),
            _ => Err(Error::invalid_argument(format!(
                "invalid input shape {s:?}, expected HxWxC"
            ))),
        }
    }
}

impl TryFrom<String> for InputShape {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<InputShape> for String {
    fn from(shape: InputShape) -> Self {
        shape.to_string()
    }
}

impl From<(usize, usize, usize)> for InputShape {
    fn from((height, width, channels): (usize, usize, usize)) -> Self {
        Self::new(height, width, channels)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_shape_parse() {
        assert_eq!("32x32x3".parse::<InputShape>().unwrap(), InputShape::cifar10());
        assert_eq!("64X48x1".parse::<InputShape>().unwrap(), InputShape::new(64, 48, 1));
        assert!("32x32".parse::<InputShape>().is_err());
        assert!("axbxc".parse::<InputShape>().is_err());
        assert_eq!(InputShape::default().to_string(), "32x32x3");
    }

    #[test]
    fn test_input_shape_layouts() {
        let shape = InputShape::new(16, 24, 3);
        assert_eq!(shape.per_sample(), [3, 16, 24]);
        assert_eq!(shape.batch(5), [5, 3, 16, 24]);
        assert!(InputShape::new(0, 8, 3).check_non_zero().is_err());
    }
}
