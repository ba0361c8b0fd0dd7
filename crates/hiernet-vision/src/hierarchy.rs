//! Label Hierarchy - Fine, Middle and Coarse Classes
//!
//! Every fine class belongs to exactly one middle class and every middle
//! class to exactly one coarse class. The hierarchy is validated on
//! construction, so lookups never index out of range.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::fmt;
use std::str::FromStr;

use hiernet_tensor::{Error, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Level
// =============================================================================

/// Granularity of a classification head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// 2 classes.
    Coarse,
    /// 5 classes.
    Middle,
    /// 10 classes.
    Fine,
}

impl Level {
    /// All levels from coarse to fine.
    pub const ALL: [Level; 3] = [Level::Coarse, Level::Middle, Level::Fine];

    /// Number of classes at this level in the CIFAR-10 hierarchy.
    pub fn num_classes(self) -> usize {
        match self {
            Level::Coarse => 2,
            Level::Middle => 5,
            Level::Fine => 10,
        }
    }

    /// Name of the model output carrying this level's probabilities.
    pub fn output_name(self) -> &'static str {
        match self {
            Level::Coarse => "coarse",
            Level::Middle => "middle",
            Level::Fine => "fine",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.output_name())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "coarse" => Ok(Level::Coarse),
            "middle" => Ok(Level::Middle),
            "fine" => Ok(Level::Fine),
            other => Err(Error::invalid_argument(format!("unknown level: {other}"))),
        }
    }
}

// =============================================================================
// LabelHierarchy
// =============================================================================

/// Three-level class tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHierarchy", into = "RawHierarchy")]
pub struct LabelHierarchy {
    fine: Vec<String>,
    middle: Vec<String>,
    coarse: Vec<String>,
    fine_to_middle: Vec<usize>,
    middle_to_coarse: Vec<usize>,
}

#[derive(Serialize, Deserialize)]
struct RawHierarchy {
    fine: Vec<String>,
    middle: Vec<String>,
    coarse: Vec<String>,
    fine_to_middle: Vec<usize>,
    middle_to_coarse: Vec<usize>,
}

impl TryFrom<RawHierarchy> for LabelHierarchy {
    type Error = Error;

    fn try_from(raw: RawHierarchy) -> Result<Self> {
        LabelHierarchy::new(
            raw.fine,
            raw.middle,
            raw.coarse,
            raw.fine_to_middle,
            raw.middle_to_coarse,
        )
    }
}

impl From<LabelHierarchy> for RawHierarchy {
    fn from(h: LabelHierarchy) -> Self {
        Self {
            fine: h.fine,
            middle: h.middle,
            coarse: h.coarse,
            fine_to_middle: h.fine_to_middle,
            middle_to_coarse: h.middle_to_coarse,
        }
    }
}

fn check_parent_map(map: &[usize], children: usize, parents: usize, what: &str) -> Result<()> {
    if map.len() != children {
        return Err(Error::invalid_argument(format!(
            "{what} map has {} entries for {children} classes",
            map.len()
        )));
    }
    if let Some(&bad) = map.iter().find(|&&p| p >= parents) {
        return Err(Error::invalid_argument(format!(
            "{what} map points at class {bad}, only {parents} exist"
        )));
    }
    if let Some(orphan) = (0..parents).find(|p| !map.contains(p)) {
        return Err(Error::invalid_argument(format!(
            "{what} map leaves parent class {orphan} without children"
        )));
    }
    Ok(())
}

impl LabelHierarchy {
    /// Builds and validates a hierarchy.
    pub fn new(
        fine: Vec<String>,
        middle: Vec<String>,
        coarse: Vec<String>,
        fine_to_middle: Vec<usize>,
        middle_to_coarse: Vec<usize>,
    ) -> Result<Self> {
        if fine.is_empty() || middle.is_empty() || coarse.is_empty() {
            return Err(Error::invalid_argument("every level needs at least one class"));
        }
        check_parent_map(&fine_to_middle, fine.len(), middle.len(), "fine -> middle")?;
        check_parent_map(&middle_to_coarse, middle.len(), coarse.len(), "middle -> coarse")?;
        Ok(Self {
            fine,
            middle,
            coarse,
            fine_to_middle,
            middle_to_coarse,
        })
    }

    /// The CIFAR-10 hierarchy: vehicles and animals, split into five groups.
    pub fn cifar10() -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
        Self {
            fine: owned(&[
                "airplane",
                "automobile",
                "bird",
                "cat",
                "deer",
                "dog",
                "frog",
                "horse",
                "ship",
                "truck",
            ]),
            middle: owned(&["air_water", "road", "small_wild", "pet", "large_wild"]),
            coarse: owned(&["vehicle", "animal"]),
            fine_to_middle: vec![0, 1, 2, 3, 4, 3, 2, 4, 0, 1],
            middle_to_coarse: vec![0, 0, 1, 1, 1],
        }
    }

    /// Parses a hierarchy from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Reads a hierarchy from a TOML file.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let hierarchy = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        tracing::debug!(path = %path.display(), "loaded label hierarchy");
        Ok(hierarchy)
    }

    /// Class names at a level.
    pub fn class_names(&self, level: Level) -> &[String] {
        match level {
            Level::Coarse => &self.coarse,
            Level::Middle => &self.middle,
            Level::Fine => &self.fine,
        }
    }

    /// Number of classes at a level.
    pub fn num_classes(&self, level: Level) -> usize {
        self.class_names(level).len()
    }

    /// Name of a class, if it exists.
    pub fn class_name(&self, level: Level, class: usize) -> Option<&str> {
        self.class_names(level).get(class).map(String::as_str)
    }

    /// Middle class of a fine class.
    pub fn middle_of(&self, fine: usize) -> Option<usize> {
        self.fine_to_middle.get(fine).copied()
    }

    /// Coarse class of a fine class.
    pub fn coarse_of(&self, fine: usize) -> Option<usize> {
        self.middle_of(fine).and_then(|m| self.coarse_of_middle(m))
    }

    /// Coarse class of a middle class.
    pub fn coarse_of_middle(&self, middle: usize) -> Option<usize> {
        self.middle_to_coarse.get(middle).copied()
    }

    /// Fine classes under a middle class.
    pub fn fine_under(&self, middle: usize) -> Vec<usize> {
        (0..self.fine.len())
            .filter(|&f| self.fine_to_middle[f] == middle)
            .collect()
    }

    /// True when the given predictions lie on one root-to-leaf path.
    /// Levels left as `None` are not checked.
    pub fn is_consistent(
        &self,
        coarse: Option<usize>,
        middle: Option<usize>,
        fine: Option<usize>,
    ) -> bool {
        let fine_ok = match (fine, middle, coarse) {
            (Some(f), Some(m), _) => self.middle_of(f) == Some(m),
            (Some(f), None, Some(c)) => self.coarse_of(f) == Some(c),
            _ => true,
        };
        let middle_ok = match (middle, coarse) {
            (Some(m), Some(c)) => self.coarse_of_middle(m) == Some(c),
            _ => true,
        };
        fine_ok && middle_ok
    }
}

impl Default for LabelHierarchy {
    fn default() -> Self {
        Self::cifar10()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cifar10_is_valid() {
        let h = LabelHierarchy::cifar10();
        let raw = RawHierarchy::from(h.clone());
        assert_eq!(LabelHierarchy::try_from(raw).unwrap(), h);
        for level in Level::ALL {
            assert_eq!(h.num_classes(level), level.num_classes());
        }
    }

    #[test]
    fn test_lookups() {
        let h = LabelHierarchy::cifar10();
        // truck -> road -> vehicle
        assert_eq!(h.middle_of(9), Some(1));
        assert_eq!(h.coarse_of(9), Some(0));
        // dog -> pet -> animal
        assert_eq!(h.class_name(Level::Middle, h.middle_of(5).unwrap()), Some("pet"));
        assert_eq!(h.coarse_of(5), Some(1));
        assert_eq!(h.fine_under(3), vec![3, 5]);
        assert_eq!(h.middle_of(10), None);
    }

    #[test]
    fn test_consistency() {
        let h = LabelHierarchy::cifar10();
        assert!(h.is_consistent(Some(0), Some(0), Some(8)));
        assert!(!h.is_consistent(Some(1), Some(0), Some(8)));
        assert!(!h.is_consistent(Some(0), Some(3), None));
        assert!(h.is_consistent(Some(1), None, Some(6)));
        assert!(h.is_consistent(None, None, Some(6)));
    }

    #[test]
    fn test_validation_rejects_orphans() {
        let names = |n: usize| (0..n).map(|i| i.to_string()).collect::<Vec<_>>();
        // middle class 1 has no fine class
        let err = LabelHierarchy::new(names(2), names(2), names(1), vec![0, 0], vec![0, 0]);
        assert!(err.is_err());
        // out-of-range parent
        let err = LabelHierarchy::new(names(2), names(1), names(1), vec![0, 3], vec![0]);
        assert!(err.is_err());
        assert!(LabelHierarchy::new(names(2), names(1), names(1), vec![0, 0], vec![0]).is_ok());
    }

    #[test]
    fn test_from_toml() {
        let h = LabelHierarchy::from_toml_str(
            r#"
            fine = ["a", "b", "c"]
            middle = ["ab", "c"]
            coarse = ["all"]
            fine_to_middle = [0, 0, 1]
            middle_to_coarse = [0, 0]
            "#,
        )
        .unwrap();
        assert_eq!(h.coarse_of(2), Some(0));
        assert!(LabelHierarchy::from_toml_str("fine = []").is_err());
        assert_eq!("Middle".parse::<Level>().unwrap(), Level::Middle);
    }
}
