//! Outcome classes of a fault-injection run
//!
//! Three mutually exclusive classes, ordered by severity:
//! - SEFI (critical): required output missing or unparseable
//! - SDC (data corruption): output parsed but differs from the golden run
//! - NE (no effect): output indistinguishable from the golden run

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single run relative to the golden execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeClass {
    Critical,
    Corruption,
    Silent,
}

/// Presentation metadata for an outcome class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassInfo {
    /// Short name used in tables and plots
    pub name: &'static str,
    /// Matplotlib-compatible color name
    pub color: &'static str,
    pub description: &'static str,
}

const CLASS_INFO: [ClassInfo; 3] = [
    ClassInfo {
        name: "SEFI",
        color: "royalblue",
        description: "Logs with missing information are considered critical errors or \
                      Single Event Functional Interrupts (SEFI).",
    },
    ClassInfo {
        name: "SDC",
        color: "lightsteelblue",
        description: "Logs with different values to the golden log are considered \
                      data corruption errors (SDC).",
    },
    ClassInfo {
        name: "NE",
        color: "cornflowerblue",
        description: "Logs where we can't tell the difference from the golden run \
                      using the comparison fields, also called No Effect (NE).",
    },
];

impl OutcomeClass {
    /// All classes in severity order
    pub const ALL: [OutcomeClass; 3] = [
        OutcomeClass::Critical,
        OutcomeClass::Corruption,
        OutcomeClass::Silent,
    ];

    fn index(self) -> usize {
        match self {
            OutcomeClass::Critical => 0,
            OutcomeClass::Corruption => 1,
            OutcomeClass::Silent => 2,
        }
    }

    pub fn info(self) -> &'static ClassInfo {
        &CLASS_INFO[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn color(self) -> &'static str {
        self.info().color
    }

    pub fn description(self) -> &'static str {
        self.info().description
    }

    /// True for the two classes that count as an observable error
    pub fn is_error(self) -> bool {
        !matches!(self, OutcomeClass::Silent)
    }
}

impl fmt::Display for OutcomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per outcome class
///
/// Every class is always present, so a group with zero occurrences of a class
/// reports `0` for it rather than leaving it out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerClass<T> {
    pub critical: T,
    pub corruption: T,
    pub silent: T,
}

impl<T> PerClass<T> {
    pub fn from_fn(mut f: impl FnMut(OutcomeClass) -> T) -> Self {
        Self {
            critical: f(OutcomeClass::Critical),
            corruption: f(OutcomeClass::Corruption),
            silent: f(OutcomeClass::Silent),
        }
    }

    pub fn get(&self, class: OutcomeClass) -> &T {
        match class {
            OutcomeClass::Critical => &self.critical,
            OutcomeClass::Corruption => &self.corruption,
            OutcomeClass::Silent => &self.silent,
        }
    }

    pub fn get_mut(&mut self, class: OutcomeClass) -> &mut T {
        match class {
            OutcomeClass::Critical => &mut self.critical,
            OutcomeClass::Corruption => &mut self.corruption,
            OutcomeClass::Silent => &mut self.silent,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(OutcomeClass, &T) -> U) -> PerClass<U> {
        PerClass::from_fn(|class| f(class, self.get(class)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (OutcomeClass, &T)> {
        OutcomeClass::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

impl PerClass<usize> {
    pub fn total(&self) -> usize {
        self.critical + self.corruption + self.silent
    }

    /// Counts divided by their total; `None` for an empty population
    pub fn proportions(&self) -> Option<PerClass<f64>> {
        let n = self.total();
        if n == 0 {
            return None;
        }
        Some(self.map(|_, &count| count as f64 / n as f64))
    }
}

impl PerClass<f64> {
    pub fn sum(&self) -> f64 {
        self.critical + self.corruption + self.silent
    }
}
