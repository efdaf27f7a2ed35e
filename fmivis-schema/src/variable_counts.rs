//! Variable tallies of a model description.

use std::fmt::Display;

/// Number of model variables per variability, causality and base type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub constants: usize,
    pub parameters: usize,
    pub discrete: usize,
    pub continuous: usize,
    pub inputs: usize,
    pub outputs: usize,
    pub locals: usize,
    pub independent: usize,
    pub reals: usize,
    pub integers: usize,
    pub enumerations: usize,
    pub booleans: usize,
    pub strings: usize,
}

impl Counts {
    /// `(group, label, count)` rows, grouped by variability, causality and base type.
    pub fn rows(&self) -> [(&'static str, &'static str, usize); 13] {
        [
            ("Variability", "Constant", self.constants),
            ("Variability", "Parameter", self.parameters),
            ("Variability", "Discrete", self.discrete),
            ("Variability", "Continuous", self.continuous),
            ("Causality", "Input", self.inputs),
            ("Causality", "Output", self.outputs),
            ("Causality", "Local", self.locals),
            ("Causality", "Independent", self.independent),
            ("Type", "Real", self.reals),
            ("Type", "Integer", self.integers),
            ("Type", "Enumeration", self.enumerations),
            ("Type", "Boolean", self.booleans),
            ("Type", "String", self.strings),
        ]
    }

    /// Every variable has exactly one base type.
    pub fn total(&self) -> usize {
        self.reals + self.integers + self.enumerations + self.booleans + self.strings
    }
}

impl Display for Counts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut group = "";
        for (row_group, label, count) in self.rows() {
            if row_group != group {
                if !group.is_empty() {
                    writeln!(f)?;
                }
                write!(f, "{row_group}:")?;
                group = row_group;
            }
            write!(f, " {label} {count}")?;
        }
        Ok(())
    }
}

pub trait VariableCounts {
    fn model_counts(&self) -> Counts;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups() {
        let counts = Counts {
            parameters: 2,
            outputs: 1,
            reals: 3,
            ..Default::default()
        };
        assert_eq!(counts.total(), 3);
        let text = counts.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Variability: Constant 0 Parameter 2"));
        assert!(lines[1].contains("Output 1"));
        assert!(lines[2].starts_with("Type: Real 3"));
    }
}
