//! Cucumber step definitions.

use cucumber::gherkin::Step;

pub mod given;
pub mod then;
pub mod when;

pub trait StepExt {
    /// Non-empty, trimmed lines of the step's docstring.
    fn docstring_lines(&self) -> Option<Vec<String>>;
}

impl StepExt for Step {
    fn docstring_lines(&self) -> Option<Vec<String>> {
        self.docstring.as_ref().map(|docstring| {
            docstring
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect()
        })
    }
}
