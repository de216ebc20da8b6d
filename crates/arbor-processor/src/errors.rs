//! Deployment problem taxonomy and accumulation.
//!
//! Problems are collected into a list threaded through the phases instead of
//! being thrown at the first failure, so one run reports everything it found.
//! At designated checkpoints the accumulated list is converted: a single
//! problem becomes the error as-is, several are merged into one aggregate
//! whose message numbers each sub-problem.

use std::fmt;

use arbor_index::{AnnotationInstance, Type};

/// One structural or deployment-level problem.
#[derive(Debug, Clone)]
pub enum Problem {
    /// Structurally illegal declaration detected during discovery or init.
    Definition(String),
    /// Cross-cutting deployment-level problem found during validation.
    Deployment(String),
    /// No bean satisfies an injection point.
    UnsatisfiedResolution {
        required_type: Type,
        qualifiers: Vec<AnnotationInstance>,
        target: String,
        /// Beans that matched by type but missed a qualifier, for diagnostics.
        almost_matched: Vec<String>,
    },
    /// More than one bean survived ambiguity resolution.
    AmbiguousResolution {
        required_type: Type,
        qualifiers: Vec<AnnotationInstance>,
        target: String,
        candidates: Vec<String>,
    },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Definition(message) | Problem::Deployment(message) => f.write_str(message),
            Problem::UnsatisfiedResolution {
                required_type,
                qualifiers,
                target,
                almost_matched,
            } => {
                write!(
                    f,
                    "Unsatisfied dependency for type {required_type} and qualifiers {qualifiers:?}\n\t- injection target: {target}"
                )?;
                if !almost_matched.is_empty() {
                    f.write_str("\n\t- the following beans match by type, but none has matching qualifiers:")?;
                    for candidate in almost_matched {
                        write!(f, "\n\t\t- {candidate}")?;
                    }
                }
                Ok(())
            }
            Problem::AmbiguousResolution {
                required_type,
                qualifiers,
                target,
                candidates,
            } => {
                write!(
                    f,
                    "Ambiguous dependencies for type {required_type} and qualifiers {qualifiers:?}\n\t- injection target: {target}\n\t- available beans:"
                )?;
                for candidate in candidates {
                    write!(f, "\n\t\t- {candidate}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Problem {}

/// The failure returned from a checkpoint. The whole deployment fails
/// atomically; no partial bean model is usable once this is produced.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DeploymentError {
    message: String,
    problems: Vec<Problem>,
}

impl DeploymentError {
    pub(crate) fn from_problems(problems: Vec<Problem>) -> Self {
        debug_assert!(!problems.is_empty());
        let message = if problems.len() == 1 {
            problems[0].to_string()
        } else {
            let mut message = format!("Found {} deployment problems:", problems.len());
            for (idx, problem) in problems.iter().enumerate() {
                message.push_str(&format!("\n[{}] {}", idx + 1, problem));
            }
            message
        };
        Self { message, problems }
    }

    /// Every original problem this error was aggregated from.
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }
}

/// Accumulator threaded through discovery, init and validation.
#[derive(Debug, Default)]
pub struct Problems {
    problems: Vec<Problem>,
}

impl Problems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, problem: Problem) {
        self.problems.push(problem);
    }

    pub fn definition(&mut self, message: impl Into<String>) {
        self.problems.push(Problem::Definition(message.into()));
    }

    pub fn deployment(&mut self, message: impl Into<String>) {
        self.problems.push(Problem::Deployment(message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    /// Convert everything accumulated so far, failing when non-empty.
    pub fn checkpoint(&mut self) -> Result<(), DeploymentError> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(DeploymentError::from_problems(std::mem::take(&mut self.problems)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_problem_is_passed_through() {
        let mut problems = Problems::new();
        problems.definition("bad bean");
        let err = problems.checkpoint().unwrap_err();
        assert_eq!(err.to_string(), "bad bean");
        assert_eq!(err.problems().len(), 1);
    }

    #[test]
    fn multiple_problems_are_numbered() {
        let mut problems = Problems::new();
        problems.definition("first");
        problems.deployment("second");
        let err = problems.checkpoint().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Found 2 deployment problems:"));
        assert!(message.contains("[1] first"));
        assert!(message.contains("[2] second"));
    }

    #[test]
    fn checkpoint_resets_the_accumulator() {
        let mut problems = Problems::new();
        problems.definition("only");
        let _ = problems.checkpoint();
        assert!(problems.checkpoint().is_ok());
    }
}
