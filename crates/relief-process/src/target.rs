//! Build targets: a named unit of work resolved to a command line

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::config::ProcessConfig;

/// Makefile every generated project carries
pub const MAKEFILE_NAME: &str = "Makefile";

/// A named, fully resolved invocation of an external tool.
///
/// Targets are immutable once built; the builder methods consume `self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    name: String,
    program: String,
    args: Vec<String>,
}

impl BuildTarget {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `make -f Makefile <goal>` under the given target name
    pub fn make(name: impl Into<String>, goal: impl Into<String>) -> Self {
        Self::new(name, "make").args(["-f".to_string(), MAKEFILE_NAME.to_string(), goal.into()])
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Shell-style rendering used in logs and status lines
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn process_config(
        &self,
        environment: &HashMap<String, String>,
        working_dir: &Path,
    ) -> ProcessConfig {
        ProcessConfig::new(self.program.clone())
            .args(self.args.iter().cloned())
            .working_dir(working_dir)
            .envs(environment)
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.command_line())
    }
}
