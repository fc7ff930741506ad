//! Response classification.
//!
//! A [`Classifier`] turns the free-text lines a device returns for one
//! command into `Ok(())` or a typed [`Error`]. Rules are tested in the order
//! they were added; the first that matches decides. When no rule matches,
//! the fallback (if any) decides.

use regex::Regex;

use crate::error::{DriverError, Error, Result};

/// Builds the error for a failed command from its reply lines.
type Failure = Box<dyn FnOnce(&[String]) -> Error + Send>;

/// How a rule recognises a line. Matching is case-sensitive.
#[derive(Debug, Clone)]
pub enum Matcher {
    Prefix(String),
    Contains(String),
    Regex(Regex),
}

impl Matcher {
    pub fn prefix(text: impl Into<String>) -> Self {
        Matcher::Prefix(text.into())
    }

    pub fn contains(text: impl Into<String>) -> Self {
        Matcher::Contains(text.into())
    }

    pub fn regex(pattern: &Regex) -> Self {
        Matcher::Regex(pattern.clone())
    }

    pub fn matches(&self, line: &str) -> bool {
        match self {
            Matcher::Prefix(text) => line.starts_with(text.as_str()),
            Matcher::Contains(text) => line.contains(text.as_str()),
            Matcher::Regex(re) => re.is_match(line),
        }
    }
}

enum Outcome {
    Accept,
    Fail(Failure),
}

struct Rule {
    matcher: Matcher,
    any_line: bool,
    outcome: Outcome,
}

impl Rule {
    fn matches(&self, lines: &[String]) -> bool {
        if self.any_line {
            lines.iter().any(|line| self.matcher.matches(line))
        } else {
            lines.first().is_some_and(|line| self.matcher.matches(line))
        }
    }
}

struct Fallback {
    failure: Failure,
    when_empty: bool,
}

/// Ordered set of rules applied to one command's reply.
#[derive(Default)]
pub struct Classifier {
    rules: Vec<Rule>,
    fallback: Option<Fallback>,
}

impl Classifier {
    /// A classifier with no rules accepts every reply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `failure` when the first line matches.
    pub fn on_result_matching<F>(mut self, matcher: Matcher, failure: F) -> Self
    where
        F: FnOnce(&[String]) -> Error + Send + 'static,
    {
        self.rules.push(Rule {
            matcher,
            any_line: false,
            outcome: Outcome::Fail(Box::new(failure)),
        });
        self
    }

    /// Fail with `failure` when any line matches.
    pub fn on_any_line_matching<F>(mut self, matcher: Matcher, failure: F) -> Self
    where
        F: FnOnce(&[String]) -> Error + Send + 'static,
    {
        self.rules.push(Rule {
            matcher,
            any_line: true,
            outcome: Outcome::Fail(Box::new(failure)),
        });
        self
    }

    /// Treat a reply whose first line matches as success.
    pub fn accept(mut self, matcher: Matcher) -> Self {
        self.rules.push(Rule {
            matcher,
            any_line: false,
            outcome: Outcome::Accept,
        });
        self
    }

    /// Fail with `failure` when nothing matched and some line is non-empty.
    pub fn on_any_result<F>(mut self, failure: F) -> Self
    where
        F: FnOnce(&[String]) -> Error + Send + 'static,
    {
        self.fallback = Some(Fallback {
            failure: Box::new(failure),
            when_empty: false,
        });
        self
    }

    /// Succeed only when the first line matches, failing otherwise, including
    /// on an empty reply.
    pub fn expect<F>(self, matcher: Matcher, failure: F) -> Self
    where
        F: FnOnce(&[String]) -> Error + Send + 'static,
    {
        let mut classifier = self.accept(matcher);
        classifier.fallback = Some(Fallback {
            failure: Box::new(failure),
            when_empty: true,
        });
        classifier
    }

    /// Fallback that reports any unexpected output as a failed command.
    pub fn unexpected_output(command: impl Into<String>) -> Self {
        let command = command.into();
        Self::new().on_any_result(move |lines| {
            DriverError::CommandFailed {
                command,
                output: lines.join("\n"),
            }
            .into()
        })
    }

    /// Apply the rules to `lines`.
    pub fn check(self, lines: &[String]) -> Result<()> {
        for rule in self.rules {
            if rule.matches(lines) {
                return match rule.outcome {
                    Outcome::Accept => Ok(()),
                    Outcome::Fail(failure) => Err(failure(lines)),
                };
            }
        }

        match self.fallback {
            Some(fallback) if fallback.when_empty || has_output(lines) => {
                Err((fallback.failure)(lines))
            }
            _ => Ok(()),
        }
    }
}

/// Whether any line carries non-whitespace text.
pub fn has_output(lines: &[String]) -> bool {
    lines.iter().any(|line| !line.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, SwitchError};

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    fn bad_number(_: &[String]) -> Error {
        SwitchError::BadVlanNumber { number: 5000 }.into()
    }

    fn bad_name(_: &[String]) -> Error {
        SwitchError::BadVlanName {
            name: "x".to_string(),
        }
        .into()
    }

    #[test]
    fn test_empty_classifier_accepts_anything() {
        assert!(Classifier::new().check(&lines(&["whatever"])).is_ok());
        assert!(Classifier::new().check(&[]).is_ok());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let classifier = Classifier::new()
            .on_result_matching(Matcher::prefix("Error:"), bad_number)
            .on_any_result(bad_name);

        let err = classifier
            .check(&lines(&["Error: vlan 5000 is outside allowed range"]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Switch(SwitchError::BadVlanNumber { number: 5000 })
        ));
    }

    #[test]
    fn test_fallback_only_on_non_empty_output() {
        let make = || Classifier::new().on_any_result(bad_name);

        assert!(make().check(&[]).is_ok());
        assert!(make().check(&lines(&["", "  "])).is_ok());

        let err = make().check(&lines(&["Invalid input -> name"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_rules_only_look_at_first_line() {
        let classifier =
            Classifier::new().on_result_matching(Matcher::contains("Invalid input"), bad_number);
        assert!(classifier
            .check(&lines(&["ok", "Invalid input -> 9/999"]))
            .is_ok());

        let classifier =
            Classifier::new().on_any_line_matching(Matcher::contains("Invalid input"), bad_number);
        assert!(classifier
            .check(&lines(&["ok", "Invalid input -> 9/999"]))
            .is_err());
    }

    #[test]
    fn test_accept_short_circuits_fallback() {
        let classifier = Classifier::new()
            .accept(Matcher::prefix("Warning:"))
            .on_any_result(bad_name);
        assert!(classifier
            .check(&lines(&["Warning: ACL does not exist yet"]))
            .is_ok());
    }

    #[test]
    fn test_expect_fails_on_empty_reply() {
        let make = || {
            Classifier::new().expect(Matcher::prefix("Added"), |_| {
                SwitchError::UnknownInterface {
                    interface: "ethernet 9/9".to_string(),
                }
                .into()
            })
        };

        assert!(make()
            .check(&lines(&["Added untagged port(s) ethe 1/1 to port-vlan 10."]))
            .is_ok());
        assert_eq!(make().check(&[]).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            make().check(&lines(&["Invalid input -> 9/9"])).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_regex_matcher() {
        let re = Regex::new(r"^Error - VRF\(.*\) does not exist").unwrap();
        let classifier = Classifier::new().on_result_matching(Matcher::regex(&re), |_| {
            SwitchError::UnknownVrf {
                name: "BLUE".to_string(),
            }
            .into()
        });
        let err = classifier
            .check(&lines(&["Error - VRF(BLUE) does not exist or Route-Distinguisher not specified or Address Family not configured"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "VRF name \"BLUE\" was not configured.");
    }

    #[test]
    fn test_unexpected_output_reports_command() {
        let err = Classifier::unexpected_output("write memory")
            .check(&lines(&["Flash write failed"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Driver error: Command 'write memory' failed: Flash write failed"
        );
    }
}
