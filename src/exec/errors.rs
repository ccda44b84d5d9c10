use colored::Colorize;

use super::Error;

/// Failures collected while carrying on with independent work.
pub struct Errors {
    errors: Vec<anyhow::Error>,
}

impl Default for Errors {
    fn default() -> Self {
        Self {
            // ideally we won't have any,
            // and we don't mind reallocating if we're already in an error state:
            errors: Vec::with_capacity(0),
        }
    }
}

impl Errors {
    pub fn add_context(&mut self, e: anyhow::Error, msg: String) {
        log::trace!("{msg}: {e:?}");
        self.errors.push(e.context(msg));
    }

    /// Print full list of errors to stderr, fail w/ an aggregated error
    /// if there were one or more errors.
    pub fn print_recap(&self, label: &str) -> Result<(), Error> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            eprintln!("\nEncountered errors while {label}:\n");
            for e in &self.errors {
                eprintln!("{}: {e:?}\n", "ERROR".red());
            }
            Err(Error::AggregatedErrors(label.to_owned(), self.errors.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recap() {
        let mut errors = Errors::default();
        assert!(errors.print_recap("running pipeline").is_ok());

        errors.add_context(anyhow::anyhow!("disk full"), "in step 'a'".to_owned());
        errors.add_context(anyhow::anyhow!("no input"), "in step 'b'".to_owned());
        let recap = errors.print_recap("running pipeline").err().map(|e| e.to_string());
        assert_eq!(
            recap.as_deref(),
            Some("running pipeline failed due to 2 errors")
        );
    }
}
