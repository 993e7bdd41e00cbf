use anyhow::{Context, Result};
use dialoguer::console::Term;
use dialoguer::{Confirm, Input, Password};

/// Supplies login credentials and the report verbosity.
///
/// `username` returning `None` means no further login attempt is possible.
pub trait CredentialSource {
    fn username(&mut self) -> Result<Option<String>>;
    /// Never echoed back to the terminal.
    fn password(&mut self) -> Result<String>;
    fn verbose(&mut self) -> Result<bool>;
}

/// Interactive terminal prompts. Attempts are unlimited; the user quits with Ctrl-C.
pub struct TerminalPrompt {
    term: Term,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        TerminalPrompt { term: Term::stderr() }
    }

    /// Asks whether to export the results and, if so, under which name.
    pub fn save_target(&mut self) -> Result<Option<String>> {
        let save = Confirm::new()
            .with_prompt("Save results to a JSON file?")
            .default(false)
            .interact_on(&self.term)
            .context("Failed to read save choice")?;
        if !save {
            return Ok(None);
        }
        let name: String = Input::new()
            .with_prompt("File name")
            .default("grades.json".to_string())
            .interact_text_on(&self.term)
            .context("Failed to read file name")?;
        Ok(Some(name))
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for TerminalPrompt {
    fn username(&mut self) -> Result<Option<String>> {
        let username: String = Input::new()
            .with_prompt("Username")
            .interact_text_on(&self.term)
            .context("Failed to read username")?;
        Ok(Some(username.trim().to_string()))
    }

    fn password(&mut self) -> Result<String> {
        Password::new()
            .with_prompt("Password")
            .interact_on(&self.term)
            .context("Failed to read password")
    }

    fn verbose(&mut self) -> Result<bool> {
        Confirm::new()
            .with_prompt("Show every grade item?")
            .default(true)
            .interact_on(&self.term)
            .context("Failed to read verbosity choice")
    }
}

/// Credentials from the environment, offered for exactly one attempt.
pub struct EnvCredentials {
    username: Option<String>,
    password: String,
    verbose: bool,
}

impl EnvCredentials {
    pub fn new(username: String, password: String, verbose: bool) -> Self {
        EnvCredentials { username: Some(username), password, verbose }
    }
}

impl CredentialSource for EnvCredentials {
    fn username(&mut self) -> Result<Option<String>> {
        Ok(self.username.take())
    }

    fn password(&mut self) -> Result<String> {
        Ok(self.password.clone())
    }

    fn verbose(&mut self) -> Result<bool> {
        Ok(self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_credentials_allow_one_attempt() {
        let mut source = EnvCredentials::new("jdoe".into(), "pw".into(), false);
        assert_eq!(source.username().unwrap().as_deref(), Some("jdoe"));
        assert_eq!(source.password().unwrap(), "pw");
        assert_eq!(source.username().unwrap(), None);
        assert!(!source.verbose().unwrap());
    }
}
