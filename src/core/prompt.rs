use crate::models::credential::{AuthError, AuthResult};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Blocking interactive input used by the credential gate
pub trait Prompt {
    /// Show `question` and read one line of input, without its line terminator
    fn ask(&mut self, question: &str) -> AuthResult<String>;

    /// Show a message to the user
    fn tell(&mut self, message: &str);
}

/// Line-based prompt over any reader/writer pair; `StdioPrompt::stdin()` for the terminal
pub struct StdioPrompt<R, W> {
    input: R,
    output: W,
}

impl StdioPrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StdioPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompt for StdioPrompt<R, W> {
    fn ask(&mut self, question: &str) -> AuthResult<String> {
        write!(self.output, "{}", question)
            .and_then(|_| self.output.flush())
            .map_err(|e| AuthError::PromptFailed(e.to_string()))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| AuthError::PromptFailed(e.to_string()))?;

        if read == 0 {
            return Err(AuthError::PromptClosed);
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn tell(&mut self, message: &str) {
        let _ = writeln!(self.output, "{}", message);
    }
}

/// Prompt that replays a fixed list of answers and records everything shown.
/// Fails with `PromptClosed` once the answers run out.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub questions: Vec<String>,
    pub messages: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            questions: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> AuthResult<String> {
        self.questions.push(question.to_string());
        self.answers.pop_front().ok_or(AuthError::PromptClosed)
    }

    fn tell(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
