use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};

use crate::speech::sink::SpeechSink;

/// Sink that delegates to an external synthesizer command.
///
/// The text is appended as the final argument, e.g. `espeak-ng <text>` or
/// `say <text>`. Waiting on the child process is what makes `speak` block
/// until the utterance completes.
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    pub fn new(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("speech command must not be empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl SpeechSink for CommandSpeech {
    fn name(&self) -> &'static str {
        "command"
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .with_context(|| format!("failed to run speech command {}", self.program))?;

        if !status.success() {
            return Err(anyhow!(
                "speech command {} exited with {}",
                self.program,
                status
            ));
        }
        Ok(())
    }
}
