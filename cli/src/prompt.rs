use std::io::{self, BufRead, Write};

/// Line-oriented questions for arguments left off the command line.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }

    /// Ask once and return the trimmed answer.
    pub fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            ));
        }
        Ok(line.trim().to_string())
    }

    /// Ask until the answer (case-insensitive) names one of `options`.
    pub fn choose<T: Copy>(
        &mut self,
        prompt: &str,
        options: &[(&str, T)],
    ) -> io::Result<T> {
        loop {
            let answer = self.ask(prompt)?.to_lowercase();
            if let Some((_, value)) =
                options.iter().find(|(name, _)| *name == answer)
            {
                return Ok(*value);
            }
            let names: Vec<_> = options.iter().map(|(name, _)| *name).collect();
            self.say(&format!(
                "Invalid choice. Please select one of {}.",
                names.join(", ")
            ))?;
        }
    }
}
