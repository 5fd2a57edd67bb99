//! Terminal operator
//!
//! Prompts go to stderr so they interleave with log output and leave stdout
//! for command results. Reads block the calling thread; they only happen
//! between network calls, never while one is in flight.

use std::io::{BufRead, BufReader, Stderr, Stdin, Write};
use std::sync::Mutex;

use session::Operator;

/// Invalid menu answers tolerated before `select` gives up.
const MAX_MENU_TRIES: u32 = 3;

pub struct ConsoleOperator<R, W> {
    io: Mutex<(R, W)>,
}

impl ConsoleOperator<BufReader<Stdin>, Stderr> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }

    /// Show `prompt`, read one line. `None` on EOF or a read error.
    fn ask(&self, prompt: &str) -> Option<String> {
        let mut io = self.io.lock().ok()?;
        let (reader, writer) = &mut *io;
        // Prompt display is best-effort; the read decides the outcome.
        let _ = write!(writer, "{prompt}: ");
        let _ = writer.flush();

        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn say(&self, text: &str) {
        if let Ok(mut io) = self.io.lock() {
            let _ = writeln!(io.1, "{text}");
        }
    }
}

impl<R, W> Operator for ConsoleOperator<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn prompt_line(&self, prompt: &str) -> Option<String> {
        self.ask(prompt)
    }

    fn confirm(&self, prompt: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let Some(answer) = self.ask(&format!("{prompt} {hint}")) else {
            return default;
        };
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        }
    }

    fn select(&self, prompt: &str, options: &[String]) -> Option<usize> {
        if options.is_empty() {
            return None;
        }
        self.say(prompt);
        for (i, option) in options.iter().enumerate() {
            self.say(&format!("  {}) {option}", i + 1));
        }
        for _ in 0..MAX_MENU_TRIES {
            let answer = self.ask(&format!("Choose 1-{}", options.len()))?;
            match answer.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Some(n - 1),
                _ => self.say("Invalid choice"),
            }
        }
        None
    }
}
