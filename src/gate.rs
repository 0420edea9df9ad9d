//! Interactive gate in front of the DC operating-point sweep.
//!
//! The maximum-power sweep pushes the amplifier to its limits, so it never
//! starts without the operator explicitly confirming. An empty line
//! proceeds, the literal `!` aborts the whole session (through shutdown),
//! and anything else re-prompts. This is the only place the session checks
//! for cancellation.

use crate::error::BenchResult;
use std::io::{BufRead, Stdin, Stdout, Write};

/// Operator decision at the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Abort,
}

/// Blocking confirmation prompt. The session is a single sequential task,
/// so a synchronous read at this designated suspension point is fine.
pub trait OperatorGate: Send {
    fn confirm(&mut self, prompt: &str) -> BenchResult<GateDecision>;
}

/// Gate over arbitrary line-oriented input/output, so tests can script the
/// operator.
pub struct LineGate<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead + Send, W: Write + Send> OperatorGate for LineGate<R, W> {
    fn confirm(&mut self, prompt: &str) -> BenchResult<GateDecision> {
        writeln!(self.output, "{prompt}")?;
        writeln!(self.output, "Press Enter to continue, '!' to terminate.")?;
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;
            let mut line = String::new();
            let bytes = self.input.read_line(&mut line)?;
            if bytes == 0 {
                // EOF is not a confirmation: a closed stdin must never
                // launch the maximum-power sweep.
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "input closed before operator confirmation",
                )
                .into());
            }
            match line.trim_end_matches(['\r', '\n']) {
                "" => return Ok(GateDecision::Proceed),
                "!" => return Ok(GateDecision::Abort),
                other => {
                    writeln!(self.output, "Invalid input '{other}'. Press Enter to continue.")?;
                }
            }
        }
    }
}

/// Production gate over stdin/stdout.
pub type StdinGate = LineGate<std::io::BufReader<Stdin>, Stdout>;

impl StdinGate {
    pub fn stdin() -> Self {
        LineGate::new(std::io::BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

/// Gate that always proceeds, for unattended or mock runs.
pub struct AutoProceedGate;

impl OperatorGate for AutoProceedGate {
    fn confirm(&mut self, _prompt: &str) -> BenchResult<GateDecision> {
        Ok(GateDecision::Proceed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn gate_with_input(lines: &str) -> LineGate<Cursor<Vec<u8>>, Vec<u8>> {
        LineGate::new(Cursor::new(lines.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_empty_input_proceeds() {
        let mut gate = gate_with_input("\n");
        assert_eq!(
            gate.confirm("start?").unwrap(),
            GateDecision::Proceed
        );
    }

    #[test]
    fn test_bang_aborts() {
        let mut gate = gate_with_input("!\n");
        assert_eq!(gate.confirm("start?").unwrap(), GateDecision::Abort);
    }

    #[test]
    fn test_invalid_input_reprompts_then_proceeds() {
        let mut gate = gate_with_input("x\nx\n\n");
        let decision = gate.confirm("start?").unwrap();
        assert_eq!(decision, GateDecision::Proceed);

        let transcript = String::from_utf8(gate.output).unwrap();
        let reprompts = transcript.matches("Invalid input").count();
        assert_eq!(reprompts, 2, "expected exactly two re-prompts");
    }

    #[test]
    fn test_windows_line_endings_accepted() {
        let mut gate = gate_with_input("!\r\n");
        assert_eq!(gate.confirm("start?").unwrap(), GateDecision::Abort);
    }

    #[test]
    fn test_closed_input_is_an_error_not_a_confirmation() {
        let mut gate = gate_with_input("");
        assert!(matches!(
            gate.confirm("start?"),
            Err(crate::error::BenchError::Io(_))
        ));
    }

    #[test]
    fn test_eof_after_invalid_input_is_an_error() {
        let mut gate = gate_with_input("x\n");
        assert!(gate.confirm("start?").is_err());
    }
}
