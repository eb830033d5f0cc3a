//! Yes/no confirmation.

use std::io::{self, BufRead, Write};

/// Ask `message` and read one answer line.
///
/// Only `y` or `yes` (any case) confirm. End of input declines.
pub fn ask_for_yn<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> io::Result<bool> {
    write!(output, "{} [y/N]: ", message)?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }

    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// Ask on the terminal
pub fn confirm(message: &str) -> io::Result<bool> {
    ask_for_yn(&mut io::stdin().lock(), &mut io::stdout().lock(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(answer: &str) -> (bool, String) {
        let mut out = Vec::new();
        let yes = ask_for_yn(&mut answer.as_bytes(), &mut out, "Continue?").unwrap();
        (yes, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_accepts_yes() {
        assert_eq!(ask("y\n"), (true, "Continue? [y/N]: ".to_string()));
        assert!(ask("YES\n").0);
        assert!(ask("  Yes  \n").0);
    }

    #[test]
    fn test_declines_everything_else() {
        assert!(!ask("n\n").0);
        assert!(!ask("\n").0);
        assert!(!ask("yep\n").0);
    }

    #[test]
    fn test_end_of_input_declines() {
        assert_eq!(ask(""), (false, "Continue? [y/N]: \n".to_string()));
    }
}
