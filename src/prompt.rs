use std::io::{BufRead, Write};

use crate::error::AppError;

/// Upper bound on repositories removed in one run
pub const MAX_DELETE_COUNT: i64 = 50;

/// Ask for the number of repositories to delete until the operator confirms one.
///
/// Non-numeric input re-prompts for a number and any answer other than `y`
/// to the confirmation re-prompts from the start. If input ends before a
/// confirmation the count stays at 0. The confirmed count must lie in
/// `(0, MAX_DELETE_COUNT]`.
pub fn confirm_deletion_count<R: BufRead, W: Write>(mut input: R, out: &mut W) -> Result<usize, AppError> {
    let mut count = 0;

    write!(out, "\nNumber of repositories to delete: ")?;
    out.flush()?;
    while let Some(line) = read_line(&mut input)? {
        let number = match line.trim().parse::<i64>() {
            Ok(number) => number,
            Err(_) => {
                write!(out, "Not a valid number, please enter again: ")?;
                out.flush()?;
                continue;
            }
        };
        writeln!(out, "You entered: {}", number)?;
        write!(out, "Confirm [y/n]: ")?;
        out.flush()?;

        let Some(answer) = read_line(&mut input)? else {
            break;
        };
        if answer.trim().eq_ignore_ascii_case("y") {
            count = number;
            break;
        }
        write!(out, "Please enter the number of repositories to delete again: ")?;
        out.flush()?;
    }

    validate_count(count)
}

/// Next line of input, `None` at end of input. Bytes that are not UTF-8 are
/// replaced so a garbled line is treated like any other unparsable answer.
fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

pub fn validate_count(count: i64) -> Result<usize, AppError> {
    if count <= 0 || count > MAX_DELETE_COUNT {
        return Err(AppError::CountOutOfRange(count));
    }
    Ok(count as usize)
}
