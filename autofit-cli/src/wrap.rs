//! Embed arbitrary text in a Go source file as a raw string literal.

use std::io::{self, BufRead, Write};

/// What [`wrap_source`] copied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WrapStats {
    pub lines: usize,
    pub bytes: usize,
    /// Lines containing a backtick. These terminate the raw string early, so
    /// the generated file will not compile.
    pub backtick_lines: usize,
}

/// Write `package main` declaring `var_name` as a raw string holding all of
/// `reader`, copied byte for byte.
pub fn wrap_source<R: BufRead, W: Write>(
    var_name: &str,
    mut reader: R,
    mut writer: W,
) -> io::Result<WrapStats> {
    write!(writer, "package main\n\nvar {var_name} = `\n")?;

    let mut stats = WrapStats::default();
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            break;
        }
        if line.contains(&b'`') {
            stats.backtick_lines += 1;
        }
        stats.lines += 1;
        stats.bytes += n;
        writer.write_all(&line)?;
    }

    writer.write_all(b"\n`\n")?;
    writer.flush()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn wrap(var: &str, input: &str) -> (String, WrapStats) {
        let mut out = Vec::new();
        let stats = wrap_source(var, input.as_bytes(), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn test_wraps_lines() {
        let (out, stats) = wrap("payload", "foo\nbar\n");
        assert_eq!(out, "package main\n\nvar payload = `\nfoo\nbar\n\n`\n");
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.bytes, 8);
        assert_eq!(stats.backtick_lines, 0);
    }

    #[test]
    fn test_empty_input() {
        let (out, stats) = wrap("empty", "");
        assert_eq!(out, "package main\n\nvar empty = `\n\n`\n");
        assert_eq!(stats, WrapStats::default());
    }

    #[test]
    fn test_last_line_without_newline_kept() {
        let (out, stats) = wrap("v", "a\nb");
        assert_eq!(out, "package main\n\nvar v = `\na\nb\n`\n");
        assert_eq!(stats.lines, 2);
    }

    #[test]
    fn test_backticks_counted_not_escaped() {
        let (out, stats) = wrap("v", "ok\nbad ` tick\n``\n");
        assert!(out.contains("bad ` tick\n``\n"));
        assert_eq!(stats.backtick_lines, 2);
    }

    #[test]
    fn test_non_utf8_bytes_pass_through() {
        let mut out = Vec::new();
        wrap_source("v", &[0xff, 0xfe, b'\n'][..], &mut out).unwrap();
        assert!(out.windows(3).any(|w| w == [0xff, 0xfe, b'\n']));
    }
}
