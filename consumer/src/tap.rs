use std::io::{self, BufRead, Write};

use frame_tap_common::hex::HexMode;
use tracing::{debug, warn};

use crate::filter::traits::FrameFilter;

/// Line counts for one run of the tap.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TapStats {
    pub lines: u64,
    pub shown: u64,
    pub hidden: u64,
    /// Lines rejected by the strict hex decoder.
    pub undecodable: u64,
}

/// Where each input line ends up.
pub struct Sink<O, D> {
    echo: O,
    diagnostic: D,
    separator: String,
}

impl<O: Write, D: Write> Sink<O, D> {
    pub fn new(echo: O, diagnostic: D, separator: impl Into<String>) -> Self {
        Self {
            echo,
            diagnostic,
            separator: separator.into(),
        }
    }

    /// Pass the raw line through to the echo stream.
    pub fn echo(&mut self, raw: &[u8]) -> io::Result<()> {
        self.echo.write_all(raw)?;
        self.echo.write_all(b"\n")?;
        self.echo.flush()
    }

    /// Separator line followed by the decoded frame.
    pub fn record(&mut self, frame: &str) -> io::Result<()> {
        writeln!(self.diagnostic, "{}", self.separator)?;
        writeln!(self.diagnostic, "{frame}")?;
        self.diagnostic.flush()
    }
}

/// Read hex lines from `input` until it ends, echoing each one and recording
/// the frames `filter` lets through.
///
/// Undecodable lines and malformed frames never stop the loop; only a failing
/// read or write does.
pub fn run_tap<R, O, D, F>(
    mut input: R,
    sink: &mut Sink<O, D>,
    filter: &mut F,
    hex_mode: HexMode,
) -> io::Result<TapStats>
where
    R: BufRead,
    O: Write,
    D: Write,
    F: FrameFilter + ?Sized,
{
    let mut stats = TapStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        // A lone `\r` also ends a line; `\r\n` is a single terminator.
        for raw in trim_line_ending(&buf).split(|&b| b == b'\r') {
            process_line(raw, sink, filter, hex_mode, &mut stats)?;
        }
    }

    Ok(stats)
}

fn process_line<O, D, F>(
    raw: &[u8],
    sink: &mut Sink<O, D>,
    filter: &mut F,
    hex_mode: HexMode,
    stats: &mut TapStats,
) -> io::Result<()>
where
    O: Write,
    D: Write,
    F: FrameFilter + ?Sized,
{
    stats.lines += 1;
    sink.echo(raw)?;

    let line = String::from_utf8_lossy(raw);
    let frame = match hex_mode.decode(&line) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, line = stats.lines, "undecodable line, not classified");
            stats.undecodable += 1;
            return Ok(());
        }
    };

    if filter.should_output(&frame) {
        stats.shown += 1;
        sink.record(&frame)?;
    } else {
        stats.hidden += 1;
    }

    if stats.lines % 100 == 0 {
        debug!(lines = stats.lines, filter = filter.name(), "lines processed");
    }
    Ok(())
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::suppression::SuppressionFilter;
    use frame_tap_common::hex::encode;

    const SEP: &str = "===================";

    fn run(input: &str, mode: HexMode) -> (String, String, TapStats) {
        let mut sink = Sink::new(Vec::new(), Vec::new(), SEP);
        let mut filter = SuppressionFilter::new("/api");
        let stats = run_tap(input.as_bytes(), &mut sink, &mut filter, mode).unwrap();
        (
            String::from_utf8(sink.echo).unwrap(),
            String::from_utf8(sink.diagnostic).unwrap(),
            stats,
        )
    }

    #[test]
    fn echoes_every_line_and_records_shown_frames() {
        let lines = [
            encode("1 T1\nGET /other HTTP/1.1"),
            encode("2 T1\nBODY"),
            encode("1 T2\nGET /api/x HTTP/1.1"),
            encode("3 T2\nREPLAY"),
        ];
        let input = lines.join("\n") + "\n";

        let (echo, diagnostic, stats) = run(&input, HexMode::Lossy);

        assert_eq!(echo, input);
        assert_eq!(
            diagnostic,
            format!("{SEP}\n1 T2\nGET /api/x HTTP/1.1\n{SEP}\n3 T2\nREPLAY\n")
        );
        assert_eq!(
            stats,
            TapStats {
                lines: 4,
                shown: 2,
                hidden: 2,
                undecodable: 0
            }
        );
    }

    #[test]
    fn last_line_without_newline_is_processed() {
        let input = encode("2 T9\nBODY");
        let (echo, diagnostic, stats) = run(&input, HexMode::Lossy);
        assert_eq!(echo, format!("{input}\n"));
        assert_eq!(diagnostic, format!("{SEP}\n2 T9\nBODY\n"));
        assert_eq!(stats.lines, 1);
    }

    #[test]
    fn crlf_input_is_echoed_without_carriage_return() {
        let line = encode("3 T1\nX");
        let (echo, diagnostic, _) = run(&format!("{line}\r\n"), HexMode::Lossy);
        assert_eq!(echo, format!("{line}\n"));
        assert_eq!(diagnostic, format!("{SEP}\n3 T1\nX\n"));
    }

    #[test]
    fn bare_carriage_return_splits_lines() {
        let first = encode("3 T1\nX");
        let second = encode("2 T2\nY");
        let (echo, diagnostic, stats) = run(&format!("{first}\r{second}\n"), HexMode::Lossy);
        assert_eq!(echo, format!("{first}\n{second}\n"));
        assert_eq!(diagnostic, format!("{SEP}\n3 T1\nX\n{SEP}\n2 T2\nY\n"));
        assert_eq!(stats.lines, 2);
    }

    #[test]
    fn carriage_return_before_crlf_leaves_empty_line() {
        let (echo, _, stats) = run("41\r\r\n", HexMode::Lossy);
        assert_eq!(echo, "41\n\n");
        assert_eq!(stats.lines, 2);
    }

    #[test]
    fn strict_mode_skips_bad_lines_but_keeps_going() {
        let good = encode("2 T1\nBODY");
        let input = format!("41zz\n{good}\n");
        let (echo, diagnostic, stats) = run(&input, HexMode::Strict);
        assert_eq!(echo, input);
        assert_eq!(diagnostic, format!("{SEP}\n2 T1\nBODY\n"));
        assert_eq!(stats.undecodable, 1);
        assert_eq!(stats.shown, 1);
    }

    #[test]
    fn lossy_mode_shows_garbage_as_malformed() {
        let (echo, diagnostic, stats) = run("zz\n", HexMode::Lossy);
        assert_eq!(echo, "zz\n");
        assert_eq!(diagnostic, format!("{SEP}\n\0\n"));
        assert_eq!(stats.shown, 1);
    }

    #[test]
    fn empty_input() {
        let (echo, diagnostic, stats) = run("", HexMode::Lossy);
        assert!(echo.is_empty());
        assert!(diagnostic.is_empty());
        assert_eq!(stats, TapStats::default());
    }
}
