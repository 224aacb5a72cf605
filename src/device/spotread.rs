use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::config::MeterConfig;
use crate::device::Colorimeter;
use crate::error::{CalError, CalResult};
use crate::types::XY;

/// Byte that triggers one reading.
pub const TRIGGER: &[u8] = b" ";

/// Bytes that make the meter quit.
pub const QUIT: &[u8] = b"qq";

/// Extract x and y from a response line, if it carries `marker`.
///
/// Fields after the marker are whitespace separated; the second and third are
/// the chromaticity coordinates (the first is luminance).
pub fn parse_response(line: &str, marker: &str) -> Option<CalResult<XY>> {
    let (_, rest) = line.split_once(marker)?;
    Some(parse_fields(rest, line))
}

fn parse_fields(rest: &str, line: &str) -> CalResult<XY> {
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let field = |index: usize| -> CalResult<f64> {
        let text = fields
            .get(index - 1)
            .ok_or_else(|| CalError::MissingField(index, line.trim_end().to_string()))?;
        Ok(text.parse()?)
    };

    let (x, y) = (field(2)?, field(3)?);
    let xy = XY::new(x, y);
    if xy.is_valid() {
        Ok(xy)
    } else {
        Err(CalError::InvalidChromaticity(x, y))
    }
}

/// Line-oriented meter driver in the style of ArgyllCMS `spotread`.
pub struct Spotread<W, R> {
    input: W,
    output: R,
    marker: String,
    child: Option<Child>,
    line: String,
}

impl Spotread<ChildStdin, BufReader<ChildStdout>> {
    pub fn spawn(conf: &MeterConfig) -> CalResult<Self> {
        let mut child = Command::new(&conf.command)
            .args(&conf.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| CalError::Spawn(conf.command.clone(), e))?;

        log::info!("Started meter [{}] (pid {})", conf.command, child.id());

        let (Some(input), Some(output)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(CalError::Spawn(
                conf.command.clone(),
                std::io::Error::other("missing stdio pipes"),
            ));
        };

        let mut meter = Self::new(input, BufReader::new(output), &conf.marker);
        meter.child = Some(child);
        Ok(meter)
    }
}

impl<W: Write, R: BufRead> Spotread<W, R> {
    pub fn new(input: W, output: R, marker: &str) -> Self {
        Self {
            input,
            output,
            marker: marker.to_string(),
            child: None,
            line: String::new(),
        }
    }

    fn send(&mut self, bytes: &[u8]) -> CalResult<()> {
        let written = self.input.write(bytes)?;
        if written != bytes.len() {
            return Err(CalError::ShortWrite {
                expected: bytes.len(),
                written,
            });
        }
        self.input.flush()?;
        Ok(())
    }
}

impl<W: Write, R: BufRead> Colorimeter for Spotread<W, R> {
    fn measure(&mut self) -> CalResult<XY> {
        self.send(TRIGGER)?;

        loop {
            self.line.clear();
            if self.output.read_line(&mut self.line)? == 0 {
                return Err(CalError::UnexpectedEof);
            }

            if let Some(res) = parse_response(&self.line, &self.marker) {
                return res;
            }
            log::trace!("meter: {}", self.line.trim_end());
        }
    }

    fn shutdown(&mut self) -> CalResult<()> {
        self.send(QUIT)?;

        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            if !status.success() {
                return Err(CalError::MeterExit(status));
            }
            log::debug!("Meter exited cleanly");
        }
        Ok(())
    }
}
