//! Command line options.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub config: Option<PathBuf>,
    /// Stored frame size
    pub source: (u32, u32),
    /// Size the decoder asks the frame to be shown at
    pub display: Option<(u32, u32)>,
    pub fps: f32,
    pub frames: u32,
    pub gpu: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config: None,
            source: (720, 576),
            display: None,
            fps: 25.0,
            frames: 50,
            gpu: false,
        }
    }
}

pub const USAGE: &str =
    "usage: framestage [config.json] [--source WxH] [--display WxH] [--fps F] [--frames N] [--gpu]";

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .with_context(|| format!("expected WxH, got {:?}", value))?;
    let w = w.trim().parse().with_context(|| format!("bad width in {:?}", value))?;
    let h = h.trim().parse().with_context(|| format!("bad height in {:?}", value))?;
    Ok((w, h))
}

impl Options {
    /// Parse arguments, program name excluded.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            let mut value = |name: &str| args.next().with_context(|| format!("{} needs a value", name));
            match arg.as_str() {
                "--source" => options.source = parse_size(&value("--source")?)?,
                "--display" => options.display = Some(parse_size(&value("--display")?)?),
                "--fps" => {
                    let v = value("--fps")?;
                    options.fps = v.parse().with_context(|| format!("bad fps {:?}", v))?;
                }
                "--frames" => {
                    let v = value("--frames")?;
                    options.frames = v.parse().with_context(|| format!("bad frame count {:?}", v))?;
                }
                "--gpu" => options.gpu = true,
                "-h" | "--help" => bail!(USAGE),
                other if other.starts_with("--") => bail!("unknown option {}\n{}", other, USAGE),
                path => {
                    if options.config.is_some() {
                        bail!("more than one config file given\n{}", USAGE);
                    }
                    options.config = Some(PathBuf::from(path));
                }
            }
        }
        Ok(options)
    }

    /// Display size, defaulting to the stored size.
    pub fn display_size(&self) -> (u32, u32) {
        self.display.unwrap_or(self.source)
    }
}
