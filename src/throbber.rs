//! Console progress indicator shown while a completion is outstanding.
//!
//! [`Throbber::spin`] never returns: its output type is [`Infallible`], so a
//! race can only ever cancel it. Every frame is followed by a tokio sleep,
//! which is where cancellation takes effect.

use std::convert::Infallible;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

const ASCII_FRAMES: &[&str] = &["|", "/", "-", "-", "\\"];
const TRIANGLE_FRAMES: &[&str] = &["◢", "◣", "◤", "◥"];

/// Floor applied to the frame interval so the loop always yields to the runtime.
const MIN_FRAME_TIME: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrobberStyle {
    Ascii,
    Triangles,
}

impl ThrobberStyle {
    pub fn frames(self) -> &'static [&'static str] {
        match self {
            ThrobberStyle::Ascii => ASCII_FRAMES,
            ThrobberStyle::Triangles => TRIANGLE_FRAMES,
        }
    }
}

impl fmt::Display for ThrobberStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThrobberStyle::Ascii => f.write_str("ascii"),
            ThrobberStyle::Triangles => f.write_str("triangles"),
        }
    }
}

impl FromStr for ThrobberStyle {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascii" => Ok(ThrobberStyle::Ascii),
            "triangles" => Ok(ThrobberStyle::Triangles),
            other => Err(AppError::Config(format!(
                "unknown throbber style '{other}' (expected ascii or triangles)"
            ))),
        }
    }
}

// ── Throbber ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Throbber {
    enabled: bool,
    frames: &'static [&'static str],
    frame_time: Duration,
}

impl Throbber {
    pub fn new(style: ThrobberStyle, frame_time: Duration) -> Self {
        Self {
            enabled: true,
            frames: style.frames(),
            frame_time: frame_time.max(MIN_FRAME_TIME),
        }
    }

    /// A throbber that renders nothing but still occupies its slot in a race.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            frames: ASCII_FRAMES,
            frame_time: MIN_FRAME_TIME,
        }
    }

    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    /// Render frames to `out` forever, one per `frame_time`.
    ///
    /// Write errors are ignored: a closed console must not end a race.
    pub async fn spin<W: Write>(&self, mut out: W) -> Infallible {
        if !self.enabled {
            return std::future::pending().await;
        }
        loop {
            for frame in self.frames {
                let _ = write!(out, " [{frame}]\r");
                let _ = out.flush();
                tokio::time::sleep(self.frame_time).await;
            }
        }
    }

    /// Blank out whatever frame was last drawn.
    pub fn clear<W: Write>(&self, mut out: W) {
        if self.enabled {
            let _ = write!(out, "{:width$}\r", "", width = 6);
            let _ = out.flush();
        }
    }
}
