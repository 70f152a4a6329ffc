// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Simulator dialect/version tag.
///
/// Several flavours may point at the same installed binary (e.g. `Xyce78` and
/// `Xyce` when only Xyce 7.8 is installed). The numeric values match the
/// `Flavour` enum on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub enum Flavour {
    #[serde(rename = "ngspice")]
    Ngspice,
    #[serde(rename = "xyce")]
    Xyce,
    #[serde(rename = "hspice")]
    Hspice,
    #[serde(rename = "spectre")]
    Spectre,
    #[serde(rename = "xyce_7_8")]
    Xyce78,
    #[serde(rename = "xyce_7_9")]
    Xyce79,
    #[serde(rename = "xyce_7_10")]
    Xyce710,
}

impl Flavour {
    pub const ALL: [Flavour; 7] = [
        Flavour::Ngspice,
        Flavour::Xyce,
        Flavour::Hspice,
        Flavour::Spectre,
        Flavour::Xyce78,
        Flavour::Xyce79,
        Flavour::Xyce710,
    ];

    /// Wire value. `0` is reserved for "unset" and never maps to a flavour.
    pub fn wire_value(self) -> i32 {
        match self {
            Flavour::Ngspice => 1,
            Flavour::Xyce => 2,
            Flavour::Hspice => 3,
            Flavour::Spectre => 4,
            Flavour::Xyce78 => 5,
            Flavour::Xyce79 => 6,
            Flavour::Xyce710 => 7,
        }
    }

    pub fn from_wire(value: i32) -> Option<Flavour> {
        Flavour::ALL.into_iter().find(|f| f.wire_value() == value)
    }

    /// Upper-case name as used in the proto enum and in log output.
    pub fn name(self) -> &'static str {
        match self {
            Flavour::Ngspice => "NGSPICE",
            Flavour::Xyce => "XYCE",
            Flavour::Hspice => "HSPICE",
            Flavour::Spectre => "SPECTRE",
            Flavour::Xyce78 => "XYCE_7_8",
            Flavour::Xyce79 => "XYCE_7_9",
            Flavour::Xyce710 => "XYCE_7_10",
        }
    }
}

impl fmt::Display for Flavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Flavour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Flavour::ALL
            .into_iter()
            .find(|f| f.name().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown simulator flavour: {s}"))
    }
}

/// Which of the child's standard streams a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// One read's worth of child output.
///
/// Ordering is preserved within a stream; ordering between stdout and stderr
/// chunks depends on OS scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub bytes: Vec<u8>,
    pub stream: StreamKind,
}

impl OutputChunk {
    pub fn new(bytes: &[u8], stream: StreamKind) -> Self {
        Self {
            bytes: bytes.to_vec(),
            stream,
        }
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal exit with this code.
    Exited(i32),
    /// Killed by this signal number.
    Signaled(i32),
}

impl ExitStatus {
    /// Reported instead of an exit code when the process was killed by a
    /// signal. Real exit codes are always in `0..=255`.
    pub const SIGNAL_SENTINEL: i32 = -1;

    /// Code reported on the wire.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Exited(code) => code,
            ExitStatus::Signaled(_) => Self::SIGNAL_SENTINEL,
        }
    }

    pub fn success(self) -> bool {
        self == ExitStatus::Exited(0)
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        match (status.code(), status.signal()) {
            (Some(code), _) => ExitStatus::Exited(code),
            (None, Some(signal)) => ExitStatus::Signaled(signal),
            // Stopped/continued states are never returned by wait().
            (None, None) => ExitStatus::Signaled(0),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Exited(code) => write!(f, "exited with code {code}"),
            ExitStatus::Signaled(signal) => write!(f, "killed by signal {signal}"),
        }
    }
}
