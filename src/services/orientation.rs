use std::fmt;
use thiserror::Error;

/// Frame size of the first stream reported by the prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamGeometry {
    pub width: u32,
    pub height: u32,
}

impl StreamGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Storage partition a video lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OrientationError {
    #[error("degenerate stream geometry {width}x{height}")]
    DegenerateGeometry { width: u32, height: u32 },
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Reduces `width:height` to lowest terms.
pub fn reduced_ratio(geometry: StreamGeometry) -> Result<(u32, u32), OrientationError> {
    let StreamGeometry { width, height } = geometry;
    let divisor = gcd(width, height);
    if width == 0 || height == 0 || divisor == 0 {
        return Err(OrientationError::DegenerateGeometry { width, height });
    }
    Ok((width / divisor, height / divisor))
}

/// Classifies a frame by exact ratio: 16:9 is landscape, 9:16 is portrait,
/// everything else (including near misses such as 1277x719) is other.
pub fn classify(geometry: StreamGeometry) -> Result<Orientation, OrientationError> {
    let orientation = match reduced_ratio(geometry)? {
        (16, 9) => Orientation::Landscape,
        (9, 16) => Orientation::Portrait,
        _ => Orientation::Other,
    };
    Ok(orientation)
}
