use crate::foundation::error::{VidreelError, VidreelResult};

/// 0-based index of a frame in arrival order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Largest denominator [`Fps::from_rate`] will produce.
pub const MAX_RATE_DENOMINATOR: u64 = 1_000_000;

/// Output frame rate as the exact fraction `num / den` frames per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Frames.
    pub num: u32,
    /// Seconds; never zero.
    pub den: u32,
}

impl Fps {
    /// Both parts must be non-zero.
    pub fn new(num: u32, den: u32) -> VidreelResult<Self> {
        if den == 0 {
            return Err(VidreelError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(VidreelError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Round a measured `rate` to two decimal places and store it as a reduced `n/100` fraction.
    ///
    /// Rates that would round to zero are clamped to `0.01`. Fixed rates go through
    /// [`Fps::from_rate`] instead.
    pub fn from_hundredths(rate: f64) -> VidreelResult<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(VidreelError::validation(format!(
                "frame rate must be finite and > 0, got {rate}"
            )));
        }
        let scaled = (rate * 100.0).round();
        if scaled > f64::from(u32::MAX) {
            return Err(VidreelError::validation(format!(
                "frame rate {rate} is too large"
            )));
        }
        let num = (scaled as u32).max(1);
        let g = gcd(num, 100);
        Ok(Self {
            num: num / g,
            den: 100 / g,
        })
    }

    /// Exact rational form of a user-supplied rate such as `24`, `23.976` or `0.5`.
    ///
    /// Uses the continued-fraction expansion of `rate`, stopping at the first convergent equal to
    /// `rate` or before the denominator passes [`MAX_RATE_DENOMINATOR`]. Rates with no non-zero
    /// fraction in that range are rejected rather than rounded.
    pub fn from_rate(rate: f64) -> VidreelResult<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(VidreelError::validation(format!(
                "frame rate must be finite and > 0, got {rate}"
            )));
        }

        // Convergents h/k, seeded with h(-1)/k(-1) = 1/0 and h(-2)/k(-2) = 0/1.
        let (mut h_prev, mut h) = (0u64, 1u64);
        let (mut k_prev, mut k) = (1u64, 0u64);
        let mut x = rate;
        loop {
            let a = x.floor() as u64;
            let next = a
                .checked_mul(h)
                .and_then(|v| v.checked_add(h_prev))
                .zip(a.checked_mul(k).and_then(|v| v.checked_add(k_prev)));
            let Some((h_next, k_next)) = next else { break };
            if h_next > u64::from(u32::MAX) || k_next > MAX_RATE_DENOMINATOR {
                break;
            }
            (h_prev, h, k_prev, k) = (h, h_next, k, k_next);

            let frac = x - x.floor();
            if h as f64 / k as f64 == rate || frac < 1e-12 {
                break;
            }
            x = 1.0 / frac;
        }

        if h == 0 || k == 0 {
            return Err(VidreelError::validation(format!(
                "frame rate {rate} cannot be represented as a fraction with denominator <= {MAX_RATE_DENOMINATOR}"
            )));
        }
        Self::new(h as u32, k as u32)
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Seconds each frame is shown for.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Playback length of `frames` frames.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }
}

impl std::fmt::Display for Fps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else if 100 % self.den == 0 {
            write!(f, "{:.2}", self.as_f64())
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Output dimensions in pixels, in output stream order (width first).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Width first, as ffmpeg's `-s WxH` expects.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build from a `(height, width)` shape pair.
    pub fn from_shape(height: u32, width: u32) -> Self {
        Self { width, height }
    }

    /// Element-wise maximum of two resolutions.
    pub fn max(self, other: Self) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// `true` when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
