#![forbid(unsafe_code)]

//! Perceptual alpha compositing.
//!
//! The blend remaps alpha through a two-segment power curve before lerping:
//!
//! ```text
//! a >  0.8 : 0.8 + ((a - 0.8) * 5)^0.2 * 0.2
//! a <= 0.8 : a^0.9
//! ```
//!
//! The curve maps `0 -> 0` and `1 -> 1` and each segment is increasing, but
//! the segments do not meet: `a = 0.8` gives `0.8^0.9 ~ 0.818`, while the
//! upper segment starts at `0.8`. Alphas within about `1e-6` above `0.8`
//! therefore land slightly below `perceptual_alpha(0.8)`.

use crate::color::Rgba;

/// Remap straight alpha onto the perceptual curve.
#[inline]
pub fn perceptual_alpha(alpha: f32) -> f32 {
    if alpha > 0.8 {
        let t = (alpha - 0.8) * 5.0;
        0.8 + t.powf(0.2) * 0.2
    } else {
        alpha.powf(0.9)
    }
}

/// Composite `overlay` over `background`.
///
/// An opaque overlay is returned unchanged. Otherwise the RGB channels are
/// mixed by [`perceptual_alpha`] and the result keeps the background's alpha.
#[inline]
pub fn blend_colors(overlay: Rgba, background: Rgba) -> Rgba {
    if overlay.a == 1.0 {
        return overlay;
    }
    let pa = perceptual_alpha(overlay.a);
    let inv = 1.0 - pa;
    Rgba::new(
        overlay.r * pa + background.r * inv,
        overlay.g * pa + background.g * inv,
        overlay.b * pa + background.b * inv,
        background.a,
    )
}
