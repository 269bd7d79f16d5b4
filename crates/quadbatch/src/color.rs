/// Mask applied to every packed tint.
///
/// Clears the lowest alpha bit, which keeps the float exponent field from ever
/// becoming all ones (no NaN/Inf bit patterns reach the vertex stream).
pub const TINT_MASK: u32 = 0xFEFF_FFFF;

/// Pack a 24-bit `0xRRGGBB` color and an alpha in `[0, 1]` into the bits of one `f32`.
///
/// Byte order in memory (little endian) is R, G, B, A so the value can be read
/// back by the GPU as a normalized `u8x4` attribute.
#[inline]
pub fn pack_tint(rgb: u32, alpha: f32) -> f32 {
    let red = (rgb >> 16) & 0xFF;
    let green = ((rgb >> 8) & 0xFF) << 8;
    let blue = (rgb & 0xFF) << 16;
    let alpha = ((alpha.clamp(0.0, 1.0) * 255.0).round() as u32) << 24;
    f32::from_bits((alpha | blue | green | red) & TINT_MASK)
}

/// Decode a packed tint back into `[r, g, b, a]` bytes.
#[inline]
pub fn unpack_tint(tint: f32) -> [u8; 4] {
    tint.to_bits().to_le_bytes()
}

/// RGBA color with values in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Color from 8-bit channels, no gamma conversion.
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Color from a `0xRRGGBB` value and a separate alpha.
    pub const fn from_hex(rgb: u32, alpha: f32) -> Self {
        let c = Self::from_rgba8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 255);
        Self::new(c.r, c.g, c.b, alpha)
    }

    /// with alpha builder method taking f32
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// The color channels as a `0xRRGGBB` value.
    pub fn to_hex(self) -> u32 {
        let channel = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Packed vertex tint, see [`pack_tint`].
    pub fn to_tint(self) -> f32 {
        pack_tint(self.to_hex(), self.a)
    }
}

/// Catppuccin mocha palette
pub mod mocha {
    use super::Color;

    pub const ROSEWATER: Color = Color::from_rgba8(245, 224, 220, 255);
    pub const MAUVE: Color = Color::from_rgba8(203, 166, 247, 255);
    pub const PEACH: Color = Color::from_rgba8(250, 179, 135, 255);
    pub const GREEN: Color = Color::from_rgba8(166, 227, 161, 255);
    pub const SKY: Color = Color::from_rgba8(137, 220, 235, 255);
    pub const TEXT: Color = Color::from_rgba8(205, 214, 244, 255);
    pub const CRUST: Color = Color::from_rgba8(17, 17, 27, 255);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tint_round_trip() {
        let [r, g, b, a] = unpack_tint(pack_tint(0x112233, 0.5));
        assert_eq!((r, g, b), (0x11, 0x22, 0x33));
        assert!((a as f32 / 255.0 - 0.5).abs() <= 1.0 / 255.0);
    }

    #[test]
    fn test_tint_mask_clears_low_alpha_bit() {
        let bits = pack_tint(0xFFFFFF, 1.0).to_bits();
        assert_eq!(bits, 0xFEFF_FFFF);
        assert!(!f32::from_bits(bits).is_nan());

        // An odd alpha byte loses its lowest bit.
        let [_, _, _, a] = unpack_tint(pack_tint(0x000000, 1.0 / 255.0));
        assert_eq!(a, 0);
    }

    #[test]
    fn test_tint_alpha_is_clamped() {
        assert_eq!(pack_tint(0, 4.0).to_bits(), pack_tint(0, 1.0).to_bits());
        assert_eq!(pack_tint(0, -1.0).to_bits(), 0);
    }

    #[test]
    fn test_color_hex_round_trip() {
        let color = Color::from_hex(0x112233, 0.25);
        assert_eq!(color.to_hex(), 0x112233);
        assert_eq!(color.a, 0.25);
        assert_eq!(color.to_tint().to_bits(), pack_tint(0x112233, 0.25).to_bits());
    }
}
