/// A single decoded pixel.
///
/// CIFF stores three bytes per pixel, so the alpha channel of a decoded pixel
/// is always 0. Use [`Pixel::opaque`] when handing pixels to consumers that
/// interpret alpha.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// Creates a pixel from its color channels, leaving alpha at 0.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0 }
    }

    /// Returns the same color with full alpha.
    #[inline]
    pub const fn opaque(self) -> Self {
        Self { a: 0xFF, ..self }
    }

    #[inline]
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 3]> for Pixel {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Pixel::rgb(r, g, b)
    }
}
